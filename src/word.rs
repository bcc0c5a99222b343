//! This module contains the primitive representations of raw storage data: the
//! 32-byte [`Word`] that every storage slot holds, and the 20-byte [`Address`]
//! that is packed into the low-order bytes of a word.
//!
//! # Byte Ordering
//!
//! Both types store their bytes in network (big-endian) order, exactly as they
//! are returned by a node's `eth_getStorageAt`. Byte offsets used throughout
//! the library are therefore big-endian positions: offset `0` is the most
//! significant byte of the word and offset `31` the least significant.

use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use ethnum::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constant::{ADDRESS_OFFSET_BYTES, ADDRESS_WIDTH_BYTES, WORD_SIZE_BYTES};

/// Errors encountered when parsing hexadecimal representations of words and
/// addresses.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HexError {
    #[error("Could not decode hex: {_0}")]
    InvalidHex(String),

    #[error("Expected at most {expected} bytes but found {actual}")]
    TooLong { expected: usize, actual: usize },

    #[error("Expected exactly {expected} bytes but found {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Decodes `input`, with or without the `0x` prefix, into bytes.
///
/// Odd-length input is accepted and treated as if it had a leading zero nibble,
/// as nodes commonly return compact quantities such as `0x0`.
fn decode_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };

    hex::decode(padded).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// A single 256-bit EVM word, stored as big-endian bytes.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Word([u8; WORD_SIZE_BYTES]);

impl Word {
    /// Creates the all-zero word, which is the value of every storage slot that
    /// has never been written.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; WORD_SIZE_BYTES])
    }

    /// Creates a word from its big-endian `bytes`.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; WORD_SIZE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Creates a word by left-aligning `bytes`, as Solidity does for fixed-size
    /// `bytesN` values, and zero-filling the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `bytes` is longer than a word.
    pub fn left_aligned(bytes: &[u8]) -> Result<Self, HexError> {
        if bytes.len() > WORD_SIZE_BYTES {
            return Err(HexError::TooLong {
                expected: WORD_SIZE_BYTES,
                actual:   bytes.len(),
            });
        }
        let mut word = [0u8; WORD_SIZE_BYTES];
        word[..bytes.len()].copy_from_slice(bytes);

        Ok(Self(word))
    }

    /// Creates a word by right-aligning `bytes` and zero-filling the high-order
    /// bytes, as the EVM does for numbers and addresses.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `bytes` is longer than a word.
    pub fn right_aligned(bytes: &[u8]) -> Result<Self, HexError> {
        if bytes.len() > WORD_SIZE_BYTES {
            return Err(HexError::TooLong {
                expected: WORD_SIZE_BYTES,
                actual:   bytes.len(),
            });
        }
        let mut word = [0u8; WORD_SIZE_BYTES];
        word[WORD_SIZE_BYTES - bytes.len()..].copy_from_slice(bytes);

        Ok(Self(word))
    }

    /// Creates a word holding `text` as a left-aligned `bytes32` value.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `text` is longer than a word.
    pub fn from_ascii(text: &str) -> Result<Self, HexError> {
        Self::left_aligned(text.as_bytes())
    }

    /// Gets the bytes of this word in big-endian ordering.
    #[must_use]
    pub fn bytes_be(&self) -> &[u8; WORD_SIZE_BYTES] {
        &self.0
    }

    /// Gets the value of the word as an unsigned integer.
    #[must_use]
    pub fn value(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }

    /// Checks if every byte in the word is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Gets a mutable view of the bytes, for building packed words.
    pub fn bytes_mut(&mut self) -> &mut [u8; WORD_SIZE_BYTES] {
        &mut self.0
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<u128> for Word {
    fn from(value: u128) -> Self {
        Self::from(U256::from(value))
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self::from(U256::from(value))
    }
}

impl From<Address> for Word {
    fn from(value: Address) -> Self {
        let mut word = [0u8; WORD_SIZE_BYTES];
        word[ADDRESS_OFFSET_BYTES..].copy_from_slice(&value.0);
        Self(word)
    }
}

impl From<Word> for U256 {
    fn from(value: Word) -> Self {
        value.value()
    }
}

impl FromStr for Word {
    type Err = HexError;

    /// Parses a word from hex, right-aligning short inputs so that compact
    /// quantities like `0x1` parse as the number one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)?;
        Self::right_aligned(&bytes)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for Word {
    /// A word has no semantic meaning beyond its bytes, so we print the hex for
    /// the debug representation.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Word::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A 160-bit account or contract address.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address([u8; ADDRESS_WIDTH_BYTES]);

impl Address {
    /// Creates an address from its big-endian `bytes`.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_WIDTH_BYTES]) -> Self {
        Self(bytes)
    }

    /// Creates the all-zero address.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; ADDRESS_WIDTH_BYTES])
    }

    /// Creates an address with every byte set to `byte`, which is handy for
    /// distinct fixture addresses.
    #[must_use]
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_WIDTH_BYTES])
    }

    /// Takes the low-order 20 bytes of `word` as an address, ignoring whatever
    /// is packed in the high-order bytes.
    #[must_use]
    pub fn from_word_low(word: &Word) -> Self {
        let mut bytes = [0u8; ADDRESS_WIDTH_BYTES];
        bytes.copy_from_slice(&word.bytes_be()[ADDRESS_OFFSET_BYTES..]);
        Self(bytes)
    }

    /// Gets the bytes of the address.
    #[must_use]
    pub fn bytes(&self) -> &[u8; ADDRESS_WIDTH_BYTES] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)?;
        let bytes: [u8; ADDRESS_WIDTH_BYTES] =
            bytes.as_slice().try_into().map_err(|_| HexError::WrongLength {
                expected: ADDRESS_WIDTH_BYTES,
                actual:   bytes.len(),
            })?;

        Ok(Self(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use ethnum::U256;

    use crate::word::{Address, HexError, Word};

    #[test]
    fn parses_compact_quantities_as_numbers() -> anyhow::Result<()> {
        assert_eq!(Word::from_str("0x0")?, Word::zero());
        assert_eq!(Word::from_str("0x01")?.value(), U256::ONE);
        assert_eq!(Word::from_str("0x100")?.value(), U256::from(256u32));

        Ok(())
    }

    #[test]
    fn address_round_trips_through_word_low_bytes() -> anyhow::Result<()> {
        let address = Address::from_str("0x345ca3e014aaf5dca488057592ee47305d9b3e10")?;
        let word = Word::from(address);

        assert!(word.bytes_be()[..12].iter().all(|b| *b == 0));
        assert_eq!(Address::from_word_low(&word), address);
        assert_eq!(
            word.to_string(),
            "0x000000000000000000000000345ca3e014aaf5dca488057592ee47305d9b3e10"
        );

        Ok(())
    }

    #[test]
    fn rejects_addresses_of_the_wrong_length() {
        assert_eq!(
            Address::from_str("0x1234"),
            Err(HexError::WrongLength {
                expected: 20,
                actual:   2,
            })
        );
    }

    #[test]
    fn ascii_words_are_left_aligned() -> anyhow::Result<()> {
        let word = Word::from_ascii("USD")?;
        assert_eq!(&word.bytes_be()[..3], b"USD");
        assert!(word.bytes_be()[3..].iter().all(|b| *b == 0));

        Ok(())
    }
}
