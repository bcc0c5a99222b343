//! This module contains the slot decoder: pure functions that interpret one raw
//! storage word as a typed value.
//!
//! Which bytes of which slot are decoded, and as what, is described by the
//! offset tables in [`schema`]. The functions here know nothing about the
//! layout; they only know how a given Solidity type is represented in a word.

pub mod schema;

use ethnum::U256;

use crate::{
    constant::{ADDRESS_OFFSET_BYTES, WORD_SIZE_BYTES},
    decoder::schema::PackedField,
    error::{container::Locatable, decode},
    lifecycle::Stage,
    storage::RawStorage,
    word::{Address, Word},
};

/// The result type for decoding a single word, before it has been located at a
/// slot.
pub type WordResult<T> = std::result::Result<T, decode::Error>;

/// Decodes a `bytes32` value holding short text, such as a name, symbol or
/// currency code.
///
/// Solidity left-aligns `bytesN` values, so the text is followed by zero bytes
/// that are stripped before decoding. The all-zero word decodes to the empty
/// string.
///
/// # Errors
///
/// Returns [`Err`] if any of the remaining bytes are not ASCII.
pub fn to_ascii_string(word: &Word) -> WordResult<String> {
    let bytes = word.bytes_be();
    let length = bytes.iter().rposition(|b| *b != 0).map_or(0, |ix| ix + 1);
    let text = &bytes[..length];

    if let Some((offset, byte)) = text.iter().enumerate().find(|(_, b)| !b.is_ascii()) {
        return Err(decode::Error::NonAscii {
            byte: *byte,
            offset,
        });
    }

    Ok(text.iter().map(|b| char::from(*b)).collect())
}

/// Interprets `word` as a big-endian unsigned integer.
#[must_use]
pub fn to_big_integer(word: &Word) -> U256 {
    word.value()
}

/// Renders `word` as `0x`-prefixed hex with its trailing zero bytes removed.
///
/// This is used for variable-length byte data, such as hash fragments, where
/// only the meaningful prefix matters. The all-zero word gives `"0x"`.
#[must_use]
pub fn trim_trailing_zero_bytes(word: &Word) -> String {
    let bytes = word.bytes_be();
    let length = bytes.iter().rposition(|b| *b != 0).map_or(0, |ix| ix + 1);

    format!("0x{}", hex::encode(&bytes[..length]))
}

/// Gets the number of bytes of `word` from its most significant non-zero byte
/// to its end.
fn significant_width(word: &Word) -> usize {
    let bytes = word.bytes_be();
    bytes.iter().position(|b| *b != 0).map_or(0, |ix| WORD_SIZE_BYTES - ix)
}

/// Checks that `start..end` is a non-empty byte range within a word.
fn check_range(start: usize, end: usize) -> WordResult<()> {
    if start >= end || end > WORD_SIZE_BYTES {
        Err(decode::Error::InvalidRange { start, end })
    } else {
        Ok(())
    }
}

/// Extracts the bytes `start..end` of `word` (big-endian offsets) and returns
/// them right-aligned in a fresh word, so that they can be decoded as a value
/// in their own right.
///
/// # Errors
///
/// Returns [`Err`] if the range is empty or does not lie within a word.
pub fn extract_packed_field(word: &Word, start: usize, end: usize) -> WordResult<Word> {
    check_range(start, end)?;

    let mut result = Word::zero();
    let width = end - start;
    result.bytes_mut()[WORD_SIZE_BYTES - width..].copy_from_slice(&word.bytes_be()[start..end]);

    Ok(result)
}

/// Writes the low-order bytes of `value` into the bytes `start..end` of `word`,
/// leaving the other bytes untouched. This is the inverse of
/// [`extract_packed_field`].
///
/// # Errors
///
/// Returns [`Err`] if the range is invalid, or if `value` does not fit in it.
pub fn insert_packed_field(word: &Word, start: usize, end: usize, value: &Word) -> WordResult<Word> {
    check_range(start, end)?;

    let width = end - start;
    if significant_width(value) > width {
        return Err(decode::Error::TooWide {
            width: significant_width(value),
            limit: width,
            target: "packed field",
        });
    }

    let mut result = *word;
    result.bytes_mut()[start..end].copy_from_slice(&value.bytes_be()[WORD_SIZE_BYTES - width..]);

    Ok(result)
}

/// Decodes a right-aligned address from a word that holds nothing else.
///
/// # Errors
///
/// Returns [`Err`] if any of the high-order bytes are set, which means the
/// slot holds more than just an address.
pub fn to_address(word: &Word) -> WordResult<Address> {
    if word.bytes_be()[..ADDRESS_OFFSET_BYTES].iter().any(|b| *b != 0) {
        return Err(decode::Error::DirtyAddress {
            word: word.to_string(),
        });
    }

    Ok(Address::from_word_low(word))
}

/// Gets the lowest byte of `word`, requiring that the rest are zero.
fn to_small(word: &Word, target: &'static str) -> WordResult<u8> {
    let width = significant_width(word);
    if width > 1 {
        return Err(decode::Error::TooWide {
            width,
            limit: 1,
            target,
        });
    }

    Ok(word.bytes_be()[WORD_SIZE_BYTES - 1])
}

/// Decodes a boolean, which Solidity stores as a single byte of `0` or `1`.
///
/// # Errors
///
/// Returns [`Err`] if the word holds any other value.
pub fn to_bool(word: &Word) -> WordResult<bool> {
    match to_small(word, "bool")? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(decode::Error::InvalidBool { value }),
    }
}

/// Decodes a stage enum code.
///
/// # Errors
///
/// Returns [`Err`] if the word does not hold a known stage code.
pub fn to_stage(word: &Word) -> WordResult<Stage> {
    Stage::try_from(to_small(word, "stage")?)
}

/// Reads `field` out of `storage`, returning its bytes right-aligned.
///
/// # Errors
///
/// Returns [`Err`] if the slot was not read or the field's range is invalid.
/// The error is located at the field's slot.
pub fn field_word(storage: &RawStorage, field: PackedField) -> decode::Result<Word> {
    let word = storage.word(field.slot)?;
    extract_packed_field(word, field.start, field.end).locate(field.slot)
}

/// Reads `field` out of `storage` and decodes it with `decoder`, locating any
/// decoding error at the field's slot.
///
/// # Errors
///
/// Returns [`Err`] if the field cannot be read or does not decode.
pub fn decode_field<T>(
    storage: &RawStorage,
    field: PackedField,
    decoder: impl FnOnce(&Word) -> WordResult<T>,
) -> decode::Result<T> {
    let word = field_word(storage, field)?;
    decoder(&word).locate(field.slot)
}
