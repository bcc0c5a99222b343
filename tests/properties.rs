//! Property tests for the slot decoder and snapshot parsers.

use poa_storage_verifier::{
    decoder::{extract_packed_field, insert_packed_field, to_ascii_string, to_bool},
    lifecycle::Stage,
    snapshot::{parse_common, parse_proxy_common},
    storage::RawStorage,
    word::{Address, Word},
};
use proptest::prelude::*;

/// The byte offsets of the status flags packed into slot 13.
const STATUS_FLAG_OFFSETS: [usize; 4] = [28, 29, 30, 31];

fn address_strategy() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::new)
}

fn stage_strategy() -> impl Strategy<Value = Stage> {
    (0u8..=7).prop_filter_map("valid stage", |code| Stage::try_from(code).ok())
}

/// Packing every combination of the four status flags into slot 13 and
/// extracting each one gives back the original flags.
#[test]
fn status_flags_round_trip() -> anyhow::Result<()> {
    for bits in 0u8..16 {
        let flags: [bool; 4] = std::array::from_fn(|i| bits & (1 << i) != 0);

        let mut word = Word::zero();
        for (offset, flag) in STATUS_FLAG_OFFSETS.iter().zip(flags) {
            word = insert_packed_field(&word, *offset, offset + 1, &Word::from(u64::from(flag)))?;
        }

        for (offset, flag) in STATUS_FLAG_OFFSETS.iter().zip(flags) {
            let field = extract_packed_field(&word, *offset, offset + 1)?;
            assert_eq!(to_bool(&field)?, flag, "flags {bits:04b} at byte {offset}");
        }

        let mut words = vec![Word::zero(); 29];
        words[13] = word;
        let common = parse_common(&RawStorage::from_words(words), false)?;
        assert_eq!(
            [common.crowdsale_initialized, common.activation_fee_paid, common.token_initialized, common.paused],
            flags
        );
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// The registry address decodes the same under either schema version, as
    /// long as the stage byte holds a valid stage.
    #[test]
    fn registry_is_independent_of_schema_version(
        registry in address_strategy(),
        stage in stage_strategy(),
    ) {
        let mut slot = Word::from(registry);
        slot.bytes_mut()[11] = stage.code();
        let mut words = vec![Word::zero(); 3];
        words[2] = slot;
        let storage = RawStorage::from_words(words);

        let unstaged = parse_proxy_common(&storage, false)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let staged = parse_proxy_common(&storage, true)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(unstaged.registry(), registry);
        prop_assert_eq!(staged.registry(), registry);
        prop_assert_eq!(staged.registry_slot.stage(), Some(stage));
    }

    /// Decoding a decoded string again changes nothing.
    #[test]
    fn ascii_decoding_is_idempotent(text in "[ -~]{0,32}") {
        let word = Word::from_ascii(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let once = to_ascii_string(&word).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let again = Word::from_ascii(&once).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(once.as_str(), text.as_str());
        prop_assert_eq!(to_ascii_string(&again).map_err(|e| TestCaseError::fail(e.to_string()))?, once);
    }
}
