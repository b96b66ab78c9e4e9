//! Property tests for partition naming as seen by the stores.

use featurelab_core::domain::PartitionKey;
use featurelab_store::{parse_partition_name, MemoryStore, PartitionStore, StoreError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn storable_names_parse_back(
        ticker in "[A-Z\\^][A-Z0-9._-]{0,7}",
        year in 1900i32..2100,
        month in 1u32..=12,
    ) {
        let key = PartitionKey::new(ticker, year, month);
        let parsed = parse_partition_name(&key.name()).unwrap();
        prop_assert_eq!(parsed, key);
    }

    #[test]
    fn names_with_separators_are_rejected(
        head in "[A-Z]{1,4}",
        sep in prop::sample::select(vec!['/', '\\', ' ', ':']),
        tail in "[A-Z]{1,4}",
    ) {
        let name = format!("{head}{sep}{tail}_2023_04");
        prop_assert!(parse_partition_name(&name).is_err());

        let store = MemoryStore::new();
        prop_assert!(matches!(store.read(&name), Err(StoreError::InvalidName(_))));
    }
}
