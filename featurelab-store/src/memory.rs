//! In-memory partition store, for tests and dry runs.

use crate::store::{parse_partition_name, PartitionStore, StoreError};
use featurelab_core::domain::{EnrichedRow, Partition};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<String, Vec<EnrichedRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartitionStore for MemoryStore {
    fn write_batch(&self, partitions: &[Partition]) -> Result<usize, StoreError> {
        for p in partitions {
            parse_partition_name(&p.name())?;
        }
        // The write guard is the batch scope: readers see all of it or none.
        let mut guard = self.partitions.write().map_err(|_| StoreError::Poisoned)?;
        for p in partitions {
            guard.insert(p.name(), p.rows.clone());
        }
        Ok(partitions.len())
    }

    fn read(&self, name: &str) -> Result<Vec<EnrichedRow>, StoreError> {
        parse_partition_name(name)?;
        let guard = self.partitions.read().map_err(|_| StoreError::Poisoned)?;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.partitions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.keys().cloned().collect())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        parse_partition_name(name)?;
        let mut guard = self.partitions.write().map_err(|_| StoreError::Poisoned)?;
        guard
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}
