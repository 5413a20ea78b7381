//! Index of the provider's existing records
//!
//! Keyed by (host, zone id) for O(1) lookup during reconciliation. The
//! provider's record set is the source of truth for what already exists;
//! the index is a read-only snapshot of it for the duration of a run.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::ExistingRecord;

/// Lookup key for an existing record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Host label
    pub host: String,
    /// Geo-routing key
    pub zone_id: i64,
}

impl RecordKey {
    /// Key of an existing record
    pub fn of(record: &ExistingRecord) -> Self {
        Self {
            host: record.host.clone(),
            zone_id: record.zone_id,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.host, self.zone_id)
    }
}

/// Existing records indexed by (host, zone id).
///
/// Duplicate keys are a data anomaly at the provider. The first record seen
/// wins and every colliding key is retained for reporting; nothing is
/// silently overwritten. Use [`RecordIndex::build_strict`] to fail instead.
#[derive(Debug, Default)]
pub struct RecordIndex {
    by_key: HashMap<RecordKey, ExistingRecord>,
    duplicates: Vec<RecordKey>,
}

impl RecordIndex {
    /// Build an index, keeping the first record for each key.
    pub fn build(records: Vec<ExistingRecord>) -> Self {
        let mut index = Self::default();

        for record in records {
            let key = RecordKey::of(&record);
            if index.by_key.contains_key(&key) {
                index.duplicates.push(key);
            } else {
                index.by_key.insert(key, record);
            }
        }

        index
    }

    /// Build an index, failing on the first duplicate key.
    pub fn build_strict(records: Vec<ExistingRecord>) -> Result<Self> {
        let index = Self::build(records);
        match index.duplicates.first() {
            Some(key) => Err(Error::duplicate_key(key.host.clone(), key.zone_id)),
            None => Ok(index),
        }
    }

    /// Exact lookup by host and zone id
    pub fn lookup(&self, host: &str, zone_id: i64) -> Option<&ExistingRecord> {
        let key = RecordKey {
            host: host.to_string(),
            zone_id,
        };
        self.by_key.get(&key)
    }

    /// Keys that collided while building
    pub fn duplicates(&self) -> &[RecordKey] {
        &self.duplicates
    }

    /// All indexed records (iteration order is unspecified)
    pub fn records(&self) -> impl Iterator<Item = &ExistingRecord> {
        self.by_key.values()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// True when the provider returned no records
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
