// # Registry Source Trait
//
// Defines the interface for loading the member registry and the region
// table. The core treats both as read-only snapshots for the duration of
// one reconciliation run.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{RawMember, Region};

/// Trait for registry source implementations.
///
/// Members come back raw (string-encoded numerics intact) because per-member
/// validation is the eligibility filter's job: one malformed member must not
/// fail the load. Regions, by contrast, are parsed eagerly and any malformed
/// region fails the whole run with `DataValidation`, since a region without
/// a valid zone id cannot be reconciled correctly.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Load the member registry snapshot, keyed by member identifier.
    ///
    /// A `BTreeMap` so iteration order, and with it every diagnostic the
    /// run produces, is deterministic.
    async fn load_members(&self) -> Result<BTreeMap<String, RawMember>>;

    /// Load the region table, in the order reconciliation should process it.
    async fn load_regions(&self) -> Result<Vec<Region>>;

    /// Source name for logging/debugging (e.g. "file")
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing registry sources from configuration
pub trait RegistrySourceFactory: Send + Sync {
    /// Create a source instance from configuration
    fn create(&self, config: &crate::config::SourceConfig) -> Result<Box<dyn RegistrySource>>;
}
