//! Test doubles and common utilities for reconciliation contract tests
//!
//! The in-memory provider applies operations to a real record set so the
//! convergence contract can be verified end to end without a network.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use geodns_core::config::{
    EngineConfig, GeoDnsConfig, ProviderConfig, ReconcileConfig, SourceConfig,
};
use geodns_core::error::{Error, Result};
use geodns_core::model::{Coordinate, ExistingRecord, Operation, RawMember, Region};
use geodns_core::traits::{DnsProvider, RegistrySource};

/// A registry source serving fixed in-memory snapshots
pub struct StaticRegistrySource {
    members: BTreeMap<String, RawMember>,
    regions: Vec<Region>,
}

impl StaticRegistrySource {
    pub fn new(members: BTreeMap<String, RawMember>, regions: Vec<Region>) -> Self {
        Self { members, regions }
    }
}

#[async_trait::async_trait]
impl RegistrySource for StaticRegistrySource {
    async fn load_members(&self) -> Result<BTreeMap<String, RawMember>> {
        Ok(self.members.clone())
    }

    async fn load_regions(&self) -> Result<Vec<Region>> {
        Ok(self.regions.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A DnsProvider backed by an in-memory record set.
///
/// `apply` really mutates the set: creates insert a record with a fresh ID,
/// updates rewrite the value of the identified record. Zones listed via
/// [`InMemoryDnsProvider::fail_zone`] fail with `ProviderUnavailable`.
pub struct InMemoryDnsProvider {
    records: Arc<Mutex<Vec<ExistingRecord>>>,
    next_id: Arc<AtomicUsize>,
    apply_call_count: Arc<AtomicUsize>,
    fail_zones: Arc<Mutex<HashSet<i64>>>,
}

impl InMemoryDnsProvider {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<ExistingRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            next_id: Arc::new(AtomicUsize::new(1000)),
            apply_call_count: Arc::new(AtomicUsize::new(0)),
            fail_zones: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make `apply` fail for one zone
    pub fn fail_zone(&self, zone_id: i64) {
        self.fail_zones.lock().unwrap().insert(zone_id);
    }

    /// Clear all injected failures
    pub fn fail_zones_clear(&self) {
        self.fail_zones.lock().unwrap().clear();
    }

    /// Snapshot of the provider's record set
    pub fn records(&self) -> Vec<ExistingRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of apply() calls that reached the provider
    pub fn apply_call_count(&self) -> usize {
        self.apply_call_count.load(Ordering::SeqCst)
    }

    /// Create a handle sharing this provider's state, for handing the
    /// engine a Box while the test keeps visibility
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            next_id: Arc::clone(&other.next_id),
            apply_call_count: Arc::clone(&other.apply_call_count),
            fail_zones: Arc::clone(&other.fail_zones),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for InMemoryDnsProvider {
    async fn current_records(&self, host: &str) -> Result<Vec<ExistingRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.host == host)
            .cloned()
            .collect())
    }

    async fn apply(&self, operation: &Operation) -> Result<()> {
        if operation.is_noop() {
            return Ok(());
        }

        self.apply_call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_zones.lock().unwrap().contains(&operation.zone_id()) {
            return Err(Error::provider_unavailable(format!(
                "injected failure for zone {}",
                operation.zone_id()
            )));
        }

        let mut records = self.records.lock().unwrap();
        match operation {
            Operation::Create { host, zone_id, value } => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                records.push(ExistingRecord {
                    id: id.to_string(),
                    host: host.clone(),
                    zone_id: *zone_id,
                    value: value.clone(),
                });
                Ok(())
            }
            Operation::Update { record_id, value, .. } => {
                let record = records
                    .iter_mut()
                    .find(|r| &r.id == record_id)
                    .ok_or_else(|| {
                        Error::provider_data(format!("no record with id {record_id}"))
                    })?;
                record.value = value.clone();
                Ok(())
            }
            Operation::NoOp { .. } => Ok(()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Build a registry member with string-encoded fields
pub fn member(name: &str, level: &str, active: &str, addr: &str, lat: f64, lon: f64) -> RawMember {
    RawMember {
        name: name.to_string(),
        current_level: level.to_string(),
        active: active.to_string(),
        services_address: addr.to_string(),
        latitude: lat.to_string(),
        longitude: lon.to_string(),
    }
}

/// Build a region table entry
pub fn region(name: &str, zone_id: i64, lat: f64, lon: f64) -> Region {
    Region {
        name: name.to_string(),
        country_code: "XX".to_string(),
        location: Coordinate::new(lat, lon),
        zone_id,
    }
}

/// Build a member registry keyed by lowercase member name
pub fn registry(members: Vec<RawMember>) -> BTreeMap<String, RawMember> {
    members
        .into_iter()
        .map(|m| (m.name.to_lowercase(), m))
        .collect()
}

/// Helper to create a minimal GeoDnsConfig for testing
pub fn minimal_config(host: &str) -> GeoDnsConfig {
    GeoDnsConfig {
        source: SourceConfig::Custom {
            factory: "static".to_string(),
            config: serde_json::json!({}),
        },
        provider: ProviderConfig::Custom {
            factory: "memory".to_string(),
            config: serde_json::json!({}),
        },
        reconcile: ReconcileConfig::new(host).with_min_level(5),
        engine: EngineConfig {
            dry_run: false,
            event_channel_capacity: 100,
        },
    }
}
