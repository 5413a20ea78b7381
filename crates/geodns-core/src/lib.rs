//! # geodns-core
//!
//! Core library for the GeoDNS reconciliation system.
//!
//! The system assigns each geographic region to the nearest eligible
//! service endpoint and converges a DNS provider's geo-routed record set
//! toward that assignment with minimal, idempotent create/update
//! operations.
//!
//! ## Architecture Overview
//!
//! - **eligibility**: filters the member registry down to eligible endpoints
//! - **geo**: great-circle distance (haversine, 6371 km sphere)
//! - **assignment**: nearest-endpoint selection per region, deterministic
//!   tie-breaking
//! - **index**: (host, zone id) index of the provider's existing records
//! - **reconcile**: diff of desired vs. existing state into operations
//! - **engine**: orchestrates one run-to-completion reconciliation
//! - **traits**: the [`DnsProvider`] and [`RegistrySource`] collaborator
//!   seams
//! - **registry**: plugin registry for provider/source factories
//!
//! ## Design Principles
//!
//! 1. **Separation of Concerns**: the core computes; adapters do I/O
//! 2. **Plugin-Based**: providers and sources are registered dynamically
//! 3. **No Deletes**: reconciliation only creates and updates; stale
//!    records are reported as orphans, never removed
//! 4. **Determinism**: fixed region order and a documented tie-break rule
//!    make runs reproducible
//! 5. **Run-to-Completion**: no persistent core state between runs; the
//!    provider's record set is the source of truth

pub mod assignment;
pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod geo;
pub mod index;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{GeoDnsConfig, ProviderConfig, ReconcileConfig, SourceConfig};
pub use engine::{EngineEvent, GeoDnsEngine, RunReport};
pub use error::{Error, Result};
pub use model::{Assignment, Coordinate, Endpoint, ExistingRecord, Operation, RawMember, Region};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, RegistrySource};
