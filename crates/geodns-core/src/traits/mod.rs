//! Core traits for the GeoDNS system
//!
//! These are the seams between the reconciliation core and its external
//! collaborators:
//!
//! - [`DnsProvider`]: read and converge the provider's record set
//! - [`RegistrySource`]: load member and region reference data

pub mod dns_provider;
pub mod registry_source;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
pub use registry_source::{RegistrySource, RegistrySourceFactory};
