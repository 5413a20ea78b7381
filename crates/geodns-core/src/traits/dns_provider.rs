// # DNS Provider Trait
//
// Defines the interface for reading and converging geo-routed DNS records
// via provider APIs.
//
// ## Implementations
//
// - ClouDNS: `geodns-provider-cloudns` crate
// - EasyDNS: `geodns-provider-easydns` crate
//
// The core depends only on this interface. Provider selection, credentials
// and the wire-level field naming differences between backends are entirely
// the adapter's concern; nothing provider-specific leaks into the core's
// data model.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ExistingRecord, Operation};

/// Trait for DNS provider implementations.
///
/// # Error taxonomy
///
/// Both methods fail with `ProviderUnavailable` on transport failure,
/// `ProviderAuth` on auth-related non-2xx responses, and `ProviderData`
/// when the response cannot be decoded into the expected record shape.
///
/// # No retries
///
/// Implementations make single-shot API calls and propagate failures.
/// Retry and backoff, if wanted, are the caller's policy, layered around
/// the engine. Providers must not spawn tasks, cache records between calls,
/// or decide for themselves whether an operation is needed.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch the current record set for one host label.
    ///
    /// Returns every address record the provider holds for `host`,
    /// normalized to [`ExistingRecord`]. Records for other hosts or other
    /// record types are filtered out inside the adapter.
    async fn current_records(&self, host: &str) -> Result<Vec<ExistingRecord>>;

    /// Apply a single reconciliation operation.
    ///
    /// The engine never sends [`Operation::NoOp`] here, but an
    /// implementation receiving one must succeed without an API call.
    /// Create and update success statuses differ by provider and are
    /// validated per implementation, not assumed uniform.
    async fn apply(&self, operation: &Operation) -> Result<()>;

    /// Provider name for logging/debugging (e.g. "cloudns", "easydns")
    fn provider_name(&self) -> &'static str;
}

impl std::fmt::Debug for dyn DnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsProvider")
            .field("provider_name", &self.provider_name())
            .finish()
    }
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a provider instance from configuration
    fn create(&self, config: &crate::config::ProviderConfig) -> Result<Box<dyn DnsProvider>>;
}
