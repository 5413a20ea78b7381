//! Error types for the GeoDNS reconciliation system
//!
//! The taxonomy separates registry data problems (`DataValidation`,
//! `DuplicateRecordKey`) from provider boundary failures
//! (`ProviderUnavailable`, `ProviderAuth`, `ProviderData`). The core never
//! retries provider failures; retry policy belongs to the caller.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the GeoDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing required fields in member/region input
    #[error("invalid registry data: {0}")]
    DataValidation(String),

    /// Transport-level failure talking to the DNS provider
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Authentication rejected by the DNS provider
    #[error("provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Provider response could not be decoded into the expected shape,
    /// or the provider rejected an operation outright
    #[error("provider data error: {0}")]
    ProviderData(String),

    /// Two existing records collide on the same (host, zone id) key
    #[error("duplicate record key {host}/{zone_id}")]
    DuplicateRecordKey {
        /// Host label of the colliding records
        host: String,
        /// Geo-routing key of the colliding records
        zone_id: i64,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while loading registry fixtures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a data validation error
    pub fn data_validation(msg: impl Into<String>) -> Self {
        Self::DataValidation(msg.into())
    }

    /// Create a provider-unavailable error
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a provider authentication error
    pub fn provider_auth(msg: impl Into<String>) -> Self {
        Self::ProviderAuth(msg.into())
    }

    /// Create a provider data error
    pub fn provider_data(msg: impl Into<String>) -> Self {
        Self::ProviderData(msg.into())
    }

    /// Create a duplicate record key error
    pub fn duplicate_key(host: impl Into<String>, zone_id: i64) -> Self {
        Self::DuplicateRecordKey {
            host: host.into(),
            zone_id,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if this error came from the provider boundary
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::ProviderAuth(_) | Self::ProviderData(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_classified() {
        assert!(Error::provider_unavailable("timeout").is_provider_error());
        assert!(Error::provider_auth("401").is_provider_error());
        assert!(Error::provider_data("bad json").is_provider_error());
        assert!(!Error::data_validation("bad latitude").is_provider_error());
        assert!(!Error::duplicate_key("sys", 3).is_provider_error());
    }

    #[test]
    fn duplicate_key_display_names_the_key() {
        let err = Error::duplicate_key("sys", 42);
        assert_eq!(err.to_string(), "duplicate record key sys/42");
    }
}
