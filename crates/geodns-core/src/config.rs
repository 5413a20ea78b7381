//! Configuration types for the GeoDNS system
//!
//! All configuration is injected: the core holds no global credentials or
//! domain constants. Providers receive their credentials through
//! [`ProviderConfig`] at construction time.

use serde::{Deserialize, Serialize};

/// Main GeoDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoDnsConfig {
    /// Registry source configuration
    pub source: SourceConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Reconciliation settings
    pub reconcile: ReconcileConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl GeoDnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.reconcile.validate()?;
        self.provider.validate()?;
        self.source.validate()?;
        Ok(())
    }
}

/// Registry source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON fixtures on disk
    File {
        /// Path to the members file
        members_path: String,
        /// Path to the regions (countries) file
        regions_path: String,
    },

    /// Custom registry source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::File {
                members_path,
                regions_path,
            } => {
                if members_path.is_empty() {
                    return Err(crate::Error::config("members file path cannot be empty"));
                }
                if regions_path.is_empty() {
                    return Err(crate::Error::config("regions file path cannot be empty"));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("custom source factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom source config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::File { .. } => "file",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// ClouDNS provider (form-encoded API, sub-auth user)
    #[serde(rename = "cloudns")]
    ClouDns {
        /// Sub-auth user ID
        auth_id: String,
        /// Auth password
        password: String,
        /// Domain the records live under
        domain: String,
        /// TTL for created/updated records, in seconds
        #[serde(default = "default_ttl")]
        ttl: u32,
    },

    /// EasyDNS provider (JSON REST API, basic auth)
    #[serde(rename = "easydns")]
    EasyDns {
        /// API key
        api_key: String,
        /// API secret
        api_secret: String,
        /// Domain the records live under
        domain: String,
        /// TTL for created/updated records, in seconds
        #[serde(default = "default_ttl")]
        ttl: u32,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::ClouDns {
                auth_id,
                password,
                domain,
                ttl,
            } => {
                if auth_id.is_empty() || password.is_empty() {
                    return Err(crate::Error::config("ClouDNS credentials cannot be empty"));
                }
                if domain.is_empty() {
                    return Err(crate::Error::config("ClouDNS domain cannot be empty"));
                }
                if *ttl == 0 {
                    return Err(crate::Error::config("TTL must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::EasyDns {
                api_key,
                api_secret,
                domain,
                ttl,
            } => {
                if api_key.is_empty() || api_secret.is_empty() {
                    return Err(crate::Error::config("EasyDNS credentials cannot be empty"));
                }
                if domain.is_empty() {
                    return Err(crate::Error::config("EasyDNS domain cannot be empty"));
                }
                if *ttl == 0 {
                    return Err(crate::Error::config("TTL must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::ClouDns { .. } => "cloudns",
            ProviderConfig::EasyDns { .. } => "easydns",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Host label the geo records answer for (e.g. "sys")
    pub host: String,

    /// Minimum qualification tier a member needs to be eligible
    #[serde(default = "default_min_level")]
    pub min_level: u8,

    /// Fail the run on duplicate (host, zone id) keys instead of keeping
    /// the first record and warning
    #[serde(default)]
    pub strict_index: bool,
}

impl ReconcileConfig {
    /// Create settings for one host with the defaults
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            min_level: default_min_level(),
            strict_index: false,
        }
    }

    /// Set the minimum qualification tier
    pub fn with_min_level(mut self, min_level: u8) -> Self {
        self.min_level = min_level;
        self
    }

    /// Validate the reconciliation settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("host label cannot be empty"));
        }
        if self.host.len() > 63 {
            return Err(crate::Error::config(format!(
                "host label too long: {} chars (max 63)",
                self.host.len()
            )));
        }
        if !self
            .host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
            || self.host.starts_with('-')
            || self.host.ends_with('-')
        {
            return Err(crate::Error::config(format!(
                "host label contains invalid characters: {:?}",
                self.host
            )));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Compute and report the plan without calling the provider's
    /// mutating endpoints
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine event channel.
    ///
    /// When full, further events are dropped with a warning rather than
    /// blocking the run.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_min_level() -> u8 {
    5
}

fn default_ttl() -> u32 {
    60
}

fn default_event_channel_capacity() -> usize {
    256
}
