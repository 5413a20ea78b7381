// # EasyDNS GeoDNS Provider
//
// Adapter for the EasyDNS REST API (https://docs.sandbox.rest.easydns.net/).
//
// JSON over HTTPS with basic auth (API key and secret). Records carry their
// geo-routing key in a `geozone_id` field, string-encoded in responses and
// numeric in request payloads.
//
// ## API Reference
//
// - List records: GET `/zones/records/all/{domain}?format=json`, expects 200,
//   body is `{"tm": ..., "data": [...]}`
// - Create record: PUT `/zones/records/add/{domain}/A`, expects 201
// - Update record: POST `/zones/records/{id}`, expects 200
//
// Create and update succeed with different statuses; each call checks its
// own. Single-shot like every provider: no retries, no caching, no tasks.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use geodns_core::config::ProviderConfig;
use geodns_core::model::{ExistingRecord, Operation};
use geodns_core::traits::{DnsProvider, DnsProviderFactory};
use geodns_core::{Error, Result};

/// EasyDNS REST API base URL
const EASYDNS_API_BASE: &str = "https://rest.easydns.net";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One record as EasyDNS returns it. Numeric-looking fields arrive as
/// JSON strings.
#[derive(Debug, Clone, Deserialize)]
struct EasyDnsRecord {
    id: String,
    host: String,
    #[serde(rename = "type")]
    record_type: String,
    rdata: String,
    #[serde(default)]
    geozone_id: String,
}

/// Envelope around every list response
#[derive(Debug, Deserialize)]
struct EasyDnsListResponse {
    #[allow(dead_code)]
    tm: i64,
    data: Vec<EasyDnsRecord>,
}

/// Payload for create and update calls
#[derive(Debug, Serialize, PartialEq)]
struct EasyDnsPayload {
    domain: String,
    host: String,
    ttl: u32,
    prio: u32,
    #[serde(rename = "type")]
    record_type: String,
    rdata: String,
    geozone_id: i64,
}

/// EasyDNS DNS provider.
///
/// The Debug implementation does not expose the API secret.
pub struct EasyDnsProvider {
    api_key: String,
    api_secret: String,
    domain: String,
    ttl: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for EasyDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasyDnsProvider")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl EasyDnsProvider {
    /// Create a new EasyDNS provider.
    ///
    /// Credentials are validated by the factory; this constructor only
    /// builds the HTTP client.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        domain: impl Into<String>,
        ttl: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            domain: domain.into(),
            ttl,
            client,
        })
    }

    /// Build the JSON payload for a mutating operation.
    ///
    /// Returns `None` for a no-op, which needs no API call.
    fn operation_payload(&self, operation: &Operation) -> Option<EasyDnsPayload> {
        let (host, zone_id, value) = match operation {
            Operation::Create { host, zone_id, value } => (host, zone_id, value),
            Operation::Update { host, zone_id, value, .. } => (host, zone_id, value),
            Operation::NoOp { .. } => return None,
        };
        Some(EasyDnsPayload {
            domain: self.domain.clone(),
            host: host.clone(),
            ttl: self.ttl,
            prio: 0,
            record_type: "A".to_string(),
            rdata: value.clone(),
            geozone_id: *zone_id,
        })
    }

    async fn check_status(
        response: reqwest::Response,
        expected: u16,
        action: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.as_u16() == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(Error::provider_auth(format!(
                "EasyDNS rejected credentials while {action}: {status}"
            ))),
            _ => Err(Error::provider_data(format!(
                "EasyDNS {action} returned {status} (expected {expected}): {body}"
            ))),
        }
    }
}

/// Keep A records for `host` that carry a parseable geo id. Records
/// without one are not geo-routed and are ignored.
fn normalize_records(data: Vec<EasyDnsRecord>, host: &str) -> Vec<ExistingRecord> {
    data.into_iter()
        .filter(|r| r.host == host && r.record_type == "A")
        .filter_map(|r| {
            let zone_id: i64 = match r.geozone_id.parse() {
                Ok(id) => id,
                Err(_) => {
                    tracing::debug!(record_id = %r.id, "skipping record without a geo-routing id");
                    return None;
                }
            };
            Some(ExistingRecord {
                id: r.id,
                host: r.host,
                zone_id,
                value: r.rdata,
            })
        })
        .collect()
}

#[async_trait]
impl DnsProvider for EasyDnsProvider {
    async fn current_records(&self, host: &str) -> Result<Vec<ExistingRecord>> {
        let url = format!(
            "{EASYDNS_API_BASE}/zones/records/all/{}?format=json",
            self.domain
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| Error::provider_unavailable(format!("HTTP request failed: {e}")))?;

        let response = Self::check_status(response, 200, "listing records").await?;

        let list: EasyDnsListResponse = response
            .json()
            .await
            .map_err(|e| Error::provider_data(format!("unexpected EasyDNS records shape: {e}")))?;

        let records = normalize_records(list.data, host);
        tracing::debug!(
            host,
            count = records.len(),
            "fetched current EasyDNS records"
        );
        Ok(records)
    }

    async fn apply(&self, operation: &Operation) -> Result<()> {
        let Some(payload) = self.operation_payload(operation) else {
            return Ok(());
        };

        tracing::info!(
            kind = operation.kind(),
            host = operation.host(),
            zone_id = operation.zone_id(),
            "applying EasyDNS operation"
        );

        match operation {
            Operation::Create { .. } => {
                let url = format!(
                    "{EASYDNS_API_BASE}/zones/records/add/{}/A",
                    self.domain
                );
                let response = self
                    .client
                    .put(&url)
                    .basic_auth(&self.api_key, Some(&self.api_secret))
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::provider_unavailable(format!("HTTP request failed: {e}")))?;
                Self::check_status(response, 201, "creating a record").await?;
            }
            Operation::Update { record_id, .. } => {
                let url = format!("{EASYDNS_API_BASE}/zones/records/{record_id}");
                let response = self
                    .client
                    .post(&url)
                    .basic_auth(&self.api_key, Some(&self.api_secret))
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::provider_unavailable(format!("HTTP request failed: {e}")))?;
                Self::check_status(response, 200, "updating a record").await?;
            }
            Operation::NoOp { .. } => {}
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "easydns"
    }
}

/// Factory for creating EasyDNS providers
pub struct EasyDnsFactory;

impl DnsProviderFactory for EasyDnsFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::EasyDns {
                api_key,
                api_secret,
                domain,
                ttl,
            } => {
                config.validate()?;
                Ok(Box::new(EasyDnsProvider::new(
                    api_key.clone(),
                    api_secret.clone(),
                    domain.clone(),
                    *ttl,
                )?))
            }
            _ => Err(Error::config("invalid config for EasyDNS provider")),
        }
    }
}

/// Register the EasyDNS provider with a registry
pub fn register(registry: &geodns_core::ProviderRegistry) {
    registry.register_provider("easydns", Box::new(EasyDnsFactory));
}
