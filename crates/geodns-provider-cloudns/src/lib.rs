// # ClouDNS GeoDNS Provider
//
// Adapter for the ClouDNS DNS API (https://www.cloudns.net/wiki/article/42/).
//
// The API is form-encoded over POST for every call, including reads. Records
// carry their geo-routing key in a `geodns-location` field; in responses it
// arrives string-encoded, in requests it is sent as the numeric zone id.
//
// ## API Reference
//
// - List records: POST `/dns/records.json` (response is a JSON object keyed
//   by record id, or `[]` for an empty zone)
// - Create record: POST `/dns/add-record.json`
// - Update record: POST `/dns/mod-record.json`
//
// All three expect HTTP 200; logical failures come back as 200 with a
// `{"status": "Failed", "statusDescription": ...}` body.
//
// This adapter is single-shot: no retries, no caching, no spawned tasks.
// Failure policy lives with the engine.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use geodns_core::config::ProviderConfig;
use geodns_core::model::{ExistingRecord, Operation};
use geodns_core::traits::{DnsProvider, DnsProviderFactory};
use geodns_core::{Error, Result};

/// ClouDNS API base URL
const CLOUDNS_API_BASE: &str = "https://api.cloudns.net/dns";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One record as ClouDNS returns it. Every field, including TTL and the
/// geo id, is a JSON string.
#[derive(Debug, Clone, Deserialize)]
struct ClouDnsRecord {
    id: String,
    host: String,
    #[serde(rename = "type")]
    record_type: String,
    record: String,
    #[serde(rename = "geodns-location", default)]
    geodns_location: String,
}

/// ClouDNS DNS provider.
///
/// Credentials are a sub-auth user id and password, sent with every request.
/// The Debug implementation does not expose the password.
pub struct ClouDnsProvider {
    auth_id: String,
    password: String,
    domain: String,
    ttl: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for ClouDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClouDnsProvider")
            .field("auth_id", &self.auth_id)
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ClouDnsProvider {
    /// Create a new ClouDNS provider.
    ///
    /// Credentials are validated by the factory; this constructor only
    /// builds the HTTP client.
    pub fn new(
        auth_id: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
        ttl: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            auth_id: auth_id.into(),
            password: password.into(),
            domain: domain.into(),
            ttl,
            client,
        })
    }

    /// Auth and domain form fields common to every call
    fn base_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sub-auth-user", self.auth_id.clone()),
            ("auth-password", self.password.clone()),
            ("domain-name", self.domain.clone()),
        ]
    }

    /// Build the full form payload for a mutating operation.
    ///
    /// Returns `None` for a no-op, which needs no API call.
    fn operation_form(&self, operation: &Operation) -> Option<(&'static str, Vec<(&'static str, String)>)> {
        let mut form = self.base_form();
        match operation {
            Operation::Create { host, zone_id, value } => {
                form.push(("record-type", "A".to_string()));
                form.push(("host", host.clone()));
                form.push(("record", value.clone()));
                form.push(("ttl", self.ttl.to_string()));
                form.push(("geodns-location", zone_id.to_string()));
                Some(("add-record.json", form))
            }
            Operation::Update {
                record_id,
                host,
                zone_id,
                value,
            } => {
                form.push(("record-id", record_id.clone()));
                form.push(("host", host.clone()));
                form.push(("record", value.clone()));
                form.push(("ttl", self.ttl.to_string()));
                form.push(("geodns-location", zone_id.to_string()));
                Some(("mod-record.json", form))
            }
            Operation::NoOp { .. } => None,
        }
    }

    async fn post_form(&self, endpoint: &str, form: &[(&'static str, String)]) -> Result<String> {
        let url = format!("{CLOUDNS_API_BASE}/{endpoint}");

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::provider_unavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider_unavailable(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return match status.as_u16() {
                401 | 403 => Err(Error::provider_auth(format!(
                    "ClouDNS rejected credentials: {status}"
                ))),
                _ => Err(Error::provider_data(format!(
                    "ClouDNS returned {status}: {body}"
                ))),
            };
        }

        // Logical failures arrive with HTTP 200 and a status body.
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if value.get("status").and_then(Value::as_str) == Some("Failed") {
                let description = value
                    .get("statusDescription")
                    .and_then(Value::as_str)
                    .unwrap_or("no description");
                return Err(Error::provider_data(format!(
                    "ClouDNS rejected the operation: {description}"
                )));
            }
        }

        Ok(body)
    }
}

/// Parse a records.json response body into the normalized record shape.
///
/// Keeps A records for `host` that carry a parseable geo id. Records
/// without one are not geo-routed and are ignored.
fn parse_records(body: &str, host: &str) -> Result<Vec<ExistingRecord>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::provider_data(format!("ClouDNS records response is not JSON: {e}")))?;

    // An empty zone comes back as [] instead of {}.
    if matches!(&value, Value::Array(items) if items.is_empty()) {
        return Ok(Vec::new());
    }

    let by_id: HashMap<String, ClouDnsRecord> = serde_json::from_value(value).map_err(|e| {
        Error::provider_data(format!("unexpected ClouDNS records shape: {e}"))
    })?;

    let mut records = Vec::new();
    for record in by_id.into_values() {
        if record.host != host || record.record_type != "A" {
            continue;
        }
        let zone_id: i64 = match record.geodns_location.parse() {
            Ok(id) => id,
            Err(_) => {
                tracing::debug!(
                    record_id = %record.id,
                    "skipping record without a geo-routing id"
                );
                continue;
            }
        };
        records.push(ExistingRecord {
            id: record.id,
            host: record.host,
            zone_id,
            value: record.record,
        });
    }
    Ok(records)
}

#[async_trait]
impl DnsProvider for ClouDnsProvider {
    async fn current_records(&self, host: &str) -> Result<Vec<ExistingRecord>> {
        let body = self.post_form("records.json", &self.base_form()).await?;
        let records = parse_records(&body, host)?;
        tracing::debug!(
            host,
            count = records.len(),
            "fetched current ClouDNS records"
        );
        Ok(records)
    }

    async fn apply(&self, operation: &Operation) -> Result<()> {
        let Some((endpoint, form)) = self.operation_form(operation) else {
            return Ok(());
        };

        tracing::info!(
            kind = operation.kind(),
            host = operation.host(),
            zone_id = operation.zone_id(),
            "applying ClouDNS operation"
        );
        self.post_form(endpoint, &form).await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudns"
    }
}

/// Factory for creating ClouDNS providers
pub struct ClouDnsFactory;

impl DnsProviderFactory for ClouDnsFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::ClouDns {
                auth_id,
                password,
                domain,
                ttl,
            } => {
                config.validate()?;
                Ok(Box::new(ClouDnsProvider::new(
                    auth_id.clone(),
                    password.clone(),
                    domain.clone(),
                    *ttl,
                )?))
            }
            _ => Err(Error::config("invalid config for ClouDNS provider")),
        }
    }
}

/// Register the ClouDNS provider with a registry
pub fn register(registry: &geodns_core::ProviderRegistry) {
    registry.register_provider("cloudns", Box::new(ClouDnsFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ClouDnsProvider {
        ClouDnsProvider::new("sub-user", "pw", "example.net", 60).expect("provider builds")
    }

    #[test]
    fn records_response_object_is_parsed_and_filtered() {
        let body = r#"{
            "101": {"id": "101", "host": "sys", "ttl": "60", "type": "A",
                    "record": "192.0.2.1", "geodns-location": "15"},
            "102": {"id": "102", "host": "sys", "ttl": "60", "type": "AAAA",
                    "record": "2001:db8::1", "geodns-location": "15"},
            "103": {"id": "103", "host": "www", "ttl": "60", "type": "A",
                    "record": "192.0.2.2", "geodns-location": "7"},
            "104": {"id": "104", "host": "sys", "ttl": "60", "type": "A",
                    "record": "192.0.2.3"}
        }"#;

        let records = parse_records(body, "sys").expect("parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "101");
        assert_eq!(records[0].zone_id, 15);
        assert_eq!(records[0].value, "192.0.2.1");
    }

    #[test]
    fn empty_zone_array_parses_to_no_records() {
        let records = parse_records("[]", "sys").expect("parses");
        assert!(records.is_empty());
    }

    #[test]
    fn garbage_response_is_a_provider_data_error() {
        let err = parse_records("not json", "sys").unwrap_err();
        assert!(matches!(err, Error::ProviderData(_)));
    }

    #[test]
    fn create_form_carries_all_cloudns_fields() {
        let operation = Operation::Create {
            host: "sys".to_string(),
            zone_id: 15,
            value: "192.0.2.1".to_string(),
        };

        let (endpoint, form) = provider().operation_form(&operation).expect("create posts");
        assert_eq!(endpoint, "add-record.json");

        let get = |key| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("sub-auth-user"), Some("sub-user"));
        assert_eq!(get("domain-name"), Some("example.net"));
        assert_eq!(get("record-type"), Some("A"));
        assert_eq!(get("host"), Some("sys"));
        assert_eq!(get("record"), Some("192.0.2.1"));
        assert_eq!(get("ttl"), Some("60"));
        assert_eq!(get("geodns-location"), Some("15"));
        assert_eq!(get("record-id"), None);
    }

    #[test]
    fn update_form_targets_the_existing_record() {
        let operation = Operation::Update {
            record_id: "101".to_string(),
            host: "sys".to_string(),
            zone_id: 15,
            value: "198.51.100.9".to_string(),
        };

        let (endpoint, form) = provider().operation_form(&operation).expect("update posts");
        assert_eq!(endpoint, "mod-record.json");
        assert!(form.iter().any(|(k, v)| *k == "record-id" && v == "101"));
        assert!(form.iter().any(|(k, v)| *k == "record" && v == "198.51.100.9"));
    }

    #[test]
    fn noop_needs_no_api_call() {
        let operation = Operation::NoOp {
            host: "sys".to_string(),
            zone_id: 15,
        };
        assert!(provider().operation_form(&operation).is_none());
    }

    #[test]
    fn password_is_not_exposed_in_debug() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("pw\""));
        assert!(debug.contains("<REDACTED>"));
    }

    #[test]
    fn factory_rejects_mismatched_config() {
        let config = ProviderConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };
        assert!(ClouDnsFactory.create(&config).is_err());
    }

    #[test]
    fn factory_rejects_empty_credentials() {
        let config = ProviderConfig::ClouDns {
            auth_id: String::new(),
            password: "pw".to_string(),
            domain: "example.net".to_string(),
            ttl: 60,
        };
        assert!(ClouDnsFactory.create(&config).is_err());
    }

    #[test]
    fn factory_builds_a_named_provider() {
        let config = ProviderConfig::ClouDns {
            auth_id: "sub-user".to_string(),
            password: "pw".to_string(),
            domain: "example.net".to_string(),
            ttl: 60,
        };
        let provider = ClouDnsFactory.create(&config).expect("factory succeeds");
        assert_eq!(provider.provider_name(), "cloudns");
    }
}
