// # geodnsd - GeoDNS Reconciliation Binary
//
// Thin integration layer. All reconciliation logic lives in geodns-core;
// this binary reads configuration from environment variables, registers the
// built-in providers and the file source, runs exactly one reconciliation
// and exits. Scheduling repeated runs belongs to cron or a systemd timer,
// not to this process.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Registry source
// - `GEODNS_MEMBERS_FILE`: path to the members JSON fixture
// - `GEODNS_REGIONS_FILE`: path to the regions (countries) JSON fixture
//
// ### DNS provider
// - `GEODNS_PROVIDER_TYPE`: provider type (cloudns, easydns; default cloudns)
// - `GEODNS_PROVIDER_API_KEY`: API key (ClouDNS sub-auth user / EasyDNS key)
// - `GEODNS_PROVIDER_API_SECRET`: API secret (ClouDNS password / EasyDNS secret)
// - `GEODNS_DOMAIN`: domain the geo records live under
// - `GEODNS_TTL`: record TTL in seconds (default 60)
//
// ### Reconciliation
// - `GEODNS_HOST`: host label to reconcile (e.g. "sys")
// - `GEODNS_MIN_LEVEL`: minimum member qualification level (default 5)
// - `GEODNS_STRICT_INDEX`: fail on duplicate record keys (default false)
// - `GEODNS_MODE`: "live" or "dry-run" (default live)
//
// ### Logging
// - `GEODNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Exit codes
//
// - 0: run completed, every operation applied (or nothing to do)
// - 1: configuration error
// - 2: runtime error (load failure, provider fetch failure, strict-index hit)
// - 3: run completed but some operations failed at the provider
//
// ## Example
//
// ```bash
// export GEODNS_PROVIDER_TYPE=easydns
// export GEODNS_PROVIDER_API_KEY=your_key
// export GEODNS_PROVIDER_API_SECRET=your_secret
// export GEODNS_DOMAIN=example.net
// export GEODNS_HOST=sys
// export GEODNS_MEMBERS_FILE=/etc/geodns/members.json
// export GEODNS_REGIONS_FILE=/etc/geodns/countries.json
//
// geodnsd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use geodns_core::config::{
    EngineConfig, GeoDnsConfig, ProviderConfig, ReconcileConfig, SourceConfig,
};
use geodns_core::engine::EngineEvent;
use geodns_core::{GeoDnsEngine, ProviderRegistry, RunReport};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq)]
enum GeoDnsExitCode {
    /// Run completed with every operation applied
    Clean = 0,
    /// Configuration error
    ConfigError = 1,
    /// Runtime error before or during the run
    RuntimeError = 2,
    /// Run completed but some operations failed at the provider
    PartialFailure = 3,
}

impl From<GeoDnsExitCode> for ExitCode {
    fn from(code: GeoDnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration, read from the environment
struct Config {
    provider_type: String,
    api_key: String,
    api_secret: String,
    domain: String,
    ttl: u32,
    host: String,
    min_level: u8,
    strict_index: bool,
    dry_run: bool,
    members_file: String,
    regions_file: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            provider_type: env::var("GEODNS_PROVIDER_TYPE")
                .unwrap_or_else(|_| "cloudns".to_string()),
            api_key: env::var("GEODNS_PROVIDER_API_KEY").unwrap_or_default(),
            api_secret: env::var("GEODNS_PROVIDER_API_SECRET").unwrap_or_default(),
            domain: env::var("GEODNS_DOMAIN").unwrap_or_default(),
            ttl: parse_env("GEODNS_TTL", 60)?,
            host: env::var("GEODNS_HOST").unwrap_or_default(),
            min_level: parse_env("GEODNS_MIN_LEVEL", 5)?,
            strict_index: parse_env("GEODNS_STRICT_INDEX", false)?,
            dry_run: match env::var("GEODNS_MODE") {
                Ok(mode) => match mode.to_lowercase().as_str() {
                    "dry-run" => true,
                    "live" => false,
                    other => anyhow::bail!(
                        "GEODNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                        other
                    ),
                },
                Err(_) => false,
            },
            members_file: env::var("GEODNS_MEMBERS_FILE").unwrap_or_default(),
            regions_file: env::var("GEODNS_REGIONS_FILE").unwrap_or_default(),
            log_level: env::var("GEODNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration.
    ///
    /// Structural validation (host label shape, TTL range, credential
    /// presence) is owned by geodns-core's config types; this catches the
    /// environment-level mistakes with actionable messages.
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "cloudns" | "easydns" => {}
            other => anyhow::bail!(
                "GEODNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudns, easydns",
                other
            ),
        }

        if self.api_key.is_empty() {
            anyhow::bail!(
                "GEODNS_PROVIDER_API_KEY is required. \
                Set it via: export GEODNS_PROVIDER_API_KEY=your_key"
            );
        }
        if self.api_secret.is_empty() {
            anyhow::bail!(
                "GEODNS_PROVIDER_API_SECRET is required. \
                Set it via: export GEODNS_PROVIDER_API_SECRET=your_secret"
            );
        }

        // Catch the obvious placeholder credentials early
        let key_lower = self.api_key.to_lowercase();
        if key_lower.contains("your_key") || key_lower.contains("replace_me") {
            anyhow::bail!(
                "GEODNS_PROVIDER_API_KEY appears to be a placeholder. \
                Use actual credentials from your DNS provider."
            );
        }

        if self.domain.is_empty() {
            anyhow::bail!(
                "GEODNS_DOMAIN is required. \
                Set it via: export GEODNS_DOMAIN=example.net"
            );
        }
        validate_domain_name(&self.domain)?;

        if self.host.is_empty() {
            anyhow::bail!(
                "GEODNS_HOST is required. \
                Set it via: export GEODNS_HOST=sys"
            );
        }

        if self.ttl == 0 || self.ttl > 86_400 {
            anyhow::bail!(
                "GEODNS_TTL must be between 1 and 86400 seconds. Got: {}",
                self.ttl
            );
        }

        if self.members_file.is_empty() {
            anyhow::bail!(
                "GEODNS_MEMBERS_FILE is required. \
                Set it via: export GEODNS_MEMBERS_FILE=/etc/geodns/members.json"
            );
        }
        if self.regions_file.is_empty() {
            anyhow::bail!(
                "GEODNS_REGIONS_FILE is required. \
                Set it via: export GEODNS_REGIONS_FILE=/etc/geodns/countries.json"
            );
        }
        for (name, path) in [
            ("GEODNS_MEMBERS_FILE", &self.members_file),
            ("GEODNS_REGIONS_FILE", &self.regions_file),
        ] {
            if !std::path::Path::new(path).exists() {
                anyhow::bail!("{} does not exist: {}", name, path);
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "GEODNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }

    /// Build the core configuration from the validated environment
    fn to_geodns_config(&self) -> GeoDnsConfig {
        let provider = match self.provider_type.as_str() {
            "easydns" => ProviderConfig::EasyDns {
                api_key: self.api_key.clone(),
                api_secret: self.api_secret.clone(),
                domain: self.domain.clone(),
                ttl: self.ttl,
            },
            _ => ProviderConfig::ClouDns {
                auth_id: self.api_key.clone(),
                password: self.api_secret.clone(),
                domain: self.domain.clone(),
                ttl: self.ttl,
            },
        };

        GeoDnsConfig {
            source: SourceConfig::File {
                members_path: self.members_file.clone(),
                regions_path: self.regions_file.clone(),
            },
            provider,
            reconcile: ReconcileConfig {
                host: self.host.clone(),
                min_level: self.min_level,
                strict_index: self.strict_index,
            },
            engine: EngineConfig {
                dry_run: self.dry_run,
                ..EngineConfig::default()
            },
        }
    }
}

/// Parse an optional environment variable, falling back to a default
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Basic DNS domain name validation per RFC 1035
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-')
            || label.starts_with('-')
            || label.ends_with('-')
        {
            anyhow::bail!("Domain label is not valid: '{}'", label);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return GeoDnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return GeoDnsExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return GeoDnsExitCode::ConfigError.into();
    }

    info!(
        provider = %config.provider_type,
        host = %config.host,
        domain = %config.domain,
        dry_run = config.dry_run,
        "starting geodnsd"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return GeoDnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_once(config)).into()
}

/// Run one reconciliation to completion
async fn run_once(config: Config) -> GeoDnsExitCode {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudns")]
    geodns_provider_cloudns::register(&registry);

    #[cfg(feature = "easydns")]
    geodns_provider_easydns::register(&registry);

    geodns_source_file::register(&registry);

    if !registry.has_provider(&config.provider_type) {
        error!(
            provider = %config.provider_type,
            "provider support was not compiled into this binary"
        );
        return GeoDnsExitCode::ConfigError;
    }

    let geodns_config = config.to_geodns_config();

    let source = match registry.create_source(&geodns_config.source) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create registry source: {}", e);
            return GeoDnsExitCode::ConfigError;
        }
    };
    let provider = match registry.create_provider(&geodns_config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create DNS provider: {}", e);
            return GeoDnsExitCode::ConfigError;
        }
    };

    let (engine, mut events) = match GeoDnsEngine::new(source, provider, geodns_config) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to construct engine: {}", e);
            return GeoDnsExitCode::ConfigError;
        }
    };

    // Drain engine events as the run progresses
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let result = engine.run().await;
    // Dropping the engine closes the event channel; the drain task then
    // finishes after logging any remaining events.
    drop(engine);
    let _ = event_task.await;

    match result {
        Ok(report) => {
            log_summary(&report);
            if report.has_failures() {
                GeoDnsExitCode::PartialFailure
            } else {
                GeoDnsExitCode::Clean
            }
        }
        Err(e) => {
            error!("Reconciliation run failed: {}", e);
            GeoDnsExitCode::RuntimeError
        }
    }
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::Started { members, regions } => {
            info!(members, regions, "run started");
        }
        EngineEvent::RegionAssigned {
            region,
            endpoint,
            distance_km,
        } => {
            debug!(%region, %endpoint, distance_km, "region assigned");
        }
        EngineEvent::ApplySucceeded { zone_id, kind } => {
            debug!(zone_id, kind, "operation applied");
        }
        EngineEvent::ApplySkipped { zone_id } => {
            debug!(zone_id, "record already converged");
        }
        EngineEvent::ApplyFailed { zone_id, error } => {
            warn!(zone_id, %error, "operation failed");
        }
        EngineEvent::Finished {
            creates,
            updates,
            noops,
            failures,
        } => {
            info!(creates, updates, noops, failures, "run finished");
        }
    }
}

fn log_summary(report: &RunReport) {
    info!(
        host = %report.host,
        dry_run = report.dry_run,
        considered = report.filter.considered,
        eligible = report.filter.eligible,
        assignments = report.assignments.len(),
        creates = report.creates(),
        updates = report.updates(),
        noops = report.noops(),
        failures = report.failures(),
        duration_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "reconciliation summary"
    );
    for region in &report.unassigned_regions {
        warn!(%region, "region received no assignment");
    }
    if !report.duplicate_keys.is_empty() {
        warn!(
            count = report.duplicate_keys.len(),
            "duplicate record keys at provider (first record kept)"
        );
    }
    if !report.orphans.is_empty() {
        warn!(
            count = report.orphans.len(),
            "orphaned records left untouched"
        );
    }
}
