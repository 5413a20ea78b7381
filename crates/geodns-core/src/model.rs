//! Data model for a reconciliation run
//!
//! All of these types are constructed fresh at the start of a run from the
//! collaborator snapshots (registry source, DNS provider) and discarded at
//! the end. The provider's record set is the only durable state.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinate {
    /// Create a new coordinate
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// The registry uses an exact (0, 0) pair as an "unset" sentinel.
    ///
    /// A member sitting precisely on the null island intersection is not a
    /// legitimate location in this data set.
    pub fn is_unset(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// A member registry record, exactly as the registry serializes it.
///
/// Numeric fields arrive string-encoded. They are parsed by the
/// eligibility filter, which records a per-member exclusion instead of
/// crashing or silently defaulting to zero when a field fails to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMember {
    /// Display name of the member
    #[serde(default)]
    pub name: String,

    /// Qualification tier, string-encoded integer
    #[serde(default)]
    pub current_level: String,

    /// Active flag, string-encoded integer ("1" = active)
    #[serde(default)]
    pub active: String,

    /// The address that becomes the DNS answer for regions assigned here
    #[serde(default)]
    pub services_address: String,

    /// Latitude, string-encoded decimal
    #[serde(default)]
    pub latitude: String,

    /// Longitude, string-encoded decimal
    #[serde(default)]
    pub longitude: String,
}

/// A service endpoint that passed eligibility filtering.
///
/// Invariant: `address` is non-empty, `location` is set (not the (0, 0)
/// sentinel), `level` met the configured minimum and the member was active
/// at the time the endpoint was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Member name, used as the deterministic tie-break key
    pub name: String,
    /// Network address used as the DNS answer
    pub address: String,
    /// Geographic location
    pub location: Coordinate,
    /// Qualification tier
    pub level: u8,
}

/// A geographic routing bucket the provider resolves by requester location.
///
/// Regions are read-only reference data for a run. The region table order
/// is the order reconciliation processes regions in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Display name (e.g. a country name)
    pub name: String,
    /// ISO country code
    pub country_code: String,
    /// Geographic location
    pub location: Coordinate,
    /// Provider-specific geo-routing key
    pub zone_id: i64,
}

/// A DNS record as it currently exists at the provider.
///
/// Provider-specific fields (TTL, priority, modification times) stay inside
/// the adapter; only what reconciliation needs crosses this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRecord {
    /// Provider record ID
    pub id: String,
    /// Host label the record answers for
    pub host: String,
    /// Geo-routing key
    pub zone_id: i64,
    /// Current answer value
    pub value: String,
}

/// One region's chosen endpoint, produced by the assignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Region name (for diagnostics)
    pub region: String,
    /// Geo-routing key of the region
    pub zone_id: i64,
    /// Winning endpoint's member name (for diagnostics)
    pub endpoint: String,
    /// Winning endpoint's address, the desired DNS answer
    pub value: String,
    /// Great-circle distance between region and endpoint, in km
    pub distance_km: f64,
}

/// A reconciliation operation against the provider.
///
/// Reconciliation never produces a delete: records for regions that are no
/// longer desired are left in place and reported as orphans instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// No record exists for the key yet
    Create {
        host: String,
        zone_id: i64,
        value: String,
    },

    /// A record exists but its answer differs from the desired one
    Update {
        record_id: String,
        host: String,
        zone_id: i64,
        value: String,
    },

    /// The existing record already matches the desired answer
    NoOp { host: String, zone_id: i64 },
}

impl Operation {
    /// Geo-routing key this operation targets
    pub fn zone_id(&self) -> i64 {
        match self {
            Operation::Create { zone_id, .. }
            | Operation::Update { zone_id, .. }
            | Operation::NoOp { zone_id, .. } => *zone_id,
        }
    }

    /// Host label this operation targets
    pub fn host(&self) -> &str {
        match self {
            Operation::Create { host, .. }
            | Operation::Update { host, .. }
            | Operation::NoOp { host, .. } => host,
        }
    }

    /// True for operations that require no provider call
    pub fn is_noop(&self) -> bool {
        matches!(self, Operation::NoOp { .. })
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Update { .. } => "update",
            Operation::NoOp { .. } => "noop",
        }
    }
}
