//! Eligibility filtering of the member registry
//!
//! Turns the raw, string-encoded member registry into the set of endpoints
//! the assignment engine may choose from. Ineligible members are silently
//! excluded from the result but each exclusion is recorded in the stats so
//! the caller can log them; nothing here prints or fails the run.

use std::collections::BTreeMap;

use crate::model::{Coordinate, Endpoint, RawMember};

/// Why a member was excluded from the eligible set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No service address configured
    MissingAddress,
    /// Qualification tier below the configured minimum
    BelowMinimumLevel {
        /// The member's tier
        level: u8,
        /// The configured minimum
        minimum: u8,
    },
    /// Active flag not set to "1"
    Inactive,
    /// Coordinate is the (0, 0) "unset" sentinel
    UnsetCoordinate,
    /// A string-encoded numeric field failed to parse
    InvalidField {
        /// Field name in the registry shape
        field: &'static str,
        /// The offending value
        value: String,
    },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAddress => write!(f, "no service address"),
            Self::BelowMinimumLevel { level, minimum } => {
                write!(f, "level {level} below minimum {minimum}")
            }
            Self::Inactive => write!(f, "not active"),
            Self::UnsetCoordinate => write!(f, "coordinate unset"),
            Self::InvalidField { field, value } => {
                write!(f, "unparseable {field}: {value:?}")
            }
        }
    }
}

/// One excluded member with the reason it fell out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    /// Registry key of the member
    pub member: String,
    /// Why it was excluded
    pub reason: ExclusionReason,
}

/// Observable result of a filter pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Members considered (size of the registry snapshot)
    pub considered: usize,
    /// Members that became eligible endpoints
    pub eligible: usize,
    /// Every exclusion, in registry key order
    pub excluded: Vec<Exclusion>,
}

/// Eligible endpoints plus diagnostics
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Eligible endpoints, in registry key order
    pub eligible: Vec<Endpoint>,
    /// Counts and exclusions for the diagnostic summary
    pub stats: FilterStats,
}

/// Filter the member registry down to eligible endpoints.
///
/// A member is eligible iff its service address is non-empty, its level
/// parses and is at least `min_level`, its active flag is "1", and its
/// coordinate parses and is not the (0, 0) sentinel. Parse failures are
/// exclusions, never panics or silent zero defaults.
///
/// The registry is a `BTreeMap` so both the eligible set and the exclusion
/// list come out in a deterministic order.
pub fn filter(members: &BTreeMap<String, RawMember>, min_level: u8) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    outcome.stats.considered = members.len();

    for (key, member) in members {
        match check(member, min_level) {
            Ok(endpoint) => outcome.eligible.push(endpoint),
            Err(reason) => outcome.stats.excluded.push(Exclusion {
                member: key.clone(),
                reason,
            }),
        }
    }

    outcome.stats.eligible = outcome.eligible.len();
    outcome
}

/// Check a single member, producing either an endpoint or the exclusion reason.
fn check(member: &RawMember, min_level: u8) -> Result<Endpoint, ExclusionReason> {
    if member.services_address.is_empty() {
        return Err(ExclusionReason::MissingAddress);
    }

    let level = parse_field::<u8>("current_level", &member.current_level)?;
    if level < min_level {
        return Err(ExclusionReason::BelowMinimumLevel {
            level,
            minimum: min_level,
        });
    }

    let active = parse_field::<u8>("active", &member.active)?;
    if active != 1 {
        return Err(ExclusionReason::Inactive);
    }

    let lat = parse_field::<f64>("latitude", &member.latitude)?;
    let lon = parse_field::<f64>("longitude", &member.longitude)?;
    let location = Coordinate::new(lat, lon);
    if location.is_unset() {
        return Err(ExclusionReason::UnsetCoordinate);
    }

    Ok(Endpoint {
        name: member.name.clone(),
        address: member.services_address.clone(),
        location,
        level,
    })
}

fn parse_field<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, ExclusionReason> {
    value.trim().parse().map_err(|_| ExclusionReason::InvalidField {
        field,
        value: value.to_string(),
    })
}
