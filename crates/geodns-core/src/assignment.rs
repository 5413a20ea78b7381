//! Nearest-endpoint assignment
//!
//! For every region in the region table, picks the eligible endpoint with
//! the minimum great-circle distance. O(regions x endpoints), which is fine
//! at the tens-of-members scale this data set has.

use crate::geo;
use crate::model::{Assignment, Endpoint, Region};
use tracing::debug;

/// Assign every region to its nearest eligible endpoint.
///
/// Output is in region-table order, one entry per region. If the eligible
/// set is empty no assignments are produced; that is not an error and the
/// caller reports it in the run summary.
///
/// Tie-break rule: strictly smaller distance wins; at exactly equal
/// distance the lexicographically smaller endpoint name wins. This makes
/// the result independent of endpoint iteration order.
pub fn assign(regions: &[Region], endpoints: &[Endpoint]) -> Vec<Assignment> {
    if endpoints.is_empty() {
        return Vec::new();
    }

    regions
        .iter()
        .map(|region| {
            let mut best: Option<(&Endpoint, f64)> = None;

            for endpoint in endpoints {
                let distance = geo::distance_km(region.location, endpoint.location);
                debug!(
                    region = %region.name,
                    endpoint = %endpoint.name,
                    distance_km = distance,
                    "candidate distance"
                );

                let wins = match best {
                    None => true,
                    Some((current, current_distance)) => {
                        distance < current_distance
                            || (distance == current_distance && endpoint.name < current.name)
                    }
                };
                if wins {
                    best = Some((endpoint, distance));
                }
            }

            // endpoints is non-empty, so best is always set here
            let (endpoint, distance_km) = best.expect("non-empty endpoint set");
            Assignment {
                region: region.name.clone(),
                zone_id: region.zone_id,
                endpoint: endpoint.name.clone(),
                value: endpoint.address.clone(),
                distance_km,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    fn endpoint(name: &str, addr: &str, lat: f64, lon: f64) -> Endpoint {
        Endpoint {
            name: name.to_string(),
            address: addr.to_string(),
            location: Coordinate::new(lat, lon),
            level: 5,
        }
    }

    fn region(name: &str, zone_id: i64, lat: f64, lon: f64) -> Region {
        Region {
            name: name.to_string(),
            country_code: "XX".to_string(),
            location: Coordinate::new(lat, lon),
            zone_id,
        }
    }

    #[test]
    fn picks_the_nearest_endpoint() {
        let endpoints = vec![
            endpoint("near", "192.0.2.1", 0.0, 0.0),
            endpoint("far", "192.0.2.2", 50.0, 50.0),
        ];
        let regions = vec![region("r", 1, 1.0, 1.0)];

        let assignments = assign(&regions, &endpoints);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].value, "192.0.2.1");
        assert_eq!(assignments[0].endpoint, "near");
        assert!(assignments[0].distance_km < 200.0);
    }

    #[test]
    fn empty_eligible_set_yields_no_assignments() {
        let regions = vec![region("r", 1, 1.0, 1.0)];
        assert!(assign(&regions, &[]).is_empty());
    }

    #[test]
    fn output_is_in_region_table_order() {
        let endpoints = vec![endpoint("only", "192.0.2.1", 0.0, 0.0)];
        let regions = vec![
            region("second-alphabetically", 2, 10.0, 10.0),
            region("first-alphabetically", 1, 20.0, 20.0),
        ];

        let assignments = assign(&regions, &endpoints);
        assert_eq!(assignments[0].zone_id, 2);
        assert_eq!(assignments[1].zone_id, 1);
    }

    #[test]
    fn exact_ties_break_by_endpoint_name() {
        // Two endpoints equidistant from the region, placed symmetrically.
        let endpoints = vec![
            endpoint("west", "192.0.2.9", 0.0, -10.0),
            endpoint("east", "192.0.2.8", 0.0, 10.0),
        ];
        let regions = vec![region("r", 1, 0.0, 0.0)];

        let assignments = assign(&regions, &endpoints);
        assert_eq!(assignments[0].endpoint, "east");

        // Same winner regardless of the order endpoints are supplied in.
        let reversed: Vec<_> = endpoints.into_iter().rev().collect();
        let again = assign(&regions, &reversed);
        assert_eq!(again[0].endpoint, "east");
    }

    #[test]
    fn assignment_is_idempotent() {
        let endpoints = vec![
            endpoint("a", "192.0.2.1", 10.0, 10.0),
            endpoint("b", "192.0.2.2", -30.0, 140.0),
            endpoint("c", "192.0.2.3", 48.0, 2.0),
        ];
        let regions = vec![
            region("r1", 1, 1.0, 1.0),
            region("r2", 2, 47.0, 8.0),
            region("r3", 3, -25.0, 133.0),
        ];

        let first = assign(&regions, &endpoints);
        let second = assign(&regions, &endpoints);
        assert_eq!(first, second);
    }

    #[test]
    fn coincident_region_and_endpoint_win_at_zero_distance() {
        let endpoints = vec![
            endpoint("here", "192.0.2.1", 12.5, 33.0),
            endpoint("elsewhere", "192.0.2.2", -40.0, 100.0),
        ];
        let regions = vec![region("r", 1, 12.5, 33.0)];

        let assignments = assign(&regions, &endpoints);
        assert_eq!(assignments[0].endpoint, "here");
        assert!(assignments[0].distance_km.abs() < 1e-9);
    }
}
