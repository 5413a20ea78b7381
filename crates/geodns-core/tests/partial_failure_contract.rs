//! Contract Test: Partial Failure Isolation
//!
//! A provider failure while applying one region's operation must not abort
//! the remaining regions, and the run report must record both outcomes so
//! the caller can retry or alert.

mod common;

use common::*;
use geodns_core::engine::EngineEvent;
use geodns_core::GeoDnsEngine;

fn three_region_world() -> (Vec<geodns_core::RawMember>, Vec<geodns_core::Region>) {
    let members = vec![member("Alpha", "5", "1", "192.0.2.1", 10.0, 10.0)];
    let regions = vec![
        region("One", 1, 11.0, 11.0),
        region("Two", 2, 12.0, 12.0),
        region("Three", 3, 13.0, 13.0),
    ];
    (members, regions)
}

#[tokio::test]
async fn one_failing_zone_does_not_abort_the_others() {
    let (members, regions) = three_region_world();
    let provider = InMemoryDnsProvider::new();
    provider.fail_zone(2);

    let (engine, _events) = GeoDnsEngine::new(
        Box::new(StaticRegistrySource::new(registry(members), regions)),
        Box::new(InMemoryDnsProvider::sharing_state_with(&provider)),
        minimal_config("sys"),
    )
    .expect("engine construction succeeds");

    let report = engine.run().await.expect("run completes despite apply failure");

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failures(), 1);
    assert!(report.has_failures());

    // Zones 1 and 3 were created; zone 2 was not.
    let zones: Vec<i64> = provider.records().iter().map(|r| r.zone_id).collect();
    assert!(zones.contains(&1));
    assert!(zones.contains(&3));
    assert!(!zones.contains(&2));

    let failed = report
        .outcomes
        .iter()
        .find(|o| !o.is_ok())
        .expect("one failed outcome");
    assert_eq!(failed.operation.zone_id(), 2);
    assert!(
        failed.error.as_deref().unwrap_or("").contains("zone 2"),
        "error should carry the provider message: {:?}",
        failed.error
    );
}

#[tokio::test]
async fn events_report_the_failure_and_the_final_counts() {
    let (members, regions) = three_region_world();
    let provider = InMemoryDnsProvider::new();
    provider.fail_zone(2);

    let (engine, mut events) = GeoDnsEngine::new(
        Box::new(StaticRegistrySource::new(registry(members), regions)),
        Box::new(InMemoryDnsProvider::sharing_state_with(&provider)),
        minimal_config("sys"),
    )
    .expect("engine construction succeeds");

    engine.run().await.expect("run completes");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(matches!(seen.first(), Some(EngineEvent::Started { regions: 3, .. })));
    assert!(
        seen.iter()
            .any(|e| matches!(e, EngineEvent::ApplyFailed { zone_id: 2, .. })),
        "expected an ApplyFailed event for zone 2: {seen:?}"
    );
    assert!(
        seen.iter().any(|e| matches!(
            e,
            EngineEvent::Finished {
                creates: 2,
                failures: 1,
                ..
            }
        )),
        "expected Finished with 2 creates and 1 failure: {seen:?}"
    );
}

#[tokio::test]
async fn failed_zone_converges_on_the_next_run() {
    let (members, regions) = three_region_world();
    let provider = InMemoryDnsProvider::new();
    provider.fail_zone(2);

    let (engine, _events) = GeoDnsEngine::new(
        Box::new(StaticRegistrySource::new(registry(members.clone()), regions.clone())),
        Box::new(InMemoryDnsProvider::sharing_state_with(&provider)),
        minimal_config("sys"),
    )
    .expect("engine construction succeeds");
    engine.run().await.expect("first run completes");

    // The outage clears; the next run only needs to create zone 2.
    let provider2 = InMemoryDnsProvider::sharing_state_with(&provider);
    provider2.fail_zones_clear();

    let (engine, _events) = GeoDnsEngine::new(
        Box::new(StaticRegistrySource::new(registry(members), regions)),
        Box::new(InMemoryDnsProvider::sharing_state_with(&provider)),
        minimal_config("sys"),
    )
    .expect("engine construction succeeds");
    let report = engine.run().await.expect("second run completes");

    assert_eq!(report.creates(), 1);
    assert_eq!(report.noops(), 2);
    assert!(!report.has_failures());
    assert_eq!(provider.records().len(), 3);
}
