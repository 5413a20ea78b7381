//! Core reconciliation engine
//!
//! The GeoDnsEngine runs one reconciliation to completion:
//!
//! ```text
//! RegistrySource ──► EligibilityFilter ──► AssignmentEngine ─┐
//!                                                            ▼
//! DnsProvider ──► RecordIndex ─────────────────────────► Reconciler
//!                                                            │
//!                                                       operations
//!                                                            ▼
//!                                                   DnsProvider::apply
//! ```
//!
//! The run is sequential and single-writer: load, filter, assign, index,
//! plan, apply, in region-table order. Only the provider calls at the
//! boundary block; the core itself performs no I/O. Apply failures for one
//! region never abort the others; the run report records every outcome so
//! the caller can retry or alert on partial failure.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::assignment;
use crate::config::{EngineConfig, GeoDnsConfig, ReconcileConfig};
use crate::eligibility::{self, FilterStats};
use crate::error::Result;
use crate::index::{RecordIndex, RecordKey};
use crate::model::{Assignment, ExistingRecord, Operation};
use crate::reconcile;
use crate::traits::{DnsProvider, RegistrySource};

/// Events emitted by the GeoDnsEngine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Run started
    Started {
        members: usize,
        regions: usize,
    },

    /// A region was assigned its nearest endpoint
    RegionAssigned {
        region: String,
        endpoint: String,
        distance_km: f64,
    },

    /// An operation was applied at the provider
    ApplySucceeded {
        zone_id: i64,
        kind: &'static str,
    },

    /// An operation needed no provider call (record already converged)
    ApplySkipped {
        zone_id: i64,
    },

    /// An operation failed at the provider
    ApplyFailed {
        zone_id: i64,
        error: String,
    },

    /// Run finished
    Finished {
        creates: usize,
        updates: usize,
        noops: usize,
        failures: usize,
    },
}

/// The result of applying (or skipping) one operation
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// The operation reconciliation produced
    pub operation: Operation,
    /// The provider error, if applying failed
    pub error: Option<String>,
}

impl ApplyOutcome {
    /// True if the operation succeeded or needed no call
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Diagnostic summary of one reconciliation run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Host label that was reconciled
    pub host: String,
    /// Whether mutating provider calls were skipped
    pub dry_run: bool,
    /// Member filter counts and exclusions
    pub filter: FilterStats,
    /// Per-region chosen endpoint and distance
    pub assignments: Vec<Assignment>,
    /// Regions that received no assignment (empty eligible set)
    pub unassigned_regions: Vec<String>,
    /// Keys that collided while indexing the provider's records
    pub duplicate_keys: Vec<RecordKey>,
    /// Existing records no region claims any more (never deleted)
    pub orphans: Vec<ExistingRecord>,
    /// Per-operation outcome, in region-table order
    pub outcomes: Vec<ApplyOutcome>,
}

impl RunReport {
    /// Count of create operations in the plan
    pub fn creates(&self) -> usize {
        self.count_kind("create")
    }

    /// Count of update operations in the plan
    pub fn updates(&self) -> usize {
        self.count_kind("update")
    }

    /// Count of no-ops in the plan
    pub fn noops(&self) -> usize {
        self.count_kind("noop")
    }

    /// Count of operations that failed at the provider
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// True if any operation failed
    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }

    /// True when remote state already matched everywhere
    pub fn is_converged(&self) -> bool {
        self.outcomes.iter().all(|o| o.operation.is_noop())
    }

    fn count_kind(&self, kind: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.operation.kind() == kind)
            .count()
    }
}

/// Core reconciliation engine.
///
/// ## Lifecycle
///
/// 1. Create with [`GeoDnsEngine::new()`]
/// 2. Call [`GeoDnsEngine::run()`] for one run-to-completion reconciliation
/// 3. Inspect the returned [`RunReport`]
///
/// The engine holds no state between runs; the provider's record set is the
/// only durable state and is re-fetched each run.
pub struct GeoDnsEngine {
    /// Registry source for member and region snapshots
    source: Box<dyn RegistrySource>,

    /// DNS provider the run converges
    provider: Box<dyn DnsProvider>,

    /// Reconciliation settings
    reconcile: ReconcileConfig,

    /// Engine settings
    engine: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl GeoDnsEngine {
    /// Create a new engine.
    ///
    /// Returns the engine and a receiver yielding [`EngineEvent`]s as the
    /// run progresses. The receiver may be dropped if the caller only wants
    /// the final [`RunReport`].
    pub fn new(
        source: Box<dyn RegistrySource>,
        provider: Box<dyn DnsProvider>,
        config: GeoDnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            source,
            provider,
            reconcile: config.reconcile,
            engine: config.engine,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one reconciliation to completion.
    ///
    /// Fails early on load errors, region-table validation errors, a failed
    /// record fetch, or (in strict mode) duplicate record keys. Apply
    /// failures do not fail the run; they are recorded per operation in the
    /// report.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let host = self.reconcile.host.clone();

        // Snapshot the collaborators
        let members = self.source.load_members().await?;
        let regions = self.source.load_regions().await?;
        self.emit_event(EngineEvent::Started {
            members: members.len(),
            regions: regions.len(),
        });

        // Filter
        let outcome = eligibility::filter(&members, self.reconcile.min_level);
        info!(
            considered = outcome.stats.considered,
            eligible = outcome.stats.eligible,
            "filtered member registry"
        );
        for exclusion in &outcome.stats.excluded {
            debug!(member = %exclusion.member, reason = %exclusion.reason, "member excluded");
        }
        if outcome.eligible.is_empty() {
            warn!("no eligible endpoints; no operations will be produced");
        }

        // Assign
        let assignments = assignment::assign(&regions, &outcome.eligible);
        for assignment in &assignments {
            info!(
                region = %assignment.region,
                endpoint = %assignment.endpoint,
                distance_km = assignment.distance_km,
                "region assigned"
            );
            self.emit_event(EngineEvent::RegionAssigned {
                region: assignment.region.clone(),
                endpoint: assignment.endpoint.clone(),
                distance_km: assignment.distance_km,
            });
        }
        let unassigned_regions: Vec<String> = regions
            .iter()
            .filter(|r| !assignments.iter().any(|a| a.zone_id == r.zone_id))
            .map(|r| r.name.clone())
            .collect();

        // Index the provider's current state
        let records = self.provider.current_records(&host).await?;
        let index = if self.reconcile.strict_index {
            RecordIndex::build_strict(records)?
        } else {
            let index = RecordIndex::build(records);
            for key in index.duplicates() {
                warn!(key = %key, "duplicate record key at provider; keeping first record");
            }
            index
        };
        let duplicate_keys = index.duplicates().to_vec();

        // Plan
        let plan = reconcile::plan(&host, &assignments, &index);
        info!(
            creates = plan.creates(),
            updates = plan.updates(),
            noops = plan.noops(),
            orphans = plan.orphans.len(),
            "reconciliation plan computed"
        );
        for orphan in &plan.orphans {
            warn!(
                zone_id = orphan.zone_id,
                value = %orphan.value,
                "orphaned record: no region claims this zone (left untouched)"
            );
        }

        // Apply
        let mut outcomes = Vec::with_capacity(plan.operations.len());
        for operation in plan.operations {
            let result = self.apply(&operation).await;
            outcomes.push(ApplyOutcome {
                operation,
                error: result.err(),
            });
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            host,
            dry_run: self.engine.dry_run,
            filter: outcome.stats,
            assignments,
            unassigned_regions,
            duplicate_keys,
            orphans: plan.orphans,
            outcomes,
        };

        self.emit_event(EngineEvent::Finished {
            creates: report.creates(),
            updates: report.updates(),
            noops: report.noops(),
            failures: report.failures(),
        });

        Ok(report)
    }

    /// Apply one operation, emitting events. Errors are returned as strings
    /// for the report rather than propagated.
    async fn apply(&self, operation: &Operation) -> std::result::Result<(), String> {
        if operation.is_noop() {
            debug!(zone_id = operation.zone_id(), "record already converged");
            self.emit_event(EngineEvent::ApplySkipped {
                zone_id: operation.zone_id(),
            });
            return Ok(());
        }

        if self.engine.dry_run {
            info!(
                kind = operation.kind(),
                zone_id = operation.zone_id(),
                "[dry-run] would apply operation"
            );
            self.emit_event(EngineEvent::ApplySucceeded {
                zone_id: operation.zone_id(),
                kind: operation.kind(),
            });
            return Ok(());
        }

        match self.provider.apply(operation).await {
            Ok(()) => {
                info!(
                    kind = operation.kind(),
                    zone_id = operation.zone_id(),
                    provider = self.provider.provider_name(),
                    "operation applied"
                );
                self.emit_event(EngineEvent::ApplySucceeded {
                    zone_id: operation.zone_id(),
                    kind: operation.kind(),
                });
                Ok(())
            }
            Err(e) => {
                error!(
                    kind = operation.kind(),
                    zone_id = operation.zone_id(),
                    error = %e,
                    "operation failed; continuing with remaining regions"
                );
                self.emit_event(EngineEvent::ApplyFailed {
                    zone_id: operation.zone_id(),
                    error: e.to_string(),
                });
                Err(e.to_string())
            }
        }
    }

    /// Emit an engine event.
    ///
    /// A full channel drops the event with a warning instead of blocking
    /// the run.
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_outcome_classification() {
        let ok = ApplyOutcome {
            operation: Operation::NoOp {
                host: "sys".to_string(),
                zone_id: 1,
            },
            error: None,
        };
        let failed = ApplyOutcome {
            operation: Operation::Create {
                host: "sys".to_string(),
                zone_id: 2,
                value: "192.0.2.1".to_string(),
            },
            error: Some("provider unavailable: timeout".to_string()),
        };

        assert!(ok.is_ok());
        assert!(!failed.is_ok());
    }

    #[test]
    fn report_counts_by_kind() {
        let report = RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            host: "sys".to_string(),
            dry_run: false,
            filter: FilterStats::default(),
            assignments: Vec::new(),
            unassigned_regions: Vec::new(),
            duplicate_keys: Vec::new(),
            orphans: Vec::new(),
            outcomes: vec![
                ApplyOutcome {
                    operation: Operation::Create {
                        host: "sys".to_string(),
                        zone_id: 1,
                        value: "192.0.2.1".to_string(),
                    },
                    error: None,
                },
                ApplyOutcome {
                    operation: Operation::NoOp {
                        host: "sys".to_string(),
                        zone_id: 2,
                    },
                    error: None,
                },
                ApplyOutcome {
                    operation: Operation::Update {
                        record_id: "9".to_string(),
                        host: "sys".to_string(),
                        zone_id: 3,
                        value: "192.0.2.2".to_string(),
                    },
                    error: Some("boom".to_string()),
                },
            ],
        };

        assert_eq!(report.creates(), 1);
        assert_eq!(report.updates(), 1);
        assert_eq!(report.noops(), 1);
        assert_eq!(report.failures(), 1);
        assert!(report.has_failures());
        assert!(!report.is_converged());
    }
}
