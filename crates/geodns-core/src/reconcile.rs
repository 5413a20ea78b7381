//! Diff-based record reconciliation
//!
//! Compares the desired assignment table against the indexed provider state
//! and produces the minimal operation per region: create where nothing
//! exists, update where the answer differs, no-op where it already matches.
//! This module only computes operations; applying them is the provider
//! adapter's job.
//!
//! Reconciliation never emits a delete. Records for zones no region claims
//! any more are surfaced as orphans so a cleanup policy can be layered on
//! later without changing the conservative default.

use crate::index::RecordIndex;
use crate::model::{Assignment, ExistingRecord, Operation};

/// The computed operation sequence plus diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// One operation per assigned region, in region-table order
    pub operations: Vec<Operation>,
    /// Existing records for this host whose zone no region claims
    pub orphans: Vec<ExistingRecord>,
}

impl ReconcilePlan {
    /// Operations that require a provider call
    pub fn pending(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.is_noop())
    }

    /// Count of create operations
    pub fn creates(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Create { .. }))
            .count()
    }

    /// Count of update operations
    pub fn updates(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Update { .. }))
            .count()
    }

    /// Count of no-ops
    pub fn noops(&self) -> usize {
        self.operations.iter().filter(|op| op.is_noop()).count()
    }

    /// True when every operation is a no-op (remote state already matches)
    pub fn is_converged(&self) -> bool {
        self.operations.iter().all(|op| op.is_noop())
    }
}

/// Compute the operation sequence for one host label.
///
/// For each assignment: no record at `(host, zone_id)` yields a `Create`,
/// a record with a matching value yields a `NoOp`, a record with a
/// different value yields an `Update` carrying the existing record's ID.
pub fn plan(host: &str, assignments: &[Assignment], index: &RecordIndex) -> ReconcilePlan {
    let mut operations = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let op = match index.lookup(host, assignment.zone_id) {
            None => Operation::Create {
                host: host.to_string(),
                zone_id: assignment.zone_id,
                value: assignment.value.clone(),
            },
            Some(existing) if existing.value == assignment.value => Operation::NoOp {
                host: host.to_string(),
                zone_id: assignment.zone_id,
            },
            Some(existing) => Operation::Update {
                record_id: existing.id.clone(),
                host: host.to_string(),
                zone_id: assignment.zone_id,
                value: assignment.value.clone(),
            },
        };
        operations.push(op);
    }

    let mut orphans: Vec<ExistingRecord> = index
        .records()
        .filter(|record| {
            record.host == host
                && !assignments.iter().any(|a| a.zone_id == record.zone_id)
        })
        .cloned()
        .collect();
    orphans.sort_by_key(|record| record.zone_id);

    ReconcilePlan { operations, orphans }
}
