//! Pairwise "move after" reordering of grouped records.
//!
//! For each adjacent pair `(before, after)` of the specification, the span of
//! `after` is cut out of the sequence and spliced back directly behind the
//! span of `before`. Pairs are applied left to right on the sequence left by
//! the previous pair, so a fully present chain comes out in chain order after
//! one pass.

use serde::Serialize;

use crate::record::Record;
use crate::spec::OrderingSpec;

/// Inclusive index range covering every record of one group.
///
/// If a group is not contiguous the span also covers whatever sits between
/// its first and last record, and that moves with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpan {
    pub first: usize,
    pub last: usize,
}

impl GroupSpan {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Locate a group's span with a single scan.
pub fn locate(records: &[Record], group: &str) -> Option<GroupSpan> {
    let mut span: Option<GroupSpan> = None;
    for (index, record) in records.iter().enumerate() {
        if record.group() != group {
            continue;
        }
        span = Some(match span {
            Some(found) => GroupSpan {
                first: found.first,
                last: index,
            },
            None => GroupSpan {
                first: index,
                last: index,
            },
        });
    }
    span
}

/// Result of applying an ordering specification.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderOutcome {
    /// Records in their new order.
    #[serde(skip)]
    pub records: Vec<Record>,
    /// Specification names that were found every time they were looked up.
    pub sorted_groups: Vec<String>,
    /// Specification names absent from the records, in first-miss order.
    pub missing_groups: Vec<String>,
}

/// Reorder records according to `spec`.
///
/// Missing groups never abort: the pair is skipped and the name reported.
/// When the anchor (`before`) group is missing, the `after` group stays where
/// it was; records are never dropped or duplicated.
pub fn reorder(records: Vec<Record>, spec: &OrderingSpec) -> ReorderOutcome {
    let mut sorter = Sorter::new(records);
    for (before, after) in spec.pairs() {
        sorter.place_after(before, after);
    }
    sorter.finish(spec)
}

struct Sorter {
    records: Vec<Record>,
    missing: Vec<String>,
}

impl Sorter {
    fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            missing: Vec::new(),
        }
    }

    fn place_after(&mut self, before: &str, after: &str) {
        if before == after {
            // Nothing to move, but still report an absent name.
            let _ = self.find(after);
            return;
        }

        let Some(after_span) = self.find(after) else {
            return;
        };
        let moved: Vec<Record> = self
            .records
            .drain(after_span.first..=after_span.last)
            .collect();

        let at = match self.find(before) {
            Some(before_span) => before_span.last + 1,
            None => {
                // Anchor missing: put the span back untouched.
                after_span.first
            }
        };

        tracing::debug!(
            "Placing {} record(s) of group '{}' at index {} (after '{}')",
            moved.len(),
            after,
            at,
            before
        );
        self.records.splice(at..at, moved);
    }

    fn find(&mut self, group: &str) -> Option<GroupSpan> {
        let span = locate(&self.records, group);
        if span.is_none() {
            tracing::warn!("Group '{}' is not found in custom config", group);
            if !self.missing.iter().any(|name| name == group) {
                self.missing.push(group.to_string());
            }
        }
        span
    }

    fn finish(self, spec: &OrderingSpec) -> ReorderOutcome {
        let mut sorted_groups: Vec<String> = Vec::new();
        for name in spec.names() {
            if !self.missing.contains(name) && !sorted_groups.contains(name) {
                sorted_groups.push(name.clone());
            }
        }
        tracing::info!("Sorted custom config groups: {}", sorted_groups.join(", "));

        ReorderOutcome {
            records: self.records,
            sorted_groups,
            missing_groups: self.missing,
        }
    }
}
