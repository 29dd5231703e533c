//! Fragment store rewriting
//!
//! The fragment store is the `groups/` directory (one `<group>.json` per group)
//! plus the group order manifest. After ordering, it is rebuilt from scratch:
//!
//! 1. Partition records by group, first-seen order
//! 2. Stage the new store in a scratch directory
//! 3. Snapshot the live store
//! 4. Replace the live manifest and group directory
//! 5. On failure, restore the snapshot and return the original error
//!
//! Scratch directories are removed on every exit path.

mod fault;
mod transaction;

pub use fault::{CommitStep, FaultPlan};
pub use transaction::StagedStore;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use themecfg_ordering::Record;

use crate::layout::ThemeLayout;

/// Errors from fragment store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("group name {name:?} cannot be used as a file name")]
    InvalidGroupName { name: String },

    #[error("group names {first:?} and {second:?} differ only in case and would share a file")]
    GroupNameCollision { first: String, second: String },

    #[error("injected failure at commit step {0}")]
    Injected(CommitStep),

    #[error("restoring custom config files from backup failed ({restore}) after: {commit}")]
    RestoreFailed {
        commit: Box<StoreError>,
        restore: Box<StoreError>,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Records of one group, in sequence order
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBucket {
    pub name: String,
    pub records: Vec<Record>,
}

impl GroupBucket {
    /// File name of this group inside the group directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

/// Split records into groups, keeping first-seen group order and
/// intra-group order
///
/// Fails if a group name cannot be used as a file name, or if two names
/// differ only in case.
pub fn partition(records: &[Record]) -> StoreResult<Vec<GroupBucket>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut folded: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<GroupBucket> = Vec::new();

    for record in records {
        let slot = match index.get(record.group()) {
            Some(&slot) => slot,
            None => {
                validate_group_name(record.group())?;
                if let Some(&other) = folded.get(&record.group().to_lowercase()) {
                    return Err(StoreError::GroupNameCollision {
                        first: buckets[other].name.clone(),
                        second: record.group().to_string(),
                    });
                }
                folded.insert(record.group().to_lowercase(), buckets.len());
                buckets.push(GroupBucket {
                    name: record.group().to_string(),
                    records: Vec::new(),
                });
                index.insert(record.group(), buckets.len() - 1);
                buckets.len() - 1
            }
        };
        buckets[slot].records.push(record.clone());
    }

    Ok(buckets)
}

/// Reject names that would escape or break the group directory
pub fn validate_group_name(name: &str) -> StoreResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidGroupName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Group changes relative to the previous manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Groups written, in manifest order
    pub groups: Vec<String>,
    /// In the previous manifest but no longer present
    pub removed_groups: Vec<String>,
    /// Present now but not in the previous manifest
    pub new_groups: Vec<String>,
}

impl RewriteReport {
    pub fn new(buckets: &[GroupBucket], previous: &[String]) -> Self {
        let groups: Vec<String> = buckets.iter().map(|b| b.name.clone()).collect();

        let mut removed_groups: Vec<String> = Vec::new();
        for name in previous {
            if !groups.contains(name) && !removed_groups.contains(name) {
                removed_groups.push(name.clone());
            }
        }

        let new_groups = groups
            .iter()
            .filter(|name| !previous.contains(name))
            .cloned()
            .collect();

        Self {
            groups,
            removed_groups,
            new_groups,
        }
    }

    fn log(&self) {
        if !self.removed_groups.is_empty() {
            tracing::info!("Removed groups: {}", self.removed_groups.join(", "));
        }
        if !self.new_groups.is_empty() {
            tracing::info!("New groups: {}", self.new_groups.join(", "));
        }
    }
}

/// The live fragment store of a theme
#[derive(Debug, Clone)]
pub struct FragmentStore {
    groups_dir: PathBuf,
    order_file: PathBuf,
    faults: FaultPlan,
}

impl FragmentStore {
    pub fn new(groups_dir: impl Into<PathBuf>, order_file: impl Into<PathBuf>) -> Self {
        Self {
            groups_dir: groups_dir.into(),
            order_file: order_file.into(),
            faults: FaultPlan::default(),
        }
    }

    pub fn from_layout(layout: &ThemeLayout) -> Self {
        Self::new(layout.groups_dir(), layout.order_file())
    }

    /// Inject failures into the live replacement
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    pub fn groups_dir(&self) -> &Path {
        &self.groups_dir
    }

    pub fn order_file(&self) -> &Path {
        &self.order_file
    }

    /// Replace the live store with `buckets`
    ///
    /// Either the whole store is replaced or the previous one is left in
    /// place. `previous` is the last known group order, used only for the
    /// removed/new group report.
    pub fn rewrite(
        &self,
        buckets: &[GroupBucket],
        previous: &[String],
    ) -> StoreResult<RewriteReport> {
        let scratch_parent = self.groups_dir.parent().unwrap_or_else(|| Path::new("."));
        let staged =
            StagedStore::stage(&self.groups_dir, &self.order_file, scratch_parent, buckets)?;

        let report = RewriteReport::new(buckets, previous);
        report.log();

        staged.commit(&self.faults)?;

        tracing::info!(
            "Recreated {} and {} with fresh data",
            self.groups_dir.display(),
            self.order_file.display()
        );
        Ok(report)
    }
}
