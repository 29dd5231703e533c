//! Failure injection for the live-store commit
//!
//! Lets callers force a failure at a given commit step to exercise the
//! restore path.

use std::collections::HashSet;
use std::fmt;

use super::StoreError;

/// Steps of replacing the live store, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStep {
    /// Overwrite the group order manifest
    WriteManifest,
    /// Remove the live group directory
    RemoveGroups,
    /// Copy the staged group directory into place
    CopyGroups,
    /// After every file is in place
    Finish,
}

impl CommitStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStep::WriteManifest => "write_manifest",
            CommitStep::RemoveGroups => "remove_groups",
            CommitStep::CopyGroups => "copy_groups",
            CommitStep::Finish => "finish",
        }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of commit steps that should fail
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    fail_at: HashSet<CommitStep>,
}

impl FaultPlan {
    /// No injected failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when `step` is reached
    pub fn fail_at(mut self, step: CommitStep) -> Self {
        self.fail_at.insert(step);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fail_at.is_empty()
    }

    /// Returns an error if a failure is planned for `step`
    pub fn check(&self, step: CommitStep) -> Result<(), StoreError> {
        if self.fail_at.contains(&step) {
            tracing::debug!("Injecting failure at commit step {}", step);
            return Err(StoreError::Injected(step));
        }
        Ok(())
    }
}
