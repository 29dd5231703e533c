//! Staged replacement of the live fragment store
//!
//! Scratch layout (a `TempDir` next to the live group directory):
//!
//! ```text
//! staged/groups/<group>.json
//! staged/order.json
//! backup/groups/...        copy of the live group directory, if any
//! backup/order.json        copy of the live manifest, if any
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use super::{io_error, CommitStep, FaultPlan, GroupBucket, StoreError, StoreResult};
use crate::output::pretty_bytes;

const STAGED_DIR: &str = "staged";
const BACKUP_DIR: &str = "backup";
const GROUPS_DIR: &str = "groups";
const ORDER_FILE: &str = "order.json";

/// A fully built replacement store, not yet visible
pub struct StagedStore<'a> {
    groups_dir: &'a Path,
    order_file: &'a Path,
    scratch: TempDir,
}

/// What the live store looked like before the commit
struct Snapshot {
    order_file: Option<PathBuf>,
    order_dir_existed: bool,
    groups_dir: Option<PathBuf>,
}

impl<'a> StagedStore<'a> {
    /// Write one file per bucket plus the manifest into a fresh scratch directory
    pub fn stage(
        groups_dir: &'a Path,
        order_file: &'a Path,
        scratch_parent: &Path,
        buckets: &[GroupBucket],
    ) -> StoreResult<Self> {
        fs::create_dir_all(scratch_parent).map_err(io_error(scratch_parent))?;
        let scratch = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(scratch_parent)
            .map_err(io_error(scratch_parent))?;

        let staged = Self {
            groups_dir,
            order_file,
            scratch,
        };

        let staged_groups = staged.staged_groups();
        fs::create_dir_all(&staged_groups).map_err(io_error(&staged_groups))?;
        for bucket in buckets {
            let path = staged_groups.join(bucket.file_name());
            fs::write(&path, pretty_bytes(&bucket.records)?).map_err(io_error(&path))?;
        }

        let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        let manifest = staged.staged_order();
        fs::write(&manifest, pretty_bytes(&names)?).map_err(io_error(&manifest))?;

        tracing::debug!(
            "Staged {} group file(s) in {}",
            buckets.len(),
            staged.scratch.path().display()
        );
        Ok(staged)
    }

    /// Snapshot the live store, then swap the staged store in
    ///
    /// On failure the snapshot is put back and the commit error returned.
    pub fn commit(self, faults: &FaultPlan) -> StoreResult<()> {
        let snapshot = self.snapshot()?;

        if let Err(commit) = self.replace_live(faults) {
            tracing::error!(
                "Failed to recreate custom config files: {}. Restoring from backup...",
                commit
            );
            if let Err(restore) = self.restore(&snapshot) {
                tracing::error!("Restoring custom config files failed: {}", restore);
                return Err(StoreError::RestoreFailed {
                    commit: Box::new(commit),
                    restore: Box::new(restore),
                });
            }
            return Err(commit);
        }

        Ok(())
    }

    fn staged_groups(&self) -> PathBuf {
        self.scratch.path().join(STAGED_DIR).join(GROUPS_DIR)
    }

    fn staged_order(&self) -> PathBuf {
        self.scratch.path().join(STAGED_DIR).join(ORDER_FILE)
    }

    fn snapshot(&self) -> StoreResult<Snapshot> {
        let backup = self.scratch.path().join(BACKUP_DIR);
        fs::create_dir_all(&backup).map_err(io_error(&backup))?;

        let order_file = if self.order_file.is_file() {
            let copy = backup.join(ORDER_FILE);
            fs::copy(self.order_file, &copy).map_err(io_error(self.order_file))?;
            Some(copy)
        } else {
            None
        };

        let groups_dir = if self.groups_dir.is_dir() {
            let copy = backup.join(GROUPS_DIR);
            copy_dir(self.groups_dir, &copy)?;
            Some(copy)
        } else {
            None
        };

        Ok(Snapshot {
            order_file,
            order_dir_existed: self.order_file.parent().is_some_and(Path::is_dir),
            groups_dir,
        })
    }

    fn replace_live(&self, faults: &FaultPlan) -> StoreResult<()> {
        faults.check(CommitStep::WriteManifest)?;
        if let Some(parent) = self.order_file.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::copy(self.staged_order(), self.order_file).map_err(io_error(self.order_file))?;

        faults.check(CommitStep::RemoveGroups)?;
        if self.groups_dir.exists() {
            fs::remove_dir_all(self.groups_dir).map_err(io_error(self.groups_dir))?;
        }

        faults.check(CommitStep::CopyGroups)?;
        copy_dir(&self.staged_groups(), self.groups_dir)?;

        faults.check(CommitStep::Finish)
    }

    fn restore(&self, snapshot: &Snapshot) -> StoreResult<()> {
        match &snapshot.order_file {
            Some(backup) => {
                if let Some(parent) = self.order_file.parent() {
                    fs::create_dir_all(parent).map_err(io_error(parent))?;
                }
                fs::copy(backup, self.order_file).map_err(io_error(self.order_file))?;
            }
            None => {
                if self.order_file.exists() {
                    fs::remove_file(self.order_file).map_err(io_error(self.order_file))?;
                }
                if !snapshot.order_dir_existed {
                    if let Some(parent) = self.order_file.parent() {
                        remove_if_empty(parent)?;
                    }
                }
            }
        }

        if self.groups_dir.exists() {
            fs::remove_dir_all(self.groups_dir).map_err(io_error(self.groups_dir))?;
        }
        if let Some(backup) = &snapshot.groups_dir {
            copy_dir(backup, self.groups_dir)?;
        }

        tracing::info!("Restored custom config files from backup");
        Ok(())
    }
}

/// Recursively copy `src` to `dst`, creating `dst`
fn copy_dir(src: &Path, dst: &Path) -> StoreResult<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let rel_path = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
            .map_err(io_error(entry.path()))?;
        let target = dst.join(rel_path);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_error(&target))?;
        }
    }
    Ok(())
}

fn remove_if_empty(dir: &Path) -> StoreResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut entries = fs::read_dir(dir).map_err(io_error(dir))?;
    if entries.next().is_none() {
        fs::remove_dir(dir).map_err(io_error(dir))?;
    }
    Ok(())
}
