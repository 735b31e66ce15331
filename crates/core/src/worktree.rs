//! Working-tree controller: dirtiness, destructive gating, and the
//! clear-then-replay sequence that reconstructs a historical state.

use std::fs;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::id::CommitId;
use crate::report::{Event, Reporter};
use crate::snapshot::SnapshotEngine;
use crate::store::Store;
use crate::CONTROL_DIR;

/// View over the tracked root owned by an opened store.
pub struct WorkingTree<'a> {
    store: &'a Store,
}

impl<'a> WorkingTree<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Paths that differ from the current HEAD commit. Empty means clean.
    ///
    /// A HEAD with no commit probes against the empty state, so every file
    /// in the tree counts as a change.
    pub fn status(&self) -> Result<Vec<PathBuf>> {
        let head_commit = self.store.head_commit_id()?;
        let engine = SnapshotEngine::new(self.store);
        engine.changed_paths(head_commit.as_ref())
    }

    /// Gate for destructive operations: clean tree or explicit force.
    pub fn ensure_clean_or_force(&self, force: bool) -> Result<()> {
        if force {
            return Ok(());
        }
        let paths = self.status()?;
        if paths.is_empty() {
            Ok(())
        } else {
            Err(Error::DirtyWorkingTree { paths })
        }
    }

    /// Remove every top-level entry of the tracked root except the control
    /// directory. Untracked files are not preserved; callers have already
    /// passed the clean-or-force gate.
    pub fn clear(&self) -> Result<()> {
        for entry in WalkDir::new(self.store.root()).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_name() == CONTROL_DIR {
                continue;
            }
            if entry.file_type().is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Replay the ancestor chain of `target` into the tracked root, root
    /// commit first, emitting one info event per extraction.
    pub fn replay(&self, target: &CommitId, reporter: &mut dyn Reporter) -> Result<()> {
        let chain = self.store.ancestors(target)?;
        let engine = SnapshotEngine::new(self.store);
        for commit in &chain {
            reporter.emit(Event::Info(format!("Applying commit {}", commit.id.short())));
            engine.extract(&commit.id)?;
        }
        Ok(())
    }
}
