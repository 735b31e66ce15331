//! Opened-store handle: the single doorway to the history graph on disk.
//!
//! All reads and writes of HEAD, branches, and commit metadata flow through
//! [`Store`]. Mutations are single-file atomic writes (temp + rename); no
//! multi-file atomicity is attempted, so a crash between publishing a commit
//! and advancing a branch leaves an unreachable commit that `prune` reclaims.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::id::CommitId;
use crate::layout::{atomic_write, StoreLayout};
use crate::lock::StoreLock;
use crate::record::{Commit, Head};
use crate::{DEFAULT_BRANCH, ROOT_ENV};

/// An opened tracked root. Holds the advisory lock for its lifetime.
#[derive(Debug)]
pub struct Store {
    layout: StoreLayout,
    config: StoreConfig,
    _lock: StoreLock,
}

/// Start directory for store discovery: `STRATA_ROOT` if set, else cwd.
pub fn start_dir() -> Result<PathBuf> {
    match env::var_os(ROOT_ENV) {
        Some(root) => Ok(PathBuf::from(root)),
        None => Ok(env::current_dir()?),
    }
}

impl Store {
    /// Create an empty store under `root` and open it.
    ///
    /// HEAD starts attached to `main` with no commit; the branch file is
    /// created by the first commit.
    pub fn init(root: &Path) -> Result<Self> {
        let layout = StoreLayout::create(root)?;
        tracing::debug!(root = %layout.root().display(), "initialized control directory");

        let lock = StoreLock::acquire(&layout.lock_file())?;
        let config = StoreConfig::default();
        atomic_write(
            &layout.tmp_dir(),
            &layout.config_file(),
            config.to_toml().as_bytes(),
        )?;
        let store = Self {
            layout,
            config,
            _lock: lock,
        };
        store.set_head(&Head::Branch(DEFAULT_BRANCH.to_string()))?;
        Ok(store)
    }

    /// Open the store at or above `start`.
    pub fn open(start: &Path) -> Result<Self> {
        let layout = StoreLayout::locate(start)?;
        if !layout.head_file().is_file() {
            return Err(Error::NotTrackedRoot {
                path: start.to_path_buf(),
            });
        }
        let lock = StoreLock::acquire(&layout.lock_file())?;
        let config = StoreConfig::load(&layout.config_file())?;
        tracing::debug!(root = %layout.root().display(), "opened store");
        Ok(Self {
            layout,
            config,
            _lock: lock,
        })
    }

    /// Open the store for the ambient start directory (env var or cwd).
    pub fn discover() -> Result<Self> {
        Self::open(&start_dir()?)
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Root of the tracked directory.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /* HEAD */

    pub fn head(&self) -> Result<Head> {
        let raw = fs::read_to_string(self.layout.head_file())?;
        Head::decode(&raw)
    }

    pub fn set_head(&self, head: &Head) -> Result<()> {
        atomic_write(
            &self.layout.tmp_dir(),
            &self.layout.head_file(),
            head.encode().as_bytes(),
        )?;
        Ok(())
    }

    /// Commit id HEAD currently resolves to. `None` when attached to a
    /// branch that has no commit yet.
    pub fn head_commit_id(&self) -> Result<Option<CommitId>> {
        match self.head()? {
            Head::Commit(id) => Ok(Some(id)),
            Head::Branch(name) => self.branch_target(&name),
        }
    }

    /* Branches */

    /// All branch names, sorted.
    pub fn branch_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.layout.branches_dir())? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Target commit of a branch, or `None` if the branch does not exist.
    pub fn branch_target(&self, name: &str) -> Result<Option<CommitId>> {
        let raw = match fs::read_to_string(self.layout.branch_file(name)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let id = CommitId::from_hex(raw.trim()).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed branch file: {name}"),
            ))
        })?;
        Ok(Some(id))
    }

    /// Create or move a branch pointer.
    pub fn write_branch(&self, name: &str, target: &CommitId) -> Result<()> {
        atomic_write(
            &self.layout.tmp_dir(),
            &self.layout.branch_file(name),
            format!("{}\n", target.to_hex()).as_bytes(),
        )?;
        Ok(())
    }

    /// Delete a branch pointer. Unknown names fail with
    /// [`Error::UnknownBranch`].
    pub fn remove_branch(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.layout.branch_file(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::UnknownBranch {
                name: name.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Map from commit id to the sorted branch names pointing at it.
    pub fn branches_by_commit(&self) -> Result<HashMap<CommitId, Vec<String>>> {
        let mut map: HashMap<CommitId, Vec<String>> = HashMap::new();
        for name in self.branch_names()? {
            if let Some(target) = self.branch_target(&name)? {
                map.entry(target).or_default().push(name);
            }
        }
        Ok(map)
    }

    /* Commits */

    /// Read a commit record, `None` if no record exists for the id.
    pub fn commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        let bytes = match fs::read(self.layout.meta_file(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(Commit::decode(*id, &bytes)?))
    }

    /// All commit ids with a metadata record.
    pub fn commit_ids(&self) -> Result<Vec<CommitId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.layout.meta_dir())? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(CommitId::from_hex) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Persist a commit record.
    pub fn write_commit(&self, commit: &Commit) -> Result<()> {
        atomic_write(
            &self.layout.tmp_dir(),
            &self.layout.meta_file(&commit.id),
            &commit.encode()?,
        )?;
        Ok(())
    }

    /// Remove a commit record and both of its blobs. Only `prune` calls
    /// this; missing blobs are tolerated.
    pub fn remove_commit(&self, id: &CommitId) -> Result<()> {
        for path in [
            self.layout.meta_file(id),
            self.layout.archive_file(id),
            self.layout.snapstate_file(id),
        ] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Ancestor chain of `id`, ordered root first, `id` last.
    ///
    /// A dangling reference anywhere along the chain fails with
    /// [`Error::CorruptHistory`].
    pub fn ancestors(&self, id: &CommitId) -> Result<Vec<Commit>> {
        let mut chain = Vec::new();
        let mut cursor = Some(*id);
        while let Some(current) = cursor {
            let commit = self
                .commit(&current)?
                .ok_or(Error::CorruptHistory { commit: current })?;
            cursor = commit.parent;
            chain.push(commit);
        }
        chain.reverse();
        Ok(chain)
    }
}
