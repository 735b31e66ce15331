//! On-disk layout of the control directory.
//!
//! ```text
//! <root>/.strata/
//!   HEAD                    branch:<name> | commit:<id>
//!   config.toml
//!   lock
//!   branches/<name>         <id>
//!   commit-meta/<id>        {"parent":...,"msg":...,"ts":...}
//!   commits/<id>.archive
//!   commits/<id>.snapstate
//!   tmp/                    in-flight captures, published via rename
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::id::CommitId;
use crate::CONTROL_DIR;

/// Resolved paths for a tracked root and its control directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
    control: PathBuf,
}

impl StoreLayout {
    /// Create the control directory under `root`.
    ///
    /// Fails with [`Error::AlreadyTrackedRoot`] if it already exists.
    pub fn create(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root)?;
        let control = root.join(CONTROL_DIR);
        if control.exists() {
            return Err(Error::AlreadyTrackedRoot { path: root });
        }
        fs::create_dir(&control)?;
        let layout = Self { root, control };
        layout.ensure_subdirs()?;
        Ok(layout)
    }

    /// Locate an existing control directory, walking upward from `start`.
    ///
    /// Fails with [`Error::NotTrackedRoot`] when no ancestor holds one.
    pub fn locate(start: &Path) -> Result<Self> {
        let start = fs::canonicalize(start)?;
        let mut current = start.clone();
        loop {
            let control = current.join(CONTROL_DIR);
            if control.is_dir() {
                let layout = Self {
                    root: current,
                    control,
                };
                layout.ensure_subdirs()?;
                return Ok(layout);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(Error::NotTrackedRoot { path: start }),
            }
        }
    }

    /// Subdirectories are created on demand so a store survives partial
    /// manual cleanup.
    fn ensure_subdirs(&self) -> Result<()> {
        fs::create_dir_all(self.branches_dir())?;
        fs::create_dir_all(self.meta_dir())?;
        fs::create_dir_all(self.commits_dir())?;
        fs::create_dir_all(self.tmp_dir())?;
        Ok(())
    }

    /// Root of the tracked directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The control directory itself.
    pub fn control_dir(&self) -> &Path {
        &self.control
    }

    pub fn head_file(&self) -> PathBuf {
        self.control.join("HEAD")
    }

    pub fn config_file(&self) -> PathBuf {
        self.control.join("config.toml")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.control.join("lock")
    }

    pub fn branches_dir(&self) -> PathBuf {
        self.control.join("branches")
    }

    pub fn branch_file(&self, name: &str) -> PathBuf {
        self.branches_dir().join(name)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.control.join("commit-meta")
    }

    pub fn meta_file(&self, id: &CommitId) -> PathBuf {
        self.meta_dir().join(id.to_hex())
    }

    pub fn commits_dir(&self) -> PathBuf {
        self.control.join("commits")
    }

    pub fn archive_file(&self, id: &CommitId) -> PathBuf {
        self.commits_dir().join(format!("{}.archive", id.to_hex()))
    }

    pub fn snapstate_file(&self, id: &CommitId) -> PathBuf {
        self.commits_dir().join(format!("{}.snapstate", id.to_hex()))
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.control.join("tmp")
    }

    /// Unique scratch path for an in-flight capture output.
    pub fn scratch_path(&self, ext: &str) -> PathBuf {
        self.tmp_dir().join(format!("{}.{ext}", uuid::Uuid::new_v4()))
    }
}

/// Atomic write helper: write to a temp file, fsync, rename into place.
pub fn atomic_write(tmp_dir: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(tmp_dir)?;
    let temp_path = tmp_dir.join(format!("{}", uuid::Uuid::new_v4()));

    let mut temp_file = fs::File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&temp_path, target)?;

    // Fsync parent directory for durability; best effort.
    if let Some(parent) = target.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}
