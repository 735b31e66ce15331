//! Typed failure categories for the engine.
//!
//! Errors are never recovered internally; every operation surfaces the first
//! error it encounters and the CLI renders it as a single error line plus,
//! where applicable, a bulleted list of offending items.

use std::path::PathBuf;

use thiserror::Error;

use crate::id::CommitId;

/// Common result type used throughout strata-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No control directory at or above the start directory.
    #[error("not a tracked root: no {} directory at or above {}", crate::CONTROL_DIR, .path.display())]
    NotTrackedRoot { path: PathBuf },

    /// `init` on a directory that already has a control directory.
    #[error("already a tracked root: {}", .path.display())]
    AlreadyTrackedRoot { path: PathBuf },

    /// Branch name violates the `[A-Za-z_][A-Za-z0-9_]*` grammar.
    #[error("invalid branch name: {name:?}")]
    InvalidBranchName { name: String },

    /// Branch creation over an existing name without force.
    #[error("branch already exists: {name} (use -f to overwrite)")]
    BranchExists { name: String },

    /// Named branch does not exist.
    #[error("unknown branch: {name}")]
    UnknownBranch { name: String },

    /// Refusal to delete the branch HEAD is attached to.
    #[error("cannot delete branch {name}: HEAD is attached to it")]
    BranchInUse { name: String },

    /// Reference string matched no branch, commit id, or unique prefix.
    #[error("unknown ref: {reference}")]
    UnknownRef { reference: String },

    /// Hex prefix matched more than one commit id.
    #[error("ambiguous ref {reference}: matches {} commits", .matches.len())]
    AmbiguousRef {
        reference: String,
        matches: Vec<CommitId>,
    },

    /// Checkout invoked without a reference.
    #[error("missing ref argument")]
    MissingRef,

    /// HEAD is attached to a branch that has no commit yet.
    #[error("no commits yet")]
    NoCommitsYet,

    /// Destructive operation on a dirty working tree without force.
    #[error("uncommitted changes in working tree ({} paths); commit them or use -f to destroy them", .paths.len())]
    DirtyWorkingTree { paths: Vec<PathBuf> },

    /// A parent edge or branch target points at a missing commit record.
    #[error("corrupt history: missing commit record {commit}")]
    CorruptHistory { commit: CommitId },

    /// The archive tool subprocess failed or could not be run.
    #[error("snapshot tool failed: {detail}")]
    SnapshotToolFailed { detail: String },

    /// Another process holds the advisory lock on the control directory.
    #[error("store is busy: another strata process holds the lock")]
    StoreBusy,

    /// Bad argument combination surfaced by the command layer.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed commit metadata: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("malformed store config: {0}")]
    Config(#[from] toml::de::Error),
}
