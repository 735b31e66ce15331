//! Snapshot graph engine for strata.
//!
//! A tracked root is a plain directory with a hidden `.strata/` control
//! directory beneath it. Commits are immutable records tied to a pair of
//! opaque blobs produced by GNU tar's listed-incremental mode: the archive
//! itself and the snapshot-state file tar needs to compute the next delta.
//! Branches are mutable pointers to commits, and HEAD is either attached to
//! a branch or detached on a commit.
//!
//! The crate is deliberately synchronous: every operation is a bounded
//! sequence of filesystem writes plus at most a few tar subprocess calls.

pub mod config;
pub mod error;
pub mod id;
pub mod layout;
pub mod lock;
pub mod ops;
pub mod record;
pub mod refs;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod worktree;

pub use config::{ArchiveConfig, StoreConfig};
pub use error::{Error, Result};
pub use id::CommitId;
pub use record::{Commit, Head};
pub use report::{Event, MemoryReporter, Reporter};
pub use store::Store;

/// Name of the hidden control directory under the tracked root.
pub const CONTROL_DIR: &str = ".strata";

/// Branch created by `init` before any commit exists.
pub const DEFAULT_BRANCH: &str = "main";

/// Reference token that always resolves to the current HEAD target.
pub const HEAD_TOKEN: &str = "HEAD";

/// Environment variable overriding the tracked-root start directory.
pub const ROOT_ENV: &str = "STRATA_ROOT";

/// Number of hex digits shown for abbreviated commit ids.
pub const SHORT_ID_LEN: usize = 7;
