//! Snapshot engine: the wrapper around GNU tar's listed-incremental mode.
//!
//! Each operation spawns a short-lived tar child in its own process group.
//! SIGINT/SIGTERM are forwarded to that group so a cancelled command never
//! leaves an orphan archive process, and in-flight outputs live under the
//! control directory's `tmp/` until they are renamed into place on success.
//!
//! Known limitation inherited from tar: extraction touches file metadata in
//! ways that invalidate the snapshot-state file, so the first commit after
//! any checkout or reset behaves as a full re-snapshot of touched paths
//! rather than a minimal delta.

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::OnceLock;

use nix::sys::signal::{killpg, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use crate::id::CommitId;
use crate::layout::StoreLayout;
use crate::store::Store;
use crate::CONTROL_DIR;

const DEV_NULL: &str = "/dev/null";

/// Process group of the live archive child, 0 when idle.
static ACTIVE_PGID: AtomicI32 = AtomicI32::new(0);
static FORWARDERS: OnceLock<()> = OnceLock::new();

extern "C" fn forward_signal(sig: std::ffi::c_int) {
    let pgid = ACTIVE_PGID.load(Ordering::SeqCst);
    if pgid > 0 {
        if let Ok(signal) = Signal::try_from(sig) {
            let _ = killpg(Pid::from_raw(pgid), signal);
        }
    }
}

fn install_forwarders() {
    FORWARDERS.get_or_init(|| {
        let action = SigAction::new(
            SigHandler::Handler(forward_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe {
            let _ = sigaction(Signal::SIGINT, &action);
            let _ = sigaction(Signal::SIGTERM, &action);
        }
    });
}

/// Scratch file that is removed on drop unless it was renamed away.
struct Scratch {
    path: PathBuf,
}

impl Scratch {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// A captured snapshot that has not been published yet. Dropping it rolls
/// the scratch outputs back.
pub struct PendingSnapshot {
    /// Paths the archive tool reported as changed.
    pub touched: Vec<PathBuf>,
    tar: Scratch,
    snar: Scratch,
}

/// Synchronous driver for the external archive tool.
pub struct SnapshotEngine<'a> {
    layout: &'a StoreLayout,
    archive: &'a ArchiveConfig,
}

impl<'a> SnapshotEngine<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            layout: store.layout(),
            archive: &store.config().archive,
        }
    }

    /// Produce an incremental archive of the working tree against the
    /// parent's snapshot state (or an empty state for root commits).
    ///
    /// Outputs land in scratch files; call [`Self::publish`] to name them by
    /// a commit id, or drop the result to roll back.
    pub fn capture(&self, parent: Option<&CommitId>) -> Result<PendingSnapshot> {
        self.check_tool()?;
        let snar = self.stage_snar(parent)?;
        let tar = Scratch::new(self.layout.scratch_path("archive"));

        let mut args: Vec<OsString> = vec!["-c".into()];
        if self.archive.compress {
            args.push("-z".into());
        }
        args.extend(self.incremental_args(snar.path(), tar.path()));

        let lines = self.run(&args, true)?;
        Ok(PendingSnapshot {
            touched: parse_paths(lines),
            tar,
            snar,
        })
    }

    /// Atomically publish a captured snapshot under `id`.
    ///
    /// The snapshot-state blob is renamed first; if the archive rename then
    /// fails, the state blob is removed again so no half-published commit
    /// remains. Returns the touched-paths list.
    pub fn publish(&self, pending: PendingSnapshot, id: &CommitId) -> Result<Vec<PathBuf>> {
        let snapstate_target = self.layout.snapstate_file(id);
        fs::rename(pending.snar.path(), &snapstate_target)?;
        if let Err(err) = fs::rename(pending.tar.path(), self.layout.archive_file(id)) {
            let _ = fs::remove_file(&snapstate_target);
            return Err(err.into());
        }
        Ok(pending.touched)
    }

    /// Paths that would be captured against `parent` right now. This is the
    /// dirtiness probe: the archive output is discarded.
    pub fn changed_paths(&self, parent: Option<&CommitId>) -> Result<Vec<PathBuf>> {
        self.check_tool()?;
        let snar = self.stage_snar(parent)?;
        let args: Vec<OsString> = vec!["-c".into()]
            .into_iter()
            .chain(self.incremental_args(snar.path(), Path::new(DEV_NULL)))
            .collect();
        let lines = self.run(&args, true)?;
        Ok(parse_paths(lines))
    }

    /// Extract the archive blob of `id` into the tracked root.
    ///
    /// No parent replay happens here; the caller replays the full ancestor
    /// chain in order.
    pub fn extract(&self, id: &CommitId) -> Result<()> {
        self.check_tool()?;
        let archive = self.layout.archive_file(id);
        if !archive.is_file() {
            return Err(Error::CorruptHistory { commit: *id });
        }
        let args: Vec<OsString> = vec![
            "-x".into(),
            "-g".into(),
            DEV_NULL.into(),
            "-f".into(),
            archive.into(),
        ];
        self.run(&args, false)?;
        Ok(())
    }

    /// List the paths touched by the archive blob of `id`.
    pub fn list_paths(&self, id: &CommitId) -> Result<Vec<PathBuf>> {
        self.check_tool()?;
        let archive = self.layout.archive_file(id);
        if !archive.is_file() {
            return Err(Error::CorruptHistory { commit: *id });
        }
        let args: Vec<OsString> = vec!["-t".into(), "-f".into(), archive.into()];
        let lines = self.run(&args, true)?;
        Ok(parse_paths(lines))
    }

    /// Stage the incremental snapshot-state input: a copy of the parent's
    /// state, or nothing (tar starts a fresh one) for root captures.
    fn stage_snar(&self, parent: Option<&CommitId>) -> Result<Scratch> {
        let snar = Scratch::new(self.layout.scratch_path("snapstate"));
        if let Some(parent) = parent {
            let source = self.layout.snapstate_file(parent);
            fs::copy(&source, snar.path()).map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Error::CorruptHistory { commit: *parent }
                } else {
                    err.into()
                }
            })?;
        }
        Ok(snar)
    }

    fn incremental_args(&self, snar: &Path, target: &Path) -> Vec<OsString> {
        vec![
            "-v".into(),
            "-g".into(),
            snar.into(),
            format!("--exclude={CONTROL_DIR}").into(),
            "-f".into(),
            target.into(),
            ".".into(),
        ]
    }

    /// The incremental flags require a GNU tar; anything else fails fast.
    fn check_tool(&self) -> Result<()> {
        let output = Command::new(&self.archive.tool)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|err| Error::SnapshotToolFailed {
                detail: format!("failed to run `{} --version`: {err}", self.archive.tool),
            })?;
        if !output.status.success() {
            return Err(Error::SnapshotToolFailed {
                detail: format!("`{} --version` exited with {}", self.archive.tool, output.status),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or("");
        if !first_line.contains("GNU tar") {
            return Err(Error::SnapshotToolFailed {
                detail: format!("{} is not a GNU tar: {first_line}", self.archive.tool),
            });
        }
        Ok(())
    }

    /// Spawn the tool in its own process group, stream stdout if asked,
    /// and wait for it. Non-zero exit (including death by forwarded signal)
    /// maps to [`Error::SnapshotToolFailed`].
    fn run(&self, args: &[OsString], want_stdout: bool) -> Result<Vec<String>> {
        use std::os::unix::process::CommandExt;

        install_forwarders();

        let mut cmd = Command::new(&self.archive.tool);
        cmd.args(args)
            .current_dir(self.layout.root())
            .stdin(Stdio::null())
            .stdout(if want_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        cmd.process_group(0);
        tracing::debug!(tool = %self.archive.tool, ?args, "running archive tool");

        let mut child = cmd.spawn().map_err(|err| Error::SnapshotToolFailed {
            detail: format!("failed to spawn {}: {err}", self.archive.tool),
        })?;
        ACTIVE_PGID.store(child.id() as i32, Ordering::SeqCst);

        let mut lines = Vec::new();
        let mut read_err = None;
        if want_stdout {
            if let Some(stdout) = child.stdout.take() {
                for line in BufReader::new(stdout).lines() {
                    match line {
                        Ok(line) => lines.push(line),
                        Err(err) => {
                            // Stop the child before waiting, or it could
                            // block forever on a full pipe nobody drains.
                            read_err = Some(err);
                            let _ = child.kill();
                            break;
                        }
                    }
                }
            }
        }

        let status = child.wait();
        ACTIVE_PGID.store(0, Ordering::SeqCst);
        let status = status?;

        if let Some(err) = read_err {
            return Err(err.into());
        }
        if !status.success() {
            return Err(Error::SnapshotToolFailed {
                detail: format!("`{}` exited with {status}", self.archive.tool),
            });
        }
        Ok(lines)
    }
}

/// Normalize tar's verbose/listing output into relative file paths.
///
/// Directory entries are dropped along with the `./` root entry: tar lists
/// every directory on every incremental pass regardless of change, so they
/// carry no signal about what was touched.
fn parse_paths(lines: Vec<String>) -> Vec<PathBuf> {
    lines
        .into_iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let stripped = trimmed.strip_prefix("./").unwrap_or(trimmed);
            if stripped.is_empty() || stripped.ends_with('/') {
                None
            } else {
                Some(PathBuf::from(stripped))
            }
        })
        .collect()
}
