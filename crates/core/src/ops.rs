//! Command surface: each operation is a thin composition of the store, the
//! reference resolver, the snapshot engine, and the working-tree controller.
//!
//! The fixed order within a command is: validate, resolve, capture or
//! extract, persist metadata, advance HEAD/branches, emit events.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::id::{validate_branch_name, CommitId};
use crate::record::{Commit, Head};
use crate::refs::{resolve, resolve_head, resolve_opt, Resolved};
use crate::report::{Event, Reporter};
use crate::snapshot::SnapshotEngine;
use crate::store::Store;
use crate::worktree::WorkingTree;
use crate::HEAD_TOKEN;

/// Create an empty tracked root at `root`.
pub fn init(root: &Path, reporter: &mut dyn Reporter) -> Result<Store> {
    let store = Store::init(root)?;
    reporter.emit(Event::Info(format!(
        "Initialized tracked root at {}",
        store.root().display()
    )));
    Ok(store)
}

/// Capture the working tree as a new commit with the current HEAD as parent.
///
/// On a fresh store the commit is a root commit and the attached branch is
/// created pointing at it. Attached HEAD advances the branch; detached HEAD
/// advances itself.
pub fn commit(store: &Store, msg: &str, reporter: &mut dyn Reporter) -> Result<Commit> {
    let msg = msg.trim();
    if msg.is_empty() {
        return Err(Error::Usage("commit message must not be empty".to_string()));
    }

    let head = store.head()?;
    let parent = store.head_commit_id()?;

    let engine = SnapshotEngine::new(store);
    let pending = engine.capture(parent.as_ref())?;

    let ts = unix_now()?;
    let id = CommitId::digest(parent.as_ref(), msg, ts);
    engine.publish(pending, &id)?;

    let commit = Commit {
        id,
        parent,
        msg: msg.to_string(),
        ts,
    };
    store.write_commit(&commit)?;

    match head {
        Head::Branch(name) => store.write_branch(&name, &id)?,
        Head::Commit(_) => store.set_head(&Head::Commit(id))?,
    }

    reporter.emit(Event::Info(format!(
        "Created commit {}: {}",
        id.short(),
        commit.summary()
    )));
    Ok(commit)
}

/// Reconstruct the state of `reference` in the working tree and repoint
/// HEAD: attached when the reference named a branch, detached otherwise.
pub fn checkout(
    store: &Store,
    reference: Option<&str>,
    force: bool,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    let reference = reference.ok_or(Error::MissingRef)?;
    let resolved = resolve(store, reference)?;
    let new_head = head_for(&resolved);

    // Same commit: only the pointer form changes (e.g. detached -> attached),
    // no tree rebuild and no dirtiness gate.
    if store.head_commit_id()? == Some(resolved.id) {
        store.set_head(&new_head)?;
        reporter.emit(Event::Info(format!("HEAD now at {}", resolved.id.short())));
        return Ok(());
    }

    let tree = WorkingTree::new(store);
    tree.ensure_clean_or_force(force)?;
    tree.clear()?;
    tree.replay(&resolved.id, reporter)?;
    store.set_head(&new_head)?;

    reporter.emit(Event::Info(format!(
        "Checked out {} at {}. Commit this checkout to get a clean status.",
        reference,
        resolved.id.short()
    )));
    Ok(())
}

/// Start a fresh attached HEAD on a new branch with no commit yet. Does not
/// touch the filesystem.
pub fn checkout_orphan(store: &Store, name: &str, reporter: &mut dyn Reporter) -> Result<()> {
    validate_branch_name(name)?;
    if store.branch_target(name)?.is_some() {
        return Err(Error::BranchExists {
            name: name.to_string(),
        });
    }
    store.set_head(&Head::Branch(name.to_string()))?;
    reporter.emit(Event::Info(format!("Switched to new orphan branch {name}")));
    Ok(())
}

/// Retarget HEAD (attached: move the branch; detached: move HEAD itself) to
/// `reference`. With `hard`, additionally reconstruct the tree at the new
/// target; `--hard` is itself the destruction consent, so no separate
/// dirtiness gate applies.
pub fn reset(store: &Store, reference: &str, hard: bool, reporter: &mut dyn Reporter) -> Result<()> {
    let resolved = resolve(store, reference)?;

    match store.head()? {
        Head::Branch(name) => store.write_branch(&name, &resolved.id)?,
        Head::Commit(_) => store.set_head(&Head::Commit(resolved.id))?,
    }

    if hard {
        let tree = WorkingTree::new(store);
        tree.clear()?;
        tree.replay(&resolved.id, reporter)?;
        reporter.emit(Event::Info(format!(
            "Hard reset to {}",
            resolved.id.short()
        )));
    } else {
        reporter.emit(Event::Info(format!(
            "Reset to {}. Commit this checkout to get a clean status.",
            resolved.id.short()
        )));
    }
    Ok(())
}

/// The `branch` command: list, create/move, or delete, depending on the
/// argument shape. Bad combinations fail with [`Error::Usage`].
pub fn branch(
    store: &Store,
    name: Option<&str>,
    reference: Option<&str>,
    force: bool,
    delete: bool,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    if delete {
        if force {
            return Err(Error::Usage("branches cannot be force deleted".to_string()));
        }
        let name = name.ok_or_else(|| Error::Usage("specify a branch to delete".to_string()))?;
        if reference.is_some() {
            return Err(Error::Usage(
                "a start ref cannot be given when deleting a branch".to_string(),
            ));
        }
        return delete_branch(store, name, reporter);
    }

    match name {
        None => {
            if force {
                return Err(Error::Usage(
                    "force has no meaning when listing branches".to_string(),
                ));
            }
            if reference.is_some() {
                return Err(Error::Usage(
                    "a start ref has no meaning when listing branches".to_string(),
                ));
            }
            list_branches(store, reporter)
        }
        Some(name) => create_branch(store, name, reference, force, reporter),
    }
}

fn delete_branch(store: &Store, name: &str, reporter: &mut dyn Reporter) -> Result<()> {
    if store.head()?.branch_name() == Some(name) {
        return Err(Error::BranchInUse {
            name: name.to_string(),
        });
    }
    store.remove_branch(name)?;
    reporter.emit(Event::Info(format!("Deleted branch {name}")));
    Ok(())
}

fn list_branches(store: &Store, reporter: &mut dyn Reporter) -> Result<()> {
    let head_branch = store.head()?.branch_name().map(str::to_string);
    for name in store.branch_names()? {
        let target = store
            .branch_target(&name)?
            .ok_or_else(|| Error::UnknownBranch { name: name.clone() })?;
        let commit = store
            .commit(&target)?
            .ok_or(Error::CorruptHistory { commit: target })?;
        reporter.emit(Event::BranchRow {
            current: head_branch.as_deref() == Some(name.as_str()),
            name,
            target,
            summary: commit.summary().to_string(),
        });
    }
    Ok(())
}

fn create_branch(
    store: &Store,
    name: &str,
    reference: Option<&str>,
    force: bool,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    validate_branch_name(name)?;
    if store.branch_target(name)?.is_some() && !force {
        return Err(Error::BranchExists {
            name: name.to_string(),
        });
    }
    let resolved = resolve_opt(store, reference)?;
    store.write_branch(name, &resolved.id)?;
    reporter.emit(Event::Info(format!(
        "Created branch {name} at {}",
        resolved.id.short()
    )));
    Ok(())
}

/// Emit the touched-paths list of a commit (default: HEAD's commit).
pub fn show(store: &Store, reference: Option<&str>, reporter: &mut dyn Reporter) -> Result<Vec<PathBuf>> {
    let resolved = resolve_opt(store, reference)?;
    let engine = SnapshotEngine::new(store);
    let paths = engine.list_paths(&resolved.id)?;
    reporter.emit(Event::Info(format!("commit {}", resolved.id.to_hex())));
    for path in &paths {
        reporter.emit(Event::Info(format!("  - {}", path.display())));
    }
    Ok(paths)
}

/// Report HEAD and the paths that differ from it. An empty list is a clean
/// tree. The first status after a checkout may report spurious paths; see
/// the snapshot engine's known limitation.
pub fn status(store: &Store, reporter: &mut dyn Reporter) -> Result<Vec<PathBuf>> {
    let label = match store.head()? {
        Head::Branch(name) => name,
        Head::Commit(id) => id.to_hex(),
    };
    reporter.emit(Event::Info(format!("{HEAD_TOKEN} -> {label}")));

    let paths = WorkingTree::new(store).status()?;
    if paths.is_empty() {
        reporter.emit(Event::Info("Clean working tree".to_string()));
    } else {
        for path in &paths {
            reporter.emit(Event::Info(format!("  - {}", path.display())));
        }
    }
    Ok(paths)
}

/// Emit history groups. Each starting ref (default: HEAD; with `all`, every
/// branch) resolves to a leaf; identical leaves collapse into one group.
/// Each group is a header plus one row per ancestor, newest first.
pub fn log(store: &Store, refs: &[String], all: bool, reporter: &mut dyn Reporter) -> Result<()> {
    let mut targets: Vec<Resolved> = Vec::new();
    if refs.is_empty() {
        targets.push(resolve_head(store)?);
    } else {
        for reference in refs {
            targets.push(resolve(store, reference)?);
        }
    }
    if all {
        for name in store.branch_names()? {
            targets.push(resolve(store, &name)?);
        }
    }

    let decorations = store.branches_by_commit()?;
    let head_commit = store.head_commit_id()?;

    let mut seen: HashSet<CommitId> = HashSet::new();
    for target in targets {
        if !seen.insert(target.id) {
            continue;
        }
        reporter.emit(Event::Info(format!(
            "Log branch from {}",
            target.id.short()
        )));
        let chain = store.ancestors(&target.id)?;
        for commit in chain.iter().rev() {
            let mut names: Vec<String> = decorations.get(&commit.id).cloned().unwrap_or_default();
            if head_commit == Some(commit.id) {
                names.push(HEAD_TOKEN.to_string());
            }
            reporter.emit(Event::CommitRow {
                id: commit.id,
                ts: commit.ts,
                decorations: names,
                message: commit.msg.clone(),
            });
        }
    }
    Ok(())
}

/// Remove every commit record and blob not reachable from any branch or
/// HEAD. Reachability is the ancestor closure, so an ancestor of a
/// reachable commit is never removed.
pub fn prune(store: &Store, reporter: &mut dyn Reporter) -> Result<usize> {
    let mut reachable: HashSet<CommitId> = HashSet::new();
    let mut roots: Vec<CommitId> = Vec::new();
    for name in store.branch_names()? {
        if let Some(target) = store.branch_target(&name)? {
            roots.push(target);
        }
    }
    if let Some(head) = store.head_commit_id()? {
        roots.push(head);
    }
    for root in roots {
        if reachable.contains(&root) {
            continue;
        }
        for commit in store.ancestors(&root)? {
            reachable.insert(commit.id);
        }
    }

    let mut removed = 0;
    for id in store.commit_ids()? {
        if !reachable.contains(&id) {
            store.remove_commit(&id)?;
            reporter.emit(Event::Info(format!("Pruned commit {}", id.short())));
            removed += 1;
        }
    }
    // Blobs whose metadata write never landed (crash mid-publish) are
    // unreachable by construction; sweep them too.
    for entry in std::fs::read_dir(store.layout().commits_dir())? {
        let entry = entry?;
        let name = entry.file_name();
        let stem = Path::new(&name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(CommitId::from_hex);
        if let Some(id) = stem {
            if !reachable.contains(&id) {
                std::fs::remove_file(entry.path())?;
            }
        }
    }

    reporter.emit(Event::Info(if removed == 0 {
        "Nothing to prune".to_string()
    } else {
        format!("Pruned {removed} commits")
    }));
    Ok(removed)
}

fn head_for(resolved: &Resolved) -> Head {
    match &resolved.branch {
        Some(name) => Head::Branch(name.clone()),
        None => Head::Commit(resolved.id),
    }
}

fn unix_now() -> Result<f64> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("system clock before Unix epoch: {err}"),
        ))
    })?;
    Ok(now.as_secs_f64())
}
