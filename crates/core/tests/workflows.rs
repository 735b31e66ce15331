//! End-to-end scenarios: each starts from an empty tracked root and drives
//! the full command surface the way a user session would.

mod common;

use common::Fixture;
use strata_core::{ops, CommitId, Error, Event, Head, MemoryReporter};

fn commit_rows(reporter: &MemoryReporter) -> Vec<(CommitId, Vec<String>)> {
    reporter
        .events
        .iter()
        .filter_map(|event| match event {
            Event::CommitRow {
                id, decorations, ..
            } => Some((*id, decorations.clone())),
            _ => None,
        })
        .collect()
}

fn log_headers(reporter: &MemoryReporter) -> Vec<String> {
    reporter
        .infos()
        .into_iter()
        .filter(|text| text.starts_with("Log branch from "))
        .map(str::to_string)
        .collect()
}

#[test]
fn commit_then_branch_listing() {
    let f = Fixture::new();
    f.write("a", "a\n");
    let c1 = f.commit("c1");
    f.branch("first");

    let mut reporter = MemoryReporter::new();
    ops::branch(&f.store, None, None, false, false, &mut reporter).unwrap();

    let rows: Vec<(String, bool, CommitId)> = reporter
        .events
        .iter()
        .filter_map(|event| match event {
            Event::BranchRow {
                name,
                current,
                target,
                ..
            } => Some((name.clone(), *current, *target)),
            _ => None,
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("first".to_string(), false, c1.id),
            ("main".to_string(), true, c1.id),
        ]
    );
}

#[test]
fn log_groups_and_deduplication() {
    let f = Fixture::new();
    f.write("a", "a\n");
    let c1 = f.commit("c1");
    f.branch("first");
    f.write("b", "b\n");
    let c2 = f.commit("c2");
    f.branch("new");
    f.write("c", "c\n");
    let c3 = f.commit("c3");

    // Default log: one group from HEAD, three commits newest-first.
    let mut reporter = MemoryReporter::new();
    ops::log(&f.store, &[], false, &mut reporter).unwrap();
    assert_eq!(log_headers(&reporter).len(), 1);
    let rows = commit_rows(&reporter);
    let ids: Vec<CommitId> = rows.iter().map(|r| r.0).collect();
    assert_eq!(ids, vec![c3.id, c2.id, c1.id]);

    // Newest commit is decorated with its branch and HEAD.
    assert!(rows[0].1.contains(&"main".to_string()));
    assert!(rows[0].1.contains(&"HEAD".to_string()));
    assert!(rows[1].1.contains(&"new".to_string()));
    assert!(rows[2].1.contains(&"first".to_string()));

    // --all adds a group per branch; main's leaf duplicates HEAD's and is
    // collapsed, so: HEAD/main (3 rows), first (1 row), new (2 rows).
    let mut reporter = MemoryReporter::new();
    ops::log(&f.store, &[], true, &mut reporter).unwrap();
    let headers = log_headers(&reporter);
    assert_eq!(
        headers,
        vec![
            format!("Log branch from {}", c3.id.short()),
            format!("Log branch from {}", c1.id.short()),
            format!("Log branch from {}", c2.id.short()),
        ]
    );
    assert_eq!(commit_rows(&reporter).len(), 3 + 1 + 2);
}

#[test]
fn checkout_restores_historical_state() {
    let f = Fixture::new();
    f.write("a", "a\n");
    f.commit("c1");
    f.branch("first");
    f.write("b", "b\n");
    f.commit("c2");
    f.write("c", "c\n");
    f.commit("c3");

    f.checkout_force("first");
    assert!(f.exists("a"));
    assert!(!f.exists("b"));
    assert!(!f.exists("c"));
    assert_eq!(f.store.head().unwrap(), Head::Branch("first".to_string()));

    // Extraction invalidates the snapshot state, so status right after a
    // checkout may report spurious paths. A restore-point commit settles it.
    f.commit("restore");
    let paths = ops::status(&f.store, &mut MemoryReporter::new()).unwrap();
    assert!(paths.is_empty(), "post-restore status should be clean: {paths:?}");
}

#[test]
fn two_branch_fork_round_trip() {
    let f = Fixture::new();
    f.write("base.txt", "base\n");
    let c_base = f.commit("base");
    f.branch("base");

    f.write("aa", "aa\n");
    f.commit("add aa");
    f.branch("add_aa");

    f.checkout_force("base");
    f.branch("add_bb");
    // Same commit: attaching to add_bb is a pointer-only checkout.
    ops::checkout(&f.store, Some("add_bb"), false, &mut MemoryReporter::new()).unwrap();
    assert_eq!(f.store.head().unwrap(), Head::Branch("add_bb".to_string()));
    f.write("bb", "bb\n");
    f.commit("add bb");

    assert_eq!(f.store.branch_target("base").unwrap(), Some(c_base.id));

    f.checkout_force("add_aa");
    assert!(f.exists("aa"));
    assert!(!f.exists("bb"));
    assert_eq!(f.read("base.txt"), "base\n");

    f.checkout_force("add_bb");
    assert!(f.exists("bb"));
    assert!(!f.exists("aa"));

    f.checkout_force("base");
    assert!(!f.exists("aa"));
    assert!(!f.exists("bb"));
    assert!(f.exists("base.txt"));
}

#[test]
fn orphan_checkout_starts_empty_branch() {
    let f = Fixture::new();
    f.write("a", "a\n");
    f.commit("c1");

    ops::checkout_orphan(&f.store, "fresh", &mut MemoryReporter::new()).unwrap();
    assert_eq!(f.store.head().unwrap(), Head::Branch("fresh".to_string()));
    assert_eq!(f.store.head_commit_id().unwrap(), None);
    // The tree is untouched.
    assert!(f.exists("a"));

    // The orphan branch has no commit and no branches file yet, so it does
    // not resolve.
    let err =
        ops::checkout(&f.store, Some("fresh"), false, &mut MemoryReporter::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownBranch { .. }), "{err}");

    // A commit on the orphan creates its branch as a new root.
    f.write("o", "o\n");
    let root = f.commit("orphan root");
    assert_eq!(root.parent, None);
    assert_eq!(f.store.branch_target("fresh").unwrap(), Some(root.id));
}

#[test]
fn orphan_checkout_rejects_existing_and_invalid_names() {
    let f = Fixture::new();
    f.write("a", "a\n");
    f.commit("c1");
    f.branch("taken");

    let err = ops::checkout_orphan(&f.store, "taken", &mut MemoryReporter::new()).unwrap_err();
    assert!(matches!(err, Error::BranchExists { .. }), "{err}");

    let err = ops::checkout_orphan(&f.store, "bad name", &mut MemoryReporter::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidBranchName { .. }), "{err}");
}

#[test]
fn reset_moves_pointers_without_cleaning() {
    let f = Fixture::new();
    f.write("one", "1\n");
    let c1 = f.commit("c1");
    f.write("two", "2\n");
    let c2 = f.commit("c2");

    ops::reset(&f.store, &c1.id.to_hex(), false, &mut MemoryReporter::new()).unwrap();
    assert_eq!(f.store.branch_target("main").unwrap(), Some(c1.id));
    assert_eq!(f.store.head().unwrap(), Head::Branch("main".to_string()));
    // reset does not clean: the file from c2 is still on disk.
    assert!(f.exists("two"));

    // Checking out the same commit succeeds as a pointer-only move even
    // though the tree is dirty relative to c1.
    ops::checkout(&f.store, Some("main"), false, &mut MemoryReporter::new()).unwrap();
    assert!(f.exists("two"));

    // c2 is now unreachable and prune reclaims it.
    let removed = ops::prune(&f.store, &mut MemoryReporter::new()).unwrap();
    assert_eq!(removed, 1);
    assert!(f.store.commit(&c2.id).unwrap().is_none());
    assert!(!f.store.layout().archive_file(&c2.id).exists());
    assert!(!f.store.layout().snapstate_file(&c2.id).exists());
    // The reachable chain is intact.
    assert!(f.store.commit(&c1.id).unwrap().is_some());
    assert!(f.store.layout().archive_file(&c1.id).exists());
}

#[test]
fn hard_reset_rebuilds_the_tree() {
    let f = Fixture::new();
    f.write("one", "1\n");
    let c1 = f.commit("c1");
    f.write("two", "2\n");
    f.commit("c2");

    ops::reset(&f.store, &c1.id.to_hex(), true, &mut MemoryReporter::new()).unwrap();
    assert_eq!(f.store.branch_target("main").unwrap(), Some(c1.id));
    assert!(f.exists("one"));
    assert!(!f.exists("two"));
}

#[test]
fn detached_reset_moves_head() {
    let f = Fixture::new();
    f.write("one", "1\n");
    let c1 = f.commit("c1");
    f.write("two", "2\n");
    let c2 = f.commit("c2");

    f.checkout_force(&c1.id.to_hex());
    assert_eq!(f.store.head().unwrap(), Head::Commit(c1.id));

    ops::reset(&f.store, &c2.id.to_hex(), false, &mut MemoryReporter::new()).unwrap();
    assert_eq!(f.store.head().unwrap(), Head::Commit(c2.id));
    // The branch is untouched by a detached reset.
    assert_eq!(f.store.branch_target("main").unwrap(), Some(c2.id));
}

#[test]
fn checkout_emits_one_event_per_extraction() {
    let f = Fixture::new();
    f.write("a", "a\n");
    f.commit("c1");
    f.branch("first");
    f.write("b", "b\n");
    f.commit("c2");

    let mut reporter = MemoryReporter::new();
    ops::checkout(&f.store, Some("first"), true, &mut reporter).unwrap();
    let applied = reporter
        .infos()
        .into_iter()
        .filter(|text| text.starts_with("Applying commit "))
        .count();
    assert_eq!(applied, 1, "one extraction for the single-commit chain");
}
