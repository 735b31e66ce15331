#![allow(dead_code)] // each test binary uses a different slice of the fixture

//! Shared fixture for engine integration tests.
//!
//! Each fixture is a throwaway tracked root in a tempdir, driven through
//! the public operation layer with a recording reporter. Tests exercise the
//! real GNU tar subprocess.

use std::fs;
use std::path::PathBuf;

use strata_core::{ops, Commit, MemoryReporter, Store};
use tempfile::TempDir;

pub struct Fixture {
    // Held for its Drop; the path must outlive the store.
    _dir: TempDir,
    pub store: Store,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = Store::init(dir.path()).expect("init store");
        Self { _dir: dir, store }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.store.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn commit(&self, msg: &str) -> Commit {
        ops::commit(&self.store, msg, &mut MemoryReporter::new()).expect("commit")
    }

    pub fn branch(&self, name: &str) {
        ops::branch(&self.store, Some(name), None, false, false, &mut MemoryReporter::new())
            .expect("create branch")
    }

    pub fn checkout_force(&self, reference: &str) {
        ops::checkout(&self.store, Some(reference), true, &mut MemoryReporter::new())
            .expect("checkout")
    }
}
