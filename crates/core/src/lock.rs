//! Advisory lock on the control directory.
//!
//! Cross-process concurrency against one tracked root is otherwise
//! unsupported; a non-blocking flock turns simultaneous invocations into a
//! clean [`Error::StoreBusy`] instead of undefined interleavings.

use std::fs::{File, OpenOptions};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::error::{Error, Result};

/// Exclusive advisory lock, held for the lifetime of an opened store.
pub struct StoreLock {
    _flock: Flock<File>,
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock").finish()
    }
}

impl StoreLock {
    /// Acquire the lock (non-blocking). Contention yields [`Error::StoreBusy`].
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Self { _flock: flock }),
            Err((_, Errno::EWOULDBLOCK)) => Err(Error::StoreBusy),
            Err((_, errno)) => Err(Error::Io(std::io::Error::from_raw_os_error(errno as i32))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("lock");

        let held = StoreLock::acquire(&path)?;
        assert!(matches!(StoreLock::acquire(&path), Err(Error::StoreBusy)));

        drop(held);
        StoreLock::acquire(&path)?;
        Ok(())
    }
}
