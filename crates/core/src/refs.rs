//! Reference resolution: user string to commit id.
//!
//! Resolution order: exact branch name, then full 40-hex commit id, then a
//! unique hex prefix of length >= 4. The token `HEAD` resolves to the
//! current HEAD target.

use crate::error::{Error, Result};
use crate::id::{is_hex_prefix, CommitId};
use crate::record::Head;
use crate::store::Store;
use crate::HEAD_TOKEN;

/// A resolved reference. `branch` carries the branch name when the input
/// named one (directly or through an attached HEAD), so checkout knows
/// whether to attach.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub id: CommitId,
    pub branch: Option<String>,
}

/// Resolve the current HEAD target.
///
/// An attached HEAD whose branch has no commit yet (the freshly initialized
/// state) fails with [`Error::NoCommitsYet`].
pub fn resolve_head(store: &Store) -> Result<Resolved> {
    match store.head()? {
        Head::Commit(id) => Ok(Resolved { id, branch: None }),
        Head::Branch(name) => match store.branch_target(&name)? {
            Some(id) => Ok(Resolved {
                id,
                branch: Some(name),
            }),
            None => Err(Error::NoCommitsYet),
        },
    }
}

/// Resolve a user-supplied reference string.
pub fn resolve(store: &Store, reference: &str) -> Result<Resolved> {
    if reference == HEAD_TOKEN {
        return resolve_head(store);
    }

    if let Some(id) = store.branch_target(reference)? {
        return Ok(Resolved {
            id,
            branch: Some(reference.to_string()),
        });
    }

    // The branch HEAD is attached to exists as a name even before its first
    // commit; referring to it at that point is an unknown *branch*, not an
    // unknown ref.
    if store.head()?.branch_name() == Some(reference) {
        return Err(Error::UnknownBranch {
            name: reference.to_string(),
        });
    }

    if let Some(id) = CommitId::from_hex(reference) {
        if store.commit(&id)?.is_some() {
            return Ok(Resolved { id, branch: None });
        }
    }

    if is_hex_prefix(reference) {
        let prefix = reference.to_ascii_lowercase();
        let matches: Vec<CommitId> = store
            .commit_ids()?
            .into_iter()
            .filter(|id| id.to_hex().starts_with(&prefix))
            .collect();
        match matches.len() {
            0 => {}
            1 => {
                return Ok(Resolved {
                    id: matches[0],
                    branch: None,
                })
            }
            _ => {
                return Err(Error::AmbiguousRef {
                    reference: reference.to_string(),
                    matches,
                })
            }
        }
    }

    Err(Error::UnknownRef {
        reference: reference.to_string(),
    })
}

/// Resolve an optional reference, defaulting to HEAD.
pub fn resolve_opt(store: &Store, reference: Option<&str>) -> Result<Resolved> {
    match reference {
        Some(reference) => resolve(store, reference),
        None => resolve_head(store),
    }
}
