//! Commit records and the HEAD pointer.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::CommitId;

/// An immutable commit: one node of the snapshot graph.
///
/// The associated archive and snapshot-state blobs live beside the metadata
/// record, all named by the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// This commit's id.
    pub id: CommitId,
    /// Parent commit id; `None` only for root commits.
    pub parent: Option<CommitId>,
    /// Author-supplied message.
    pub msg: String,
    /// Creation time, fractional seconds since the Unix epoch.
    pub ts: f64,
}

/// On-disk form of a commit record; the id is the filename.
#[derive(Serialize, Deserialize)]
struct CommitRecord {
    parent: Option<CommitId>,
    msg: String,
    ts: f64,
}

impl Commit {
    /// Serialize to the newline-terminated JSON metadata record.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let record = CommitRecord {
            parent: self.parent,
            msg: self.msg.clone(),
            ts: self.ts,
        };
        let mut bytes = serde_json::to_vec(&record)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Deserialize a metadata record read from `commit-meta/<id>`.
    pub fn decode(id: CommitId, bytes: &[u8]) -> Result<Self> {
        let record: CommitRecord = serde_json::from_slice(bytes)?;
        Ok(Self {
            id,
            parent: record.parent,
            msg: record.msg,
            ts: record.ts,
        })
    }

    /// First line of the message, for one-row listings.
    pub fn summary(&self) -> &str {
        self.msg.lines().next().unwrap_or("")
    }
}

/// The current position of the working tree.
///
/// Attached HEAD names a branch; a freshly initialized store is attached to
/// `main` with no commit, which is the only way to have HEAD without a
/// commit. Detached HEAD names a commit directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Branch(String),
    Commit(CommitId),
}

impl Head {
    /// One-line on-disk form: `branch:<name>` or `commit:<id>`.
    pub fn encode(&self) -> String {
        match self {
            Head::Branch(name) => format!("branch:{name}\n"),
            Head::Commit(id) => format!("commit:{}\n", id.to_hex()),
        }
    }

    /// Parse the HEAD file contents.
    pub fn decode(raw: &str) -> Result<Self> {
        let malformed = || {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed HEAD file: {:?}", raw.trim_end()),
            ))
        };
        let line = raw.trim_end_matches('\n');
        let (kind, value) = line.split_once(':').ok_or_else(malformed)?;
        match kind {
            "branch" if !value.is_empty() => Ok(Head::Branch(value.to_string())),
            "commit" => CommitId::from_hex(value)
                .map(Head::Commit)
                .ok_or_else(malformed),
            _ => Err(malformed()),
        }
    }

    /// Branch name when attached.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Head::Branch(name) => Some(name),
            Head::Commit(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_record_roundtrip() -> Result<()> {
        let parent = CommitId::digest(None, "root", 1.0);
        let commit = Commit {
            id: CommitId::digest(Some(&parent), "second\nbody", 2.5),
            parent: Some(parent),
            msg: "second\nbody".to_string(),
            ts: 2.5,
        };
        let bytes = commit.encode()?;
        assert_eq!(*bytes.last().unwrap(), b'\n');
        let back = Commit::decode(commit.id, &bytes)?;
        assert_eq!(back, commit);
        assert_eq!(back.summary(), "second");
        Ok(())
    }

    #[test]
    fn root_commit_has_null_parent() -> Result<()> {
        let commit = Commit {
            id: CommitId::digest(None, "root", 1.0),
            parent: None,
            msg: "root".to_string(),
            ts: 1.0,
        };
        let bytes = commit.encode()?;
        assert!(std::str::from_utf8(&bytes).unwrap().contains("\"parent\":null"));
        Ok(())
    }

    #[test]
    fn head_roundtrip() -> Result<()> {
        let attached = Head::Branch("main".to_string());
        assert_eq!(Head::decode(&attached.encode())?, attached);

        let detached = Head::Commit(CommitId::digest(None, "x", 1.0));
        assert_eq!(Head::decode(&detached.encode())?, detached);
        Ok(())
    }

    #[test]
    fn head_rejects_garbage() {
        assert!(Head::decode("").is_err());
        assert!(Head::decode("branch:").is_err());
        assert!(Head::decode("commit:notahex").is_err());
        assert!(Head::decode("tag:v1").is_err());
    }
}
