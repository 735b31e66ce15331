//! Commit identifiers and branch-name validation.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::SHORT_ID_LEN;

/// A commit identifier: a SHA-1 digest rendered as 40 lowercase hex digits.
///
/// The id is derived from commit metadata (parent id, message, timestamp),
/// not from the archive bytes, so it can be computed before the archive is
/// published and stays stable across re-reads.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CommitId([u8; 20]);

impl CommitId {
    /// Create a CommitId from raw digest bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the id as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to a 40-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        let mut hex = String::with_capacity(40);
        for &byte in &self.0 {
            hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
            hex.push(HEX_CHARS[(byte & 0xf) as usize] as char);
        }
        hex
    }

    /// Parse from a 40-character hex string. Returns `None` on any other
    /// length or on non-hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 40 {
            return None;
        }
        let mut bytes = [0u8; 20];
        for i in 0..20 {
            let high = hex_nibble(hex.as_bytes()[i * 2])?;
            let low = hex_nibble(hex.as_bytes()[i * 2 + 1])?;
            bytes[i] = (high << 4) | low;
        }
        Some(Self(bytes))
    }

    /// Abbreviated id used in listings and log output.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_ID_LEN);
        hex
    }

    /// Derive the id of a new commit from its metadata.
    ///
    /// Fields are hashed with labels so that boundary shifts between them
    /// cannot collide. The timestamp carries microsecond precision, which is
    /// what makes rapid back-to-back commits distinct.
    pub fn digest(parent: Option<&CommitId>, msg: &str, ts: f64) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(b"parent");
        match parent {
            Some(id) => hasher.update(id.to_hex().as_bytes()),
            None => hasher.update(b"none"),
        }
        hasher.update(b"msg");
        hasher.update(msg.as_bytes());
        hasher.update(b"ts");
        hasher.update(format!("{ts:.6}").as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl std::fmt::Debug for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CommitId({})", self.to_hex())
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        CommitId::from_hex(&hex)
            .ok_or_else(|| D::Error::custom(format!("invalid commit id: {hex:?}")))
    }
}

/// Validate a branch name against the `[A-Za-z_][A-Za-z0-9_]*` grammar.
///
/// The literal name `HEAD` is also rejected: it would shadow the HEAD
/// reference token during resolution.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid || name == crate::HEAD_TOKEN {
        return Err(Error::InvalidBranchName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Whether a reference string could be an abbreviated commit id.
pub fn is_hex_prefix(s: &str) -> bool {
    s.len() >= 4 && s.len() <= 40 && s.bytes().all(|b| hex_nibble(b).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let id = CommitId::from_bytes([42; 20]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 40);
        assert_eq!(CommitId::from_hex(&hex), Some(id));
    }

    #[test]
    fn hex_is_lowercase() {
        let id = CommitId::from_bytes([0xde; 20]);
        assert!(id
            .to_hex()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(CommitId::from_hex("abc").is_none());
        assert!(CommitId::from_hex(&"g".repeat(40)).is_none());
        assert!(CommitId::from_hex(&"a".repeat(39)).is_none());
    }

    #[test]
    fn digest_is_stable() {
        let a = CommitId::digest(None, "first", 1000.5);
        let b = CommitId::digest(None, "first", 1000.5);
        assert_eq!(a, b);
    }

    #[test]
    fn digest_varies_with_inputs() {
        let root = CommitId::digest(None, "m", 1.0);
        let child = CommitId::digest(Some(&root), "m", 1.0);
        let other_msg = CommitId::digest(None, "n", 1.0);
        let other_ts = CommitId::digest(None, "m", 1.000001);
        assert_ne!(root, child);
        assert_ne!(root, other_msg);
        assert_ne!(root, other_ts);
    }

    #[test]
    fn branch_names_accepted() {
        for name in ["first", "valid_name", "_leading", "a1", "CamelCase"] {
            assert!(validate_branch_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn branch_names_rejected() {
        for name in [
            "",
            "invalid name",
            "invalid!name",
            " invalid_name",
            "invalid_name ",
            "invalid-name",
            "1leading",
            "HEAD",
        ] {
            assert!(
                matches!(
                    validate_branch_name(name),
                    Err(Error::InvalidBranchName { .. })
                ),
                "{name:?}"
            );
        }
    }

    #[test]
    fn hex_prefix_detection() {
        assert!(is_hex_prefix("abcd"));
        assert!(is_hex_prefix(&"0".repeat(40)));
        assert!(!is_hex_prefix("abc"));
        assert!(!is_hex_prefix("abcg"));
        assert!(!is_hex_prefix(&"0".repeat(41)));
    }

    #[test]
    fn serde_as_hex_string() {
        let id = CommitId::digest(None, "x", 2.0);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: CommitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
