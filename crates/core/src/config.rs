//! Store configuration.
//!
//! `init` writes a default `config.toml` into the control directory; `open`
//! reads it back, falling back to defaults when the file is absent so that
//! stores created by older builds keep working.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-store configuration, persisted as `.strata/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub archive: ArchiveConfig,
}

/// Archive tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Subprocess to exec for snapshot work. Must be a GNU tar.
    pub tool: String,
    /// Gzip-compress archive blobs (`-z`).
    pub compress: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            tool: "tar".to_string(),
            compress: true,
        }
    }
}

impl StoreConfig {
    /// Read config from disk, defaulting when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Serialize to the on-disk TOML form.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).expect("config serializes to TOML")
    }
}
