// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Configuration
//!
//! Tunables for the load/save pipelines, deserializable from TOML:
//!
//! ```toml
//! compression_level = 6
//! strict_references = false
//! durable_save = false
//! thread_pool_hint = 4
//! arena_limit_bytes = 268435456
//! ```
//!
//! Every field has a default, so an empty file (or no file) yields a
//! working configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use nemofile_domain::FormatError;

/// Pipeline tunables with serde defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Deflate level for compressed sections (0-9).
    pub compression_level: u32,

    /// Treat unresolved references after finish-loading as load failures.
    pub strict_references: bool,

    /// Flush the staging file before the atomic swap at the end of a save.
    pub durable_save: bool,

    /// Worker cap for parallel chunk encode/decode; `1` forces sequential,
    /// `None` lets the thread pool decide.
    pub thread_pool_hint: Option<usize>,

    /// Cap on session arena growth in bytes; `None` is unlimited.
    pub arena_limit_bytes: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            strict_references: false,
            durable_save: false,
            thread_pool_hint: None,
            arena_limit_bytes: None,
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, FormatError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, FormatError> {
        let config: Self =
            toml::from_str(text).map_err(|e| FormatError::invalid_data(format!("configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.compression_level > 9 {
            return Err(FormatError::invalid_argument(format!(
                "compression level {} is outside 0-9",
                self.compression_level
            )));
        }
        if self.thread_pool_hint == Some(0) {
            return Err(FormatError::invalid_argument(
                "thread pool hint of 0 is meaningless".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the Data-section codec should fan out across threads.
    pub fn parallel_chunks(&self) -> bool {
        self.thread_pool_hint != Some(1)
    }
}
