// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Container Error Taxonomy
//!
//! This module provides the single error type used across the container
//! codec: chunk reads and writes, file-layer parsing, repository operations,
//! registries, and the load/save pipelines.
//!
//! ## Overview
//!
//! Every fallible operation in the workspace returns `FormatError`. The
//! variants form a closed taxonomy so callers can handle failures
//! systematically:
//!
//! - **Codec errors**: `Eof`, `InvalidData`, `InvalidArgument`: a chunk or
//!   file section could not be decoded as laid out.
//! - **Lookup errors**: `NotFound`, `AlreadyExists`: identity collisions or
//!   misses in repositories and registries.
//! - **Resource errors**: `OutOfMemory`, `Io`, `FileNotFound`: the
//!   environment refused an allocation or a file operation.
//! - **Pipeline errors**: `ValidationFailed`, `ReferenceUnresolved`,
//!   `PluginMissing`, `Unsupported`: a load/save phase could not complete.
//!
//! ## Propagation
//!
//! Per-read and per-write operations return an error and leave the
//! reader/writer cursor where it was; phase orchestrators stop at the first
//! fatal error; recoverable conditions (unresolved references in non-strict
//! mode, manager hook failures) accumulate as warnings in the
//! finish-loading statistics instead of unwinding the pipeline.

use thiserror::Error;

/// Domain-specific errors for the scene-container codec.
///
/// Each variant carries a human-readable message describing what failed.
/// Variants map one-to-one onto the container's error kinds; `Result::Ok`
/// stands in for the reference format's `Ok` code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected end of data: {0}")]
    Eof(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Reference unresolved: {0}")]
    ReferenceUnresolved(String),

    #[error("Plugin missing: {0}")]
    PluginMissing(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias used throughout the workspace.
pub type FormatResult<T> = Result<T, FormatError>;

/// Coarse severity classification for diagnostics and warning lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl FormatError {
    /// Creates a new out-of-memory error
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    /// Creates a new invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new end-of-data error
    pub fn eof(msg: impl Into<String>) -> Self {
        Self::Eof(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new already-exists error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Creates a new IO error
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates a new invalid-data error
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Creates a new validation error
    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    /// Creates a new unresolved-reference error
    pub fn reference_unresolved(msg: impl Into<String>) -> Self {
        Self::ReferenceUnresolved(msg.into())
    }

    /// Creates a new missing-plugin error
    pub fn plugin_missing(msg: impl Into<String>) -> Self {
        Self::PluginMissing(msg.into())
    }

    /// Creates a new unsupported-feature error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Checks whether the error indicates a condition the pipeline may
    /// recover from by accumulating a warning instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FormatError::ReferenceUnresolved(_) | FormatError::NotFound(_) | FormatError::PluginMissing(_)
        )
    }

    /// Default severity for the error kind.
    ///
    /// Strict-mode flags can escalate recoverable kinds back to `Error`;
    /// this is the classification used when they accumulate as warnings.
    pub fn severity(&self) -> Severity {
        if self.is_recoverable() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Gets the error category as a stable string for logs and stats.
    pub fn category(&self) -> &'static str {
        match self {
            FormatError::OutOfMemory(_) => "memory",
            FormatError::InvalidArgument(_) => "argument",
            FormatError::Eof(_) => "eof",
            FormatError::NotFound(_) => "lookup",
            FormatError::AlreadyExists(_) => "lookup",
            FormatError::Io(_) => "io",
            FormatError::FileNotFound(_) => "io",
            FormatError::InvalidData(_) => "data",
            FormatError::ValidationFailed(_) => "validation",
            FormatError::ReferenceUnresolved(_) => "reference",
            FormatError::PluginMissing(_) => "plugin",
            FormatError::Unsupported(_) => "unsupported",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FormatError::FileNotFound(err.to_string()),
            std::io::ErrorKind::OutOfMemory => FormatError::OutOfMemory(err.to_string()),
            _ => FormatError::Io(err.to_string()),
        }
    }
}
