// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Port
//!
//! Synchronous compression interface consumed by the load/save pipelines.
//! The wire format requires a raw-deflate stream compatible with the
//! engine's bundled miniz; the concrete backend lives in the
//! infrastructure layer.

use crate::error::FormatError;

/// Port for deflating and inflating the Header1 and Data sections.
///
/// Implementations are CPU-bound and must be thread-safe; the pipelines may
/// call them from worker threads.
pub trait CompressionService: Send + Sync {
    /// Compresses `data` at the given backend-specific level.
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, FormatError>;

    /// Decompresses `data`, which must inflate to exactly `expected_size`
    /// bytes; anything else is `InvalidData`.
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, FormatError>;
}
