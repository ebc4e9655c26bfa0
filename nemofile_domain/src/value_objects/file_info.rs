// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Info Value Object
//!
//! Version and bookkeeping metadata carried in the file header. Written at
//! save time and readable from the session after load.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::value_objects::WriteMode;

/// Highest container file version this codec reads or writes.
pub const MAX_FILE_VERSION: u32 = 10;

/// File version produced by the save pipeline.
///
/// Version 8 is the first layout where object IDs are authoritative in
/// Header1 rather than repeated in the Data section.
pub const CURRENT_FILE_VERSION: u32 = 8;

/// Metadata block mirrored between the file header and the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Container layout version (≤ [`MAX_FILE_VERSION`]).
    pub file_version: u32,

    /// Secondary layout version, reserved by the format.
    pub file_version2: u32,

    /// Engine version that produced the file.
    pub ck_version: u32,

    /// Product version of the producing application.
    pub product_version: u32,

    /// Product build number of the producing application.
    pub product_build: u32,

    /// Number of object descriptors in Header1.
    pub object_count: u32,

    /// Number of manager blobs in the Data section.
    pub manager_count: u32,

    /// How the file was produced (see [`WriteMode`]).
    pub write_mode: WriteMode,

    /// Total size of the file in bytes, filled on load.
    pub file_size: u64,

    /// Highest file ID assigned when the file was saved.
    pub max_id_saved: u32,
}

impl FileInfo {
    /// Validates the version fields against what this codec supports.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.file_version > MAX_FILE_VERSION {
            return Err(FormatError::unsupported(format!(
                "file version {} exceeds supported maximum {}",
                self.file_version, MAX_FILE_VERSION
            )));
        }
        Ok(())
    }
}

impl Default for FileInfo {
    fn default() -> Self {
        Self {
            file_version: CURRENT_FILE_VERSION,
            file_version2: 0,
            ck_version: 0,
            product_version: 0,
            product_build: 0,
            object_count: 0,
            manager_count: 0,
            write_mode: WriteMode::empty(),
            file_size: 0,
            max_id_saved: 0,
        }
    }
}
