// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime ↔ File ID Remap
//!
//! Objects are identified by file IDs inside a container and by runtime IDs
//! inside a session. This table holds both directions and is attached as a
//! "file context" to a chunk writer (save) or parser (load):
//!
//! - With a context installed, `write_object_id` translates runtime → file
//!   before emitting the DWORD and the chunk is marked
//!   [`ChunkOptions::FILE`](crate::value_objects::ChunkOptions).
//! - `read_object_id` translates file → runtime on the way out.
//! - Load phase 13 rewrites already-parsed chunks in place through the
//!   file → runtime direction (see
//!   [`StateChunk::remap_ids`](crate::chunk::StateChunk::remap_ids)).
//!
//! A missing mapping either surfaces as `ReferenceUnresolved` (strict) or
//! passes the raw value through untouched so a later resolution pass can
//! pick it up.

use std::collections::HashMap;

use crate::error::FormatError;
use crate::value_objects::ObjectId;

/// Bidirectional runtime ↔ file object-ID mapping.
#[derive(Debug, Clone, Default)]
pub struct IdRemap {
    runtime_to_file: HashMap<u32, u32>,
    file_to_runtime: HashMap<u32, u32>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a runtime ↔ file pair in both directions.
    ///
    /// Re-inserting an existing runtime or file ID overwrites the previous
    /// pairing; the maps always stay mirror images of each other for the
    /// pairs inserted last.
    pub fn insert(&mut self, runtime: ObjectId, file: ObjectId) {
        self.runtime_to_file.insert(runtime.raw(), file.raw());
        self.file_to_runtime.insert(file.raw(), runtime.raw());
    }

    /// Translates a runtime ID into file space.
    pub fn to_file(&self, runtime: ObjectId) -> Option<ObjectId> {
        self.runtime_to_file.get(&runtime.raw()).copied().map(ObjectId::new)
    }

    /// Translates a file ID into runtime space.
    pub fn to_runtime(&self, file: ObjectId) -> Option<ObjectId> {
        self.file_to_runtime.get(&file.raw()).copied().map(ObjectId::new)
    }

    /// Strict translation into file space.
    pub fn require_file(&self, runtime: ObjectId) -> Result<ObjectId, FormatError> {
        self.to_file(runtime).ok_or_else(|| {
            FormatError::reference_unresolved(format!("runtime id {} has no file id assigned", runtime))
        })
    }

    /// Strict translation into runtime space.
    pub fn require_runtime(&self, file: ObjectId) -> Result<ObjectId, FormatError> {
        self.to_runtime(file)
            .ok_or_else(|| FormatError::reference_unresolved(format!("file id {} has no runtime object", file)))
    }

    pub fn len(&self) -> usize {
        self.runtime_to_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime_to_file.is_empty()
    }
}
