// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flag Sets
//!
//! Bit sets shared between the chunk codec and the file pipeline:
//!
//! - [`ChunkOptions`]: which citation sidebands a chunk carries, and
//!   whether its citations are currently in file-ID space.
//! - [`SaveFlags`] / [`LoadFlags`]: caller-facing pipeline switches.
//! - [`WriteMode`]: the header's `file_write_mode` field. These bits record
//!   how the file was produced; the *decoder* never branches on them; a
//!   section is stored raw exactly when `pack_size == unpack_size`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Option bits carried in a chunk's envelope.
    ///
    /// The sideband bits must accurately reflect whether each table is
    /// non-empty; [`StateChunk::validate`](crate::chunk::StateChunk::validate)
    /// enforces this.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChunkOptions: u32 {
        /// The chunk has object-ID citations (`ids` table non-empty).
        const IDS = 0x01;
        /// The chunk has manager citations (`managers` table non-empty).
        const MAN = 0x02;
        /// The chunk has a sub-chunk reference table (`chunk_refs` non-empty).
        const CHN = 0x04;
        /// Citations are in file-ID space and still need remapping.
        const FILE = 0x08;
    }
}

bitflags! {
    /// Switches accepted by the save pipeline.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SaveFlags: u32 {
        /// Write reference-only descriptors, no payloads.
        const AS_OBJECTS = 0x01;
        /// Deflate the Header1 and Data sections.
        const COMPRESSED = 0x02;
        /// Assign file IDs 1..N in repository order instead of reusing
        /// runtime IDs.
        const SEQUENTIAL_IDS = 0x04;
        /// Serialize manager state blobs into the Data section.
        const INCLUDE_MANAGERS = 0x08;
        /// Validate the session and every chunk before phase 5.
        const VALIDATE_BEFORE = 0x10;
    }
}

bitflags! {
    /// Switches accepted by the load pipeline.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LoadFlags: u32 {
        /// Outer tooling may prompt the user. No core semantics.
        const DODIALOG = 0x01;
        /// Outer tooling suppresses prompts. No core semantics.
        const AUTOMATICMODE = 0x02;
        /// Reuse an existing object when a descriptor's (name, class) pair
        /// is already present in the repository.
        const CHECKDUPLICATES = 0x04;
        /// Mark created objects with the dynamic-object flag.
        const AS_DYNAMIC_OBJECT = 0x08;
        /// Create only objects whose class derives from the behavior class.
        const ONLYBEHAVIORS = 0x10;
        /// Fail the load when a Header1 plugin dependency is missing.
        const CHECK_DEPENDENCIES = 0x20;
        /// Fail the load when finish-loading leaves references unresolved.
        const STRICT_REFERENCES = 0x40;
    }
}

bitflags! {
    /// Bits stored in the header's `file_write_mode` field.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WriteMode: u32 {
        /// Header1 was deflated when the file was produced.
        const COMPRESS_HEADER = 0x01;
        /// The Data section was deflated when the file was produced.
        const COMPRESS_DATA = 0x02;
    }
}

/// Object-record flag bits (the `flags` word on an object descriptor).
pub mod object_flags {
    /// The object was created by a load with `AS_DYNAMIC_OBJECT`.
    pub const DYNAMIC: u32 = 0x0000_0001;
}
