// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File-Layer Codecs
//!
//! Byte-exact codecs for each layer of a container file:
//!
//! ```text
//! [file header]          fixed 64 bytes (32 for pre-version-5 files)
//! [Header1]              deflated: descriptors, plugin deps, included index
//! [Data section]         deflated: manager blobs, object chunks (VERSION1)
//! [included payloads]    raw, one [name_len][name][size][bytes] per file
//! ```
//!
//! Compression is applied by the pipelines; the codecs here produce and
//! consume the uncompressed byte images.

pub mod data_section;
pub mod header;
pub mod header1;

pub use data_section::{parse_included_payloads, serialize_included_payloads, DataSection, ParsedDataSection};
pub use header::{FileHeaderBlock, FILE_SIGNATURE, HEADER_BYTES, LEGACY_HEADER_BYTES};
pub use header1::{Header1, IncludedFileIndexEntry, ObjectDescriptor};
