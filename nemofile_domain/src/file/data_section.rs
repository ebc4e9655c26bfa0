// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data Section Codec
//!
//! The Data section carries every state blob in the file, VERSION1-encoded:
//!
//! - per manager: `[guid.d1][guid.d2][size_bytes][chunk bytes]` (size 0 for
//!   a manager with no state);
//! - per object, file version ≥ 7: `[size_bytes][chunk bytes]`; older files
//!   prefix each record with the object's file ID. Reference-only objects
//!   store size 0 and no body.
//!
//! Object records are independent of each other, so encode and decode fan
//! out across a thread pool when the caller asks for it; framing stays
//! sequential either way.
//!
//! Included-file payloads are not part of the section: they follow it at
//! the file tail, one `[name_len][name][size][payload]` record per file.

use rayon::prelude::*;

use crate::chunk::version1::{parse_version1, serialize_version1};
use crate::chunk::StateChunk;
use crate::entities::ManagerData;
use crate::error::FormatError;
use crate::value_objects::{Guid, ObjectId};

/// Object count at which parallel encode/decode starts paying for itself.
const PARALLEL_THRESHOLD: usize = 32;

/// Decoded Data section.
#[derive(Debug, Default)]
pub struct ParsedDataSection {
    pub managers: Vec<ManagerData>,
    /// One entry per object, in descriptor order; `None` for reference-only
    /// records.
    pub object_chunks: Vec<Option<StateChunk>>,
    /// Object IDs read inline, populated only for file version < 7.
    pub inline_object_ids: Vec<ObjectId>,
}

/// Codec for the Data section byte image (uncompressed).
pub struct DataSection;

impl DataSection {
    /// Serializes manager blobs followed by object records in the current
    /// (file version ≥ 7) layout.
    ///
    /// Returns the section bytes and, per object, the byte offset of its
    /// record, which become the descriptor position hints.
    pub fn serialize(
        managers: &[ManagerData],
        object_chunks: &[Option<StateChunk>],
        parallel: bool,
    ) -> (Vec<u8>, Vec<u32>) {
        let mut bytes = Vec::new();
        for manager in managers {
            bytes.extend_from_slice(&manager.guid.d1.to_le_bytes());
            bytes.extend_from_slice(&manager.guid.d2.to_le_bytes());
            match &manager.chunk {
                Some(chunk) => {
                    let image = serialize_version1(chunk);
                    bytes.extend_from_slice(&(image.len() as u32).to_le_bytes());
                    bytes.extend_from_slice(&image);
                }
                None => bytes.extend_from_slice(&0u32.to_le_bytes()),
            }
        }

        let images: Vec<Option<Vec<u8>>> = if parallel && object_chunks.len() >= PARALLEL_THRESHOLD {
            object_chunks
                .par_iter()
                .map(|chunk| chunk.as_ref().map(serialize_version1))
                .collect()
        } else {
            object_chunks
                .iter()
                .map(|chunk| chunk.as_ref().map(serialize_version1))
                .collect()
        };

        let mut position_hints = Vec::with_capacity(images.len());
        for image in &images {
            position_hints.push(bytes.len() as u32);
            match image {
                Some(image) => {
                    bytes.extend_from_slice(&(image.len() as u32).to_le_bytes());
                    bytes.extend_from_slice(image);
                }
                None => bytes.extend_from_slice(&0u32.to_le_bytes()),
            }
        }

        (bytes, position_hints)
    }

    /// Parses a Data section image produced for `file_version`.
    pub fn parse(
        bytes: &[u8],
        file_version: u32,
        manager_count: u32,
        object_count: u32,
        parallel: bool,
    ) -> Result<ParsedDataSection, FormatError> {
        let mut reader = SectionReader::new(bytes);
        let mut section = ParsedDataSection::default();

        for index in 0..manager_count {
            let d1 = reader.dword("manager guid")?;
            let d2 = reader.dword("manager guid")?;
            let size = reader.dword("manager blob size")? as usize;
            let chunk = if size == 0 {
                None
            } else {
                let image = reader.bytes(size, "manager blob")?;
                let (chunk, consumed) = parse_version1(image)?;
                if consumed != size {
                    return Err(FormatError::invalid_data(format!(
                        "manager blob {} declares {} bytes but its chunk ends at {}",
                        index, size, consumed
                    )));
                }
                Some(chunk)
            };
            section.managers.push(ManagerData {
                guid: Guid::new(d1, d2),
                chunk,
            });
        }

        // Frame every object record sequentially, then decode the bodies.
        let mut images: Vec<Option<&[u8]>> = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            if file_version < 7 {
                section.inline_object_ids.push(ObjectId::new(reader.dword("object id")?));
            }
            let size = reader.dword("object chunk size")? as usize;
            if size == 0 {
                images.push(None);
            } else {
                images.push(Some(reader.bytes(size, "object chunk")?));
            }
        }

        let decode = |image: &Option<&[u8]>| -> Result<Option<StateChunk>, FormatError> {
            match image {
                None => Ok(None),
                Some(image) => {
                    let (chunk, consumed) = parse_version1(image)?;
                    if consumed != image.len() {
                        return Err(FormatError::invalid_data(format!(
                            "object record declares {} bytes but its chunk ends at {}",
                            image.len(),
                            consumed
                        )));
                    }
                    Ok(Some(chunk))
                }
            }
        };

        section.object_chunks = if parallel && images.len() >= PARALLEL_THRESHOLD {
            images.par_iter().map(decode).collect::<Result<Vec<_>, _>>()?
        } else {
            images.iter().map(decode).collect::<Result<Vec<_>, _>>()?
        };

        Ok(section)
    }
}

/// Serializes included-file payloads for the file tail.
pub fn serialize_included_payloads(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (name, payload) in files {
        bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(payload);
    }
    bytes
}

/// Parses `count` included-file payload records from the file tail.
pub fn parse_included_payloads(bytes: &[u8], count: usize) -> Result<Vec<(String, Vec<u8>)>, FormatError> {
    let mut reader = SectionReader::new(bytes);
    let mut files = Vec::with_capacity(count);
    for index in 0..count {
        let name_len = reader.dword("included-file name length")? as usize;
        let name_bytes = reader.bytes(name_len, "included-file name")?;
        let name = String::from_utf8(name_bytes.to_vec())
            .map_err(|e| FormatError::invalid_data(format!("included file {} name is not UTF-8: {}", index, e)))?;
        let size = reader.dword("included-file payload size")? as usize;
        let payload = reader.bytes(size, "included-file payload")?;
        files.push((name, payload.to_vec()));
    }
    Ok(files)
}

/// Bounds-checked little-endian reader over a section image.
struct SectionReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> SectionReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn dword(&mut self, what: &str) -> Result<u32, FormatError> {
        let end = self.cursor + 4;
        if end > self.bytes.len() {
            return Err(FormatError::eof(format!("Data section truncated reading {}", what)));
        }
        let value = u32::from_le_bytes([
            self.bytes[self.cursor],
            self.bytes[self.cursor + 1],
            self.bytes[self.cursor + 2],
            self.bytes[self.cursor + 3],
        ]);
        self.cursor = end;
        Ok(value)
    }

    fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], FormatError> {
        let end = self
            .cursor
            .checked_add(len)
            .ok_or_else(|| FormatError::invalid_data(format!("{} length overflows", what)))?;
        if end > self.bytes.len() {
            return Err(FormatError::eof(format!("Data section truncated reading {}", what)));
        }
        let view = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(view)
    }
}
