// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # VERSION1 Chunk Envelope
//!
//! The legacy on-disk encoding used wherever a chunk crosses the file
//! boundary. Layout, as little-endian DWORDs:
//!
//! ```text
//! [chunk_version][class_id][data_version][data_size_dwords][option_flags]
//! [IDS table: len, entries...]        (only when the IDS bit is set)
//! [CHN table: len, entries...]        (only when the CHN bit is set)
//! [MAN table: len, (d1,d2,offset)...] (only when the MAN bit is set)
//! [payload DWORDs...]
//! ```
//!
//! ## Bit-exact round-trips
//!
//! Parsing caches the consumed bytes on the chunk; serializing a chunk that
//! still carries the cache returns those bytes unchanged. A chunk produced
//! by the writer serializes deterministically with the field order above, so
//! serialize → parse → serialize is stable either way.

use crate::chunk::state_chunk::{ManagerCitation, StateChunk};
use crate::error::FormatError;
use crate::value_objects::{ChunkOptions, ClassId, Guid};

/// Number of fixed header DWORDs in the envelope.
const ENVELOPE_HEADER_DWORDS: usize = 5;

/// Serializes a chunk into its VERSION1 byte form.
///
/// Returns the cached parse bytes verbatim when the chunk has not been
/// mutated since it was parsed.
pub fn serialize_version1(chunk: &StateChunk) -> Vec<u8> {
    if let Some(raw) = chunk.raw_bytes() {
        return raw.to_vec();
    }

    let table_dwords = if chunk.ids().is_empty() { 0 } else { 1 + chunk.ids().len() }
        + if chunk.chunk_refs().is_empty() {
            0
        } else {
            1 + chunk.chunk_refs().len()
        }
        + if chunk.managers().is_empty() {
            0
        } else {
            1 + 3 * chunk.managers().len()
        };
    let mut bytes = Vec::with_capacity(4 * (ENVELOPE_HEADER_DWORDS + table_dwords + chunk.data_size()));

    let mut push = |value: u32| bytes.extend_from_slice(&value.to_le_bytes());
    push(chunk.chunk_version() as u32);
    push(chunk.class_id().raw());
    push(chunk.data_version());
    push(chunk.data_size() as u32);
    push(chunk.options().bits());

    if !chunk.ids().is_empty() {
        push(chunk.ids().len() as u32);
        for &entry in chunk.ids() {
            push(entry);
        }
    }
    if !chunk.chunk_refs().is_empty() {
        push(chunk.chunk_refs().len() as u32);
        for &entry in chunk.chunk_refs() {
            push(entry);
        }
    }
    if !chunk.managers().is_empty() {
        push(chunk.managers().len() as u32);
        for citation in chunk.managers() {
            push(citation.guid.d1);
            push(citation.guid.d2);
            push(citation.offset);
        }
    }
    for &word in chunk.data() {
        push(word);
    }
    bytes
}

/// Parses a VERSION1 envelope from the front of `bytes`.
///
/// Returns the chunk and the number of bytes consumed; the consumed bytes
/// are cached on the chunk for bit-exact re-serialization.
pub fn parse_version1(bytes: &[u8]) -> Result<(StateChunk, usize), FormatError> {
    let mut reader = DwordReader::new(bytes);

    let chunk_version = reader.next("chunk version")?;
    let class_id = reader.next("class id")?;
    let data_version = reader.next("data version")?;
    let data_size = reader.next("data size")? as usize;
    let option_bits = reader.next("option flags")?;
    let options = ChunkOptions::from_bits(option_bits).ok_or_else(|| {
        FormatError::invalid_data(format!("unknown chunk option bits {:#x}", option_bits))
    })?;

    let mut ids = Vec::new();
    if options.contains(ChunkOptions::IDS) {
        let len = reader.next("ID table length")? as usize;
        reader.check_remaining(len, "ID table")?;
        ids.reserve(len);
        for _ in 0..len {
            ids.push(reader.next("ID table entry")?);
        }
    }

    let mut chunk_refs = Vec::new();
    if options.contains(ChunkOptions::CHN) {
        let len = reader.next("sub-chunk table length")? as usize;
        reader.check_remaining(len, "sub-chunk table")?;
        chunk_refs.reserve(len);
        for _ in 0..len {
            chunk_refs.push(reader.next("sub-chunk table entry")?);
        }
    }

    let mut managers = Vec::new();
    if options.contains(ChunkOptions::MAN) {
        let len = reader.next("manager table length")? as usize;
        reader.check_remaining(len * 3, "manager table")?;
        managers.reserve(len);
        for _ in 0..len {
            let d1 = reader.next("manager guid")?;
            let d2 = reader.next("manager guid")?;
            let offset = reader.next("manager offset")?;
            managers.push(ManagerCitation {
                guid: Guid::new(d1, d2),
                offset,
            });
        }
    }

    reader.check_remaining(data_size, "payload")?;
    let mut data = Vec::with_capacity(data_size);
    for _ in 0..data_size {
        data.push(reader.next("payload")?);
    }

    let consumed = reader.consumed_bytes();
    let chunk = StateChunk {
        class_id: ClassId::new(class_id),
        chunk_version: (chunk_version & 0xFFFF) as u16,
        data_version,
        options,
        data,
        ids,
        managers,
        chunk_refs,
        raw_bytes: Some(bytes[..consumed].to_vec()),
    };
    chunk.validate()?;
    Ok((chunk, consumed))
}

/// Bounds-checked little-endian DWORD reader over a byte slice.
struct DwordReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> DwordReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn next(&mut self, what: &str) -> Result<u32, FormatError> {
        let end = self.cursor + 4;
        if end > self.bytes.len() {
            return Err(FormatError::eof(format!(
                "envelope truncated reading {} at byte {}",
                what, self.cursor
            )));
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

    fn check_remaining(&self, dwords: usize, what: &str) -> Result<(), FormatError> {
        let available = (self.bytes.len() - self.cursor) / 4;
        if dwords > available {
            return Err(FormatError::eof(format!(
                "{} of {} DWORDs exceeds the {} remaining",
                what, dwords, available
            )));
        }
        Ok(())
    }

    fn consumed_bytes(&self) -> usize {
        self.cursor
    }
}
