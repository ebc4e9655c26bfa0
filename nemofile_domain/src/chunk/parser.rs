// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Parser
//!
//! Sequential DWORD-by-DWORD reader over a [`StateChunk`]. Every read is
//! bounds-checked before the cursor moves, so a failed read leaves the
//! parser exactly where it was.
//!
//! ## Identifier seek
//!
//! [`ChunkParser::seek_identifier`] scans forward from the cursor for a
//! DWORD equal to the needle and stops just past it. A scan that reaches the
//! end wraps once, from position 0 back up to the original cursor, and only
//! then reports `NotFound`. Identifiers are matched by literal value;
//! keeping them distinguishable from payload DWORDs is the layout owner's
//! contract.
//!
//! ## Remap on read
//!
//! With a file context attached, [`ChunkParser::read_object_id`] translates
//! the stored file ID into runtime space. A missing mapping is
//! `ReferenceUnresolved` in strict mode and passes the raw value through
//! otherwise.

use std::sync::Arc;

use crate::chunk::state_chunk::StateChunk;
use crate::chunk::SEQUENCE_SENTINEL;
use crate::error::FormatError;
use crate::value_objects::{ColorRgba, Guid, IdRemap, Matrix4, ObjectId, Quaternion, Vector3};

/// Sequential reader over one chunk's payload and sidebands.
#[derive(Debug)]
pub struct ChunkParser<'a> {
    chunk: &'a StateChunk,
    cursor: usize,
    /// Next unconsumed entry of the parent's sub-chunk table.
    ref_cursor: usize,
    file_context: Option<Arc<IdRemap>>,
    strict: bool,
}

impl<'a> ChunkParser<'a> {
    pub fn new(chunk: &'a StateChunk) -> Self {
        Self {
            chunk,
            cursor: 0,
            ref_cursor: 0,
            file_context: None,
            strict: false,
        }
    }

    /// Installs a file → runtime remap applied by
    /// [`ChunkParser::read_object_id`].
    pub fn set_file_context(&mut self, context: Arc<IdRemap>) {
        self.file_context = Some(context);
    }

    /// Escalates missing remap entries from pass-through to error.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    // ---- cursor ------------------------------------------------------------

    /// Current position in DWORDs.
    pub fn tell(&self) -> usize {
        self.cursor
    }

    pub fn seek(&mut self, position: usize) -> Result<(), FormatError> {
        if position > self.chunk.data.len() {
            return Err(FormatError::eof(format!(
                "seek to {} outside payload of {} DWORDs",
                position,
                self.chunk.data.len()
            )));
        }
        self.cursor = position;
        Ok(())
    }

    pub fn skip(&mut self, dwords: usize) -> Result<(), FormatError> {
        self.take(dwords)?;
        Ok(())
    }

    /// DWORDs left between the cursor and the end of the payload.
    pub fn remaining(&self) -> usize {
        self.chunk.data.len() - self.cursor
    }

    pub fn at_end(&self) -> bool {
        self.remaining() == 0
    }

    // ---- primitives --------------------------------------------------------

    pub fn read_byte(&mut self) -> Result<u8, FormatError> {
        Ok(self.take_one()? as u8)
    }

    pub fn read_word(&mut self) -> Result<u16, FormatError> {
        Ok(self.take_one()? as u16)
    }

    pub fn read_dword(&mut self) -> Result<u32, FormatError> {
        self.take_one()
    }

    pub fn read_int(&mut self) -> Result<i32, FormatError> {
        Ok(self.take_one()? as i32)
    }

    pub fn read_float(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_bits(self.take_one()?))
    }

    pub fn read_guid(&mut self) -> Result<Guid, FormatError> {
        let words = self.take(2)?;
        Ok(Guid::new(words[0], words[1]))
    }

    /// Reads a 32-bit value stored as two padded 16-bit halves.
    pub fn read_dword_as_words(&mut self) -> Result<u32, FormatError> {
        let words = self.take(2)?;
        Ok((words[0] & 0xFFFF) | ((words[1] & 0xFFFF) << 16))
    }

    /// Reads `count` values stored as padded 16-bit halves.
    pub fn read_dword_array_as_words(&mut self, count: usize) -> Result<Vec<u32>, FormatError> {
        let words = self.take(count * 2)?;
        Ok(words
            .chunks_exact(2)
            .map(|pair| (pair[0] & 0xFFFF) | ((pair[1] & 0xFFFF) << 16))
            .collect())
    }

    /// Reads `len` raw bytes (consumes whole DWORDs, discards the padding).
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, FormatError> {
        let words = self.take(len.div_ceil(4))?;
        let mut bytes = Vec::with_capacity(len);
        for &word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.truncate(len);
        Ok(bytes)
    }

    /// Reads a string written by
    /// [`write_string`](crate::chunk::ChunkWriter::write_string).
    pub fn read_string(&mut self) -> Result<String, FormatError> {
        let len_with_nul = self.peek()? as usize;
        if len_with_nul == 0 {
            self.cursor += 1;
            return Ok(String::new());
        }
        let dwords = len_with_nul.div_ceil(4);
        if self.remaining() < 1 + dwords {
            return Err(FormatError::invalid_data(format!(
                "string of {} bytes overruns payload ({} DWORDs remain)",
                len_with_nul,
                self.remaining()
            )));
        }
        self.cursor += 1;
        let mut bytes = self.read_bytes(len_with_nul)?;
        // Drop the NUL terminator.
        bytes.pop();
        String::from_utf8(bytes).map_err(|e| FormatError::invalid_data(format!("string is not UTF-8: {}", e)))
    }

    /// Reads a size-prefixed byte buffer.
    pub fn read_buffer(&mut self) -> Result<Vec<u8>, FormatError> {
        let len = self.peek()? as usize;
        if self.remaining() < 1 + len.div_ceil(4) {
            return Err(FormatError::invalid_data(format!(
                "buffer of {} bytes overruns payload ({} DWORDs remain)",
                len,
                self.remaining()
            )));
        }
        self.cursor += 1;
        self.read_bytes(len)
    }

    /// Reads `len` bytes of an unprefixed buffer; the caller supplies the
    /// length it remembered.
    pub fn read_buffer_nosize(&mut self, len: usize) -> Result<Vec<u8>, FormatError> {
        self.read_bytes(len)
    }

    /// Reads `count` 16-bit values packed two per DWORD.
    pub fn read_buffer_nosize_lendian16(&mut self, count: usize) -> Result<Vec<u16>, FormatError> {
        let words = self.take(count.div_ceil(2))?;
        let mut values = Vec::with_capacity(count);
        for &word in words {
            values.push((word & 0xFFFF) as u16);
            values.push((word >> 16) as u16);
        }
        values.truncate(count);
        Ok(values)
    }

    /// Reads `[total_bytes][elem_count][data…]` written by
    /// [`write_array_lendian`](crate::chunk::ChunkWriter::write_array_lendian).
    ///
    /// Returns `(elem_count, data)`.
    pub fn read_array_lendian(&mut self) -> Result<(u32, Vec<u8>), FormatError> {
        let total_bytes = self.peek()? as usize;
        if self.remaining() < 2 + total_bytes.div_ceil(4) {
            return Err(FormatError::invalid_data(format!(
                "array of {} bytes overruns payload ({} DWORDs remain)",
                total_bytes,
                self.remaining()
            )));
        }
        self.cursor += 1;
        let elem_count = self.take_one()?;
        let data = self.read_bytes(total_bytes)?;
        Ok((elem_count, data))
    }

    // ---- math payloads -----------------------------------------------------

    pub fn read_vector3(&mut self) -> Result<Vector3, FormatError> {
        let words = self.take(Vector3::STRIDE)?;
        Ok(Vector3::new(
            f32::from_bits(words[0]),
            f32::from_bits(words[1]),
            f32::from_bits(words[2]),
        ))
    }

    pub fn read_quaternion(&mut self) -> Result<Quaternion, FormatError> {
        let words = self.take(Quaternion::STRIDE)?;
        Ok(Quaternion::new(
            f32::from_bits(words[0]),
            f32::from_bits(words[1]),
            f32::from_bits(words[2]),
            f32::from_bits(words[3]),
        ))
    }

    pub fn read_color(&mut self) -> Result<ColorRgba, FormatError> {
        let words = self.take(ColorRgba::STRIDE)?;
        Ok(ColorRgba::new(
            f32::from_bits(words[0]),
            f32::from_bits(words[1]),
            f32::from_bits(words[2]),
            f32::from_bits(words[3]),
        ))
    }

    pub fn read_matrix(&mut self) -> Result<Matrix4, FormatError> {
        let words = self.take(Matrix4::STRIDE)?;
        let mut rows = [[0.0f32; 4]; 4];
        for (row_index, row) in rows.iter_mut().enumerate() {
            for (col_index, cell) in row.iter_mut().enumerate() {
                *cell = f32::from_bits(words[row_index * 4 + col_index]);
            }
        }
        Ok(Matrix4::new(rows))
    }

    // ---- citations ---------------------------------------------------------

    /// Reads an object-ID citation, translating file → runtime when a file
    /// context is attached.
    pub fn read_object_id(&mut self) -> Result<ObjectId, FormatError> {
        let raw = ObjectId::new(self.peek()?);
        let id = match (&self.file_context, raw.is_none()) {
            (Some(context), false) => match context.to_runtime(raw) {
                Some(mapped) => mapped,
                None if self.strict => {
                    return Err(FormatError::reference_unresolved(format!(
                        "file id {} at offset {} has no runtime object",
                        raw, self.cursor
                    )));
                }
                None => raw,
            },
            _ => raw,
        };
        self.cursor += 1;
        Ok(id)
    }

    /// Reads an ID sequence: the count DWORD, then that many IDs.
    pub fn read_object_id_sequence(&mut self) -> Result<Vec<ObjectId>, FormatError> {
        let count = self.peek()? as usize;
        if self.remaining() < 1 + count {
            return Err(FormatError::invalid_data(format!(
                "ID sequence of {} elements overruns payload ({} DWORDs remain)",
                count,
                self.remaining()
            )));
        }
        let start = self.cursor;
        self.cursor += 1;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            match self.read_object_id() {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.cursor = start;
                    return Err(e);
                }
            }
        }
        Ok(ids)
    }

    /// Reads a manager citation: the owning GUID and the value.
    pub fn read_manager_int(&mut self) -> Result<(Guid, i32), FormatError> {
        let words = self.take(3)?;
        Ok((Guid::new(words[0], words[1]), words[2] as i32))
    }

    /// Reads a manager sequence: GUID, count, then the values.
    pub fn read_manager_int_sequence(&mut self) -> Result<(Guid, Vec<i32>), FormatError> {
        let start = self.cursor;
        let header = self.take(3)?;
        let guid = Guid::new(header[0], header[1]);
        let count = header[2] as usize;
        match self.take(count) {
            Ok(words) => Ok((guid, words.iter().map(|&w| w as i32).collect())),
            Err(e) => {
                self.cursor = start;
                Err(e)
            }
        }
    }

    /// Reads one DWORD at an identifier position.
    pub fn read_identifier(&mut self) -> Result<u32, FormatError> {
        self.take_one()
    }

    /// Scans forward for `identifier` and positions the cursor immediately
    /// after the marker, wrapping once from position 0.
    pub fn seek_identifier(&mut self, identifier: u32) -> Result<(), FormatError> {
        let found = self.find_identifier(identifier)?;
        self.cursor = found + 1;
        Ok(())
    }

    /// Like [`ChunkParser::seek_identifier`], and additionally returns the
    /// DWORD distance from the new cursor to the next occurrence of the same
    /// identifier, or to the end of the payload.
    pub fn seek_identifier_with_size(&mut self, identifier: u32) -> Result<usize, FormatError> {
        let found = self.find_identifier(identifier)?;
        self.cursor = found + 1;
        let data = &self.chunk.data;
        let next = data[self.cursor..]
            .iter()
            .position(|&word| word == identifier)
            .map(|offset| self.cursor + offset)
            .unwrap_or(data.len());
        Ok(next - self.cursor)
    }

    fn find_identifier(&self, identifier: u32) -> Result<usize, FormatError> {
        let data = &self.chunk.data;
        let origin = self.cursor.min(data.len());

        // One pass to EOF, then one wrapped pass up to the original cursor.
        if let Some(offset) = data[origin..].iter().position(|&word| word == identifier) {
            return Ok(origin + offset);
        }
        if let Some(offset) = data[..origin].iter().position(|&word| word == identifier) {
            return Ok(offset);
        }
        Err(FormatError::not_found(format!(
            "identifier {:#x} not present in payload of {} DWORDs",
            identifier,
            data.len()
        )))
    }

    // ---- sub-chunks --------------------------------------------------------

    /// Consumes a `[sentinel][count]` preamble from the sub-chunk table and
    /// returns the number of children in the sequence.
    pub fn start_read_sequence(&mut self) -> Result<u32, FormatError> {
        let refs = &self.chunk.chunk_refs;
        if refs.get(self.ref_cursor).is_none() {
            return Err(FormatError::eof("sub-chunk table exhausted".to_string()));
        }
        if refs.get(self.ref_cursor) != Some(&SEQUENCE_SENTINEL) {
            return Err(FormatError::invalid_data(
                "sub-chunk table has no sequence preamble at this position".to_string(),
            ));
        }
        let count = *refs
            .get(self.ref_cursor + 1)
            .ok_or_else(|| FormatError::invalid_data("sequence preamble missing its count".to_string()))?;
        self.ref_cursor += 2;
        Ok(count)
    }

    /// Reconstructs the next embedded child chunk via the parent's sub-chunk
    /// table and advances the payload cursor past its image.
    pub fn read_subchunk(&mut self) -> Result<StateChunk, FormatError> {
        let refs = &self.chunk.chunk_refs;
        // Tolerate an unconsumed sequence preamble.
        while refs.get(self.ref_cursor) == Some(&SEQUENCE_SENTINEL) {
            self.ref_cursor += 2;
        }
        let offset = *refs
            .get(self.ref_cursor)
            .ok_or_else(|| FormatError::eof("sub-chunk table exhausted".to_string()))? as usize;
        if offset > self.chunk.data.len() {
            return Err(FormatError::invalid_data(format!(
                "sub-chunk offset {} outside payload of {} DWORDs",
                offset,
                self.chunk.data.len()
            )));
        }

        let (child, consumed) = StateChunk::unpack(&self.chunk.data[offset..])?;
        self.ref_cursor += 1;
        self.cursor = offset + consumed;
        Ok(child)
    }

    /// Zero-copy view of the next `dwords` DWORDs.
    pub fn lock_read_buffer(&mut self, dwords: usize) -> Result<&'a [u32], FormatError> {
        if self.remaining() < dwords {
            return Err(FormatError::eof(format!(
                "lock of {} DWORDs exceeds the {} remaining",
                dwords,
                self.remaining()
            )));
        }
        let view = &self.chunk.data[self.cursor..self.cursor + dwords];
        self.cursor += dwords;
        Ok(view)
    }

    // ---- internals ---------------------------------------------------------

    fn peek(&self) -> Result<u32, FormatError> {
        self.chunk
            .data
            .get(self.cursor)
            .copied()
            .ok_or_else(|| FormatError::eof(format!("read past end of payload at DWORD {}", self.cursor)))
    }

    fn take_one(&mut self) -> Result<u32, FormatError> {
        let value = self.peek()?;
        self.cursor += 1;
        Ok(value)
    }

    fn take(&mut self, dwords: usize) -> Result<&'a [u32], FormatError> {
        if self.remaining() < dwords {
            return Err(FormatError::eof(format!(
                "read of {} DWORDs exceeds the {} remaining",
                dwords,
                self.remaining()
            )));
        }
        let words = &self.chunk.data[self.cursor..self.cursor + dwords];
        self.cursor += dwords;
        Ok(words)
    }
}
