// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Writer
//!
//! Sequential writer producing a well-formed [`StateChunk`] from a stream of
//! primitive writes. The unit of everything is the DWORD (4 bytes, little
//! endian): every write lands on a DWORD boundary, sub-DWORD values are
//! zero-padded, and byte buffers are padded up to the next boundary.
//!
//! ## State machine
//!
//! `Idle → Writing → Finalized`. A writer starts `Idle`; [`ChunkWriter::start`]
//! moves it to `Writing`; [`ChunkWriter::finalize`] consumes the writer and
//! freezes the sidebands into the returned chunk. Write operations outside
//! `Writing` return `InvalidArgument` and change nothing.
//!
//! ## Citations
//!
//! [`ChunkWriter::write_object_id`] records the write offset in the ID
//! sideband (zero IDs are written but never tracked). With a file context
//! installed via [`ChunkWriter::set_file_context`], IDs are translated to
//! file space on the way in and the chunk is finalized with the
//! [`ChunkOptions::FILE`] marker.
//!
//! ID and manager sequences store one count DWORD followed by their
//! elements; the elements must be written contiguously, which the writer
//! enforces.

use std::sync::Arc;

use crate::chunk::state_chunk::{ManagerCitation, StateChunk};
use crate::chunk::SEQUENCE_SENTINEL;
use crate::error::FormatError;
use crate::value_objects::{ChunkOptions, ClassId, ColorRgba, Guid, IdRemap, Matrix4, ObjectId, Quaternion, Vector3};

/// Initial payload capacity in DWORDs; growth doubles from here.
const INITIAL_CAPACITY_DWORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Idle,
    Writing,
}

#[derive(Debug, Clone, Copy)]
struct PendingSequence {
    remaining: u32,
    next_offset: usize,
}

/// Sequential DWORD-aligned chunk writer.
#[derive(Debug)]
pub struct ChunkWriter {
    state: WriterState,
    class_id: ClassId,
    chunk_version: u16,
    data_version: u32,
    options: ChunkOptions,
    data: Vec<u32>,
    ids: Vec<u32>,
    managers: Vec<ManagerCitation>,
    chunk_refs: Vec<u32>,
    identifiers: Vec<(u32, u32)>,
    id_sequence: Option<PendingSequence>,
    manager_sequence: Option<PendingSequence>,
    file_context: Option<Arc<IdRemap>>,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self {
            state: WriterState::Idle,
            class_id: ClassId::default(),
            chunk_version: 0,
            data_version: 0,
            options: ChunkOptions::empty(),
            data: Vec::new(),
            ids: Vec::new(),
            managers: Vec::new(),
            chunk_refs: Vec::new(),
            identifiers: Vec::new(),
            id_sequence: None,
            manager_sequence: None,
            file_context: None,
        }
    }

    /// Initializes the writer for a chunk of `class_id` with the given
    /// envelope version. Required before any write.
    pub fn start(&mut self, class_id: ClassId, chunk_version: u16) -> Result<(), FormatError> {
        if self.state != WriterState::Idle {
            return Err(FormatError::invalid_argument(
                "chunk writer already started".to_string(),
            ));
        }
        self.class_id = class_id;
        self.chunk_version = chunk_version;
        self.data = Vec::with_capacity(INITIAL_CAPACITY_DWORDS);
        self.state = WriterState::Writing;
        Ok(())
    }

    /// Payload version chosen by the payload owner.
    pub fn set_data_version(&mut self, version: u32) {
        self.data_version = version;
    }

    /// Installs a runtime → file ID remap; subsequent object-ID writes are
    /// translated into file space.
    pub fn set_file_context(&mut self, context: Arc<IdRemap>) {
        self.file_context = Some(context);
    }

    /// Current write position in DWORDs.
    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// Number of identifier markers written so far.
    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    // ---- primitives --------------------------------------------------------

    /// Writes one byte, zero-padded to a full DWORD.
    pub fn write_byte(&mut self, value: u8) -> Result<(), FormatError> {
        self.push(value as u32)
    }

    /// Writes one 16-bit word, zero-padded to a full DWORD.
    pub fn write_word(&mut self, value: u16) -> Result<(), FormatError> {
        self.push(value as u32)
    }

    pub fn write_dword(&mut self, value: u32) -> Result<(), FormatError> {
        self.push(value)
    }

    pub fn write_int(&mut self, value: i32) -> Result<(), FormatError> {
        self.push(value as u32)
    }

    pub fn write_float(&mut self, value: f32) -> Result<(), FormatError> {
        self.push(value.to_bits())
    }

    /// Writes a 32-bit value as two padded 16-bit halves: `lo` then `hi`.
    pub fn write_dword_as_words(&mut self, value: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(2);
        self.data.push(value & 0xFFFF);
        self.data.push(value >> 16);
        Ok(())
    }

    /// Repeats [`ChunkWriter::write_dword_as_words`] for every element.
    pub fn write_array_dword_as_words(&mut self, values: &[u32]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(values.len() * 2);
        for &value in values {
            self.data.push(value & 0xFFFF);
            self.data.push(value >> 16);
        }
        Ok(())
    }

    /// Writes a GUID as two DWORDs, `d1` then `d2`.
    pub fn write_guid(&mut self, guid: Guid) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(2);
        self.data.push(guid.d1);
        self.data.push(guid.d2);
        Ok(())
    }

    /// Writes raw bytes padded with zeros to the next DWORD boundary.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(bytes.len().div_ceil(4));
        for quad in bytes.chunks(4) {
            let mut dword = [0u8; 4];
            dword[..quad.len()].copy_from_slice(quad);
            self.data.push(u32::from_le_bytes(dword));
        }
        Ok(())
    }

    /// Writes a length-prefixed string: byte length including the NUL
    /// terminator, then the bytes, zero-padded to a DWORD.
    pub fn write_string(&mut self, value: &str) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let len_with_nul = value.len() as u32 + 1;
        self.push(len_with_nul)?;
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.write_bytes(&bytes)
    }

    /// Writes a size-prefixed byte buffer (size in bytes, payload padded).
    pub fn write_buffer(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.push(bytes.len() as u32)?;
        self.write_bytes(bytes)
    }

    /// Writes a byte buffer with no size prefix; the caller remembers the
    /// length.
    pub fn write_buffer_nosize(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.write_bytes(bytes)
    }

    /// Writes 16-bit values with no size prefix, two per DWORD (low word
    /// first); an odd trailing element occupies a padded DWORD.
    pub fn write_buffer_nosize_lendian16(&mut self, values: &[u16]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(values.len().div_ceil(2));
        for pair in values.chunks(2) {
            let lo = pair[0] as u32;
            let hi = if pair.len() == 2 { pair[1] as u32 } else { 0 };
            self.data.push(lo | (hi << 16));
        }
        Ok(())
    }

    /// Writes `[total_bytes][elem_count][data…]`, padded to a DWORD.
    pub fn write_array_lendian(&mut self, elem_count: u32, elem_size: u32, data: &[u8]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        if elem_count as usize * elem_size as usize != data.len() {
            return Err(FormatError::invalid_argument(format!(
                "array payload of {} bytes does not match {} elements of {} bytes",
                data.len(),
                elem_count,
                elem_size
            )));
        }
        self.push(data.len() as u32)?;
        self.push(elem_count)?;
        self.write_bytes(data)
    }

    /// 16-bit variant of [`ChunkWriter::write_array_lendian`]: elements are
    /// packed two per DWORD.
    pub fn write_array_lendian16(&mut self, elem_count: u32, elem_size: u32, data: &[u16]) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let total_bytes = data.len() * 2;
        if elem_count as usize * elem_size as usize != total_bytes {
            return Err(FormatError::invalid_argument(format!(
                "array payload of {} bytes does not match {} elements of {} bytes",
                total_bytes, elem_count, elem_size
            )));
        }
        self.push(total_bytes as u32)?;
        self.push(elem_count)?;
        self.write_buffer_nosize_lendian16(data)
    }

    // ---- math payloads -----------------------------------------------------

    pub fn write_vector3(&mut self, v: Vector3) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(Vector3::STRIDE);
        for component in [v.x, v.y, v.z] {
            self.data.push(component.to_bits());
        }
        Ok(())
    }

    pub fn write_quaternion(&mut self, q: Quaternion) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(Quaternion::STRIDE);
        for component in [q.x, q.y, q.z, q.w] {
            self.data.push(component.to_bits());
        }
        Ok(())
    }

    pub fn write_color(&mut self, c: ColorRgba) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(ColorRgba::STRIDE);
        for component in [c.r, c.g, c.b, c.a] {
            self.data.push(component.to_bits());
        }
        Ok(())
    }

    pub fn write_matrix(&mut self, m: Matrix4) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(Matrix4::STRIDE);
        for row in m.rows {
            for component in row {
                self.data.push(component.to_bits());
            }
        }
        Ok(())
    }

    // ---- citations ---------------------------------------------------------

    /// Writes an object-ID citation.
    ///
    /// The ID is translated to file space when a file context is installed.
    /// A non-zero ID adds its offset to the ID sideband; ID zero ("no
    /// object") is written but never tracked. Inside an ID sequence the
    /// offset is implied by the count site and nothing is appended.
    pub fn write_object_id(&mut self, id: ObjectId) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let raw = match (&self.file_context, id.is_none()) {
            (Some(context), false) => context.to_file(id).unwrap_or(id).raw(),
            _ => id.raw(),
        };

        if let Some(mut sequence) = self.id_sequence {
            if self.data.len() != sequence.next_offset {
                return Err(FormatError::invalid_argument(
                    "object-ID sequence elements must be written contiguously".to_string(),
                ));
            }
            self.grow_for(1);
            self.data.push(raw);
            sequence.next_offset += 1;
            sequence.remaining -= 1;
            self.id_sequence = (sequence.remaining > 0).then_some(sequence);
            return Ok(());
        }

        let offset = self.data.len();
        self.grow_for(1);
        self.data.push(raw);
        if !id.is_none() {
            self.ids.push(offset as u32);
            self.options |= ChunkOptions::IDS;
            if self.file_context.is_some() {
                self.options |= ChunkOptions::FILE;
            }
        }
        Ok(())
    }

    /// Opens an object-ID sequence of `count` elements.
    ///
    /// Emits the count DWORD, records `[sentinel][count offset]` in the ID
    /// sideband, and expects exactly `count` contiguous
    /// [`ChunkWriter::write_object_id`] calls next.
    pub fn start_object_id_sequence(&mut self, count: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        if self.id_sequence.is_some() {
            return Err(FormatError::invalid_argument(
                "an object-ID sequence is already open".to_string(),
            ));
        }
        let count_offset = self.data.len();
        self.push(count)?;
        self.ids.push(SEQUENCE_SENTINEL);
        self.ids.push(count_offset as u32);
        self.options |= ChunkOptions::IDS;
        if self.file_context.is_some() {
            self.options |= ChunkOptions::FILE;
        }
        if count > 0 {
            self.id_sequence = Some(PendingSequence {
                remaining: count,
                next_offset: self.data.len(),
            });
        }
        Ok(())
    }

    /// Writes a manager citation: the manager's GUID followed by the value,
    /// with the value offset recorded in the manager sideband.
    pub fn write_manager_int(&mut self, guid: Guid, value: i32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.write_guid(guid)?;
        let offset = self.data.len();
        self.push(value as u32)?;
        self.managers.push(ManagerCitation {
            guid,
            offset: offset as u32,
        });
        self.options |= ChunkOptions::MAN;
        Ok(())
    }

    /// Opens a manager-value sequence: GUID, count, then `count` contiguous
    /// [`ChunkWriter::write_manager_sequence_int`] calls.
    pub fn start_manager_sequence(&mut self, guid: Guid, count: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        if self.manager_sequence.is_some() {
            return Err(FormatError::invalid_argument(
                "a manager sequence is already open".to_string(),
            ));
        }
        self.write_guid(guid)?;
        let count_offset = self.data.len();
        self.push(count)?;
        self.managers.push(ManagerCitation {
            guid,
            offset: SEQUENCE_SENTINEL,
        });
        self.managers.push(ManagerCitation {
            guid,
            offset: count_offset as u32,
        });
        self.options |= ChunkOptions::MAN;
        if count > 0 {
            self.manager_sequence = Some(PendingSequence {
                remaining: count,
                next_offset: self.data.len(),
            });
        }
        Ok(())
    }

    /// Writes one element of the open manager sequence.
    pub fn write_manager_sequence_int(&mut self, value: i32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let mut sequence = self
            .manager_sequence
            .ok_or_else(|| FormatError::invalid_argument("no manager sequence is open".to_string()))?;
        if self.data.len() != sequence.next_offset {
            return Err(FormatError::invalid_argument(
                "manager sequence elements must be written contiguously".to_string(),
            ));
        }
        self.grow_for(1);
        self.data.push(value as u32);
        sequence.next_offset += 1;
        sequence.remaining -= 1;
        self.manager_sequence = (sequence.remaining > 0).then_some(sequence);
        Ok(())
    }

    // ---- identifiers and sub-chunks ---------------------------------------

    /// Emits a random-access identifier marker (one DWORD).
    ///
    /// Markers are found again by literal value scanning, so the chunk's
    /// layout owner must pick values that cannot collide with payload
    /// DWORDs at scan time.
    pub fn write_identifier(&mut self, identifier: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let offset = self.data.len();
        self.push(identifier)?;
        self.identifiers.push((identifier, offset as u32));
        Ok(())
    }

    /// Opens a formal sub-chunk sequence of `count` children by recording a
    /// `[sentinel][count]` preamble in the sub-chunk table.
    pub fn start_subchunk_sequence(&mut self, count: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.chunk_refs.push(SEQUENCE_SENTINEL);
        self.chunk_refs.push(count);
        self.options |= ChunkOptions::CHN;
        Ok(())
    }

    /// Embeds `child` at the current position and records its offset in the
    /// sub-chunk table.
    pub fn write_subchunk(&mut self, child: &StateChunk) -> Result<(), FormatError> {
        self.ensure_writable()?;
        let offset = self.data.len();
        let image = child.pack();
        self.grow_for(image.len());
        self.data.extend_from_slice(&image);
        self.chunk_refs.push(offset as u32);
        self.options |= ChunkOptions::CHN;
        Ok(())
    }

    /// Reserves `dwords` zeroed DWORDs and returns them for direct fill.
    pub fn lock_write_buffer(&mut self, dwords: usize) -> Result<&mut [u32], FormatError> {
        self.ensure_writable()?;
        let start = self.data.len();
        self.grow_for(dwords);
        self.data.resize(start + dwords, 0);
        Ok(&mut self.data[start..])
    }

    /// Consumes the writer and returns the finished chunk with frozen
    /// sidebands.
    pub fn finalize(mut self) -> Result<StateChunk, FormatError> {
        self.ensure_writable()?;
        if self.id_sequence.is_some() || self.manager_sequence.is_some() {
            return Err(FormatError::invalid_argument(
                "cannot finalize with an unfinished sequence".to_string(),
            ));
        }
        if self.ids.is_empty() {
            self.options.remove(ChunkOptions::FILE);
        }

        let chunk = StateChunk {
            class_id: self.class_id,
            chunk_version: self.chunk_version,
            data_version: self.data_version,
            options: self.options,
            data: self.data,
            ids: self.ids,
            managers: self.managers,
            chunk_refs: self.chunk_refs,
            raw_bytes: None,
        };
        chunk.validate()?;
        Ok(chunk)
    }

    // ---- internals ---------------------------------------------------------

    fn ensure_writable(&self) -> Result<(), FormatError> {
        if self.state != WriterState::Writing {
            return Err(FormatError::invalid_argument(
                "chunk writer must be started before writing".to_string(),
            ));
        }
        Ok(())
    }

    fn push(&mut self, dword: u32) -> Result<(), FormatError> {
        self.ensure_writable()?;
        self.grow_for(1);
        self.data.push(dword);
        Ok(())
    }

    /// Doubling growth, so repeated small writes settle into O(log n)
    /// reallocations.
    fn grow_for(&mut self, additional: usize) {
        let needed = self.data.len() + additional;
        if needed > self.data.capacity() {
            let target = needed.max(self.data.capacity() * 2).max(INITIAL_CAPACITY_DWORDS);
            self.data.reserve(target - self.data.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> ChunkWriter {
        let mut writer = ChunkWriter::new();
        writer.start(ClassId::new(1), crate::chunk::CHUNK_VERSION_CURRENT).unwrap();
        writer
    }

    #[test]
    fn test_writes_require_start() {
        let mut writer = ChunkWriter::new();
        assert!(matches!(writer.write_dword(1), Err(FormatError::InvalidArgument(_))));
        assert!(matches!(
            writer.write_object_id(ObjectId::new(1)),
            Err(FormatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_double_start_rejected() {
        let mut writer = started();
        assert!(matches!(
            writer.start(ClassId::new(2), 7),
            Err(FormatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sub_dword_values_occupy_full_dwords() {
        let mut writer = started();
        writer.write_byte(0x78).unwrap();
        writer.write_word(0x5678).unwrap();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data(), &[0x78, 0x5678]);
    }

    #[test]
    fn test_bytes_are_zero_padded() {
        let mut writer = started();
        writer.write_bytes(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]).unwrap();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data(), &[0xDDCCBBAA, 0x0000_00EE]);
    }

    #[test]
    fn test_dword_as_words_split() {
        let mut writer = started();
        writer.write_dword_as_words(0x8000_0001).unwrap();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data(), &[0x0001, 0x8000]);
    }

    #[test]
    fn test_lendian16_packs_pairs() {
        let mut writer = started();
        writer.write_buffer_nosize_lendian16(&[0x1111, 0x2222, 0x3333]).unwrap();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data(), &[0x2222_1111, 0x0000_3333]);
    }

    #[test]
    fn test_object_id_tracking() {
        let mut writer = started();
        writer.write_object_id(ObjectId::new(5)).unwrap();
        writer.write_object_id(ObjectId::NONE).unwrap();
        writer.write_object_id(ObjectId::new(9)).unwrap();
        let chunk = writer.finalize().unwrap();

        // Zero is written but not tracked.
        assert_eq!(chunk.data(), &[5, 0, 9]);
        assert_eq!(chunk.ids(), &[0, 2]);
        assert!(chunk.options().contains(ChunkOptions::IDS));
        assert!(!chunk.options().contains(ChunkOptions::FILE));
    }

    #[test]
    fn test_file_context_translates_ids() {
        let mut remap = IdRemap::new();
        remap.insert(ObjectId::new(500), ObjectId::new(1));

        let mut writer = started();
        writer.set_file_context(Arc::new(remap));
        writer.write_object_id(ObjectId::new(500)).unwrap();
        let chunk = writer.finalize().unwrap();

        assert_eq!(chunk.data(), &[1]);
        assert!(chunk.options().contains(ChunkOptions::FILE));
    }

    #[test]
    fn test_id_sequence_layout() {
        let mut writer = started();
        writer.write_dword(0xDEAD).unwrap();
        writer.start_object_id_sequence(2).unwrap();
        writer.write_object_id(ObjectId::new(7)).unwrap();
        writer.write_object_id(ObjectId::new(8)).unwrap();
        let chunk = writer.finalize().unwrap();

        assert_eq!(chunk.data(), &[0xDEAD, 2, 7, 8]);
        assert_eq!(chunk.ids(), &[SEQUENCE_SENTINEL, 1]);
    }

    #[test]
    fn test_unfinished_sequence_blocks_finalize() {
        let mut writer = started();
        writer.start_object_id_sequence(2).unwrap();
        writer.write_object_id(ObjectId::new(7)).unwrap();
        assert!(matches!(writer.finalize(), Err(FormatError::InvalidArgument(_))));
    }

    #[test]
    fn test_interrupted_sequence_detected() {
        let mut writer = started();
        writer.start_object_id_sequence(2).unwrap();
        writer.write_object_id(ObjectId::new(7)).unwrap();
        writer.write_dword(0x1234).unwrap();
        assert!(matches!(
            writer.write_object_id(ObjectId::new(8)),
            Err(FormatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_manager_int_layout() {
        let guid = Guid::new(0x11, 0x22);
        let mut writer = started();
        writer.write_manager_int(guid, -3).unwrap();
        let chunk = writer.finalize().unwrap();

        assert_eq!(chunk.data(), &[0x11, 0x22, (-3i32) as u32]);
        assert_eq!(chunk.managers(), &[ManagerCitation { guid, offset: 2 }]);
        assert!(chunk.options().contains(ChunkOptions::MAN));
    }

    #[test]
    fn test_manager_sequence_layout() {
        let guid = Guid::new(0x11, 0x22);
        let mut writer = started();
        writer.start_manager_sequence(guid, 3).unwrap();
        for value in [10, 20, 30] {
            writer.write_manager_sequence_int(value).unwrap();
        }
        let chunk = writer.finalize().unwrap();

        assert_eq!(chunk.data(), &[0x11, 0x22, 3, 10, 20, 30]);
        assert_eq!(chunk.managers().len(), 2);
        assert_eq!(chunk.managers()[0].offset, SEQUENCE_SENTINEL);
        assert_eq!(chunk.managers()[1].offset, 2);
    }

    #[test]
    fn test_lock_write_buffer_reserves_zeroed_span() {
        let mut writer = started();
        writer.write_dword(1).unwrap();
        {
            let span = writer.lock_write_buffer(3).unwrap();
            assert_eq!(span, &[0, 0, 0]);
            span[1] = 42;
        }
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data(), &[1, 0, 42, 0]);
    }

    #[test]
    fn test_empty_chunk_finalizes_clean() {
        let writer = started();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data_size(), 0);
        assert!(chunk.options().is_empty());
    }

    #[test]
    fn test_array_lendian_validates_element_math() {
        let mut writer = started();
        assert!(matches!(
            writer.write_array_lendian(3, 2, &[0u8; 5]),
            Err(FormatError::InvalidArgument(_))
        ));
        writer.write_array_lendian(2, 3, &[1, 2, 3, 4, 5, 6]).unwrap();
        let chunk = writer.finalize().unwrap();
        assert_eq!(chunk.data()[0], 6); // total bytes
        assert_eq!(chunk.data()[1], 2); // element count
    }
}
