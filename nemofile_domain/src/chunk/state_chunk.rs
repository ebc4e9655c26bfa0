// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # State-Chunk Model
//!
//! In-memory representation of one state chunk: the DWORD payload plus the
//! three citation sidebands and an optional cached serialized form.
//!
//! ## Sideband grammar
//!
//! The `ids` table is a sequence of entries in write order:
//!
//! - a plain entry is the payload offset of one cited object-ID DWORD;
//! - [`SEQUENCE_SENTINEL`] followed by one entry `count_offset` records an
//!   ID sequence: the DWORD at `count_offset` holds the element count `n`,
//!   and the `n` cited DWORDs occupy `count_offset + 1 ..= count_offset + n`.
//!
//! The `chunk_refs` table uses the same two shapes: a plain entry is the
//! payload offset where a packed child image starts, and a sentinel followed
//! by `n` announces a formal sub-chunk sequence of `n` children.
//!
//! Manager citations record `(guid, offset)` pairs; a pair whose offset is
//! the sentinel announces a manager sequence and is followed by a pair
//! addressing the sequence's count DWORD.
//!
//! ## Packed sub-chunk image
//!
//! A chunk is embedded inside a parent payload as a deterministic image:
//!
//! ```text
//! [class_id][chunk_version][data_version][options]
//! [data_len][ids_len][chunk_refs_len][managers_len]
//! [ids entries...][chunk_refs entries...][managers entries (d1,d2,off)...]
//! [payload DWORDs...]
//! ```
//!
//! All offsets inside an image are relative to the image's own payload, so
//! images nest without rewriting and remapping can descend recursively.

use serde::{Deserialize, Serialize};

use crate::chunk::SEQUENCE_SENTINEL;
use crate::error::FormatError;
use crate::value_objects::{ChunkOptions, ClassId, Guid, IdRemap, ObjectId};

/// Number of header DWORDs in a packed sub-chunk image.
pub(crate) const PACKED_HEADER_DWORDS: usize = 8;

/// One manager citation: which manager owns the value at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerCitation {
    pub guid: Guid,
    pub offset: u32,
}

/// Result of rewriting a chunk's citations through an ID remap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapOutcome {
    /// Citation sites rewritten to a mapped value.
    pub rewritten: usize,
    /// `(payload offset, raw id)` of citations with no mapping, left as-is.
    pub unresolved: Vec<(u32, u32)>,
}

/// One object or manager state chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateChunk {
    pub(crate) class_id: ClassId,
    pub(crate) chunk_version: u16,
    pub(crate) data_version: u32,
    pub(crate) options: ChunkOptions,
    pub(crate) data: Vec<u32>,
    pub(crate) ids: Vec<u32>,
    pub(crate) managers: Vec<ManagerCitation>,
    pub(crate) chunk_refs: Vec<u32>,
    /// Serialized form captured at parse time, returned unchanged by
    /// `serialize_version1` while the chunk is unmutated.
    #[serde(skip)]
    pub(crate) raw_bytes: Option<Vec<u8>>,
}

impl StateChunk {
    pub fn new(class_id: ClassId, chunk_version: u16) -> Self {
        Self {
            class_id,
            chunk_version,
            ..Self::default()
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn chunk_version(&self) -> u16 {
        self.chunk_version
    }

    pub fn data_version(&self) -> u32 {
        self.data_version
    }

    pub fn set_data_version(&mut self, version: u32) {
        self.data_version = version;
        self.raw_bytes = None;
    }

    pub fn options(&self) -> ChunkOptions {
        self.options
    }

    /// Payload length in DWORDs.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Payload length in bytes.
    pub fn raw_size(&self) -> usize {
        self.data.len() * 4
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn managers(&self) -> &[ManagerCitation] {
        &self.managers
    }

    pub fn chunk_refs(&self) -> &[u32] {
        &self.chunk_refs
    }

    /// Number of plain ID citations plus sequence count-sites.
    pub fn id_count(&self) -> usize {
        let mut count = 0usize;
        let mut iter = self.ids.iter();
        while let Some(&entry) = iter.next() {
            if entry == SEQUENCE_SENTINEL {
                if iter.next().is_some() {
                    count += 1;
                }
            } else {
                count += 1;
            }
        }
        count
    }

    /// The cached serialized form, if this chunk came from a parse and has
    /// not been mutated since.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes.as_deref()
    }

    /// Overwrites one payload DWORD, used by late reference resolution.
    pub fn patch_dword(&mut self, offset: usize, value: u32) -> Result<(), FormatError> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(offset)
            .ok_or_else(|| FormatError::invalid_data(format!("patch offset {} outside payload of {} DWORDs", offset, len)))?;
        if *slot != value {
            *slot = value;
            self.raw_bytes = None;
        }
        Ok(())
    }

    /// Checks the model invariants:
    ///
    /// - every sideband offset addresses a payload DWORD;
    /// - sequence entries address a count whose elements stay in bounds;
    /// - each option bit matches whether its sideband is non-empty.
    pub fn validate(&self) -> Result<(), FormatError> {
        self.validate_id_table(&self.ids)?;
        self.validate_ref_table(&self.chunk_refs)?;

        for citation in &self.managers {
            if citation.offset != SEQUENCE_SENTINEL && citation.offset as usize >= self.data.len().max(1) {
                return Err(FormatError::invalid_data(format!(
                    "manager citation offset {} outside payload of {} DWORDs",
                    citation.offset,
                    self.data.len()
                )));
            }
        }

        let checks = [
            (ChunkOptions::IDS, !self.ids.is_empty(), "IDS"),
            (ChunkOptions::MAN, !self.managers.is_empty(), "MAN"),
            (ChunkOptions::CHN, !self.chunk_refs.is_empty(), "CHN"),
        ];
        for (bit, present, name) in checks {
            if self.options.contains(bit) != present {
                return Err(FormatError::validation_failed(format!(
                    "option flag {} disagrees with sideband contents",
                    name
                )));
            }
        }
        Ok(())
    }

    fn validate_id_table(&self, table: &[u32]) -> Result<(), FormatError> {
        let len = self.data.len();
        let mut iter = table.iter();
        while let Some(&entry) = iter.next() {
            if entry == SEQUENCE_SENTINEL {
                let count_offset = *iter.next().ok_or_else(|| {
                    FormatError::invalid_data("ID table ends after a sequence sentinel".to_string())
                })? as usize;
                if count_offset >= len {
                    return Err(FormatError::invalid_data(format!(
                        "ID sequence count offset {} outside payload of {} DWORDs",
                        count_offset, len
                    )));
                }
                let count = self.data[count_offset] as usize;
                if count_offset + count >= len && count > 0 {
                    return Err(FormatError::invalid_data(format!(
                        "ID sequence of {} elements at offset {} overruns payload",
                        count, count_offset
                    )));
                }
            } else if entry as usize >= len {
                return Err(FormatError::invalid_data(format!(
                    "ID citation offset {} outside payload of {} DWORDs",
                    entry, len
                )));
            }
        }
        Ok(())
    }

    fn validate_ref_table(&self, table: &[u32]) -> Result<(), FormatError> {
        let len = self.data.len();
        let mut iter = table.iter();
        while let Some(&entry) = iter.next() {
            if entry == SEQUENCE_SENTINEL {
                // Sequence preamble: the following entry is a child count,
                // not an offset.
                iter.next();
            } else if entry as usize >= len {
                return Err(FormatError::invalid_data(format!(
                    "sub-chunk offset {} outside payload of {} DWORDs",
                    entry, len
                )));
            }
        }
        Ok(())
    }

    /// Serializes this chunk into its packed image.
    pub fn pack(&self) -> Vec<u32> {
        let mut image = Vec::with_capacity(
            PACKED_HEADER_DWORDS + self.ids.len() + self.chunk_refs.len() + 3 * self.managers.len() + self.data.len(),
        );
        image.push(self.class_id.raw());
        image.push(self.chunk_version as u32);
        image.push(self.data_version);
        image.push(self.options.bits());
        image.push(self.data.len() as u32);
        image.push(self.ids.len() as u32);
        image.push(self.chunk_refs.len() as u32);
        image.push(self.managers.len() as u32);
        image.extend_from_slice(&self.ids);
        image.extend_from_slice(&self.chunk_refs);
        for citation in &self.managers {
            image.push(citation.guid.d1);
            image.push(citation.guid.d2);
            image.push(citation.offset);
        }
        image.extend_from_slice(&self.data);
        image
    }

    /// Reconstructs a chunk from a packed image, returning it together with
    /// the number of DWORDs consumed.
    pub fn unpack(image: &[u32]) -> Result<(Self, usize), FormatError> {
        if image.len() < PACKED_HEADER_DWORDS {
            return Err(FormatError::eof(format!(
                "packed chunk image needs {} header DWORDs, have {}",
                PACKED_HEADER_DWORDS,
                image.len()
            )));
        }

        let class_id = ClassId::new(image[0]);
        let chunk_version = (image[1] & 0xFFFF) as u16;
        let data_version = image[2];
        let options = ChunkOptions::from_bits_truncate(image[3]);
        let data_len = image[4] as usize;
        let ids_len = image[5] as usize;
        let refs_len = image[6] as usize;
        let managers_len = image[7] as usize;

        let total = PACKED_HEADER_DWORDS
            .checked_add(ids_len)
            .and_then(|n| n.checked_add(refs_len))
            .and_then(|n| n.checked_add(managers_len.checked_mul(3)?))
            .and_then(|n| n.checked_add(data_len))
            .ok_or_else(|| FormatError::invalid_data("packed chunk sizes overflow".to_string()))?;
        if image.len() < total {
            return Err(FormatError::eof(format!(
                "packed chunk image of {} DWORDs truncated at {}",
                total,
                image.len()
            )));
        }

        let mut cursor = PACKED_HEADER_DWORDS;
        let ids = image[cursor..cursor + ids_len].to_vec();
        cursor += ids_len;
        let chunk_refs = image[cursor..cursor + refs_len].to_vec();
        cursor += refs_len;
        let mut managers = Vec::with_capacity(managers_len);
        for _ in 0..managers_len {
            managers.push(ManagerCitation {
                guid: Guid::new(image[cursor], image[cursor + 1]),
                offset: image[cursor + 2],
            });
            cursor += 3;
        }
        let data = image[cursor..cursor + data_len].to_vec();

        let chunk = Self {
            class_id,
            chunk_version,
            data_version,
            options,
            data,
            ids,
            managers,
            chunk_refs,
            raw_bytes: None,
        };
        chunk.validate()?;
        Ok((chunk, total))
    }

    /// Rewrites every object-ID citation through `remap` in place, descending
    /// into embedded sub-chunks via the `chunk_refs` table, and clears the
    /// [`ChunkOptions::FILE`] marker.
    ///
    /// Chunks without the FILE marker are already in runtime space and are
    /// left untouched (including their raw cache).
    ///
    /// In strict mode a missing mapping is an error; otherwise the raw value
    /// stays in place and is reported in the outcome for a later resolution
    /// pass.
    pub fn remap_ids(&mut self, remap: &IdRemap, strict: bool) -> Result<RemapOutcome, FormatError> {
        if !self.options.contains(ChunkOptions::FILE) {
            return Ok(RemapOutcome::default());
        }

        let mut outcome = RemapOutcome::default();
        let ids = self.ids.clone();
        let refs = self.chunk_refs.clone();
        remap_region(&mut self.data, &ids, &refs, remap, strict, RemapDirection::ToRuntime, &mut outcome)?;

        self.options.remove(ChunkOptions::FILE);
        // The payload and the option bits changed; the cached serialized
        // form no longer matches.
        self.raw_bytes = None;
        Ok(outcome)
    }

    /// Save-side counterpart of [`StateChunk::remap_ids`]: rewrites every
    /// citation from runtime into file space and sets the
    /// [`ChunkOptions::FILE`] marker.
    ///
    /// A chunk already in file space, or one with no citations, is left
    /// untouched. A cited object that was not assigned a file ID keeps its
    /// raw value (non-strict) or fails (strict).
    pub fn remap_to_file(&mut self, remap: &IdRemap, strict: bool) -> Result<RemapOutcome, FormatError> {
        if self.options.contains(ChunkOptions::FILE) || self.ids.is_empty() {
            return Ok(RemapOutcome::default());
        }

        let mut outcome = RemapOutcome::default();
        let ids = self.ids.clone();
        let refs = self.chunk_refs.clone();
        remap_region(&mut self.data, &ids, &refs, remap, strict, RemapDirection::ToFile, &mut outcome)?;

        self.options |= ChunkOptions::FILE;
        self.raw_bytes = None;
        Ok(outcome)
    }
}

/// Which way a citation rewrite translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemapDirection {
    ToRuntime,
    ToFile,
}

/// Rewrites citations inside one payload region described by its own ID and
/// sub-chunk tables, recursing into packed child images.
fn remap_region(
    data: &mut [u32],
    ids: &[u32],
    refs: &[u32],
    remap: &IdRemap,
    strict: bool,
    direction: RemapDirection,
    outcome: &mut RemapOutcome,
) -> Result<(), FormatError> {
    let mut site = |data: &mut [u32], offset: usize| -> Result<(), FormatError> {
        let raw = *data.get(offset).ok_or_else(|| {
            FormatError::invalid_data(format!("citation offset {} outside payload of {} DWORDs", offset, data.len()))
        })?;
        if raw == 0 {
            return Ok(());
        }
        let mapped = match direction {
            RemapDirection::ToRuntime => remap.to_runtime(ObjectId::new(raw)),
            RemapDirection::ToFile => remap.to_file(ObjectId::new(raw)),
        };
        match mapped {
            Some(mapped) => {
                data[offset] = mapped.raw();
                outcome.rewritten += 1;
            }
            None if strict => {
                return Err(FormatError::reference_unresolved(format!(
                    "id {} at payload offset {} has no mapping",
                    raw, offset
                )));
            }
            None => outcome.unresolved.push((offset as u32, raw)),
        }
        Ok(())
    };

    let mut iter = ids.iter();
    while let Some(&entry) = iter.next() {
        if entry == SEQUENCE_SENTINEL {
            let count_offset = *iter
                .next()
                .ok_or_else(|| FormatError::invalid_data("ID table ends after a sequence sentinel".to_string()))?
                as usize;
            let count = *data.get(count_offset).ok_or_else(|| {
                FormatError::invalid_data(format!("ID sequence count offset {} outside payload", count_offset))
            })? as usize;
            for element in 0..count {
                site(data, count_offset + 1 + element)?;
            }
        } else {
            site(data, entry as usize)?;
        }
    }

    // Descend into embedded children. Offsets with no mapping in the child
    // accumulate into the same outcome, rebased to the child's region so the
    // report stays addressable.
    let mut ref_iter = refs.iter();
    while let Some(&entry) = ref_iter.next() {
        if entry == SEQUENCE_SENTINEL {
            ref_iter.next();
            continue;
        }
        let start = entry as usize;
        let (child_ids, child_refs, child_data_start, child_data_len) = read_packed_tables(&data[start..])
            .map_err(|e| FormatError::invalid_data(format!("embedded sub-chunk at offset {}: {}", start, e)))?;

        // Keep the child's FILE marker in step with the parent's.
        match direction {
            RemapDirection::ToRuntime => data[start + 3] &= !ChunkOptions::FILE.bits(),
            RemapDirection::ToFile => data[start + 3] |= ChunkOptions::FILE.bits(),
        }

        let region_start = start + child_data_start;
        let before = outcome.unresolved.len();
        remap_region(
            &mut data[region_start..region_start + child_data_len],
            &child_ids,
            &child_refs,
            remap,
            strict,
            direction,
            outcome,
        )?;
        for entry in &mut outcome.unresolved[before..] {
            entry.0 += region_start as u32;
        }
    }
    Ok(())
}

/// Reads the sideband tables out of a packed image header.
///
/// Returns `(ids, chunk_refs, payload start, payload len)` with the start
/// relative to the image.
fn read_packed_tables(image: &[u32]) -> Result<(Vec<u32>, Vec<u32>, usize, usize), FormatError> {
    if image.len() < PACKED_HEADER_DWORDS {
        return Err(FormatError::eof("truncated packed header".to_string()));
    }
    let data_len = image[4] as usize;
    let ids_len = image[5] as usize;
    let refs_len = image[6] as usize;
    let managers_len = image[7] as usize;

    let tables_end = PACKED_HEADER_DWORDS + ids_len + refs_len + 3 * managers_len;
    let total = tables_end + data_len;
    if image.len() < total {
        return Err(FormatError::eof("truncated packed image".to_string()));
    }

    let ids = image[PACKED_HEADER_DWORDS..PACKED_HEADER_DWORDS + ids_len].to_vec();
    let refs = image[PACKED_HEADER_DWORDS + ids_len..PACKED_HEADER_DWORDS + ids_len + refs_len].to_vec();
    Ok((ids, refs, tables_end, data_len))
}
