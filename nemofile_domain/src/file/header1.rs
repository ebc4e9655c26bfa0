// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Header1 Codec
//!
//! The metadata section that follows the file header (deflated on disk
//! when the producer chose to). Three arrays, in order:
//!
//! 1. **Object descriptors**, one per object:
//!    `[class_id][object_id][name_len][name bytes][flags][position_hint]`.
//!    The descriptor count comes from the file header. For file version ≥ 8
//!    the descriptor's object ID is authoritative; older files repeat IDs in
//!    the Data section. The position hint is the byte offset of the
//!    object's record inside the uncompressed Data section.
//! 2. **Plugin dependencies**: `[count]` then `[guid.d1][guid.d2][category]`
//!    per entry. No version word is stored.
//! 3. **Included-file index**: `[count]` then `[name_len][name bytes][size]`
//!    per entry; the payloads themselves sit at the file tail.

use crate::error::FormatError;
use crate::value_objects::{ClassId, Guid, ObjectId, PluginDependency};

/// One object descriptor from Header1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// File-space identity; the high bit marks a reference-only descriptor.
    pub object_id: ObjectId,
    pub class_id: ClassId,
    pub flags: u32,
    /// Byte offset of the object's record in the uncompressed Data section.
    pub position_hint: u32,
    pub name: Option<String>,
}

/// One entry of the included-file index; payloads live at the file tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFileIndexEntry {
    pub name: String,
    pub size: u32,
}

/// Decoded Header1 section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header1 {
    pub descriptors: Vec<ObjectDescriptor>,
    pub plugin_dependencies: Vec<PluginDependency>,
    pub included_files: Vec<IncludedFileIndexEntry>,
}

impl Header1 {
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut push = |out: &mut Vec<u8>, value: u32| out.extend_from_slice(&value.to_le_bytes());

        for descriptor in &self.descriptors {
            push(&mut bytes, descriptor.class_id.raw());
            push(&mut bytes, descriptor.object_id.raw());
            let name = descriptor.name.as_deref().unwrap_or("");
            push(&mut bytes, name.len() as u32);
            bytes.extend_from_slice(name.as_bytes());
            push(&mut bytes, descriptor.flags);
            push(&mut bytes, descriptor.position_hint);
        }

        push(&mut bytes, self.plugin_dependencies.len() as u32);
        for dependency in &self.plugin_dependencies {
            push(&mut bytes, dependency.guid.d1);
            push(&mut bytes, dependency.guid.d2);
            push(&mut bytes, dependency.category);
        }

        push(&mut bytes, self.included_files.len() as u32);
        for entry in &self.included_files {
            push(&mut bytes, entry.name.len() as u32);
            bytes.extend_from_slice(entry.name.as_bytes());
            push(&mut bytes, entry.size);
        }

        bytes
    }

    /// Parses Header1; `object_count` comes from the file header.
    pub fn parse(bytes: &[u8], object_count: u32) -> Result<Self, FormatError> {
        let mut reader = ByteReader::new(bytes);

        let mut descriptors = Vec::with_capacity(object_count as usize);
        for index in 0..object_count {
            let class_id = ClassId::new(reader.dword("descriptor class id")?);
            let object_id = ObjectId::new(reader.dword("descriptor object id")?);
            let name_len = reader.dword("descriptor name length")? as usize;
            let name_bytes = reader.bytes(name_len, "descriptor name")?;
            let name = if name_len == 0 {
                None
            } else {
                Some(String::from_utf8(name_bytes.to_vec()).map_err(|e| {
                    FormatError::invalid_data(format!("descriptor {} name is not UTF-8: {}", index, e))
                })?)
            };
            let flags = reader.dword("descriptor flags")?;
            let position_hint = reader.dword("descriptor position hint")?;
            descriptors.push(ObjectDescriptor {
                object_id,
                class_id,
                flags,
                position_hint,
                name,
            });
        }

        let dependency_count = reader.dword("plugin dependency count")? as usize;
        reader.check_plausible(dependency_count, 12, "plugin dependency array")?;
        let mut plugin_dependencies = Vec::with_capacity(dependency_count);
        for _ in 0..dependency_count {
            let d1 = reader.dword("plugin guid")?;
            let d2 = reader.dword("plugin guid")?;
            let category = reader.dword("plugin category")?;
            plugin_dependencies.push(PluginDependency::new(Guid::new(d1, d2), category, 0));
        }

        let included_count = reader.dword("included-file count")? as usize;
        reader.check_plausible(included_count, 8, "included-file index")?;
        let mut included_files = Vec::with_capacity(included_count);
        for index in 0..included_count {
            let name_len = reader.dword("included-file name length")? as usize;
            let name_bytes = reader.bytes(name_len, "included-file name")?;
            let name = String::from_utf8(name_bytes.to_vec()).map_err(|e| {
                FormatError::invalid_data(format!("included file {} name is not UTF-8: {}", index, e))
            })?;
            let size = reader.dword("included-file size")?;
            included_files.push(IncludedFileIndexEntry { name, size });
        }

        Ok(Self {
            descriptors,
            plugin_dependencies,
            included_files,
        })
    }
}

/// Bounds-checked little-endian reader over Header1's byte-aligned stream.
struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn dword(&mut self, what: &str) -> Result<u32, FormatError> {
        let end = self.cursor + 4;
        if end > self.bytes.len() {
            return Err(FormatError::eof(format!("Header1 truncated reading {}", what)));
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
        let end = self.cursor.checked_add(len).ok_or_else(|| {
            FormatError::invalid_data(format!("{} length overflows", what))
        })?;
        if end > self.bytes.len() {
            return Err(FormatError::eof(format!("Header1 truncated reading {}", what)));
        }
        let view = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(view)
    }

    /// Rejects a claimed element count that cannot fit in the remaining
    /// bytes even at `min_entry_bytes` per element.
    fn check_plausible(&self, count: usize, min_entry_bytes: usize, what: &str) -> Result<(), FormatError> {
        let remaining = self.bytes.len() - self.cursor;
        if count.saturating_mul(min_entry_bytes) > remaining {
            return Err(FormatError::invalid_data(format!(
                "{} claims {} entries but only {} bytes remain",
                what, count, remaining
            )));
        }
        Ok(())
    }
}
