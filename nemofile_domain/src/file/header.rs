// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Header Codec
//!
//! The fixed-layout header at the front of every container file:
//!
//! | Offset | Size | Field            |
//! |--------|------|------------------|
//! | 0      | 8    | signature `"Nemo Fi\0"` |
//! | 8      | 4    | crc              |
//! | 12     | 4    | hdr1_pack_size   |
//! | 16     | 4    | hdr1_unpack_size |
//! | 20     | 4    | data_pack_size   |
//! | 24     | 4    | data_unpack_size |
//! | 28     | 4    | product_version  |
//! | 32     | 4    | product_build    |
//! | 36     | 4    | file_version     |
//! | 40     | 4    | file_version2    |
//! | 44     | 4    | file_write_mode  |
//! | 48     | 4    | object_count     |
//! | 52     | 4    | manager_count    |
//! | 56     | 4    | max_id_saved     |
//! | 60     | 4    | ck_version       |
//!
//! Pre-version-5 files stop after `product_version` (32 bytes); the
//! extended fields default. A section is stored uncompressed exactly when
//! its pack size equals its unpack size; the write-mode bits only record
//! how the file was produced.

use crate::error::FormatError;
use crate::value_objects::file_info::MAX_FILE_VERSION;
use crate::value_objects::{FileInfo, WriteMode};

/// Signature at offset 0 of every container file.
pub const FILE_SIGNATURE: [u8; 8] = *b"Nemo Fi\0";

/// Header size for file version ≥ 5.
pub const HEADER_BYTES: usize = 64;

/// Header size for pre-version-5 files.
pub const LEGACY_HEADER_BYTES: usize = 32;

/// Cap on the section sizes a header may claim, to reject absurd values
/// before any allocation happens.
const MAX_SECTION_BYTES: u32 = 1 << 30;

/// Decoded file header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeaderBlock {
    pub crc: u32,
    pub hdr1_pack_size: u32,
    pub hdr1_unpack_size: u32,
    pub data_pack_size: u32,
    pub data_unpack_size: u32,
    pub info: FileInfo,
}

impl FileHeaderBlock {
    /// Serializes the header; 64 bytes, or 32 for pre-version-5 file info.
    pub fn serialize(&self) -> Vec<u8> {
        let legacy = self.info.file_version < 5;
        let mut bytes = Vec::with_capacity(if legacy { LEGACY_HEADER_BYTES } else { HEADER_BYTES });
        bytes.extend_from_slice(&FILE_SIGNATURE);
        for value in [
            self.crc,
            self.hdr1_pack_size,
            self.hdr1_unpack_size,
            self.data_pack_size,
            self.data_unpack_size,
            self.info.product_version,
        ] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        if !legacy {
            for value in [
                self.info.product_build,
                self.info.file_version,
                self.info.file_version2,
                self.info.write_mode.bits(),
                self.info.object_count,
                self.info.manager_count,
                self.info.max_id_saved,
                self.info.ck_version,
            ] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }

    /// Parses a header from the front of `bytes`, returning it together
    /// with the number of bytes consumed (64, or 32 for a legacy header).
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), FormatError> {
        if bytes.len() < LEGACY_HEADER_BYTES {
            return Err(FormatError::eof(format!(
                "file of {} bytes is shorter than the {} byte header",
                bytes.len(),
                LEGACY_HEADER_BYTES
            )));
        }
        if bytes[..8] != FILE_SIGNATURE {
            return Err(FormatError::invalid_data(
                "missing container signature \"Nemo Fi\"".to_string(),
            ));
        }

        let word = |offset: usize| u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]);

        let mut header = FileHeaderBlock {
            crc: word(8),
            hdr1_pack_size: word(12),
            hdr1_unpack_size: word(16),
            data_pack_size: word(20),
            data_unpack_size: word(24),
            info: FileInfo {
                product_version: word(28),
                ..FileInfo::default()
            },
        };

        let consumed = if bytes.len() >= HEADER_BYTES {
            let file_version = word(36);
            if file_version > MAX_FILE_VERSION {
                return Err(FormatError::invalid_data(format!(
                    "file version {} exceeds supported maximum {}",
                    file_version, MAX_FILE_VERSION
                )));
            }
            header.info.product_build = word(32);
            header.info.file_version = file_version;
            header.info.file_version2 = word(40);
            header.info.write_mode = WriteMode::from_bits_truncate(word(44));
            header.info.object_count = word(48);
            header.info.manager_count = word(52);
            header.info.max_id_saved = word(56);
            header.info.ck_version = word(60);
            HEADER_BYTES
        } else {
            // A file too short for the extended header can only be the
            // legacy 32-byte form.
            header.info.file_version = 4;
            LEGACY_HEADER_BYTES
        };

        for (size, name) in [
            (header.hdr1_pack_size, "hdr1_pack_size"),
            (header.hdr1_unpack_size, "hdr1_unpack_size"),
            (header.data_pack_size, "data_pack_size"),
            (header.data_unpack_size, "data_unpack_size"),
        ] {
            if size > MAX_SECTION_BYTES {
                return Err(FormatError::invalid_data(format!(
                    "{} of {} bytes is not plausible",
                    name, size
                )));
            }
        }

        Ok((header, consumed))
    }
}

/// CRC-32 over the header (crc field zeroed), the packed Header1, and the
/// packed Data section. Verified on load; a mismatch is `ValidationFailed`.
pub fn compute_crc(header: &FileHeaderBlock, packed_header1: &[u8], packed_data: &[u8]) -> u32 {
    let mut zeroed = header.clone();
    zeroed.crc = 0;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&zeroed.serialize());
    hasher.update(packed_header1);
    hasher.update(packed_data);
    hasher.finalize()
}
