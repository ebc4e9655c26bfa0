// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File-Layer Integration Tests
//!
//! Exercises the header / Header1 / Data-section layering through real
//! saved files: signature and CRC validation, the raw-versus-deflated
//! section signal, and envelope bit-exactness across a full write.

use nemofile_domain::chunk::version1::{parse_version1, serialize_version1};
use nemofile_domain::file::{FileHeaderBlock, HEADER_BYTES};
use nemofile_domain::{FormatError, LoadFlags, SaveFlags};

use crate::common::{payload_chunk, quiet_context, session_with_objects};

#[test]
fn test_version1_envelope_is_stable_across_reserialization() {
    let chunk = payload_chunk(42);
    let first = serialize_version1(&chunk);
    let (parsed, _) = parse_version1(&first).unwrap();
    // Cache path: byte-for-byte.
    assert_eq!(serialize_version1(&parsed), first);
}

#[test]
fn test_uncompressed_save_stores_sections_raw() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(3);

    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let (header, _) = FileHeaderBlock::parse(&bytes).unwrap();
    // Equal sizes are the decoder's raw-section signal.
    assert_eq!(header.hdr1_pack_size, header.hdr1_unpack_size);
    assert_eq!(header.data_pack_size, header.data_unpack_size);
}

#[test]
fn test_compressed_save_shrinks_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packed.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(20);

    context.save_file(&mut session, &path, SaveFlags::COMPRESSED).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let (header, _) = FileHeaderBlock::parse(&bytes).unwrap();
    assert!(header.data_pack_size < header.data_unpack_size);

    // And the compressed file still loads.
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.repository().len(), 20);
}

#[test]
fn test_crc_detects_tampering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tamper.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(3);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    // Flip one payload byte past the header.
    let target = HEADER_BYTES + 40;
    bytes[target] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let result = context.load_file(&path, LoadFlags::default());
    assert!(matches!(result, Err(FormatError::ValidationFailed(_))));
}

#[test]
fn test_not_a_container_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.nmo");
    std::fs::write(&path, b"definitely not a Nemo container, long enough to pass length checks").unwrap();

    let result = quiet_context().load_file(&path, LoadFlags::default());
    assert!(matches!(result, Err(FormatError::InvalidData(_))));
}

#[test]
fn test_truncated_container_is_eof() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(3);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..HEADER_BYTES + 10]).unwrap();

    let result = context.load_file(&path, LoadFlags::default());
    assert!(matches!(result, Err(FormatError::Eof(_))));
}

#[test]
fn test_missing_file_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = quiet_context().load_file(&dir.path().join("absent.nmo"), LoadFlags::default());
    assert!(matches!(result, Err(FormatError::FileNotFound(_))));
}
