// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Pipeline Round-Trips
//!
//! Full save → load cycles through real files: object and chunk equality,
//! reference-only handling, citation remapping across the two ID spaces,
//! and the failure contracts of the save pipeline.

use nemofile_domain::chunk::version1::serialize_version1;
use nemofile_domain::chunk::{ChunkParser, ChunkWriter, CHUNK_VERSION_1};
use nemofile_domain::value_objects::file_info::CURRENT_FILE_VERSION;
use nemofile_domain::{ClassId, FormatError, Guid, LoadFlags, ObjectId, SaveFlags};

use crate::common::{quiet_context, session_with_objects};

/// Saving a session with zero objects is invalid and creates no file.
#[test]
fn test_save_empty_session_fails_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.nmo");
    let context = quiet_context();
    let mut session = context.create_session();

    let result = context.save_file(&mut session, &path, SaveFlags::default());
    assert!(matches!(result, Err(FormatError::InvalidArgument(_))));
    assert!(!path.exists());
}

/// The five-object scenario: identical counts, classes, and chunk bytes
/// after a full save → load cycle.
#[test]
fn test_five_object_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("five.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(5);
    let saved_chunks: Vec<Vec<u8>> = session
        .repository()
        .iter()
        .map(|object| serialize_version1(object.chunk().unwrap()))
        .collect();

    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(loaded.repository().len(), 5);
    assert_eq!(loaded.file_info().object_count, 5);
    assert_eq!(loaded.file_info().manager_count, 0);
    assert_eq!(loaded.file_info().file_version, CURRENT_FILE_VERSION);
    assert_eq!(loaded.file_info().ck_version, 0x13022002);

    for (index, object) in loaded.repository().iter().enumerate() {
        assert_eq!(object.class_id(), ClassId::new(0x00000001));
        assert_eq!(object.name(), Some(format!("Object_{}", index).as_str()));
        let reloaded_bytes = serialize_version1(object.chunk().unwrap());
        assert_eq!(reloaded_bytes, saved_chunks[index], "object {} chunk bytes", index);
        // The envelope is the 20-byte header plus the payload.
        assert_eq!(object.chunk().unwrap().raw_size(), saved_chunks[index].len() - 20);
    }
}

/// Loading from an in-memory image matches loading from the file.
#[test]
fn test_load_from_bytes_matches_file_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mem.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(4);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let from_file = context.load_file(&path, LoadFlags::default()).unwrap();
    let from_bytes = context.load_from_bytes(&bytes, LoadFlags::default()).unwrap();

    assert_eq!(from_file.repository().len(), from_bytes.repository().len());
    for (a, b) in from_file.repository().iter().zip(from_bytes.repository().iter()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.chunk().unwrap().data(), b.chunk().unwrap().data());
    }
}

/// Citations survive the runtime → file → runtime translation even when
/// the two ID spaces diverge.
#[test]
fn test_citation_remap_across_id_spaces() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remap.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(0);
    let holder = session
        .repository_mut()
        .create(ClassId::new(0x21), Some("Holder"), Guid::NULL, 0);
    let doomed = session
        .repository_mut()
        .create(ClassId::new(0x22), Some("Doomed"), Guid::NULL, 0);
    let target = session
        .repository_mut()
        .create(ClassId::new(0x23), Some("Target"), Guid::NULL, 0);

    // Removing the middle object makes runtime IDs (1, 3) diverge from the
    // sequential file IDs (1, 2).
    session.repository_mut().remove(doomed).unwrap();

    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(0x21), CHUNK_VERSION_1).unwrap();
    writer.write_object_id(target).unwrap();
    writer.write_string("cites the target").unwrap();
    let chunk = writer.finalize().unwrap();
    session.repository_mut().find_by_id_mut(holder).unwrap().set_chunk(chunk);

    // Give the target a payload so it is not written reference-only.
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(0x23), CHUNK_VERSION_1).unwrap();
    writer.write_dword(7).unwrap();
    session
        .repository_mut()
        .find_by_id_mut(target)
        .unwrap()
        .set_chunk(writer.finalize().unwrap());

    context
        .save_file(&mut session, &path, SaveFlags::SEQUENTIAL_IDS)
        .unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();

    let loaded_target = loaded.repository().find_by_name("Target", None).unwrap();
    let loaded_holder = loaded.repository().find_by_name("Holder", None).unwrap();

    // The citation DWORD now holds the target's new runtime ID.
    let mut parser = ChunkParser::new(loaded_holder.chunk().unwrap());
    assert_eq!(parser.read_object_id().unwrap(), loaded_target.id());
    assert_eq!(parser.read_string().unwrap(), "cites the target");
    assert_eq!(loaded.stats().references_unresolved, 0);
    assert!(loaded.stats().citations_remapped >= 1);
}

/// `AS_OBJECTS` writes reference-only descriptors and no payloads.
#[test]
fn test_reference_only_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refs.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(3);

    context.save_file(&mut session, &path, SaveFlags::AS_OBJECTS).unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(loaded.repository().len(), 3);
    for object in loaded.repository().iter() {
        assert!(object.chunk().is_none());
        assert!(object.name().is_some());
    }
}

/// A failed save leaves the old destination intact and no staging residue.
#[test]
fn test_failed_save_is_transactional() {
    struct BrokenCompression;
    impl nemofile_domain::services::CompressionService for BrokenCompression {
        fn compress(&self, _data: &[u8], _level: u32) -> Result<Vec<u8>, FormatError> {
            Err(FormatError::io("backend unavailable".to_string()))
        }
        fn decompress(&self, _data: &[u8], _expected_size: usize) -> Result<Vec<u8>, FormatError> {
            Err(FormatError::io("backend unavailable".to_string()))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("precious.nmo");
    std::fs::write(&path, b"previous contents").unwrap();

    let context = nemofile::Context::with_config_and_logger(
        nemofile::SessionConfig::default(),
        std::sync::Arc::new(nemofile::NoOpLogger::new()),
    )
    .with_compression(std::sync::Arc::new(BrokenCompression));

    let mut session = session_with_objects(2);
    let result = context.save_file(&mut session, &path, SaveFlags::COMPRESSED);
    assert!(result.is_err());

    // Destination untouched, no staging files left behind.
    assert_eq!(std::fs::read(&path).unwrap(), b"previous contents");
    let residue: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains("staging"))
        .collect();
    assert!(residue.is_empty());
}

/// Saving over an existing container replaces it atomically.
#[test]
fn test_save_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nmo");
    let context = quiet_context();

    let mut first = session_with_objects(2);
    context.save_file(&mut first, &path, SaveFlags::default()).unwrap();

    let mut second = session_with_objects(6);
    context.save_file(&mut second, &path, SaveFlags::default()).unwrap();

    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.repository().len(), 6);
}

/// `file_size` and `max_id_saved` reflect what landed on disk.
#[test]
fn test_file_info_updated_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("info.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(5);

    let written = context
        .save_file(&mut session, &path, SaveFlags::SEQUENTIAL_IDS)
        .unwrap();

    assert_eq!(session.file_info().file_size, written);
    assert_eq!(session.file_info().object_count, 5);
    assert_eq!(session.file_info().max_id_saved, 5);
    assert_eq!(written, std::fs::metadata(&path).unwrap().len());
}
