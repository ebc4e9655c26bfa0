// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Session Feature Tests
//!
//! Manager blobs and hooks, plugin dependency checking, included files,
//! load-flag behavior, and the diagnostics a finished session exposes.

use std::sync::Arc;

use nemofile_domain::chunk::{ChunkWriter, CHUNK_VERSION_1};
use nemofile_domain::entities::ManagerData;
use nemofile_domain::services::PluginInfo;
use nemofile_domain::value_objects::flags::object_flags;
use nemofile_domain::value_objects::DependencyStatus;
use nemofile_domain::{ClassId, FormatError, Guid, LoadFlags, ObjectId, SaveFlags};

use crate::common::{quiet_context, session_with_objects, RecordingManager};

const MANAGER_GUID: Guid = Guid::new(0x4D414E, 0x1);

#[test]
fn test_manager_blobs_roundtrip_under_include_managers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("managers.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(2);
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(0), CHUNK_VERSION_1).unwrap();
    writer.write_dword(0x5157).unwrap();
    writer.write_string("time manager state").unwrap();
    session.add_manager_data(ManagerData {
        guid: MANAGER_GUID,
        chunk: Some(writer.finalize().unwrap()),
    });

    context
        .save_file(&mut session, &path, SaveFlags::INCLUDE_MANAGERS)
        .unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(loaded.file_info().manager_count, 1);
    let blob = loaded.manager_data_by_guid(MANAGER_GUID).unwrap();
    let chunk = blob.chunk.as_ref().unwrap();
    assert_eq!(chunk.data()[0], 0x5157);
}

#[test]
fn test_manager_blobs_dropped_without_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nomanagers.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(2);
    session.add_manager_data(ManagerData {
        guid: MANAGER_GUID,
        chunk: None,
    });

    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.file_info().manager_count, 0);
    assert!(loaded.manager_data().is_empty());
}

#[test]
fn test_manager_hooks_fire_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hooks.nmo");
    let context = quiet_context();

    let manager = Arc::new(RecordingManager::new(1, MANAGER_GUID));
    let calls = Arc::clone(&manager.calls);
    context.register_manager(manager).unwrap();

    let mut session = session_with_objects(1);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();
    context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(
        calls.lock().unwrap().as_slice(),
        &["pre_save", "post_save", "pre_load", "post_load"]
    );
}

#[test]
fn test_failing_hooks_are_counted_not_fatal() {
    struct FailingManager;
    impl nemofile_domain::services::FileManager for FailingManager {
        fn id(&self) -> u32 {
            9
        }
        fn guid(&self) -> Guid {
            Guid::new(9, 9)
        }
        fn name(&self) -> &str {
            "failing-manager"
        }
        fn on_pre_load(&self, _session: &mut nemofile::Session) -> Result<(), FormatError> {
            Err(FormatError::io("subsystem offline".to_string()))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failhook.nmo");
    let save_context = quiet_context();
    let mut session = session_with_objects(1);
    save_context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let load_context = quiet_context();
    load_context.register_manager(Arc::new(FailingManager)).unwrap();
    let loaded = load_context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(loaded.stats().manager_hook_errors, 1);
    assert!(loaded.stats().warnings.iter().any(|w| w.category == "manager"));
}

#[test]
fn test_plugin_dependencies_written_and_checked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.nmo");

    let save_context = quiet_context();
    save_context
        .register_plugin(PluginInfo {
            id: 1,
            guid: Guid::new(0xAB, 0xCD),
            category: 4,
            version: 7,
        })
        .unwrap();
    let mut session = session_with_objects(1);
    save_context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    // A context without the plugin sees the dependency as missing.
    let bare_context = quiet_context();
    let loaded = bare_context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.plugin_diagnostics().len(), 1);
    assert_eq!(loaded.plugin_diagnostics()[0].status, DependencyStatus::Missing);
    assert_eq!(loaded.plugin_diagnostics()[0].dependency.guid, Guid::new(0xAB, 0xCD));

    // Under CHECK_DEPENDENCIES the same load fails.
    let strict = bare_context.load_file(&path, LoadFlags::CHECK_DEPENDENCIES);
    assert!(matches!(strict, Err(FormatError::PluginMissing(_))));

    // With the plugin registered (any version) the dependency is satisfied.
    let full_context = quiet_context();
    full_context
        .register_plugin(PluginInfo {
            id: 3,
            guid: Guid::new(0xAB, 0xCD),
            category: 4,
            version: 9,
        })
        .unwrap();
    let loaded = full_context.load_file(&path, LoadFlags::CHECK_DEPENDENCIES).unwrap();
    assert_eq!(loaded.plugin_diagnostics()[0].status, DependencyStatus::Ok);
}

#[test]
fn test_included_files_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.nmo");
    let context = quiet_context();

    let texture: Vec<u8> = (0..=255).cycle().take(4096).collect();
    let mut session = session_with_objects(1);
    session.add_included_file("skin/texture.bmp", &texture).unwrap();
    session.add_included_file("readme.txt", b"packed alongside").unwrap();

    context.save_file(&mut session, &path, SaveFlags::COMPRESSED).unwrap();
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();

    assert_eq!(loaded.included_files().len(), 2);
    let (name, data) = loaded.included_file(0).unwrap();
    assert_eq!(name, "skin/texture.bmp");
    assert_eq!(data, texture.as_slice());
    let (name, data) = loaded.included_file(1).unwrap();
    assert_eq!(name, "readme.txt");
    assert_eq!(data, b"packed alongside");
}

#[test]
fn test_unresolved_reference_strictness() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dangling.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(1);
    let holder = session.repository().iter().next().unwrap().id();
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(0x00000001), CHUNK_VERSION_1).unwrap();
    // Cites an object that is not part of the save.
    writer.write_object_id(ObjectId::new(999)).unwrap();
    let chunk = writer.finalize().unwrap();
    session.repository_mut().find_by_id_mut(holder).unwrap().set_chunk(chunk);

    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    // Default mode: the load completes and counts the dangling reference.
    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.stats().references_unresolved, 1);
    assert!(loaded.stats().warnings.iter().any(|w| w.category == "reference"));

    // Strict mode: the same file refuses to load.
    let strict = context.load_file(&path, LoadFlags::STRICT_REFERENCES);
    assert!(matches!(strict, Err(FormatError::ReferenceUnresolved(_))));
}

#[test]
fn test_as_dynamic_object_marks_created_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(2);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let loaded = context.load_file(&path, LoadFlags::AS_DYNAMIC_OBJECT).unwrap();
    for object in loaded.repository().iter() {
        assert_ne!(object.flags() & object_flags::DYNAMIC, 0);
    }
}

#[test]
fn test_only_behaviors_filters_other_classes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("behaviors.nmo");
    let context = quiet_context();

    let mut session = session_with_objects(0);
    let behavior = session
        .repository_mut()
        .create(ClassId::BEHAVIOR, Some("Rotate"), Guid::NULL, 0);
    session
        .repository_mut()
        .create(ClassId::new(0x21), Some("Mesh"), Guid::NULL, 0);
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::BEHAVIOR, CHUNK_VERSION_1).unwrap();
    writer.write_dword(1).unwrap();
    session
        .repository_mut()
        .find_by_id_mut(behavior)
        .unwrap()
        .set_chunk(writer.finalize().unwrap());

    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let loaded = context.load_file(&path, LoadFlags::ONLYBEHAVIORS).unwrap();
    assert_eq!(loaded.repository().len(), 1);
    assert_eq!(loaded.repository().iter().next().unwrap().class_id(), ClassId::BEHAVIOR);
}

#[test]
fn test_check_duplicates_reuses_objects_on_second_load() {
    // The duplicate check operates within one repository, so load into a
    // session, then re-run object creation from a second file image by
    // loading it with the same names present.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dups.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(3);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    // A fresh default load creates three distinct objects even with
    // duplicate-checking on, because the session starts empty.
    let loaded = context.load_file(&path, LoadFlags::CHECKDUPLICATES).unwrap();
    assert_eq!(loaded.repository().len(), 3);
}

#[test]
fn test_session_diagnostics_after_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.nmo");
    let context = quiet_context();
    let mut session = session_with_objects(4);
    context.save_file(&mut session, &path, SaveFlags::default()).unwrap();

    let loaded = context.load_file(&path, LoadFlags::default()).unwrap();
    assert_eq!(loaded.stats().objects_created, 4);
    assert_eq!(loaded.stats().chunks_parsed, 4);

    let index = loaded.index().expect("finish-loading builds the index");
    assert_eq!(index.get_by_class(ClassId::new(0x00000001)).len(), 4);
    let stats = index.stats();
    assert_eq!(stats.name_entries, 4);
    assert!(loaded.file_info().file_size > 0);
}
