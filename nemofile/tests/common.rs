// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared fixtures for integration and end-to-end tests.

use std::sync::{Arc, Mutex};

use nemofile::{Context, SessionConfig};
use nemofile_domain::chunk::{ChunkWriter, CHUNK_VERSION_1};
use nemofile_domain::entities::Session;
use nemofile_domain::services::FileManager;
use nemofile_domain::value_objects::file_info::CURRENT_FILE_VERSION;
use nemofile_domain::value_objects::WriteMode;
use nemofile_domain::{ClassId, FileInfo, FormatError, Guid, StateChunk};

/// A quiet context so test output stays readable.
pub fn quiet_context() -> Context {
    Context::with_config_and_logger(SessionConfig::default(), Arc::new(nemofile::NoOpLogger::new()))
}

/// Builds a payload chunk with no citations, deterministic per seed.
pub fn payload_chunk(seed: u32) -> StateChunk {
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(0x00000001), CHUNK_VERSION_1).unwrap();
    writer.set_data_version(1);
    writer.write_dword(seed).unwrap();
    writer.write_int(-(seed as i32)).unwrap();
    writer.write_string(&format!("payload for object {}", seed)).unwrap();
    writer.finalize().unwrap()
}

/// Session with `count` chunk-bearing objects named `Object_0..`, with the
/// file info the pipeline round-trip scenarios use.
pub fn session_with_objects(count: u32) -> Session {
    let mut session = Session::new();
    for index in 0..count {
        let id = session.repository_mut().create(
            ClassId::new(0x00000001),
            Some(&format!("Object_{}", index)),
            Guid::NULL,
            0,
        );
        let chunk = payload_chunk(index + 1);
        session.repository_mut().find_by_id_mut(id).unwrap().set_chunk(chunk);
    }
    session.set_file_info(FileInfo {
        file_version: CURRENT_FILE_VERSION,
        ck_version: 0x13022002,
        write_mode: WriteMode::COMPRESS_HEADER,
        ..FileInfo::default()
    });
    session
}

/// Manager that records which hooks ran, in order.
pub struct RecordingManager {
    id: u32,
    guid: Guid,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingManager {
    pub fn new(id: u32, guid: Guid) -> Self {
        Self {
            id,
            guid,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FileManager for RecordingManager {
    fn id(&self) -> u32 {
        self.id
    }

    fn guid(&self) -> Guid {
        self.guid
    }

    fn name(&self) -> &str {
        "recording-manager"
    }

    fn on_pre_load(&self, _session: &mut Session) -> Result<(), FormatError> {
        self.calls.lock().unwrap().push("pre_load");
        Ok(())
    }

    fn on_post_load(&self, _session: &mut Session) -> Result<(), FormatError> {
        self.calls.lock().unwrap().push("post_load");
        Ok(())
    }

    fn on_pre_save(&self, _session: &mut Session) -> Result<(), FormatError> {
        self.calls.lock().unwrap().push("pre_save");
        Ok(())
    }

    fn on_post_save(&self, _session: &mut Session) -> Result<(), FormatError> {
        self.calls.lock().unwrap().push("post_save");
        Ok(())
    }
}
