// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Save Pipeline
//!
//! The fourteen ordered phases that turn a session into a container file:
//!
//! 1.  Validate the session (an empty save is invalid).
//! 2.  Manager pre-save hooks.
//! 3.  Build the runtime → file remap.
//! 4.  Serialize manager chunks.
//! 5.  Serialize object chunks with the remap applied.
//! 6.  Compress the Data section (under `COMPRESSED`).
//! 7.  Build object descriptors.
//! 8.  Build the plugin-dependency list.
//! 9.  Compress Header1 (same rule).
//! 10. Compute section sizes.
//! 11. Build the file header (CRC over header + packed sections).
//! 12. Open the staging file.
//! 13. Write header, Header1, Data, and included-file payloads; swap the
//!     staging file over the destination.
//! 14. Manager post-save hooks.
//!
//! Any failure after phase 12 drops the staging file; the destination is
//! never partially written.

use std::path::Path;

use nemofile_domain::entities::Session;
use nemofile_domain::file::header::compute_crc;
use nemofile_domain::file::{
    serialize_included_payloads, DataSection, FileHeaderBlock, Header1, IncludedFileIndexEntry, ObjectDescriptor,
};
use nemofile_domain::value_objects::file_info::CURRENT_FILE_VERSION;
use nemofile_domain::value_objects::WriteMode;
use nemofile_domain::{FormatError, IdRemap, ObjectId, SaveFlags, Severity, StateChunk};

use crate::application::context::Context;
use crate::infrastructure::services::StagedOutput;

/// Orchestrator for one save operation.
pub struct SavePipeline<'a> {
    context: &'a Context,
    flags: SaveFlags,
}

impl<'a> SavePipeline<'a> {
    pub fn new(context: &'a Context, flags: SaveFlags) -> Self {
        Self { context, flags }
    }

    /// Runs the full pipeline; returns the bytes written to `path`.
    pub fn run(&self, session: &mut Session, path: &Path) -> Result<u64, FormatError> {
        let logger = self.context.logger();

        // Phase 1: validate the session.
        if session.repository().is_empty() {
            return Err(FormatError::invalid_argument(
                "cannot save a session with no objects".to_string(),
            ));
        }
        session.file_info().validate()?;
        if self.flags.contains(SaveFlags::VALIDATE_BEFORE) {
            for object in session.repository().iter() {
                if let Some(chunk) = object.chunk() {
                    chunk
                        .validate()
                        .map_err(|e| FormatError::validation_failed(format!("object {}: {}", object.id(), e)))?;
                }
            }
        }

        // Phase 2: manager pre-save hooks.
        self.run_hooks(session, HookPoint::PreSave);

        // Phase 3: build the runtime → file remap.
        let (remap, file_ids, max_file_id) = self.assign_file_ids(session);
        logger.debug(&format!("save phase 3: {} file ids, max {}", file_ids.len(), max_file_id));

        // Phase 4: manager chunks (already runtime-space blobs).
        let managers = if self.flags.contains(SaveFlags::INCLUDE_MANAGERS) {
            session.manager_data().to_vec()
        } else {
            Vec::new()
        };

        // Phase 5: object chunks with the remap applied.
        let object_chunks = self.serialize_object_chunks(session, &remap)?;

        // Phase 6 (and 10): build + compress the Data section.
        let (data_bytes, position_hints) =
            DataSection::serialize(&managers, &object_chunks, self.context.config().parallel_chunks());
        let packed_data = self.pack_section(&data_bytes)?;

        // Phase 7: object descriptors.
        let descriptors = self.build_descriptors(session, &file_ids, &position_hints);

        // Phase 8: plugin dependencies from the registry.
        let plugin_dependencies = self.context.plugins().dependency_list();

        // Included-file index mirrors the session's entries.
        let included_files = (0..session.included_files().len())
            .filter_map(|i| session.included_file(i))
            .map(|(name, data)| IncludedFileIndexEntry {
                name: name.to_string(),
                size: data.len() as u32,
            })
            .collect();

        let header1 = Header1 {
            descriptors,
            plugin_dependencies,
            included_files,
        };
        let header1_bytes = header1.serialize();

        // Phase 9: compress Header1.
        let packed_header1 = self.pack_section(&header1_bytes)?;

        // Phases 10 + 11: sizes and the header itself.
        let mut info = session.file_info().clone();
        // The Data-section codec only writes the current record layout.
        if info.file_version < 7 {
            info.file_version = CURRENT_FILE_VERSION;
            session.stats_mut().warn(
                "save",
                Severity::Warning,
                format!("file version raised to {} for saving", CURRENT_FILE_VERSION),
            );
        }
        info.object_count = header1.descriptors.len() as u32;
        info.manager_count = managers.len() as u32;
        info.max_id_saved = max_file_id;
        if self.flags.contains(SaveFlags::COMPRESSED) {
            info.write_mode |= WriteMode::COMPRESS_HEADER | WriteMode::COMPRESS_DATA;
        }

        let mut header = FileHeaderBlock {
            crc: 0,
            hdr1_pack_size: packed_header1.len() as u32,
            hdr1_unpack_size: header1_bytes.len() as u32,
            data_pack_size: packed_data.len() as u32,
            data_unpack_size: data_bytes.len() as u32,
            info,
        };
        header.crc = compute_crc(&header, &packed_header1, &packed_data);

        // Phase 12: open the staging file.
        let mut output = StagedOutput::create(path)?;

        // Phase 13: write everything, then swap atomically.
        output.write_all(&header.serialize())?;
        output.write_all(&packed_header1)?;
        output.write_all(&packed_data)?;
        let payloads: Vec<(&str, &[u8])> = (0..session.included_files().len())
            .filter_map(|i| session.included_file(i))
            .collect();
        output.write_all(&serialize_included_payloads(&payloads))?;
        let written = output.commit(self.context.config().durable_save)?;

        // The session's file info now reflects what landed on disk.
        header.info.file_size = written;
        session.set_file_info(header.info.clone());

        // Phase 14: manager post-save hooks.
        self.run_hooks(session, HookPoint::PostSave);

        logger.info(&format!(
            "saved {} objects, {} managers, {} bytes to {}",
            header.info.object_count,
            header.info.manager_count,
            written,
            path.display()
        ));
        Ok(written)
    }

    /// Phase 3: sequential file IDs from 1 under `SEQUENTIAL_IDS`, else the
    /// runtime IDs carried over.
    ///
    /// Returns the remap, the file ID per object in repository order, and
    /// the highest file ID assigned.
    fn assign_file_ids(&self, session: &Session) -> (IdRemap, Vec<ObjectId>, u32) {
        let sequential = self.flags.contains(SaveFlags::SEQUENTIAL_IDS);
        let mut remap = IdRemap::new();
        let mut file_ids = Vec::with_capacity(session.repository().len());
        let mut max_file_id = 0u32;

        for (index, object) in session.repository().iter().enumerate() {
            let file_id = if sequential {
                ObjectId::new(index as u32 + 1)
            } else {
                object.id()
            };
            remap.insert(object.id(), file_id);
            max_file_id = max_file_id.max(file_id.raw());
            file_ids.push(file_id);
        }
        (remap, file_ids, max_file_id)
    }

    /// Phase 5: clone each object's chunk into file-ID space.
    ///
    /// Reference-only saves (`AS_OBJECTS`) and chunkless objects produce no
    /// payload. Citations to objects outside this save keep their raw value
    /// and are reported as warnings.
    fn serialize_object_chunks(
        &self,
        session: &mut Session,
        remap: &IdRemap,
    ) -> Result<Vec<Option<StateChunk>>, FormatError> {
        let reference_only = self.flags.contains(SaveFlags::AS_OBJECTS);
        let mut chunks = Vec::with_capacity(session.repository().len());
        let mut orphan_citations = 0usize;

        for object in session.repository().iter() {
            if reference_only {
                chunks.push(None);
                continue;
            }
            match object.chunk() {
                None => chunks.push(None),
                Some(chunk) => {
                    let mut clone = chunk.clone();
                    let outcome = clone
                        .remap_to_file(remap, false)
                        .map_err(|e| FormatError::validation_failed(format!("object {}: {}", object.id(), e)))?;
                    orphan_citations += outcome.unresolved.len();
                    chunks.push(Some(clone));
                }
            }
        }

        if orphan_citations > 0 {
            session.stats_mut().warn(
                "save",
                Severity::Warning,
                format!("{} citations point at objects outside this save", orphan_citations),
            );
        }
        Ok(chunks)
    }

    /// Phase 7: descriptors in repository order, with position hints from
    /// the Data-section serializer.
    fn build_descriptors(
        &self,
        session: &Session,
        file_ids: &[ObjectId],
        position_hints: &[u32],
    ) -> Vec<ObjectDescriptor> {
        let reference_only_save = self.flags.contains(SaveFlags::AS_OBJECTS);
        session
            .repository()
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let mut object_id = file_ids[index];
                if reference_only_save || object.chunk().is_none() {
                    object_id = object_id.as_reference_only();
                }
                ObjectDescriptor {
                    object_id,
                    class_id: object.class_id(),
                    flags: object.flags(),
                    position_hint: position_hints.get(index).copied().unwrap_or(0),
                    name: object.name().map(str::to_string),
                }
            })
            .collect()
    }

    fn pack_section(&self, bytes: &[u8]) -> Result<Vec<u8>, FormatError> {
        if !self.flags.contains(SaveFlags::COMPRESSED) {
            return Ok(bytes.to_vec());
        }
        let packed = self
            .context
            .compression()
            .compress(bytes, self.context.config().compression_level)?;
        // A section that refuses to shrink is stored raw; equal sizes are
        // the decoder's signal for that.
        if packed.len() >= bytes.len() {
            return Ok(bytes.to_vec());
        }
        Ok(packed)
    }

    fn run_hooks(&self, session: &mut Session, point: HookPoint) {
        let managers = self.context.managers().in_id_order();
        for manager in managers {
            let result = match point {
                HookPoint::PreSave => manager.on_pre_save(session),
                HookPoint::PostSave => manager.on_post_save(session),
            };
            if let Err(error) = result {
                session.stats_mut().manager_hook_errors += 1;
                session.stats_mut().warn(
                    "manager",
                    Severity::Warning,
                    format!("{} {:?} hook: {}", manager.name(), point, error),
                );
                self.context
                    .logger()
                    .warn(&format!("manager {} {:?} hook failed: {}", manager.name(), point, error));
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum HookPoint {
    PreSave,
    PostSave,
}
