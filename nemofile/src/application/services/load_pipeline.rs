// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Load Pipeline
//!
//! The fifteen ordered phases that turn container bytes into a live
//! session:
//!
//! 1.  Open the input (memory map or buffered read).
//! 2.  Parse and validate the file header.
//! 3.  Read and inflate Header1.
//! 4.  Parse Header1 into descriptors, plugin deps, included-file index.
//! 5.  Start the session and record file info.
//! 6.  Check plugin dependencies against the registry.
//! 7.  Manager pre-load hooks.
//! 8.  Read and inflate the Data section.
//! 9.  Parse manager blobs.
//! 10. Create object skeletons from the descriptors.
//! 11. Parse object chunks (VERSION1, raw bytes retained).
//! 12. Build the file → runtime remap.
//! 13. Rewrite citations in every chunk through the remap.
//! 14. Attach chunks and finish loading: index build, residual reference
//!     resolution, statistics.
//! 15. Manager post-load hooks (inside finish-loading).
//!
//! Phases 1-4 are fatal on error; phase 6 is fatal only under
//! `CHECK_DEPENDENCIES`; hook errors and unresolved references accumulate
//! as warnings unless `STRICT_REFERENCES` is set.
//!
//! A section is stored raw exactly when its pack size equals its unpack
//! size; otherwise it inflates through the context's compression backend.

use std::path::Path;

use nemofile_domain::entities::{PluginDiagnostic, Session};
use nemofile_domain::file::{parse_included_payloads, DataSection, FileHeaderBlock, Header1};
use nemofile_domain::file::header::compute_crc;
use nemofile_domain::services::{ReferenceResolver, ResolutionStrategy};
use nemofile_domain::value_objects::flags::object_flags;
use nemofile_domain::value_objects::DependencyStatus;
use nemofile_domain::{ClassId, FormatError, Guid, IdRemap, LoadFlags, ObjectId, Severity};

use crate::application::context::Context;
use crate::infrastructure::services::read_container_bytes;

/// Orchestrator for one load operation.
pub struct LoadPipeline<'a> {
    context: &'a Context,
    flags: LoadFlags,
}

impl<'a> LoadPipeline<'a> {
    pub fn new(context: &'a Context, flags: LoadFlags) -> Self {
        Self { context, flags }
    }

    /// Runs the full pipeline against a file on disk.
    pub fn run(&self, path: &Path) -> Result<Session, FormatError> {
        // Phase 1: open IO.
        self.context
            .logger()
            .debug(&format!("load phase 1: opening {}", path.display()));
        let input = read_container_bytes(path)?;

        let mut session = self.run_bytes(input.bytes())?;
        session.file_info_mut().file_size = input.len() as u64;
        Ok(session)
    }

    /// Runs phases 2-15 against an in-memory container image.
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<Session, FormatError> {
        let logger = self.context.logger();

        // Phase 2: parse the file header.
        let (header, header_len) = FileHeaderBlock::parse(bytes)?;
        header.info.validate()?;
        logger.debug(&format!(
            "load phase 2: file version {}, {} objects, {} managers",
            header.info.file_version, header.info.object_count, header.info.manager_count
        ));

        let hdr1_end = header_len + header.hdr1_pack_size as usize;
        let data_end = hdr1_end + header.data_pack_size as usize;
        if bytes.len() < data_end {
            return Err(FormatError::eof(format!(
                "file of {} bytes cannot hold the {} bytes of sections the header declares",
                bytes.len(),
                data_end
            )));
        }
        let packed_header1 = &bytes[header_len..hdr1_end];
        let packed_data = &bytes[hdr1_end..data_end];

        let crc = compute_crc(&header, packed_header1, packed_data);
        if crc != header.crc {
            return Err(FormatError::validation_failed(format!(
                "file CRC {:#010x} does not match computed {:#010x}",
                header.crc, crc
            )));
        }

        // Phase 3: inflate Header1. Equal sizes signal a raw section.
        let header1_bytes = self.open_section(packed_header1, header.hdr1_unpack_size, "Header1")?;

        // Phase 4: parse Header1.
        let header1 = Header1::parse(&header1_bytes, header.info.object_count)?;
        logger.debug(&format!(
            "load phase 4: {} descriptors, {} plugin deps, {} included files",
            header1.descriptors.len(),
            header1.plugin_dependencies.len(),
            header1.included_files.len()
        ));

        // Phase 5: start the load session.
        let mut session = self.context.create_session();
        session.set_file_info(header.info.clone());

        // Phase 6: check plugin dependencies.
        self.check_dependencies(&mut session, &header1)?;

        // Phase 7: manager pre-load hooks (non-fatal).
        self.run_hooks(&mut session, HookPoint::PreLoad);

        // Phase 8: inflate the Data section.
        let data_bytes = self.open_section(packed_data, header.data_unpack_size, "Data section")?;

        // Phases 9 and 11: decode manager blobs and object chunks.
        let parsed = DataSection::parse(
            &data_bytes,
            header.info.file_version,
            header.info.manager_count,
            header.info.object_count,
            self.context.config().parallel_chunks(),
        )?;
        session.stats_mut().chunks_parsed =
            parsed.object_chunks.iter().filter(|c| c.is_some()).count() + parsed.managers.len();
        session.set_manager_data(parsed.managers);

        // Phase 10: create object skeletons; phase 12: build the remap.
        let (remap, created) = self.create_objects(&mut session, &header1, &parsed.inline_object_ids)?;
        session.stats_mut().objects_created = created.iter().filter(|id| id.is_some()).count();
        logger.debug(&format!(
            "load phase 10: {} objects created, {} remap entries",
            session.stats().objects_created,
            remap.len()
        ));

        // Phase 13: rewrite citations through the remap; phase 14: attach.
        let mut resolver = ReferenceResolver::new();
        self.remap_and_attach(&mut session, &remap, created, parsed.object_chunks, &mut resolver)?;

        // Phase 14 continued: finish loading (phase 15 hooks inside).
        self.finish_loading(&mut session, &remap, &mut resolver)?;

        // Included-file payloads sit at the file tail.
        self.load_included_files(&mut session, &header1, &bytes[data_end..])?;

        logger.info(&format!(
            "loaded {} objects, {} managers, {} warnings",
            session.repository().len(),
            session.manager_data().len(),
            session.stats().warnings.len()
        ));
        Ok(session)
    }

    /// Inflates a section, or copies it when the sizes say it is raw.
    fn open_section(&self, packed: &[u8], unpack_size: u32, what: &str) -> Result<Vec<u8>, FormatError> {
        if packed.len() == unpack_size as usize {
            return Ok(packed.to_vec());
        }
        self.context
            .compression()
            .decompress(packed, unpack_size as usize)
            .map_err(|e| FormatError::invalid_data(format!("{}: {}", what, e)))
    }

    /// Phase 6: record a diagnostic per dependency; missing deps fail the
    /// load only under `CHECK_DEPENDENCIES`.
    fn check_dependencies(&self, session: &mut Session, header1: &Header1) -> Result<(), FormatError> {
        let mut missing = 0usize;
        {
            let plugins = self.context.plugins();
            for dependency in &header1.plugin_dependencies {
                let status = match plugins.find_by_guid(dependency.guid) {
                    None => DependencyStatus::Missing,
                    Some(info) if info.category != dependency.category => DependencyStatus::CategoryMismatch,
                    Some(_) => DependencyStatus::Ok,
                };
                if status == DependencyStatus::Missing {
                    missing += 1;
                }
                if !status.is_satisfied() {
                    session.stats_mut().warn(
                        "plugin",
                        Severity::Warning,
                        format!("dependency {} ({:?})", dependency.guid, status),
                    );
                }
                session.add_plugin_diagnostic(PluginDiagnostic {
                    dependency: *dependency,
                    status,
                });
            }
        }

        if missing > 0 && self.flags.contains(LoadFlags::CHECK_DEPENDENCIES) {
            return Err(FormatError::plugin_missing(format!(
                "{} of {} plugin dependencies are unregistered",
                missing,
                header1.plugin_dependencies.len()
            )));
        }
        Ok(())
    }

    /// Phase 10 + 12: create skeletons and the file → runtime table.
    ///
    /// Returns the remap and, per descriptor, the runtime ID created (or
    /// `None` for descriptors filtered out).
    fn create_objects(
        &self,
        session: &mut Session,
        header1: &Header1,
        inline_ids: &[ObjectId],
    ) -> Result<(IdRemap, Vec<Option<ObjectId>>), FormatError> {
        let behaviors_only = self.flags.contains(LoadFlags::ONLYBEHAVIORS);
        let check_duplicates = self.flags.contains(LoadFlags::CHECKDUPLICATES);
        let dynamic = self.flags.contains(LoadFlags::AS_DYNAMIC_OBJECT);

        let mut remap = IdRemap::new();
        let mut created = Vec::with_capacity(header1.descriptors.len());

        for (index, descriptor) in header1.descriptors.iter().enumerate() {
            // Pre-version-7 files carry the authoritative IDs inline in the
            // Data section.
            let file_id = inline_ids
                .get(index)
                .copied()
                .unwrap_or(descriptor.object_id)
                .without_flags();

            if behaviors_only && !self.derives_from_behavior(descriptor.class_id) {
                created.push(None);
                continue;
            }

            let existing = if check_duplicates {
                descriptor
                    .name
                    .as_deref()
                    .and_then(|name| session.repository().find_by_name(name, Some(descriptor.class_id)))
                    .map(|object| object.id())
            } else {
                None
            };

            let runtime_id = match existing {
                Some(id) => id,
                None => {
                    let mut flags = descriptor.flags;
                    if dynamic {
                        flags |= object_flags::DYNAMIC;
                    }
                    session
                        .repository_mut()
                        .create(descriptor.class_id, descriptor.name.as_deref(), Guid::NULL, flags)
                }
            };

            if !file_id.is_none() {
                remap.insert(runtime_id, file_id);
            }
            created.push(Some(runtime_id));
        }

        Ok((remap, created))
    }

    fn derives_from_behavior(&self, class_id: ClassId) -> bool {
        match self.context.class_hierarchy() {
            Some(hierarchy) => hierarchy.is_derived_from(class_id, ClassId::BEHAVIOR),
            None => class_id == ClassId::BEHAVIOR,
        }
    }

    /// Phase 13 + attach: remap citations in every chunk, attach object
    /// chunks, and queue unresolved citations for the second pass.
    fn remap_and_attach(
        &self,
        session: &mut Session,
        remap: &IdRemap,
        created: Vec<Option<ObjectId>>,
        object_chunks: Vec<Option<nemofile_domain::StateChunk>>,
        resolver: &mut ReferenceResolver,
    ) -> Result<(), FormatError> {
        let strict = false; // unresolved citations go to the resolver first

        // Manager blobs are remapped in place.
        let mut manager_data = std::mem::take(session.manager_data_mut());
        for manager in &mut manager_data {
            if let Some(chunk) = manager.chunk.as_mut() {
                let outcome = chunk.remap_ids(remap, strict)?;
                session.stats_mut().citations_remapped += outcome.rewritten;
                for (offset, raw) in outcome.unresolved {
                    session.stats_mut().warn(
                        "reference",
                        Severity::Warning,
                        format!(
                            "manager {} cites unknown file id {} at offset {}",
                            manager.guid, raw, offset
                        ),
                    );
                }
            }
        }
        session.set_manager_data(manager_data);

        for (runtime_id, chunk) in created.into_iter().zip(object_chunks) {
            let (Some(runtime_id), Some(mut chunk)) = (runtime_id, chunk) else {
                continue;
            };
            let outcome = chunk.remap_ids(remap, strict)?;
            session.stats_mut().citations_remapped += outcome.rewritten;
            for (offset, raw) in outcome.unresolved {
                resolver.add(runtime_id, offset, ResolutionStrategy::ById(ObjectId::new(raw)));
            }
            if let Some(object) = session.repository_mut().find_by_id_mut(runtime_id) {
                object.set_chunk(chunk);
            }
        }
        Ok(())
    }

    /// Phase 14/15: index, residual resolution, post-load hooks, stats.
    fn finish_loading(
        &self,
        session: &mut Session,
        remap: &IdRemap,
        resolver: &mut ReferenceResolver,
    ) -> Result<(), FormatError> {
        session.build_index();

        let outcome = {
            let (repository, index) = session.repository_and_index_mut();
            let index = index.ok_or_else(|| {
                FormatError::invalid_argument("finish-loading requires the object index".to_string())
            })?;
            resolver.resolve_all(repository, index, self.context.class_hierarchy(), Some(remap))?
        };
        session.stats_mut().references_resolved = outcome.resolved;
        session.stats_mut().references_unresolved = outcome.unresolved;
        if outcome.unresolved > 0 {
            session.stats_mut().warn(
                "reference",
                Severity::Warning,
                format!("{} references stayed unresolved", outcome.unresolved),
            );
            if self.flags.contains(LoadFlags::STRICT_REFERENCES) {
                return Err(FormatError::reference_unresolved(format!(
                    "{} references unresolved under STRICT_REFERENCES",
                    outcome.unresolved
                )));
            }
        }

        // Phase 15: manager post-load hooks.
        self.run_hooks(session, HookPoint::PostLoad);
        Ok(())
    }

    fn load_included_files(
        &self,
        session: &mut Session,
        header1: &Header1,
        tail: &[u8],
    ) -> Result<(), FormatError> {
        if header1.included_files.is_empty() {
            return Ok(());
        }
        let payloads = parse_included_payloads(tail, header1.included_files.len())?;
        for (index, (name, bytes)) in payloads.into_iter().enumerate() {
            let declared = &header1.included_files[index];
            if declared.size as usize != bytes.len() {
                session.stats_mut().warn(
                    "included-file",
                    Severity::Warning,
                    format!(
                        "{}: index declares {} bytes, tail holds {}",
                        name, declared.size, bytes.len()
                    ),
                );
            }
            session.add_included_file(name, &bytes)?;
        }
        Ok(())
    }

    /// Runs one hook on every registered manager; failures are counted,
    /// never fatal.
    fn run_hooks(&self, session: &mut Session, point: HookPoint) {
        let managers = self.context.managers().in_id_order();
        for manager in managers {
            let result = match point {
                HookPoint::PreLoad => manager.on_pre_load(session),
                HookPoint::PostLoad => manager.on_post_load(session),
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
    PreLoad,
    PostLoad,
}
