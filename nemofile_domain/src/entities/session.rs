// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Entity
//!
//! The per-operation state container. One session backs one load or one
//! save: it owns the arena, the object repository, the file info, manager
//! blobs, included files, plugin diagnostics, and the finish-loading
//! statistics. Dropping the session releases everything it owns in one
//! step.
//!
//! Included-file payloads are copied into the session arena and addressed
//! by handle, so the byte data lives and dies with the session no matter
//! how the entries are shuffled.

use crate::chunk::StateChunk;
use crate::error::Severity;
use crate::memory::{Arena, ArenaSlice};
use crate::repositories::{ObjectIndex, ObjectRepository};
use crate::value_objects::{DependencyStatus, FileInfo, Guid, PluginDependency};

/// Opaque per-manager state blob, keyed by the manager's GUID.
#[derive(Debug, Clone, Default)]
pub struct ManagerData {
    pub guid: Guid,
    pub chunk: Option<StateChunk>,
}

/// One auxiliary file embedded in the container.
#[derive(Debug, Clone)]
pub struct IncludedFile {
    name: String,
    data: ArenaSlice,
}

impl IncludedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Outcome of checking one Header1 plugin dependency (load phase 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDiagnostic {
    pub dependency: PluginDependency,
    pub status: DependencyStatus,
}

/// One warning accumulated while finishing a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Counters and warnings gathered across the load phases.
#[derive(Debug, Clone, Default)]
pub struct FinishLoadingStats {
    pub objects_created: usize,
    pub chunks_parsed: usize,
    pub citations_remapped: usize,
    pub references_resolved: usize,
    pub references_unresolved: usize,
    pub manager_hook_errors: usize,
    pub warnings: Vec<LoadWarning>,
}

impl FinishLoadingStats {
    pub fn warn(&mut self, category: &'static str, severity: Severity, message: impl Into<String>) {
        self.warnings.push(LoadWarning {
            category,
            severity,
            message: message.into(),
        });
    }
}

/// Per-operation state for one load or save.
#[derive(Debug, Default)]
pub struct Session {
    arena: Arena,
    repository: ObjectRepository,
    file_info: FileInfo,
    manager_data: Vec<ManagerData>,
    included_files: Vec<IncludedFile>,
    plugin_diagnostics: Vec<PluginDiagnostic>,
    stats: FinishLoadingStats,
    index: Option<ObjectIndex>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose arena refuses to grow past `limit` bytes.
    pub fn with_arena_limit(limit: usize) -> Self {
        Self {
            arena: Arena::with_capacity_limit(limit),
            ..Self::default()
        }
    }

    // ---- object graph ------------------------------------------------------

    pub fn repository(&self) -> &ObjectRepository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut ObjectRepository {
        &mut self.repository
    }

    /// The class/name/GUID index, present after finish-loading or an
    /// explicit [`Session::build_index`].
    pub fn index(&self) -> Option<&ObjectIndex> {
        self.index.as_ref()
    }

    /// Builds (or rebuilds) the object index from the repository.
    pub fn build_index(&mut self) {
        self.index = Some(ObjectIndex::build(&self.repository));
    }

    /// Mutable repository together with the current index, for resolution
    /// passes that patch chunks while consulting the index.
    pub fn repository_and_index_mut(&mut self) -> (&mut ObjectRepository, Option<&ObjectIndex>) {
        (&mut self.repository, self.index.as_ref())
    }

    // ---- file info ---------------------------------------------------------

    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    pub fn set_file_info(&mut self, info: FileInfo) {
        self.file_info = info;
    }

    pub fn file_info_mut(&mut self) -> &mut FileInfo {
        &mut self.file_info
    }

    // ---- manager blobs -----------------------------------------------------

    pub fn manager_data(&self) -> &[ManagerData] {
        &self.manager_data
    }

    pub fn set_manager_data(&mut self, data: Vec<ManagerData>) {
        self.manager_data = data;
    }

    pub fn add_manager_data(&mut self, data: ManagerData) {
        self.manager_data.push(data);
    }

    pub fn manager_data_mut(&mut self) -> &mut Vec<ManagerData> {
        &mut self.manager_data
    }

    /// The blob stored for `guid`, if the file carried one.
    pub fn manager_data_by_guid(&self, guid: Guid) -> Option<&ManagerData> {
        self.manager_data.iter().find(|m| m.guid == guid)
    }

    // ---- included files ----------------------------------------------------

    /// Copies `bytes` into the session arena and records the entry.
    pub fn add_included_file(&mut self, name: impl Into<String>, bytes: &[u8]) -> Result<(), crate::error::FormatError> {
        let data = self.arena.store(bytes)?;
        self.included_files.push(IncludedFile {
            name: name.into(),
            data,
        });
        Ok(())
    }

    pub fn included_files(&self) -> &[IncludedFile] {
        &self.included_files
    }

    /// Name and payload of included file `index`.
    pub fn included_file(&self, index: usize) -> Option<(&str, &[u8])> {
        self.included_files
            .get(index)
            .map(|file| (file.name.as_str(), self.arena.get(file.data)))
    }

    // ---- diagnostics -------------------------------------------------------

    pub fn plugin_diagnostics(&self) -> &[PluginDiagnostic] {
        &self.plugin_diagnostics
    }

    pub fn add_plugin_diagnostic(&mut self, diagnostic: PluginDiagnostic) {
        self.plugin_diagnostics.push(diagnostic);
    }

    pub fn stats(&self) -> &FinishLoadingStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut FinishLoadingStats {
        &mut self.stats
    }

    /// Arena usage, surfaced for diagnostics.
    pub fn arena_bytes_used(&self) -> usize {
        self.arena.bytes_used()
    }

    pub fn arena_total_allocated(&self) -> usize {
        self.arena.total_allocated()
    }
}
