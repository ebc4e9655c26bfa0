// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Context
//!
//! Long-lived state shared by every session: the manager and plugin
//! registries, the collaborator handles (class hierarchy, schema registry),
//! the compression backend, the logger, and the pipeline configuration.
//!
//! Registries sit behind whole-registry `parking_lot` locks: registrations
//! happen during setup, loads and saves only read. A session never outlives
//! the context it was created from, so `Session::load`-style entry points
//! live here.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use nemofile_domain::entities::Session;
use nemofile_domain::services::{
    ClassHierarchy, CompressionService, FileManager, ManagerRegistry, PluginInfo, PluginRegistry, SchemaRegistry,
};
use nemofile_domain::{FormatError, LoadFlags, SaveFlags};

use crate::application::services::{LoadPipeline, SavePipeline};
use crate::infrastructure::config::SessionConfig;
use crate::infrastructure::logging::{ConsoleLogger, SessionLogger};
use crate::infrastructure::services::RawDeflate;

/// Shared allocator/logger/registry environment for sessions.
pub struct Context {
    managers: RwLock<ManagerRegistry>,
    plugins: RwLock<PluginRegistry>,
    class_hierarchy: Option<Arc<dyn ClassHierarchy>>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
    compression: Arc<dyn CompressionService>,
    logger: Arc<dyn SessionLogger>,
    config: SessionConfig,
}

impl Context {
    /// Context with the given logger and worker hint; everything else is
    /// defaulted (raw deflate, empty registries).
    pub fn new(logger: Arc<dyn SessionLogger>, thread_pool_hint: Option<usize>) -> Self {
        let config = SessionConfig {
            thread_pool_hint,
            ..SessionConfig::default()
        };
        Self::with_config_and_logger(config, logger)
    }

    /// Context from a full configuration, logging to the console.
    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_config_and_logger(config, Arc::new(ConsoleLogger::new()))
    }

    pub fn with_config_and_logger(config: SessionConfig, logger: Arc<dyn SessionLogger>) -> Self {
        Self {
            managers: RwLock::new(ManagerRegistry::new()),
            plugins: RwLock::new(PluginRegistry::new()),
            class_hierarchy: None,
            schema_registry: None,
            compression: Arc::new(RawDeflate::new()),
            logger,
            config,
        }
    }

    /// Installs the engine's class-hierarchy collaborator.
    pub fn with_class_hierarchy(mut self, hierarchy: Arc<dyn ClassHierarchy>) -> Self {
        self.class_hierarchy = Some(hierarchy);
        self
    }

    /// Stores the opaque schema-registry handle.
    pub fn with_schema_registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.schema_registry = Some(registry);
        self
    }

    /// Replaces the compression backend (the default is raw deflate).
    pub fn with_compression(mut self, compression: Arc<dyn CompressionService>) -> Self {
        self.compression = compression;
        self
    }

    // ---- registries --------------------------------------------------------

    pub fn register_manager(&self, manager: Arc<dyn FileManager>) -> Result<(), FormatError> {
        self.managers.write().register(manager)
    }

    pub fn register_plugin(&self, plugin: PluginInfo) -> Result<(), FormatError> {
        self.plugins.write().register(plugin)
    }

    pub fn managers(&self) -> RwLockReadGuard<'_, ManagerRegistry> {
        self.managers.read()
    }

    pub fn plugins(&self) -> RwLockReadGuard<'_, PluginRegistry> {
        self.plugins.read()
    }

    // ---- collaborators -----------------------------------------------------

    pub fn class_hierarchy(&self) -> Option<&dyn ClassHierarchy> {
        self.class_hierarchy.as_deref()
    }

    pub fn schema_registry(&self) -> Option<&dyn SchemaRegistry> {
        self.schema_registry.as_deref()
    }

    pub fn compression(&self) -> &dyn CompressionService {
        self.compression.as_ref()
    }

    pub fn logger(&self) -> &dyn SessionLogger {
        self.logger.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ---- session entry points ----------------------------------------------

    /// Fresh session honoring the configured arena limit.
    pub fn create_session(&self) -> Session {
        match self.config.arena_limit_bytes {
            Some(limit) => Session::with_arena_limit(limit),
            None => Session::new(),
        }
    }

    /// Loads a container file into a new session (the 15-phase machine).
    pub fn load_file(&self, path: &Path, flags: LoadFlags) -> Result<Session, FormatError> {
        LoadPipeline::new(self, flags).run(path)
    }

    /// Loads a container from an in-memory image.
    pub fn load_from_bytes(&self, bytes: &[u8], flags: LoadFlags) -> Result<Session, FormatError> {
        LoadPipeline::new(self, flags).run_bytes(bytes)
    }

    /// Saves a session to `path` with transactional discipline (the
    /// 14-phase machine). Returns the bytes written.
    pub fn save_file(&self, session: &mut Session, path: &Path, flags: SaveFlags) -> Result<u64, FormatError> {
        SavePipeline::new(self, flags).run(session, path)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::with_config(SessionConfig::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("managers", &self.managers.read().len())
            .field("plugins", &self.plugins.read().len())
            .field("config", &self.config)
            .finish()
    }
}
