// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Manager and Plugin Registries
//!
//! Two ID-keyed maps with a secondary GUID key each. Registration rejects
//! duplicate IDs and duplicate GUIDs; iteration is in ascending ID order so
//! hook invocation and the Header1 dependency array come out deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FormatError;
use crate::services::FileManager;
use crate::value_objects::{Guid, PluginDependency};

/// Registry of manager instances keyed by numeric ID, secondarily by GUID.
#[derive(Default)]
pub struct ManagerRegistry {
    by_id: HashMap<u32, Arc<dyn FileManager>>,
    guid_to_id: HashMap<Guid, u32>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, manager: Arc<dyn FileManager>) -> Result<(), FormatError> {
        let id = manager.id();
        let guid = manager.guid();
        if self.by_id.contains_key(&id) {
            return Err(FormatError::already_exists(format!("manager id {} is taken", id)));
        }
        if self.guid_to_id.contains_key(&guid) {
            return Err(FormatError::already_exists(format!("manager guid {} is taken", guid)));
        }
        self.guid_to_id.insert(guid, id);
        self.by_id.insert(id, manager);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&Arc<dyn FileManager>> {
        self.by_id.get(&id)
    }

    pub fn get_by_guid(&self, guid: Guid) -> Option<&Arc<dyn FileManager>> {
        self.guid_to_id.get(&guid).and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Managers in ascending ID order; the pipelines' hook order.
    pub fn in_id_order(&self) -> Vec<Arc<dyn FileManager>> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| Arc::clone(&self.by_id[&id])).collect()
    }
}

impl std::fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerRegistry").field("len", &self.by_id.len()).finish()
    }
}

/// One registered plugin entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: u32,
    pub guid: Guid,
    pub category: u32,
    pub version: u32,
}

/// Registry of in-process plugins; dynamic library loading happens outside
/// the codec, which only accepts already-loaded entry points.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    by_id: HashMap<u32, PluginInfo>,
    guid_to_id: HashMap<Guid, u32>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: PluginInfo) -> Result<(), FormatError> {
        if self.by_id.contains_key(&plugin.id) {
            return Err(FormatError::already_exists(format!("plugin id {} is taken", plugin.id)));
        }
        if self.guid_to_id.contains_key(&plugin.guid) {
            return Err(FormatError::already_exists(format!(
                "plugin guid {} is taken",
                plugin.guid
            )));
        }
        self.guid_to_id.insert(plugin.guid, plugin.id);
        self.by_id.insert(plugin.id, plugin);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&PluginInfo> {
        self.by_id.get(&id)
    }

    pub fn find_by_guid(&self, guid: Guid) -> Option<&PluginInfo> {
        self.guid_to_id.get(&guid).and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Assembles the Header1 plugin-dependency array, in ascending ID order.
    pub fn dependency_list(&self) -> Vec<PluginDependency> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| {
                let plugin = &self.by_id[&id];
                PluginDependency::new(plugin.guid, plugin.category, plugin.version)
            })
            .collect()
    }
}
