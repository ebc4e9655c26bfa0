// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plugin Dependency Value Object
//!
//! Header1 records the plugins a file depends on. The wire form stores
//! `{guid, category}` only; the `version` field exists on the runtime value
//! because the plugin registry knows it, and loads default it to zero.

use serde::{Deserialize, Serialize};

use crate::value_objects::Guid;

/// One entry of the Header1 plugin-dependency array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDependency {
    pub guid: Guid,
    pub category: u32,
    /// Registry-side version; not serialized into Header1.
    pub version: u32,
}

impl PluginDependency {
    pub fn new(guid: Guid, category: u32, version: u32) -> Self {
        Self { guid, category, version }
    }
}

/// Outcome of checking one dependency against the plugin registry
/// (load phase 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyStatus {
    /// A plugin with the right GUID and category is registered.
    Ok,
    /// No plugin with this GUID is registered.
    Missing,
    /// The GUID is registered under a different category.
    CategoryMismatch,
}

impl DependencyStatus {
    pub fn is_satisfied(self) -> bool {
        matches!(self, DependencyStatus::Ok)
    }
}
