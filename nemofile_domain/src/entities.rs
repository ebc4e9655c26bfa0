// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Entities
//!
//! Mutable state with identity: scene objects and the per-operation
//! session that owns them.

pub mod scene_object;
pub mod session;

pub use scene_object::SceneObject;
pub use session::{FinishLoadingStats, IncludedFile, LoadWarning, ManagerData, PluginDiagnostic, Session};
