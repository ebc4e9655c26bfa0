// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Value Objects
//!
//! Immutable, self-validating values used by the chunk codec and the file
//! pipeline: identifiers, flag sets, file metadata, and the fixed-stride
//! math payload types.

pub mod class_id;
pub mod file_info;
pub mod flags;
pub mod guid;
pub mod id_remap;
pub mod math;
pub mod object_id;
pub mod plugin_dependency;

pub use class_id::ClassId;
pub use file_info::FileInfo;
pub use flags::{ChunkOptions, LoadFlags, SaveFlags, WriteMode};
pub use guid::Guid;
pub use id_remap::IdRemap;
pub use math::{ColorRgba, Matrix4, Quaternion, Vector3};
pub use object_id::ObjectId;
pub use plugin_dependency::{DependencyStatus, PluginDependency};
