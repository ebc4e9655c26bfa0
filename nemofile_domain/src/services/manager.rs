// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Manager Hook Trait
//!
//! Engine subsystems ("managers") participate in the pipelines through a
//! fixed capability set of four hooks. The pipelines call every registered
//! manager in ID order; hook failures are counted into the session stats
//! and never abort a phase by themselves.
//!
//! A manager's per-file state travels as an opaque blob in the session's
//! [`ManagerData`](crate::entities::ManagerData) list, keyed by the
//! manager's GUID, typically stored by `on_pre_save` and consumed by
//! `on_post_load`.

use crate::entities::Session;
use crate::error::FormatError;
use crate::value_objects::Guid;

/// An engine subsystem participating in load and save.
pub trait FileManager: Send + Sync {
    /// Registry key; duplicate IDs are rejected at registration.
    fn id(&self) -> u32;

    /// Stable identity written next to the manager's blob in the file.
    fn guid(&self) -> Guid;

    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Called before objects are created from the file (load phase 7).
    fn on_pre_load(&self, _session: &mut Session) -> Result<(), FormatError> {
        Ok(())
    }

    /// Called inside finish-loading, after references resolve (phase 15).
    fn on_post_load(&self, _session: &mut Session) -> Result<(), FormatError> {
        Ok(())
    }

    /// Called before any serialization happens (save phase 2).
    fn on_pre_save(&self, _session: &mut Session) -> Result<(), FormatError> {
        Ok(())
    }

    /// Called after the destination file is in place (save phase 14).
    fn on_post_save(&self, _session: &mut Session) -> Result<(), FormatError> {
        Ok(())
    }
}
