// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib checked separately from tests - tests may use unwrap/expect)

//! # Nemofile
//!
//! Reader and writer for the legacy Nemo scene-container formats
//! (`.nmo`, `.cmo`, `.vmo`). A container is a self-describing bundle of
//! objects, per-subsystem manager blobs, cross-object references by numeric
//! ID, and optional embedded auxiliary files; every payload travels in a
//! DWORD-oriented **state chunk** with citation sidebands.
//!
//! ## Architecture Overview
//!
//! The workspace follows a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (Context, LoadPipeline, SavePipeline)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │  (Chunks, File Codecs, Objects, Session, Registries)        │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (Deflate, Memory-Mapped I/O, Staged Output, Logging)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  File Header (signature, CRC, section sizes, versions)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Header1 (deflated: descriptors, plugin deps, file index)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Data Section (deflated: manager blobs, object chunks)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Included-File Payloads (raw)                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use nemofile::application::Context;
//! use nemofile_domain::{LoadFlags, SaveFlags};
//!
//! let context = Context::default();
//! let mut session = context
//!     .load_file("scene.nmo".as_ref(), LoadFlags::default())
//!     .expect("load failed");
//!
//! for object in session.repository().iter() {
//!     println!("{} {:?}", object.id(), object.name());
//! }
//!
//! context
//!     .save_file(&mut session, "copy.nmo".as_ref(), SaveFlags::COMPRESSED)
//!     .expect("save failed");
//! ```

pub mod application;
pub mod infrastructure;

// Re-export the public surface for convenient access
pub use application::Context;
pub use infrastructure::config::SessionConfig;
pub use infrastructure::logging::{init_tracing, ConsoleLogger, NoOpLogger, SessionLogger};
pub use infrastructure::services::RawDeflate;
pub use nemofile_domain::{
    ClassId, FileInfo, FormatError, FormatResult, Guid, LoadFlags, ObjectId, SaveFlags, SceneObject, Session,
};
