// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Services
//!
//! Concrete adapters behind the domain ports: raw-deflate compression and
//! the file I/O primitives the pipelines use.

pub mod deflate;
pub mod file_io;

pub use deflate::RawDeflate;
pub use file_io::{read_container_bytes, MappedInput, StagedOutput};
