// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Memory Utilities
//!
//! Session-scoped storage helpers: a region-based bump arena for blob
//! payloads, a bit array for dense membership sets, and a name interner.
//! Everything a session allocates through these is released in one step
//! when the session is dropped.

pub mod arena;
pub mod bit_array;
pub mod interner;

pub use arena::{Arena, ArenaSlice};
pub use bit_array::BitArray;
pub use interner::NameInterner;
