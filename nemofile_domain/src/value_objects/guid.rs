// /////////////////////////////////////////////////////////////////////////////
// Nemofile RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GUID Value Object
//!
//! The container's 128-bit-style identifier is a pair of 32-bit words. It
//! identifies managers, plugins, and object type tags across files and
//! engine versions.
//!
//! ## Wire Format
//!
//! Serialized little-endian as two consecutive DWORDs (`d1` then `d2`).
//!
//! ## Textual Form
//!
//! `{XXXXXXXX-XXXXXXXX}`: eight uppercase hex digits, a dash, eight more,
//! wrapped in braces. Parsing is strict on the braces, the dash position,
//! and the overall length; anything else is `InvalidData`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Two-word identifier used for managers, plugins, and object type tags.
///
/// The null GUID (both words zero) means "no identity" and is never a valid
/// registration key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Guid {
    pub d1: u32,
    pub d2: u32,
}

impl Guid {
    /// The null GUID: both words zero.
    pub const NULL: Guid = Guid { d1: 0, d2: 0 };

    /// Creates a GUID from its two words.
    pub const fn new(d1: u32, d2: u32) -> Self {
        Self { d1, d2 }
    }

    /// Checks whether this is the null GUID.
    pub fn is_null(&self) -> bool {
        self.d1 == 0 && self.d2 == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{:08X}-{:08X}}}", self.d1, self.d2)
    }
}

impl FromStr for Guid {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "{XXXXXXXX-XXXXXXXX}" is exactly 19 bytes.
        let bytes = s.as_bytes();
        if bytes.len() != 19 || bytes[0] != b'{' || bytes[18] != b'}' || bytes[9] != b'-' {
            return Err(FormatError::invalid_data(format!(
                "GUID text must match {{XXXXXXXX-XXXXXXXX}}, got '{}'",
                s
            )));
        }

        let parse_word = |hex: &str| -> Result<u32, FormatError> {
            u32::from_str_radix(hex, 16)
                .map_err(|_| FormatError::invalid_data(format!("GUID contains non-hex digits: '{}'", s)))
        };

        Ok(Guid {
            d1: parse_word(&s[1..9])?,
            d2: parse_word(&s[10..18])?,
        })
    }
}
