// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Raw Deflate Adapter
//!
//! Implements the domain [`CompressionService`] port with flate2's raw
//! DEFLATE streams (no zlib or gzip framing). The backend is miniz_oxide,
//! which keeps the byte streams interchangeable with the miniz build the
//! reference engine bundles.

use std::io::Read;

use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;

use nemofile_domain::services::CompressionService;
use nemofile_domain::FormatError;

/// Raw-deflate implementation of the compression port.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDeflate;

impl RawDeflate {
    pub fn new() -> Self {
        Self
    }
}

impl CompressionService for RawDeflate {
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, FormatError> {
        let mut output = Vec::new();
        let mut encoder = DeflateEncoder::new(data, Compression::new(level.min(9)));
        encoder
            .read_to_end(&mut output)
            .map_err(|e| FormatError::io(format!("deflate failed: {}", e)))?;
        Ok(output)
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, FormatError> {
        let mut output = Vec::with_capacity(expected_size);
        let mut decoder = DeflateDecoder::new(data);
        // Bound the read so a corrupt stream cannot balloon past the size
        // the header promised.
        decoder
            .by_ref()
            .take(expected_size as u64 + 1)
            .read_to_end(&mut output)
            .map_err(|e| FormatError::invalid_data(format!("inflate failed: {}", e)))?;
        if output.len() != expected_size {
            return Err(FormatError::invalid_data(format!(
                "section inflated to {} bytes, header promised {}",
                output.len(),
                expected_size
            )));
        }
        Ok(output)
    }
}
