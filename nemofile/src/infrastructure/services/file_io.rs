// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File I/O Primitives
//!
//! Input and output halves of the pipelines' file handling:
//!
//! - [`MappedInput`] memory-maps a container for zero-copy parsing and
//!   falls back to a buffered read where mapping is unavailable (empty
//!   files, exotic file systems).
//! - [`StagedOutput`] writes into a temporary file next to the destination
//!   and atomically renames it over the destination on commit. Dropping an
//!   uncommitted staging file removes it, so a failed save never leaves a
//!   partial destination behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tempfile::NamedTempFile;

use nemofile_domain::FormatError;

/// A loaded container image: memory-mapped when possible, buffered
/// otherwise.
#[derive(Debug)]
pub enum MappedInput {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl MappedInput {
    /// Opens `path` for reading, preferring a memory map.
    pub fn open(path: &Path) -> Result<Self, FormatError> {
        let file = std::fs::File::open(path)
            .map_err(|e| map_open_error(path, e))?;
        let len = file.metadata().map_err(FormatError::from)?.len();
        if len == 0 {
            return Ok(MappedInput::Buffered(Vec::new()));
        }

        // Safety: the session owns this mapping for its whole lifetime and
        // the codec never writes through it; concurrent truncation of a
        // container being loaded is outside the format's contract.
        match unsafe { Mmap::map(&file) } {
            Ok(map) => Ok(MappedInput::Mapped(map)),
            Err(_) => Ok(MappedInput::Buffered(std::fs::read(path).map_err(FormatError::from)?)),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            MappedInput::Mapped(map) => map,
            MappedInput::Buffered(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

/// Reads a container image, mapping missing paths to `FileNotFound`.
pub fn read_container_bytes(path: &Path) -> Result<MappedInput, FormatError> {
    MappedInput::open(path)
}

fn map_open_error(path: &Path, error: std::io::Error) -> FormatError {
    if error.kind() == std::io::ErrorKind::NotFound {
        FormatError::FileNotFound(format!("{}", path.display()))
    } else {
        FormatError::from(error)
    }
}

/// Transactional output: staging file plus atomic rename on commit.
#[derive(Debug)]
pub struct StagedOutput {
    staging: NamedTempFile,
    destination: PathBuf,
    bytes_written: u64,
}

impl StagedOutput {
    /// Creates a staging file in the destination's directory, so the final
    /// rename stays on one file system.
    pub fn create(destination: &Path) -> Result<Self, FormatError> {
        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".nemofile-staging-")
            .tempfile_in(directory)
            .map_err(|e| FormatError::io(format!("cannot create staging file in {}: {}", directory.display(), e)))?;
        Ok(Self {
            staging,
            destination: destination.to_path_buf(),
            bytes_written: 0,
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.staging
            .write_all(bytes)
            .map_err(|e| FormatError::io(format!("staging write failed: {}", e)))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Path of the staging file while the transaction is open.
    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Flushes (and with `durable`, fsyncs) the staging file, then renames
    /// it over the destination. Consumes the transaction.
    pub fn commit(mut self, durable: bool) -> Result<u64, FormatError> {
        self.staging
            .flush()
            .map_err(|e| FormatError::io(format!("staging flush failed: {}", e)))?;
        if durable {
            self.staging
                .as_file()
                .sync_all()
                .map_err(|e| FormatError::io(format!("staging fsync failed: {}", e)))?;
        }
        let written = self.bytes_written;
        self.staging
            .persist(&self.destination)
            .map_err(|e| FormatError::io(format!("atomic swap onto {} failed: {}", self.destination.display(), e.error)))?;
        Ok(written)
    }
}
