// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Logging
//!
//! Pluggable logging abstraction for the load/save pipelines.
//!
//! ## Design Rationale
//!
//! The session logger is a **simplified logging interface** carried in the
//! context. It provides:
//!
//! - **Minimal API** - Only the four levels the pipelines use
//! - **Trait-based** - Testable with no-op and capturing implementations
//! - **Integration-ready** - The default implementation routes to `tracing`
//! - **Reentrant** - Implementations must tolerate being called from hooks
//!   that are themselves running under a log call
//!
//! ## Log Levels
//!
//! - **Error** - A pipeline phase failed
//! - **Warn** - Recoverable conditions (unresolved references, hook errors)
//! - **Info** - Phase progress and session summaries
//! - **Debug** - Per-object and per-section detail

use tracing_subscriber::EnvFilter;

/// Session logging abstraction.
///
/// Implementations can use tracing, a test capture buffer, or custom
/// backends. Calls are synchronous and must be reentrant.
pub trait SessionLogger: Send + Sync {
    /// Log a pipeline failure.
    fn error(&self, message: &str);

    /// Log a recoverable condition.
    fn warn(&self, message: &str);

    /// Log phase progress.
    fn info(&self, message: &str);

    /// Log per-object detail.
    fn debug(&self, message: &str);
}

/// Console logger implementation routing through the tracing crate.
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    /// Create a new console logger with the default prefix.
    pub fn new() -> Self {
        Self::with_prefix("nemofile")
    }

    /// Create a new console logger with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "nemofile", "[{}] {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "nemofile", "[{}] {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "nemofile", "[{}] {}", self.prefix, message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "nemofile", "[{}] {}", self.prefix, message);
    }
}

/// No-op logger for embedding the codec where logging is unwanted.
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLogger for NoOpLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}

/// Initializes a tracing subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Capturing logger for testing.
///
/// Captures log messages in memory for assertion in tests.
#[cfg(test)]
pub struct CapturingLogger {
    messages: std::sync::Arc<std::sync::Mutex<Vec<(LogLevel, String)>>>,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

#[cfg(test)]
impl CapturingLogger {
    pub fn new() -> Self {
        Self {
            messages: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.messages.lock().unwrap().push((level, message.to_string()));
    }
}

#[cfg(test)]
impl SessionLogger for CapturingLogger {
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logger_does_not_panic() {
        let logger = ConsoleLogger::with_prefix("test");
        logger.info("info message");
        logger.debug("debug message");
    }

    #[test]
    fn test_noop_logger_discards() {
        let logger = NoOpLogger::new();
        logger.error("error");
        logger.warn("warning");
    }

    #[test]
    fn test_capturing_logger_records_in_order() {
        let logger = CapturingLogger::new();
        logger.error("first");
        logger.warn("second");
        logger.info("third");
        logger.debug("fourth");

        let messages = logger.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], (LogLevel::Error, "first".to_string()));
        assert_eq!(messages[3], (LogLevel::Debug, "fourth".to_string()));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
