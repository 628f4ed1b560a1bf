//! Structured tagged logging for holderwatch
//!
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via --debug-<tag> flags
//! - Colored console output with aligned tag and level columns
//!
//! ## Usage
//!
//! ```rust
//! use holderwatch::logger::{self, LogTag};
//!
//! logger::error(LogTag::Fetcher, "All providers exhausted");
//! logger::warning(LogTag::Api, "Birdeye returned HTTP 429");
//! logger::info(LogTag::Ledger, "Reconciled 120 holders");
//! logger::debug(LogTag::Ingest, "Raw webhook payload: ..."); // Only with --debug-ingest
//! ```
//!
//! Call [`init`] once at startup, before any logging occurs.

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line flags
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown even with --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the matching --debug-<tag> flag is present.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
