//! Output formatting utilities
//!
//! This module provides the formatter for `ls` and `chdir` output in both
//! the fixed human layout and JSON.

mod formatter;

pub use formatter::Formatter;

/// Output configuration derived from CLI flags and settings
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// strftime layout for listing timestamps
    pub time_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            time_format: objstor_core::Settings::default().time_format,
        }
    }
}
