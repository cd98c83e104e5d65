//! Output formatter for listing lines, resolved paths and errors
//!
//! The host program parses our stdout, so human mode output is exact:
//! `ls` lines mimic `ls -l` and `chdir` prints the bare path. JSON mode
//! emits one object per line instead.

use std::io::Write;

use jiff::Timestamp;
use objstor_core::{Error, ListingItem, Result};
use serde::Serialize;

use super::OutputConfig;

/// Fixed permission column; the store has no permissions to report
const PERMISSIONS: &str = "-rwxr-xr-x";

#[derive(Debug, Serialize)]
struct PathOutput<'a> {
    path: &'a str,
}

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render one `ls` line without a line terminator
    ///
    /// `<perms> <owner> <owner> <size> <timestamp> <key>`; a missing owner is
    /// left empty and a missing timestamp renders the Unix epoch.
    pub fn listing_line(&self, item: &ListingItem) -> Result<String> {
        let owner = item.owner.as_deref().unwrap_or_default();
        let modified = item.last_modified.unwrap_or(Timestamp::UNIX_EPOCH);
        let modified = jiff::fmt::strtime::format(self.config.time_format.as_str(), modified)
            .map_err(|e| Error::Config(format!("invalid time_format: {e}")))?;

        Ok(format!(
            "{PERMISSIONS} {owner} {owner} {} {modified} {}",
            item.size, item.key
        ))
    }

    /// Write one listing item
    pub fn write_item(&self, out: &mut dyn Write, item: &ListingItem) -> Result<()> {
        if self.config.json {
            serde_json::to_writer(&mut *out, item)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", self.listing_line(item)?)?;
        }
        Ok(())
    }

    /// Write a resolved path
    pub fn write_path(&self, out: &mut dyn Write, path: &str) -> Result<()> {
        if self.config.json {
            serde_json::to_writer(&mut *out, &PathOutput { path })?;
            writeln!(out)?;
        } else {
            writeln!(out, "{path}")?;
        }
        Ok(())
    }

    /// Output an error message
    ///
    /// Errors always go to stderr.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({
                "error": message
            });
            eprintln!("{error}");
        } else {
            eprintln!("objstor: {message}");
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
