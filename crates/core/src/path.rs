//! Path resolution
//!
//! The invoking program tracks its own working directory and hands it to us
//! along with a path that may be absolute or relative and may contain `.`,
//! `..`, repeated or trailing separators. Everything here is purely
//! syntactic: nothing touches the store and nothing can fail.
//!
//! Object keys are canonical paths with the leading separator stripped, so
//! `/backups/daily/a.tar` is stored under the key `backups/daily/a.tar`.

/// Default path separator
pub const SEPARATOR: &str = "/";

/// Resolve `input` against `working_dir` using the default separator
///
/// See [`resolve_with`].
pub fn resolve(working_dir: &str, input: &str) -> String {
    resolve_with(working_dir, input, SEPARATOR)
}

/// Resolve `input` against `working_dir` into a canonical absolute path
///
/// Absolute inputs ignore the working directory. Empty and `.` segments are
/// dropped, `..` pops the previous segment and is dropped on its own when
/// there is nothing left to pop. The result always starts with `separator`;
/// an empty result is the root.
///
/// `separator` must be non-empty; configuration loading rejects empty
/// separators before a resolver ever sees one.
pub fn resolve_with(working_dir: &str, input: &str, separator: &str) -> String {
    let joined;
    let raw = if input.starts_with(separator) {
        input
    } else {
        joined = format!("{working_dir}{separator}{input}");
        joined.as_str()
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(separator) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("{separator}{}", segments.join(separator))
}

/// Object key for a canonical path (leading separator stripped)
pub fn object_key(path: &str, separator: &str) -> String {
    path.trim_start_matches(separator).to_string()
}

/// Listing prefix for everything beneath a directory path
///
/// The root maps to the empty prefix (whole bucket); any other directory
/// gets a trailing separator so `/a` never matches `/ab/...`.
pub fn directory_prefix(path: &str, separator: &str) -> String {
    let key = object_key(path, separator);
    if key.is_empty() {
        key
    } else {
        format!("{key}{separator}")
    }
}

/// Key of the zero-byte marker object that stands in for a directory
///
/// Returns `None` for the root, which has no marker.
pub fn marker_key(path: &str, separator: &str) -> Option<String> {
    let prefix = directory_prefix(path, separator);
    if prefix.is_empty() { None } else { Some(prefix) }
}

/// Whether a canonical path is the root
pub fn is_root(path: &str, separator: &str) -> bool {
    path.trim_start_matches(separator).is_empty()
}
