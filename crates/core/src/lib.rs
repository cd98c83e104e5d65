//! objstor-core: Core library for the objstor command adapter
//!
//! This crate provides the SDK-independent parts of objstor:
//! - Configuration management
//! - Path resolution against a caller-supplied working directory
//! - Cancellable listing streams
//! - The ObjectStore trait and the filesystem-style operations built on it
//!
//! The S3 gateway lives in objstor-s3 so the core can be tested against
//! mocks without touching the network.

pub mod config;
pub mod error;
pub mod listing;
pub mod ops;
pub mod path;
pub mod traits;

pub use config::{Config, ConfigManager, Overrides, Settings};
pub use error::{Error, Result, ResultExt};
pub use listing::{ListingItem, ListingSink, ListingStream};
pub use path::{resolve, resolve_with};
pub use traits::{ContentSource, DIRECTORY_CONTENT_TYPE, ObjectStore};
