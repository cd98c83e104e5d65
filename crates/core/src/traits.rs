//! ObjectStore trait definition
//!
//! This trait defines the storage gateway the filesystem-style operations are
//! built on. It keeps the core decoupled from the specific S3 SDK.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::listing::ListingStream;

/// Content type written on directory marker objects
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// Where the bytes of an upload come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// In-memory content
    Bytes(Vec<u8>),
    /// A local file, streamed by the gateway
    File(PathBuf),
}

impl ContentSource {
    /// Zero-length content
    pub fn empty() -> Self {
        ContentSource::Bytes(Vec::new())
    }
}

/// Trait for S3-compatible storage operations
///
/// Keys are flat strings; "directories" only exist as shared key prefixes and
/// zero-byte marker objects. This trait is implemented by the S3 adapter and
/// can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Stream objects whose keys start with `prefix`
    ///
    /// With `recursive == false` keys are grouped on the separator and each
    /// group is yielded once as a prefix item.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<ListingStream>;

    /// Delete a single object
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Create or overwrite an object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ContentSource,
        content_type: &str,
    ) -> Result<()>;

    /// Download an object into a local file
    async fn get_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<()>;
}
