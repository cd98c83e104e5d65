//! Filesystem-style operations over an [`ObjectStore`]
//!
//! Every function here takes an already resolved, canonical path (see
//! [`crate::path`]) and the configured separator, maps it to object keys and
//! issues the matching gateway calls. Errors come back wrapped with the key or
//! path that failed.

use std::path::Path;

use crate::error::{Error, Result, ResultExt};
use crate::listing::ListingItem;
use crate::path::{directory_prefix, marker_key, object_key};
use crate::traits::{ContentSource, DIRECTORY_CONTENT_TYPE, ObjectStore};

/// Delete every object whose key starts with `prefix`
///
/// Deletes are issued in the order the listing yields keys. The first
/// failure cancels the listing and is returned with the failing key; keys
/// deleted before it stay deleted. An empty listing is a success.
///
/// Returns the number of objects removed.
pub async fn delete_all(store: &dyn ObjectStore, bucket: &str, prefix: &str) -> Result<usize> {
    let mut stream = store
        .list_objects(bucket, prefix, true)
        .await
        .context("list", prefix)?;

    let mut removed = 0usize;
    while let Some(item) = stream.next().await {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                stream.cancel();
                return Err(e.context("list", prefix));
            }
        };

        tracing::debug!(bucket, key = %item.key, "removing object");
        if let Err(e) = store.remove_object(bucket, &item.key).await {
            stream.cancel();
            tracing::warn!(bucket, key = %item.key, removed, "delete failed, aborting");
            return Err(e.context("remove", item.key));
        }
        removed += 1;
    }

    tracing::info!(bucket, prefix, removed, "prefix emptied");
    Ok(removed)
}

/// Remove a directory and everything beneath it
///
/// `path` must be canonical. Removing the root empties the bucket.
pub async fn remove_directory(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &str,
    separator: &str,
) -> Result<usize> {
    let prefix = directory_prefix(path, separator);
    delete_all(store, bucket, &prefix).await
}

/// Create the zero-byte marker object that stands in for a directory
///
/// Writing an existing marker again leaves the same object. The root has no
/// marker and always exists.
pub async fn make_directory(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &str,
    separator: &str,
) -> Result<()> {
    let Some(key) = marker_key(path, separator) else {
        tracing::debug!("root directory always exists, no marker written");
        return Ok(());
    };

    store
        .put_object(bucket, &key, ContentSource::empty(), DIRECTORY_CONTENT_TYPE)
        .await
        .context("create directory", path)
}

/// List the immediate children of a directory
///
/// `emit` is called once per child in listing order. If it fails the listing
/// is cancelled and the error returned with the item's key. The directory's
/// own marker object is not reported. When `path` has no children but names
/// an object, that object is reported instead, as `ls` does for a file.
///
/// Returns the number of items emitted.
pub async fn list_directory<F>(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &str,
    separator: &str,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(&ListingItem) -> Result<()>,
{
    let prefix = directory_prefix(path, separator);
    let is_marker = |item: &ListingItem| !prefix.is_empty() && item.key == prefix;
    let emitted = emit_listing(store, bucket, &prefix, path, is_marker, &mut emit).await?;
    if emitted > 0 || prefix.is_empty() {
        return Ok(emitted);
    }

    let key = object_key(path, separator);
    tracing::debug!(bucket, key = %key, "no children, looking for an object");
    let is_other = |item: &ListingItem| item.key != key;
    emit_listing(store, bucket, &key, path, is_other, &mut emit).await
}

/// Single-level listing under `prefix`, passing every item not skipped to `emit`
async fn emit_listing<S, F>(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    path: &str,
    skip: S,
    emit: &mut F,
) -> Result<usize>
where
    S: Fn(&ListingItem) -> bool,
    F: FnMut(&ListingItem) -> Result<()>,
{
    let mut stream = store
        .list_objects(bucket, prefix, false)
        .await
        .context("list", path)?;

    let mut emitted = 0usize;
    while let Some(item) = stream.next().await {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                stream.cancel();
                return Err(e.context("list", path));
            }
        };
        if skip(&item) {
            continue;
        }
        if let Err(e) = emit(&item) {
            stream.cancel();
            return Err(e.context("display", item.key));
        }
        emitted += 1;
    }

    Ok(emitted)
}

/// Delete a single object
pub async fn remove(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &str,
    separator: &str,
) -> Result<()> {
    let key = object_key(path, separator);
    if key.is_empty() {
        return Err(Error::Config("cannot delete the root directory".into()));
    }
    store.remove_object(bucket, &key).await.context("delete", path)
}

/// Download an object to a local file
pub async fn fetch(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &str,
    destination: &Path,
    separator: &str,
) -> Result<()> {
    let key = object_key(path, separator);
    if key.is_empty() {
        return Err(Error::Config("cannot fetch the root directory".into()));
    }
    tracing::debug!(bucket, key = %key, destination = %destination.display(), "fetching object");
    store
        .get_object(bucket, &key, destination)
        .await
        .context("fetch", path)
}

/// Upload a local file to `path`
pub async fn store_file(
    store: &dyn ObjectStore,
    bucket: &str,
    source: &Path,
    path: &str,
    content_type: &str,
    separator: &str,
) -> Result<()> {
    let key = object_key(path, separator);
    if key.is_empty() {
        return Err(Error::Config("cannot store over the root directory".into()));
    }
    tracing::debug!(bucket, key = %key, content_type, "storing object");
    store
        .put_object(
            bucket,
            &key,
            ContentSource::File(source.to_path_buf()),
            content_type,
        )
        .await
        .context("store", path)
}
