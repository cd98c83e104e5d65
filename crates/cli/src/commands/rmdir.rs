//! rmdir command - Remove a directory recursively
//!
//! Deletes the marker and every object under the directory prefix. Stops at
//! the first failed delete.

use objstor_core::{ops, Result};

use super::Context;

/// Execute the rmdir command
pub(crate) async fn execute(ctx: &Context<'_>, target: &str) -> Result<()> {
    let path = ctx.resolve(target);
    if objstor_core::path::is_root(&path, ctx.separator()) {
        tracing::warn!(bucket = ctx.bucket, "removing the root directory empties the bucket");
    }

    let removed = ops::remove_directory(ctx.store, ctx.bucket, &path, ctx.separator()).await?;
    tracing::info!(path = %path, removed, "directory removed");
    Ok(())
}
