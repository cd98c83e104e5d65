//! get command - Download an object
//!
//! The remote path is resolved against the working directory; the local path
//! is used as given.

use std::path::Path;

use objstor_core::{ops, Result};

use super::Context;

/// Execute the get command
pub(crate) async fn execute(ctx: &Context<'_>, remote: &str, local: &str) -> Result<()> {
    let path = ctx.resolve(remote);
    ops::fetch(ctx.store, ctx.bucket, &path, Path::new(local), ctx.separator()).await
}
