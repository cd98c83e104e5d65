//! ls command - List a directory
//!
//! Prints one line per immediate child of the resolved directory. Nested
//! directories show up as common prefixes.

use std::io::Write;

use objstor_core::{ops, Result};

use super::Context;

/// Execute the ls command
pub(crate) async fn execute(ctx: &Context<'_>, target: &str, out: &mut dyn Write) -> Result<()> {
    let path = ctx.resolve(target);
    let count = ops::list_directory(ctx.store, ctx.bucket, &path, ctx.separator(), |item| {
        ctx.formatter.write_item(&mut *out, item)
    })
    .await?;

    tracing::debug!(path = %path, count, "listed directory");
    Ok(())
}
