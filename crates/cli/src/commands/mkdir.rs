//! mkdir command - Create a directory marker

use objstor_core::{ops, Result};

use super::Context;

/// Execute the mkdir command
pub(crate) async fn execute(ctx: &Context<'_>, target: &str) -> Result<()> {
    let path = ctx.resolve(target);
    ops::make_directory(ctx.store, ctx.bucket, &path, ctx.separator()).await
}
