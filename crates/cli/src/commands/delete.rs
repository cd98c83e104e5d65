//! delete command - Remove a single object

use objstor_core::{ops, Result};

use super::Context;

/// Execute the delete command
pub(crate) async fn execute(ctx: &Context<'_>, target: &str) -> Result<()> {
    let path = ctx.resolve(target);
    ops::remove(ctx.store, ctx.bucket, &path, ctx.separator()).await
}
