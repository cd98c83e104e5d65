//! put command - Upload a local file
//!
//! The object's content type is sniffed from the file before upload.

use std::path::Path;

use objstor_core::{ops, Result};

use super::Context;
use crate::sniff;

/// Execute the put command
pub(crate) async fn execute(ctx: &Context<'_>, local: &str, remote: &str) -> Result<()> {
    let source = Path::new(local);
    let path = ctx.resolve(remote);
    let content_type = sniff::content_type(source)?;

    ops::store_file(ctx.store, ctx.bucket, source, &path, &content_type, ctx.separator()).await
}
