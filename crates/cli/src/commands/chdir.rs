//! chdir command - Resolve a new working directory
//!
//! The store has no directories to enter, so this only prints the canonical
//! path for the host program to remember. Nothing is checked remotely.

use std::io::Write;

use objstor_core::Result;

use super::Context;

/// Execute the chdir command
pub(crate) fn execute(ctx: &Context<'_>, target: &str, out: &mut dyn Write) -> Result<()> {
    let path = ctx.resolve(target);
    ctx.formatter.write_path(out, &path)
}
