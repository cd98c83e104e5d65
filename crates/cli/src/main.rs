//! objstor - filesystem-style commands for object storage
//!
//! Maps ls, mkdir, chdir, rmdir, delete, get and put onto an S3-compatible
//! bucket for a host program that only speaks in paths.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use objstor_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries command output, so logs go to stderr
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
