//! Process argument layout
//!
//! The host program calls us as
//! `objstor <COMMAND> <PWD> [ARGS...] <BUCKET> <ACCESS_KEY>` with the secret
//! key in the `PASSWORD` environment variable. Bucket and access key are
//! taken from the back; everything between the working directory and the
//! bucket belongs to the command.

use objstor_core::{Error, Result};

/// One parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub working_dir: String,
    pub args: Vec<String>,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl Invocation {
    /// Build an invocation from the raw positionals, command name first
    pub fn from_args(args: Vec<String>, secret_key: impl Into<String>) -> Result<Self> {
        let mut args = args.into_iter();
        let (Some(command), Some(working_dir)) = (args.next(), args.next()) else {
            return Err(Error::Config(
                "expected <COMMAND> <PWD> [ARGS...] <BUCKET> <ACCESS_KEY>".into(),
            ));
        };
        Self::new(command, working_dir, args.collect(), secret_key)
    }

    /// Split the trailing positionals into command arguments, bucket and access key
    pub fn new(
        command: impl Into<String>,
        working_dir: impl Into<String>,
        mut rest: Vec<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        if rest.len() < 2 {
            return Err(Error::Config(
                "expected <BUCKET> <ACCESS_KEY> after the command arguments".into(),
            ));
        }

        let access_key = rest.pop().unwrap_or_default();
        let bucket = rest.pop().unwrap_or_default();

        Ok(Self {
            command: command.into(),
            working_dir: working_dir.into(),
            args: rest,
            bucket,
            access_key,
            secret_key: secret_key.into(),
        })
    }
}
