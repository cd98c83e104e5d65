//! CLI definition and command routing
//!
//! The host program drives us with positional arguments only, so clap parses
//! a flat layout and the command name is routed by hand. Each command lives
//! in its own module and receives already split arguments.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use objstor_core::{ConfigManager, Error, ObjectStore, Overrides, Result, Settings};
use objstor_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::invocation::Invocation;
use crate::output::{Formatter, OutputConfig};

mod chdir;
mod delete;
mod get;
mod ls;
mod mkdir;
mod put;
mod rmdir;

/// objstor - filesystem-style commands for S3-compatible object storage
///
/// Usage: objstor <COMMAND> <PWD> [ARGS...] <BUCKET> <ACCESS_KEY>
///
/// The secret key is read from the PASSWORD environment variable.
#[derive(Parser, Debug)]
#[command(name = "objstor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage endpoint host or URL (overrides the config file)
    #[arg(long, env = "OBJSTOR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region used for request signing
    #[arg(long)]
    pub region: Option<String>,

    /// Path to the configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format: JSON instead of the ls-style layout
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// Secret key
    #[arg(long, env = "PASSWORD", hide = true, hide_env_values = true, default_value = "")]
    pub secret_key: String,

    /// COMMAND PWD [ARGS...] BUCKET ACCESS_KEY
    ///
    /// Options are only recognised before COMMAND; everything from COMMAND on
    /// is taken verbatim, so paths may start with a hyphen.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    pub args: Vec<String>,
}

/// Filesystem-style commands understood by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ls,
    Mkdir,
    Chdir,
    Rmdir,
    Delete,
    Get,
    Put,
}

impl Command {
    /// Number of command-specific arguments the command consumes
    pub const fn arity(self) -> usize {
        match self {
            Command::Get | Command::Put => 2,
            _ => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::Ls => "ls",
            Command::Mkdir => "mkdir",
            Command::Chdir => "chdir",
            Command::Rmdir => "rmdir",
            Command::Delete => "delete",
            Command::Get => "get",
            Command::Put => "put",
        }
    }

    /// Reject a wrong number of command arguments
    pub fn check_arity(self, given: usize) -> Result<()> {
        if given == self.arity() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "{} expects {} argument(s), got {given}",
                self.name(),
                self.arity()
            )))
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "ls" => Ok(Command::Ls),
            "mkdir" => Ok(Command::Mkdir),
            "chdir" => Ok(Command::Chdir),
            "rmdir" => Ok(Command::Rmdir),
            "delete" => Ok(Command::Delete),
            "get" => Ok(Command::Get),
            "put" => Ok(Command::Put),
            other => Err(Error::Config(format!("unknown command '{other}'"))),
        }
    }
}

/// Everything a command needs besides its own arguments
pub(crate) struct Context<'a> {
    pub store: &'a dyn ObjectStore,
    pub settings: &'a Settings,
    pub formatter: &'a Formatter,
    pub bucket: &'a str,
    pub working_dir: &'a str,
}

impl Context<'_> {
    /// Resolve a command argument against the caller's working directory
    pub fn resolve(&self, input: &str) -> String {
        objstor_core::resolve_with(self.working_dir, input, &self.settings.path_separator)
    }

    pub fn separator(&self) -> &str {
        &self.settings.path_separator
    }
}

/// Dispatches one invocation to its command
pub struct Router<'a> {
    store: &'a dyn ObjectStore,
    settings: &'a Settings,
    formatter: &'a Formatter,
}

impl<'a> Router<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        settings: &'a Settings,
        formatter: &'a Formatter,
    ) -> Self {
        Self {
            store,
            settings,
            formatter,
        }
    }

    /// Run `invocation`, writing command output to `out`
    ///
    /// The command name and argument count are checked before the store is
    /// contacted. The bucket must exist.
    pub async fn run(&self, invocation: &Invocation, out: &mut dyn Write) -> Result<()> {
        let command: Command = invocation.command.parse()?;
        command.check_arity(invocation.args.len())?;

        if !self.store.bucket_exists(&invocation.bucket).await? {
            return Err(Error::NotFound(format!("bucket {}", invocation.bucket)));
        }

        let ctx = Context {
            store: self.store,
            settings: self.settings,
            formatter: self.formatter,
            bucket: &invocation.bucket,
            working_dir: &invocation.working_dir,
        };
        let args = &invocation.args;

        tracing::debug!(
            command = command.name(),
            ?args,
            working_dir = %invocation.working_dir,
            "dispatching"
        );
        match command {
            Command::Ls => ls::execute(&ctx, &args[0], out).await,
            Command::Mkdir => mkdir::execute(&ctx, &args[0]).await,
            Command::Chdir => chdir::execute(&ctx, &args[0], out),
            Command::Rmdir => rmdir::execute(&ctx, &args[0]).await,
            Command::Delete => delete::execute(&ctx, &args[0]).await,
            Command::Get => get::execute(&ctx, &args[0], &args[1]).await,
            Command::Put => put::execute(&ctx, &args[0], &args[1]).await,
        }
    }
}

/// Execute the CLI invocation and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let mut formatter = Formatter::new(OutputConfig {
        json: cli.json,
        ..Default::default()
    });

    match run(cli, &mut formatter).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            let code = ExitCode::from_error(&e);
            tracing::error!(error = %e, exit_code = %code, "command failed");
            formatter.error(&e.to_string());
            code
        }
    }
}

async fn run(cli: Cli, formatter: &mut Formatter) -> Result<()> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new()?,
    };
    let config = manager.load()?;
    let settings = Settings::resolve(
        &config,
        &Overrides {
            endpoint: cli.endpoint,
            region: cli.region,
        },
    )?;
    *formatter = Formatter::new(OutputConfig {
        json: cli.json,
        time_format: settings.time_format.clone(),
    });

    let invocation = Invocation::from_args(cli.args, cli.secret_key)?;

    // Fail on bad commands before building a client
    let command: Command = invocation.command.parse()?;
    command.check_arity(invocation.args.len())?;

    let client = S3Client::new(&settings, &invocation.access_key, &invocation.secret_key).await?;
    let router = Router::new(&client, &settings, formatter);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    router.run(&invocation, &mut out).await?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use objstor_core::{ContentSource, ListingItem, ListingStream};

    #[test]
    fn test_command_from_str() {
        assert_eq!("ls".parse::<Command>().unwrap(), Command::Ls);
        assert_eq!("rmdir".parse::<Command>().unwrap(), Command::Rmdir);
        assert_eq!("put".parse::<Command>().unwrap(), Command::Put);
    }

    #[test]
    fn test_unknown_command_is_config_error() {
        let err = "frob".parse::<Command>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);

        // Names are case sensitive
        assert!("LS".parse::<Command>().is_err());
    }

    #[test]
    fn test_command_arity() {
        assert!(Command::Ls.check_arity(1).is_ok());
        assert!(Command::Ls.check_arity(2).is_err());
        assert!(Command::Get.check_arity(2).is_ok());
        assert!(Command::Put.check_arity(1).is_err());
    }

    #[test]
    fn test_cli_layout() {
        let cli = Cli::try_parse_from([
            "objstor",
            "get",
            "/home",
            "remote.txt",
            "/tmp/local.txt",
            "bukkit",
            "AK",
        ])
        .unwrap();
        assert_eq!(
            cli.args,
            vec!["get", "/home", "remote.txt", "/tmp/local.txt", "bukkit", "AK"]
        );

        let inv = Invocation::from_args(cli.args, "SK").unwrap();
        assert_eq!(inv.command, "get");
        assert_eq!(inv.working_dir, "/home");
        assert_eq!(inv.args, vec!["remote.txt", "/tmp/local.txt"]);
    }

    #[test]
    fn test_cli_requires_bucket_and_key() {
        let cli = Cli::try_parse_from(["objstor", "ls", "/"]).unwrap();
        let err = Invocation::from_args(cli.args, "").unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);

        assert!(Cli::try_parse_from(["objstor"]).is_err());
    }

    #[test]
    fn test_cli_options_before_positionals() {
        let cli = Cli::try_parse_from([
            "objstor",
            "--endpoint",
            "http://localhost:9000",
            "--json",
            "ls",
            "/",
            ".",
            "bukkit",
            "AK",
        ])
        .unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(cli.json);
        assert_eq!(cli.args.len(), 5);
    }

    fn command_args(argv: &[&str]) -> (Cli, Invocation) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let inv = Invocation::from_args(cli.args.clone(), "").unwrap();
        (cli, inv)
    }

    #[test]
    fn test_cli_hyphen_arguments_stay_positional() {
        let (_, inv) = command_args(&["objstor", "put", "/", "-h", "remote", "bukkit", "AK"]);
        assert_eq!(inv.args, vec!["-h", "remote"]);

        let (cli, inv) = command_args(&["objstor", "chdir", "/", "--json", "bukkit", "AK"]);
        assert!(!cli.json);
        assert_eq!(inv.args, vec!["--json"]);

        let (cli, inv) = command_args(&["objstor", "ls", "-V", "--debug", "bukkit", "AK"]);
        assert!(!cli.debug);
        assert_eq!(inv.working_dir, "-V");
        assert_eq!(inv.args, vec!["--debug"]);
    }

    /// In-memory bucket keyed by object key
    #[derive(Default)]
    struct MemoryStore {
        bucket: String,
        objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
        removed: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn with_keys(keys: &[&str]) -> Self {
            let store = Self {
                bucket: "bukkit".into(),
                ..Default::default()
            };
            {
                let mut objects = store.objects.lock().unwrap();
                for key in keys {
                    objects.insert(key.to_string(), (b"data".to_vec(), "text/plain".into()));
                }
            }
            store
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
            Ok(bucket == self.bucket)
        }

        async fn list_objects(
            &self,
            _bucket: &str,
            prefix: &str,
            recursive: bool,
        ) -> Result<ListingStream> {
            let objects = self.objects.lock().unwrap();
            let mut items: Vec<Result<ListingItem>> = Vec::new();
            let mut seen_prefixes = Vec::new();
            for (key, (data, _)) in objects.range(prefix.to_string()..) {
                let Some(rest) = key.strip_prefix(prefix) else {
                    break;
                };
                match rest.find('/') {
                    Some(idx) if !recursive => {
                        let common = format!("{prefix}{}", &rest[..=idx]);
                        if !seen_prefixes.contains(&common) {
                            seen_prefixes.push(common.clone());
                            items.push(Ok(ListingItem::prefix(common)));
                        }
                    }
                    _ => items.push(Ok(
                        ListingItem::object(key.clone(), data.len() as i64).with_owner("backup")
                    )),
                }
            }
            Ok(ListingStream::from_items(items))
        }

        async fn remove_object(&self, _bucket: &str, key: &str) -> Result<()> {
            self.removed.lock().unwrap().push(key.to_string());
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        async fn put_object(
            &self,
            _bucket: &str,
            key: &str,
            source: ContentSource,
            content_type: &str,
        ) -> Result<()> {
            let data = match source {
                ContentSource::Bytes(data) => data,
                ContentSource::File(path) => std::fs::read(path)?,
            };
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (data, content_type.to_string()));
            Ok(())
        }

        async fn get_object(&self, _bucket: &str, key: &str, destination: &Path) -> Result<()> {
            let data = self
                .objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(data, _)| data.clone())
                .ok_or_else(|| Error::NotFound(key.to_string()))?;
            std::fs::write(destination, data)?;
            Ok(())
        }
    }

    fn invocation(command: &str, pwd: &str, args: &[&str]) -> Invocation {
        let mut rest: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        rest.push("bukkit".into());
        rest.push("AK".into());
        Invocation::new(command, pwd, rest, "SK").unwrap()
    }

    async fn run_router(store: &MemoryStore, inv: &Invocation) -> (Result<()>, String) {
        let settings = Settings::default();
        let formatter = Formatter::default();
        let router = Router::new(store, &settings, &formatter);
        let mut out = Vec::new();
        let result = router.run(inv, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_router_unknown_command() {
        let store = MemoryStore::with_keys(&[]);
        let (result, out) = run_router(&store, &invocation("frob", "/", &["x"])).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_router_wrong_arity() {
        let store = MemoryStore::with_keys(&[]);
        let (result, _) = run_router(&store, &invocation("get", "/", &["only-one"])).await;
        assert_eq!(result.unwrap_err().exit_code(), 2);
    }

    #[tokio::test]
    async fn test_router_missing_bucket() {
        let store = MemoryStore {
            bucket: "other".into(),
            ..Default::default()
        };
        let (result, _) = run_router(&store, &invocation("ls", "/", &["."])).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_chdir_prints_resolved_path() {
        let store = MemoryStore::with_keys(&[]);
        let inv = invocation("chdir", "/home/user", &["../docs/./x/"]);
        let (result, out) = run_router(&store, &inv).await;
        result.unwrap();
        assert_eq!(out, "/home/docs/x\n");
    }

    #[tokio::test]
    async fn test_ls_emits_one_line_per_child() {
        let store = MemoryStore::with_keys(&["dir/", "dir/a.txt", "dir/b.txt", "dirt.txt"]);
        let (result, out) = run_router(&store, &invocation("ls", "/", &["dir"])).await;
        result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" dir/a.txt"));
        assert!(lines[1].ends_with(" dir/b.txt"));
    }

    #[tokio::test]
    async fn test_ls_root_groups_prefixes() {
        let store = MemoryStore::with_keys(&["a/1", "a/2", "top.txt"]);
        let (result, out) = run_router(&store, &invocation("ls", "/a", &[".."])).await;
        result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a/"));
        assert!(lines[1].ends_with(" top.txt"));
    }

    #[tokio::test]
    async fn test_ls_on_object_path_lists_the_object() {
        let store = MemoryStore::with_keys(&["docs/a.txt", "docs/a.txt.bak", "docs/b.txt"]);
        let (result, out) = run_router(&store, &invocation("ls", "/docs", &["a.txt"])).await;
        result.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" docs/a.txt"));
    }

    #[tokio::test]
    async fn test_mkdir_writes_marker() {
        let store = MemoryStore::with_keys(&[]);
        let (result, _) = run_router(&store, &invocation("mkdir", "/test", &["folder"])).await;
        result.unwrap();

        let objects = store.objects.lock().unwrap();
        let (data, content_type) = objects.get("test/folder/").unwrap();
        assert!(data.is_empty());
        assert_eq!(content_type, objstor_core::DIRECTORY_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_rmdir_removes_prefix_only() {
        let store = MemoryStore::with_keys(&["a/", "a/x", "a/sub/y", "ab/z", "b"]);
        let (result, _) = run_router(&store, &invocation("rmdir", "/", &["a"])).await;
        result.unwrap();

        assert_eq!(store.keys(), vec!["ab/z", "b"]);
        assert_eq!(store.removed.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_single_object() {
        let store = MemoryStore::with_keys(&["docs/a.txt", "docs/b.txt"]);
        let (result, _) = run_router(&store, &invocation("delete", "/docs", &["a.txt"])).await;
        result.unwrap();
        assert_eq!(store.keys(), vec!["docs/b.txt"]);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "hello\n").unwrap();
        let source = source.to_string_lossy().to_string();

        let store = MemoryStore::with_keys(&[]);
        let inv = invocation("put", "/docs", &[source.as_str(), "notes.txt"]);
        let (result, _) = run_router(&store, &inv).await;
        result.unwrap();
        {
            let objects = store.objects.lock().unwrap();
            let (_, content_type) = objects.get("docs/notes.txt").unwrap();
            assert_eq!(content_type, "text/plain; charset=utf-8");
        }

        let destination = dir.path().join("copy.txt");
        let destination = destination.to_string_lossy().to_string();
        let inv = invocation("get", "/", &["docs/notes.txt", destination.as_str()]);
        let (result, _) = run_router(&store, &inv).await;
        result.unwrap();
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn test_get_missing_object_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out").to_string_lossy().to_string();
        let store = MemoryStore::with_keys(&[]);
        let inv = invocation("get", "/", &["nope", destination.as_str()]);
        let (result, _) = run_router(&store, &inv).await;

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("/nope"));
    }
}
