//! Purpose: `gamelink` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

use gamelink::api::{
    DynModule, Error, ErrorKind, ModuleRegistry, Startup, StartupOptions, probe, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(name = "gamelink", version, about = "Module resolution and interface inspection")]
struct Cli {
    /// Working directory holding the artifacts/ tree.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    workdir: Option<PathBuf>,

    /// Config document path (default: <workdir>/gamelink.json).
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Root of a bundled content cache for artifact installation.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a module identifier to its on-disk artifact.
    Resolve {
        /// Module identifier, as the host names its directory.
        identifier: String,

        /// Artifact override, beating both the registry and the config
        /// document.
        #[arg(long = "override", value_name = "PATH", value_hint = ValueHint::FilePath)]
        override_artifact: Option<PathBuf>,

        /// Disable auto-detection regardless of the config document.
        #[arg(long)]
        no_autodetect: bool,
    },
    /// List the built-in module registry.
    Modules {
        /// Only show entries matching this identifier.
        identifier: Option<String>,
    },
    /// Report which negotiation entry points an artifact exports.
    Probe {
        /// Path to a module artifact.
        #[arg(value_hint = ValueHint::FilePath)]
        artifact: PathBuf,
    },
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(RunOutcome::ok());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(err.to_string()));
            }
        },
    };

    let workdir = match cli.workdir {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to determine working directory")
                .with_source(err)
        })?,
    };
    let config_path = cli
        .config
        .unwrap_or_else(|| workdir.join("gamelink.json"));

    match cli.command {
        Command::Resolve {
            identifier,
            override_artifact,
            no_autodetect,
        } => {
            let startup = Startup::prepare(StartupOptions {
                identifier: identifier.clone(),
                working_directory: workdir,
                config_path,
                cache_root: cli.cache,
                override_artifact,
                autodetect: no_autodetect.then_some(false),
            })?;
            let resolved = startup.resolve()?;
            let mut inner = Map::new();
            inner.insert("identifier".to_string(), json!(identifier));
            inner.insert(
                "artifact".to_string(),
                json!(resolved.artifact_path.display().to_string()),
            );
            inner.insert(
                "canonical".to_string(),
                json!(resolved.canonical_path.display().to_string()),
            );
            inner.insert("source".to_string(), json!(resolved.source.tag()));
            inner.insert("description".to_string(), json!(resolved.description));
            emit(json!({ "module": Value::Object(inner) }));
            Ok(RunOutcome::ok())
        }
        Command::Modules { identifier } => {
            let registry = ModuleRegistry::builtin();
            let entries: Vec<Value> = registry
                .entries()
                .iter()
                .filter(|entry| {
                    identifier
                        .as_deref()
                        .is_none_or(|wanted| entry.identifier.eq_ignore_ascii_case(wanted))
                })
                .map(|entry| {
                    json!({
                        "identifier": entry.identifier,
                        "linux": entry.linux_artifact,
                        "windows": entry.windows_artifact,
                        "description": entry.description,
                    })
                })
                .collect();
            emit(json!({ "modules": entries }));
            Ok(RunOutcome::ok())
        }
        Command::Probe { artifact } => {
            let module = DynModule::open(&artifact)?;
            let report = probe(&module);
            emit(json!({
                "artifact": artifact.display().to_string(),
                "symbols": {
                    "exchange": report.exchange,
                    "extended": report.extended,
                    "entity_v2": report.entity_v2,
                    "entity_legacy": report.entity_legacy,
                },
            }));
            if report.exchange && (report.entity_v2 || report.entity_legacy) {
                Ok(RunOutcome::ok())
            } else {
                // Artifact loads but could never negotiate.
                Ok(RunOutcome::with_code(to_exit_code(
                    ErrorKind::NoEntityInterface,
                )))
            }
        }
    }
}

fn emit(value: Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(symbol) = err.symbol() {
        inner.insert("symbol".to_string(), json!(symbol));
    }
    if let Some((wanted, got)) = err.versions() {
        inner.insert("wanted".to_string(), json!(wanted));
        inner.insert("got".to_string(), json!(got));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "module not found".to_string(),
        ErrorKind::Install => "artifact installation failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Load => "failed to load module".to_string(),
        ErrorKind::EntryPointMissing => "entry point missing".to_string(),
        ErrorKind::VersionMismatch => "interface version mismatch".to_string(),
        ErrorKind::NoEntityInterface => "no entity interface".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}
