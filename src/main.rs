//! namedsql CLI Entry Point
//!
//! Subcommands:
//! - `rewrite` - Convert a `:name` template to `?` form with its parameter list
//! - `bind` - Rewrite, then resolve each parameter from a JSON object
//! - `config` - Show or interactively create settings
//! - `mcp` - MCP server mode (hidden, for AI agent integration)
//!
//! All output to stdout is JSON-only. Logs go to stderr.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use dialoguer::{Confirm, Input};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

use namedsql::config::{load_settings, save_settings, ConfigLocation, Settings, SettingsFile};
use namedsql::{ErrorEnvelope, Metadata, NamedSqlError, Result, SuccessEnvelope};

/// namedsql - Named SQL parameter rewriter
#[derive(Parser)]
#[command(name = "namedsql")]
#[command(about = "Rewrite :named SQL placeholders into positional ? form")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the template comes from, plus scanner overrides
#[derive(Args)]
struct TemplateArgs {
    /// SQL template text
    #[arg(long, conflicts_with = "file")]
    sql: Option<String>,

    /// Read the SQL template from a file (stdin if neither --sql nor --file)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Treat -- and /* */ comments as opaque
    #[arg(long)]
    comments: bool,

    /// Backslash escapes the next character inside string literals
    #[arg(long)]
    backslash_escapes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a template and list its parameters
    Rewrite {
        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Rewrite a template and bind values from a JSON object
    Bind {
        #[command(flatten)]
        template: TemplateArgs,

        /// JSON object of parameter values, e.g. '{"id": 42}'
        #[arg(long, conflicts_with = "params_file", required_unless_present = "params_file")]
        params: Option<String>,

        /// Read the JSON parameter object from a file
        #[arg(long)]
        params_file: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start MCP server (hidden from help, for AI agent integration)
    #[command(hide = true)]
    Mcp,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings and where they are read from
    Show,

    /// Create a settings file interactively
    Init {
        /// Write the per-user file instead of the project file
        #[arg(long)]
        global: bool,
    },
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Rewrite { .. } => "rewrite",
            Self::Bind { .. } => "bind",
            Self::Config { .. } => "config",
            Self::Mcp => "mcp",
        }
    }
}

/// Command payload plus the placeholder count for metadata
type Outcome = (Value, Option<usize>);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    namedsql::logging::init(cli.verbose);

    let Some(command) = cli.command else {
        let err = NamedSqlError::invalid_input(
            "No subcommand provided. Use --help to see available commands.",
        );
        print_json(&ErrorEnvelope::from_error("", &err));
        return ExitCode::FAILURE;
    };

    if let Commands::Mcp = command {
        return match namedsql::mcp::serve().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("MCP server failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let name = command.name();
    let started = Instant::now();

    match run(command) {
        Ok((data, params_found)) => {
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let meta = match params_found {
                Some(count) => Metadata::with_params(elapsed, count),
                None => Metadata::new(elapsed),
            };
            print_json(&SuccessEnvelope::new(name, data, meta));
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_json(&ErrorEnvelope::from_error(name, &err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<Outcome> {
    match command {
        Commands::Rewrite { template } => {
            let (settings, sql) = prepare(&template)?;
            let rewritten = settings.rewrite(&sql)?;
            let count = rewritten.placeholder_count();
            Ok((to_value(&rewritten)?, Some(count)))
        }
        Commands::Bind { template, params, params_file } => {
            let (settings, sql) = prepare(&template)?;
            let values = read_params(params, params_file)?;
            let bound = settings.bind(&sql, &values)?;
            let count = bound.params.len();
            Ok((to_value(&bound)?, Some(count)))
        }
        Commands::Config { action: ConfigAction::Show } => {
            let settings = load_settings()?;
            let data = serde_json::json!({
                "settings": settings,
                "local": ConfigLocation::Local.path()?,
                "global": ConfigLocation::Global.path().ok(),
            });
            Ok((data, None))
        }
        Commands::Config { action: ConfigAction::Init { global } } => {
            let location = if global { ConfigLocation::Global } else { ConfigLocation::Local };
            let file = prompt_settings()?;
            let path = save_settings(location, &file)?;
            Ok((serde_json::json!({ "saved": path, "settings": file }), None))
        }
        Commands::Mcp => Err(NamedSqlError::invalid_input("mcp runs as a server")),
    }
}

/// Resolve settings (files, then flags) and read the template
fn prepare(args: &TemplateArgs) -> Result<(Settings, String)> {
    let mut settings = load_settings()?;
    if args.comments {
        settings.rewrite.skip_comments = true;
    }
    if args.backslash_escapes {
        settings.rewrite.backslash_escapes = true;
    }

    let sql = match (&args.sql, &args.file) {
        (Some(sql), _) => sql.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            NamedSqlError::invalid_input(format!("Could not read {}: {e}", path.display()))
        })?,
        (None, None) => read_stdin()?,
    };

    Ok((settings, sql))
}

fn read_stdin() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(NamedSqlError::invalid_input(
            "No template given. Use --sql, --file, or pipe the template on stdin.",
        ));
    }
    io::read_to_string(stdin)
        .map_err(|e| NamedSqlError::invalid_input(format!("Could not read stdin: {e}")))
}

fn read_params(inline: Option<String>, file: Option<PathBuf>) -> Result<Map<String, Value>> {
    let text = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path).map_err(|e| {
            NamedSqlError::invalid_input(format!("Could not read {}: {e}", path.display()))
        })?,
        (None, None) => return Err(NamedSqlError::invalid_input("--params is required")),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(NamedSqlError::invalid_input("Parameters must be a JSON object")),
        Err(e) => Err(NamedSqlError::invalid_input(format!("Invalid parameters JSON: {e}"))),
    }
}

fn prompt_settings() -> Result<SettingsFile> {
    let prompt_err = |e: dialoguer::Error| NamedSqlError::invalid_input(format!("Prompt failed: {e}"));

    let skip_comments = Confirm::new()
        .with_prompt("Ignore placeholders inside -- and /* */ comments?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let backslash_escapes = Confirm::new()
        .with_prompt("Treat backslash as an escape inside string literals (MySQL)?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let limit: String = Input::new()
        .with_prompt("Maximum template size in bytes (empty for no limit)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let max_template_bytes = match limit.trim() {
        "" => None,
        text => Some(text.parse::<usize>().map_err(|e| {
            NamedSqlError::invalid_input(format!("Invalid size limit '{text}': {e}"))
        })?),
    };

    Ok(SettingsFile {
        skip_comments: Some(skip_comments),
        backslash_escapes: Some(backslash_escapes),
        max_template_bytes,
    })
}

fn to_value(data: &impl Serialize) -> Result<Value> {
    serde_json::to_value(data)
        .map_err(|e| NamedSqlError::invalid_input(format!("Could not serialize output: {e}")))
}

fn print_json(envelope: &impl Serialize) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("could not serialize output envelope: {e}"),
    }
}
