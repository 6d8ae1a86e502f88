//! Modhost CLI - scan, list and run script modules.
//!
//! Each subcommand is a thin wrapper over one `ModuleService` operation. On
//! failure the `{kind, message}` report is printed (as JSON with
//! `--format json`) and the process exits non-zero.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modhost_config::{Config, ShowFormat};
use modhost_modules::ModuleService;
use modhost_telemetry::{LogConfig, LogFormat, RequestContext, RequestGuard};

mod commands;
mod config_bridge;
mod formatter;
mod theme;

use commands::{config, exec, functions, list, prompt, run, scan};
use formatter::OutputFormat;
use theme::Theme;

/// Modhost - dynamic script module host
#[derive(Parser)]
#[command(name = "modhost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty (default) or json
    #[arg(long, global = true, default_value = "pretty")]
    format: OutputFormat,

    /// Workspace root for config discovery and relative paths
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the module root and rebuild the registry
    Scan,

    /// List registered modules
    List,

    /// List the functions a module exposes
    Functions {
        /// Registered module name
        module: String,
    },

    /// Call a function on a registered module
    Exec {
        /// Registered module name
        module: String,

        /// Function to call
        function: String,

        /// Positional arguments as a JSON array
        #[arg(long)]
        args: Option<String>,

        /// Keyword arguments as a JSON object
        #[arg(long)]
        kwargs: Option<String>,
    },

    /// Run a module file directly from a subfolder of the module root
    Run {
        /// Subfolder under the module root
        subfolder: String,

        /// Module file name without extension
        module: String,

        /// Function to call
        function: String,
    },

    /// Pick a module and function interactively
    Prompt,

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration (TOML, or JSON with `--format json`)
    Show,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::List => "list",
            Self::Functions { .. } => "functions",
            Self::Exec { .. } => "exec",
            Self::Run { .. } => "run",
            Self::Prompt => "prompt",
            Self::Config { .. } => "config",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter::print_failure(&e, format);
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let workspace_root = match cli.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    // A broken config still gets logging; commands that need it fail below.
    let loaded = Config::load(Some(&workspace_root));
    let cfg = loaded.as_ref().map(|r| r.config.clone()).ok();

    let log_config = if let Some(cfg) = &cfg {
        let mut lc = config_bridge::to_log_config(cfg, &workspace_root);
        if cli.verbose {
            "debug".clone_into(&mut lc.level);
        }
        lc
    } else {
        let level = if cli.verbose { "debug" } else { "warn" };
        LogConfig::new(level).with_format(LogFormat::Compact)
    };
    if let Err(e) = modhost_telemetry::setup_logging(&log_config) {
        eprintln!("{}", Theme::warning(&format!("Failed to initialize logging: {e}")));
    }

    let _guard = RequestGuard::new(
        RequestContext::new("cli")
            .with_operation(cli.command.name())
            .with_metadata("workspace", workspace_root.display().to_string()),
    );

    let workspace = workspace_root.as_path();
    let service = move || -> Result<ModuleService> {
        let cfg = loaded?.config;
        let service = ModuleService::new(config_bridge::to_service_settings(&cfg, workspace));
        tracing::debug!(
            registry = %service.registry().path().display(),
            modules_root = %service.settings().modules_root.display(),
            "module service ready"
        );
        Ok(service)
    };

    match cli.command {
        Commands::Scan => scan::run_scan(&service()?, cli.format),
        Commands::List => list::list_modules(&service()?, cli.format),
        Commands::Functions { module } => {
            functions::list_functions(&service()?, &module, cli.format)
        },
        Commands::Exec {
            module,
            function,
            args,
            kwargs,
        } => exec::run_exec(
            &service()?,
            &module,
            &function,
            args.as_deref(),
            kwargs.as_deref(),
            cli.format,
        ),
        Commands::Run {
            subfolder,
            module,
            function,
        } => run::run_direct(&service()?, &subfolder, &module, &function, cli.format),
        Commands::Prompt => prompt::run_prompt(&service()?, cli.format),
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            let show = match cli.format {
                OutputFormat::Pretty => ShowFormat::Toml,
                OutputFormat::Json => ShowFormat::Json,
            };
            config::show_config(workspace, show)
        },
    }
}
