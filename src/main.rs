mod commands;
mod common;
mod completions;
mod display;
mod platform;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};

use crate::commands::DisplayCommand;
use crate::common::config::DispmodeConfig;
use crate::platform::Backend;
use crate::ui::prelude::*;

/// Query and change display modes
#[derive(Parser, Debug)]
#[command(name = "dispmode", author, version, about, long_about = None)]
struct Cli {
    /// Print debug information
    #[arg(long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Read displays from a snapshot file instead of the compositor
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    snapshot: Option<PathBuf>,

    /// Display backend
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Display(DisplayCommand),

    /// Run show/set commands from a file, set commands first
    Script {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            emit(Level::Error, "config.load", &format!("{e:#}"), None);
            std::process::exit(1);
        }
    };

    ui::init(
        cli.format.unwrap_or(config.format),
        config.color && !cli.no_color,
    );
    ui::set_debug_mode(cli.debug);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = dispatch(cli, &config).await {
        emit(Level::Error, "dispmode.error", &format!("Error: {e:#}"), None);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<DispmodeConfig> {
    match &cli.config {
        Some(path) => DispmodeConfig::load_from_path(common::paths::expand_path(path)),
        None => DispmodeConfig::load(),
    }
}

async fn dispatch(cli: Cli, config: &DispmodeConfig) -> Result<()> {
    match cli.command {
        Commands::Completions { shell } => completions::generate(shell, &mut std::io::stdout()),
        Commands::Display(command) => {
            let service = connect(&cli.backend, &cli.snapshot, config)?;
            commands::run(&command, service.as_ref(), config).await
        }
        Commands::Script { file } => {
            let service = connect(&cli.backend, &cli.snapshot, config)?;
            commands::run_script(&common::paths::expand_path(&file), service.as_ref(), config).await
        }
    }
}

fn connect(
    backend: &Option<Backend>,
    snapshot: &Option<PathBuf>,
    config: &DispmodeConfig,
) -> Result<Box<dyn platform::DisplayService>> {
    let snapshot = snapshot
        .as_deref()
        .map(common::paths::expand_path)
        .or_else(|| config.snapshot_path());
    let service = platform::connect(backend.unwrap_or(config.backend), snapshot)
        .context("Failed to connect to a display backend")?;
    emit(
        Level::Debug,
        "platform.connected",
        &format!("Using {} backend", service.name()),
        None,
    );
    Ok(service)
}
