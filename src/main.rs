// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OG main entry point - CLI and commands.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;

use og::config::{self, CliOptions, Verbosity};
use og::error::ConfigError;
use og::session::Session;
use og::telemetry::{bootstrap_subscriber, init_telemetry, TelemetryConfig};
use og::tui::TerminalConsole;

/// OG - run an agent on a request, approving every action yourself.
#[derive(Parser, Debug)]
#[command(name = "og")]
#[command(author, version, about = "Run a planning agent on a request with human approval of every action", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Verbosity: debug, info, warn or none
    #[arg(long, global = true, env = "OG_VERBOSITY")]
    verbosity: Option<Verbosity>,

    /// Path to the agent entry point
    #[arg(long, global = true, env = "OG_AGENT_PATH")]
    agent_path: Option<PathBuf>,

    /// Ask the agent for a condensed final summary
    #[arg(long, global = true, overrides_with = "no_summary_mode")]
    summary_mode: bool,

    /// Ask the agent for the full final summary
    #[arg(long, global = true)]
    no_summary_mode: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    show_config: bool,

    /// The request, in natural language. Only a leading `init` is read as a subcommand.
    #[arg(value_name = "PROMPT", trailing_var_arg = true)]
    prompt: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn cli_options(&self) -> CliOptions {
        let summary_mode = if self.summary_mode {
            Some(true)
        } else if self.no_summary_mode {
            Some(false)
        } else {
            None
        };

        CliOptions {
            verbosity: self.verbosity,
            agent_path: self.agent_path.clone(),
            summary_mode,
        }
    }
}

/// Subcommands for og.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default config to ~/.local/share/og/og_config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cli_options = cli.cli_options();

    if let Some(command) = cli.command {
        handle_command(command)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.show_config {
        show_config(cli_options)?;
        return Ok(ExitCode::SUCCESS);
    }

    let query = cli.prompt.join(" ");
    if query.trim().is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    let config = match tracing::subscriber::with_default(bootstrap_subscriber(), || {
        config::load_config(cli_options)
    }) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            eprintln!("{} {}", "No configuration found at".red(), path);
            eprintln!("Run {} to create one.", "og init".cyan());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    // A subscriber may already be installed when embedded; logging then goes there.
    let _telemetry = init_telemetry(&TelemetryConfig::for_verbosity(config.verbosity)).ok();

    let session = Session::new(config, Arc::new(TerminalConsole::new()));
    let report = session.run(&query).await?;

    Ok(ExitCode::from(report.exit_code() as u8))
}

fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => {
            let data_dir = config::get_data_dir().ok_or(ConfigError::NoHomeDir)?;
            match config::init_config(&data_dir, force) {
                Ok(path) => println!("{} {}", "Created config file:".green(), path.display()),
                Err(ConfigError::AlreadyExists(path)) => {
                    println!("{} {}", "Config file already exists:".yellow(), path);
                    println!("Use {} to overwrite it.", "og init --force".cyan());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

fn show_config(cli_options: CliOptions) -> anyhow::Result<()> {
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        match config::load_config(cli_options.clone()) {
            Err(ConfigError::NotFound(_)) => {
                eprintln!("{}", "No config file found; showing defaults.".yellow());
                let data_dir = config::default_data_dir();
                Ok(config::merge_config(Default::default(), cli_options, &data_dir))
            }
            other => other,
        }
    })?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
