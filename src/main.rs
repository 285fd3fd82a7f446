use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use intervox::app::{RunOptions, run_interview};
use intervox::cli::{Cli, Commands, ConfigAction};
use intervox::config::Config;
use intervox::output::OutputMode;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        None => {
            let mut config = load_config(cli.config.as_deref())?;
            RunOptions {
                resume: cli.resume,
                job_description: cli.job_description,
                max_questions: cli.max_questions,
                silence: cli.silence,
                oracle: cli.oracle,
                voice: cli.voice,
                mute: cli.mute,
                transcript_dir: cli.transcript_dir,
            }
            .apply(&mut config);

            let mode = if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Human {
                    color: std::io::stdout().is_terminal(),
                }
            };
            if !cli.json && !cli.quiet && std::io::stdin().is_terminal() {
                eprintln!(
                    "{}",
                    "Type your answers, one line at a time. Ctrl-D ends the interview.".dimmed()
                );
            }
            run_interview(config, mode).context("interview failed")?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "intervox",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the -q/-v flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("intervox={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/intervox/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides apply on top of all three.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
