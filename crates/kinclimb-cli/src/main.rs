//! `kinclimb` – command line front end for the locomotion rig.
//!
//! ```text
//! kinclimb replay <session.json> [--json]   replay a recorded skeleton session
//! kinclimb config                           show the effective configuration
//! kinclimb init [--force]                   write ~/.kinclimb/config.toml
//! kinclimb schema                           print the config JSON Schema
//! ```
//!
//! The configuration comes from `~/.kinclimb/config.toml` when present
//! (plus `KINCLIMB_*` overrides), defaults otherwise.

mod config;
mod replay;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use kinclimb_types::{KinError, RigConfig};
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "kinclimb", version)]
#[command(about = "Skeleton-driven climbing and walking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded skeleton session against a simulated wall
    Replay {
        /// Session file (JSON)
        path: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,

    /// Write the default configuration to ~/.kinclimb/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration JSON Schema
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); KINCLIMB_LOG_FORMAT=json switches to
    // newline-delimited JSON.  User-facing output still goes through println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("KINCLIMB_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    let result = match cli.command {
        Command::Replay { path, json } => run_replay(&path, json),
        Command::Config => show_config(),
        Command::Init { force } => run_init(force),
        Command::Schema => print_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            println!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Effective configuration: the vault file, or defaults if there is none.
fn effective_config() -> Result<RigConfig, KinError> {
    match config::load()? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = RigConfig::default();
            config::apply_env_overrides(&mut cfg);
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

fn run_replay(path: &Path, as_json: bool) -> Result<(), KinError> {
    let cfg = effective_config()?;
    let session = replay::Session::load(path)?;
    let summary = replay::replay(&session, cfg)?;
    if as_json {
        let out = serde_json::to_string_pretty(&summary)
            .map_err(|e| KinError::Serialization(e.to_string()))?;
        println!("{out}");
    } else {
        print_banner();
        println!("  Replayed {}", path.display().to_string().bold());
        summary.print();
    }
    Ok(())
}

fn show_config() -> Result<(), KinError> {
    print_banner();
    let path = config::config_path();
    if path.exists() {
        println!("  Config loaded from {}\n", path.display().to_string().bold());
    } else {
        println!("  {} Using defaults.\n", "No config file found.".dimmed());
    }
    let cfg = effective_config()?;
    let raw = toml::to_string_pretty(&cfg)
        .map_err(|e| KinError::Serialization(format!("Failed to serialize config: {}", e)))?;
    println!("{raw}");
    Ok(())
}

fn run_init(force: bool) -> Result<(), KinError> {
    let path = config::config_path();
    if path.exists() && !force {
        warn!(path = %path.display(), "Config already exists; not overwriting");
        println!(
            "  {} already exists.  Pass {} to overwrite it.",
            path.display().to_string().bold(),
            "--force".bold()
        );
        return Ok(());
    }
    config::save(&RigConfig::default())?;
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn print_schema() -> Result<(), KinError> {
    let schema = schemars::schema_for!(RigConfig);
    let out = serde_json::to_string_pretty(&schema)
        .map_err(|e| KinError::Serialization(e.to_string()))?;
    println!("{out}");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __   _              ___     __ "#.bold().cyan());
    println!("{}", r#"  / /__(_)__  ________/ (_)_ _  / /"#.bold().cyan());
    println!("{}", r#" /  '_/ / _ \/ __/ __/ / /  ' \/ _ \"#.bold().cyan());
    println!("{}", r#"/_/\_\/_/_//_/\__/\__/_/_/_/_/_/_.__/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "kinclimb".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Skeleton-driven climbing and walking");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("kinclimb").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn replay_flag_works_before_or_after_path() {
        for args in [
            &["replay", "--json", "session.json"][..],
            &["replay", "session.json", "--json"][..],
        ] {
            match parse(args).expect("parse").command {
                Command::Replay { path, json } => {
                    assert_eq!(path, PathBuf::from("session.json"));
                    assert!(json);
                }
                _ => panic!("expected replay for {args:?}"),
            }
        }
    }

    #[test]
    fn replay_requires_a_path() {
        assert!(parse(&["replay"]).is_err());
        assert!(parse(&["replay", "--json"]).is_err());
    }

    #[test]
    fn unknown_flags_and_commands_are_rejected() {
        assert!(parse(&["replay", "session.json", "--jsno"]).is_err());
        assert!(parse(&["schema", "--bogus"]).is_err());
        assert!(parse(&["climb"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn init_force_defaults_off() {
        assert!(matches!(parse(&["init"]).expect("parse").command, Command::Init { force: false }));
        assert!(matches!(
            parse(&["init", "--force"]).expect("parse").command,
            Command::Init { force: true }
        ));
        assert!(matches!(parse(&["config"]).expect("parse").command, Command::Config));
        assert!(matches!(parse(&["schema"]).expect("parse").command, Command::Schema));
    }
}
