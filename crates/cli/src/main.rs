//! astguard CLI
//!
//! Matches YAML rule files against Go-like source files and prints the
//! findings.

mod commands;
mod config;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use astguard_rules::RuleSet;
use astguard_rules_yaml::YamlFrontend;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;

/// astguard: rule-driven structural matching for source files.
#[derive(Parser, Debug)]
#[command(name = "astguard", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "ASTGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Rule file to load; may be repeated. Replaces the config file's list.
    #[arg(long = "rules", short = 'r', value_name = "FILE", global = true)]
    rules: Vec<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match the loaded rules against source files.
    Check(commands::check::CheckArgs),
    /// Inspect the loaded rules.
    Rules(commands::rules::RulesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let rules = load_rules(&config.rule_files(&cli.rules))?;

    match cli.command {
        Command::Check(args) => commands::check::run(rules, &config, &args, &cli.format).await,
        Command::Rules(args) => commands::rules::run(&rules, &args, &cli.format),
    }
}

fn load_rules(files: &[PathBuf]) -> anyhow::Result<RuleSet> {
    if files.is_empty() {
        anyhow::bail!("no rule files given; pass --rules or list them in the config file");
    }
    let rules = RuleSet::load_files(files, &[&YamlFrontend])?;
    info!(rules = rules.len(), files = files.len(), "rules loaded");
    Ok(rules)
}
