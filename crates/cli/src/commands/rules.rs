use std::process::ExitCode;

use astguard_rules::{Rule, RuleSet};
use clap::{Args, Subcommand};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List all loaded rules.
    List,
    /// Show one rule in detail.
    Show {
        /// Rule name.
        name: String,
    },
}

pub fn run(rules: &RuleSet, args: &RulesArgs, format: &OutputFormat) -> anyhow::Result<ExitCode> {
    match &args.command {
        RulesCommand::List => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(rules.rules())?);
            }
            OutputFormat::Text => {
                println!("{} rules loaded:", rules.len());
                for rule in rules.rules() {
                    let debug = if rule.debug { " [debug]" } else { "" };
                    println!(
                        "  {name} ({location}){debug}",
                        name = rule.name,
                        location = rule.location,
                    );
                }
            }
        },
        RulesCommand::Show { name } => {
            let Some(rule) = rules.rule_by_name(name) else {
                anyhow::bail!("no rule named '{name}'");
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rule)?),
                OutputFormat::Text => print_rule(rule),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_rule(rule: &Rule) {
    println!("{} ({})", rule.name, rule.location);
    for pattern in &rule.patterns {
        println!("  match:   {}", pattern.source);
    }
    if let Some(filter) = &rule.filter {
        println!("  where:   {filter}");
    }
    println!("  report:  {}", rule.report.source());
    if let Some(suggest) = &rule.suggest {
        println!("  suggest: {}", suggest.source());
    }
    if let Some(at) = &rule.at {
        println!("  at:      ${at}");
    }
}
