use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use astguard_rules::{RuleEngine, RuleSet};
use clap::Args;
use tracing::warn;

use crate::OutputFormat;
use crate::config::Config;
use crate::runner::{self, FileOutput};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Source files to check.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Trace filter rejections of this rule; may be repeated.
    #[arg(long = "debug", value_name = "RULE")]
    pub debug: Vec<String>,

    /// Maximum number of files checked in parallel.
    #[arg(long, short = 'j', env = "ASTGUARD_JOBS")]
    pub jobs: Option<usize>,
}

/// Exit status: 0 when nothing fired, 1 when a rule reported, 2 when a file
/// could not be checked.
pub async fn run(
    rules: RuleSet,
    config: &Config,
    args: &CheckArgs,
    format: &OutputFormat,
) -> anyhow::Result<ExitCode> {
    let mut engine = RuleEngine::new(rules);
    for name in config.debug_rules(&args.debug) {
        if !engine.enable_debug(name) {
            warn!(rule = name, "cannot debug unknown rule");
        }
    }

    let jobs = config.jobs(args.jobs);
    let results = runner::check_files(Arc::new(engine), args.files.clone(), jobs).await;

    let mut fired = 0;
    let mut failed = 0;
    for result in &results {
        match &result.outcome {
            Ok(output) => {
                fired += output.reports.len();
                print_output(output, format)?;
            }
            Err(message) => {
                failed += 1;
                eprintln!("error: {message}");
            }
        }
    }

    Ok(if failed > 0 {
        ExitCode::from(2)
    } else if fired > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Reports go to stdout, debug traces to stderr.
fn print_output(output: &FileOutput, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            for trace in &output.traces {
                eprintln!("{}", serde_json::to_string(trace)?);
            }
            for report in &output.reports {
                println!("{}", serde_json::to_string(report)?);
            }
        }
        OutputFormat::Text => {
            for trace in &output.traces {
                eprintln!("{trace}");
            }
            for report in &output.reports {
                println!("{report}");
            }
        }
    }
    Ok(())
}
