//! Top-level CLI definition and dispatch.
//!
//! Exit codes follow the download-host post-processing contract: 93 for a
//! successful sweep, 94 for an error (including a blocked import and partial
//! failures), 95 when the run was skipped. Hosts key their downstream
//! handling off these exact values.

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};

use sample_sweeper::core::config::Config;
use sample_sweeper::core::errors::Result;
use sample_sweeper::executor::purge::QuarantinePurger;
use sample_sweeper::report::RunDisposition;
use sample_sweeper::runner::{RunRequest, Runner};

pub const EXIT_SUCCESS: i32 = 93;
pub const EXIT_ERROR: i32 = 94;
pub const EXIT_NONE: i32 = 95;

/// Host environment variables consulted when arguments are omitted.
const ENV_DIRECTORY: &str = "NZBPP_DIRECTORY";
const ENV_CATEGORY: &str = "NZBPP_CATEGORY";
const ENV_TOTAL_STATUS: &str = "NZBPP_TOTALSTATUS";

/// Sample sweeper — removes sample/junk content from completed downloads.
#[derive(Debug, Parser)]
#[command(
    name = "ssw",
    author,
    version,
    about = "Sample Sweeper - download tree cleanup",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print the run report as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Log per-item decisions.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Sweep a completed download directory.
    Sweep(SweepArgs),
    /// Run only the quarantine retention purge.
    Purge(PurgeArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Debug, Clone, Args, Default)]
struct SweepArgs {
    /// Download directory (falls back to the host environment).
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Download category for threshold overrides (falls back to the host
    /// environment).
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,
    /// Treat the download as failed: skip the sweep entirely.
    #[arg(long)]
    download_failed: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct PurgeArgs {
    /// Download directory containing the quarantine folder.
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Override the configured retention in days (0 disables).
    #[arg(long, value_name = "DAYS")]
    max_age_days: Option<u64>,
}

/// Dispatch a parsed CLI invocation, returning the process exit code.
pub fn run(cli: &Cli) -> Result<i32> {
    if cli.no_color || !io::stdout().is_terminal() {
        control::set_override(false);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.verbose = true;
    }

    match &cli.command {
        Command::Sweep(args) => sweep(cli, &config, args),
        Command::Purge(args) => purge(&config, args),
        Command::Config => {
            let toml = toml::to_string_pretty(&config).map_err(|e| {
                sample_sweeper::core::errors::SswError::Serialization {
                    context: "toml",
                    details: e.to_string(),
                }
            })?;
            print!("{toml}");
            Ok(0)
        }
    }
}

fn sweep(cli: &Cli, config: &Config, args: &SweepArgs) -> Result<i32> {
    let Some(root) = args.dir.clone().or_else(|| env::var_os(ENV_DIRECTORY).map(PathBuf::from))
    else {
        return Err(sample_sweeper::core::errors::SswError::InvalidConfig {
            details: format!("no download directory given and {ENV_DIRECTORY} is unset"),
        });
    };
    let category = args
        .category
        .clone()
        .or_else(|| env::var(ENV_CATEGORY).ok())
        .filter(|c| !c.is_empty());
    // Absent status means a manual invocation; assume success.
    let overall_success = !args.download_failed
        && env::var(ENV_TOTAL_STATUS).map_or(true, |s| s == "SUCCESS");

    let output = Runner::new(config).execute(&RunRequest {
        root: &root,
        category: category.as_deref(),
        overall_success,
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        let line = output.report.summary_line();
        let line = match output.disposition {
            RunDisposition::Success => line.green(),
            RunDisposition::NoAction => line.normal(),
            RunDisposition::PartialError => line.yellow(),
            RunDisposition::Error => line.red(),
        };
        println!("{line}");
    }
    Ok(exit_code(output.disposition))
}

fn purge(config: &Config, args: &PurgeArgs) -> Result<i32> {
    let Some(root) = args.dir.clone().or_else(|| env::var_os(ENV_DIRECTORY).map(PathBuf::from))
    else {
        return Err(sample_sweeper::core::errors::SswError::InvalidConfig {
            details: format!("no download directory given and {ENV_DIRECTORY} is unset"),
        });
    };
    let days = args.max_age_days.unwrap_or(config.quarantine.max_age_days);
    let report = QuarantinePurger::new(&root, days).purge();
    println!(
        "purged {} file(s), pruned {} dir(s), {} failure(s)",
        report.files_purged,
        report.dirs_pruned,
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("ssw: {}", failure.reason);
    }
    Ok(if report.failures.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_ERROR
    })
}

const fn exit_code(disposition: RunDisposition) -> i32 {
    match disposition {
        RunDisposition::Success => EXIT_SUCCESS,
        RunDisposition::NoAction => EXIT_NONE,
        RunDisposition::Error | RunDisposition::PartialError => EXIT_ERROR,
    }
}
