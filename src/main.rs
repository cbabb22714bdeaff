use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use covmetrics::cli::{self, Inputs, Style};
use covmetrics::threshold::{parse_percentage, Thresholds};

/// covmetrics: class, method, line and branch coverage from Istanbul JSON.
#[derive(Parser)]
#[command(name = "covmetrics", version, about)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Project directory; relative paths are resolved against it.
    #[arg(long, short, default_value = ".")]
    directory: PathBuf,

    /// Coverage JSON file(s) to analyze. Repeat to merge several runs.
    /// Defaults to coverage/coverage-final.json under --directory.
    #[arg(long = "coverage-file")]
    coverage_files: Vec<PathBuf>,

    /// Read source files from disk for records without embedded code.
    #[arg(long)]
    read_sources: bool,
}

impl From<InputArgs> for Inputs {
    fn from(args: InputArgs) -> Self {
        Inputs {
            directory: args.directory,
            coverage_files: args.coverage_files,
            read_sources: args.read_sources,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute aggregate coverage metrics.
    Analyze {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output format.
        #[arg(long, short, value_enum, default_value_t = Style::Text)]
        format: Style,

        /// Write the report to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Include a per-file breakdown.
        #[arg(long)]
        files: bool,

        /// Minimum class coverage percentage.
        #[arg(long, value_parser = threshold_arg)]
        min_class: Option<f64>,

        /// Minimum method coverage percentage.
        #[arg(long, value_parser = threshold_arg)]
        min_method: Option<f64>,

        /// Minimum line coverage percentage.
        #[arg(long, value_parser = threshold_arg)]
        min_line: Option<f64>,

        /// Minimum branch coverage percentage.
        #[arg(long, value_parser = threshold_arg)]
        min_branch: Option<f64>,
    },

    /// List files whose coverage falls below a threshold, worst first.
    Gaps {
        #[command(flatten)]
        inputs: InputArgs,

        /// Target percentage.
        #[arg(long, default_value = "80", value_parser = threshold_arg)]
        threshold: f64,
    },
}

fn threshold_arg(s: &str) -> std::result::Result<f64, String> {
    parse_percentage(s).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            inputs,
            format,
            output,
            files,
            min_class,
            min_method,
            min_line,
            min_branch,
        } => {
            let thresholds = Thresholds {
                class: min_class,
                method: min_method,
                line: min_line,
                branch: min_branch,
            };
            let out = cli::cmd_analyze(&inputs.into(), format, files, &thresholds)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &out.text)
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    eprintln!("Report written to {}", path.display());
                }
                None => print!("{}", out.text),
            }

            if out.success {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Gaps { inputs, threshold } => {
            print!("{}", cli::cmd_gaps(&inputs.into(), threshold)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
