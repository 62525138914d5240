mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::metrics::MetricsArgs;
use commands::reference::{AnchorsArgs, ClassifyArgs, HierarchyArgs};
use commands::report::ReportArgs;
use commands::summary::SummaryArgs;

/// Loan portfolio risk reports rolled up by branch and sub-branch
#[derive(Parser)]
#[command(
    name = "lrr",
    version,
    about = "Loan portfolio risk reports rolled up by branch and sub-branch",
    long_about = "Aggregates loan snapshot rows into KONSOL, KANCA_ONLY and KCP_ONLY \
                  tables with DtD, MoM, MtD and YtD changes, using decimal precision. \
                  Log verbosity is controlled with LOAN_RISK_LOG (default: warn)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build KONSOL / KANCA_ONLY / KCP_ONLY tables for one segment and metric
    Report(ReportArgs),
    /// Every metric across the segment groups (performance highlights)
    Summary(SummaryArgs),
    /// Resolve the five anchor dates and four delta windows
    Anchors(AnchorsArgs),
    /// Compute metrics per snapshot row
    Metrics(MetricsArgs),
    /// Classify product codes into segments
    Classify(ClassifyArgs),
    /// Resolve org-unit codes or list the branch hierarchy
    Hierarchy(HierarchyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOAN_RISK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Summary(args) => commands::summary::run_summary(args),
        Commands::Anchors(args) => commands::reference::run_anchors(args),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Classify(args) => commands::reference::run_classify(args),
        Commands::Hierarchy(args) => commands::reference::run_hierarchy(args),
        Commands::Version => {
            println!("lrr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
