use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use loan_risk_core::snapshot::InMemorySource;
use loan_risk_core::summary;

use crate::commands::{load_master, read_input, records_from};

/// Arguments for the segment performance summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON input: rows, or {records, selected_date, branch}
    #[arg(long)]
    pub input: Option<String>,

    /// Selected date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Branch code; scopes to the branch and its sub-branches
    #[arg(long)]
    pub branch: Option<u32>,

    /// Master tables (JSON or YAML) replacing the built-in ones
    #[arg(long)]
    pub master: Option<String>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_input(args.input.as_deref(), "summary")?;
    let snapshot = records_from(&data)?;

    let selected_date = match args.date {
        Some(d) => d,
        None => data
            .get("selected_date")
            .cloned()
            .map(serde_json::from_value::<NaiveDate>)
            .transpose()?
            .ok_or("--date is required (or provide 'selected_date' in --input)")?,
    };
    let branch = match args.branch {
        Some(b) => Some(b),
        None => data
            .get("branch")
            .cloned()
            .map(serde_json::from_value::<u32>)
            .transpose()?,
    };

    let (master, mut warnings) = load_master(args.master.as_deref())?;
    warnings.extend(snapshot.warnings);
    let source: InMemorySource = snapshot.records.into_iter().collect();
    tracing::debug!(records = source.len(), %selected_date, ?branch, "running segment summary");

    let mut result = summary::build_segment_summary(&source, &master, selected_date, branch)?;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    Ok(serde_json::to_value(result)?)
}
