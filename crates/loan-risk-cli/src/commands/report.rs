use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde::Deserialize;
use serde_json::Value;

use loan_risk_core::rollup::{self, CommitmentDataset, ReportQuery, SubBranchRows};
use loan_risk_core::snapshot::{DelinquencyCode, InMemorySource};

use crate::commands::{load_master, read_input, records_from};
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RowPolicy {
    /// Every sub-branch in the master
    All,
    /// Only sub-branches with data
    WithData,
}

/// Arguments for a KONSOL / KANCA_ONLY / KCP_ONLY report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON input: rows, or {records, segment, metric, selected_date, ...}
    #[arg(long)]
    pub input: Option<String>,

    /// Segment (MEDIUM, SMALL, SMALL NCC, CC, KUR, OTHER)
    #[arg(long)]
    pub segment: Option<String>,

    /// Metric (os, npl, sml, lr, lar, nsb, dpk_pct, npl_pct, lr_pct, lar_pct)
    #[arg(long)]
    pub metric: Option<String>,

    /// Selected date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Restrict to delinquency codes, e.g. --kol 3 --kol 4
    #[arg(long = "kol")]
    pub delinquency_codes: Vec<String>,

    /// Which sub-branches get a KCP_ONLY row
    #[arg(long, value_enum)]
    pub sub_branch_rows: Option<RowPolicy>,

    /// Commitment targets (JSON or YAML)
    #[arg(long)]
    pub commitments: Option<String>,

    /// Master tables (JSON or YAML) replacing the built-in ones
    #[arg(long)]
    pub master: Option<String>,
}

/// Request fields that may accompany the rows in the input document.
#[derive(Debug, Default, Deserialize)]
struct ReportInput {
    segment: Option<String>,
    metric: Option<String>,
    selected_date: Option<NaiveDate>,
    delinquency_codes: Option<Vec<DelinquencyCode>>,
    org_units: Option<Vec<String>>,
    sub_branch_rows: Option<SubBranchRows>,
    commitments: Option<CommitmentDataset>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_input(args.input.as_deref(), "report")?;
    let snapshot = records_from(&data)?;
    let fields: ReportInput = match data {
        Value::Object(_) => serde_json::from_value(data)?,
        _ => ReportInput::default(),
    };

    let segment = args
        .segment
        .or(fields.segment)
        .ok_or("--segment is required (or provide 'segment' in --input)")?;
    let metric = args
        .metric
        .or(fields.metric)
        .ok_or("--metric is required (or provide 'metric' in --input)")?;
    let selected_date = args
        .date
        .or(fields.selected_date)
        .ok_or("--date is required (or provide 'selected_date' in --input)")?;

    let mut query = ReportQuery::new(&segment, &metric, selected_date);
    query.org_units = fields.org_units;
    query.delinquency_codes = if args.delinquency_codes.is_empty() {
        fields.delinquency_codes
    } else {
        let codes = args
            .delinquency_codes
            .iter()
            .map(|c| DelinquencyCode::parse(c).ok_or_else(|| format!("--kol {c}: expected 1..5")))
            .collect::<Result<Vec<_>, _>>()?;
        Some(codes)
    };
    query.sub_branch_rows = match args.sub_branch_rows {
        Some(RowPolicy::All) => SubBranchRows::AllFromMaster,
        Some(RowPolicy::WithData) => SubBranchRows::WithDataOnly,
        None => fields.sub_branch_rows.unwrap_or_default(),
    };
    query.commitments = match args.commitments {
        Some(ref path) => Some(input::file::read_structured(path)?),
        None => fields.commitments,
    };

    let (master, mut warnings) = load_master(args.master.as_deref())?;
    warnings.extend(snapshot.warnings);
    let source: InMemorySource = snapshot.records.into_iter().collect();
    tracing::debug!(records = source.len(), segment = %query.segment, metric = %query.metric, "running report");

    let mut result = rollup::build_report(&source, &master, &query)?;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    Ok(serde_json::to_value(result)?)
}
