use clap::Args;
use serde::Serialize;
use serde_json::Value;

use loan_risk_core::metrics::{compute, MetricValues};
use loan_risk_core::segmentation::Segment;

use crate::commands::{load_master, read_input, records_from};

/// Arguments for per-record metric computation
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input: an array of snapshot rows
    #[arg(long)]
    pub input: Option<String>,

    /// Master tables (JSON or YAML) replacing the built-in ones
    #[arg(long)]
    pub master: Option<String>,
}

#[derive(Serialize)]
struct RecordMetrics {
    period: String,
    org_unit_code: String,
    classification_code: String,
    segment: Segment,
    #[serde(flatten)]
    values: MetricValues,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_input(args.input.as_deref(), "metrics")?;
    let snapshot = records_from(&data)?;
    let (master, mut warnings) = load_master(args.master.as_deref())?;
    warnings.extend(snapshot.warnings);

    let records: Vec<RecordMetrics> = snapshot
        .records
        .iter()
        .map(|r| RecordMetrics {
            period: r.period.to_string(),
            org_unit_code: r.org_unit_code.clone(),
            classification_code: r.classification_code.clone(),
            segment: master.segments.classify(&r.classification_code),
            values: compute(r),
        })
        .collect();
    let total: MetricValues = records.iter().map(|r| r.values).sum();

    Ok(serde_json::json!({
        "results": records,
        "total": total,
        "warnings": warnings,
    }))
}
