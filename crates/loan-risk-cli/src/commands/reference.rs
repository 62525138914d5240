use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use loan_risk_core::anchors;
use loan_risk_core::hierarchy::parse_unit_code;

use crate::commands::load_master;

/// Arguments for anchor date resolution
#[derive(Args)]
pub struct AnchorsArgs {
    /// Selected date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
}

/// Arguments for segment classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Product classification codes
    #[arg(required = true)]
    pub codes: Vec<String>,

    /// Master tables (JSON or YAML) replacing the built-in ones
    #[arg(long)]
    pub master: Option<String>,
}

/// Arguments for org hierarchy lookup
#[derive(Args)]
pub struct HierarchyArgs {
    /// Org-unit codes to resolve; lists every branch when omitted
    pub codes: Vec<String>,

    /// Master tables (JSON or YAML) replacing the built-in ones
    #[arg(long)]
    pub master: Option<String>,
}

pub fn run_anchors(args: AnchorsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let resolved = anchors::resolve(args.date)?;
    Ok(json!({
        "results": resolved.iter().collect::<Vec<_>>(),
        "windows": resolved.windows(),
    }))
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (master, _) = load_master(args.master.as_deref())?;
    let results: Vec<Value> = args
        .codes
        .iter()
        .map(|code| json!({"code": code, "segment": master.segments.classify(code)}))
        .collect();
    Ok(json!({ "results": results }))
}

pub fn run_hierarchy(args: HierarchyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (master, warnings) = load_master(args.master.as_deref())?;
    let h = &master.hierarchy;

    let results: Vec<Value> = if args.codes.is_empty() {
        h.branches_by_name()
            .into_iter()
            .map(|branch| {
                json!({
                    "code": branch,
                    "name": h.name(branch),
                    "sub_branches": h.sub_branches_of(branch),
                })
            })
            .collect()
    } else {
        args.codes
            .iter()
            .map(|raw| {
                let class = parse_unit_code(raw).map(|code| h.resolve(code)).unwrap_or_default();
                json!({
                    "code": raw,
                    "name": parse_unit_code(raw).and_then(|code| h.name(code)),
                    "is_branch": class.is_branch,
                    "is_sub_branch": class.is_sub_branch,
                    "parent_branch_code": class.parent_branch_code,
                })
            })
            .collect()
    };

    Ok(json!({ "results": results, "warnings": warnings }))
}
