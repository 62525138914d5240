use napi::Result as NapiResult;
use napi_derive::napi;

use loan_risk_core::snapshot::{normalize_rows, InMemorySource, RawSnapshotRow};
use loan_risk_core::{MasterConfig, MasterData};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Built-in master tables, or the JSON-encoded `MasterConfig` when given.
fn master_from(master_json: Option<String>) -> NapiResult<(MasterData, Vec<String>)> {
    match master_json {
        Some(json) => {
            let config: MasterConfig = serde_json::from_str(&json).map_err(to_napi_error)?;
            MasterData::from_config(&config).map_err(to_napi_error)
        }
        None => Ok((MasterData::builtin(), Vec::new())),
    }
}

/// Normalized records plus the warnings raised while normalizing them.
fn source_from(rows_json: &str) -> NapiResult<(InMemorySource, Vec<String>)> {
    let rows: Vec<RawSnapshotRow> = serde_json::from_str(rows_json).map_err(to_napi_error)?;
    let snapshot = normalize_rows(&rows);
    Ok((snapshot.records.into_iter().collect(), snapshot.warnings))
}

fn parse_date(raw: &str) -> NapiResult<chrono::NaiveDate> {
    loan_risk_core::snapshot::parse_period(raw).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[napi]
pub fn build_report(
    rows_json: String,
    query_json: String,
    master_json: Option<String>,
) -> NapiResult<String> {
    let query: loan_risk_core::rollup::ReportQuery =
        serde_json::from_str(&query_json).map_err(to_napi_error)?;
    let (master, mut warnings) = master_from(master_json)?;
    let (source, row_warnings) = source_from(&rows_json)?;
    warnings.extend(row_warnings);

    let mut output =
        loan_risk_core::rollup::build_report(&source, &master, &query).map_err(to_napi_error)?;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn segment_summary(
    rows_json: String,
    selected_date: String,
    branch: Option<u32>,
    master_json: Option<String>,
) -> NapiResult<String> {
    let (master, mut warnings) = master_from(master_json)?;
    let (source, row_warnings) = source_from(&rows_json)?;
    warnings.extend(row_warnings);

    let mut output = loan_risk_core::summary::build_segment_summary(
        &source,
        &master,
        parse_date(&selected_date)?,
        branch,
    )
    .map_err(to_napi_error)?;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_anchor_dates(selected_date: String) -> NapiResult<String> {
    let anchors = loan_risk_core::anchors::resolve(parse_date(&selected_date)?).map_err(to_napi_error)?;
    let output = serde_json::json!({
        "anchors": anchors,
        "windows": anchors.windows(),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_record_metrics(rows_json: String) -> NapiResult<String> {
    let rows: Vec<RawSnapshotRow> = serde_json::from_str(&rows_json).map_err(to_napi_error)?;
    let snapshot = normalize_rows(&rows);
    let values: Vec<loan_risk_core::metrics::MetricValues> = snapshot
        .records
        .iter()
        .map(loan_risk_core::metrics::compute)
        .collect();
    let output = serde_json::json!({
        "values": values,
        "warnings": snapshot.warnings,
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn classify_segment(classification_code: String, master_json: Option<String>) -> NapiResult<String> {
    let (master, _) = master_from(master_json)?;
    Ok(master.segments.classify(&classification_code).to_string())
}

#[napi]
pub fn resolve_org_unit(org_unit_code: u32, master_json: Option<String>) -> NapiResult<String> {
    let (master, _) = master_from(master_json)?;
    serde_json::to_string(&master.hierarchy.resolve(org_unit_code)).map_err(to_napi_error)
}

#[napi]
pub fn builtin_master() -> NapiResult<String> {
    serde_json::to_string(&MasterConfig::builtin()).map_err(to_napi_error)
}
