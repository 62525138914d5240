pub mod metrics;
pub mod reference;
pub mod report;
pub mod summary;

use serde_json::Value;

use loan_risk_core::snapshot::{normalize_rows, NormalizedSnapshot, RawSnapshotRow};
use loan_risk_core::{MasterConfig, MasterData};

use crate::input;

/// Built-in master tables, or the file given with `--master`.
pub fn load_master(path: Option<&str>) -> Result<(MasterData, Vec<String>), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let config: MasterConfig = input::file::read_structured(p)?;
            Ok(MasterData::from_config(&config)?)
        }
        None => Ok((MasterData::builtin(), Vec::new())),
    }
}

/// `--input <file>` or piped stdin, as a JSON value.
pub fn read_input(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

/// Snapshot rows from either a bare array or an object with a `records` field.
pub fn records_from(value: &Value) -> Result<NormalizedSnapshot, Box<dyn std::error::Error>> {
    let rows = match value {
        Value::Array(_) => value,
        Value::Object(map) => map
            .get("records")
            .ok_or("input object has no 'records' array")?,
        _ => return Err("input must be an array of rows or an object with 'records'".into()),
    };
    let rows: Vec<RawSnapshotRow> = serde_json::from_value(rows.clone())?;
    Ok(normalize_rows(&rows))
}
