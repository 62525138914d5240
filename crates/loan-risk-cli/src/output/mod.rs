pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

// ---------------------------------------------------------------------------
// Report and summary grids shared by the table and CSV formatters
// ---------------------------------------------------------------------------

const ANCHOR_KEYS: [&str; 5] = ["a", "b", "c", "d", "e"];
const WINDOW_KEYS: [&str; 4] = ["dtd", "mom", "mtd", "ytd"];

/// One rectangular block of output: a title, a header row and data rows.
pub struct Grid {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Grids for a report (`konsol`/`kanca_only`/`kcp_only`) or a segment
/// summary (`sections`). `None` for any other result shape.
pub fn result_grids(result: &Value) -> Option<Vec<Grid>> {
    if result.get("konsol").is_some() {
        return Some(report_grids(result));
    }
    if let Some(Value::Array(sections)) = result.get("sections") {
        return Some(vec![summary_grid(result, sections)]);
    }
    None
}

fn anchor_headers(result: &Value) -> Vec<String> {
    let labels: Vec<String> = result
        .pointer("/anchors/anchors")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(|x| x.get("label").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if labels.len() == ANCHOR_KEYS.len() {
        labels
    } else {
        ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect()
    }
}

fn window_headers(result: &Value) -> Vec<String> {
    let mut headers = Vec::new();
    let windows = result.get("windows").and_then(Value::as_array);
    for (i, key) in WINDOW_KEYS.iter().enumerate() {
        let label = windows
            .and_then(|w| w.get(i))
            .and_then(|w| w.get("label"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_uppercase());
        headers.push(label.clone());
        headers.push(format!("{label} %"));
    }
    headers
}

fn figure_cells(row: &Value) -> Vec<String> {
    let mut cells: Vec<String> = ANCHOR_KEYS
        .iter()
        .map(|k| number(row.pointer(&format!("/values/{k}"))))
        .collect();
    for k in WINDOW_KEYS {
        cells.push(number(row.pointer(&format!("/deltas/{k}/abs"))));
        cells.push(number(row.pointer(&format!("/deltas/{k}/pct"))));
    }
    cells
}

fn commitment_cells(row: &Value) -> Vec<String> {
    ["target", "achievement_pct", "gap"]
        .iter()
        .map(|k| match row.pointer(&format!("/commitment/{k}")) {
            None | Some(Value::Null) => "-".to_string(),
            other => number(other),
        })
        .collect()
}

fn report_grids(result: &Value) -> Vec<Grid> {
    let anchors = anchor_headers(result);
    let windows = window_headers(result);
    let segment = result.get("segment").and_then(Value::as_str).unwrap_or("");
    let metric = result.get("metric").and_then(Value::as_str).unwrap_or("");

    let mut grids = Vec::new();
    for (key, name) in [("konsol", "KONSOL"), ("kanca_only", "KANCA ONLY"), ("kcp_only", "KCP ONLY")] {
        let Some(table) = result.get(key) else { continue };
        let rows = table.get("rows").and_then(Value::as_array).cloned().unwrap_or_default();
        let with_commitment = rows.iter().any(|r| r.get("commitment").is_some());
        let is_kcp = key == "kcp_only";

        let mut headers: Vec<String> = if is_kcp {
            vec!["Branch".into(), "Code".into(), "Sub-branch".into()]
        } else {
            vec!["Code".into(), "Branch".into()]
        };
        headers.extend(anchors.iter().cloned());
        headers.extend(windows.iter().cloned());
        if with_commitment {
            headers.extend(["Target".to_string(), "Ach %".to_string(), "Gap".to_string()]);
        }

        let mut out_rows = Vec::new();
        for row in &rows {
            let mut cells = if is_kcp {
                vec![text(row.get("branch_name")), text(row.get("unit_code")), text(row.get("unit_name"))]
            } else {
                vec![text(row.get("branch_code")), text(row.get("branch_name"))]
            };
            cells.extend(figure_cells(row));
            if with_commitment {
                cells.extend(commitment_cells(row));
            }
            out_rows.push(cells);
        }
        if let Some(total) = table.get("total") {
            let mut cells = if is_kcp {
                vec!["TOTAL".to_string(), String::new(), String::new()]
            } else {
                vec!["TOTAL".to_string(), String::new()]
            };
            cells.extend(figure_cells(total));
            if with_commitment {
                cells.extend(commitment_cells(total));
            }
            out_rows.push(cells);
        }

        grids.push(Grid {
            title: format!("{metric} {segment} {name}").trim().to_string(),
            headers,
            rows: out_rows,
        });
    }
    grids
}

fn summary_grid(result: &Value, sections: &[Value]) -> Grid {
    let mut headers = vec!["Section".to_string(), "Segment".to_string()];
    headers.extend(anchor_headers(result));
    headers.extend(window_headers(result));

    let mut rows = Vec::new();
    for section in sections {
        let title = text(section.get("title"));
        let groups = section.get("groups").and_then(Value::as_array).cloned().unwrap_or_default();
        for row in groups.iter().chain(section.get("total")) {
            let mut cells = vec![title.clone(), text(row.get("label"))];
            cells.extend(figure_cells(row));
            rows.push(cells);
        }
    }
    Grid {
        title: "Segment summary".to_string(),
        headers,
        rows,
    }
}

/// Decimal strings rounded to two places; anything else as text.
fn number(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => match Decimal::from_str(s) {
            Ok(d) => d.round_dp(2).normalize().to_string(),
            Err(_) => s.clone(),
        },
        other => text(other),
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}
