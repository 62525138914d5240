use serde_json::Value;
use std::io::{self, Read};

/// Read piped input. Returns `None` when stdin is a TTY or empty.
///
/// A single JSON document is returned as-is. Newline-delimited JSON (one
/// snapshot row per line, as exported by the upload pipeline) is collected
/// into an array.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(whole) => {
            let mut rows = Vec::new();
            for (i, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let row: Value = serde_json::from_str(line).map_err(|e| {
                    format!("stdin is neither JSON ({whole}) nor JSON lines (line {}: {e})", i + 1)
                })?;
                rows.push(row);
            }
            Ok(Some(Value::Array(rows)))
        }
    }
}
