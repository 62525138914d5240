use serde_json::Value;

/// Print just the headline figure.
///
/// Reports print the KONSOL grand total at the selected date; summaries
/// print the first section's total; list results print one line per item.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let headline = [
        "/konsol/total/values/e",
        "/sections/0/total/values/e",
        "/total/outstanding",
    ]
    .iter()
    .find_map(|p| result.pointer(p).or_else(|| value.pointer(p)));

    if let Some(val) = headline {
        println!("{}", format_minimal(val));
        return;
    }

    if let Some(Value::Array(items)) = value.get("results") {
        for item in items {
            let name = item.get("code").or_else(|| item.get("key"));
            let answer = ["segment", "date", "is_branch"].iter().find_map(|k| item.get(*k));
            match (name, answer) {
                (Some(n), Some(a)) => println!("{}: {}", format_minimal(n), format_minimal(a)),
                _ => println!("{}", format_minimal(item)),
            }
        }
        return;
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
