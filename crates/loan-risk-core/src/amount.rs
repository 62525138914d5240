//! Lenient numeric parsing for uploaded amount fields.
//!
//! Uploaded spreadsheets carry amounts as blank strings, thousands-grouped
//! text, decimal-comma text or plain JSON numbers. Everything is reduced to a
//! `Decimal` here so no binary floating point ever touches an amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// An amount exactly as it arrived from the upload: a JSON number or text.
/// JSON numbers keep their source digits (`arbitrary_precision`), so no
/// value passes through `f64` on its way to `Decimal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl From<i64> for RawAmount {
    fn from(n: i64) -> Self {
        RawAmount::Number(n.into())
    }
}

/// Outcome of normalizing one raw amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    /// Parsed cleanly (blank and null count as a clean zero).
    Clean(Decimal),
    /// Could not be read as a number; coerced to zero.
    Garbled,
}

impl Normalized {
    pub fn value(self) -> Decimal {
        match self {
            Normalized::Clean(v) => v,
            Normalized::Garbled => Decimal::ZERO,
        }
    }
}

/// Parse amount text. Blank text is zero; `None` means the text is garbled.
///
/// Separator rules: a lone `,` is a decimal comma; when both `,` and `.`
/// appear the right-most one is the decimal separator; a separator that
/// repeats is a grouping separator.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let s: String = text.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() || s == "-" {
        return Some(Decimal::ZERO);
    }

    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    let canonical = match (commas, dots) {
        (0, 0) | (0, 1) => s,
        (1, 0) => s.replace(',', "."),
        (_, 0) => s.replace(',', ""),
        (0, _) => s.replace('.', ""),
        _ => {
            let last_comma = s.rfind(',');
            let last_dot = s.rfind('.');
            if last_comma > last_dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
    };

    Decimal::from_str(&canonical)
        .or_else(|_| Decimal::from_scientific(&canonical))
        .ok()
}

/// Normalize an optional raw amount. Null and blank become a clean zero.
pub fn normalize(raw: Option<&RawAmount>) -> Normalized {
    match raw {
        None => Normalized::Clean(Decimal::ZERO),
        Some(RawAmount::Number(n)) => match parse_amount(&n.to_string()) {
            Some(v) => Normalized::Clean(v),
            None => Normalized::Garbled,
        },
        Some(RawAmount::Text(t)) => match parse_amount(t) {
            Some(v) => Normalized::Clean(v),
            None => Normalized::Garbled,
        },
    }
}

/// Serde helper: read a `Decimal` from a number, numeric text or null.
/// Garbled text is rejected rather than coerced; use it for reference data.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawAmount> = Option::deserialize(deserializer)?;
    match normalize(raw.as_ref()) {
        Normalized::Clean(v) => Ok(v),
        Normalized::Garbled => Err(serde::de::Error::custom(format!(
            "not a numeric amount: {raw:?}"
        ))),
    }
}
