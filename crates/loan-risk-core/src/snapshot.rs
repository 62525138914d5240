//! Loan snapshot records: the raw upload form, normalization into typed
//! records, and the read-only record source the rollup scans.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::amount::{self, Normalized, RawAmount};
use crate::error::LoanRiskError;
use crate::types::Money;
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Typed record
// ---------------------------------------------------------------------------

/// Five mutually exclusive collectibility amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibilityBuckets {
    pub current: Money,
    pub special_mention: Money,
    pub substandard: Money,
    pub doubtful: Money,
    pub loss: Money,
}

impl CollectibilityBuckets {
    pub fn total(&self) -> Money {
        self.current + self.special_mention + self.substandard + self.doubtful + self.loss
    }

    /// Substandard + doubtful + loss.
    pub fn non_performing(&self) -> Money {
        self.substandard + self.doubtful + self.loss
    }
}

/// Which collectibility bucket currently governs a record (codes `1`..`5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DelinquencyCode {
    #[serde(rename = "1")]
    Current,
    #[serde(rename = "2")]
    SpecialMention,
    #[serde(rename = "3")]
    Substandard,
    #[serde(rename = "4")]
    Doubtful,
    #[serde(rename = "5")]
    Loss,
}

impl DelinquencyCode {
    /// Parse `1`..`5`; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(DelinquencyCode::Current),
            "2" => Some(DelinquencyCode::SpecialMention),
            "3" => Some(DelinquencyCode::Substandard),
            "4" => Some(DelinquencyCode::Doubtful),
            "5" => Some(DelinquencyCode::Loss),
            _ => None,
        }
    }

    pub fn is_non_performing(self) -> bool {
        matches!(
            self,
            DelinquencyCode::Substandard | DelinquencyCode::Doubtful | DelinquencyCode::Loss
        )
    }
}

/// One loan at one reporting date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSnapshotRecord {
    pub period: NaiveDate,
    pub org_unit_code: String,
    pub classification_code: String,
    pub buckets: CollectibilityBuckets,
    /// Authoritative balance; zero when the upload did not carry it.
    pub exposure_amount: Money,
    /// `None` when the upload code is outside `1`..`5`.
    pub delinquency: Option<DelinquencyCode>,
    pub restructured: bool,
    pub customer_count: Money,
    pub customer_flag: bool,
}

// ---------------------------------------------------------------------------
// Raw upload row
// ---------------------------------------------------------------------------

/// A snapshot row as produced by the upload pipeline. Column names of the
/// upload template are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSnapshotRow {
    #[serde(alias = "periode", deserialize_with = "text_field", default)]
    pub period: String,
    #[serde(alias = "kode_uker", deserialize_with = "text_field", default)]
    pub org_unit_code: String,
    #[serde(alias = "code", deserialize_with = "text_field", default)]
    pub classification_code: String,
    #[serde(alias = "kolektibilitas_lancar", default)]
    pub current: Option<RawAmount>,
    #[serde(alias = "kolektibilitas_dpk", default)]
    pub special_mention: Option<RawAmount>,
    #[serde(alias = "kolektibilitas_kurang_lancar", default)]
    pub substandard: Option<RawAmount>,
    #[serde(alias = "kolektibilitas_diragukan", default)]
    pub doubtful: Option<RawAmount>,
    #[serde(alias = "kolektibilitas_macet", default)]
    pub loss: Option<RawAmount>,
    #[serde(alias = "os", default)]
    pub exposure_amount: Option<RawAmount>,
    #[serde(alias = "kol_adk", deserialize_with = "text_field", default)]
    pub delinquency_bucket_code: String,
    #[serde(alias = "flag_restruk", deserialize_with = "text_field", default)]
    pub restructure_flag: String,
    #[serde(alias = "nasabah", default)]
    pub customer_count_amount: Option<RawAmount>,
    #[serde(alias = "dub_nasabah", deserialize_with = "text_field", default)]
    pub customer_flag: String,
}

/// Accept text, numbers, booleans or null for code-like columns.
fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {other}"
        ))),
    }
}

/// Parse a reporting period in `YYYY-MM-DD` or `DD/MM/YYYY` form.
pub fn parse_period(raw: &str) -> LoanRiskResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| LoanRiskError::DateError(format!("unrecognised period '{raw}'")))
}

impl RawSnapshotRow {
    /// Normalize into a typed record. Numeric-formatting problems are
    /// coerced to zero and reported; an unreadable period drops the row.
    pub fn normalize(&self, row: usize, warnings: &mut Vec<String>) -> Option<LoanSnapshotRecord> {
        let period = match parse_period(&self.period) {
            Ok(p) => p,
            Err(e) => {
                warn(warnings, format!("row {row}: {e}; row skipped"));
                return None;
            }
        };

        let mut amount = |field: &str, raw: &Option<RawAmount>| -> Decimal {
            match amount::normalize(raw.as_ref()) {
                Normalized::Clean(v) if v.is_sign_negative() && !v.is_zero() => {
                    warn(warnings, format!("row {row}: negative {field} {v} treated as 0"));
                    Decimal::ZERO
                }
                Normalized::Clean(v) => v,
                Normalized::Garbled => {
                    warn(
                        warnings,
                        format!("row {row}: unreadable {field} {raw:?} treated as 0"),
                    );
                    Decimal::ZERO
                }
            }
        };

        let buckets = CollectibilityBuckets {
            current: amount("current", &self.current),
            special_mention: amount("special_mention", &self.special_mention),
            substandard: amount("substandard", &self.substandard),
            doubtful: amount("doubtful", &self.doubtful),
            loss: amount("loss", &self.loss),
        };
        let exposure_amount = amount("exposure_amount", &self.exposure_amount);
        let customer_count = amount("customer_count_amount", &self.customer_count_amount);

        let delinquency = DelinquencyCode::parse(&self.delinquency_bucket_code);
        if delinquency.is_none() && !self.delinquency_bucket_code.trim().is_empty() {
            warn(
                warnings,
                format!(
                    "row {row}: delinquency code '{}' outside 1..5",
                    self.delinquency_bucket_code.trim()
                ),
            );
        }

        Some(LoanSnapshotRecord {
            period,
            org_unit_code: self.org_unit_code.trim().to_string(),
            classification_code: self.classification_code.trim().to_string(),
            buckets,
            exposure_amount,
            delinquency,
            restructured: self.restructure_flag.trim().eq_ignore_ascii_case("Y"),
            customer_count,
            customer_flag: self.customer_flag.trim().eq_ignore_ascii_case("TRUE"),
        })
    }
}

fn warn(warnings: &mut Vec<String>, msg: String) {
    tracing::warn!("{msg}");
    warnings.push(msg);
}

/// Typed records plus the data-quality warnings raised while producing them.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSnapshot {
    pub records: Vec<LoanSnapshotRecord>,
    pub warnings: Vec<String>,
}

pub fn normalize_rows(rows: &[RawSnapshotRow]) -> NormalizedSnapshot {
    let mut warnings = Vec::new();
    let records = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.normalize(i + 1, &mut warnings))
        .collect();
    NormalizedSnapshot { records, warnings }
}

// ---------------------------------------------------------------------------
// Record source
// ---------------------------------------------------------------------------

/// Read-only access to snapshot records. The ingestion side may add periods
/// between requests but never rewrites a period already ingested.
pub trait RecordSource {
    /// Distinct periods available, ascending.
    fn periods(&self) -> Vec<NaiveDate>;

    /// Every record whose period is one of `periods` (each record once).
    fn scan_periods<'a>(
        &'a self,
        periods: &[NaiveDate],
    ) -> Box<dyn Iterator<Item = &'a LoanSnapshotRecord> + 'a>;
}

/// Records held in memory, indexed by period.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    by_period: BTreeMap<NaiveDate, Vec<LoanSnapshotRecord>>,
}

impl InMemorySource {
    pub fn new(records: Vec<LoanSnapshotRecord>) -> Self {
        records.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.by_period.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_period.is_empty()
    }
}

impl FromIterator<LoanSnapshotRecord> for InMemorySource {
    fn from_iter<I: IntoIterator<Item = LoanSnapshotRecord>>(iter: I) -> Self {
        let mut by_period: BTreeMap<NaiveDate, Vec<LoanSnapshotRecord>> = BTreeMap::new();
        for record in iter {
            by_period.entry(record.period).or_default().push(record);
        }
        Self { by_period }
    }
}

impl RecordSource for InMemorySource {
    fn periods(&self) -> Vec<NaiveDate> {
        self.by_period.keys().copied().collect()
    }

    fn scan_periods<'a>(
        &'a self,
        periods: &[NaiveDate],
    ) -> Box<dyn Iterator<Item = &'a LoanSnapshotRecord> + 'a> {
        let wanted: BTreeSet<NaiveDate> = periods.iter().copied().collect();
        Box::new(
            wanted
                .into_iter()
                .filter_map(move |p| self.by_period.get(&p))
                .flatten(),
        )
    }
}

impl RecordSource for [LoanSnapshotRecord] {
    fn periods(&self) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self.iter().map(|r| r.period).collect();
        set.into_iter().collect()
    }

    fn scan_periods<'a>(
        &'a self,
        periods: &[NaiveDate],
    ) -> Box<dyn Iterator<Item = &'a LoanSnapshotRecord> + 'a> {
        let wanted: BTreeSet<NaiveDate> = periods.iter().copied().collect();
        Box::new(self.iter().filter(move |r| wanted.contains(&r.period)))
    }
}
