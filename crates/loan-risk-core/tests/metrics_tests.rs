use loan_risk_core::metrics::{compute, Metric, MetricValues};
use loan_risk_core::snapshot::{normalize_rows, DelinquencyCode, RawSnapshotRow};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn normalize(value: serde_json::Value) -> (Vec<MetricValues>, Vec<String>) {
    let raw: Vec<RawSnapshotRow> = serde_json::from_value(value).unwrap();
    let out = normalize_rows(&raw);
    (out.records.iter().map(compute).collect(), out.warnings)
}

// ===========================================================================
// Outstanding
// ===========================================================================

#[test]
fn test_outstanding_fallback_and_override() {
    let (values, warnings) = normalize(json!([
        {"periode": "30/11/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1000", "kolektibilitas_dpk": "200", "os": ""},
        {"periode": "30/11/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1000", "kolektibilitas_dpk": "200", "os": "5000"},
    ]));
    assert!(warnings.is_empty());
    assert_eq!(values[0].outstanding, dec!(1200));
    assert_eq!(values[1].outstanding, dec!(5000));
}

// ===========================================================================
// Normalization
// ===========================================================================

#[test]
fn test_decimal_comma_and_grouping_separators() {
    let (values, warnings) = normalize(json!([
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1000,50"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1.234.567"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1.234.567,89"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "   "},
    ]));
    assert!(warnings.is_empty());
    let os: Vec<Decimal> = values.iter().map(|v| v.outstanding).collect();
    assert_eq!(os, vec![dec!(1000.50), dec!(1234567), dec!(1234567.89), Decimal::ZERO]);
}

#[test]
fn test_garbled_and_negative_amounts_become_zero_with_warning() {
    let (values, warnings) = normalize(json!([
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "12abc", "kolektibilitas_dpk": "-50"},
    ]));
    assert_eq!(values[0].outstanding, Decimal::ZERO);
    assert_eq!(warnings.len(), 2);
}

#[test]
fn test_unparseable_period_drops_row() {
    let (values, warnings) = normalize(json!([
        {"periode": "November 2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "100"},
        {"periode": "30/11/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "100"},
    ]));
    assert_eq!(values.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("row 1"));
}

#[test]
fn test_unknown_delinquency_code_contributes_outstanding_only() {
    let raw: Vec<RawSnapshotRow> = serde_json::from_value(json!([
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "9",
         "kolektibilitas_macet": "700"},
    ]))
    .unwrap();
    let out = normalize_rows(&raw);
    assert_eq!(out.records[0].delinquency, None);
    assert_eq!(out.warnings.len(), 1);
    let v = compute(&out.records[0]);
    assert_eq!(v.outstanding, dec!(700));
    assert_eq!(v.npl, Decimal::ZERO);
    assert_eq!(v.loan_at_risk, Decimal::ZERO);
}

// ===========================================================================
// Risk metrics
// ===========================================================================

#[test]
fn test_lar_equals_components_for_mixed_rows() {
    let (values, _) = normalize(json!([
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "flag_restruk": "y", "kolektibilitas_lancar": "1000000"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "2",
         "kolektibilitas_dpk": "250000"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "3",
         "kolektibilitas_kurang_lancar": "500000"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": 5,
         "kolektibilitas_macet": 125000, "os": 130000},
    ]));
    let total: MetricValues = values.iter().sum();
    assert_eq!(total.restructured_current, dec!(1000000));
    assert_eq!(total.special_mention, dec!(250000));
    assert_eq!(total.npl, dec!(630000));
    assert_eq!(total.loan_at_risk, dec!(1880000));
    assert!(total.check_lar().is_ok());
    assert_eq!(
        Metric::LoanAtRiskRatio.value(&total),
        dec!(1880000) / total.outstanding * dec!(100)
    );
}

#[test]
fn test_delinquency_code_parse() {
    assert_eq!(DelinquencyCode::parse(" 2 "), Some(DelinquencyCode::SpecialMention));
    assert_eq!(DelinquencyCode::parse("0"), None);
    assert!(DelinquencyCode::Loss.is_non_performing());
    assert!(!DelinquencyCode::SpecialMention.is_non_performing());
}
