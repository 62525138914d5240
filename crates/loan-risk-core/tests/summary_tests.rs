#![cfg(feature = "summary")]

use chrono::NaiveDate;
use loan_risk_core::metrics::Metric;
use loan_risk_core::snapshot::{normalize_rows, InMemorySource, RawSnapshotRow};
use loan_risk_core::summary::{build_segment_summary, SummarySection};
use loan_risk_core::{LoanRiskError, MasterData};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One record per leaf at 2025-10-09: MEDIUM (42210) at 286, CC (42110) at
/// 181, SMALL NCC (80064) at sub-branch 1077, KUR (80065) at 286.
fn source() -> InMemorySource {
    let raw: Vec<RawSnapshotRow> = serde_json::from_value(json!([
        {"periode": "09/10/2025", "kode_uker": "286", "code": "42210", "kol_adk": "1",
         "kolektibilitas_lancar": "4000"},
        {"periode": "09/10/2025", "kode_uker": "181", "code": "42110", "kol_adk": "3",
         "kolektibilitas_kurang_lancar": "1000"},
        {"periode": "09/10/2025", "kode_uker": "1077", "code": "80064", "kol_adk": "2",
         "kolektibilitas_dpk": "500"},
        {"periode": "09/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "flag_restruk": "Y", "kolektibilitas_lancar": "2500", "nasabah": 3, "dub_nasabah": "TRUE"},
        {"periode": "08/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "2000"},
        {"periode": "09/10/2025", "kode_uker": "286", "code": "99999", "kol_adk": "5",
         "kolektibilitas_macet": "123456"},
    ]))
    .unwrap();
    normalize_rows(&raw).records.into_iter().collect()
}

fn section(sections: &[SummarySection], metric: Metric) -> &SummarySection {
    sections.iter().find(|s| s.metric == metric).unwrap()
}

fn group_e(section: &SummarySection, label: &str) -> Decimal {
    section.groups.iter().find(|g| g.label == label).unwrap().values.e
}

#[test]
fn test_section_order_and_groups() {
    let out = build_segment_summary(&source(), &MasterData::builtin(), ymd(2025, 10, 9), None).unwrap();
    let metrics: Vec<Metric> = out.result.sections.iter().map(|s| s.metric).collect();
    assert_eq!(
        metrics,
        vec![
            Metric::Outstanding,
            Metric::SpecialMention,
            Metric::SpecialMentionRatio,
            Metric::Npl,
            Metric::NplRatio,
            Metric::RestructuredCurrent,
            Metric::RestructuredRatio,
            Metric::LoanAtRisk,
            Metric::LoanAtRiskRatio,
            Metric::CustomerCount,
        ]
    );
    assert_eq!(section(&out.result.sections, Metric::Outstanding).groups.len(), 6);
    assert_eq!(section(&out.result.sections, Metric::LoanAtRiskRatio).groups.len(), 4);
}

#[test]
fn test_group_values_and_total_exclude_other() {
    let out = build_segment_summary(&source(), &MasterData::builtin(), ymd(2025, 10, 9), None).unwrap();
    let os = section(&out.result.sections, Metric::Outstanding);
    assert_eq!(group_e(os, "Medium"), dec!(4000));
    assert_eq!(group_e(os, "Small + KUR"), dec!(4000));
    assert_eq!(group_e(os, "Small"), dec!(1500));
    assert_eq!(group_e(os, "- Small Non CC"), dec!(500));
    assert_eq!(group_e(os, "- CC"), dec!(1000));
    assert_eq!(group_e(os, "KUR"), dec!(2500));
    assert_eq!(os.total.values.e, dec!(8000));
    assert_eq!(os.total.values.d, dec!(2000));
    assert_eq!(os.total.deltas.dtd.abs, dec!(6000));
    assert_eq!(os.total.deltas.dtd.pct, dec!(300));
}

#[test]
fn test_ratio_sections_recomputed_from_components() {
    let out = build_segment_summary(&source(), &MasterData::builtin(), ymd(2025, 10, 9), None).unwrap();
    let npl = section(&out.result.sections, Metric::NplRatio);
    // 1,000 NPL over 8,000 outstanding
    assert_eq!(npl.total.values.e, dec!(12.5));
    assert_eq!(group_e(npl, "Medium"), Decimal::ZERO);
    assert_eq!(group_e(npl, "Small"), dec!(1000) / dec!(1500) * dec!(100));

    let lar = section(&out.result.sections, Metric::LoanAtRisk);
    // SML 500 + NPL 1,000 + LR 2,500
    assert_eq!(lar.total.values.e, dec!(4000));

    let nsb = section(&out.result.sections, Metric::CustomerCount);
    assert_eq!(group_e(nsb, "KUR"), dec!(3));
}

#[test]
fn test_branch_scope_includes_sub_branches() {
    let out = build_segment_summary(&source(), &MasterData::builtin(), ymd(2025, 10, 9), Some(286)).unwrap();
    let os = section(&out.result.sections, Metric::Outstanding);
    // 4,000 MEDIUM + 500 NCC at 1077 + 2,500 KUR; CC at 181 excluded
    assert_eq!(os.total.values.e, dec!(7000));
    assert_eq!(group_e(os, "- CC"), Decimal::ZERO);
    assert_eq!(out.result.branch, Some(286));
}

#[test]
fn test_branch_scope_rejects_sub_branch_code() {
    let err = build_segment_summary(&source(), &MasterData::builtin(), ymd(2025, 10, 9), Some(1077)).unwrap_err();
    assert!(matches!(err, LoanRiskError::InvalidInput { .. }));
}
