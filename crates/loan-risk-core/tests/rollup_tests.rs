use chrono::NaiveDate;
use loan_risk_core::anchors::{AnchorKey, DeltaKind};
use loan_risk_core::metrics::Metric;
use loan_risk_core::rollup::{
    build_report, CommitmentDataset, CommitmentEntry, CommitmentFamily, CommitmentFigures,
    ReportQuery, SubBranchRows,
};
use loan_risk_core::snapshot::{
    normalize_rows, DelinquencyCode, InMemorySource, LoanSnapshotRecord, RawSnapshotRow,
};
use loan_risk_core::{LoanRiskError, MasterData};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeMap;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rows(value: serde_json::Value) -> Vec<LoanSnapshotRecord> {
    let raw: Vec<RawSnapshotRow> = serde_json::from_value(value).unwrap();
    let normalized = normalize_rows(&raw);
    assert!(normalized.warnings.is_empty(), "{:?}", normalized.warnings);
    normalized.records
}

fn portfolio() -> InMemorySource {
    portfolio_records().into_iter().collect()
}

/// KUR records across branch 286, its sub-branches 1077 and 1596, and branch
/// 181, at several anchors of 2025-10-09.
fn portfolio_records() -> Vec<LoanSnapshotRecord> {
    rows(json!([
        // E
        {"periode": "09/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1000000", "flag_restruk": "Y", "nasabah": 1, "dub_nasabah": "TRUE"},
        {"periode": "09/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "3",
         "kolektibilitas_kurang_lancar": "500000", "nasabah": 1, "dub_nasabah": "true"},
        {"periode": "09/10/2025", "kode_uker": "1077", "code": "80065", "kol_adk": "2",
         "kolektibilitas_dpk": "250000", "os": "300000"},
        {"periode": "09/10/2025", "kode_uker": "1596", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "700000"},
        {"periode": "09/10/2025", "kode_uker": "181", "code": "80065", "kol_adk": "5",
         "kolektibilitas_macet": "80000"},
        // D
        {"periode": "08/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "1200000"},
        {"periode": "08/10/2025", "kode_uker": "1077", "code": "80065", "kol_adk": "2",
         "kolektibilitas_dpk": "100000"},
        // C
        {"periode": "30/09/2025", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "900000"},
        // A
        {"periode": "31/12/2024", "kode_uker": "181", "code": "80065", "kol_adk": "4",
         "kolektibilitas_diragukan": "40000"},
        // outside every anchor
        {"periode": "15/10/2025", "kode_uker": "286", "code": "80065", "kol_adk": "5",
         "kolektibilitas_macet": "999999"},
        // other segment
        {"periode": "09/10/2025", "kode_uker": "286", "code": "99999", "kol_adk": "5",
         "kolektibilitas_macet": "777777"},
    ]))
}

// ===========================================================================
// End-to-end scenario
// ===========================================================================

#[test]
fn test_branch_konsol_row_for_restructured_and_substandard_records() {
    let source: InMemorySource = rows(json!([
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "1",
         "flag_restruk": "Y", "kolektibilitas_lancar": "1000000", "os": "0"},
        {"periode": "2025-11-30", "kode_uker": "286", "code": "80065", "kol_adk": "3",
         "kolektibilitas_kurang_lancar": "500000", "os": "0"},
    ]))
    .into_iter()
    .collect();

    let master = MasterData::builtin();
    let query = ReportQuery::new("KUR", "lar", ymd(2025, 11, 30));
    let out = build_report(&source, &master, &query).unwrap();

    let row = out.result.konsol.row(286).unwrap();
    let e = row.figures.components.get(AnchorKey::E);
    assert_eq!(e.npl, dec!(500000));
    assert_eq!(e.restructured_current, dec!(1000000));
    assert_eq!(e.loan_at_risk, dec!(1500000));
    assert_eq!(row.figures.values.e, dec!(1500000));
    assert_eq!(row.figures.values.d, Decimal::ZERO);
}

// ===========================================================================
// Reconciliation and totals
// ===========================================================================

#[test]
fn test_konsol_reconciles_for_every_metric() {
    let source = portfolio();
    let master = MasterData::builtin();
    for metric in Metric::ALL {
        let query = ReportQuery::new("SMALL", metric.key(), ymd(2025, 10, 9));
        let out = build_report(&source, &master, &query).unwrap();
        let set = &out.result;

        for konsol in &set.konsol.rows {
            let kanca = set.kanca_only.row(konsol.branch_code).unwrap();
            for key in AnchorKey::ALL {
                let kcp_sum: Decimal = set
                    .kcp_only
                    .rows
                    .iter()
                    .filter(|r| r.branch_code == konsol.branch_code)
                    .map(|r| metric.amount(r.figures.components.get(key)))
                    .sum();
                assert_eq!(
                    metric.amount(konsol.figures.components.get(key)),
                    metric.amount(kanca.figures.components.get(key)) + kcp_sum,
                    "metric {metric} branch {} anchor {key}",
                    konsol.branch_code
                );
            }
        }
    }
}

#[test]
fn test_konsol_values_for_branch_286() {
    let out = build_report(
        &portfolio(),
        &MasterData::builtin(),
        &ReportQuery::new("KUR", "os", ymd(2025, 10, 9)),
    )
    .unwrap();
    let set = &out.result;

    // 1,000,000 + 500,000 + 300,000 (exposure wins) + 700,000
    assert_eq!(set.konsol.row(286).unwrap().figures.values.e, dec!(2500000));
    assert_eq!(set.kanca_only.row(286).unwrap().figures.values.e, dec!(1500000));
    assert_eq!(set.kcp_only.row(1077).unwrap().figures.values.e, dec!(300000));
    assert_eq!(set.konsol.row(286).unwrap().figures.values.d, dec!(1300000));
    assert_eq!(set.konsol.row(286).unwrap().figures.values.c, dec!(900000));
    assert_eq!(set.konsol.row(181).unwrap().figures.values.a, dec!(40000));
}

#[test]
fn test_total_deltas_recomputed_and_match_row_sums_for_additive_metrics() {
    let master = MasterData::builtin();
    for metric in ["os", "npl", "sml", "lr", "lar", "nsb"] {
        let out = build_report(&portfolio(), &master, &ReportQuery::new("KUR", metric, ymd(2025, 10, 9))).unwrap();
        for table in [&out.result.konsol, &out.result.kanca_only, &out.result.kcp_only] {
            for kind in DeltaKind::ALL {
                let row_sum: Decimal = table.rows.iter().map(|r| r.figures.deltas.get(kind).abs).sum();
                assert_eq!(table.total.figures.deltas.get(kind).abs, row_sum, "{metric} {kind}");
            }
            let e_sum: Decimal = table.rows.iter().map(|r| r.figures.values.e).sum();
            assert_eq!(table.total.figures.values.e, e_sum);
        }
    }
}

#[test]
fn test_ratio_total_uses_summed_components() {
    let out = build_report(
        &portfolio(),
        &MasterData::builtin(),
        &ReportQuery::new("KUR", "npl_pct", ymd(2025, 10, 9)),
    )
    .unwrap();
    let total = &out.result.konsol.total.figures;
    let e = total.components.get(AnchorKey::E);
    // npl 580,000 over outstanding 2,580,000
    assert_eq!(e.npl, dec!(580000));
    assert_eq!(e.outstanding, dec!(2580000));
    assert_eq!(total.values.e, e.npl / e.outstanding * dec!(100));
}

#[test]
fn test_grand_total_delta_percentages() {
    let out = build_report(
        &portfolio(),
        &MasterData::builtin(),
        &ReportQuery::new("KUR", "os", ymd(2025, 10, 9)),
    )
    .unwrap();
    let total = &out.result.konsol.total.figures;
    assert_eq!(total.values.e, dec!(2580000));
    assert_eq!(total.values.d, dec!(1300000));
    assert_eq!(total.deltas.dtd.abs, dec!(1280000));
    assert_eq!(total.deltas.dtd.pct, dec!(1280000) / dec!(1300000) * dec!(100));
    // B has no data: percentage defined as zero
    assert_eq!(total.values.b, Decimal::ZERO);
    assert_eq!(total.deltas.mom.pct, Decimal::ZERO);
}

// ===========================================================================
// Row policy, ordering, unmapped units
// ===========================================================================

#[test]
fn test_rows_driven_by_master() {
    let master = MasterData::builtin();
    let out = build_report(&portfolio(), &master, &ReportQuery::new("MEDIUM", "os", ymd(2025, 10, 9))).unwrap();
    let set = &out.result;
    assert_eq!(set.konsol.rows.len(), master.hierarchy.branch_count());
    assert_eq!(set.kanca_only.rows.len(), master.hierarchy.branch_count());
    assert_eq!(set.kcp_only.rows.len(), master.hierarchy.sub_branch_count());
    assert!(set.konsol.rows.iter().all(|r| r.figures.values.e.is_zero()));
}

#[test]
fn test_with_data_only_lists_sub_branches_present_in_data() {
    let mut query = ReportQuery::new("KUR", "os", ymd(2025, 10, 9));
    query.sub_branch_rows = SubBranchRows::WithDataOnly;
    let out = build_report(&portfolio(), &MasterData::builtin(), &query).unwrap();
    let codes: Vec<u32> = out.result.kcp_only.rows.iter().map(|r| r.unit_code).collect();
    assert_eq!(codes, vec![1077, 1596]);
    assert_eq!(out.result.konsol.row(286).unwrap().figures.values.e, dec!(2500000));
}

#[test]
fn test_row_ordering() {
    let master = MasterData::builtin();
    let out = build_report(&portfolio(), &master, &ReportQuery::new("KUR", "os", ymd(2025, 10, 9))).unwrap();
    let names: Vec<String> = out.result.konsol.rows.iter().map(|r| r.branch_name.to_lowercase()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let keys: Vec<(u32, u32)> = out.result.kcp_only.rows.iter().map(|r| (r.branch_code, r.unit_code)).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_unmapped_codes_are_reported_not_dropped() {
    let mut records = portfolio_records();
    records.extend(rows(json!([
        {"periode": "09/10/2025", "kode_uker": "9999", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "123"},
    ])));
    let source: InMemorySource = records.into_iter().collect();

    let out = build_report(&source, &MasterData::builtin(), &ReportQuery::new("KUR", "os", ymd(2025, 10, 9))).unwrap();
    assert_eq!(out.result.unmapped.len(), 1);
    assert_eq!(out.result.unmapped[0].org_unit_code, "9999");
    assert_eq!(out.result.unmapped[0].values.e, dec!(123));
    assert!(out.warnings.iter().any(|w| w.contains("9999")));
    assert_eq!(out.result.konsol.total.figures.values.e, dec!(2580000));
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_unknown_segment_or_metric_rejected() {
    let master = MasterData::builtin();
    let source = portfolio();
    let err = build_report(&source, &master, &ReportQuery::new("RETAIL", "os", ymd(2025, 10, 9))).unwrap_err();
    assert!(matches!(err, LoanRiskError::UnknownSegment(_)));
    let err = build_report(&source, &master, &ReportQuery::new("KUR", "roe", ymd(2025, 10, 9))).unwrap_err();
    assert!(matches!(err, LoanRiskError::UnknownMetric(_)));
}

#[test]
fn test_delinquency_filter() {
    let mut query = ReportQuery::new("KUR", "os", ymd(2025, 10, 9));
    query.delinquency_codes = Some(vec![DelinquencyCode::SpecialMention]);
    let out = build_report(&portfolio(), &MasterData::builtin(), &query).unwrap();
    assert_eq!(out.result.konsol.total.figures.values.e, dec!(300000));
}

#[test]
fn test_org_unit_filter_includes_zero_padded_codes() {
    let mut records = portfolio_records();
    records.extend(rows(json!([
        {"periode": "09/10/2025", "kode_uker": "0286", "code": "80065", "kol_adk": "1",
         "kolektibilitas_lancar": "50000"},
    ])));
    let source: InMemorySource = records.into_iter().collect();

    let mut query = ReportQuery::new("KUR", "os", ymd(2025, 10, 9));
    query.org_units = Some(vec!["286".into()]);
    let out = build_report(&source, &MasterData::builtin(), &query).unwrap();

    let kanca = out.result.kanca_only.row(286).unwrap();
    assert_eq!(kanca.figures.values.e, dec!(1550000));
    assert_eq!(out.result.konsol.row(286).unwrap().figures.values.e, dec!(1550000));
    assert_eq!(out.result.konsol.total.figures.values.e, dec!(1550000));
    assert!(out.result.unmapped.is_empty());
}

#[test]
fn test_non_numeric_org_unit_rejected() {
    let mut query = ReportQuery::new("KUR", "os", ymd(2025, 10, 9));
    query.org_units = Some(vec!["KC-286".into()]);
    let err = build_report(&portfolio(), &MasterData::builtin(), &query).unwrap_err();
    assert!(matches!(err, LoanRiskError::InvalidInput { .. }));
}

// ===========================================================================
// Segment scope
// ===========================================================================

#[test]
fn test_small_report_leaves_out_unclassified_products() {
    // Branch 286 holds a 777,777 loss-bucket loan under an unknown product code.
    let master = MasterData::builtin();
    let small = build_report(&portfolio(), &master, &ReportQuery::new("SMALL", "os", ymd(2025, 10, 9))).unwrap();
    let kur = build_report(&portfolio(), &master, &ReportQuery::new("KUR", "os", ymd(2025, 10, 9))).unwrap();
    assert_eq!(small.result.konsol.total.figures.values.e, dec!(2580000));
    assert_eq!(
        small.result.konsol.row(286).unwrap().figures.values,
        kur.result.konsol.row(286).unwrap().figures.values
    );

    let other = build_report(&portfolio(), &master, &ReportQuery::new("OTHER", "os", ymd(2025, 10, 9))).unwrap();
    assert_eq!(other.result.konsol.total.figures.values.e, dec!(777777));
}

// ===========================================================================
// Commitments
// ===========================================================================

#[test]
fn test_commitment_columns() {
    let kur = |os: Decimal| -> BTreeMap<CommitmentFamily, CommitmentFigures> {
        [(
            CommitmentFamily::Kur,
            CommitmentFigures {
                outstanding: os,
                ..Default::default()
            },
        )]
        .into()
    };
    let mut query = ReportQuery::new("KUR", "os", ymd(2025, 10, 9));
    query.commitments = Some(CommitmentDataset {
        entries: vec![
            CommitmentEntry { year: 2025, month: 10, org_unit_code: 286, branch_code: 286, families: kur(dec!(2)) },
            CommitmentEntry { year: 2025, month: 10, org_unit_code: 1077, branch_code: 286, families: kur(dec!(3)) },
        ],
    });
    let out = build_report(&portfolio(), &MasterData::builtin(), &query).unwrap();
    let set = &out.result;

    // KONSOL: 2.5 realised against 5 target
    let konsol = set.konsol.row(286).unwrap().commitment.unwrap();
    assert_eq!(konsol.target, Some(dec!(5)));
    assert_eq!(konsol.achievement_pct, Some(dec!(50)));
    assert_eq!(konsol.gap, Some(dec!(-2.5)));

    // KANCA_ONLY: 1.5 against 2
    let kanca = set.kanca_only.row(286).unwrap().commitment.unwrap();
    assert_eq!(kanca.achievement_pct, Some(dec!(75)));

    // no target for 1596
    let kcp = set.kcp_only.row(1596).unwrap().commitment.unwrap();
    assert_eq!(kcp.target, None);

    assert_eq!(set.konsol.total.commitment.unwrap().target, Some(dec!(5)));
}
