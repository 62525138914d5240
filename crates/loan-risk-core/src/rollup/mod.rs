//! Report orchestration: validate the request, group records once across
//! all anchors, roll up through the org hierarchy, reconcile, and enrich
//! with commitments when provided.

pub mod commitment;
pub mod grouping;
pub mod tables;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::anchors::{self, AnchorDates, AnchorValues, DeltaWindow};
use crate::error::LoanRiskError;
use crate::hierarchy::parse_unit_code;
use crate::master::MasterData;
use crate::metrics::{Metric, MetricValues};
use crate::segmentation::Segment;
use crate::snapshot::{DelinquencyCode, RecordSource};
use crate::types::{with_metadata, ComputationOutput, UnitCode};
use crate::LoanRiskResult;

pub use commitment::{
    CommitmentCell, CommitmentContext, CommitmentDataset, CommitmentEntry, CommitmentFamily,
    CommitmentFigures,
};
pub use grouping::{group_by_anchor, group_by_unit, Grouped, RecordFilter};
pub use tables::{build_tables, reconcile, Figures, ReportRow, ReportTable, TableKind, Tables, TotalRow};

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Which sub-branches get a KCP_ONLY row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubBranchRows {
    /// Every sub-branch in the master, zero rows included.
    #[default]
    AllFromMaster,
    /// Only sub-branches with filtered data at one or more anchors.
    WithDataOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Segment name, e.g. `SMALL`, `small_ncc`, `KUR`.
    pub segment: String,
    /// Metric key, e.g. `os`, `npl`, `lar_pct`.
    pub metric: String,
    pub selected_date: NaiveDate,
    #[serde(default)]
    pub delinquency_codes: Option<Vec<DelinquencyCode>>,
    #[serde(default)]
    pub org_units: Option<Vec<String>>,
    #[serde(default)]
    pub sub_branch_rows: SubBranchRows,
    #[serde(default)]
    pub commitments: Option<CommitmentDataset>,
}

impl ReportQuery {
    pub fn new(segment: &str, metric: &str, selected_date: NaiveDate) -> Self {
        Self {
            segment: segment.to_string(),
            metric: metric.to_string(),
            selected_date,
            delinquency_codes: None,
            org_units: None,
            sub_branch_rows: SubBranchRows::default(),
            commitments: None,
        }
    }

    /// Resolve names into a typed filter. Runs before any aggregation.
    pub fn validate(&self) -> LoanRiskResult<(Segment, Metric, RecordFilter)> {
        let segment: Segment = self.segment.parse()?;
        let metric: Metric = self.metric.parse()?;

        let mut filter = RecordFilter::new(segment);
        if let Some(ref codes) = self.delinquency_codes {
            if codes.is_empty() {
                return Err(LoanRiskError::InvalidInput {
                    field: "delinquency_codes".into(),
                    reason: "must name at least one code when present".into(),
                });
            }
            filter.delinquency = Some(codes.iter().copied().collect());
        }
        if let Some(ref units) = self.org_units {
            let mut codes = BTreeSet::new();
            for raw in units.iter().filter(|u| !u.trim().is_empty()) {
                let code = parse_unit_code(raw).ok_or_else(|| LoanRiskError::InvalidInput {
                    field: "org_units".into(),
                    reason: format!("'{}' is not a numeric org-unit code", raw.trim()),
                })?;
                codes.insert(code);
            }
            if codes.is_empty() {
                return Err(LoanRiskError::InvalidInput {
                    field: "org_units".into(),
                    reason: "must name at least one org unit when present".into(),
                });
            }
            filter.org_units = Some(codes);
        }
        Ok((segment, metric, filter))
    }
}

/// Figures of an org-unit code the master does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedUnit {
    pub org_unit_code: String,
    pub values: AnchorValues<Decimal>,
    pub components: AnchorValues<MetricValues>,
}

/// Everything a presentation layer needs for one report request.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSet {
    pub segment: Segment,
    pub metric: Metric,
    pub anchors: AnchorDates,
    pub windows: Vec<DeltaWindow>,
    pub konsol: ReportTable,
    pub kanca_only: ReportTable,
    pub kcp_only: ReportTable,
    pub unmapped: Vec<UnmappedUnit>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build KONSOL, KANCA_ONLY and KCP_ONLY for one segment, metric and date.
pub fn build_report<S: RecordSource + ?Sized>(
    source: &S,
    master: &MasterData,
    query: &ReportQuery,
) -> LoanRiskResult<ComputationOutput<ReportSet>> {
    let start = Instant::now();
    let (segment, metric, filter) = query.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let anchors = anchors::resolve(query.selected_date)?;
    let grouped = group_by_unit(source, &master.segments, &anchors, &filter);

    // Split mapped from unmapped codes. Textual variants of one code ("0286",
    // "286") merge.
    let mut mapped: BTreeMap<UnitCode, AnchorValues<MetricValues>> = BTreeMap::new();
    let mut unmapped = Vec::new();
    for (code, components) in grouped.sums {
        match parse_unit_code(&code).filter(|c| master.hierarchy.resolve(*c).is_mapped()) {
            Some(unit) => *mapped.entry(unit).or_default() += components,
            None => {
                let msg = format!("org unit '{code}' is not in the master hierarchy; excluded from all tables");
                tracing::warn!(org_unit = %code, "unmapped org unit");
                warnings.push(msg);
                unmapped.push(UnmappedUnit {
                    org_unit_code: code,
                    values: components.map(|v| metric.value(v)),
                    components,
                });
            }
        }
    }

    let mut tables = build_tables(&master.hierarchy, &mapped, metric, query.sub_branch_rows);
    reconcile(&tables)?;

    if let Some(ref dataset) = query.commitments {
        match CommitmentContext::new(dataset, segment, metric, query.selected_date) {
            Some(ctx) => {
                tables.konsol.enrich(&ctx);
                tables.kanca_only.enrich(&ctx);
                tables.kcp_only.enrich(&ctx);
            }
            None => warnings.push(format!(
                "no commitment targets exist for segment {segment} and metric {metric}"
            )),
        }
    }

    let assumptions = serde_json::json!({
        "segment": segment,
        "metric": metric.key(),
        "selected_date": query.selected_date,
        "sub_branch_rows": query.sub_branch_rows,
        "records_scanned": grouped.records_scanned,
        "records_matched": grouped.records_matched,
    });

    let windows = anchors.windows();
    let result = ReportSet {
        segment,
        metric,
        anchors,
        windows,
        konsol: tables.konsol,
        kanca_only: tables.kanca_only,
        kcp_only: tables.kcp_only,
        unmapped,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-pass anchor grouping with KONSOL = KANCA_ONLY + KCP_ONLY rollup",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}
