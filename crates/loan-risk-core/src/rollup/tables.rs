//! KONSOL / KANCA_ONLY / KCP_ONLY table construction and reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::anchors::{AnchorKey, AnchorValues, Deltas};
use crate::error::LoanRiskError;
use crate::hierarchy::OrgHierarchy;
use crate::metrics::{Metric, MetricValues};
use crate::rollup::commitment::{sum_figures, CommitmentCell, CommitmentContext, CommitmentFigures};
use crate::rollup::SubBranchRows;
use crate::types::UnitCode;
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Rows and tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    /// Branch plus every sub-branch it owns.
    Konsol,
    /// The branch's own figures.
    KancaOnly,
    /// One row per sub-branch.
    KcpOnly,
}

/// Anchor values of the requested metric, their deltas, and the summed
/// components they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figures {
    pub values: AnchorValues<Decimal>,
    pub deltas: Deltas,
    pub components: AnchorValues<MetricValues>,
}

impl Figures {
    pub fn from_components(components: AnchorValues<MetricValues>, metric: Metric) -> Self {
        let values = components.map(|v| metric.value(v));
        Self {
            deltas: values.deltas(),
            values,
            components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub branch_code: UnitCode,
    pub branch_name: String,
    /// Equal to `branch_code` on KONSOL and KANCA_ONLY rows.
    pub unit_code: UnitCode,
    pub unit_name: String,
    #[serde(flatten)]
    pub figures: Figures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentCell>,
    /// Commitment figures behind `commitment`, kept for the total row.
    #[serde(skip)]
    pub(crate) commitment_figures: Option<CommitmentFigures>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRow {
    #[serde(flatten)]
    pub figures: Figures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub kind: TableKind,
    pub rows: Vec<ReportRow>,
    pub total: TotalRow,
}

impl ReportTable {
    fn new(kind: TableKind, rows: Vec<ReportRow>, metric: Metric) -> Self {
        let components = rows
            .iter()
            .fold(AnchorValues::<MetricValues>::default(), |acc, row| {
                acc + row.figures.components
            });
        Self {
            kind,
            total: TotalRow {
                figures: Figures::from_components(components, metric),
                commitment: None,
            },
            rows,
        }
    }

    pub fn row(&self, unit_code: UnitCode) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.unit_code == unit_code)
    }

    /// Attach commitment cells to every row and the total.
    pub(crate) fn enrich(&mut self, ctx: &CommitmentContext<'_>) {
        for row in &mut self.rows {
            let figures = match self.kind {
                TableKind::Konsol => ctx.branch_figures(row.branch_code),
                TableKind::KancaOnly | TableKind::KcpOnly => ctx.unit_figures(row.unit_code),
            };
            row.commitment = Some(ctx.cell(figures.as_ref(), row.figures.components.get(AnchorKey::E)));
            row.commitment_figures = figures;
        }
        let total = sum_figures(self.rows.iter().filter_map(|r| r.commitment_figures.as_ref()));
        self.total.commitment = Some(ctx.cell(
            total.as_ref(),
            self.total.figures.components.get(AnchorKey::E),
        ));
    }
}

/// The three parallel tables for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub konsol: ReportTable,
    pub kanca_only: ReportTable,
    pub kcp_only: ReportTable,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build all three tables from per-unit sums of mapped org units.
pub fn build_tables(
    hierarchy: &OrgHierarchy,
    sums: &BTreeMap<UnitCode, AnchorValues<MetricValues>>,
    metric: Metric,
    sub_branch_rows: SubBranchRows,
) -> Tables {
    let lookup = |code: UnitCode| sums.get(&code).copied().unwrap_or_default();
    let name_of = |code: UnitCode| hierarchy.name(code).unwrap_or_default().to_string();

    let by_name = hierarchy.branches_by_name();

    let kanca_rows: Vec<ReportRow> = by_name
        .iter()
        .map(|&branch| row(branch, &name_of(branch), branch, &name_of(branch), lookup(branch), metric))
        .collect();

    let konsol_rows: Vec<ReportRow> = by_name
        .iter()
        .map(|&branch| {
            let components = hierarchy
                .sub_branches_of(branch)
                .iter()
                .fold(lookup(branch), |acc, &sub| acc + lookup(sub));
            row(branch, &name_of(branch), branch, &name_of(branch), components, metric)
        })
        .collect();

    let mut kcp_rows = Vec::new();
    for branch in hierarchy.branch_codes() {
        for &sub in hierarchy.sub_branches_of(branch) {
            if sub_branch_rows == SubBranchRows::WithDataOnly && !sums.contains_key(&sub) {
                continue;
            }
            kcp_rows.push(row(branch, &name_of(branch), sub, &name_of(sub), lookup(sub), metric));
        }
    }
    kcp_rows.sort_by_key(|r| (r.branch_code, r.unit_code));

    tracing::debug!(
        konsol = konsol_rows.len(),
        kanca_only = kanca_rows.len(),
        kcp_only = kcp_rows.len(),
        "report tables built"
    );

    Tables {
        konsol: ReportTable::new(TableKind::Konsol, konsol_rows, metric),
        kanca_only: ReportTable::new(TableKind::KancaOnly, kanca_rows, metric),
        kcp_only: ReportTable::new(TableKind::KcpOnly, kcp_rows, metric),
    }
}

fn row(
    branch_code: UnitCode,
    branch_name: &str,
    unit_code: UnitCode,
    unit_name: &str,
    components: AnchorValues<MetricValues>,
    metric: Metric,
) -> ReportRow {
    ReportRow {
        branch_code,
        branch_name: branch_name.to_string(),
        unit_code,
        unit_name: unit_name.to_string(),
        figures: Figures::from_components(components, metric),
        commitment: None,
        commitment_figures: None,
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// `KONSOL[b] == KANCA_ONLY[b] + sum(KCP_ONLY rows of b)` at every anchor,
/// on every additive component, and the same for the grand totals.
pub fn reconcile(tables: &Tables) -> LoanRiskResult<()> {
    let mut expected: BTreeMap<UnitCode, AnchorValues<MetricValues>> = BTreeMap::new();
    for r in tables.kanca_only.rows.iter().chain(&tables.kcp_only.rows) {
        *expected.entry(r.branch_code).or_default() += r.figures.components;
    }

    for konsol in &tables.konsol.rows {
        let want = expected.remove(&konsol.branch_code).unwrap_or_default();
        check_equal(&format!("branch {}", konsol.branch_code), &konsol.figures.components, &want)?;
    }
    if let Some((code, _)) = expected.into_iter().find(|(_, v)| *v != AnchorValues::default()) {
        return Err(LoanRiskError::InvariantViolation {
            check: "KONSOL reconciliation".into(),
            detail: format!("branch {code} has branch or sub-branch figures but no KONSOL row"),
        });
    }

    let total = tables.kanca_only.total.figures.components + tables.kcp_only.total.figures.components;
    check_equal("grand total", &tables.konsol.total.figures.components, &total)?;

    for r in &tables.konsol.rows {
        for (_, v) in r.figures.components.iter() {
            v.check_lar()?;
        }
    }
    Ok(())
}

fn check_equal(
    what: &str,
    konsol: &AnchorValues<MetricValues>,
    parts: &AnchorValues<MetricValues>,
) -> LoanRiskResult<()> {
    for key in AnchorKey::ALL {
        if konsol.get(key) != parts.get(key) {
            return Err(LoanRiskError::InvariantViolation {
                check: "KONSOL reconciliation".into(),
                detail: format!(
                    "{what} anchor {key}: KONSOL {:?} != KANCA_ONLY + KCP_ONLY {:?}",
                    konsol.get(key),
                    parts.get(key)
                ),
            });
        }
    }
    Ok(())
}
