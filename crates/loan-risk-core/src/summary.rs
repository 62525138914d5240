//! Segment summary ("performance highlights"): every metric across the
//! segment groups for one selected date, optionally scoped to one branch
//! and the sub-branches it owns.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::anchors::{self, AnchorDates, AnchorValues, DeltaWindow, Deltas};
use crate::error::LoanRiskError;
use crate::hierarchy::parse_unit_code;
use crate::master::MasterData;
use crate::metrics::{Metric, MetricValues};
use crate::rollup::group_by_anchor;
use crate::segmentation::Segment;
use crate::snapshot::RecordSource;
use crate::types::{with_metadata, ComputationOutput, UnitCode};
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Groups and sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryGroup {
    Medium,
    SmallKur,
    Small,
    SmallNonCc,
    Cc,
    Kur,
}

impl SummaryGroup {
    pub const ALL: [SummaryGroup; 6] = [
        SummaryGroup::Medium,
        SummaryGroup::SmallKur,
        SummaryGroup::Small,
        SummaryGroup::SmallNonCc,
        SummaryGroup::Cc,
        SummaryGroup::Kur,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryGroup::Medium => "Medium",
            SummaryGroup::SmallKur => "Small + KUR",
            SummaryGroup::Small => "Small",
            SummaryGroup::SmallNonCc => "- Small Non CC",
            SummaryGroup::Cc => "- CC",
            SummaryGroup::Kur => "KUR",
        }
    }

    /// Leaf segments whose figures the group sums.
    pub fn leaves(self) -> &'static [Segment] {
        match self {
            SummaryGroup::Medium => &[Segment::Medium],
            SummaryGroup::SmallKur => &[Segment::SmallNcc, Segment::Cc, Segment::Kur],
            SummaryGroup::Small => &[Segment::SmallNcc, Segment::Cc],
            SummaryGroup::SmallNonCc => &[Segment::SmallNcc],
            SummaryGroup::Cc => &[Segment::Cc],
            SummaryGroup::Kur => &[Segment::Kur],
        }
    }
}

/// Section order and the groups each one lists.
fn sections() -> Vec<(Metric, &'static [SummaryGroup])> {
    const FULL: &[SummaryGroup] = &SummaryGroup::ALL;
    const SHORT: &[SummaryGroup] = &[
        SummaryGroup::Medium,
        SummaryGroup::SmallKur,
        SummaryGroup::Small,
        SummaryGroup::Kur,
    ];
    vec![
        (Metric::Outstanding, FULL),
        (Metric::SpecialMention, FULL),
        (Metric::SpecialMentionRatio, FULL),
        (Metric::Npl, FULL),
        (Metric::NplRatio, FULL),
        (Metric::RestructuredCurrent, FULL),
        (Metric::RestructuredRatio, SHORT),
        (Metric::LoanAtRisk, FULL),
        (Metric::LoanAtRiskRatio, SHORT),
        (Metric::CustomerCount, FULL),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub values: AnchorValues<Decimal>,
    pub deltas: Deltas,
}

impl SummaryRow {
    fn new(label: &str, components: &AnchorValues<MetricValues>, metric: Metric) -> Self {
        let values = components.map(|v| metric.value(v));
        Self {
            label: label.to_string(),
            deltas: values.deltas(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub metric: Metric,
    pub title: String,
    /// Medium + Small + KUR, recomputed from summed components.
    pub total: SummaryRow,
    pub groups: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub anchors: AnchorDates,
    pub windows: Vec<DeltaWindow>,
    /// Branch scope; `None` for the whole region.
    pub branch: Option<UnitCode>,
    pub sections: Vec<SummarySection>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

pub fn build_segment_summary<S: RecordSource + ?Sized>(
    source: &S,
    master: &MasterData,
    selected_date: NaiveDate,
    branch: Option<UnitCode>,
) -> LoanRiskResult<ComputationOutput<SegmentSummary>> {
    let start = Instant::now();
    let hierarchy = &master.hierarchy;

    let scope: Option<BTreeSet<UnitCode>> = match branch {
        Some(code) if hierarchy.resolve(code).is_branch => {
            let mut units: BTreeSet<UnitCode> = hierarchy.sub_branches_of(code).iter().copied().collect();
            units.insert(code);
            Some(units)
        }
        Some(code) => {
            return Err(LoanRiskError::InvalidInput {
                field: "branch".into(),
                reason: format!("{code} is not a branch code"),
            })
        }
        None => None,
    };

    let anchors = anchors::resolve(selected_date)?;
    let grouped = group_by_anchor(source, &anchors, |record| {
        if let Some(ref units) = scope {
            match parse_unit_code(&record.org_unit_code) {
                Some(code) if units.contains(&code) => {}
                _ => return None,
            }
        }
        let leaf = master.segments.classify(&record.classification_code);
        (leaf != Segment::Other).then_some(leaf)
    });
    let by_leaf: BTreeMap<Segment, AnchorValues<MetricValues>> = grouped.sums;

    let sum_leaves = |leaves: &[Segment]| {
        leaves
            .iter()
            .filter_map(|leaf| by_leaf.get(leaf))
            .fold(AnchorValues::<MetricValues>::default(), |acc, v| acc + *v)
    };
    let total_components = sum_leaves(&Segment::LEAVES);

    let sections = sections()
        .into_iter()
        .map(|(metric, groups)| SummarySection {
            metric,
            title: metric.label().to_string(),
            total: SummaryRow::new("Total", &total_components, metric),
            groups: groups
                .iter()
                .map(|g| SummaryRow::new(g.label(), &sum_leaves(g.leaves()), metric))
                .collect(),
        })
        .collect();

    let assumptions = serde_json::json!({
        "selected_date": selected_date,
        "branch": branch,
        "records_scanned": grouped.records_scanned,
        "records_matched": grouped.records_matched,
    });

    let windows = anchors.windows();
    let result = SegmentSummary {
        anchors,
        windows,
        branch,
        sections,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Segment summary grouped by (anchor, leaf segment) in one pass",
        &assumptions,
        Vec::new(),
        elapsed,
        result,
    ))
}
