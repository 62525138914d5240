//! Monthly commitment (target) figures shown beside realised values.
//!
//! Targets are stored in millions. Achievement is capped at 110% and floored
//! at 0%; for metrics where lower is better the ratio is inverted.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::metrics::{Metric, MetricValues};
use crate::segmentation::Segment;
use crate::types::{percent_of, UnitCode};

const ACHIEVEMENT_CAP: Decimal = dec!(110);
const MILLION: Decimal = dec!(1000000);

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Product family a commitment is set for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommitmentFamily {
    Kur,
    Small,
    Ncc,
    Cc,
}

impl CommitmentFamily {
    pub fn for_segment(segment: Segment) -> Option<Self> {
        match segment {
            Segment::Small => Some(CommitmentFamily::Small),
            Segment::SmallNcc => Some(CommitmentFamily::Ncc),
            Segment::Cc => Some(CommitmentFamily::Cc),
            Segment::Kur => Some(CommitmentFamily::Kur),
            Segment::Medium | Segment::Other => None,
        }
    }
}

/// Target figures for one family, in millions (debtors as a count).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitmentFigures {
    pub debtors: Decimal,
    pub outstanding: Decimal,
    pub performing: Decimal,
    pub npl: Decimal,
    pub special_mention: Decimal,
}

impl AddAssign for CommitmentFigures {
    fn add_assign(&mut self, rhs: Self) {
        self.debtors += rhs.debtors;
        self.outstanding += rhs.outstanding;
        self.performing += rhs.performing;
        self.npl += rhs.npl;
        self.special_mention += rhs.special_mention;
    }
}

/// One org unit's commitments for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentEntry {
    pub year: i32,
    pub month: u32,
    pub org_unit_code: UnitCode,
    pub branch_code: UnitCode,
    #[serde(default)]
    pub families: BTreeMap<CommitmentFamily, CommitmentFigures>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitmentDataset {
    pub entries: Vec<CommitmentEntry>,
}

impl CommitmentDataset {
    fn month(&self, year: i32, month: u32) -> impl Iterator<Item = &CommitmentEntry> {
        self.entries
            .iter()
            .filter(move |e| e.year == year && e.month == month)
    }

    /// Figures of one org unit.
    pub fn unit_figures(
        &self,
        year: i32,
        month: u32,
        unit: UnitCode,
        family: CommitmentFamily,
    ) -> Option<CommitmentFigures> {
        sum_figures(
            self.month(year, month)
                .filter(|e| e.org_unit_code == unit)
                .filter_map(|e| e.families.get(&family)),
        )
    }

    /// Figures summed over every entry filed under `branch`.
    pub fn branch_figures(
        &self,
        year: i32,
        month: u32,
        branch: UnitCode,
        family: CommitmentFamily,
    ) -> Option<CommitmentFigures> {
        sum_figures(
            self.month(year, month)
                .filter(|e| e.branch_code == branch)
                .filter_map(|e| e.families.get(&family)),
        )
    }
}

/// `None` when the iterator is empty.
pub(crate) fn sum_figures<'a>(
    figures: impl Iterator<Item = &'a CommitmentFigures>,
) -> Option<CommitmentFigures> {
    figures.fold(None, |acc, f| {
        let mut total = acc.unwrap_or_default();
        total += *f;
        Some(total)
    })
}

// ---------------------------------------------------------------------------
// Achievement
// ---------------------------------------------------------------------------

/// Target, achievement and gap for one row. All `None` when the target is
/// missing or zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentCell {
    pub target: Option<Decimal>,
    pub achievement_pct: Option<Decimal>,
    pub gap: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetField {
    Debtors,
    Outstanding,
    Performing,
    Npl,
    SpecialMention,
}

impl TargetField {
    fn pick(self, f: &CommitmentFigures) -> Decimal {
        match self {
            TargetField::Debtors => f.debtors,
            TargetField::Outstanding => f.outstanding,
            TargetField::Performing => f.performing,
            TargetField::Npl => f.npl,
            TargetField::SpecialMention => f.special_mention,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    /// Compared against realised value in millions.
    Amount(TargetField),
    /// Compared against the realised count as-is.
    Count,
    /// `field / outstanding * 100`, compared against the realised ratio.
    Ratio(TargetField),
}

fn target_kind(metric: Metric) -> Option<TargetKind> {
    match metric {
        Metric::Outstanding => Some(TargetKind::Amount(TargetField::Outstanding)),
        Metric::Npl => Some(TargetKind::Amount(TargetField::Npl)),
        Metric::SpecialMention => Some(TargetKind::Amount(TargetField::SpecialMention)),
        Metric::LoanAtRisk => Some(TargetKind::Amount(TargetField::Performing)),
        Metric::CustomerCount => Some(TargetKind::Count),
        Metric::SpecialMentionRatio => Some(TargetKind::Ratio(TargetField::SpecialMention)),
        Metric::NplRatio => Some(TargetKind::Ratio(TargetField::Npl)),
        Metric::RestructuredCurrent | Metric::RestructuredRatio | Metric::LoanAtRiskRatio => None,
    }
}

/// Achievement percentage, clamped to `0..=110`. A ratio that cannot be
/// formed (zero divisor or overflow) counts as capped.
pub fn achievement(realised: Decimal, target: Decimal, lower_is_better: bool) -> Decimal {
    let ratio = if lower_is_better {
        target.checked_div(realised)
    } else {
        realised.checked_div(target)
    };
    ratio
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(ACHIEVEMENT_CAP, |pct| pct.clamp(Decimal::ZERO, ACHIEVEMENT_CAP))
}

/// Commitment lookup bound to one report's segment, metric and month.
#[derive(Debug, Clone, Copy)]
pub struct CommitmentContext<'a> {
    dataset: &'a CommitmentDataset,
    family: CommitmentFamily,
    metric: Metric,
    kind: TargetKind,
    year: i32,
    month: u32,
}

impl<'a> CommitmentContext<'a> {
    /// `None` when the segment or metric has no commitment counterpart.
    pub fn new(
        dataset: &'a CommitmentDataset,
        segment: Segment,
        metric: Metric,
        selected: NaiveDate,
    ) -> Option<Self> {
        Some(Self {
            dataset,
            family: CommitmentFamily::for_segment(segment)?,
            metric,
            kind: target_kind(metric)?,
            year: selected.year(),
            month: selected.month(),
        })
    }

    pub fn unit_figures(&self, unit: UnitCode) -> Option<CommitmentFigures> {
        self.dataset
            .unit_figures(self.year, self.month, unit, self.family)
    }

    pub fn branch_figures(&self, branch: UnitCode) -> Option<CommitmentFigures> {
        self.dataset
            .branch_figures(self.year, self.month, branch, self.family)
    }

    fn target(&self, figures: &CommitmentFigures) -> Decimal {
        match self.kind {
            TargetKind::Amount(field) => field.pick(figures),
            TargetKind::Count => figures.debtors,
            TargetKind::Ratio(field) => percent_of(field.pick(figures), figures.outstanding),
        }
    }

    fn realised(&self, values: &MetricValues) -> Decimal {
        let value = self.metric.value(values);
        match self.kind {
            TargetKind::Amount(_) => value / MILLION,
            TargetKind::Count | TargetKind::Ratio(_) => value,
        }
    }

    /// Cell for a row whose realised anchor-E components are `values`.
    pub fn cell(&self, figures: Option<&CommitmentFigures>, values: &MetricValues) -> CommitmentCell {
        let target = match figures.map(|f| self.target(f)) {
            Some(t) if !t.is_zero() => t,
            _ => return CommitmentCell::default(),
        };
        let realised = self.realised(values);
        CommitmentCell {
            target: Some(target),
            achievement_pct: Some(achievement(realised, target, self.metric.lower_is_better())),
            gap: Some(realised - target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dataset() -> CommitmentDataset {
        let figures = |os: Decimal, npl: Decimal| CommitmentFigures {
            debtors: dec!(40),
            outstanding: os,
            performing: os - npl,
            npl,
            special_mention: dec!(2),
        };
        CommitmentDataset {
            entries: vec![
                CommitmentEntry {
                    year: 2025,
                    month: 10,
                    org_unit_code: 286,
                    branch_code: 286,
                    families: [(CommitmentFamily::Kur, figures(dec!(100), dec!(4)))].into(),
                },
                CommitmentEntry {
                    year: 2025,
                    month: 10,
                    org_unit_code: 1077,
                    branch_code: 286,
                    families: [(CommitmentFamily::Kur, figures(dec!(50), dec!(1)))].into(),
                },
                CommitmentEntry {
                    year: 2025,
                    month: 9,
                    org_unit_code: 286,
                    branch_code: 286,
                    families: [(CommitmentFamily::Kur, figures(dec!(999), dec!(9)))].into(),
                },
            ],
        }
    }

    fn october() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 9).unwrap()
    }

    #[test]
    fn test_achievement_caps_and_floors() {
        assert_eq!(achievement(dec!(200), dec!(100), false), dec!(110));
        assert_eq!(achievement(dec!(90), dec!(100), false), dec!(90));
        assert_eq!(achievement(dec!(-5), dec!(100), false), Decimal::ZERO);
        assert_eq!(achievement(dec!(5), dec!(4), true), dec!(80));
        assert_eq!(achievement(Decimal::ZERO, dec!(4), true), dec!(110));
    }

    #[test]
    fn test_achievement_against_zero_target_is_capped() {
        assert_eq!(achievement(dec!(5), Decimal::ZERO, false), dec!(110));
        assert_eq!(achievement(Decimal::ZERO, Decimal::ZERO, false), dec!(110));
        assert_eq!(achievement(Decimal::MAX, dec!(0.5), false), dec!(110));
    }

    #[test]
    fn test_branch_figures_sum_all_units_of_month() {
        let ds = dataset();
        let f = ds.branch_figures(2025, 10, 286, CommitmentFamily::Kur).unwrap();
        assert_eq!(f.outstanding, dec!(150));
        assert_eq!(f.npl, dec!(5));
        assert_eq!(ds.unit_figures(2025, 10, 1077, CommitmentFamily::Kur).unwrap().outstanding, dec!(50));
        assert!(ds.unit_figures(2025, 10, 1077, CommitmentFamily::Cc).is_none());
    }

    #[test]
    fn test_outstanding_cell_scales_to_millions() {
        let ds = dataset();
        let ctx = CommitmentContext::new(&ds, Segment::Kur, Metric::Outstanding, october()).unwrap();
        let values = MetricValues {
            outstanding: dec!(120000000),
            ..Default::default()
        };
        let cell = ctx.cell(ctx.unit_figures(286).as_ref(), &values);
        assert_eq!(
            cell,
            CommitmentCell {
                target: Some(dec!(100)),
                achievement_pct: Some(dec!(110)),
                gap: Some(dec!(20)),
            }
        );
    }

    #[test]
    fn test_npl_ratio_is_inverted() {
        let ds = dataset();
        let ctx = CommitmentContext::new(&ds, Segment::Kur, Metric::NplRatio, october()).unwrap();
        // realised 5%, target 4%
        let values = MetricValues {
            outstanding: dec!(1000),
            npl: dec!(50),
            ..Default::default()
        };
        let cell = ctx.cell(ctx.unit_figures(286).as_ref(), &values);
        assert_eq!(cell.target, Some(dec!(4)));
        assert_eq!(cell.achievement_pct, Some(dec!(80)));
        assert_eq!(cell.gap, Some(dec!(1)));
    }

    #[test]
    fn test_missing_or_zero_target_is_no_value() {
        let ds = dataset();
        let ctx = CommitmentContext::new(&ds, Segment::Kur, Metric::Outstanding, october()).unwrap();
        let values = MetricValues::default();
        assert_eq!(ctx.cell(None, &values), CommitmentCell::default());
        assert_eq!(ctx.cell(Some(&CommitmentFigures::default()), &values), CommitmentCell::default());
    }

    #[test]
    fn test_no_context_for_unmapped_segment_or_metric() {
        let ds = dataset();
        assert!(CommitmentContext::new(&ds, Segment::Medium, Metric::Outstanding, october()).is_none());
        assert!(CommitmentContext::new(&ds, Segment::Kur, Metric::RestructuredCurrent, october()).is_none());
    }
}
