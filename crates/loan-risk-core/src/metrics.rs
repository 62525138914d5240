//! Per-record risk and exposure metrics.
//!
//! Covers:
//! 1. **Outstanding** -- exposure field when populated, else the bucket sum.
//! 2. **NPL** -- exposure (or substandard + doubtful + loss) for codes 3-5.
//! 3. **Special mention (SML/DPK)** -- exposure (or the SML bucket) for code 2.
//! 4. **Restructured current (LR)** -- current bucket for restructured code-1 loans.
//! 5. **Loan at risk (LAR)** -- SML + NPL + LR, by construction.
//! 6. **Customer count** -- flagged customer count.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::LoanRiskError;
use crate::snapshot::{DelinquencyCode, LoanSnapshotRecord};
use crate::types::{percent_of, Money};
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Every additive metric for one record, or a sum of such records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValues {
    pub outstanding: Money,
    pub npl: Money,
    pub special_mention: Money,
    pub restructured_current: Money,
    pub loan_at_risk: Money,
    pub customer_count: Decimal,
}

impl MetricValues {
    /// LAR must equal SML + NPL + LR exactly.
    pub fn check_lar(&self) -> LoanRiskResult<()> {
        let expected = self.special_mention + self.npl + self.restructured_current;
        if self.loan_at_risk != expected {
            return Err(LoanRiskError::InvariantViolation {
                check: "loan_at_risk additivity".into(),
                detail: format!(
                    "LAR {} != SML {} + NPL {} + LR {}",
                    self.loan_at_risk, self.special_mention, self.npl, self.restructured_current
                ),
            });
        }
        Ok(())
    }
}

impl AddAssign for MetricValues {
    fn add_assign(&mut self, rhs: Self) {
        self.outstanding += rhs.outstanding;
        self.npl += rhs.npl;
        self.special_mention += rhs.special_mention;
        self.restructured_current += rhs.restructured_current;
        self.loan_at_risk += rhs.loan_at_risk;
        self.customer_count += rhs.customer_count;
    }
}

impl Add for MetricValues {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for MetricValues {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a MetricValues> for MetricValues {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Derive all metric values for one record.
pub fn compute(record: &LoanSnapshotRecord) -> MetricValues {
    let exposure = record.exposure_amount;
    let has_exposure = exposure > Decimal::ZERO;
    let buckets = &record.buckets;

    let outstanding = if has_exposure {
        exposure
    } else {
        buckets.total()
    };

    let npl = match record.delinquency {
        Some(code) if code.is_non_performing() => {
            if has_exposure {
                exposure
            } else {
                buckets.non_performing()
            }
        }
        _ => Decimal::ZERO,
    };

    let special_mention = match record.delinquency {
        Some(DelinquencyCode::SpecialMention) => {
            if has_exposure {
                exposure
            } else {
                buckets.special_mention
            }
        }
        _ => Decimal::ZERO,
    };

    let restructured_current = match record.delinquency {
        Some(DelinquencyCode::Current) if record.restructured => buckets.current,
        _ => Decimal::ZERO,
    };

    let customer_count = if record.customer_flag {
        record.customer_count
    } else {
        Decimal::ZERO
    };

    let values = MetricValues {
        outstanding,
        npl,
        special_mention,
        restructured_current,
        loan_at_risk: special_mention + npl + restructured_current,
        customer_count,
    };
    debug_assert!(values.check_lar().is_ok());
    values
}

// ---------------------------------------------------------------------------
// Metric selector
// ---------------------------------------------------------------------------

/// A reportable metric. Ratio metrics are `numerator / outstanding * 100`
/// over summed components and are never summed themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Outstanding,
    Npl,
    SpecialMention,
    RestructuredCurrent,
    LoanAtRisk,
    CustomerCount,
    SpecialMentionRatio,
    NplRatio,
    RestructuredRatio,
    LoanAtRiskRatio,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::Outstanding,
        Metric::Npl,
        Metric::SpecialMention,
        Metric::RestructuredCurrent,
        Metric::LoanAtRisk,
        Metric::CustomerCount,
        Metric::SpecialMentionRatio,
        Metric::NplRatio,
        Metric::RestructuredRatio,
        Metric::LoanAtRiskRatio,
    ];

    /// Short key used on the command line and in report titles.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Outstanding => "os",
            Metric::Npl => "npl",
            Metric::SpecialMention => "sml",
            Metric::RestructuredCurrent => "lr",
            Metric::LoanAtRisk => "lar",
            Metric::CustomerCount => "nsb",
            Metric::SpecialMentionRatio => "dpk_pct",
            Metric::NplRatio => "npl_pct",
            Metric::RestructuredRatio => "lr_pct",
            Metric::LoanAtRiskRatio => "lar_pct",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Outstanding => "Outstanding",
            Metric::Npl => "NPL",
            Metric::SpecialMention => "Special Mention",
            Metric::RestructuredCurrent => "Restructured Current",
            Metric::LoanAtRisk => "Loan at Risk",
            Metric::CustomerCount => "Customers",
            Metric::SpecialMentionRatio => "% Special Mention",
            Metric::NplRatio => "% NPL",
            Metric::RestructuredRatio => "% Restructured Current",
            Metric::LoanAtRiskRatio => "% Loan at Risk",
        }
    }

    pub fn is_ratio(self) -> bool {
        self.ratio_numerator().is_some()
    }

    /// The additive metric a ratio divides by outstanding.
    pub fn ratio_numerator(self) -> Option<Metric> {
        match self {
            Metric::SpecialMentionRatio => Some(Metric::SpecialMention),
            Metric::NplRatio => Some(Metric::Npl),
            Metric::RestructuredRatio => Some(Metric::RestructuredCurrent),
            Metric::LoanAtRiskRatio => Some(Metric::LoanAtRisk),
            _ => None,
        }
    }

    /// Whether a smaller realised figure is the better outcome.
    pub fn lower_is_better(self) -> bool {
        matches!(
            self,
            Metric::Npl | Metric::SpecialMention | Metric::NplRatio | Metric::SpecialMentionRatio
        )
    }

    /// Additive amount selected from summed values. For a ratio metric this
    /// is its numerator.
    pub fn amount(self, values: &MetricValues) -> Decimal {
        match self.ratio_numerator().unwrap_or(self) {
            Metric::Outstanding => values.outstanding,
            Metric::Npl => values.npl,
            Metric::SpecialMention => values.special_mention,
            Metric::RestructuredCurrent => values.restructured_current,
            Metric::LoanAtRisk => values.loan_at_risk,
            Metric::CustomerCount => values.customer_count,
            _ => Decimal::ZERO,
        }
    }

    /// Reported figure for summed values.
    pub fn value(self, values: &MetricValues) -> Decimal {
        if self.is_ratio() {
            percent_of(self.amount(values), values.outstanding)
        } else {
            self.amount(values)
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = LoanRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        let key = key.replace("%", "pct");
        match key.as_str() {
            "os" | "outstanding" => Ok(Metric::Outstanding),
            "npl" => Ok(Metric::Npl),
            "sml" | "dpk" | "special_mention" => Ok(Metric::SpecialMention),
            "lr" | "restructured" | "restructured_current" => Ok(Metric::RestructuredCurrent),
            "lar" | "loan_at_risk" => Ok(Metric::LoanAtRisk),
            "nsb" | "customers" | "customer_count" => Ok(Metric::CustomerCount),
            "dpk_pct" | "sml_pct" | "special_mention_ratio" => Ok(Metric::SpecialMentionRatio),
            "npl_pct" | "npl_ratio" => Ok(Metric::NplRatio),
            "lr_pct" | "restructured_ratio" => Ok(Metric::RestructuredRatio),
            "lar_pct" | "loan_at_risk_ratio" => Ok(Metric::LoanAtRiskRatio),
            _ => Err(LoanRiskError::UnknownMetric(s.to_string())),
        }
    }
}
