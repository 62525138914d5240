//! Anchor dates and comparison windows derived from one selected date.
//!
//! | Key | Date                                   |
//! |-----|----------------------------------------|
//! | A   | 31 December of the previous year       |
//! | B   | same day one month earlier (clamped)   |
//! | C   | last day of the previous month         |
//! | D   | the day before the selected date       |
//! | E   | the selected date                      |
//!
//! Windows: `DtD = E - D`, `MoM = E - B`, `MtD = E - C`, `YtD = E - A`.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::error::LoanRiskError;
use crate::types::{percent_of, Percent};
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnchorKey {
    A,
    B,
    C,
    D,
    E,
}

impl AnchorKey {
    pub const ALL: [AnchorKey; 5] = [AnchorKey::A, AnchorKey::B, AnchorKey::C, AnchorKey::D, AnchorKey::E];
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnchorKey::A => "A",
            AnchorKey::B => "B",
            AnchorKey::C => "C",
            AnchorKey::D => "D",
            AnchorKey::E => "E",
        };
        f.write_str(s)
    }
}

/// One resolved anchor with its display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorDate {
    pub key: AnchorKey,
    pub date: NaiveDate,
    /// `dd-Mon-yy`, e.g. `09-Oct-25`.
    pub label: String,
    pub description: String,
}

impl AnchorDate {
    fn new(key: AnchorKey, date: NaiveDate, description: String) -> Self {
        Self {
            key,
            date,
            label: date.format("%d-%b-%y").to_string(),
            description,
        }
    }
}

/// The five anchors for a selected date. Only `resolve` constructs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorDates {
    pub selected: NaiveDate,
    anchors: Vec<AnchorDate>,
}

impl AnchorDates {
    pub fn get(&self, key: AnchorKey) -> &AnchorDate {
        // filled in `AnchorKey::ALL` order
        &self.anchors[key as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchorDate> {
        self.anchors.iter()
    }

    pub fn date(&self, key: AnchorKey) -> NaiveDate {
        self.get(key).date
    }

    /// Distinct anchor dates, ascending. Anchors may coincide (e.g. C == D
    /// on the first of a month).
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.anchors.iter().map(|a| a.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Every anchor whose date equals `period`.
    pub fn keys_for(&self, period: NaiveDate) -> impl Iterator<Item = AnchorKey> + '_ {
        self.anchors
            .iter()
            .filter(move |a| a.date == period)
            .map(|a| a.key)
    }

    /// The four comparison windows with their column headers.
    pub fn windows(&self) -> Vec<DeltaWindow> {
        DeltaKind::ALL
            .iter()
            .map(|&kind| {
                let end = self.date(AnchorKey::E);
                let start = self.date(kind.base());
                DeltaWindow {
                    kind,
                    label: kind.to_string(),
                    header: format!("{} - {}", end.format("%d %b"), start.format("%d %b")),
                    base: kind.base(),
                }
            })
            .collect()
    }
}

/// Resolve the five anchors for `selected`.
pub fn resolve(selected: NaiveDate) -> LoanRiskResult<AnchorDates> {
    let out_of_range = |what: &str| LoanRiskError::DateError(format!("{what} for {selected} is out of range"));

    let year_end = NaiveDate::from_ymd_opt(selected.year() - 1, 12, 31)
        .ok_or_else(|| out_of_range("previous year end"))?;
    let month_ago = selected
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| out_of_range("one month earlier"))?;
    let prev_month_end = selected
        .with_day(1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| out_of_range("previous month end"))?;
    let day_before = selected.pred_opt().ok_or_else(|| out_of_range("previous day"))?;

    let long = |d: NaiveDate| d.format("%-d %B %Y").to_string();
    let anchors = vec![
        AnchorDate::new(AnchorKey::A, year_end, long(year_end)),
        AnchorDate::new(AnchorKey::B, month_ago, long(month_ago)),
        AnchorDate::new(
            AnchorKey::C,
            prev_month_end,
            prev_month_end.format("End of %B %Y").to_string(),
        ),
        AnchorDate::new(AnchorKey::D, day_before, format!("D-1 ({})", long(day_before))),
        AnchorDate::new(AnchorKey::E, selected, format!("Selected ({})", long(selected))),
    ];

    Ok(AnchorDates { selected, anchors })
}

// ---------------------------------------------------------------------------
// Windows and deltas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaKind {
    DtD,
    MoM,
    MtD,
    YtD,
}

impl DeltaKind {
    pub const ALL: [DeltaKind; 4] = [DeltaKind::DtD, DeltaKind::MoM, DeltaKind::MtD, DeltaKind::YtD];

    /// The earlier anchor each window compares `E` against.
    pub fn base(self) -> AnchorKey {
        match self {
            DeltaKind::DtD => AnchorKey::D,
            DeltaKind::MoM => AnchorKey::B,
            DeltaKind::MtD => AnchorKey::C,
            DeltaKind::YtD => AnchorKey::A,
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeltaKind::DtD => "DtD",
            DeltaKind::MoM => "MoM",
            DeltaKind::MtD => "MtD",
            DeltaKind::YtD => "YtD",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaWindow {
    pub kind: DeltaKind,
    pub label: String,
    /// e.g. `09 Oct - 08 Oct`
    pub header: String,
    pub base: AnchorKey,
}

/// Absolute and percentage change over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaPair {
    pub abs: Decimal,
    pub pct: Percent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deltas {
    pub dtd: DeltaPair,
    pub mom: DeltaPair,
    pub mtd: DeltaPair,
    pub ytd: DeltaPair,
}

impl Deltas {
    pub fn get(&self, kind: DeltaKind) -> DeltaPair {
        match kind {
            DeltaKind::DtD => self.dtd,
            DeltaKind::MoM => self.mom,
            DeltaKind::MtD => self.mtd,
            DeltaKind::YtD => self.ytd,
        }
    }
}

/// One value per anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorValues<T> {
    pub a: T,
    pub b: T,
    pub c: T,
    pub d: T,
    pub e: T,
}

impl<T> AnchorValues<T> {
    pub fn get(&self, key: AnchorKey) -> &T {
        match key {
            AnchorKey::A => &self.a,
            AnchorKey::B => &self.b,
            AnchorKey::C => &self.c,
            AnchorKey::D => &self.d,
            AnchorKey::E => &self.e,
        }
    }

    pub fn get_mut(&mut self, key: AnchorKey) -> &mut T {
        match key {
            AnchorKey::A => &mut self.a,
            AnchorKey::B => &mut self.b,
            AnchorKey::C => &mut self.c,
            AnchorKey::D => &mut self.d,
            AnchorKey::E => &mut self.e,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> AnchorValues<U> {
        AnchorValues {
            a: f(&self.a),
            b: f(&self.b),
            c: f(&self.c),
            d: f(&self.d),
            e: f(&self.e),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnchorKey, &T)> {
        AnchorKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

impl<T: AddAssign + Copy> AddAssign for AnchorValues<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.a += rhs.a;
        self.b += rhs.b;
        self.c += rhs.c;
        self.d += rhs.d;
        self.e += rhs.e;
    }
}

impl<T: AddAssign + Copy> Add for AnchorValues<T> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AnchorValues<Decimal> {
    pub fn delta(&self, kind: DeltaKind) -> DeltaPair {
        let base = *self.get(kind.base());
        let abs = self.e - base;
        DeltaPair {
            abs,
            pct: percent_of(abs, base),
        }
    }

    pub fn deltas(&self) -> Deltas {
        Deltas {
            dtd: self.delta(DeltaKind::DtD),
            mom: self.delta(DeltaKind::MoM),
            mtd: self.delta(DeltaKind::MtD),
            ytd: self.delta(DeltaKind::YtD),
        }
    }
}
