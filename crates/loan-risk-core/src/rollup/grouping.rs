//! Single-pass bucketing of records into (anchor, key) sums.

use std::collections::{BTreeMap, BTreeSet};

use crate::anchors::{AnchorDates, AnchorValues};
use crate::hierarchy::parse_unit_code;
use crate::metrics::{self, MetricValues};
use crate::segmentation::{Segment, SegmentClassifier};
use crate::snapshot::{DelinquencyCode, LoanSnapshotRecord, RecordSource};
use crate::types::UnitCode;

/// Which records take part in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub segment: Segment,
    /// Only records whose delinquency code is in the set. Records with an
    /// unknown code never match a restricted filter.
    pub delinquency: Option<BTreeSet<DelinquencyCode>>,
    /// Only records from these org units. Record codes are parsed, so
    /// `"0286"` and `"286"` both match unit 286.
    pub org_units: Option<BTreeSet<UnitCode>>,
}

impl RecordFilter {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            delinquency: None,
            org_units: None,
        }
    }

    pub fn matches(&self, record: &LoanSnapshotRecord, classifier: &SegmentClassifier) -> bool {
        if !self.segment.includes(classifier.classify(&record.classification_code)) {
            return false;
        }
        if let Some(ref codes) = self.delinquency {
            match record.delinquency {
                Some(code) if codes.contains(&code) => {}
                _ => return false,
            }
        }
        if let Some(ref units) = self.org_units {
            match parse_unit_code(&record.org_unit_code) {
                Some(code) if units.contains(&code) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Full metric values summed per key and anchor.
#[derive(Debug, Clone)]
pub struct Grouped<K: Ord> {
    pub sums: BTreeMap<K, AnchorValues<MetricValues>>,
    pub records_scanned: usize,
    pub records_matched: usize,
}

/// Scan the anchor periods once. Each record is keyed by `key_of` (`None`
/// skips it), its metrics computed once, and added to every anchor whose
/// date equals its period.
pub fn group_by_anchor<S, K, F>(source: &S, anchors: &AnchorDates, mut key_of: F) -> Grouped<K>
where
    S: RecordSource + ?Sized,
    K: Ord,
    F: FnMut(&LoanSnapshotRecord) -> Option<K>,
{
    let dates = anchors.distinct_dates();
    let mut sums: BTreeMap<K, AnchorValues<MetricValues>> = BTreeMap::new();
    let mut records_scanned = 0;
    let mut records_matched = 0;

    for record in source.scan_periods(&dates) {
        records_scanned += 1;
        if anchors.keys_for(record.period).next().is_none() {
            continue;
        }
        let Some(key) = key_of(record) else {
            continue;
        };
        records_matched += 1;

        let values = metrics::compute(record);
        let entry = sums.entry(key).or_default();
        for anchor in anchors.keys_for(record.period) {
            *entry.get_mut(anchor) += values;
        }
    }

    tracing::debug!(
        periods = dates.len(),
        records_scanned,
        records_matched,
        keys = sums.len(),
        "grouped records by anchor"
    );

    Grouped {
        sums,
        records_scanned,
        records_matched,
    }
}

/// Sums per trimmed org-unit code for the records matching `filter`.
pub fn group_by_unit<S: RecordSource + ?Sized>(
    source: &S,
    classifier: &SegmentClassifier,
    anchors: &AnchorDates,
    filter: &RecordFilter,
) -> Grouped<String> {
    group_by_anchor(source, anchors, |record| {
        filter
            .matches(record, classifier)
            .then(|| record.org_unit_code.trim().to_string())
    })
}
