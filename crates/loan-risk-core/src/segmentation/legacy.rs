//! Description-based segment lookup.
//!
//! Older uploads identified products only by their free-text description.
//! This lookup is kept to cross-check the code table; reports never call it.

use std::collections::HashMap;

use super::{Segment, SegmentClassifier};
use crate::reference;

#[derive(Debug, Clone)]
pub struct DescriptionClassifier {
    by_description: HashMap<String, Segment>,
}

/// A code whose description lookup disagrees with its code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub code: String,
    pub description: String,
    pub by_code: Segment,
    pub by_description: Segment,
}

impl DescriptionClassifier {
    /// Build from `(segment, descriptions)` lists. A description listed under
    /// several segments resolves to the first list naming it.
    pub fn from_lists(lists: &[(Segment, &[&str])]) -> Self {
        let mut by_description = HashMap::new();
        for (segment, descriptions) in lists {
            for desc in descriptions.iter() {
                by_description.entry(normalize(desc)).or_insert(*segment);
            }
        }
        Self { by_description }
    }

    pub fn builtin() -> Self {
        Self::from_lists(reference::LEGACY_SEGMENT_DESCRIPTIONS)
    }

    pub fn classify(&self, description: &str) -> Segment {
        self.lookup(description).unwrap_or(Segment::Other)
    }

    pub fn lookup(&self, description: &str) -> Option<Segment> {
        self.by_description.get(&normalize(description)).copied()
    }
}

fn normalize(description: &str) -> String {
    description.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// The legacy table has no `SMALL NCC`; those codes read as `SMALL` there.
fn legacy_view(leaf: Segment) -> Segment {
    match leaf {
        Segment::SmallNcc => Segment::Small,
        other => other,
    }
}

/// Compare both lookups over `(code, description)` pairs whose description
/// the legacy table knows. Pairs with an unlisted description are skipped.
pub fn verify(
    codes: &SegmentClassifier,
    descriptions: &DescriptionClassifier,
    pairs: &[(&str, &str)],
) -> Vec<Mismatch> {
    pairs
        .iter()
        .filter_map(|(code, desc)| {
            let by_description = descriptions.lookup(desc)?;
            let by_code = codes.classify(code);
            (legacy_view(by_code) != by_description).then(|| Mismatch {
                code: code.to_string(),
                description: desc.to_string(),
                by_code,
                by_description,
            })
        })
        .collect()
}

/// Run [`verify`] over the shipped code table.
pub fn verify_builtin() -> Vec<Mismatch> {
    let pairs: Vec<(&str, &str)> = reference::SEGMENT_CODES
        .iter()
        .flat_map(|(_, codes)| codes.iter().copied())
        .collect();
    verify(
        &SegmentClassifier::builtin(),
        &DescriptionClassifier::builtin(),
        &pairs,
    )
}
