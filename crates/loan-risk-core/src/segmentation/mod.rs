//! Business segment classification.
//!
//! A record's product classification code maps to exactly one leaf segment
//! (`MEDIUM`, `SMALL NCC`, `CC`, `KUR`, or the catch-all `OTHER`). `SMALL` is
//! a named report segment covering `SMALL NCC`, `CC` and `KUR` together.

pub mod legacy;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::LoanRiskError;
use crate::reference;
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "SMALL")]
    Small,
    #[serde(rename = "SMALL NCC")]
    SmallNcc,
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "KUR")]
    Kur,
    #[serde(rename = "OTHER")]
    Other,
}

impl Segment {
    /// Segments a single record can be classified into.
    pub const LEAVES: [Segment; 5] = [
        Segment::Medium,
        Segment::SmallNcc,
        Segment::Cc,
        Segment::Kur,
        Segment::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Segment::Medium => "MEDIUM",
            Segment::Small => "SMALL",
            Segment::SmallNcc => "SMALL NCC",
            Segment::Cc => "CC",
            Segment::Kur => "KUR",
            Segment::Other => "OTHER",
        }
    }

    pub fn is_leaf(self) -> bool {
        self != Segment::Small
    }

    /// Whether a record classified as `leaf` belongs to this report segment.
    pub fn includes(self, leaf: Segment) -> bool {
        match self {
            Segment::Small => matches!(leaf, Segment::SmallNcc | Segment::Cc | Segment::Kur),
            other => other == leaf,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Segment {
    type Err = LoanRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_uppercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match normalized.as_str() {
            "MEDIUM" => Ok(Segment::Medium),
            "SMALL" => Ok(Segment::Small),
            "SMALL NCC" | "NCC" | "SMALL NON CC" => Ok(Segment::SmallNcc),
            "CC" => Ok(Segment::Cc),
            "KUR" => Ok(Segment::Kur),
            "OTHER" => Ok(Segment::Other),
            _ => Err(LoanRiskError::UnknownSegment(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Immutable product-code lookup, built once and shared by every request.
#[derive(Debug, Clone)]
pub struct SegmentClassifier {
    by_code: HashMap<String, Segment>,
}

impl SegmentClassifier {
    /// Build from per-segment code lists. Only leaf segments other than
    /// `OTHER` may be listed, and a code may appear under one segment only.
    pub fn from_lists(lists: &BTreeMap<Segment, Vec<String>>) -> LoanRiskResult<Self> {
        let mut by_code = HashMap::new();
        for (segment, codes) in lists {
            if !segment.is_leaf() || *segment == Segment::Other {
                return Err(LoanRiskError::InvalidInput {
                    field: format!("segments.{segment}"),
                    reason: "only MEDIUM, SMALL NCC, CC and KUR carry code lists; \
                             SMALL and OTHER are derived"
                        .into(),
                });
            }
            for code in codes {
                let code = code.trim().to_string();
                if let Some(existing) = by_code.insert(code.clone(), *segment) {
                    if existing != *segment {
                        return Err(LoanRiskError::InvalidInput {
                            field: format!("segments.{segment}"),
                            reason: format!("code {code} is already listed under {existing}"),
                        });
                    }
                }
            }
        }
        Ok(Self { by_code })
    }

    /// Classifier over the shipped product-code table.
    pub fn builtin() -> Self {
        let by_code = reference::SEGMENT_CODES
            .iter()
            .flat_map(|(segment, codes)| codes.iter().map(move |(code, _)| (code.to_string(), *segment)))
            .collect();
        Self { by_code }
    }

    /// Map a classification code to its leaf segment. Unknown codes are `OTHER`.
    pub fn classify(&self, classification_code: &str) -> Segment {
        self.by_code
            .get(classification_code.trim())
            .copied()
            .unwrap_or(Segment::Other)
    }

    /// Sorted codes whose leaf segment is included in `segment`.
    pub fn codes_for(&self, segment: Segment) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .by_code
            .iter()
            .filter(|(_, leaf)| segment.includes(**leaf))
            .map(|(code, _)| code.as_str())
            .collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let c = SegmentClassifier::builtin();
        assert_eq!(c.classify("80065"), Segment::Kur);
        assert_eq!(c.classify("42210"), Segment::Medium);
        assert_eq!(c.classify("42110"), Segment::Cc);
        assert_eq!(c.classify("82201"), Segment::SmallNcc);
        assert_eq!(c.classify(" 80064 "), Segment::SmallNcc);
    }

    #[test]
    fn test_unknown_code_is_other() {
        let c = SegmentClassifier::builtin();
        assert_eq!(c.classify("99999"), Segment::Other);
        assert_eq!(c.classify(""), Segment::Other);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = SegmentClassifier::builtin();
        for code in ["80065", "42211", "99999", "42140"] {
            assert_eq!(c.classify(code), c.classify(code));
        }
    }

    #[test]
    fn test_small_covers_ncc_cc_kur() {
        assert!(Segment::Small.includes(Segment::SmallNcc));
        assert!(Segment::Small.includes(Segment::Cc));
        assert!(Segment::Small.includes(Segment::Kur));
        assert!(!Segment::Small.includes(Segment::Medium));
        assert!(!Segment::Small.includes(Segment::Other));
        assert!(Segment::Kur.includes(Segment::Kur));
        assert!(!Segment::Kur.includes(Segment::Cc));
    }

    #[test]
    fn test_small_code_list_is_union() {
        let c = SegmentClassifier::builtin();
        let small = c.codes_for(Segment::Small);
        let parts = c.codes_for(Segment::SmallNcc).len()
            + c.codes_for(Segment::Cc).len()
            + c.codes_for(Segment::Kur).len();
        assert_eq!(small.len(), parts);
        assert!(small.contains(&"80065"));
        assert!(!small.contains(&"42210"));
    }

    #[test]
    fn test_parse_segment_names() {
        assert_eq!("small".parse::<Segment>().unwrap(), Segment::Small);
        assert_eq!("SMALL NCC".parse::<Segment>().unwrap(), Segment::SmallNcc);
        assert_eq!("small_ncc".parse::<Segment>().unwrap(), Segment::SmallNcc);
        assert_eq!("ncc".parse::<Segment>().unwrap(), Segment::SmallNcc);
        assert_eq!(" Kur ".parse::<Segment>().unwrap(), Segment::Kur);
        assert!(matches!(
            "LARGE".parse::<Segment>(),
            Err(LoanRiskError::UnknownSegment(_))
        ));
    }

    #[test]
    fn test_from_lists_rejects_duplicates() {
        let mut lists = BTreeMap::new();
        lists.insert(Segment::Cc, vec!["42110".to_string()]);
        lists.insert(Segment::Kur, vec!["42110".to_string()]);
        assert!(SegmentClassifier::from_lists(&lists).is_err());
    }

    #[test]
    fn test_from_lists_rejects_derived_segments() {
        let mut lists = BTreeMap::new();
        lists.insert(Segment::Small, vec!["1".to_string()]);
        assert!(SegmentClassifier::from_lists(&lists).is_err());
    }
}
