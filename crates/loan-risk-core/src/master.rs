//! Static reference data shared by every report request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hierarchy::{BranchEntry, OrgHierarchy, UnitEntry};
use crate::reference;
use crate::segmentation::{Segment, SegmentClassifier};
use crate::LoanRiskResult;

/// File form of the master tables (JSON or YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    pub branches: Vec<BranchEntry>,
    #[serde(default)]
    pub units: Vec<UnitEntry>,
    /// Product classification codes per leaf segment.
    pub segments: BTreeMap<Segment, Vec<String>>,
}

impl MasterConfig {
    /// The shipped tables in file form, e.g. as a starting point for edits.
    pub fn builtin() -> Self {
        let branches = reference::BRANCHES
            .iter()
            .map(|(code, name)| BranchEntry {
                code: *code,
                name: name.to_string(),
            })
            .collect();
        let units = reference::SUB_BRANCHES
            .iter()
            .map(|(code, name, parent)| UnitEntry {
                code: *code,
                name: name.to_string(),
                parent: *parent,
            })
            .collect();
        let segments = reference::SEGMENT_CODES
            .iter()
            .map(|(segment, codes)| {
                (
                    *segment,
                    codes.iter().map(|(code, _)| code.to_string()).collect(),
                )
            })
            .collect();
        Self {
            branches,
            units,
            segments,
        }
    }
}

/// Immutable lookups built once at startup.
#[derive(Debug, Clone)]
pub struct MasterData {
    pub hierarchy: OrgHierarchy,
    pub segments: SegmentClassifier,
}

impl MasterData {
    pub fn builtin() -> Self {
        Self {
            hierarchy: OrgHierarchy::builtin(),
            segments: SegmentClassifier::builtin(),
        }
    }

    /// Validate and build from file-form tables. Non-fatal master-data
    /// conditions come back as warnings.
    pub fn from_config(config: &MasterConfig) -> LoanRiskResult<(Self, Vec<String>)> {
        let (hierarchy, warnings) = OrgHierarchy::build(&config.branches, &config.units)?;
        let segments = SegmentClassifier::from_lists(&config.segments)?;
        tracing::debug!(
            branches = hierarchy.branch_count(),
            sub_branches = hierarchy.sub_branch_count(),
            codes = segments.len(),
            "master data loaded"
        );
        Ok((Self { hierarchy, segments }, warnings))
    }
}
