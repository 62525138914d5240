//! Two-level organizational hierarchy: branches and the sub-branches they own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LoanRiskError;
use crate::reference;
use crate::types::UnitCode;
use crate::LoanRiskResult;

// ---------------------------------------------------------------------------
// Master entries
// ---------------------------------------------------------------------------

/// A branch office from the master table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchEntry {
    pub code: UnitCode,
    pub name: String,
}

/// Any servicing unit from the master table. A unit whose parent is itself
/// is the branch's own entry; otherwise it is a sub-branch of `parent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitEntry {
    pub code: UnitCode,
    pub name: String,
    pub parent: UnitCode,
}

/// Classification of one org-unit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitClass {
    pub is_branch: bool,
    pub is_sub_branch: bool,
    pub parent_branch_code: Option<UnitCode>,
}

impl UnitClass {
    pub fn is_mapped(&self) -> bool {
        self.is_branch || self.is_sub_branch
    }
}

#[derive(Debug, Clone)]
struct SubBranch {
    name: String,
    parent: UnitCode,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrgHierarchy {
    branches: BTreeMap<UnitCode, String>,
    sub_branches: BTreeMap<UnitCode, SubBranch>,
    children: BTreeMap<UnitCode, Vec<UnitCode>>,
}

impl OrgHierarchy {
    /// Build the hierarchy, returning master-data warnings alongside it.
    ///
    /// A code listed as a branch always resolves as a branch, even when it
    /// also appears as a unit under another branch.
    pub fn build(
        branches: &[BranchEntry],
        units: &[UnitEntry],
    ) -> LoanRiskResult<(Self, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut branch_map = BTreeMap::new();
        for b in branches {
            if branch_map.insert(b.code, b.name.trim().to_string()).is_some() {
                return Err(LoanRiskError::InvalidInput {
                    field: "branches".into(),
                    reason: format!("duplicate branch code {}", b.code),
                });
            }
        }

        let mut sub_branches = BTreeMap::new();
        let mut children: BTreeMap<UnitCode, Vec<UnitCode>> =
            branch_map.keys().map(|code| (*code, Vec::new())).collect();

        for u in units {
            if !branch_map.contains_key(&u.parent) {
                return Err(LoanRiskError::InvalidInput {
                    field: "units".into(),
                    reason: format!(
                        "unit {} ({}) names parent {} which is not a branch",
                        u.code, u.name, u.parent
                    ),
                });
            }
            if u.code == u.parent {
                continue;
            }
            if branch_map.contains_key(&u.code) {
                let msg = format!(
                    "unit {} is listed under branch {} but is itself a branch; treating it as a branch",
                    u.code, u.parent
                );
                tracing::warn!("{msg}");
                warnings.push(msg);
                continue;
            }
            let entry = SubBranch {
                name: u.name.trim().to_string(),
                parent: u.parent,
            };
            if sub_branches.insert(u.code, entry).is_some() {
                return Err(LoanRiskError::InvalidInput {
                    field: "units".into(),
                    reason: format!("duplicate unit code {}", u.code),
                });
            }
            children.entry(u.parent).or_default().push(u.code);
        }

        for list in children.values_mut() {
            list.sort_unstable();
        }

        Ok((
            Self {
                branches: branch_map,
                sub_branches,
                children,
            },
            warnings,
        ))
    }

    /// Hierarchy over the shipped regional master.
    pub fn builtin() -> Self {
        let mut branches = BTreeMap::new();
        let mut children: BTreeMap<UnitCode, Vec<UnitCode>> = BTreeMap::new();
        for (code, name) in reference::BRANCHES {
            branches.insert(*code, name.to_string());
            children.insert(*code, Vec::new());
        }
        let mut sub_branches = BTreeMap::new();
        for (code, name, parent) in reference::SUB_BRANCHES {
            sub_branches.insert(
                *code,
                SubBranch {
                    name: name.to_string(),
                    parent: *parent,
                },
            );
            children.entry(*parent).or_default().push(*code);
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }
        Self {
            branches,
            sub_branches,
            children,
        }
    }

    pub fn resolve(&self, code: UnitCode) -> UnitClass {
        if self.branches.contains_key(&code) {
            return UnitClass {
                is_branch: true,
                is_sub_branch: false,
                parent_branch_code: Some(code),
            };
        }
        match self.sub_branches.get(&code) {
            Some(sb) => UnitClass {
                is_branch: false,
                is_sub_branch: true,
                parent_branch_code: Some(sb.parent),
            },
            None => UnitClass {
                is_branch: false,
                is_sub_branch: false,
                parent_branch_code: None,
            },
        }
    }

    /// Branch whose KONSOL row a unit's data rolls into.
    pub fn owning_branch(&self, code: UnitCode) -> Option<UnitCode> {
        self.resolve(code).parent_branch_code
    }

    pub fn name(&self, code: UnitCode) -> Option<&str> {
        self.branches
            .get(&code)
            .map(String::as_str)
            .or_else(|| self.sub_branches.get(&code).map(|sb| sb.name.as_str()))
    }

    /// All branch codes, ascending.
    pub fn branch_codes(&self) -> impl Iterator<Item = UnitCode> + '_ {
        self.branches.keys().copied()
    }

    /// All sub-branch codes, ascending.
    pub fn sub_branch_codes(&self) -> impl Iterator<Item = UnitCode> + '_ {
        self.sub_branches.keys().copied()
    }

    /// Sub-branches owned by `branch`, ascending. Empty for unknown codes.
    pub fn sub_branches_of(&self, branch: UnitCode) -> &[UnitCode] {
        self.children.get(&branch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Branch codes ordered by display name (case-normalized), then code.
    pub fn branches_by_name(&self) -> Vec<UnitCode> {
        let mut codes: Vec<(String, UnitCode)> = self
            .branches
            .iter()
            .map(|(code, name)| (name.to_lowercase(), *code))
            .collect();
        codes.sort();
        codes.into_iter().map(|(_, code)| code).collect()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn sub_branch_count(&self) -> usize {
        self.sub_branches.len()
    }
}

/// Parse an org-unit code as it appears in snapshot data (`"0286"`, `" 286 "`).
pub fn parse_unit_code(raw: &str) -> Option<UnitCode> {
    raw.trim().parse().ok()
}
