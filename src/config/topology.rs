//! Derived branch topology: lookups and the forward-merge chain.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::schema::BranchConfig;
use super::ConfigError;

/// Key in `mergeOperations` that marks the start of the chain.
pub const CHAIN_START: &str = "0";

/// Options for reading a branch configuration.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Branch the change currently lives on. Merge targets start after it.
    pub base_branch: Option<String>,
}

impl ReadOptions {
    /// Options that compute merge targets downstream of `branch`.
    pub fn with_base_branch(branch: impl Into<String>) -> Self {
        Self {
            base_branch: Some(branch.into()),
        }
    }
}

/// A configured branch, as looked up by alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Full branch name.
    pub name: String,
    /// Short human-friendly name.
    pub alias: String,
    /// Tracker milestone bound to the branch.
    pub milestone_number: i64,
    /// Any other configured attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Branch configuration restructured for the lookups actions need.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchTopology {
    /// The configuration as it was provided.
    pub config: BranchConfig,

    /// Branches a change must be merged forward into, in merge order.
    /// The base branch itself is not included.
    pub merge_targets: Vec<String>,

    /// Branch by alias, e.g. `"2021-sp"` to `release-2021-commercial-sp`.
    pub branch_by_alias: HashMap<String, Branch>,

    /// Branch name by milestone number, e.g. `327` to `release-2022`.
    pub branch_name_by_milestone_number: HashMap<i64, String>,
}

impl BranchTopology {
    /// Parses a JSON configuration document.
    pub fn from_json(raw: &str, options: &ReadOptions) -> Result<Self, ConfigError> {
        let config: BranchConfig = serde_json::from_str(raw)?;
        Self::from_config(config, options)
    }

    /// Builds the topology from an already parsed configuration.
    ///
    /// Fails only if the merge chain loops back on itself.
    pub fn from_config(config: BranchConfig, options: &ReadOptions) -> Result<Self, ConfigError> {
        let mut branch_name_by_milestone_number = HashMap::with_capacity(config.branches.len());
        let mut branch_by_alias = HashMap::with_capacity(config.branches.len());

        for (name, props) in config.branches.iter() {
            branch_name_by_milestone_number.insert(props.milestone_number, name.to_string());
            branch_by_alias.insert(
                props.alias.clone(),
                Branch {
                    name: name.to_string(),
                    alias: props.alias.clone(),
                    milestone_number: props.milestone_number,
                    extra: props.extra.clone(),
                },
            );
        }

        let merge_targets = build_merge_targets(&config, options)?;

        Ok(Self {
            config,
            merge_targets,
            branch_by_alias,
            branch_name_by_milestone_number,
        })
    }

    /// Returns the branch with the given alias.
    pub fn branch_for_alias(&self, alias: &str) -> Option<&Branch> {
        self.branch_by_alias.get(alias)
    }

    /// Returns the branch name bound to a milestone.
    pub fn branch_for_milestone(&self, milestone_number: i64) -> Option<&str> {
        self.branch_name_by_milestone_number
            .get(&milestone_number)
            .map(String::as_str)
    }
}

/// Reads and parses the configuration file at `path`.
pub fn read_config_file(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<BranchTopology, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    BranchTopology::from_json(&raw, options)
}

/// Walks `mergeOperations` from the base branch (or the chain start).
fn build_merge_targets(
    config: &BranchConfig,
    options: &ReadOptions,
) -> Result<Vec<String>, ConfigError> {
    let start = options
        .base_branch
        .as_deref()
        .filter(|branch| !branch.is_empty());

    let mut seen: HashSet<&str> = start.into_iter().collect();
    let mut merge_targets = Vec::new();
    let mut cursor = config
        .merge_operations
        .get(start.unwrap_or(CHAIN_START));

    while let Some(target) = cursor.filter(|target| !target.is_empty()) {
        if !seen.insert(target.as_str()) {
            return Err(ConfigError::MergeCycle {
                branch: target.clone(),
            });
        }
        merge_targets.push(target.clone());
        cursor = config.merge_operations.get(target);
    }

    debug!(
        base_branch = start.unwrap_or(CHAIN_START),
        merge_targets = ?merge_targets,
        "Computed merge targets"
    );

    Ok(merge_targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BRANCHES: &str = r#"{
        "branches": {
            "A": { "alias": "a", "milestoneNumber": 1 },
            "B": { "alias": "b", "milestoneNumber": 2 }
        },
        "mergeOperations": { "A": "B" }
    }"#;

    #[test]
    fn targets_start_after_base_branch() -> anyhow::Result<()> {
        let topology = BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::with_base_branch("A"))?;
        assert_eq!(topology.merge_targets, ["B"]);
        Ok(())
    }

    #[test]
    fn no_base_branch_and_no_chain_start() -> anyhow::Result<()> {
        let topology = BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::default())?;
        assert!(topology.merge_targets.is_empty());
        Ok(())
    }

    #[test]
    fn empty_base_branch_counts_as_absent() -> anyhow::Result<()> {
        let raw = r#"{
            "branches": {},
            "mergeOperations": { "0": "release-1", "release-1": "release-2" }
        }"#;
        let topology = BranchTopology::from_json(raw, &ReadOptions::with_base_branch(""))?;
        assert_eq!(topology.merge_targets, ["release-1", "release-2"]);
        Ok(())
    }

    #[test]
    fn lookups_by_alias_and_milestone() -> anyhow::Result<()> {
        let topology = BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::default())?;
        assert_eq!(topology.branch_for_milestone(1), Some("A"));
        assert_eq!(topology.branch_for_alias("b").map(|b| b.name.as_str()), Some("B"));
        assert_eq!(topology.branch_for_alias("b").map(|b| b.milestone_number), Some(2));
        assert_eq!(topology.branch_for_milestone(99), None);
        Ok(())
    }

    #[test]
    fn terminal_base_branch_has_no_targets() -> anyhow::Result<()> {
        let topology = BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::with_base_branch("B"))?;
        assert!(topology.merge_targets.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_base_branch_has_no_targets() -> anyhow::Result<()> {
        let topology =
            BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::with_base_branch("nope"))?;
        assert!(topology.merge_targets.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_targets_are_kept_as_names() -> anyhow::Result<()> {
        let raw = r#"{
            "branches": { "A": { "alias": "a", "milestoneNumber": 1 } },
            "mergeOperations": { "A": "ghost", "ghost": "phantom" }
        }"#;
        let topology = BranchTopology::from_json(raw, &ReadOptions::with_base_branch("A"))?;
        assert_eq!(topology.merge_targets, ["ghost", "phantom"]);
        assert!(topology.branch_for_alias("ghost").is_none());
        Ok(())
    }

    #[test]
    fn duplicate_milestones_and_aliases_keep_last() -> anyhow::Result<()> {
        let raw = r#"{
            "branches": {
                "first": { "alias": "shared", "milestoneNumber": 5 },
                "second": { "alias": "shared", "milestoneNumber": 5 }
            },
            "mergeOperations": {}
        }"#;
        let topology = BranchTopology::from_json(raw, &ReadOptions::default())?;
        assert_eq!(topology.branch_for_milestone(5), Some("second"));
        assert_eq!(
            topology.branch_for_alias("shared").map(|b| b.name.as_str()),
            Some("second")
        );
        Ok(())
    }

    #[test]
    fn cyclic_chain_is_rejected() {
        let raw = r#"{
            "branches": {},
            "mergeOperations": { "0": "A", "A": "B", "B": "A" }
        }"#;
        let err = BranchTopology::from_json(raw, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MergeCycle { ref branch } if branch == "A"));
    }

    #[test]
    fn chain_back_to_base_branch_is_rejected() {
        let raw = r#"{
            "branches": {},
            "mergeOperations": { "A": "B", "B": "A" }
        }"#;
        let err = BranchTopology::from_json(raw, &ReadOptions::with_base_branch("A")).unwrap_err();
        assert!(matches!(err, ConfigError::MergeCycle { ref branch } if branch == "A"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = BranchTopology::from_json("{ not json", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn serializes_lookups_in_camel_case() -> anyhow::Result<()> {
        let topology = BranchTopology::from_json(TWO_BRANCHES, &ReadOptions::with_base_branch("A"))?;
        let json = serde_json::to_value(&topology)?;
        assert_eq!(json["mergeTargets"], serde_json::json!(["B"]));
        assert_eq!(json["branchNameByMilestoneNumber"]["2"], "B");
        assert_eq!(json["branchByAlias"]["a"]["milestoneNumber"], 1);
        Ok(())
    }
}
