//! Raw branch configuration document.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The branch configuration file as provided.
///
/// ```json
/// {
///   "branches": {
///     "release-2020-commercial": { "alias": "2020", "milestoneNumber": 266 }
///   },
///   "mergeOperations": {
///     "0": "release-2020-commercial",
///     "release-2020-commercial": "release-2021-commercial-emergency"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchConfig {
    /// Release branches keyed by name, in document order.
    pub branches: BranchEntries,

    /// Forward-merge relation: branch name to the branch it merges into.
    /// The key `"0"` marks the start of the chain.
    #[serde(default)]
    pub merge_operations: HashMap<String, String>,
}

/// Attributes of one configured branch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchProps {
    /// Short human-friendly name.
    pub alias: String,

    /// Tracker milestone bound to the branch.
    pub milestone_number: i64,

    /// Any other attributes, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Branch entries in the order they appear in the document.
///
/// Lookups built from the entries are last-write-wins, so the order has to
/// survive deserialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchEntries(Vec<(String, BranchProps)>);

impl BranchEntries {
    /// Iterates over `(branch name, props)` in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BranchProps)> {
        self.0.iter().map(|(name, props)| (name.as_str(), props))
    }

    /// Number of configured branches.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no branches are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, BranchProps)> for BranchEntries {
    fn from_iter<I: IntoIterator<Item = (String, BranchProps)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for BranchEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = BranchEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of branch names to branch attributes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, props)) = map.next_entry::<String, BranchProps>()? {
                    // A repeated key replaces the earlier entry, like a JSON object would.
                    entries.retain(|(existing, _): &(String, BranchProps)| *existing != name);
                    entries.push((name, props));
                }
                Ok(BranchEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Serialize for BranchEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, props) in &self.0 {
            map.serialize_entry(name, props)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_document_order() -> anyhow::Result<()> {
        let config: BranchConfig = serde_json::from_str(
            r#"{
                "branches": {
                    "zeta": { "alias": "z", "milestoneNumber": 3 },
                    "alpha": { "alias": "a", "milestoneNumber": 1 },
                    "mid": { "alias": "m", "milestoneNumber": 2 }
                }
            }"#,
        )?;

        let names: Vec<&str> = config.branches.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(config.merge_operations.is_empty());
        Ok(())
    }

    #[test]
    fn extra_attributes_are_kept() -> anyhow::Result<()> {
        let config: BranchConfig = serde_json::from_str(
            r#"{
                "branches": {
                    "release-2022": { "alias": "2022", "milestoneNumber": 327, "frozen": true }
                },
                "mergeOperations": {}
            }"#,
        )?;

        let (_, props) = config.branches.iter().next().unwrap();
        assert_eq!(props.alias, "2022");
        assert_eq!(props.milestone_number, 327);
        assert_eq!(props.extra.get("frozen"), Some(&Value::Bool(true)));
        Ok(())
    }

    #[test]
    fn repeated_branch_key_keeps_last() -> anyhow::Result<()> {
        let config: BranchConfig = serde_json::from_str(
            r#"{
                "branches": {
                    "dup": { "alias": "first", "milestoneNumber": 1 },
                    "other": { "alias": "o", "milestoneNumber": 2 },
                    "dup": { "alias": "second", "milestoneNumber": 3 }
                }
            }"#,
        )?;

        let entries: Vec<(&str, &str)> = config
            .branches
            .iter()
            .map(|(name, props)| (name, props.alias.as_str()))
            .collect();
        assert_eq!(entries, [("other", "o"), ("dup", "second")]);
        Ok(())
    }

    #[test]
    fn missing_branches_is_an_error() {
        let result = serde_json::from_str::<BranchConfig>(r#"{ "mergeOperations": {} }"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_back_in_order() -> anyhow::Result<()> {
        let raw = r#"{"branches":{"b":{"alias":"bb","milestoneNumber":2},"a":{"alias":"aa","milestoneNumber":1}},"mergeOperations":{}}"#;
        let config: BranchConfig = serde_json::from_str(raw)?;
        assert_eq!(serde_json::to_string(&config)?, raw);
        Ok(())
    }
}
