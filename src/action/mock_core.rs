//! Recording [`ActionCore`] for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use super::core::{group_banner, ActionCore};

/// Everything a [`MockCore`] has been asked to do.
#[derive(Debug, Default, Clone)]
pub struct MockCoreRecord {
    /// Messages passed to `info`, including group banners.
    pub info_msgs: Vec<String>,
    /// Messages passed to `debug`.
    pub debug_msgs: Vec<String>,
    /// Messages passed to `warning`.
    pub warning_msgs: Vec<String>,
    /// Last message passed to `error`.
    pub error_arg: Option<String>,
    /// Last message passed to `set_failed`.
    pub failed_arg: Option<String>,
    /// Outputs set so far.
    pub outputs: HashMap<String, String>,
}

/// An [`ActionCore`] that answers inputs from a map and records every call.
///
/// ```
/// use release_flow::action::{ActionCore, MockCore};
///
/// let core = MockCore::new().with_input("dry-run", "true");
/// core.info("hello");
/// assert_eq!(core.get_input("dry-run").as_deref(), Some("true"));
/// assert_eq!(core.record().info_msgs, ["hello"]);
/// ```
#[derive(Debug, Default)]
pub struct MockCore {
    inputs: HashMap<String, String>,
    record: Mutex<MockCoreRecord>,
}

impl MockCore {
    /// Creates a mock with no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input value.
    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.insert(name.to_string(), value.to_string());
        self
    }

    /// Returns a snapshot of the recorded calls.
    pub fn record(&self) -> MockCoreRecord {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockCoreRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActionCore for MockCore {
    fn get_input(&self, name: &str) -> Option<String> {
        self.inputs
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn info(&self, message: &str) {
        self.lock().info_msgs.push(message.to_string());
    }

    fn debug(&self, message: &str) {
        self.lock().debug_msgs.push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.lock().warning_msgs.push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.lock().error_arg = Some(message.to_string());
    }

    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        self.lock()
            .outputs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_failed(&self, message: &str) {
        self.lock().failed_arg = Some(message.to_string());
    }

    fn start_group(&self, label: &str) {
        self.info(&group_banner(label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_absent() {
        let core = MockCore::new().with_input("dry-run", "");
        assert_eq!(core.get_input("dry-run"), None);
        assert_eq!(core.get_input("repo-token"), None);
    }

    #[test]
    fn records_logs_and_outputs() -> anyhow::Result<()> {
        let core = MockCore::new();
        core.info("one");
        core.debug("two");
        core.warning("three");
        core.error("four");
        core.set_failed("five");
        core.set_output("issue-number", "123")?;
        core.start_group("Group");

        let record = core.record();
        assert_eq!(record.info_msgs.len(), 2);
        assert_eq!(record.info_msgs[0], "one");
        assert!(record.info_msgs[1].contains("Group"));
        assert_eq!(record.debug_msgs, ["two"]);
        assert_eq!(record.warning_msgs, ["three"]);
        assert_eq!(record.error_arg.as_deref(), Some("four"));
        assert_eq!(record.failed_arg.as_deref(), Some("five"));
        assert_eq!(record.outputs.get("issue-number").map(String::as_str), Some("123"));
        Ok(())
    }
}
