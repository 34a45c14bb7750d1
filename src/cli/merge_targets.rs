//! `merge-targets` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::action::{ActionCore, GithubCore};
use crate::config::{read_config_file, ReadOptions};

/// Merge targets command options.
#[derive(Parser)]
pub struct MergeTargetsCommand {
    /// Branch configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Branch the change lives on; targets start after it.
    #[arg(long, value_name = "NAME")]
    pub base_branch: Option<String>,

    /// Writes the targets as a JSON array to this step output instead of
    /// printing them.
    #[arg(long, value_name = "NAME")]
    pub output: Option<String>,
}

impl MergeTargetsCommand {
    /// Executes the merge-targets command.
    pub fn execute(self) -> Result<()> {
        let options = ReadOptions {
            base_branch: self.base_branch,
        };
        let topology = read_config_file(&self.config, &options)?;

        match self.output {
            Some(name) => write_output(&GithubCore::from_env(), &name, &topology.merge_targets),
            None => {
                for target in &topology.merge_targets {
                    println!("{target}");
                }
                Ok(())
            }
        }
    }
}

fn write_output(core: &dyn ActionCore, name: &str, targets: &[String]) -> Result<()> {
    let value = serde_json::to_string(targets).context("Failed to serialize merge targets")?;
    core.set_output(name, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MockCore;

    #[test]
    fn output_is_a_json_array() -> Result<()> {
        let core = MockCore::new();
        let targets = vec![
            "release-2021-commercial-sp".to_string(),
            "release-2022".to_string(),
        ];

        write_output(&core, "merge-targets", &targets)?;

        assert_eq!(
            core.record().outputs["merge-targets"],
            r#"["release-2021-commercial-sp","release-2022"]"#
        );
        Ok(())
    }

    #[test]
    fn missing_config_is_an_error() {
        let cmd = MergeTargetsCommand {
            config: PathBuf::from("does-not-exist.json"),
            base_branch: None,
            output: None,
        };
        let err = cmd.execute().unwrap_err();
        assert!(err.to_string().contains("does-not-exist.json"));
    }
}
