//! Branch topology configuration.
//!
//! The configuration file names the active release branches, binds each one
//! to an alias and a tracker milestone, and describes the order in which
//! changes are merged forward from one release to the next.

use std::path::PathBuf;

use thiserror::Error;

pub mod schema;
pub mod topology;

pub use schema::{BranchConfig, BranchEntries, BranchProps};
pub use topology::{read_config_file, Branch, BranchTopology, ReadOptions, CHAIN_START};

/// Errors raised while reading the branch configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read branch config {}", path.display())]
    Read {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or does not match the schema.
    #[error("Failed to parse branch config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The merge chain returns to a branch it already visited.
    #[error("mergeOperations loops back to branch '{branch}'")]
    MergeCycle {
        /// First branch seen twice while walking the chain.
        branch: String,
    },
}
