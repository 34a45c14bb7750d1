//! Runtime for GitHub Actions steps.

pub mod core;
pub mod mock_core;
pub mod shell;
pub mod toolkit;

pub use self::core::{
    escape_data, format_command, format_output_entry, group_banner, input_env_name, ActionCore,
    GithubCore,
};
pub use mock_core::{MockCore, MockCoreRecord};
pub use shell::{CommandRunner, Shell, ShellError, DRY_RUN_INPUT};
pub use toolkit::{report_failure, run, Action, ActionToolkit, DEFAULT_ERROR_PREFIX};
