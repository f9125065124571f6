//! Lookout CLI Library
//!
//! Command-line interface for the Lookout condition-wait toolkit.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    BrowserArgs, Cli, ColorArg, Commands, ConfigArgs, EvalArgs, RunArgs, ScenarioArgs,
    ScenarioSubcommand, TargetArgs, ValidateArgs, WaitArgs,
};
pub use config::{CliConfig, ColorChoice, FileConfig, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{step_line, Reporter};
