//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lookout: wait on, probe and script browser games from the terminal
#[derive(Parser, Debug)]
#[command(name = "lookout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Configuration file (YAML)
    #[arg(long, env = "LOOKOUT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait until a page condition holds (exit 1 on timeout)
    Wait(WaitArgs),

    /// Evaluate expressions or probes and print their values as JSON
    Eval(EvalArgs),

    /// Run a scenario file against a browser
    Run(RunArgs),

    /// Work with scenario files
    Scenario(ScenarioArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Browser overrides shared by commands that open a page
#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, value_name = "PATH")]
    pub chromium: Option<PathBuf>,

    /// Disable the Chromium sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// What to wait for: exactly one of expression, path or named probe
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Raw page expression
    #[arg(long = "expr", value_name = "EXPRESSION")]
    pub expression: Option<String>,

    /// Dotted global path, e.g. window.game.state
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Named probe from the configuration file
    #[arg(long, value_name = "NAME")]
    pub probe: Option<String>,
}

/// Arguments for the wait command
#[derive(Parser, Debug)]
pub struct WaitArgs {
    /// Page URL (defaults to base_url from the configuration)
    #[arg(long)]
    pub url: Option<String>,

    /// Condition to wait for
    #[command(flatten)]
    pub target: TargetArgs,

    /// JSON literal the path must strictly equal
    #[arg(
        long,
        value_name = "JSON",
        requires = "path",
        conflicts_with_all = ["expression", "probe"]
    )]
    pub equals: Option<String>,

    /// Timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Keys to press after navigating, in order
    #[arg(long = "press", value_name = "KEY")]
    pub press: Vec<String>,

    /// Save a screenshot here if the wait times out
    #[arg(long, value_name = "PATH")]
    pub screenshot_on_timeout: Option<PathBuf>,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Arguments for the eval command
#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// Page URL (defaults to base_url from the configuration)
    #[arg(long)]
    pub url: Option<String>,

    /// Expressions to evaluate
    pub expressions: Vec<String>,

    /// Named probes to evaluate
    #[arg(long = "probe", value_name = "NAME")]
    pub probes: Vec<String>,

    /// Wait for this expression before evaluating
    #[arg(long, value_name = "EXPRESSION")]
    pub wait_for: Option<String>,

    /// Print a single JSON object instead of one line per value
    #[arg(long)]
    pub json: bool,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario YAML file
    pub scenario: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Arguments for the scenario command
#[derive(Parser, Debug)]
pub struct ScenarioArgs {
    /// Scenario subcommand
    #[command(subcommand)]
    pub command: ScenarioSubcommand,
}

/// Scenario subcommands
#[derive(Subcommand, Debug)]
pub enum ScenarioSubcommand {
    /// Parse and validate scenario files without a browser
    Validate(ValidateArgs),
}

/// Arguments for scenario validation
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Scenario YAML file(s)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// List probe names with their page expressions
    #[arg(long)]
    pub probes: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
