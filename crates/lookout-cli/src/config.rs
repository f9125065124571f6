//! CLI configuration
//!
//! Two layers: [`CliConfig`] comes from global flags, [`FileConfig`] from an
//! optional YAML file shared by every command.
//!
//! ```yaml
//! base_url: http://localhost:8080
//! browser:
//!   headless: true
//!   viewport_width: 960
//!   viewport_height: 540
//! wait:
//!   timeout_ms: 10000
//!   poll_interval_ms: 50
//! probes:
//!   state: window.game.stateManager.currentState
//!   grounded: window.game.player.body.onFloor
//!   ready:
//!     expression: "document.readyState === 'complete'"
//! ```

use crate::commands::{BrowserArgs, TargetArgs};
use crate::error::{CliError, CliResult};
use lookout::{equals_expression, path_expression, BrowserConfig, ProbeSet, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - progress and info logs
    Verbose,
    /// Debug - every poll and CDP call
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Default log filter for this level
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn,chromiumoxide=off",
            Self::Verbose => "info,chromiumoxide=warn",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when stderr is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Settings taken from global flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Settings loaded from the YAML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// URL used when a command gets no `--url`
    pub base_url: Option<String>,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Default timeout and poll interval
    pub wait: WaitOptions,
    /// Named probes
    pub probes: ProbeSet,
}

impl FileConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml(yaml: &str) -> CliResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CliError::config(e.to_string()))
    }

    /// Load the configuration file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> CliResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| CliError::output(e.to_string()))
    }

    /// URL from the flag, else `base_url`
    pub fn url(&self, flag: Option<&str>) -> CliResult<String> {
        flag.map(str::to_string)
            .or_else(|| self.base_url.clone())
            .ok_or_else(|| CliError::invalid_argument("no --url given and no base_url configured"))
    }

    /// Wait options with flag overrides applied
    #[must_use]
    pub fn wait_options(&self, timeout_ms: Option<u64>, interval_ms: Option<u64>) -> WaitOptions {
        self.wait
            .with_timeout(timeout_ms.unwrap_or(self.wait.timeout_ms))
            .with_poll_interval(interval_ms.unwrap_or(self.wait.poll_interval_ms))
    }

    /// Browser settings with flag overrides applied
    #[must_use]
    pub fn browser_config(&self, args: &BrowserArgs) -> BrowserConfig {
        let mut config = self.browser.clone();
        if args.headed {
            config = config.with_headless(false);
        }
        if args.no_sandbox {
            config = config.with_no_sandbox();
        }
        if let Some(ref path) = args.chromium {
            config = config.with_chromium_path(path);
        }
        config
    }

    /// Page expression for a wait target, plus a label for messages
    pub fn target_expression(
        &self,
        target: &TargetArgs,
        equals: Option<&str>,
    ) -> CliResult<(String, String)> {
        if equals.is_some() && target.path.is_none() {
            return Err(CliError::invalid_argument("--equals only applies to --path"));
        }
        match (&target.expression, &target.path, &target.probe) {
            (Some(expr), _, _) => Ok((expr.clone(), expr.clone())),
            (None, Some(path), _) => {
                let expression = match equals {
                    Some(literal) => {
                        let value = serde_json::from_str(literal).map_err(|e| {
                            CliError::invalid_argument(format!(
                                "--equals must be a JSON literal ({e})"
                            ))
                        })?;
                        equals_expression(path, &value)?
                    }
                    None => path_expression(path)?,
                };
                let label = equals.map_or_else(|| path.clone(), |v| format!("{path} === {v}"));
                Ok((expression, label))
            }
            (None, None, Some(name)) => Ok((self.probes.expression(name)?, name.clone())),
            (None, None, None) => Err(CliError::invalid_argument(
                "one of --expr, --path or --probe is required",
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
base_url: http://localhost:8080
browser:
  headless: true
  viewport_width: 960
wait:
  timeout_ms: 10000
  poll_interval_ms: 50
probes:
  state: window.game.stateManager.currentState
  ready:
    expression: "document.readyState === 'complete'"
"#;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_predicates() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_quiet());
        }

        #[test]
        fn test_log_filter() {
            assert_eq!(Verbosity::Quiet.log_filter(), "error");
            assert_eq!(Verbosity::Debug.log_filter(), "debug");
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Verbose)
                .with_color(ColorChoice::Never);
            assert_eq!(config.verbosity, Verbosity::Verbose);
            assert_eq!(config.color, ColorChoice::Never);
        }
    }

    mod file_config_tests {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_parse_sample() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();
            assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
            assert_eq!(config.browser.viewport_width, 960);
            assert_eq!(config.browser.viewport_height, 720);
            assert_eq!(config.wait.timeout_ms, 10_000);
            assert_eq!(config.probes.len(), 2);
        }

        #[test]
        fn test_missing_file_arg_gives_defaults() {
            let config = FileConfig::load(None).unwrap();
            assert_eq!(config, FileConfig::default());
            assert_eq!(config.wait.poll_interval_ms, 100);
        }

        #[test]
        fn test_unreadable_file() {
            let err = FileConfig::load(Some(Path::new("/nonexistent/lookout.yaml"))).unwrap_err();
            assert!(err.to_string().contains("cannot read"));
        }

        #[test]
        fn test_unknown_key_rejected() {
            let err = FileConfig::from_yaml("base_ulr: http://x\n").unwrap_err();
            assert!(err.to_string().contains("base_ulr"));
        }

        #[test]
        fn test_yaml_roundtrip_keeps_probes() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();
            let back = FileConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
            assert_eq!(back, config);
        }

        #[test]
        fn test_url_resolution() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();
            assert_eq!(config.url(None).unwrap(), "http://localhost:8080");
            assert_eq!(config.url(Some("http://other")).unwrap(), "http://other");
            assert!(FileConfig::default().url(None).is_err());
        }

        #[test]
        fn test_wait_overrides() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();
            let options = config.wait_options(Some(0), None);
            assert_eq!(options.timeout_ms, 0);
            assert_eq!(options.poll_interval_ms, 50);
        }

        #[test]
        fn test_browser_overrides() {
            let config = FileConfig::default();
            let browser = config.browser_config(&BrowserArgs {
                headed: true,
                chromium: Some(PathBuf::from("/opt/chromium")),
                no_sandbox: true,
            });
            assert!(!browser.headless);
            assert!(!browser.sandbox);
            assert_eq!(browser.chromium_path, Some(PathBuf::from("/opt/chromium")));
        }

        #[test]
        fn test_target_expression() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();

            let probe = TargetArgs {
                probe: Some("state".into()),
                ..TargetArgs::default()
            };
            let (expr, label) = config.target_expression(&probe, None).unwrap();
            assert!(expr.contains("currentState"));
            assert_eq!(label, "state");

            let path = TargetArgs {
                path: Some("game.state".into()),
                ..TargetArgs::default()
            };
            let (expr, label) = config
                .target_expression(&path, Some("\"playing\""))
                .unwrap();
            assert!(expr.ends_with("=== \"playing\")"));
            assert_eq!(label, "game.state === \"playing\"");

            assert!(config.target_expression(&path, Some("playing")).is_err());
            assert!(config
                .target_expression(&TargetArgs::default(), None)
                .is_err());
        }

        #[test]
        fn test_equals_without_path_rejected() {
            let config = FileConfig::from_yaml(SAMPLE).unwrap();
            for target in [
                TargetArgs {
                    expression: Some("window.game.state".into()),
                    ..TargetArgs::default()
                },
                TargetArgs {
                    probe: Some("state".into()),
                    ..TargetArgs::default()
                },
            ] {
                let err = config
                    .target_expression(&target, Some("\"playing\""))
                    .unwrap_err();
                assert!(matches!(err, CliError::InvalidArgument { .. }));
                assert!(err.to_string().contains("--equals"));
            }
        }
    }
}
