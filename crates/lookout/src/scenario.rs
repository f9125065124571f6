//! Declarative debugging scenarios.
//!
//! A scenario is the YAML form of a one-off debugging script: go to the
//! game, press some keys, wait for a state, read a few values, grab a
//! screenshot. Waits are always condition waits with a timeout.
//!
//! ```yaml
//! version: "1.0"
//! name: jump from spawn
//! base_url: http://localhost:8080
//! steps:
//!   - action: navigate
//!     url: /
//!   - action: wait_for
//!     path: window.game.stateManager.currentState
//!     equals: playing
//!     timeout_ms: 10000
//!   - action: press
//!     key: Space
//!   - action: eval
//!     path: window.game.player.velocity.y
//!     label: vy
//! ```

use crate::keys::KeyDefinition;
use crate::probe::{equals_expression, path_expression};
use crate::result::{LookoutError, LookoutResult};
use crate::session::{wait_for_expression, PageSession};
use crate::wait::{PollOutcome, WaitOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Supported scenario schema version
pub const SCENARIO_VERSION: &str = "1.0";

fn one() -> u32 {
    1
}

/// `scheme:` prefix per RFC 3986, e.g. `http:`, `about:`, `data:`
fn has_scheme(url: &str) -> bool {
    url.split_once(':').is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Navigate to a URL (relative URLs resolve against `base_url`)
    Navigate {
        /// Target URL
        url: String,
    },
    /// Press and release a key
    Press {
        /// Key name
        key: String,
        /// Number of presses
        #[serde(default = "one")]
        repeat: u32,
    },
    /// Wait until a page value is truthy (or equals `equals`)
    WaitFor {
        /// Raw page expression
        #[serde(default)]
        expression: Option<String>,
        /// Dotted global path
        #[serde(default)]
        path: Option<String>,
        /// Value the path must strictly equal
        #[serde(default)]
        equals: Option<Value>,
        /// Override of the scenario timeout
        #[serde(default)]
        timeout_ms: Option<u64>,
        /// Override of the scenario poll interval
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    /// Evaluate and record a page value
    Eval {
        /// Raw page expression
        #[serde(default)]
        expression: Option<String>,
        /// Dotted global path
        #[serde(default)]
        path: Option<String>,
        /// Label used in the report
        #[serde(default)]
        label: Option<String>,
    },
    /// Save a PNG screenshot
    Screenshot {
        /// Output path
        path: PathBuf,
    },
}

fn target_expression(
    expression: Option<&String>,
    path: Option<&String>,
    equals: Option<&Value>,
) -> LookoutResult<String> {
    match (expression, path, equals) {
        (Some(_), Some(_), _) => Err(LookoutError::invalid_scenario(
            "use either `expression` or `path`, not both",
        )),
        (Some(_), None, Some(_)) => Err(LookoutError::invalid_scenario(
            "`equals` only applies to `path`",
        )),
        (Some(expr), None, None) if expr.trim().is_empty() => {
            Err(LookoutError::invalid_scenario("expression is empty"))
        }
        (Some(expr), None, None) => Ok(expr.clone()),
        (None, Some(path), Some(value)) => equals_expression(path, value),
        (None, Some(path), None) => path_expression(path),
        (None, None, _) => Err(LookoutError::invalid_scenario(
            "one of `expression` or `path` is required",
        )),
    }
}

impl Step {
    /// Short action name
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Press { .. } => "press",
            Self::WaitFor { .. } => "wait_for",
            Self::Eval { .. } => "eval",
            Self::Screenshot { .. } => "screenshot",
        }
    }

    fn validate(&self) -> LookoutResult<()> {
        match self {
            Self::Navigate { url } if url.trim().is_empty() => {
                Err(LookoutError::invalid_scenario("navigate needs a url"))
            }
            Self::Navigate { .. } => Ok(()),
            Self::Press { repeat: 0, .. } => {
                Err(LookoutError::invalid_scenario("press repeat must be at least 1"))
            }
            Self::Press { key, .. } => KeyDefinition::lookup(key).map(|_| ()),
            Self::WaitFor {
                expression,
                path,
                equals,
                ..
            } => target_expression(expression.as_ref(), path.as_ref(), equals.as_ref()).map(|_| ()),
            Self::Eval {
                expression, path, ..
            } => target_expression(expression.as_ref(), path.as_ref(), None).map(|_| ()),
            Self::Screenshot { path } if path.as_os_str().is_empty() => {
                Err(LookoutError::invalid_scenario("screenshot needs a path"))
            }
            Self::Screenshot { .. } => Ok(()),
        }
    }
}

/// A parsed and validated scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Schema version, must be `1.0`
    pub version: String,
    /// Human-readable name
    #[serde(default)]
    pub name: Option<String>,
    /// Base for relative navigation URLs
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default wait options for `wait_for` steps
    #[serde(default)]
    pub wait: WaitOptions,
    /// Screenshot taken when a step fails
    #[serde(default)]
    pub screenshot_on_failure: Option<PathBuf>,
    /// Steps, run in order
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from YAML and validate it
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::InvalidScenario`] if the YAML is malformed or
    /// fails validation
    pub fn from_yaml(yaml: &str) -> LookoutResult<Self> {
        let scenario: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LookoutError::invalid_scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid
    pub fn load(path: &Path) -> LookoutResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> LookoutResult<()> {
        if self.version != SCENARIO_VERSION {
            return Err(LookoutError::invalid_scenario(format!(
                "version '{}', expected '{SCENARIO_VERSION}'",
                self.version
            )));
        }
        if self.steps.is_empty() {
            return Err(LookoutError::invalid_scenario("steps cannot be empty"));
        }
        for (index, step) in self.steps.iter().enumerate() {
            step.validate().map_err(|e| {
                LookoutError::invalid_scenario(format!(
                    "step {} ({}): {e}",
                    index + 1,
                    step.action()
                ))
            })?;
        }
        Ok(())
    }

    /// Resolve a navigation URL against `base_url`
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !has_scheme(url) => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }

    /// Display name
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("scenario")
    }

    /// Run every step against `session`, stopping at the first failure.
    ///
    /// Step failures, including timeouts, end up in the report rather than
    /// as an `Err`.
    pub async fn run<S>(&self, session: &S) -> ScenarioReport
    where
        S: PageSession + ?Sized,
    {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut failed = false;

        info!(scenario = self.display_name(), steps = self.steps.len(), "running scenario");
        for (index, step) in self.steps.iter().enumerate() {
            if failed {
                steps.push(StepReport::new(index, step, StepStatus::Skipped));
                continue;
            }
            let report = self.run_step(session, index, step).await;
            if report.status != StepStatus::Passed {
                warn!(
                    step = index + 1,
                    action = step.action(),
                    status = ?report.status,
                    error = report.error.as_deref().unwrap_or(""),
                    "step did not pass"
                );
                failed = true;
            }
            steps.push(report);
        }

        let mut failure_screenshot = None;
        if failed {
            if let Some(ref path) = self.screenshot_on_failure {
                match session.screenshot(path).await {
                    Ok(()) => failure_screenshot = Some(path.clone()),
                    Err(e) => warn!(error = %e, "failure screenshot not captured"),
                }
            }
        }

        ScenarioReport {
            name: self.display_name().to_string(),
            passed: !failed,
            elapsed_ms: elapsed_ms(start),
            failure_screenshot,
            steps,
        }
    }

    async fn run_step<S>(&self, session: &S, index: usize, step: &Step) -> StepReport
    where
        S: PageSession + ?Sized,
    {
        let start = Instant::now();
        let mut report = StepReport::new(index, step, StepStatus::Passed);

        let result: LookoutResult<()> = async {
            match step {
                Step::Navigate { url } => session.navigate(&self.resolve_url(url)).await,
                Step::Press { key, repeat } => {
                    for _ in 0..*repeat {
                        session.press_key(key).await?;
                    }
                    Ok(())
                }
                Step::WaitFor {
                    expression,
                    path,
                    equals,
                    timeout_ms,
                    interval_ms,
                } => {
                    let expr =
                        target_expression(expression.as_ref(), path.as_ref(), equals.as_ref())?;
                    let options = WaitOptions::new()
                        .with_timeout(timeout_ms.unwrap_or(self.wait.timeout_ms))
                        .with_poll_interval(interval_ms.unwrap_or(self.wait.poll_interval_ms));
                    let outcome = wait_for_expression(session, &expr, &options).await?;
                    report.evaluations = Some(outcome.evaluations());
                    if let PollOutcome::TimedOut(t) = outcome {
                        report.status = StepStatus::TimedOut;
                        report.value = Some(t.last);
                    }
                    Ok(())
                }
                Step::Eval {
                    expression, path, ..
                } => {
                    let expr = target_expression(expression.as_ref(), path.as_ref(), None)?;
                    report.value = Some(session.evaluate(&expr).await?);
                    Ok(())
                }
                Step::Screenshot { path } => session.screenshot(path).await,
            }
        }
        .await;

        if let Err(e) = result {
            report.status = StepStatus::Failed;
            report.error = Some(e.to_string());
        }
        report.elapsed_ms = elapsed_ms(start);
        report
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step completed
    Passed,
    /// `wait_for` condition never held
    TimedOut,
    /// Step raised an error
    Failed,
    /// Not run because an earlier step did not pass
    Skipped,
}

/// Report for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based step number
    pub step: usize,
    /// Action name
    pub action: String,
    /// Label from the scenario, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Outcome
    pub status: StepStatus,
    /// Time spent on the step
    pub elapsed_ms: u64,
    /// Evaluated value (eval) or last observed value (timed-out wait)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Predicate evaluations (wait_for)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluations: Option<u32>,
    /// Error message when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    fn new(index: usize, step: &Step, status: StepStatus) -> Self {
        let label = match step {
            Step::Eval { label, .. } => label.clone(),
            _ => None,
        };
        Self {
            step: index + 1,
            action: step.action().to_string(),
            label,
            status,
            elapsed_ms: 0,
            value: None,
            evaluations: None,
            error: None,
        }
    }
}

/// Report for a whole scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Whether every step passed
    pub passed: bool,
    /// Total run time
    pub elapsed_ms: u64,
    /// Screenshot captured after a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_screenshot: Option<PathBuf>,
    /// Per-step reports
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    /// First step that did not pass
    #[must_use]
    pub fn first_failure(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed | StepStatus::TimedOut))
    }
}
