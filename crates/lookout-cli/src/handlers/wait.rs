//! Wait command handler

use super::{open_page, runtime};
use crate::commands::WaitArgs;
use crate::config::{CliConfig, FileConfig};
use crate::error::CliResult;
use crate::output::Reporter;
use lookout::{
    scoped, wait_for_expression, KeyDefinition, LookoutResult, PageSession, PollOutcome,
    WaitOptions,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::warn;

/// Everything the wait command does once a page is open
#[derive(Debug, Clone)]
pub struct WaitPlan {
    /// Page to open
    pub url: String,
    /// Expression polled for truthiness
    pub expression: String,
    /// Human-readable name of the condition
    pub label: String,
    /// Timeout and poll interval
    pub options: WaitOptions,
    /// Keys pressed after navigation
    pub presses: Vec<String>,
    /// Screenshot taken on timeout
    pub screenshot_on_timeout: Option<PathBuf>,
}

/// Outcome of a wait plus what happened to the timeout screenshot
#[derive(Debug, Clone)]
pub struct WaitReport {
    /// Poll result
    pub outcome: PollOutcome<Value>,
    /// Screenshot written after a timeout
    pub screenshot: Option<PathBuf>,
    /// Why the timeout screenshot could not be written
    pub screenshot_error: Option<String>,
}

impl WaitPlan {
    /// Resolve arguments against the configuration file
    pub fn from_args(file: &FileConfig, args: &WaitArgs) -> CliResult<Self> {
        let (expression, label) = file.target_expression(&args.target, args.equals.as_deref())?;
        for key in &args.press {
            KeyDefinition::lookup(key)?;
        }
        Ok(Self {
            url: file.url(args.url.as_deref())?,
            expression,
            label,
            options: file.wait_options(args.timeout_ms, args.interval_ms),
            presses: args.press.clone(),
            screenshot_on_timeout: args.screenshot_on_timeout.clone(),
        })
    }

    /// Navigate, press keys, then wait.
    ///
    /// A failed timeout screenshot is recorded in the report and does not
    /// replace the timeout.
    pub async fn execute<S>(&self, page: &S) -> LookoutResult<WaitReport>
    where
        S: PageSession + ?Sized,
    {
        page.navigate(&self.url).await?;
        for key in &self.presses {
            page.press_key(key).await?;
        }
        let outcome = wait_for_expression(page, &self.expression, &self.options).await?;

        let mut report = WaitReport {
            outcome,
            screenshot: None,
            screenshot_error: None,
        };
        if !report.outcome.is_satisfied() {
            if let Some(ref path) = self.screenshot_on_timeout {
                match page.screenshot(path).await {
                    Ok(()) => report.screenshot = Some(path.clone()),
                    Err(e) => {
                        warn!(error = %e, "timeout screenshot not captured");
                        report.screenshot_error = Some(e.to_string());
                    }
                }
            }
        }
        Ok(report)
    }
}

/// Execute the wait command; `Ok(false)` means the wait timed out
pub fn execute_wait(config: &CliConfig, file: &FileConfig, args: &WaitArgs) -> CliResult<bool> {
    let plan = WaitPlan::from_args(file, args)?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let label = plan.label.clone();
    let browser_config = file.browser_config(&args.browser);

    let spinner = reporter.spinner(&format!("waiting for {label}"));
    let report = runtime()?.block_on(async move {
        let page = open_page(browser_config).await?;
        let report = scoped(page, move |page| Box::pin(async move { plan.execute(page).await }))
            .await?;
        CliResult::Ok(report)
    });
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = report?;
    match report.outcome {
        PollOutcome::Satisfied(s) => {
            reporter.success(&format!(
                "{label} after {}ms ({} evaluations)",
                s.elapsed.as_millis(),
                s.evaluations
            ));
            Ok(true)
        }
        PollOutcome::TimedOut(t) => {
            reporter.failure(&format!(
                "timed out after {}ms waiting for {label} (last value: {})",
                t.elapsed.as_millis(),
                t.last
            ));
            if let Some(path) = report.screenshot {
                reporter.info(&format!("screenshot saved to {}", path.display()));
            }
            if let Some(error) = report.screenshot_error {
                reporter.warning(&format!("screenshot not captured: {error}"));
            }
            Ok(false)
        }
    }
}
