//! Human-readable status output
//!
//! Status lines go to stderr; values and JSON reports are printed to stdout
//! by the handlers.

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use lookout::{ScenarioReport, StepReport, StepStatus};
use std::time::Duration;

/// Status reporter for command execution
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Start a spinner for a long wait; `None` in quiet mode or off a terminal
    #[must_use]
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.quiet || !self.term.is_term() {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn line(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line("✓", "OK", |s| style(s).green().bold().to_string(), message);
        }
    }

    /// Print a failure message (shown even in quiet mode)
    pub fn failure(&self, message: &str) {
        self.line("✗", "FAIL", |s| style(s).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.line("⚠", "WARN", |s| style(s).yellow().bold().to_string(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.line("ℹ", "INFO", |s| style(s).blue().bold().to_string(), message);
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print every step of a scenario report plus a summary line
    pub fn scenario_report(&self, report: &ScenarioReport) {
        self.header(&report.name);
        for step in &report.steps {
            let message = step_line(step);
            match step.status {
                StepStatus::Passed => self.success(&message),
                StepStatus::Skipped => self.info(&message),
                StepStatus::Failed | StepStatus::TimedOut => self.failure(&message),
            }
        }
        if let Some(ref path) = report.failure_screenshot {
            self.info(&format!("failure screenshot: {}", path.display()));
        }
        self.summary(report);
    }

    fn summary(&self, report: &ScenarioReport) {
        if self.quiet && report.passed {
            return;
        }

        let count = |status: StepStatus| report.steps.iter().filter(|s| s.status == status).count();
        let (passed, skipped) = (count(StepStatus::Passed), count(StepStatus::Skipped));
        let secs = Duration::from_millis(report.elapsed_ms).as_secs_f64();

        let status = match (report.passed, self.use_color) {
            (true, true) => Style::new().green().bold().apply_to("PASSED").to_string(),
            (false, true) => Style::new().red().bold().apply_to("FAILED").to_string(),
            (true, false) => "PASSED".to_string(),
            (false, false) => "FAILED".to_string(),
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "{status} {} steps in {secs:.2}s ({passed} passed, {skipped} skipped)",
            report.steps.len()
        ));
    }
}

/// One-line description of a step result
#[must_use]
pub fn step_line(step: &StepReport) -> String {
    let mut line = format!("{:>2}. {}", step.step, step.action);
    if let Some(ref label) = step.label {
        line.push_str(&format!(" [{label}]"));
    }
    match step.status {
        StepStatus::Skipped => line.push_str(" skipped"),
        StepStatus::TimedOut => line.push_str(&format!(" timed out after {}ms", step.elapsed_ms)),
        _ => line.push_str(&format!(" ({}ms)", step.elapsed_ms)),
    }
    if let Some(ref value) = step.value {
        let label = if step.status == StepStatus::TimedOut { "last" } else { "=" };
        line.push_str(&format!(" {label} {value}"));
    }
    if let Some(ref error) = step.error {
        line.push_str(&format!(": {error}"));
    }
    line
}
