//! Command handlers - extracted from main.rs for testability
//!
//! Browser-facing handlers split into a plan built from arguments and
//! configuration, and an `execute` step that runs against any
//! [`PageSession`](lookout::PageSession), so the logic is testable with a
//! scripted session.

pub mod config;
pub mod eval;
pub mod run;
pub mod scenario;
pub mod wait;

pub use config::execute_config;
pub use eval::{execute_eval, EvalPlan};
pub use run::execute_run;
pub use scenario::execute_validate;
pub use wait::{execute_wait, WaitPlan, WaitReport};

use crate::error::{CliError, CliResult};
use lookout::{Browser, BrowserConfig, BrowserPage};

/// Build the tokio runtime for a browser command
pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create runtime: {e}")))
}

/// Launch Chromium and open a page
pub async fn open_page(config: BrowserConfig) -> CliResult<BrowserPage> {
    let browser = Browser::launch(config).await?;
    Ok(browser.open_page().await?)
}
