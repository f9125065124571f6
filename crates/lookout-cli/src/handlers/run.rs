//! Run command handler

use super::{open_page, runtime};
use crate::commands::RunArgs;
use crate::config::{CliConfig, FileConfig};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use lookout::{scoped, Scenario, ScenarioReport};
use tracing::info;

/// Load a scenario, filling `base_url` from the configuration file
pub fn load_scenario(file: &FileConfig, args: &RunArgs) -> CliResult<Scenario> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if scenario.base_url.is_none() {
        scenario.base_url.clone_from(&file.base_url);
    }
    Ok(scenario)
}

/// Render a report as pretty JSON
pub fn report_json(report: &ScenarioReport) -> CliResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| CliError::output(e.to_string()))
}

/// Execute the run command; `Ok(false)` means a step failed or timed out
pub fn execute_run(config: &CliConfig, file: &FileConfig, args: &RunArgs) -> CliResult<bool> {
    let scenario = load_scenario(file, args)?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    info!(
        file = %args.scenario.display(),
        steps = scenario.steps.len(),
        "loaded scenario"
    );
    let browser_config = file.browser_config(&args.browser);

    let report = runtime()?.block_on(async move {
        let page = open_page(browser_config).await?;
        let report = scoped(page, move |page| {
            Box::pin(async move { Ok(scenario.run(page).await) })
        })
        .await?;
        CliResult::Ok(report)
    })?;

    if args.json {
        println!("{}", report_json(&report)?);
    } else {
        reporter.scenario_report(&report);
    }
    Ok(report.passed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::BrowserArgs;
    use lookout::ScriptedSession;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    const SCENARIO: &str = r#"
version: "1.0"
name: boot
steps:
  - action: navigate
    url: /
  - action: eval
    expression: document.title
    label: title
"#;

    fn args(path: &Path) -> RunArgs {
        RunArgs {
            scenario: path.to_path_buf(),
            json: true,
            browser: BrowserArgs::default(),
        }
    }

    fn write_scenario(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
        let path = dir.path().join("scenario.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_base_url_from_config() {
        let dir = TempDir::new().unwrap();
        let path = write_scenario(&dir, SCENARIO);
        let file = FileConfig::from_yaml("base_url: http://localhost:3000\n").unwrap();
        let scenario = load_scenario(&file, &args(&path)).unwrap();
        assert_eq!(scenario.resolve_url("/"), "http://localhost:3000/");
    }

    #[test]
    fn test_scenario_base_url_wins() {
        let dir = TempDir::new().unwrap();
        let yaml = SCENARIO.replace("name: boot", "name: boot\nbase_url: http://game.local");
        let path = write_scenario(&dir, &yaml);
        let file = FileConfig::from_yaml("base_url: http://localhost:3000\n").unwrap();
        let scenario = load_scenario(&file, &args(&path)).unwrap();
        assert_eq!(scenario.base_url.as_deref(), Some("http://game.local"));
    }

    #[test]
    fn test_invalid_scenario_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_scenario(&dir, "version: \"1.0\"\nsteps: []\n");
        let err = load_scenario(&FileConfig::default(), &args(&path)).unwrap_err();
        assert!(err.to_string().contains("steps cannot be empty"));
    }

    #[tokio::test]
    async fn test_report_json() {
        let dir = TempDir::new().unwrap();
        let path = write_scenario(&dir, SCENARIO);
        let scenario = load_scenario(&FileConfig::default(), &args(&path)).unwrap();
        let session = ScriptedSession::new().respond("document.title", [json!("Platformer")]);

        let report = scenario.run(&session).await;
        let parsed: serde_json::Value = serde_json::from_str(&report_json(&report).unwrap()).unwrap();
        assert_eq!(parsed["passed"], json!(true));
        assert_eq!(parsed["steps"][1]["label"], json!("title"));
        assert_eq!(parsed["steps"][1]["value"], json!("Platformer"));
    }
}
