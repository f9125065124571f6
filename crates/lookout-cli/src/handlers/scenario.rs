//! Scenario command handler

use crate::commands::ValidateArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;
use lookout::Scenario;

/// Validate scenario files; `Ok(false)` if any file is invalid
pub fn execute_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<bool> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let mut all_valid = true;

    for path in &args.files {
        match Scenario::load(path) {
            Ok(scenario) => reporter.success(&format!(
                "{}: '{}' ({} steps)",
                path.display(),
                scenario.display_name(),
                scenario.steps.len()
            )),
            Err(e) => {
                reporter.failure(&format!("{}: {e}", path.display()));
                all_valid = false;
            }
        }
    }
    Ok(all_valid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mixed_files() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.yaml");
        std::fs::write(
            &good,
            "version: \"1.0\"\nsteps:\n  - action: press\n    key: Space\n",
        )
        .unwrap();
        std::fs::write(&bad, "version: \"1.0\"\nsteps:\n  - action: press\n    key: Hyper\n")
            .unwrap();

        let config = CliConfig::new();
        let only_good = ValidateArgs {
            files: vec![good.clone()],
        };
        assert!(execute_validate(&config, &only_good).unwrap());

        let both = ValidateArgs {
            files: vec![good, bad],
        };
        assert!(!execute_validate(&config, &both).unwrap());
    }
}
