//! Config command handler

use crate::commands::ConfigArgs;
use crate::config::FileConfig;
use crate::error::CliResult;

/// Render the effective configuration as YAML, optionally followed by the
/// resolved probe expressions
pub fn render_config(file: &FileConfig, args: &ConfigArgs) -> CliResult<String> {
    let mut out = file.to_yaml()?;
    if args.probes {
        out.push_str("# probe expressions\n");
        for name in file.probes.names() {
            match file.probes.expression(name) {
                Ok(expr) => out.push_str(&format!("# {name}: {expr}\n")),
                Err(e) => out.push_str(&format!("# {name}: INVALID ({e})\n")),
            }
        }
    }
    Ok(out)
}

/// Execute the config command
pub fn execute_config(file: &FileConfig, args: &ConfigArgs) -> CliResult<bool> {
    print!("{}", render_config(file, args)?);
    Ok(true)
}
