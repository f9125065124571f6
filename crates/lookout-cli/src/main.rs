//! Lookout CLI: condition waits and page probes from the terminal
//!
//! ## Usage
//!
//! ```bash
//! lookout wait --url http://localhost:8080 --path window.game.ready
//! lookout eval --probe state --probe score
//! lookout run scenarios/jump.yaml --json
//! lookout scenario validate scenarios/*.yaml
//! ```
//!
//! Exit status: 0 on success, 1 when a wait timed out or a scenario step
//! failed, 2 on any other error.

use clap::Parser;
use lookout_cli::{
    handlers, init_logging, Cli, CliConfig, CliResult, ColorChoice, Commands, FileConfig,
    ScenarioSubcommand, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);

    let color = config.color.should_color();
    console::set_colors_enabled(color);
    console::set_colors_enabled_stderr(color);
    init_logging(config.verbosity, color);

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, config: &CliConfig) -> CliResult<bool> {
    let file = FileConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Wait(args) => handlers::execute_wait(config, &file, args),
        Commands::Eval(args) => handlers::execute_eval(config, &file, args),
        Commands::Run(args) => handlers::execute_run(config, &file, args),
        Commands::Scenario(args) => match &args.command {
            ScenarioSubcommand::Validate(validate) => handlers::execute_validate(config, validate),
        },
        Commands::Config(args) => handlers::execute_config(&file, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
