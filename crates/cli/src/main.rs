mod cli;
mod gate;
mod report;
mod terminal;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cronload_core::config::load_dotenv;
use cronload_core::Config;

use crate::cli::{CliArgs, OutputFormat};
use crate::terminal::Terminal;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let terminal = Terminal::new();

    let outcome = Config::from_env()
        .context("failed to load configuration")
        .and_then(|config| gate::run(&args, config));

    let printed = match (&outcome, args.format) {
        (Ok(report), OutputFormat::Text) => terminal.print_report(report),
        (Ok(report), OutputFormat::Json) => serde_json::to_string_pretty(report)
            .context("failed to serialize report")
            .map(|json| println!("{json}")),
        (Err(e), _) => terminal.print_error(&format!("{e:#}")),
    };
    if let Err(e) = printed {
        let _ = terminal.print_error(&format!("{e:#}"));
        return ExitCode::from(gate::EXIT_CANNOT_COMPUTE);
    }

    ExitCode::from(gate::exit_code(&outcome))
}
