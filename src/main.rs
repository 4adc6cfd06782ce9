mod commands;
mod domain;
mod services;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use crate::commands::base_commands::{CliArgs, Commands};
use crate::commands::completions_cmd::completions_command;
use crate::commands::report_cmd::report_command;
use crate::commands::serve_cmd::serve_command;
use crate::commands::simulate_cmd::simulate_command;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();
    match args.command {
        cmd @ Commands::Serve { .. } => serve_command(cmd).await,
        cmd @ Commands::Simulate { .. } => simulate_command(cmd),
        cmd @ Commands::Report { .. } => report_command(cmd),
        cmd @ Commands::Completions { .. } => {
            completions_command(cmd);
            ExitCode::SUCCESS
        }
    }
}

// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
