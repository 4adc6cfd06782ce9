use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the ROI calculator and scenario store over HTTP
    Serve {
        /// Path to server config YAML
        #[arg(short, long)]
        config: Option<String>,
        /// Port to listen on, overrides config and PORT
        #[arg(short, long)]
        port: Option<u16>,
        /// SQLite database file, overrides config and ROI_DATABASE_PATH
        #[arg(short, long)]
        database: Option<String>,
    },
    /// Calculate ROI figures for a scenario file and print a report
    Simulate {
        /// Scenario YAML (or JSON) file
        #[arg(short, long)]
        input: String,
        /// Optional output YAML file for the calculated figures
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Render the PDF report for a scenario file
    Report {
        /// Scenario YAML (or JSON) file
        #[arg(short, long)]
        input: String,
        /// Output PDF file
        #[arg(short, long)]
        output: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
