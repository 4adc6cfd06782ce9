use std::process::ExitCode;

use chrono::Utc;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::report_lines;
use crate::services::report_pdf::{render_report_pdf, write_report_pdf};
use crate::services::roi_calculator::calculate_roi;
use crate::services::scenario_yaml::load_scenario_from_yaml_file;

pub fn report_command(cmd: Commands) -> ExitCode {
    if let Commands::Report { input, output } = cmd {
        let scenario = match load_scenario_from_yaml_file(&input) {
            Ok(scenario) => scenario,
            Err(e) => {
                eprintln!("Failed to load scenario: {e}");
                return ExitCode::FAILURE;
            }
        };
        let result = calculate_roi(&scenario.input);
        let lines = report_lines(&scenario.scenario_name, &scenario.input, &result);
        let pdf = render_report_pdf(&lines, Utc::now());

        if let Err(e) = write_report_pdf(&output, &pdf) {
            eprintln!("Failed to write report: {e}");
            return ExitCode::FAILURE;
        }
        println!("Report written to {output}");
    }
    ExitCode::SUCCESS
}
