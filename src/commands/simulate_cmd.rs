use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::format_roi_report;
use crate::services::roi_calculator::calculate_roi;
use crate::services::scenario_yaml::{load_scenario_from_yaml_file, serialize_simulation_to_yaml};

pub fn simulate_command(cmd: Commands) -> ExitCode {
    if let Commands::Simulate { input, output } = cmd {
        let scenario = match load_scenario_from_yaml_file(&input) {
            Ok(scenario) => scenario,
            Err(e) => {
                eprintln!("Failed to load scenario: {e}");
                return ExitCode::FAILURE;
            }
        };
        let result = calculate_roi(&scenario.input);
        println!(
            "{}",
            format_roi_report(&scenario.scenario_name, &scenario.input, &result)
        );

        if let Some(output) = output {
            let yaml = match serialize_simulation_to_yaml(&scenario.scenario_name, &result) {
                Ok(contents) => contents,
                Err(e) => {
                    eprintln!("Failed to serialize simulation result: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = std::fs::write(&output, yaml) {
                eprintln!("Failed to write simulation result: {e}");
                return ExitCode::FAILURE;
            }
            println!("Simulation result written to {output}");
        }
    }
    ExitCode::SUCCESS
}
