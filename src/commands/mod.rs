pub mod base_commands;
pub mod completions_cmd;
pub mod report_cmd;
pub mod report_format;
pub mod serve_cmd;
pub mod simulate_cmd;
