pub mod api;
pub mod report_pdf;
pub mod roi_calculator;
pub mod scenario_store;
pub mod scenario_yaml;
pub mod server_config;
pub mod sqlite_store;
