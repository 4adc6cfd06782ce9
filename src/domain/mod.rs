pub mod scenario;
pub mod simulation_result;
