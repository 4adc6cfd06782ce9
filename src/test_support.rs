use crate::domain::scenario::{NewScenario, ScenarioInput};

// Inputs of the worked example: 2000 invoices a month handled by three AP clerks.
pub fn sample_input() -> ScenarioInput {
    ScenarioInput {
        monthly_invoice_volume: 2000.0,
        num_ap_staff: 3.0,
        avg_hours_per_invoice: 0.17,
        hourly_wage: 30.0,
        error_rate_manual: 0.5,
        error_cost: 100.0,
        time_horizon_months: 36.0,
        one_time_implementation_cost: 50000.0,
    }
}

pub fn sample_scenario(name: &str) -> NewScenario {
    NewScenario {
        scenario_name: name.to_string(),
        input: sample_input(),
    }
}

pub fn sample_payload_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "scenario_name": name,
        "monthly_invoice_volume": 2000,
        "num_ap_staff": 3,
        "avg_hours_per_invoice": 0.17,
        "hourly_wage": 30,
        "error_rate_manual": 0.5,
        "error_cost": 100,
        "time_horizon_months": 36,
        "one_time_implementation_cost": 50000
    })
}
