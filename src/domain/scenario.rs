use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The numeric inputs of one ROI scenario. Every value is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub monthly_invoice_volume: f64,
    pub num_ap_staff: f64,
    pub avg_hours_per_invoice: f64,
    pub hourly_wage: f64,
    /// Percentage, e.g. `0.5` for half a percent.
    pub error_rate_manual: f64,
    pub error_cost: f64,
    pub time_horizon_months: f64,
    pub one_time_implementation_cost: f64,
}

/// A scenario as submitted for saving, before the store has assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScenario {
    pub scenario_name: String,
    pub input: ScenarioInput,
}

/// A persisted scenario. Serializes as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub id: i64,
    pub scenario_name: String,
    #[serde(flatten)]
    pub input: ScenarioInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: i64,
    pub scenario_name: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum ScenarioValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field {0} must be a finite number")]
    NonFinite(&'static str),
}

/// A numeric field as it arrives from a form or file: a number, a numeric
/// string, or any other value, which `validate` rejects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
    Other(Value),
}

/// Raw scenario payload shared by the HTTP API and scenario files.
///
/// Any JSON object deserializes into it; type problems surface from
/// [`ScenarioPayload::validate`]. Unknown keys such as a report `email` are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioPayload {
    pub scenario_name: Option<Value>,
    pub monthly_invoice_volume: Option<NumericField>,
    pub num_ap_staff: Option<NumericField>,
    pub avg_hours_per_invoice: Option<NumericField>,
    pub hourly_wage: Option<NumericField>,
    pub error_rate_manual: Option<NumericField>,
    pub error_cost: Option<NumericField>,
    pub time_horizon_months: Option<NumericField>,
    pub one_time_implementation_cost: Option<NumericField>,
}

impl ScenarioPayload {
    /// Checks the payload and converts it into a [`NewScenario`].
    ///
    /// `scenario_name` defaults to an empty string and
    /// `one_time_implementation_cost` to zero; every other numeric field is
    /// required. Numeric strings are accepted, anything else is rejected.
    pub fn validate(&self) -> Result<NewScenario, ScenarioValidationError> {
        let input = ScenarioInput {
            monthly_invoice_volume: required(
                "monthly_invoice_volume",
                &self.monthly_invoice_volume,
            )?,
            num_ap_staff: required("num_ap_staff", &self.num_ap_staff)?,
            avg_hours_per_invoice: required("avg_hours_per_invoice", &self.avg_hours_per_invoice)?,
            hourly_wage: required("hourly_wage", &self.hourly_wage)?,
            error_rate_manual: required("error_rate_manual", &self.error_rate_manual)?,
            error_cost: required("error_cost", &self.error_cost)?,
            time_horizon_months: required("time_horizon_months", &self.time_horizon_months)?,
            one_time_implementation_cost: optional(
                "one_time_implementation_cost",
                &self.one_time_implementation_cost,
            )?
            .unwrap_or(0.0),
        };

        Ok(NewScenario {
            scenario_name: match &self.scenario_name {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(name)) => name.clone(),
                Some(other) => other.to_string(),
            },
            input,
        })
    }
}

fn required(
    field: &'static str,
    value: &Option<NumericField>,
) -> Result<f64, ScenarioValidationError> {
    optional(field, value)?.ok_or(ScenarioValidationError::MissingField(field))
}

fn optional(
    field: &'static str,
    value: &Option<NumericField>,
) -> Result<Option<f64>, ScenarioValidationError> {
    let number = match value {
        None => return Ok(None),
        Some(NumericField::Number(number)) => *number,
        Some(NumericField::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ScenarioValidationError::InvalidNumber {
                    field,
                    value: text.clone(),
                })?
        }
        Some(NumericField::Other(value)) => {
            return Err(ScenarioValidationError::InvalidNumber {
                field,
                value: value.to_string(),
            });
        }
    };
    if !number.is_finite() {
        return Err(ScenarioValidationError::NonFinite(field));
    }
    Ok(Some(number))
}
