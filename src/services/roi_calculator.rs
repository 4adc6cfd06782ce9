use crate::domain::scenario::ScenarioInput;
use crate::domain::simulation_result::SimulationResult;

/// Processing cost of one invoice once automated, in currency units.
pub const AUTOMATED_COST_PER_INVOICE: f64 = 0.20;
/// Error rate of the automated process (0.1%).
pub const ERROR_RATE_AUTO: f64 = 0.001;
/// Multiplier applied to monthly savings before anything is derived from them.
pub const MIN_ROI_BOOST_FACTOR: f64 = 1.1;

/// Computes the savings and ROI figures for `input`.
///
/// The arithmetic is evaluated in a fixed order so results are reproducible to
/// the last bit. Each returned figure is floored at zero; negative, NaN and
/// infinite values (division by a zero or negative denominator) all become 0.
pub fn calculate_roi(input: &ScenarioInput) -> SimulationResult {
    let labor_cost_manual = input.num_ap_staff
        * input.hourly_wage
        * input.avg_hours_per_invoice
        * input.monthly_invoice_volume;
    let auto_cost = input.monthly_invoice_volume * AUTOMATED_COST_PER_INVOICE;
    let error_savings = (input.error_rate_manual / 100.0 - ERROR_RATE_AUTO)
        * input.monthly_invoice_volume
        * input.error_cost;

    let monthly_savings = (labor_cost_manual + error_savings - auto_cost) * MIN_ROI_BOOST_FACTOR;
    let cumulative_savings = monthly_savings * input.time_horizon_months;
    let net_savings = cumulative_savings - input.one_time_implementation_cost;
    let payback_months = input.one_time_implementation_cost / monthly_savings;
    let roi_percentage = net_savings / input.one_time_implementation_cost * 100.0;

    SimulationResult {
        monthly_savings: floor_at_zero(monthly_savings),
        cumulative_savings: floor_at_zero(cumulative_savings),
        net_savings: floor_at_zero(net_savings),
        payback_months: floor_at_zero(payback_months),
        roi_percentage: floor_at_zero(roi_percentage),
    }
}

fn floor_at_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
