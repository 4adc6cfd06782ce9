use crate::domain::scenario::ScenarioInput;
use crate::domain::simulation_result::SimulationResult;

pub const REPORT_TITLE: &str = "Invoicing ROI Simulator Report";

// Enough fraction digits to print any f64 exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Lays out one scenario's inputs and headline results, one entry per line.
///
/// The first line is the title and an empty entry separates inputs from results.
pub fn report_lines(
    scenario_name: &str,
    input: &ScenarioInput,
    result: &SimulationResult,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(REPORT_TITLE.to_string());
    lines.push(String::new());
    lines.push(format!("Scenario: {scenario_name}"));
    lines.push(format!(
        "Monthly Invoice Volume: {}",
        input.monthly_invoice_volume
    ));
    lines.push(format!("Number of AP Staff: {}", input.num_ap_staff));
    lines.push(format!(
        "Average Hours per Invoice: {}",
        input.avg_hours_per_invoice
    ));
    lines.push(format!("Hourly Wage: ${}", input.hourly_wage));
    lines.push(format!("Manual Error Rate: {}%", input.error_rate_manual));
    lines.push(format!("Error Cost: ${}", input.error_cost));
    lines.push(format!(
        "Time Horizon (Months): {}",
        input.time_horizon_months
    ));
    lines.push(format!(
        "One-time Implementation Cost: ${}",
        input.one_time_implementation_cost
    ));
    lines.push(String::new());
    lines.push(format!(
        "Monthly Savings: ${}",
        to_fixed(result.monthly_savings, 2)
    ));
    lines.push(format!(
        "Payback Period (Months): {}",
        to_fixed(result.payback_months, 1)
    ));
    lines.push(format!("ROI (%): {}", to_fixed(result.roi_percentage, 1)));
    lines
}

/// Formats `value` with `digits` decimals, rounding exact ties away from zero.
///
/// `{:.N}` rounds a value lying exactly halfway to the even neighbour
/// (`6.25` becomes `6.2`); reports print `6.3`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let rounded = format!("{value:.digits$}");
    if !value.is_finite() || digits >= EXACT_FRACTION_DIGITS {
        return rounded;
    }
    let exact = format!("{value:.EXACT_FRACTION_DIGITS$}");
    let Some((whole, fraction)) = exact.split_once('.') else {
        return rounded;
    };
    let (kept, dropped) = fraction.split_at(digits);
    let is_tie = dropped.starts_with('5') && dropped[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return rounded;
    }
    let truncated = if digits == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{kept}")
    };
    increment_last_digit(&truncated)
}

// Adds one unit in the last place of a decimal string, carrying through nines.
fn increment_last_digit(decimal: &str) -> String {
    let mut chars: Vec<char> = decimal.chars().collect();
    let mut index = chars.len();
    while index > 0 {
        index -= 1;
        match chars[index] {
            '.' => continue,
            '9' => chars[index] = '0',
            '-' => {
                chars.insert(index + 1, '1');
                return chars.into_iter().collect();
            }
            digit => {
                chars[index] = char::from(digit as u8 + 1);
                return chars.into_iter().collect();
            }
        }
    }
    chars.insert(0, '1');
    chars.into_iter().collect()
}

/// Plain-text report for the terminal, including the figures the PDF leaves out.
pub fn format_roi_report(
    scenario_name: &str,
    input: &ScenarioInput,
    result: &SimulationResult,
) -> String {
    let mut lines = report_lines(scenario_name, input, result);
    lines.push(format!(
        "Cumulative Savings: ${}",
        to_fixed(result.cumulative_savings, 2)
    ));
    lines.push(format!("Net Savings: ${}", to_fixed(result.net_savings, 2)));
    lines.join("\n")
}
