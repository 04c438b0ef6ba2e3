//! Display helpers shared by the CLI and any other front end.

/// Formats a mass in grams, switching to kilograms from 1 kg upwards.
pub fn format_grams(grams: f64) -> String {
    if grams.abs() >= 1000.0 {
        format_kg(grams / 1000.0)
    } else {
        format!("{:.1} g", grams)
    }
}

pub fn format_kg(kg: f64) -> String {
    format!("{:.2} kg", kg)
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Renders a metric that may be undefined for lack of history.
pub fn format_optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "n/a".to_string(), render)
}
