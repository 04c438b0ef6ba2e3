use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement<T> {
    pub value: T,
    pub unit: String,
}

/// A generic struct to define a minimum and maximum tolerance range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd> ToleranceRange<T> {
    /// Returns true when `value` lies within the closed range `[min, max]`.
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

/// Defines a species' tolerance to water temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTolerance {
    /// The optimal water temperature for growth.
    pub optimal: Measurement<f64>,
    /// The temperature range in which the species feeds normally.
    pub range: ToleranceRange<f64>,
}
