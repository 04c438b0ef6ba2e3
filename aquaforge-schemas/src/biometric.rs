//! Biometric sampling: the raw measurements a farmer enters and the metrics derived from
//! them. A sample is appended to the batch history once computed and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The raw measurements of one sampling event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricInput {
    pub batch_id: String,
    pub taken_at: DateTime<Utc>,
    /// Combined weight of every fish in the sample.
    pub sampled_weight_total_grams: f64,
    pub sampled_fish_count: u32,
    pub measured_length_cm: Option<f64>,
    /// Deaths recorded since the previous sample.
    #[serde(default)]
    pub mortality_count: u64,
    /// Feed delivered since the previous sample.
    #[serde(default)]
    pub feed_consumed_kg: f64,
    /// Head count observed on the day, overriding the batch's last known population.
    pub observed_current_population: Option<u64>,
    /// Individual weights of a weighed sub-sample, when the farmer recorded them.
    #[serde(default)]
    pub individual_weights_grams: Vec<f64>,
}

impl BiometricInput {
    pub fn new(
        batch_id: impl Into<String>,
        taken_at: DateTime<Utc>,
        sampled_fish_count: u32,
        sampled_weight_total_grams: f64,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            taken_at,
            sampled_weight_total_grams,
            sampled_fish_count,
            measured_length_cm: None,
            mortality_count: 0,
            feed_consumed_kg: 0.0,
            observed_current_population: None,
            individual_weights_grams: Vec::new(),
        }
    }

    pub fn with_mortality(mut self, mortality_count: u64) -> Self {
        self.mortality_count = mortality_count;
        self
    }

    pub fn with_feed_consumed_kg(mut self, feed_consumed_kg: f64) -> Self {
        self.feed_consumed_kg = feed_consumed_kg;
        self
    }

    pub fn with_measured_length_cm(mut self, length_cm: f64) -> Self {
        self.measured_length_cm = Some(length_cm);
        self
    }

    pub fn with_observed_population(mut self, population: u64) -> Self {
        self.observed_current_population = Some(population);
        self
    }

    pub fn with_individual_weights(mut self, weights_grams: Vec<f64>) -> Self {
        self.individual_weights_grams = weights_grams;
        self
    }
}

/// How evenly sized the sampled fish are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Uniformity {
    Scored {
        coefficient_of_variation_percent: f64,
        /// `100 - CV`, clamped to `[0, 100]`. Higher is more uniform.
        score: f64,
    },
    /// Fewer than two individual weights were recorded.
    InsufficientData,
}

impl Uniformity {
    pub fn score(&self) -> Option<f64> {
        match self {
            Uniformity::Scored { score, .. } => Some(*score),
            Uniformity::InsufficientData => None,
        }
    }
}

/// Metrics derived from a sample. `None` marks a metric that cannot be computed from
/// the available history, which is the normal state for a batch's first sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricMetrics {
    pub mean_weight_grams: f64,
    pub estimated_biomass_kg: f64,
    pub estimated_length_cm: f64,
    pub daily_growth_rate_grams_per_day: Option<f64>,
    pub specific_growth_rate_percent_per_day: Option<f64>,
    pub feed_conversion_ratio: Option<f64>,
    pub survival_percent: Option<f64>,
    pub final_population_after_mortality: u64,
    pub uniformity: Uniformity,
}

/// A fully populated biometric sample as stored in the batch history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricSample {
    #[serde(flatten)]
    pub input: BiometricInput,
    #[serde(flatten)]
    pub metrics: BiometricMetrics,
}

impl BiometricSample {
    pub fn batch_id(&self) -> &str {
        &self.input.batch_id
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.input.taken_at
    }

    pub fn mean_weight_grams(&self) -> f64 {
        self.metrics.mean_weight_grams
    }

    pub fn estimated_biomass_kg(&self) -> f64 {
        self.metrics.estimated_biomass_kg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniformity_is_tagged_by_status() {
        let json = serde_json::to_value(Uniformity::InsufficientData).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(Uniformity::InsufficientData.score(), None);

        let scored = Uniformity::Scored {
            coefficient_of_variation_percent: 12.5,
            score: 87.5,
        };
        let json = serde_json::to_value(scored).unwrap();
        assert_eq!(json["status"], "scored");
        assert_eq!(scored.score(), Some(87.5));
    }
}
