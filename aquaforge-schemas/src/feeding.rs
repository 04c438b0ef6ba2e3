//! Feeding requests, recommendations and the feeding event record kept by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One feeding-calculation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedingInput {
    /// Average individual weight of the sampled fish.
    pub sample_weight_grams: f64,
    pub water_temperature_celsius: f64,
}

impl FeedingInput {
    pub fn new(sample_weight_grams: f64, water_temperature_celsius: f64) -> Self {
        Self {
            sample_weight_grams,
            water_temperature_celsius,
        }
    }
}

/// How many meals per day the ration should be split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedingFrequency {
    #[serde(rename = "4-6x/day")]
    FourToSixDaily,
    #[serde(rename = "3-4x/day")]
    ThreeToFourDaily,
    #[serde(rename = "2-3x/day")]
    TwoToThreeDaily,
}

impl FeedingFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            FeedingFrequency::FourToSixDaily => "4-6x/day",
            FeedingFrequency::ThreeToFourDaily => "3-4x/day",
            FeedingFrequency::TwoToThreeDaily => "2-3x/day",
        }
    }
}

impl fmt::Display for FeedingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An advisory feeding plan. The engine never persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingResult {
    pub biomass_kg: f64,
    /// Base feed rate as a fraction of biomass per day.
    pub base_feed_rate: f64,
    pub base_feed_rate_percent: f64,
    pub temperature_factor: f64,
    pub adjusted_feed_rate_percent: f64,
    pub daily_ration_grams: f64,
    #[serde(rename = "recommended_frequency_label")]
    pub recommended_frequency: FeedingFrequency,
}

/// A feeding that actually happened, stored verbatim by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingEvent {
    pub batch_id: String,
    pub fed_at: DateTime<Utc>,
    pub feed_grams: f64,
    pub feed_type: Option<String>,
    pub notes: Option<String>,
}
