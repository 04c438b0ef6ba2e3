use crate::error::AquaforgeError;
use aquaforge_schemas::{
    batch::BatchSnapshot,
    feeding::{FeedingFrequency, FeedingInput, FeedingResult},
};
use serde::{Deserialize, Serialize};

/// Outside this range the temperature bands are extrapolations.
const PLAUSIBLE_WATER_TEMPERATURE_C: (f64, f64) = (10.0, 35.0);

/// One row of the feed rate table: fish weighing at most `max_weight_grams` are fed
/// `rate` of their biomass per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedRateBand {
    pub max_weight_grams: f64,
    pub rate: f64,
}

/// Weight-banded feed rates. Bands are checked in order with an inclusive upper bound
/// and the first match wins; heavier fish fall through to `fallback_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRateTable {
    pub bands: Vec<FeedRateBand>,
    pub fallback_rate: f64,
}

impl Default for FeedRateTable {
    fn default() -> Self {
        let band = |max_weight_grams, rate| FeedRateBand { max_weight_grams, rate };
        Self {
            bands: vec![
                band(5.0, 0.10),
                band(20.0, 0.08),
                band(50.0, 0.06),
                band(100.0, 0.05),
                band(200.0, 0.04),
                band(400.0, 0.03),
            ],
            fallback_rate: 0.02,
        }
    }
}

impl FeedRateTable {
    pub fn rate_for(&self, weight_grams: f64) -> f64 {
        self.bands
            .iter()
            .find(|b| weight_grams <= b.max_weight_grams)
            .map_or(self.fallback_rate, |b| b.rate)
    }
}

/// Multiplicative feeding adjustment by water temperature.
///
/// The bands are `t < cold_below`, `cold_below <= t < cool_below`,
/// `cool_below <= t <= warm_up_to` and `t > warm_up_to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBands {
    pub cold_below: f64,
    pub cool_below: f64,
    pub warm_up_to: f64,
    pub cold_factor: f64,
    pub cool_factor: f64,
    pub optimal_factor: f64,
    pub hot_factor: f64,
}

impl Default for TemperatureBands {
    fn default() -> Self {
        Self {
            cold_below: 18.0,
            cool_below: 22.0,
            warm_up_to: 30.0,
            cold_factor: 0.5,
            cool_factor: 0.8,
            optimal_factor: 1.0,
            // Above 30 °C the ration is only trimmed slightly, not cut like in cold water.
            hot_factor: 0.9,
        }
    }
}

impl TemperatureBands {
    pub fn factor_for(&self, temperature_c: f64) -> f64 {
        if temperature_c < self.cold_below {
            self.cold_factor
        } else if temperature_c < self.cool_below {
            self.cool_factor
        } else if temperature_c <= self.warm_up_to {
            self.optimal_factor
        } else {
            self.hot_factor
        }
    }
}

/// Meals per day by individual weight.
pub fn frequency_for_weight(weight_grams: f64) -> FeedingFrequency {
    if weight_grams < 20.0 {
        FeedingFrequency::FourToSixDaily
    } else if weight_grams < 100.0 {
        FeedingFrequency::ThreeToFourDaily
    } else {
        FeedingFrequency::TwoToThreeDaily
    }
}

/// Maps a sample weight and water temperature to a daily feeding recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedingCalculator {
    pub rates: FeedRateTable,
    pub temperature: TemperatureBands,
}

impl FeedingCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate_table(mut self, rates: FeedRateTable) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_temperature_bands(mut self, temperature: TemperatureBands) -> Self {
        self.temperature = temperature;
        self
    }

    /// Computes the feeding plan for `batch` at its current population.
    ///
    /// A batch with no fish yet yields a zero ration rather than an error, so a plan can
    /// be previewed before the population is assigned.
    ///
    /// # Errors
    ///
    /// Returns `AquaforgeError::InvalidInput` if the sample weight is not a positive
    /// number or the temperature is not finite.
    pub fn compute_feeding_plan(
        &self,
        batch: &BatchSnapshot,
        input: &FeedingInput,
    ) -> Result<FeedingResult, AquaforgeError> {
        let weight = input.sample_weight_grams;
        let temperature = input.water_temperature_celsius;

        if !weight.is_finite() || weight <= 0.0 {
            return Err(AquaforgeError::InvalidInput(format!(
                "sample weight must be a positive number of grams, got {}",
                weight
            )));
        }
        if !temperature.is_finite() {
            return Err(AquaforgeError::InvalidInput(format!(
                "water temperature must be a finite number, got {}",
                temperature
            )));
        }

        let (min_temp, max_temp) = PLAUSIBLE_WATER_TEMPERATURE_C;
        if temperature < min_temp || temperature > max_temp {
            tracing::warn!(
                batch_id = %batch.batch_id,
                temperature,
                "water temperature is outside the calibrated range"
            );
        }

        let base_feed_rate = self.rates.rate_for(weight);
        let temperature_factor = self.temperature.factor_for(temperature);
        let biomass_kg = batch.current_population as f64 * weight / 1000.0;
        let adjusted_feed_rate_percent = base_feed_rate * temperature_factor * 100.0;
        let daily_ration_grams = biomass_kg * (adjusted_feed_rate_percent / 100.0) * 1000.0;

        tracing::debug!(
            batch_id = %batch.batch_id,
            biomass_kg,
            base_feed_rate,
            temperature_factor,
            daily_ration_grams,
            "computed feeding plan"
        );

        Ok(FeedingResult {
            biomass_kg,
            base_feed_rate,
            base_feed_rate_percent: base_feed_rate * 100.0,
            temperature_factor,
            adjusted_feed_rate_percent,
            daily_ration_grams,
            recommended_frequency: frequency_for_weight(weight),
        })
    }
}

/// Computes a feeding plan with the default rate table and temperature bands.
pub fn compute_feeding_plan(
    batch: &BatchSnapshot,
    input: &FeedingInput,
) -> Result<FeedingResult, AquaforgeError> {
    FeedingCalculator::default().compute_feeding_plan(batch, input)
}
