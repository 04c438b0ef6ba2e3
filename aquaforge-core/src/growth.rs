use crate::{error::AquaforgeError, uniformity::assess_uniformity};
use aquaforge_schemas::{
    batch::BatchSnapshot,
    biometric::{BiometricInput, BiometricMetrics, BiometricSample},
    species::{LengthWeightRelation, Species},
};

const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;

/// Turns one biometric sample, the batch's last known state and the immediately
/// preceding sample into a growth and health report.
///
/// The calculator holds only the species' length-weight relationship and is otherwise
/// stateless; history continuity comes entirely from the `previous` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthCalculator {
    length_weight: LengthWeightRelation,
}

impl GrowthCalculator {
    pub fn new(length_weight: LengthWeightRelation) -> Self {
        Self { length_weight }
    }

    pub fn for_species(species: &Species) -> Self {
        Self::new(species.length_weight)
    }

    pub fn length_weight(&self) -> LengthWeightRelation {
        self.length_weight
    }

    /// Computes every derived metric for `input`.
    ///
    /// `previous` must be the batch's sample with the highest `taken_at` strictly before
    /// `input.taken_at`, or `None` for the first sample. Growth rate, SGR and FCR are left as
    /// `None` when they cannot be derived from it, including when it is not strictly earlier.
    ///
    /// The returned sample carries `final_population_after_mortality`; writing it back to
    /// the batch is the caller's commit step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` for non-positive counts or weights, `InvalidMortality` when
    /// the mortality exceeds the population available to it, and `InvalidHistory` when
    /// `previous` belongs to another batch. No metric is computed before validation passes.
    pub fn compute_biometrics(
        &self,
        batch: &BatchSnapshot,
        previous: Option<&BiometricSample>,
        input: BiometricInput,
    ) -> Result<BiometricSample, AquaforgeError> {
        self.validate(batch, previous, &input)?;

        let available = input
            .observed_current_population
            .unwrap_or(batch.current_population);
        let final_population = available - input.mortality_count;

        let mean_weight_grams = input.sampled_weight_total_grams / input.sampled_fish_count as f64;
        let estimated_biomass_kg = mean_weight_grams * final_population as f64 / 1000.0;
        let estimated_length_cm = input
            .measured_length_cm
            .unwrap_or_else(|| self.length_weight.length_for_weight(mean_weight_grams));

        let elapsed = previous
            .map(|prev| elapsed_days(prev, &input))
            .filter(|days| *days > 0.0);

        let growth_base = previous
            .zip(elapsed)
            .filter(|(prev, _)| prev.mean_weight_grams() > 0.0);

        let daily_growth_rate_grams_per_day = growth_base
            .map(|(prev, days)| (mean_weight_grams - prev.mean_weight_grams()) / days);

        let specific_growth_rate_percent_per_day = growth_base
            .filter(|_| mean_weight_grams > 0.0)
            .map(|(prev, days)| {
                (mean_weight_grams.ln() - prev.mean_weight_grams().ln()) / days * 100.0
            });

        let feed_conversion_ratio = previous
            .zip(elapsed)
            .filter(|_| input.feed_consumed_kg > 0.0)
            .and_then(|(prev, _)| {
                let biomass_gain_grams =
                    (estimated_biomass_kg - prev.estimated_biomass_kg()) * 1000.0;
                (biomass_gain_grams > 0.0)
                    .then(|| input.feed_consumed_kg * 1000.0 / biomass_gain_grams)
            });

        let survival_percent = (batch.initial_population > 0)
            .then(|| final_population as f64 / batch.initial_population as f64 * 100.0);
        if survival_percent.map_or(false, |s| s > 100.0) {
            tracing::warn!(
                batch_id = %batch.batch_id,
                final_population,
                initial_population = batch.initial_population,
                "population exceeds the stocked count"
            );
        }

        let uniformity = assess_uniformity(&input.individual_weights_grams);

        tracing::debug!(
            batch_id = %batch.batch_id,
            taken_at = %input.taken_at,
            mean_weight_grams,
            estimated_biomass_kg,
            final_population,
            has_previous = previous.is_some(),
            "computed biometrics"
        );

        Ok(BiometricSample {
            input,
            metrics: BiometricMetrics {
                mean_weight_grams,
                estimated_biomass_kg,
                estimated_length_cm,
                daily_growth_rate_grams_per_day,
                specific_growth_rate_percent_per_day,
                feed_conversion_ratio,
                survival_percent,
                final_population_after_mortality: final_population,
                uniformity,
            },
        })
    }

    fn validate(
        &self,
        batch: &BatchSnapshot,
        previous: Option<&BiometricSample>,
        input: &BiometricInput,
    ) -> Result<(), AquaforgeError> {
        if input.batch_id != batch.batch_id {
            return Err(AquaforgeError::InvalidSample(format!(
                "sample belongs to batch '{}', not '{}'",
                input.batch_id, batch.batch_id
            )));
        }
        if input.sampled_fish_count == 0 {
            return Err(AquaforgeError::InvalidSample(
                "sampled fish count must be greater than zero".to_string(),
            ));
        }
        if !is_positive(input.sampled_weight_total_grams) {
            return Err(AquaforgeError::InvalidSample(format!(
                "sampled total weight must be positive, got {}",
                input.sampled_weight_total_grams
            )));
        }
        if let Some(length) = input.measured_length_cm {
            if !is_positive(length) {
                return Err(AquaforgeError::InvalidSample(format!(
                    "measured length must be positive, got {}",
                    length
                )));
            }
        } else if !self.length_weight.is_valid() {
            return Err(AquaforgeError::InvalidSample(format!(
                "length-weight relation a={} b={} cannot estimate length",
                self.length_weight.a, self.length_weight.b
            )));
        }
        if !input.feed_consumed_kg.is_finite() || input.feed_consumed_kg < 0.0 {
            return Err(AquaforgeError::InvalidSample(format!(
                "feed consumed must be zero or more, got {}",
                input.feed_consumed_kg
            )));
        }
        if let Some(weight) = input
            .individual_weights_grams
            .iter()
            .find(|w| !is_positive(**w))
        {
            return Err(AquaforgeError::InvalidSample(format!(
                "individual weights must be positive, got {}",
                weight
            )));
        }

        let available = input
            .observed_current_population
            .unwrap_or(batch.current_population);
        if input.mortality_count > available {
            return Err(AquaforgeError::InvalidMortality {
                mortality: input.mortality_count,
                available,
            });
        }

        if let Some(prev) = previous {
            if prev.batch_id() != batch.batch_id {
                return Err(AquaforgeError::InvalidHistory(format!(
                    "previous sample belongs to batch '{}', not '{}'",
                    prev.batch_id(),
                    batch.batch_id
                )));
            }
        }
        Ok(())
    }
}

/// Computes biometrics with the default length-weight relationship.
pub fn compute_biometrics(
    batch: &BatchSnapshot,
    previous: Option<&BiometricSample>,
    input: BiometricInput,
) -> Result<BiometricSample, AquaforgeError> {
    GrowthCalculator::default().compute_biometrics(batch, previous, input)
}

fn elapsed_days(previous: &BiometricSample, input: &BiometricInput) -> f64 {
    (input.taken_at - previous.taken_at()).num_milliseconds() as f64 / MILLISECONDS_PER_DAY
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_schemas::biometric::Uniformity;
    use chrono::{Duration, TimeZone, Utc};

    fn stocked_batch() -> BatchSnapshot {
        BatchSnapshot::new("LOTE-01", "SP-TILAPIA", 1000)
    }

    fn day(n: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    fn first_sample() -> BiometricSample {
        compute_biometrics(
            &stocked_batch(),
            None,
            BiometricInput::new("LOTE-01", day(0), 30, 1500.0),
        )
        .unwrap()
    }

    #[test]
    fn test_first_sample_has_no_growth_metrics() {
        let sample = first_sample();
        assert_eq!(sample.metrics.mean_weight_grams, 50.0);
        assert_eq!(sample.metrics.estimated_biomass_kg, 50.0);
        assert_eq!(sample.metrics.survival_percent, Some(100.0));
        assert_eq!(sample.metrics.final_population_after_mortality, 1000);
        assert_eq!(sample.metrics.daily_growth_rate_grams_per_day, None);
        assert_eq!(sample.metrics.specific_growth_rate_percent_per_day, None);
        assert_eq!(sample.metrics.feed_conversion_ratio, None);
        assert_eq!(sample.metrics.uniformity, Uniformity::InsufficientData);
    }

    #[test]
    fn test_length_estimated_from_default_relation() {
        let sample = first_sample();
        let expected = (50.0_f64 / 0.016).powf(1.0 / 3.0);
        assert!((sample.metrics.estimated_length_cm - expected).abs() < 1e-12);
    }

    #[test]
    fn test_measured_length_used_verbatim() {
        let input = BiometricInput::new("LOTE-01", day(0), 30, 1500.0).with_measured_length_cm(14.2);
        let sample = compute_biometrics(&stocked_batch(), None, input).unwrap();
        assert_eq!(sample.metrics.estimated_length_cm, 14.2);
    }

    #[test]
    fn test_species_relation_changes_length() {
        let calculator = GrowthCalculator::new(LengthWeightRelation { a: 0.01, b: 3.1 });
        let sample = calculator
            .compute_biometrics(
                &stocked_batch(),
                None,
                BiometricInput::new("LOTE-01", day(0), 10, 1000.0),
            )
            .unwrap();
        let expected = (100.0_f64 / 0.01).powf(1.0 / 3.1);
        assert!((sample.metrics.estimated_length_cm - expected).abs() < 1e-9);
    }

    #[test]
    fn test_second_sample_growth_and_fcr() {
        let first = first_sample();
        let batch = stocked_batch();
        let input = BiometricInput::new("LOTE-01", day(10), 30, 2400.0)
            .with_mortality(20)
            .with_feed_consumed_kg(3.0);
        let second = compute_biometrics(&batch, Some(&first), input).unwrap();

        assert_eq!(second.metrics.mean_weight_grams, 80.0);
        assert_eq!(second.metrics.final_population_after_mortality, 980);
        assert!((second.metrics.estimated_biomass_kg - 78.4).abs() < 1e-9);
        assert!((second.metrics.daily_growth_rate_grams_per_day.unwrap() - 3.0).abs() < 1e-9);
        assert!((second.metrics.feed_conversion_ratio.unwrap() - 3000.0 / 28400.0).abs() < 1e-9);
        assert!((second.metrics.survival_percent.unwrap() - 98.0).abs() < 1e-9);
        let sgr = (80.0_f64.ln() - 50.0_f64.ln()) / 10.0 * 100.0;
        assert!((second.metrics.specific_growth_rate_percent_per_day.unwrap() - sgr).abs() < 1e-9);
    }

    #[test]
    fn test_fcr_absent_without_feed_or_gain() {
        let first = first_sample();
        let batch = stocked_batch();

        let no_feed = BiometricInput::new("LOTE-01", day(10), 30, 2400.0);
        let sample = compute_biometrics(&batch, Some(&first), no_feed).unwrap();
        assert_eq!(sample.metrics.feed_conversion_ratio, None);

        // Heavy mortality shrinks biomass even though the fish grew.
        let loss = BiometricInput::new("LOTE-01", day(10), 30, 1800.0)
            .with_mortality(400)
            .with_feed_consumed_kg(5.0);
        let sample = compute_biometrics(&batch, Some(&first), loss).unwrap();
        assert_eq!(sample.metrics.feed_conversion_ratio, None);
        assert!(sample.metrics.daily_growth_rate_grams_per_day.unwrap() > 0.0);
    }

    #[test]
    fn test_non_positive_elapsed_time_leaves_growth_undefined() {
        let first = first_sample();
        let same_time =
            BiometricInput::new("LOTE-01", day(0), 30, 2400.0).with_feed_consumed_kg(3.0);
        let sample = compute_biometrics(&stocked_batch(), Some(&first), same_time).unwrap();
        assert_eq!(sample.metrics.daily_growth_rate_grams_per_day, None);
        assert_eq!(sample.metrics.specific_growth_rate_percent_per_day, None);
        assert_eq!(sample.metrics.feed_conversion_ratio, None);
    }

    #[test]
    fn test_later_previous_sample_leaves_fcr_undefined() {
        let later = compute_biometrics(
            &stocked_batch(),
            None,
            BiometricInput::new("LOTE-01", day(10), 30, 1500.0),
        )
        .unwrap();
        let earlier =
            BiometricInput::new("LOTE-01", day(0), 30, 2400.0).with_feed_consumed_kg(3.0);
        let sample = compute_biometrics(&stocked_batch(), Some(&later), earlier).unwrap();
        assert_eq!(sample.metrics.daily_growth_rate_grams_per_day, None);
        assert_eq!(sample.metrics.feed_conversion_ratio, None);
    }

    #[test]
    fn test_negative_growth_is_reported() {
        let first = first_sample();
        let input = BiometricInput::new("LOTE-01", day(5), 30, 1350.0);
        let sample = compute_biometrics(&stocked_batch(), Some(&first), input).unwrap();
        assert!((sample.metrics.daily_growth_rate_grams_per_day.unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_observed_population_overrides_batch() {
        let input = BiometricInput::new("LOTE-01", day(0), 20, 1000.0)
            .with_observed_population(900)
            .with_mortality(50);
        let sample = compute_biometrics(&stocked_batch(), None, input).unwrap();
        assert_eq!(sample.metrics.final_population_after_mortality, 850);
        assert!((sample.metrics.estimated_biomass_kg - 42.5).abs() < 1e-9);
        assert!((sample.metrics.survival_percent.unwrap() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_mortality_over_population_is_rejected() {
        let batch = stocked_batch().with_current_population(10);
        let input = BiometricInput::new("LOTE-01", day(0), 5, 100.0).with_mortality(11);
        let err = compute_biometrics(&batch, None, input).unwrap_err();
        assert!(matches!(
            err,
            AquaforgeError::InvalidMortality {
                mortality: 11,
                available: 10
            }
        ));

        let input = BiometricInput::new("LOTE-01", day(0), 5, 100.0).with_mortality(10);
        let sample = compute_biometrics(&batch, None, input).unwrap();
        assert_eq!(sample.metrics.final_population_after_mortality, 0);
        assert_eq!(sample.metrics.estimated_biomass_kg, 0.0);
    }

    #[test]
    fn test_mortality_checked_against_observed_population() {
        let input = BiometricInput::new("LOTE-01", day(0), 5, 100.0)
            .with_observed_population(30)
            .with_mortality(31);
        let err = compute_biometrics(&stocked_batch(), None, input).unwrap_err();
        assert!(matches!(err, AquaforgeError::InvalidMortality { available: 30, .. }));
    }

    #[test]
    fn test_invalid_samples_are_rejected() {
        let batch = stocked_batch();
        let cases = vec![
            BiometricInput::new("LOTE-01", day(0), 0, 100.0),
            BiometricInput::new("LOTE-01", day(0), 10, 0.0),
            BiometricInput::new("LOTE-01", day(0), 10, f64::NAN),
            BiometricInput::new("LOTE-01", day(0), 10, 100.0).with_feed_consumed_kg(-1.0),
            BiometricInput::new("LOTE-01", day(0), 10, 100.0).with_measured_length_cm(0.0),
            BiometricInput::new("LOTE-01", day(0), 10, 100.0).with_individual_weights(vec![10.0, -1.0]),
            BiometricInput::new("LOTE-99", day(0), 10, 100.0),
        ];
        for input in cases {
            let result = compute_biometrics(&batch, None, input);
            assert!(matches!(result, Err(AquaforgeError::InvalidSample(_))));
        }
    }

    #[test]
    fn test_previous_from_other_batch_is_rejected() {
        let other = compute_biometrics(
            &BatchSnapshot::new("LOTE-02", "SP-TILAPIA", 500),
            None,
            BiometricInput::new("LOTE-02", day(0), 10, 500.0),
        )
        .unwrap();
        let input = BiometricInput::new("LOTE-01", day(3), 10, 600.0);
        let result = compute_biometrics(&stocked_batch(), Some(&other), input);
        assert!(matches!(result, Err(AquaforgeError::InvalidHistory(_))));
    }

    #[test]
    fn test_uniformity_from_individual_weights() {
        let input = BiometricInput::new("LOTE-01", day(0), 3, 150.0)
            .with_individual_weights(vec![40.0, 50.0, 60.0]);
        let sample = compute_biometrics(&stocked_batch(), None, input).unwrap();
        let score = sample.metrics.uniformity.score().unwrap();
        assert!((score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_survival_absent_without_stocking_reference() {
        let batch = BatchSnapshot::new("LOTE-01", "SP-TILAPIA", 0);
        let input = BiometricInput::new("LOTE-01", day(0), 5, 100.0).with_observed_population(40);
        let sample = compute_biometrics(&batch, None, input).unwrap();
        assert_eq!(sample.metrics.survival_percent, None);
        assert_eq!(sample.metrics.final_population_after_mortality, 40);
    }
}
