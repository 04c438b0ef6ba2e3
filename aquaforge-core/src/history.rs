use crate::{error::AquaforgeError, growth::GrowthCalculator};
use aquaforge_schemas::{
    batch::BatchSnapshot,
    biometric::{BiometricInput, BiometricSample},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Growth over a batch's whole sampled history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub batch_id: String,
    pub sample_count: usize,
    pub first_taken_at: DateTime<Utc>,
    pub last_taken_at: DateTime<Utc>,
    pub days_covered: f64,
    pub initial_mean_weight_grams: f64,
    pub latest_mean_weight_grams: f64,
    pub overall_daily_growth_grams_per_day: Option<f64>,
    pub total_mortality: u64,
    /// Feed recorded after the first sample, i.e. feed with a biomass baseline.
    pub total_feed_kg: f64,
    pub cumulative_feed_conversion_ratio: Option<f64>,
    pub latest_biomass_kg: f64,
    pub latest_population: u64,
    pub latest_survival_percent: Option<f64>,
}

/// Returns the sample immediately preceding `taken_at`: the one with the highest
/// `taken_at` strictly less than it. The slice does not need to be sorted.
pub fn find_previous(history: &[BiometricSample], taken_at: DateTime<Utc>) -> Option<&BiometricSample> {
    history
        .iter()
        .filter(|s| s.taken_at() < taken_at)
        .max_by_key(|s| s.taken_at())
}

/// Checks that `history` is one batch's samples in strictly increasing time order.
pub fn validate_chain(history: &[BiometricSample]) -> Result<(), AquaforgeError> {
    let Some(first) = history.first() else {
        return Ok(());
    };

    if let Some(stray) = history.iter().find(|s| s.batch_id() != first.batch_id()) {
        return Err(AquaforgeError::InvalidHistory(format!(
            "history mixes batches '{}' and '{}'",
            first.batch_id(),
            stray.batch_id()
        )));
    }

    for pair in history.windows(2) {
        if pair[1].taken_at() <= pair[0].taken_at() {
            return Err(AquaforgeError::InvalidHistory(format!(
                "sample taken at {} does not follow sample taken at {}",
                pair[1].taken_at(),
                pair[0].taken_at()
            )));
        }
    }
    Ok(())
}

/// Summarizes a validated, time-ordered history. Returns `None` for an empty history.
pub fn summarize(history: &[BiometricSample]) -> Result<Option<GrowthSummary>, AquaforgeError> {
    validate_chain(history)?;

    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return Ok(None);
    };

    let days_covered =
        (last.taken_at() - first.taken_at()).num_milliseconds() as f64 / 86_400_000.0;
    let overall_daily_growth_grams_per_day = (days_covered > 0.0 && first.mean_weight_grams() > 0.0)
        .then(|| (last.mean_weight_grams() - first.mean_weight_grams()) / days_covered);

    let total_mortality = history.iter().map(|s| s.input.mortality_count).sum();
    let total_feed_kg: f64 = history.iter().skip(1).map(|s| s.input.feed_consumed_kg).sum();
    let biomass_gain_grams = (last.estimated_biomass_kg() - first.estimated_biomass_kg()) * 1000.0;
    let cumulative_feed_conversion_ratio = (total_feed_kg > 0.0 && biomass_gain_grams > 0.0)
        .then(|| total_feed_kg * 1000.0 / biomass_gain_grams);

    Ok(Some(GrowthSummary {
        batch_id: first.batch_id().to_string(),
        sample_count: history.len(),
        first_taken_at: first.taken_at(),
        last_taken_at: last.taken_at(),
        days_covered,
        initial_mean_weight_grams: first.mean_weight_grams(),
        latest_mean_weight_grams: last.mean_weight_grams(),
        overall_daily_growth_grams_per_day,
        total_mortality,
        total_feed_kg,
        cumulative_feed_conversion_ratio,
        latest_biomass_kg: last.estimated_biomass_kg(),
        latest_population: last.metrics.final_population_after_mortality,
        latest_survival_percent: last.metrics.survival_percent,
    }))
}

/// Recomputes a whole chain of raw samples in time order, committing each sample's
/// population before computing the next. Returns the samples and the batch as it stands
/// after the last commit.
pub fn replay(
    batch: &BatchSnapshot,
    calculator: &GrowthCalculator,
    mut inputs: Vec<BiometricInput>,
) -> Result<(Vec<BiometricSample>, BatchSnapshot), AquaforgeError> {
    inputs.sort_by_key(|input| input.taken_at);
    if let Some(pair) = inputs.windows(2).find(|p| p[0].taken_at == p[1].taken_at) {
        return Err(AquaforgeError::InvalidHistory(format!(
            "two samples taken at {}",
            pair[0].taken_at
        )));
    }

    let mut current = batch.clone();
    let mut samples: Vec<BiometricSample> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let sample = calculator.compute_biometrics(&current, samples.last(), input)?;
        current.current_population = sample.metrics.final_population_after_mortality;
        samples.push(sample);
    }
    Ok((samples, current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    fn chain() -> Vec<BiometricSample> {
        let batch = BatchSnapshot::new("LOTE-01", "SP-TILAPIA", 1000);
        let inputs = vec![
            BiometricInput::new("LOTE-01", day(20), 30, 3300.0)
                .with_mortality(10)
                .with_feed_consumed_kg(4.0),
            BiometricInput::new("LOTE-01", day(0), 30, 1500.0).with_feed_consumed_kg(1.0),
            BiometricInput::new("LOTE-01", day(10), 30, 2400.0)
                .with_mortality(20)
                .with_feed_consumed_kg(3.0),
        ];
        replay(&batch, &GrowthCalculator::default(), inputs).unwrap().0
    }

    #[test]
    fn test_find_previous_picks_latest_strictly_earlier() {
        let history = chain();
        let mut shuffled = history.clone();
        shuffled.reverse();

        assert!(find_previous(&shuffled, day(0)).is_none());
        assert_eq!(find_previous(&shuffled, day(10)).unwrap().taken_at(), day(0));
        assert_eq!(find_previous(&shuffled, day(15)).unwrap().taken_at(), day(10));
        assert_eq!(find_previous(&shuffled, day(30)).unwrap().taken_at(), day(20));
    }

    #[test]
    fn test_replay_threads_population() {
        let batch = BatchSnapshot::new("LOTE-01", "SP-TILAPIA", 1000);
        let history = chain();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].taken_at(), day(0));
        assert_eq!(history[1].metrics.final_population_after_mortality, 980);
        assert_eq!(history[2].metrics.final_population_after_mortality, 970);

        let inputs = history.iter().map(|s| s.input.clone()).collect();
        let (_, after) = replay(&batch, &GrowthCalculator::default(), inputs).unwrap();
        assert_eq!(after.current_population, 970);
        assert_eq!(after.initial_population, 1000);
    }

    #[test]
    fn test_replay_rejects_duplicate_timestamps() {
        let batch = BatchSnapshot::new("LOTE-01", "SP-TILAPIA", 1000);
        let inputs = vec![
            BiometricInput::new("LOTE-01", day(0), 30, 1500.0),
            BiometricInput::new("LOTE-01", day(0), 30, 1600.0),
        ];
        let result = replay(&batch, &GrowthCalculator::default(), inputs);
        assert!(matches!(result, Err(AquaforgeError::InvalidHistory(_))));
    }

    #[test]
    fn test_validate_chain_rejects_disorder() {
        let mut history = chain();
        assert!(validate_chain(&history).is_ok());
        history.swap(0, 1);
        assert!(matches!(
            validate_chain(&history),
            Err(AquaforgeError::InvalidHistory(_))
        ));
    }

    #[test]
    fn test_summary_over_chain() {
        let summary = summarize(&chain()).unwrap().unwrap();
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.days_covered, 20.0);
        assert_eq!(summary.initial_mean_weight_grams, 50.0);
        assert_eq!(summary.latest_mean_weight_grams, 110.0);
        assert!((summary.overall_daily_growth_grams_per_day.unwrap() - 3.0).abs() < 1e-9);
        assert_eq!(summary.total_mortality, 30);
        assert_eq!(summary.total_feed_kg, 7.0);
        // 970 fish at 110 g = 106.7 kg, up from 50 kg
        assert!((summary.latest_biomass_kg - 106.7).abs() < 1e-9);
        let expected_fcr = 7000.0 / 56_700.0;
        assert!((summary.cumulative_feed_conversion_ratio.unwrap() - expected_fcr).abs() < 1e-9);
        assert_eq!(summary.latest_population, 970);
        assert!((summary.latest_survival_percent.unwrap() - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_empty_history() {
        assert_eq!(summarize(&[]).unwrap(), None);
    }
}
