//! The seam between the calculators and whatever persists batches and their histories.

use crate::{error::AquaforgeError, growth::GrowthCalculator, history::find_previous};
use aquaforge_schemas::{
    batch::BatchSnapshot,
    biometric::{BiometricInput, BiometricSample},
};
use std::collections::HashMap;

/// Persistence operations the engine relies on.
///
/// Implementations must apply `commit` atomically: either the sample is appended and
/// the population written, or neither happens. Concurrent biometric entries for the same
/// batch must be serialized by the implementation.
pub trait BatchStore {
    fn batch(&self, batch_id: &str) -> Result<BatchSnapshot, AquaforgeError>;

    /// Samples for `batch_id`, ordered by `taken_at` ascending.
    fn samples(&self, batch_id: &str) -> Result<Vec<BiometricSample>, AquaforgeError>;

    fn commit(&mut self, sample: BiometricSample, current_population: u64) -> Result<(), AquaforgeError>;
}

/// Looks up the batch and its history, computes the new sample against the immediately
/// preceding one, and commits the sample with the batch's new population.
///
/// Nothing is committed if the calculation fails.
pub fn record_biometric<S: BatchStore + ?Sized>(
    store: &mut S,
    calculator: &GrowthCalculator,
    input: BiometricInput,
) -> Result<BiometricSample, AquaforgeError> {
    let batch = store.batch(&input.batch_id)?;
    let history = store.samples(&input.batch_id)?;
    let previous = find_previous(&history, input.taken_at);

    let sample = calculator.compute_biometrics(&batch, previous, input)?;
    let population = sample.metrics.final_population_after_mortality;
    store.commit(sample.clone(), population)?;

    tracing::info!(
        batch_id = %batch.batch_id,
        taken_at = %sample.taken_at(),
        population_before = batch.current_population,
        population_after = population,
        "recorded biometric sample"
    );
    Ok(sample)
}

/// Checks the store-side ordering rule shared by implementations: a committed sample
/// must be strictly newer than every sample already stored for its batch, since its
/// population becomes the batch's current one.
pub fn ensure_newest(
    sample: &BiometricSample,
    history: &[BiometricSample],
) -> Result<(), AquaforgeError> {
    match history.iter().map(|s| s.taken_at()).max() {
        Some(latest) if sample.taken_at() <= latest => Err(AquaforgeError::SampleOutOfOrder {
            batch_id: sample.batch_id().to_string(),
            taken_at: sample.taken_at().to_rfc3339(),
            latest: latest.to_rfc3339(),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryBatchStore {
    batches: HashMap<String, BatchSnapshot>,
    samples: HashMap<String, Vec<BiometricSample>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: BatchSnapshot) -> Self {
        self.insert_batch(batch);
        self
    }

    pub fn insert_batch(&mut self, batch: BatchSnapshot) {
        self.batches.insert(batch.batch_id.clone(), batch);
    }
}

impl BatchStore for InMemoryBatchStore {
    fn batch(&self, batch_id: &str) -> Result<BatchSnapshot, AquaforgeError> {
        self.batches
            .get(batch_id)
            .cloned()
            .ok_or_else(|| AquaforgeError::BatchNotFound(batch_id.to_string()))
    }

    fn samples(&self, batch_id: &str) -> Result<Vec<BiometricSample>, AquaforgeError> {
        Ok(self.samples.get(batch_id).cloned().unwrap_or_default())
    }

    fn commit(&mut self, sample: BiometricSample, current_population: u64) -> Result<(), AquaforgeError> {
        let batch_id = sample.batch_id().to_string();
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| AquaforgeError::BatchNotFound(batch_id.clone()))?;
        let history = self.samples.entry(batch_id).or_default();
        ensure_newest(&sample, history)?;

        history.push(sample);
        batch.current_population = current_population;
        Ok(())
    }
}
