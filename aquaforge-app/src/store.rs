//! File-backed `BatchStore`: batches live in the knowledge base YAML files, histories in
//! per-batch CSV files under `3_history/`.

use crate::config::KnowledgeBase;
use aquaforge_core::{
    logger::{read_feeding_events, read_samples, FeedingLogger, SampleLogger},
    store::{ensure_newest, BatchStore},
    AquaforgeError,
};
use aquaforge_schemas::{
    batch::BatchSnapshot,
    biometric::BiometricSample,
    feeding::FeedingEvent,
    file_formats::BatchFile,
};
use std::{fs, path::Path};

pub struct FileStore {
    kb: KnowledgeBase,
}

impl FileStore {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn log_feeding(&self, event: &FeedingEvent) -> Result<(), AquaforgeError> {
        if !self.kb.batches.contains_key(&event.batch_id) {
            return Err(AquaforgeError::BatchNotFound(event.batch_id.clone()));
        }
        if !event.feed_grams.is_finite() || event.feed_grams < 0.0 {
            return Err(AquaforgeError::InvalidInput(format!(
                "fed amount must be zero or more grams, got {}",
                event.feed_grams
            )));
        }
        FeedingLogger::new(self.kb.feedings_path(&event.batch_id))?.log_event(event)
    }

    pub fn feedings(&self, batch_id: &str) -> Result<Vec<FeedingEvent>, AquaforgeError> {
        read_feeding_events(self.kb.feedings_path(batch_id))
    }

    /// Renders the batch file with `batch_id` set to `current_population`, provided the
    /// population on disk still equals `expected`.
    fn updated_batch_file(
        source: &Path,
        batch_id: &str,
        expected: u64,
        current_population: u64,
    ) -> Result<String, AquaforgeError> {
        let display = source.display().to_string();
        let content =
            fs::read_to_string(source).map_err(|e| AquaforgeError::FileIO(display.clone(), e))?;
        let mut file: BatchFile = serde_yaml::from_str(&content)
            .map_err(|e| AquaforgeError::YamlParsing(display.clone(), e))?;

        let batch = file
            .batches
            .iter_mut()
            .find(|b| b.batch_id == batch_id)
            .ok_or_else(|| AquaforgeError::BatchNotFound(batch_id.to_string()))?;
        if batch.current_population != expected {
            return Err(AquaforgeError::StaleBatch {
                batch_id: batch_id.to_string(),
                expected,
                found: batch.current_population,
            });
        }
        batch.current_population = current_population;

        serde_yaml::to_string(&file).map_err(|e| AquaforgeError::YamlParsing(display, e))
    }
}

/// Removes a staged batch file; a failure only leaves a stray `.yaml.tmp` behind.
fn discard_staged(staged: &Path) -> bool {
    match fs::remove_file(staged) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                path = %staged.display(),
                error = %e,
                "could not remove staged batch file"
            );
            false
        }
    }
}

impl BatchStore for FileStore {
    fn batch(&self, batch_id: &str) -> Result<BatchSnapshot, AquaforgeError> {
        self.kb
            .batches
            .get(batch_id)
            .cloned()
            .ok_or_else(|| AquaforgeError::BatchNotFound(batch_id.to_string()))
    }

    fn samples(&self, batch_id: &str) -> Result<Vec<BiometricSample>, AquaforgeError> {
        read_samples(self.kb.biometrics_path(batch_id))
    }

    /// Stages the rewritten batch file, appends the sample row, then swaps the batch file
    /// in. Any failure before the append leaves both files untouched.
    ///
    /// The sample was computed from the population loaded with the knowledge base; if
    /// another writer has committed since, the commit is refused with `StaleBatch`.
    fn commit(&mut self, sample: BiometricSample, current_population: u64) -> Result<(), AquaforgeError> {
        let batch_id = sample.batch_id().to_string();
        let source = self
            .kb
            .batch_sources
            .get(&batch_id)
            .cloned()
            .ok_or_else(|| AquaforgeError::BatchNotFound(batch_id.clone()))?;

        let loaded = self.batch(&batch_id)?.current_population;

        ensure_newest(&sample, &self.samples(&batch_id)?)?;

        let staged = source.with_extension("yaml.tmp");
        let staged_display = staged.display().to_string();
        let content = Self::updated_batch_file(&source, &batch_id, loaded, current_population)?;
        fs::write(&staged, content).map_err(|e| AquaforgeError::FileIO(staged_display.clone(), e))?;

        let appended = SampleLogger::new(self.kb.biometrics_path(&batch_id))
            .and_then(|mut logger| logger.log_sample(&sample));
        if let Err(e) = appended {
            // The sample never reached the history, so the population must not change either.
            discard_staged(&staged);
            return Err(e);
        }

        fs::rename(&staged, &source).map_err(|e| AquaforgeError::FileIO(staged_display, e))?;

        if let Some(batch) = self.kb.batches.get_mut(&batch_id) {
            batch.current_population = current_population;
        }
        Ok(())
    }
}
