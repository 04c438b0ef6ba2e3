//! CSV time-series of biometric samples and feeding events, one file per batch and kind.
//! Rows are only ever appended; reading returns them in time order.

use crate::error::AquaforgeError;
use aquaforge_schemas::{
    biometric::{BiometricInput, BiometricMetrics, BiometricSample, Uniformity},
    feeding::FeedingEvent,
};
use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

#[derive(Debug, Serialize, Deserialize)]
struct SampleRecord {
    batch_id: String,
    taken_at: DateTime<Utc>,
    sampled_weight_total_grams: f64,
    sampled_fish_count: u32,
    measured_length_cm: Option<f64>,
    mortality_count: u64,
    feed_consumed_kg: f64,
    observed_current_population: Option<u64>,
    individual_weights_json: String,
    mean_weight_grams: f64,
    estimated_biomass_kg: f64,
    estimated_length_cm: f64,
    daily_growth_rate_grams_per_day: Option<f64>,
    specific_growth_rate_percent_per_day: Option<f64>,
    feed_conversion_ratio: Option<f64>,
    survival_percent: Option<f64>,
    final_population_after_mortality: u64,
    uniformity_cv_percent: Option<f64>,
    uniformity_score: Option<f64>,
}

impl SampleRecord {
    fn from_sample(sample: &BiometricSample) -> Result<Self, AquaforgeError> {
        let (uniformity_cv_percent, uniformity_score) = match sample.metrics.uniformity {
            Uniformity::Scored {
                coefficient_of_variation_percent,
                score,
            } => (Some(coefficient_of_variation_percent), Some(score)),
            Uniformity::InsufficientData => (None, None),
        };
        let input = &sample.input;
        let metrics = &sample.metrics;

        Ok(Self {
            batch_id: input.batch_id.clone(),
            taken_at: input.taken_at,
            sampled_weight_total_grams: input.sampled_weight_total_grams,
            sampled_fish_count: input.sampled_fish_count,
            measured_length_cm: input.measured_length_cm,
            mortality_count: input.mortality_count,
            feed_consumed_kg: input.feed_consumed_kg,
            observed_current_population: input.observed_current_population,
            individual_weights_json: serde_json::to_string(&input.individual_weights_grams)?,
            mean_weight_grams: metrics.mean_weight_grams,
            estimated_biomass_kg: metrics.estimated_biomass_kg,
            estimated_length_cm: metrics.estimated_length_cm,
            daily_growth_rate_grams_per_day: metrics.daily_growth_rate_grams_per_day,
            specific_growth_rate_percent_per_day: metrics.specific_growth_rate_percent_per_day,
            feed_conversion_ratio: metrics.feed_conversion_ratio,
            survival_percent: metrics.survival_percent,
            final_population_after_mortality: metrics.final_population_after_mortality,
            uniformity_cv_percent,
            uniformity_score,
        })
    }

    fn into_sample(self) -> Result<BiometricSample, AquaforgeError> {
        let uniformity = match (self.uniformity_cv_percent, self.uniformity_score) {
            (Some(coefficient_of_variation_percent), Some(score)) => Uniformity::Scored {
                coefficient_of_variation_percent,
                score,
            },
            _ => Uniformity::InsufficientData,
        };

        Ok(BiometricSample {
            input: BiometricInput {
                batch_id: self.batch_id,
                taken_at: self.taken_at,
                sampled_weight_total_grams: self.sampled_weight_total_grams,
                sampled_fish_count: self.sampled_fish_count,
                measured_length_cm: self.measured_length_cm,
                mortality_count: self.mortality_count,
                feed_consumed_kg: self.feed_consumed_kg,
                observed_current_population: self.observed_current_population,
                individual_weights_grams: serde_json::from_str(&self.individual_weights_json)?,
            },
            metrics: BiometricMetrics {
                mean_weight_grams: self.mean_weight_grams,
                estimated_biomass_kg: self.estimated_biomass_kg,
                estimated_length_cm: self.estimated_length_cm,
                daily_growth_rate_grams_per_day: self.daily_growth_rate_grams_per_day,
                specific_growth_rate_percent_per_day: self.specific_growth_rate_percent_per_day,
                feed_conversion_ratio: self.feed_conversion_ratio,
                survival_percent: self.survival_percent,
                final_population_after_mortality: self.final_population_after_mortality,
                uniformity,
            },
        })
    }
}

/// Opens `path` for appending, writing the header row only when the file is new or empty.
fn open_append(path: &Path) -> Result<Writer<File>, AquaforgeError> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AquaforgeError::FileIO(display.clone(), e))?;
    }
    let needs_header = fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AquaforgeError::FileIO(display, e))?;
    Ok(WriterBuilder::new().has_headers(needs_header).from_writer(file))
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AquaforgeError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| AquaforgeError::CsvError(display.clone(), e))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|e| AquaforgeError::CsvError(display.clone(), e)))
        .collect()
}

/// Appends computed biometric samples to a batch's CSV history.
pub struct SampleLogger {
    path: PathBuf,
    writer: Writer<File>,
}

impl SampleLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AquaforgeError> {
        let path = path.as_ref().to_path_buf();
        let writer = open_append(&path)?;
        Ok(Self { path, writer })
    }

    pub fn log_sample(&mut self, sample: &BiometricSample) -> Result<(), AquaforgeError> {
        let display = self.path.display().to_string();
        self.writer
            .serialize(SampleRecord::from_sample(sample)?)
            .map_err(|e| AquaforgeError::CsvError(display.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| AquaforgeError::FileIO(display, e))?;
        Ok(())
    }
}

/// Reads a batch's biometric history, sorted by `taken_at`. A missing file is an empty
/// history.
pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<BiometricSample>, AquaforgeError> {
    let mut samples = read_records::<SampleRecord>(path.as_ref())?
        .into_iter()
        .map(SampleRecord::into_sample)
        .collect::<Result<Vec<_>, _>>()?;
    samples.sort_by_key(|s| s.taken_at());
    Ok(samples)
}

/// Appends feeding events to a batch's CSV feeding log.
pub struct FeedingLogger {
    path: PathBuf,
    writer: Writer<File>,
}

impl FeedingLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AquaforgeError> {
        let path = path.as_ref().to_path_buf();
        let writer = open_append(&path)?;
        Ok(Self { path, writer })
    }

    pub fn log_event(&mut self, event: &FeedingEvent) -> Result<(), AquaforgeError> {
        let display = self.path.display().to_string();
        self.writer
            .serialize(event)
            .map_err(|e| AquaforgeError::CsvError(display.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| AquaforgeError::FileIO(display, e))?;
        Ok(())
    }
}

pub fn read_feeding_events(path: impl AsRef<Path>) -> Result<Vec<FeedingEvent>, AquaforgeError> {
    let mut events = read_records::<FeedingEvent>(path.as_ref())?;
    events.sort_by_key(|e| e.fed_at);
    Ok(events)
}
