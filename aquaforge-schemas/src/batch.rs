use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a batch. Transitions happen outside the calculation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Active,
    Harvested,
    Transferred,
    Lost,
}

/// An immutable view of a livestock batch at calculation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub batch_id: String,
    pub batch_name: String,
    /// Key into the species catalog. Informational for every formula except the
    /// length estimate, which uses the species' length-weight relationship.
    pub species_id: String,
    /// Live count before any mortality recorded in the current cycle.
    pub current_population: u64,
    /// Population at stocking.
    pub initial_population: u64,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(default)]
    pub stocked_at: Option<DateTime<Utc>>,
}

impl BatchSnapshot {
    pub fn new(
        batch_id: impl Into<String>,
        species_id: impl Into<String>,
        initial_population: u64,
    ) -> Self {
        let batch_id = batch_id.into();
        Self {
            batch_name: batch_id.clone(),
            batch_id,
            species_id: species_id.into(),
            current_population: initial_population,
            initial_population,
            status: BatchStatus::Active,
            stocked_at: None,
        }
    }

    pub fn with_current_population(mut self, current_population: u64) -> Self {
        self.current_population = current_population;
        self
    }
}
