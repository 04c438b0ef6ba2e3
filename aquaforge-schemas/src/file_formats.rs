use crate::{batch::BatchSnapshot, species::Species};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SpeciesFile {
    pub schema_version: String,
    pub species: Vec<Species>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchFile {
    pub schema_version: String,
    pub batches: Vec<BatchSnapshot>,
}
