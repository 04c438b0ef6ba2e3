use thiserror::Error;

#[derive(Debug, Error)]
pub enum AquaforgeError {
    #[error("Invalid feeding input: {0}")]
    InvalidInput(String),

    #[error("Invalid biometric sample: {0}")]
    InvalidSample(String),

    #[error("Mortality of {mortality} exceeds the available population of {available}")]
    InvalidMortality { mortality: u64, available: u64 },

    #[error("Invalid sample history: {0}")]
    InvalidHistory(String),

    #[error("Batch '{0}' not found")]
    BatchNotFound(String),

    #[error("Sample for batch '{batch_id}' taken at {taken_at} is not newer than the latest stored sample ({latest})")]
    SampleOutOfOrder {
        batch_id: String,
        taken_at: String,
        latest: String,
    },

    #[error("Batch '{batch_id}' changed on disk: population {found}, expected {expected}")]
    StaleBatch {
        batch_id: String,
        expected: u64,
        found: u64,
    },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),
}
