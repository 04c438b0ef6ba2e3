//! Feeding and growth calculations for aquaculture batches.
//!
//! Both calculators are pure: they take a [`BatchSnapshot`] and, for growth, the
//! immediately preceding sample, and return new values for the caller to persist.
//! [`store::record_biometric`] wires them to a [`store::BatchStore`] for callers that
//! want the lookup-compute-commit sequence done for them.
//!
//! [`BatchSnapshot`]: aquaforge_schemas::batch::BatchSnapshot

pub mod error;
pub mod feeding;
pub mod format;
pub mod growth;
pub mod history;
pub mod logger;
pub mod store;
pub mod uniformity;

pub use error::AquaforgeError;
pub use feeding::{compute_feeding_plan, FeedingCalculator};
pub use growth::{compute_biometrics, GrowthCalculator};
