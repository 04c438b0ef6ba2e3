//! Defines the data structures for representing a farmed species in the AquaForge
//! knowledge base. Only the biological parameters the calculation engine needs are
//! modelled here; catalog fields such as commercial names live with the host application.

use crate::environment::TemperatureTolerance;
use serde::{Deserialize, Serialize};

/// Coefficient `a` of the default length-weight relationship `W = a * L^b`.
pub const DEFAULT_LENGTH_WEIGHT_COEFFICIENT: f64 = 0.016;

/// Exponent `b` of the default length-weight relationship `W = a * L^b`.
pub const DEFAULT_LENGTH_WEIGHT_EXPONENT: f64 = 3.0;

/// The allometric length-weight relationship `W = a * L^b`, with weight in grams and
/// length in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthWeightRelation {
    /// The condition coefficient `a`.
    pub a: f64,
    /// The allometric exponent `b`. Isometric growth is `3.0`.
    pub b: f64,
}

impl Default for LengthWeightRelation {
    fn default() -> Self {
        Self {
            a: DEFAULT_LENGTH_WEIGHT_COEFFICIENT,
            b: DEFAULT_LENGTH_WEIGHT_EXPONENT,
        }
    }
}

impl LengthWeightRelation {
    /// Estimates the length in centimetres of an individual weighing `weight_grams`.
    pub fn length_for_weight(&self, weight_grams: f64) -> f64 {
        (weight_grams / self.a).powf(1.0 / self.b)
    }

    /// Returns true when both parameters are usable for the inverse relationship.
    pub fn is_valid(&self) -> bool {
        self.a.is_finite() && self.a > 0.0 && self.b.is_finite() && self.b > 0.0
    }
}

/// The top-level struct representing a species definition in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub species_id: String,
    pub species_name: String,
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub length_weight: LengthWeightRelation,
    /// Used only to flag feeding sessions outside the comfortable range.
    pub optimal_temperature: Option<TemperatureTolerance>,
}
