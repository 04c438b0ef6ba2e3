//! Size uniformity of a weighed sub-sample, scored from the coefficient of variation of
//! individual weights.

use aquaforge_schemas::biometric::Uniformity;

/// Scores uniformity as `100 - CV%` clamped to `[0, 100]`, using the sample standard
/// deviation. Needs at least two individual weights whose statistics stay finite.
pub fn assess_uniformity(weights_grams: &[f64]) -> Uniformity {
    if weights_grams.len() < 2 {
        return Uniformity::InsufficientData;
    }

    let n = weights_grams.len() as f64;
    let mean = weights_grams.iter().sum::<f64>() / n;
    if !mean.is_finite() || mean <= 0.0 {
        return Uniformity::InsufficientData;
    }

    let variance = weights_grams
        .iter()
        .map(|w| (w - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let coefficient_of_variation_percent = variance.sqrt() / mean * 100.0;
    if !coefficient_of_variation_percent.is_finite() {
        return Uniformity::InsufficientData;
    }

    Uniformity::Scored {
        coefficient_of_variation_percent,
        score: (100.0 - coefficient_of_variation_percent).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_weights_are_fully_uniform() {
        let uniformity = assess_uniformity(&[50.0, 50.0, 50.0, 50.0]);
        assert_eq!(
            uniformity,
            Uniformity::Scored {
                coefficient_of_variation_percent: 0.0,
                score: 100.0
            }
        );
    }

    #[test]
    fn test_cv_of_known_distribution() {
        // mean 50, sample stddev 10
        let uniformity = assess_uniformity(&[40.0, 50.0, 60.0]);
        match uniformity {
            Uniformity::Scored {
                coefficient_of_variation_percent,
                score,
            } => {
                assert!((coefficient_of_variation_percent - 20.0).abs() < 1e-9);
                assert!((score - 80.0).abs() < 1e-9);
            }
            Uniformity::InsufficientData => panic!("expected a score"),
        }
    }

    #[test]
    fn test_very_uneven_sample_clamps_to_zero() {
        let uniformity = assess_uniformity(&[1.0, 1.0, 1.0, 400.0]);
        assert_eq!(uniformity.score(), Some(0.0));
    }

    #[test]
    fn test_overflowing_weights_are_not_scored() {
        assert_eq!(
            assess_uniformity(&[f64::MAX, f64::MAX]),
            Uniformity::InsufficientData
        );
        assert_eq!(
            assess_uniformity(&[1.0, f64::MAX / 2.0, f64::MAX / 2.0]),
            Uniformity::InsufficientData
        );
    }

    #[test]
    fn test_needs_two_weights() {
        assert_eq!(assess_uniformity(&[]), Uniformity::InsufficientData);
        assert_eq!(assess_uniformity(&[42.0]), Uniformity::InsufficientData);
    }
}
