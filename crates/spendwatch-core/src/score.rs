//! Confidence normalization and the anomaly decision policy
//!
//! The forest's raw score is rescaled linearly over a fixed reference
//! window into a confidence value in [0, 100]. The final anomaly flag is
//! gated by statistics first: a transaction within two standard deviations
//! of its category mean is never reported as anomalous, no matter how the
//! ensemble voted. Only past that gate does the model's confidence decide.

/// Empirical reference window for raw scores
pub const RAW_WINDOW_MIN: f64 = -0.5;
pub const RAW_WINDOW_MAX: f64 = 0.5;

/// Statistical gate: |z| must exceed this before the model's vote counts
pub const Z_SCORE_GATE: f64 = 2.0;

/// Model gate: confidence must exceed this to flag an anomaly
pub const CONFIDENCE_GATE: f64 = 70.0;

/// Map a raw score plus the ensemble's binary vote into [0, 100].
///
/// Outliers are scaled from the top of the window, non-outliers from the
/// bottom, so confidence always expresses distance from the decision
/// boundary in the direction of the vote.
pub fn normalize(raw_score: f64, is_outlier: bool) -> f64 {
    let raw = raw_score.clamp(RAW_WINDOW_MIN, RAW_WINDOW_MAX);
    let range = RAW_WINDOW_MAX - RAW_WINDOW_MIN;
    let confidence = if is_outlier {
        ((raw - RAW_WINDOW_MAX) / range) * -100.0
    } else {
        ((raw - RAW_WINDOW_MIN) / range) * 100.0
    };
    confidence.clamp(0.0, 100.0)
}

/// The final anomaly decision. The z-score gate is checked first; the
/// confidence gate only applies beyond it.
pub fn decide(z_score: f64, confidence: f64) -> bool {
    if z_score.abs() <= Z_SCORE_GATE {
        return false;
    }
    confidence > CONFIDENCE_GATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_bounded_for_any_raw_score() {
        for raw in [-10.0, -1.0, -0.5, -0.25, 0.0, 0.5, 3.0, f64::MAX, f64::MIN] {
            for outlier in [true, false] {
                let c = normalize(raw, outlier);
                assert!((0.0..=100.0).contains(&c), "raw {} gave {}", raw, c);
            }
        }
    }

    #[test]
    fn test_outlier_scaling_direction() {
        // deep in the anomalous end of the window
        assert_eq!(normalize(-0.5, true), 100.0);
        // at the top of the window, outlier confidence vanishes
        assert_eq!(normalize(0.5, true), 0.0);
        // midpoint
        assert_eq!(normalize(0.0, true), 50.0);
    }

    #[test]
    fn test_non_outlier_scaling_direction() {
        assert_eq!(normalize(-0.5, false), 0.0);
        assert_eq!(normalize(0.5, false), 100.0);
        assert_eq!(normalize(0.0, false), 50.0);
    }

    #[test]
    fn test_z_gate_overrides_model_vote() {
        // within two sigma: never anomalous, even at full confidence
        assert!(!decide(2.0, 100.0));
        assert!(!decide(-2.0, 100.0));
        assert!(!decide(0.33, 99.9));
    }

    #[test]
    fn test_confidence_gate_beyond_z_gate() {
        assert!(decide(15.0, 70.1));
        assert!(!decide(15.0, 70.0));
        assert!(!decide(2.1, 50.0));
        assert!(decide(-3.0, 85.0));
    }
}
