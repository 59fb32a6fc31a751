//! Anomaly Detection - predicted vs. observed deviation
//!
//! Compares the regressor's predicted power output against the observed
//! reading from the spreadsheet. Deviation above the configured percentage of
//! the predicted value flags an anomaly. Pure and stateless: one comparison
//! per call, no history.

use serde::{Deserialize, Serialize};

use crate::constants;

// ============================================================================
// THRESHOLD CONFIGURATION
// ============================================================================

/// Threshold Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Maximum tolerated deviation, as percent of the predicted value
    pub threshold_percent: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold_percent: constants::DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl ThresholdConfig {
    pub fn new(threshold_percent: f32) -> Self {
        Self { threshold_percent }
    }

    /// High sensitivity (flags smaller deviations)
    pub fn high_sensitivity() -> Self {
        Self {
            threshold_percent: 10.0,
        }
    }

    /// Low sensitivity (tolerates larger deviations)
    pub fn low_sensitivity() -> Self {
        Self {
            threshold_percent: 50.0,
        }
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Outcome of one predicted-vs-observed comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub predicted: f32,
    pub actual: f32,
    pub absolute_difference: f32,
    pub relative_difference_percent: f32,
    pub is_anomalous: bool,
}

// ============================================================================
// DETECTION
// ============================================================================

/// Compare a predicted value against an observed one
///
/// Returns `None` when no observed value exists — insufficient data, not an
/// error. A non-positive prediction means there is no meaningful baseline to
/// deviate from: the verdict carries the absolute difference but a relative
/// deviation of 0 and no anomaly flag (this also guards the division).
pub fn detect(
    predicted: f32,
    actual: Option<f32>,
    config: &ThresholdConfig,
) -> Option<AnomalyVerdict> {
    let actual = actual?;

    let absolute_difference = (predicted - actual).abs();

    let (relative_difference_percent, is_anomalous) = if predicted > 0.0 {
        let relative = (absolute_difference / predicted) * 100.0;
        (relative, relative > config.threshold_percent)
    } else {
        (0.0, false)
    };

    Some(AnomalyVerdict {
        predicted,
        actual,
        absolute_difference,
        relative_difference_percent,
        is_anomalous,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = ThresholdConfig::default();
        assert_eq!(config.threshold_percent, 25.0);
    }

    #[test]
    fn test_absent_actual_yields_no_verdict() {
        assert!(detect(100.0, None, &ThresholdConfig::default()).is_none());
    }

    #[test]
    fn test_within_threshold_is_normal() {
        let verdict = detect(100.0, Some(80.0), &ThresholdConfig::default()).expect("verdict");
        assert_eq!(verdict.absolute_difference, 20.0);
        assert!((verdict.relative_difference_percent - 20.0).abs() < 1e-4);
        assert!(!verdict.is_anomalous);
    }

    #[test]
    fn test_beyond_threshold_is_anomalous() {
        let verdict = detect(100.0, Some(70.0), &ThresholdConfig::default()).expect("verdict");
        assert!((verdict.relative_difference_percent - 30.0).abs() < 1e-4);
        assert!(verdict.is_anomalous);
    }

    #[test]
    fn test_exactly_at_threshold_is_normal() {
        // Strictly-above comparison: 25% deviation at a 25% threshold passes
        let verdict = detect(100.0, Some(75.0), &ThresholdConfig::default()).expect("verdict");
        assert_eq!(verdict.relative_difference_percent, 25.0);
        assert!(!verdict.is_anomalous);
    }

    #[test]
    fn test_zero_prediction_has_no_baseline() {
        let verdict = detect(0.0, Some(50.0), &ThresholdConfig::default()).expect("verdict");
        assert_eq!(verdict.relative_difference_percent, 0.0);
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.absolute_difference, 50.0);
    }

    #[test]
    fn test_negative_prediction_has_no_baseline() {
        let verdict = detect(-5.0, Some(10.0), &ThresholdConfig::default()).expect("verdict");
        assert_eq!(verdict.relative_difference_percent, 0.0);
        assert!(!verdict.is_anomalous);
    }

    #[test]
    fn test_sensitivity_constructors() {
        let strict = ThresholdConfig::high_sensitivity();
        let lax = ThresholdConfig::low_sensitivity();

        let deviation_20 = detect(100.0, Some(80.0), &strict).expect("verdict");
        assert!(deviation_20.is_anomalous);

        let deviation_40 = detect(100.0, Some(60.0), &lax).expect("verdict");
        assert!(!deviation_40.is_anomalous);
    }
}
