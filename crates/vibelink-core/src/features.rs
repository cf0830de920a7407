//! Signal feature derivation.
//!
//! A row's raw vibration signal is thousands of samples wide; only a
//! fixed set of summary statistics travels over the wire.

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Summary statistics of one signal vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalFeatures {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator). A single-sample
    /// vector yields 0.0 so every feature stays finite.
    pub std: f64,
    pub max: f64,
    pub min: f64,
    /// Always `max - min`.
    pub peak_to_peak: f64,
}

impl SignalFeatures {
    /// Derive features from a signal vector.
    ///
    /// Returns [`FeatureError::EmptySignal`] for an empty slice; an
    /// empty signal is malformed input, not a zero-valued one.
    pub fn derive(signal: &[f64]) -> Result<Self, FeatureError> {
        if signal.is_empty() {
            return Err(FeatureError::EmptySignal);
        }

        let n = signal.len() as f64;
        let mean = signal.iter().sum::<f64>() / n;

        let std = if signal.len() < 2 {
            0.0
        } else {
            let variance = signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };

        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for &v in signal {
            max = max.max(v);
            min = min.min(v);
        }

        Ok(Self {
            mean,
            std,
            max,
            min,
            peak_to_peak: max - min,
        })
    }

    /// Round every feature to `digits` decimal places, half away from
    /// zero. Bounds payload size and keeps payloads stable across runs.
    pub fn rounded(&self, digits: u32) -> Self {
        Self {
            mean: round_to(self.mean, digits),
            std: round_to(self.std, digits),
            max: round_to(self.max, digits),
            min: round_to(self.min, digits),
            peak_to_peak: round_to(self.peak_to_peak, digits),
        }
    }
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let f = SignalFeatures::derive(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(f.mean, 3.0);
        assert!((f.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(f.max, 5.0);
        assert_eq!(f.min, 1.0);
        assert_eq!(f.peak_to_peak, 4.0);
    }

    #[test]
    fn test_peak_to_peak_is_max_minus_min() {
        for signal in [
            vec![0.5],
            vec![-3.2, 7.1, 0.0],
            vec![-1.5, -9.25, -0.75, -4.0],
        ] {
            let f = SignalFeatures::derive(&signal).unwrap();
            assert_eq!(f.peak_to_peak, f.max - f.min);
        }
    }

    #[test]
    fn test_single_sample_has_zero_std() {
        let f = SignalFeatures::derive(&[42.0]).unwrap();
        assert_eq!(f.mean, 42.0);
        assert_eq!(f.std, 0.0);
        assert_eq!(f.peak_to_peak, 0.0);
    }

    #[test]
    fn test_empty_signal_rejected() {
        assert_eq!(SignalFeatures::derive(&[]), Err(FeatureError::EmptySignal));
    }

    #[test]
    fn test_rounding() {
        let f = SignalFeatures {
            mean: 0.123_456_789,
            std: 1.999_999_95,
            max: -0.000_000_4,
            min: 2.5,
            peak_to_peak: -1.234_567_45,
        };
        let r = f.rounded(6);
        assert_eq!(r.mean, 0.123_457);
        assert_eq!(r.std, 2.0);
        assert_eq!(r.max, 0.0);
        assert_eq!(r.min, 2.5);
        assert_eq!(r.peak_to_peak, -1.234_567);
    }
}
