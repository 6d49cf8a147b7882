// Signal conditioning: raw per-channel EMG readings to control values.
//
// Two interchangeable policies, selected by configuration. Both are pure
// per-sample mappings; the only inputs are the raw sample, the current
// baseline, and the calibration state.

use crate::error::{EmgError, Result};
use crate::types::CalibrationState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activation floor of the fixed-threshold policy; readings at or below
/// it condition to zero.
pub const ACTIVATION_THRESHOLD: f64 = 0.08;

/// Width of the fixed-threshold normalization band above the floor.
pub const ACTIVATION_SPAN: f64 = 0.42;

/// Gain applied after the unit clamp. The result is intentionally not
/// re-clamped, so conditioned values range over [0, 3].
pub const ACTIVATION_GAIN: f64 = 3.0;

/// Warm-up normalization offset used while the device is uncalibrated.
pub const WARMUP_OFFSET: f64 = 20.0;

/// Warm-up normalization span used while the device is uncalibrated.
pub const WARMUP_SPAN: f64 = 80.0;

/// Upper reference reading for baseline-relative normalization.
pub const MAX_REFERENCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditioningPolicy {
    /// Normalize against the calibrated baseline and the reference
    /// maximum, clamped to [0, 1]. Uses the warm-up formula until the
    /// calibration-complete message arrives.
    BaselineRelative,
    /// Threshold at a fixed activation floor, normalize over a fixed
    /// band, then amplify. Output range is [0, 3].
    FixedThreshold,
}

impl ConditioningPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaselineRelative => "baseline-relative",
            Self::FixedThreshold => "fixed-threshold",
        }
    }
}

impl fmt::Display for ConditioningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditioningPolicy {
    type Err = EmgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseline-relative" => Ok(Self::BaselineRelative),
            "fixed-threshold" => Ok(Self::FixedThreshold),
            other => Err(EmgError::InvalidConfig(format!(
                "Unknown policy '{}': expected baseline-relative or fixed-threshold",
                other
            ))),
        }
    }
}

/// Applies the configured policy to one raw sample at a time.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    policy: ConditioningPolicy,
    max_reference: f64,
}

impl SignalConditioner {
    pub fn new(policy: ConditioningPolicy) -> Self {
        Self {
            policy,
            max_reference: MAX_REFERENCE,
        }
    }

    pub fn policy(&self) -> ConditioningPolicy {
        self.policy
    }

    /// Maps a raw sample to a conditioned control vector of the same
    /// channel count. `baseline` must have one entry per channel.
    pub fn condition(
        &self,
        raw: &[f64],
        baseline: &[f64],
        calibration: CalibrationState,
    ) -> Vec<f64> {
        match self.policy {
            ConditioningPolicy::FixedThreshold => {
                raw.iter().map(|&r| fixed_threshold(r)).collect()
            }
            ConditioningPolicy::BaselineRelative => {
                if calibration.is_calibrated() {
                    raw.iter()
                        .zip(baseline)
                        .map(|(&r, &b)| self.baseline_relative(r, b))
                        .collect()
                } else {
                    raw.iter().map(|&r| warmup(r)).collect()
                }
            }
        }
    }

    fn baseline_relative(&self, raw: f64, baseline: f64) -> f64 {
        let span = self.max_reference - baseline;
        if span > 0.0 {
            ((raw - baseline).max(0.0) / span).min(1.0)
        } else {
            0.0
        }
    }
}

fn fixed_threshold(raw: f64) -> f64 {
    if raw <= ACTIVATION_THRESHOLD {
        0.0
    } else {
        ((raw - ACTIVATION_THRESHOLD) / ACTIVATION_SPAN).min(1.0) * ACTIVATION_GAIN
    }
}

fn warmup(raw: f64) -> f64 {
    ((raw - WARMUP_OFFSET) / WARMUP_SPAN).clamp(0.0, 1.0)
}
