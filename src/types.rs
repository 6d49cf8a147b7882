// Common types shared across the acquisition and control sides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Device-reported signal quality label. The device emits plain tokens
/// ("GOOD", "FAIR", "POOR"); anything else maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SignalQuality {
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

impl SignalQuality {
    pub fn from_token(token: &str) -> Self {
        match token {
            "GOOD" => Self::Good,
            "FAIR" => Self::Fair,
            "POOR" => Self::Poor,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calibration phase of the current session. Transitions to `Calibrated`
/// exactly once, on the device's calibration-complete message; repeats
/// are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CalibrationState {
    #[default]
    Uncalibrated,
    Calibrated,
}

impl CalibrationState {
    pub fn is_calibrated(self) -> bool {
        self == Self::Calibrated
    }
}

/// A point in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CursorPoint {
    pub x: f64,
    pub y: f64,
}

impl CursorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &CursorPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Monotonic session clock. Every timestamp in shared state and in the
/// recorded CSV files is measured from its start.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
