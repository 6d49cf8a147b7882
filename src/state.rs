// Shared acquisition state: a single writer (the acquisition task) and
// any number of cheap readers (the control loop and status surfaces).
//
// Everything that belongs to one sample lives in a single guarded
// snapshot, written as a unit, so a reader can never observe a torn mix
// of old and new values. Flags and counters that change independently
// of samples are plain atomics.

use crate::types::{CalibrationState, SignalQuality};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One consistent view of the acquisition side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionSnapshot {
    pub raw: Vec<f64>,
    pub conditioned: Vec<f64>,
    pub baseline: Vec<f64>,
    pub calibration: CalibrationState,
    pub quality: SignalQuality,
    pub rate_hz: f64,
    /// Session-clock arrival of the newest sample, if any arrived yet.
    pub frame_ms: Option<u64>,
}

impl AcquisitionSnapshot {
    fn empty(channels: usize) -> Self {
        Self {
            raw: vec![0.0; channels],
            conditioned: vec![0.0; channels],
            baseline: vec![0.0; channels],
            calibration: CalibrationState::Uncalibrated,
            quality: SignalQuality::Unknown,
            rate_hz: 0.0,
            frame_ms: None,
        }
    }
}

/// Frame counters for the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AcquisitionStats {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
}

#[derive(Debug)]
struct Inner {
    snapshot: RwLock<AcquisitionSnapshot>,
    connected: AtomicBool,
    frames_decoded: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Cloneable handle to the shared state.
#[derive(Debug, Clone)]
pub struct AcquisitionState {
    inner: Arc<Inner>,
}

impl AcquisitionState {
    pub fn new(channels: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(AcquisitionSnapshot::empty(channels)),
                connected: AtomicBool::new(false),
                frames_decoded: AtomicU64::new(0),
                frames_dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Publishes one accepted sample as a unit: raw and conditioned
    /// values, the current baseline, and the refreshed rate estimate.
    pub fn publish_sample(
        &self,
        raw: &[f64],
        conditioned: &[f64],
        baseline: &[f64],
        rate_hz: f64,
        frame_ms: u64,
    ) {
        {
            let mut snap = self.inner.snapshot.write();
            snap.raw.clear();
            snap.raw.extend_from_slice(raw);
            snap.conditioned.clear();
            snap.conditioned.extend_from_slice(conditioned);
            snap.baseline.clear();
            snap.baseline.extend_from_slice(baseline);
            snap.rate_hz = rate_hz;
            snap.frame_ms = Some(frame_ms);
        }
        self.inner.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_quality(&self, quality: SignalQuality) {
        self.inner.snapshot.write().quality = quality;
    }

    /// Marks the session calibrated. Returns true only on the first
    /// transition so the caller can log it exactly once.
    pub fn mark_calibrated(&self) -> bool {
        let mut snap = self.inner.snapshot.write();
        if snap.calibration.is_calibrated() {
            false
        } else {
            snap.calibration = CalibrationState::Calibrated;
            true
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::Relaxed);
    }

    pub fn record_dropped_frame(&self) {
        self.inner.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AcquisitionSnapshot {
        self.inner.snapshot.read().clone()
    }

    /// The latest conditioned control vector.
    pub fn conditioned(&self) -> Vec<f64> {
        self.inner.snapshot.read().conditioned.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    pub fn is_calibrated(&self) -> bool {
        self.inner.snapshot.read().calibration.is_calibrated()
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.inner.snapshot.read().quality
    }

    pub fn acquisition_rate(&self) -> f64 {
        self.inner.snapshot.read().rate_hz
    }

    pub fn stats(&self) -> AcquisitionStats {
        AcquisitionStats {
            frames_decoded: self.inner.frames_decoded.load(Ordering::Relaxed),
            frames_dropped: self.inner.frames_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.inner.snapshot.read().raw.len()
    }
}
