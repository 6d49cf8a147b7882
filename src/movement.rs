// Movement-episode detection for the research log.
//
// An episode opens when control activity rises above a small epsilon
// and closes when it falls back. Only episodes whose net anchor-to-end
// displacement exceeds the significance threshold are emitted; the
// anchor is pinned at onset and never moves while the episode is open.

use crate::types::CursorPoint;
use serde::Serialize;

/// Summed per-channel magnitude above which the control vector counts
/// as movement.
pub const ACTIVITY_EPSILON: f64 = 0.01;

/// Minimum anchor-to-close distance, in position units, for an episode
/// to be worth logging.
pub const SIGNIFICANCE_THRESHOLD: f64 = 15.0;

/// One finalized above-threshold activity interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementEpisode {
    pub anchor: CursorPoint,
    pub anchor_ms: u64,
    pub close: CursorPoint,
    pub close_ms: u64,
    pub distance: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    position: CursorPoint,
    at_ms: u64,
}

/// Tracks at most one open episode at a time.
#[derive(Debug, Clone, Default)]
pub struct MovementTracker {
    open: Option<Anchor>,
    emitted: u64,
}

impl MovementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one control-loop tick. `position` is the cursor position
    /// observed at this instant, before any motion this tick produces.
    /// Returns a finalized episode when one closes above the
    /// significance threshold.
    pub fn observe(
        &mut self,
        control: &[f64],
        position: CursorPoint,
        elapsed_ms: u64,
    ) -> Option<MovementEpisode> {
        let activity: f64 = control.iter().map(|c| c.abs()).sum();

        if activity > ACTIVITY_EPSILON {
            if self.open.is_none() {
                self.open = Some(Anchor {
                    position,
                    at_ms: elapsed_ms,
                });
            }
            return None;
        }

        let anchor = self.open.take()?;
        let distance = anchor.position.distance_to(&position);
        if distance <= SIGNIFICANCE_THRESHOLD {
            return None;
        }

        self.emitted += 1;
        Some(MovementEpisode {
            anchor: anchor.position,
            anchor_ms: anchor.at_ms,
            close: position,
            close_ms: elapsed_ms,
            distance,
            duration_ms: elapsed_ms.saturating_sub(anchor.at_ms),
        })
    }

    /// Episodes emitted so far this session.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}
