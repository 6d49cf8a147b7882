// The fixed-cadence control loop: poll fallback input, produce the
// control vector, track movement episodes, advance the cursor, and
// append periodic records until the session ends.

use crate::config::SessionConfig;
use crate::control::{AxisInput, ControlSource};
use crate::cursor::CursorModel;
use crate::error::Result;
use crate::movement::MovementTracker;
use crate::recording::{PeriodicSample, SessionRecorder, SessionSummary};
use crate::state::AcquisitionState;
use crate::types::SessionClock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct SessionRunner {
    state: AcquisitionState,
    control: ControlSource,
    cursor: CursorModel,
    tracker: MovementTracker,
    recorder: SessionRecorder,
    clock: SessionClock,
    cancel: CancellationToken,
    tick_hz: u32,
    record_every: u64,
    ticks: u64,
}

impl SessionRunner {
    pub fn new(
        config: &SessionConfig,
        state: AcquisitionState,
        recorder: SessionRecorder,
        clock: SessionClock,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            control: ControlSource::new(config.layout, state.clone()),
            cursor: CursorModel::new(config.layout),
            tracker: MovementTracker::new(),
            state,
            recorder,
            clock,
            cancel,
            tick_hz: config.tick_hz,
            record_every: u64::from(config.effective_record_every()),
            ticks: 0,
        }
    }

    /// Runs the control loop until cancellation, or until `duration`
    /// elapses on the session clock. A recording failure aborts the
    /// session with the error; acquisition problems never reach here.
    pub async fn run<I: AxisInput>(
        mut self,
        mut input: I,
        duration: Option<Duration>,
    ) -> Result<SessionSummary> {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.tick_hz));
        let mut interval = tokio::time::interval(period);
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Some(limit) = duration {
                        if self.clock.elapsed() >= limit {
                            break;
                        }
                    }
                    self.step(&mut input)?;
                }
            }
        }

        let summary = self.recorder.close()?;
        log::info!(
            "Session {} closed: {:.1}s, {} samples, {} movements recorded",
            summary.session_id,
            summary.duration_secs,
            summary.samples_recorded,
            summary.movements_recorded
        );
        Ok(summary)
    }

    fn step<I: AxisInput>(&mut self, input: &mut I) -> Result<()> {
        let axes = input.poll();
        let position = self.cursor.position();
        let elapsed_ms = self.clock.elapsed_ms();

        let control = self.control.tick(axes);

        // The tracker sees the position before this tick's motion, so an
        // episode closes at the last position movement produced.
        if let Some(episode) = self.tracker.observe(control, position, elapsed_ms) {
            log::debug!(
                "Movement episode: {:.1} units over {} ms",
                episode.distance,
                episode.duration_ms
            );
            self.recorder.append_movement(&episode)?;
        }

        self.cursor.advance(control);

        self.ticks += 1;
        if self.ticks % self.record_every == 0 {
            let snap = self.state.snapshot();
            let cursor = self.cursor.position();
            self.recorder.append_sample(&PeriodicSample {
                elapsed_ms,
                raw: snap.raw,
                conditioned: control.to_vec(),
                cursor_x: cursor.x,
                cursor_y: cursor.y,
                quality: snap.quality,
                rate_hz: snap.rate_hz,
            })?;
        }
        Ok(())
    }
}
