// Device acquisition: port discovery, the serial read loop, and the
// line-to-state pipeline the loop feeds.
//
// The read loop owns the serial handle for the whole session. Transient
// read errors back off briefly and continue on the same handle; EOF
// means the device vanished and ends acquisition. Neither path attempts
// a reconnect.

use crate::conditioning::SignalConditioner;
use crate::config::SessionConfig;
use crate::error::{EmgError, Result};
use crate::protocol::{DeviceEvent, FrameSchema, ProtocolDecoder};
use crate::rate::RateEstimator;
use crate::state::AcquisitionState;
use crate::types::{CalibrationState, SessionClock};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tokio_util::sync::CancellationToken;

/// Applies decoded device events to the shared state. Synchronous, so
/// the decode/condition/publish path is testable without any I/O.
pub struct SamplePipeline {
    decoder: ProtocolDecoder,
    conditioner: SignalConditioner,
    rate: RateEstimator,
    state: AcquisitionState,
    clock: SessionClock,
    baseline: Vec<f64>,
    calibration: CalibrationState,
}

impl SamplePipeline {
    pub fn new(config: &SessionConfig, state: AcquisitionState, clock: SessionClock) -> Self {
        let schema = FrameSchema::for_layout(config.layout);
        Self {
            decoder: ProtocolDecoder::new(schema),
            conditioner: SignalConditioner::new(config.effective_policy()),
            rate: RateEstimator::new(),
            baseline: vec![0.0; schema.channel_count()],
            calibration: CalibrationState::Uncalibrated,
            state,
            clock,
        }
    }

    /// Ingests one newline-stripped device line. A malformed line costs
    /// exactly one dropped message; nothing propagates.
    pub fn ingest_line(&mut self, line: &str) {
        match self.decoder.decode(line) {
            Ok(Some(DeviceEvent::Sample(frame))) => {
                if let Some(baseline) = frame.baseline {
                    self.baseline = baseline;
                }
                let conditioned =
                    self.conditioner
                        .condition(&frame.channels, &self.baseline, self.calibration);
                let rate_hz = self.rate.record(self.clock.elapsed_secs());
                self.state.publish_sample(
                    &frame.channels,
                    &conditioned,
                    &self.baseline,
                    rate_hz,
                    self.clock.elapsed_ms(),
                );
            }
            Ok(Some(DeviceEvent::Quality(quality))) => {
                self.state.set_quality(quality);
            }
            Ok(Some(DeviceEvent::CalibrationComplete)) => {
                self.calibration = CalibrationState::Calibrated;
                if self.state.mark_calibrated() {
                    log::info!("Device calibration complete");
                }
            }
            Ok(None) => {}
            Err(defect) => {
                self.state.record_dropped_frame();
                log::debug!("Dropped device line {:?}: {}", line, defect);
            }
        }
    }
}

/// Tries each candidate port in order; the first successful open wins.
pub fn open_first_port(config: &SessionConfig) -> Result<(SerialStream, String)> {
    for name in &config.ports {
        log::info!("Trying serial port {}", name);
        match tokio_serial::new(name, config.baud_rate).open_native_async() {
            Ok(stream) => {
                log::info!("Device connected on {} at {} baud", name, config.baud_rate);
                return Ok((stream, name.clone()));
            }
            Err(e) => log::debug!("Port {} unavailable: {}", name, e),
        }
    }
    Err(EmgError::Connection(format!(
        "no device found on any of {} candidate ports",
        config.ports.len()
    )))
}

/// Connection lifecycle and read loop. Owns the pipeline; the shared
/// state handle is its only output.
pub struct AcquisitionTask {
    config: SessionConfig,
    pipeline: SamplePipeline,
    state: AcquisitionState,
    cancel: CancellationToken,
}

impl AcquisitionTask {
    pub fn new(
        config: SessionConfig,
        state: AcquisitionState,
        clock: SessionClock,
        cancel: CancellationToken,
    ) -> Self {
        let pipeline = SamplePipeline::new(&config, state.clone(), clock);
        Self {
            config,
            pipeline,
            state,
            cancel,
        }
    }

    /// Runs acquisition to completion: connect, settle, then read until
    /// cancellation or device loss. When no candidate port opens, the
    /// session stays on fallback input and the task ends immediately.
    pub async fn run(mut self) {
        let (stream, port) = match open_first_port(&self.config) {
            Ok(opened) => opened,
            Err(e) => {
                log::warn!("{}; session stays on fallback input", e);
                return;
            }
        };

        // Give the device its reset time before trusting the stream.
        let settle = Duration::from_millis(self.config.settle_ms);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            _ = tokio::time::sleep(settle) => {}
        }

        self.state.set_connected(true);
        log::info!("Acquisition started on {}", port);

        let mut reader = BufReader::new(stream);
        self.read_lines(&mut reader).await;

        self.state.set_connected(false);
        log::info!("Acquisition stopped");
    }

    /// Drives the pipeline from any line-oriented byte stream until
    /// cancellation or EOF. Each poll is bounded by the configured
    /// timeout so shutdown stays responsive; a poll that expires
    /// mid-line leaves the partial bytes in the buffer and the next
    /// poll completes the line.
    pub async fn read_lines<R>(&mut self, reader: &mut R)
    where
        R: AsyncBufRead + Unpin,
    {
        let poll = Duration::from_millis(self.config.poll_timeout_ms);
        let retry = Duration::from_millis(self.config.retry_delay_ms);
        let cancel = self.cancel.clone();
        let mut buf: Vec<u8> = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                read = tokio::time::timeout(poll, reader.read_until(b'\n', &mut buf)) => {
                    match read {
                        Err(_) => continue,
                        Ok(Ok(0)) => {
                            log::warn!("Device stream closed");
                            break;
                        }
                        Ok(Ok(_)) => {
                            {
                                let line = String::from_utf8_lossy(&buf);
                                self.pipeline.ingest_line(line.trim());
                            }
                            buf.clear();
                        }
                        Ok(Err(e)) => {
                            log::warn!("Serial read error: {}; retrying", e);
                            buf.clear();
                            tokio::time::sleep(retry).await;
                        }
                    }
                }
            }
        }
    }
}
