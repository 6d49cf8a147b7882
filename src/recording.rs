// Research-session CSV sinks: periodic pipeline records and movement
// episodes, one file pair per session, flushed record by record.
//
// A failed write here is a data-integrity problem for the study, so it
// surfaces as an error instead of being dropped quietly.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::movement::MovementEpisode;
use crate::types::{SessionClock, SignalQuality};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;

/// One periodic record of the session's view: raw and conditioned
/// channel values plus cursor, quality, and rate context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodicSample {
    pub elapsed_ms: u64,
    pub raw: Vec<f64>,
    pub conditioned: Vec<f64>,
    pub cursor_x: f64,
    pub cursor_y: f64,
    pub quality: SignalQuality,
    pub rate_hz: f64,
}

/// End-of-session report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub duration_secs: f64,
    pub samples_recorded: u64,
    pub movements_recorded: u64,
    pub sample_path: PathBuf,
    pub movement_path: PathBuf,
}

/// Writes `emg_<id>.csv` and `movements_<id>.csv` under the configured
/// output directory.
pub struct SessionRecorder {
    session_id: String,
    clock: SessionClock,
    sample_writer: csv::Writer<File>,
    movement_writer: csv::Writer<File>,
    sample_path: PathBuf,
    movement_path: PathBuf,
    samples_recorded: u64,
    movements_recorded: u64,
}

impl SessionRecorder {
    /// Creates the output directory and both per-session files, headers
    /// included. The session id is a local-time stamp.
    pub fn create(config: &SessionConfig, clock: SessionClock) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;
        let session_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        let sample_path = config.output_dir.join(format!("emg_{}.csv", session_id));
        let movement_path = config
            .output_dir
            .join(format!("movements_{}.csv", session_id));

        // The sample header depends on the layout's channel labels, so
        // it is assembled by hand rather than derived.
        let labels = config.layout.channel_labels();
        let mut header: Vec<String> = Vec::with_capacity(2 * labels.len() + 5);
        header.push("timestamp_ms".to_string());
        for label in labels {
            header.push(format!("raw_{}", label));
        }
        for label in labels {
            header.push(format!("proc_{}", label));
        }
        header.push("cursor_x".to_string());
        header.push("cursor_y".to_string());
        header.push("quality".to_string());
        header.push("rate_hz".to_string());

        let mut sample_writer = csv::Writer::from_path(&sample_path)?;
        sample_writer.write_record(&header)?;
        sample_writer.flush()?;

        let mut movement_writer = csv::Writer::from_path(&movement_path)?;
        movement_writer.write_record([
            "timestamp_ms",
            "start_x",
            "start_y",
            "end_x",
            "end_y",
            "distance",
            "duration_ms",
        ])?;
        movement_writer.flush()?;

        log::info!(
            "Recording session {} to {}",
            session_id,
            config.output_dir.display()
        );

        Ok(Self {
            session_id,
            clock,
            sample_writer,
            movement_writer,
            sample_path,
            movement_path,
            samples_recorded: 0,
            movements_recorded: 0,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Appends one periodic sample, flushed before returning.
    pub fn append_sample(&mut self, sample: &PeriodicSample) -> Result<()> {
        let mut record: Vec<String> =
            Vec::with_capacity(sample.raw.len() + sample.conditioned.len() + 5);
        record.push(sample.elapsed_ms.to_string());
        for value in &sample.raw {
            record.push(value.to_string());
        }
        for value in &sample.conditioned {
            record.push(value.to_string());
        }
        record.push(sample.cursor_x.to_string());
        record.push(sample.cursor_y.to_string());
        record.push(sample.quality.to_string());
        record.push(sample.rate_hz.to_string());

        self.sample_writer.write_record(&record)?;
        self.sample_writer.flush()?;
        self.samples_recorded += 1;
        Ok(())
    }

    /// Appends one finalized movement episode, flushed before returning.
    pub fn append_movement(&mut self, episode: &MovementEpisode) -> Result<()> {
        self.movement_writer.write_record([
            episode.close_ms.to_string(),
            episode.anchor.x.to_string(),
            episode.anchor.y.to_string(),
            episode.close.x.to_string(),
            episode.close.y.to_string(),
            episode.distance.to_string(),
            episode.duration_ms.to_string(),
        ])?;
        self.movement_writer.flush()?;
        self.movements_recorded += 1;
        Ok(())
    }

    /// Flushes both sinks and returns the session summary.
    pub fn close(mut self) -> Result<SessionSummary> {
        self.sample_writer.flush()?;
        self.movement_writer.flush()?;
        Ok(SessionSummary {
            session_id: self.session_id,
            duration_secs: self.clock.elapsed_secs(),
            samples_recorded: self.samples_recorded,
            movements_recorded: self.movements_recorded,
            sample_path: self.sample_path,
            movement_path: self.movement_path,
        })
    }
}
