// Session configuration.
//
// Defaults mirror the reference acquisition rig: an Arduino-class
// bio-amplifier at 115200 baud, a 60 Hz control loop, and CSV output
// under research_data/.

use crate::conditioning::ConditioningPolicy;
use crate::error::{EmgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Channel layout of the connected electrode set. The layout fixes the
/// channel count, the wire-schema offsets, and the cursor kinematics for
/// the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// Single channel, vertical cursor motion only.
    Vertical,
    /// Two channels (left/right, up/down) driving a 2-D crosshair.
    Crosshair,
    /// Four channels (throttle, yaw, pitch, roll) driving a vehicle model.
    Flight,
}

impl ChannelLayout {
    pub fn all() -> [ChannelLayout; 3] {
        [Self::Vertical, Self::Crosshair, Self::Flight]
    }

    pub fn channel_count(&self) -> usize {
        match self {
            Self::Vertical => 1,
            Self::Crosshair => 2,
            Self::Flight => 4,
        }
    }

    pub fn channel_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Vertical => &["vertical"],
            Self::Crosshair => &["lr", "ud"],
            Self::Flight => &["throttle", "yaw", "pitch", "roll"],
        }
    }

    /// Conditioning policy the layout's electrode firmware was tuned for.
    pub fn default_policy(&self) -> ConditioningPolicy {
        match self {
            Self::Vertical | Self::Crosshair => ConditioningPolicy::FixedThreshold,
            Self::Flight => ConditioningPolicy::BaselineRelative,
        }
    }

    /// Periodic record cadence in control-loop ticks.
    pub fn default_record_every(&self) -> u32 {
        match self {
            Self::Vertical | Self::Crosshair => 30,
            Self::Flight => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Crosshair => "crosshair",
            Self::Flight => "flight",
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelLayout {
    type Err = EmgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vertical" => Ok(Self::Vertical),
            "crosshair" => Ok(Self::Crosshair),
            "flight" => Ok(Self::Flight),
            other => Err(EmgError::InvalidConfig(format!(
                "Unknown layout '{}': expected vertical, crosshair, or flight",
                other
            ))),
        }
    }
}

fn default_ports() -> Vec<String> {
    ["COM3", "COM4", "COM5", "/dev/ttyUSB0", "/dev/ttyACM0"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_poll_timeout_ms() -> u64 {
    100
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_tick_hz() -> u32 {
    60
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("research_data")
}

fn default_layout() -> ChannelLayout {
    ChannelLayout::Crosshair
}

/// Full session configuration. Loadable from a JSON file; any field left
/// out falls back to the rig default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub layout: ChannelLayout,

    /// Conditioning policy override. `None` selects the layout default.
    pub policy: Option<ConditioningPolicy>,

    /// Candidate device ports, tried in order; first successful open wins.
    pub ports: Vec<String>,

    pub baud_rate: u32,

    /// Post-open delay allowing the device to reset, in milliseconds.
    pub settle_ms: u64,

    /// Bounded timeout of each read poll, in milliseconds.
    pub poll_timeout_ms: u64,

    /// Pause after a mid-session read error, in milliseconds.
    pub retry_delay_ms: u64,

    /// Control loop cadence.
    pub tick_hz: u32,

    /// Periodic record cadence override, in ticks. `None` selects the
    /// layout default.
    pub record_every: Option<u32>,

    /// Directory receiving the per-session CSV files.
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            policy: None,
            ports: default_ports(),
            baud_rate: default_baud_rate(),
            settle_ms: default_settle_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            tick_hz: default_tick_hz(),
            record_every: None,
            output_dir: default_output_dir(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&contents).map_err(|e| {
            EmgError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 {
            return Err(EmgError::InvalidConfig(
                "tick_hz must be at least 1".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(EmgError::InvalidConfig(
                "baud_rate must be non-zero".to_string(),
            ));
        }
        if self.record_every == Some(0) {
            return Err(EmgError::InvalidConfig(
                "record_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn effective_policy(&self) -> ConditioningPolicy {
        self.policy.unwrap_or_else(|| self.layout.default_policy())
    }

    pub fn effective_record_every(&self) -> u32 {
        self.record_every
            .unwrap_or_else(|| self.layout.default_record_every())
    }
}
