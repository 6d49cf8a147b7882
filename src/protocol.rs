// Wire-protocol decoder for the bio-amplifier's line-oriented output.
//
// The device emits newline-terminated ASCII, comma-separated, with a
// case-sensitive prefix token:
//
//   EMG,<timestamp>,<ch0>,...,<chK-1>[,<baseline fields...>]
//   QUALITY,<...>,<quality token>
//   CALIBRATION_COMPLETE
//
// Field positions are fixed per channel layout. Malformed lines cost
// exactly one dropped message and never affect later decodes.

use crate::config::ChannelLayout;
use crate::types::SignalQuality;
use thiserror::Error;

/// Per-layout wire-schema descriptor: how many channel fields an EMG
/// line carries, how many inline baseline fields may follow them, and
/// where the QUALITY token sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchema {
    channels: usize,
    baseline_fields: usize,
    quality_index: usize,
}

impl FrameSchema {
    pub fn for_layout(layout: ChannelLayout) -> Self {
        match layout {
            ChannelLayout::Vertical => Self {
                channels: 1,
                baseline_fields: 1,
                quality_index: 2,
            },
            ChannelLayout::Crosshair => Self {
                channels: 2,
                baseline_fields: 2,
                quality_index: 3,
            },
            ChannelLayout::Flight => Self {
                channels: 4,
                baseline_fields: 0,
                quality_index: 5,
            },
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn baseline_fields(&self) -> usize {
        self.baseline_fields
    }

    pub fn quality_index(&self) -> usize {
        self.quality_index
    }
}

/// One decoded sample line. `baseline` is present only when the line
/// carried the layout's inline baseline fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    pub device_ts: f64,
    pub channels: Vec<f64>,
    pub baseline: Option<Vec<f64>>,
}

/// Typed event produced from one recognized line.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Sample(SampleFrame),
    Quality(SignalQuality),
    CalibrationComplete,
}

/// Why a recognized line was dropped. Defects are advisory; they are
/// counted by the caller and never propagated further.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameDefect {
    #[error("short frame: expected at least {expected} fields, got {got}")]
    ShortFrame { expected: usize, got: usize },

    #[error("non-numeric field {index}: '{value}'")]
    BadNumber { index: usize, value: String },
}

/// Decodes device lines against a fixed schema. Lines are validated
/// whole before any field is used; a failing line is rejected without
/// partial effect.
#[derive(Debug, Clone)]
pub struct ProtocolDecoder {
    schema: FrameSchema,
}

impl ProtocolDecoder {
    pub fn new(schema: FrameSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FrameSchema {
        &self.schema
    }

    /// Decodes one newline-stripped line. `Ok(None)` means the line is
    /// not a recognized message and is silently ignored; `Err` means a
    /// recognized message failed validation and was dropped.
    pub fn decode(&self, line: &str) -> Result<Option<DeviceEvent>, FrameDefect> {
        let fields: Vec<&str> = line.split(',').collect();

        match fields[0] {
            "EMG" => self.decode_sample(&fields).map(DeviceEvent::Sample).map(Some),
            "QUALITY" => self
                .decode_quality(&fields)
                .map(DeviceEvent::Quality)
                .map(Some),
            "CALIBRATION_COMPLETE" => Ok(Some(DeviceEvent::CalibrationComplete)),
            _ => Ok(None),
        }
    }

    fn decode_sample(&self, fields: &[&str]) -> Result<SampleFrame, FrameDefect> {
        let min_fields = 2 + self.schema.channels;
        if fields.len() < min_fields {
            return Err(FrameDefect::ShortFrame {
                expected: min_fields,
                got: fields.len(),
            });
        }

        let device_ts = parse_field(fields, 1)?;

        let mut channels = Vec::with_capacity(self.schema.channels);
        for i in 0..self.schema.channels {
            channels.push(parse_field(fields, 2 + i)?);
        }

        // Inline baseline fields are optional on the wire; apply them
        // only when the line carries the full set.
        let full_fields = min_fields + self.schema.baseline_fields;
        let baseline = if self.schema.baseline_fields > 0 && fields.len() >= full_fields {
            let mut values = Vec::with_capacity(self.schema.baseline_fields);
            for i in 0..self.schema.baseline_fields {
                values.push(parse_field(fields, min_fields + i)?);
            }
            Some(values)
        } else {
            None
        };

        Ok(SampleFrame {
            device_ts,
            channels,
            baseline,
        })
    }

    fn decode_quality(&self, fields: &[&str]) -> Result<SignalQuality, FrameDefect> {
        if fields.len() <= self.schema.quality_index {
            return Err(FrameDefect::ShortFrame {
                expected: self.schema.quality_index + 1,
                got: fields.len(),
            });
        }
        Ok(SignalQuality::from_token(
            fields[self.schema.quality_index].trim(),
        ))
    }
}

fn parse_field(fields: &[&str], index: usize) -> Result<f64, FrameDefect> {
    let value = fields[index];
    value.trim().parse::<f64>().map_err(|_| FrameDefect::BadNumber {
        index,
        value: value.to_string(),
    })
}
