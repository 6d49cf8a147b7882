// Per-tick control vector production: the latest conditioned sample
// while a device is connected, synthetic axis input otherwise.

use crate::config::ChannelLayout;
use crate::state::AcquisitionState;

/// Magnitude of a held fallback axis.
pub const FALLBACK_AXIS_MAGNITUDE: f64 = 0.5;

/// Throttle level while the fallback thrust axis is held.
pub const FALLBACK_THRUST_LEVEL: f64 = 0.7;

/// Logical axes supplied by the embedding input layer, polled once per
/// control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub thrust: bool,
    pub roll_left: bool,
    pub roll_right: bool,
}

/// Fallback input collaborator. Implementations map whatever real input
/// exists (keyboard, gamepad, replay script) onto the logical axes.
pub trait AxisInput {
    fn poll(&mut self) -> InputSnapshot;
}

/// Input source with no axes ever active, for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInput;

impl AxisInput for NullInput {
    fn poll(&mut self) -> InputSnapshot {
        InputSnapshot::default()
    }
}

/// Produces the control vector consumed by the cursor model, the
/// movement tracker, and the record sink each tick.
#[derive(Debug, Clone)]
pub struct ControlSource {
    layout: ChannelLayout,
    state: AcquisitionState,
    current: Vec<f64>,
}

impl ControlSource {
    pub fn new(layout: ChannelLayout, state: AcquisitionState) -> Self {
        Self {
            layout,
            state,
            current: vec![0.0; layout.channel_count()],
        }
    }

    /// Advances one tick. While connected this is the latest conditioned
    /// sample, unchanged if nothing new arrived since the last tick;
    /// otherwise it is the synthetic vector for the polled axes.
    pub fn tick(&mut self, input: InputSnapshot) -> &[f64] {
        if self.state.is_connected() {
            self.current = self.state.conditioned();
        } else {
            self.current = fallback_vector(self.layout, input);
        }
        &self.current
    }

    /// The vector produced by the most recent tick.
    pub fn current(&self) -> &[f64] {
        &self.current
    }
}

/// Maps the logical axes onto a control vector of the layout's channel
/// count, at fixed magnitudes with no smoothing.
pub fn fallback_vector(layout: ChannelLayout, input: InputSnapshot) -> Vec<f64> {
    match layout {
        ChannelLayout::Vertical => vec![axis(input.down, input.up)],
        ChannelLayout::Crosshair => vec![
            axis(input.left, input.right),
            axis(input.down, input.up),
        ],
        ChannelLayout::Flight => vec![
            if input.thrust { FALLBACK_THRUST_LEVEL } else { 0.0 },
            axis(input.left, input.right),
            axis(input.down, input.up),
            axis(input.roll_left, input.roll_right),
        ],
    }
}

// The negative direction wins when both keys of a pair are held.
fn axis(negative: bool, positive: bool) -> f64 {
    if negative {
        -FALLBACK_AXIS_MAGNITUDE
    } else if positive {
        FALLBACK_AXIS_MAGNITUDE
    } else {
        0.0
    }
}
