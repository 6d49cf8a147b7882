pub mod acquisition;
pub mod conditioning;
pub mod config;
pub mod control;
pub mod cursor;
pub mod error;
pub mod movement;
pub mod protocol;
pub mod rate;
pub mod recording;
pub mod session;
pub mod state;
pub mod types;

pub use acquisition::{open_first_port, AcquisitionTask, SamplePipeline};
pub use conditioning::{ConditioningPolicy, SignalConditioner};
pub use config::{ChannelLayout, SessionConfig};
pub use control::{fallback_vector, AxisInput, ControlSource, InputSnapshot, NullInput};
pub use cursor::CursorModel;
pub use error::{EmgError, Result};
pub use movement::{MovementEpisode, MovementTracker};
pub use protocol::{DeviceEvent, FrameDefect, FrameSchema, ProtocolDecoder, SampleFrame};
pub use rate::RateEstimator;
pub use recording::{PeriodicSample, SessionRecorder, SessionSummary};
pub use session::SessionRunner;
pub use state::{AcquisitionSnapshot, AcquisitionState, AcquisitionStats};
pub use types::{CalibrationState, CursorPoint, SessionClock, SignalQuality};
