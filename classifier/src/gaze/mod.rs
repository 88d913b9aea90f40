//! Gaze event classification core.
//!
//! Provides:
//! - `classifier`: per-frame blink/saccade detection and fixation timing
//! - `history`: bounded gaze-direction history with windowed angular velocity
//! - `focus`: focus-target state machine fed by raycast hits
//! - `pipeline`: the three above wired together for one gaze stream
//! - `scene`: the raycast boundary and a sphere-collider scene
//!
//! Nothing here performs I/O; see `session` for logging and replay.

pub mod classifier;
pub mod event;
pub mod focus;
pub mod history;
pub mod math;
pub mod pipeline;
pub mod sample;
pub mod scene;
pub mod stats;

pub use classifier::{BlinkMode, Classification, ClassifierConfig, SaccadeMode, SignalClassifier};
pub use event::GazeEvent;
pub use focus::{FocusAggregator, FocusConfig, FocusState, FocusTarget};
pub use history::HistoryBuffer;
pub use math::{Quat, Vec3};
pub use pipeline::{FrameReport, GazePipeline};
pub use sample::{Eye, GazeSample, GazeSource, HeadPose};
pub use scene::{ColliderHandle, EmptyScene, Raycast, RaycastHit, SphereCollider, SphereScene};
pub use stats::SessionStats;
