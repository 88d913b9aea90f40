//! Signal classifier — per-frame blink and saccade detection with fixation
//! bookkeeping.
//!
//! One parametrized detector covers every gaze stream: blink detection is
//! position-based (the runtime reports a zero gaze position while the eyes
//! are closed) or openness-based, and saccade detection is either the
//! angle+magnitude test used on the central gaze or the plain distance test
//! used on per-eye streams.

use tracing::debug;

use super::math::Vec3;
use super::sample::{Eye, EyeOpenness, GazeSample, GazeSource};

// ── Detection modes ─────────────────────────────────────────

/// Which signal decides that the eyes are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkMode {
    /// Gaze position collapses to the origin.
    Position,
    /// Eye openness drops below the threshold.
    Openness,
    /// Openness when the sample carries it, position otherwise.
    Auto,
}

impl BlinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Openness => "openness",
            Self::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "position" => Some(Self::Position),
            "openness" => Some(Self::Openness),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Which test decides that the gaze jumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaccadeMode {
    /// Displacement above a magnitude threshold AND turning away from the
    /// previous displacement by more than an angle threshold.
    AngleMagnitude,
    /// Displacement above a distance threshold.
    Distance,
}

impl SaccadeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AngleMagnitude => "angle",
            Self::Distance => "distance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "angle" => Some(Self::AngleMagnitude),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }

    /// Canonical detector for a gaze stream. Per-eye streams carry no
    /// usable direction history, so they use the distance test.
    pub fn for_source(source: GazeSource) -> Self {
        match source {
            GazeSource::Central => Self::AngleMagnitude,
            GazeSource::Left | GazeSource::Right => Self::Distance,
        }
    }
}

// ── Classifier config ───────────────────────────────────────

/// Thresholds for blink and saccade detection.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub blink_mode: BlinkMode,
    pub saccade_mode: SaccadeMode,
    /// Minimum displacement for the angle+magnitude test.
    pub saccade_threshold: f32,
    /// Minimum turn (degrees) for the angle+magnitude test.
    pub angle_threshold_deg: f32,
    /// Minimum displacement for the distance test.
    pub distance_threshold: f32,
    /// Openness below which an eye counts as closed.
    pub openness_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            blink_mode: BlinkMode::Auto,
            saccade_mode: SaccadeMode::AngleMagnitude,
            saccade_threshold: 0.01,
            angle_threshold_deg: 2.0,
            distance_threshold: 0.05,
            openness_threshold: 0.1,
        }
    }
}

impl ClassifierConfig {
    /// Defaults with the canonical saccade detector for `source`.
    pub fn for_source(source: GazeSource) -> Self {
        Self {
            saccade_mode: SaccadeMode::for_source(source),
            ..Self::default()
        }
    }
}

// ── Classification ──────────────────────────────────────────

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_blink: bool,
    /// Which eye(s) blinked, when `is_blink`.
    pub blink_eye: Option<Eye>,
    pub is_saccade: bool,
    /// Displacement per second over the last frame.
    pub saccade_speed: f32,
    /// Seconds the current fixation has lasted, 0 when not fixating.
    pub fixation_duration: f64,
    pub is_tracked: bool,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            is_blink: false,
            blink_eye: None,
            is_saccade: false,
            saccade_speed: 0.0,
            fixation_duration: 0.0,
            is_tracked: false,
        }
    }
}

// ── Classifier state ────────────────────────────────────────

/// State carried between frames. Owned by exactly one classifier.
#[derive(Debug, Clone, Default)]
pub struct ClassifierState {
    /// Last usable gaze position; `None` until the first one arrives.
    pub last_position: Option<Vec3>,
    /// Previous frame's displacement; the angle test measures against it.
    pub last_direction: Vec3,
    pub is_fixating: bool,
    /// Timestamp of the frame that started the current fixation.
    pub fixation_start_s: f64,
    /// Frame time accumulated since the fixation started.
    pub fixation_elapsed_s: f64,
    /// Classification returned for the previous frame.
    pub last: Classification,
}

// ── Signal classifier ───────────────────────────────────────

/// Stateful per-frame classifier for one gaze stream.
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    pub config: ClassifierConfig,
    pub state: ClassifierState,
    eye: Eye,
}

impl SignalClassifier {
    pub fn new(source: GazeSource, config: ClassifierConfig) -> Self {
        Self {
            config,
            state: ClassifierState::default(),
            eye: source.eye(),
        }
    }

    /// Classify one frame. `dt_s` is the time since the previous frame.
    ///
    /// A frame with a non-positive or non-finite `dt_s` is a no-op: state is
    /// left untouched and the previous classification is returned.
    pub fn classify(&mut self, sample: &GazeSample, dt_s: f64) -> Classification {
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            debug!("Skipping frame with dt {:?}", dt_s);
            return self.state.last;
        }

        if !sample.is_finite() {
            debug!("Non-finite gaze sample at {:.3}s treated as untracked", sample.timestamp_s);
            self.end_fixation();
            self.state.last = Classification::default();
            return self.state.last;
        }

        let is_tracked = sample.tracked();
        let blink_eye = self.detect_blink(sample);
        let is_blink = blink_eye.is_some();
        // A closed-eye frame reported as the origin carries no position.
        let position_valid = !(is_blink && sample.position.is_zero());

        let (delta, magnitude) = match self.state.last_position {
            Some(last) if position_valid => {
                let delta = sample.position - last;
                (delta, delta.length())
            }
            _ => (Vec3::ZERO, 0.0),
        };
        let is_saccade = position_valid
            && self.state.last_position.is_some()
            && match self.config.saccade_mode {
                SaccadeMode::AngleMagnitude => {
                    magnitude > self.config.saccade_threshold
                        && delta.angle_deg(self.state.last_direction) > self.config.angle_threshold_deg
                }
                SaccadeMode::Distance => magnitude > self.config.distance_threshold,
            };
        let saccade_speed = (f64::from(magnitude) / dt_s).min(f64::from(f32::MAX)) as f32;

        if is_saccade {
            debug!(
                eye = self.eye.as_str(),
                "Saccade: {:.3} units at {:.2}/s",
                magnitude,
                saccade_speed
            );
        }

        let fixation_duration = if !is_saccade && !is_blink && is_tracked {
            if !self.state.is_fixating {
                self.state.is_fixating = true;
                self.state.fixation_start_s = sample.timestamp_s;
                self.state.fixation_elapsed_s = 0.0;
            }
            self.state.fixation_elapsed_s += dt_s;
            self.state.fixation_elapsed_s
        } else {
            self.end_fixation();
            0.0
        };

        if position_valid {
            if self.state.last_position.is_some() {
                self.state.last_direction = delta;
            }
            self.state.last_position = Some(sample.position);
        }

        self.state.last = Classification {
            is_blink,
            blink_eye,
            is_saccade,
            saccade_speed,
            fixation_duration,
            is_tracked,
        };
        self.state.last
    }

    fn detect_blink(&self, sample: &GazeSample) -> Option<Eye> {
        match (self.config.blink_mode, sample.openness) {
            (BlinkMode::Position, _) | (BlinkMode::Auto, None) => {
                sample.position.is_zero().then_some(self.eye)
            }
            (BlinkMode::Openness, Some(openness)) | (BlinkMode::Auto, Some(openness)) => {
                self.openness_blink(openness)
            }
            (BlinkMode::Openness, None) => None,
        }
    }

    fn openness_blink(&self, openness: EyeOpenness) -> Option<Eye> {
        let threshold = self.config.openness_threshold;
        // Per-eye streams only look at their own eye.
        let (left, right) = match self.eye {
            Eye::Left => (openness.left < threshold, false),
            Eye::Right => (false, openness.right < threshold),
            Eye::Both | Eye::Central => (openness.left < threshold, openness.right < threshold),
        };
        match (left, right) {
            (true, true) => Some(Eye::Both),
            (true, false) => Some(Eye::Left),
            (false, true) => Some(Eye::Right),
            (false, false) => None,
        }
    }

    fn end_fixation(&mut self) {
        self.state.is_fixating = false;
        self.state.fixation_elapsed_s = 0.0;
    }

    /// Whether a fixation is in progress.
    pub fn is_fixating(&self) -> bool {
        self.state.is_fixating
    }

    /// Forget all history, as after a tracking gap.
    pub fn reset(&mut self) {
        self.state = ClassifierState::default();
    }
}
