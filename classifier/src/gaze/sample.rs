//! Per-frame input types — gaze samples, head pose, and the identity of the
//! gaze stream (left eye, right eye, or the combined central gaze).

use super::math::{Quat, Vec3};

// ── Gaze source ─────────────────────────────────────────────

/// Which gaze stream a pipeline instance is processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GazeSource {
    Left,
    Right,
    /// Combined gaze reported by the runtime.
    Central,
}

impl GazeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Central => "central",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "central" => Some(Self::Central),
            _ => None,
        }
    }

    /// The eye reported in events produced by this stream.
    pub fn eye(&self) -> Eye {
        match self {
            Self::Left => Eye::Left,
            Self::Right => Eye::Right,
            Self::Central => Eye::Central,
        }
    }
}

// ── Eye ─────────────────────────────────────────────────────

/// Eye(s) an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
    Both,
    Central,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
            Self::Central => "central",
        }
    }
}

// ── Per-eye signals ─────────────────────────────────────────

/// Eye openness per eye, 0.0 (closed) to 1.0 (open).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOpenness {
    pub left: f32,
    pub right: f32,
}

/// Pupil diameter per eye in millimetres. Logged, not classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilDiameter {
    pub left: f32,
    pub right: f32,
}

// ── Gaze sample ─────────────────────────────────────────────

/// One frame's gaze observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Timestamp in seconds (monotonic).
    pub timestamp_s: f64,
    /// Gaze origin / eye position.
    pub position: Vec3,
    /// Normalized gaze direction.
    pub direction: Vec3,
    pub openness: Option<EyeOpenness>,
    pub pupil: Option<PupilDiameter>,
    /// Runtime tracked flag; `None` means the platform does not report it.
    pub is_tracked: Option<bool>,
    /// Raw runtime tracking-state code.
    pub tracking_state: Option<i32>,
}

impl GazeSample {
    pub fn new(timestamp_s: f64, position: Vec3, direction: Vec3) -> Self {
        Self {
            timestamp_s,
            position,
            direction: direction.normalize(),
            openness: None,
            pupil: None,
            is_tracked: None,
            tracking_state: None,
        }
    }

    /// Build a sample from an eye pose; the direction is the pose's forward axis.
    pub fn from_pose(timestamp_s: f64, position: Vec3, rotation: Quat) -> Self {
        Self::new(timestamp_s, position, rotation.forward())
    }

    pub fn with_openness(mut self, left: f32, right: f32) -> Self {
        self.openness = Some(EyeOpenness { left, right });
        self
    }

    pub fn with_pupil(mut self, left: f32, right: f32) -> Self {
        self.pupil = Some(PupilDiameter { left, right });
        self
    }

    pub fn with_tracked(mut self, tracked: bool) -> Self {
        self.is_tracked = Some(tracked);
        self
    }

    pub fn with_tracking_state(mut self, state: i32) -> Self {
        self.tracking_state = Some(state);
        self
    }

    /// Tracked unless the platform explicitly says otherwise.
    pub fn tracked(&self) -> bool {
        self.is_tracked.unwrap_or(true)
    }

    /// Whether position and direction are usable numbers.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.direction.is_finite()
    }
}

// ── Head pose ───────────────────────────────────────────────

/// Head pose for the frame. Carried through to the log only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    pub position: Vec3,
    pub rotation: Quat,
}
