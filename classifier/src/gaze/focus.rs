//! Focus aggregator — decides which scene target the gaze is settled on.
//!
//! Each frame combines the raycast hit with the windowed angular velocity
//! from the history buffer. A target becomes the focus once it has been hit
//! on `frame_count` consecutive frames while the gaze is steady; any
//! saccade, miss, or tracking loss drops the focus. The focus is tracked
//! here as explicit state, never by toggling colliders in the scene.

use std::collections::VecDeque;
use tracing::debug;

use super::event::GazeEvent;
use super::math::Vec3;
use super::scene::{ColliderHandle, RaycastHit};

// ── Focus config ────────────────────────────────────────────

/// Thresholds for focus confirmation.
#[derive(Debug, Clone)]
pub struct FocusConfig {
    /// Consecutive same-target hits (and velocity window size) required.
    pub frame_count: usize,
    /// Average angular velocity below which gaze counts as steady (deg/s).
    pub velocity_threshold_dps: f32,
    /// Growth of the cosmetic focus indicator per continued frame.
    pub growth_per_frame: f32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            frame_count: 3,
            velocity_threshold_dps: 10.0,
            growth_per_frame: 0.001,
        }
    }
}

// ── Focus target ────────────────────────────────────────────

/// The scene object believed to be fixated.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTarget {
    pub identifier: String,
    /// Most recent hit point on the target.
    pub hit_point: Vec3,
    pub collider: ColliderHandle,
    /// Number of frames the target has been hit.
    pub hits: u32,
    /// Size indicator for visualizers; grows while focus continues.
    pub growth: f32,
}

impl FocusTarget {
    fn from_hit(hit: &RaycastHit) -> Self {
        Self {
            identifier: hit.target.clone(),
            hit_point: hit.point,
            collider: hit.collider,
            hits: 1,
            growth: 0.0,
        }
    }

    fn refresh(&mut self, hit: &RaycastHit) {
        self.hit_point = hit.point;
        self.collider = hit.collider;
        self.hits += 1;
    }
}

// ── Focus state ─────────────────────────────────────────────

/// Focus state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FocusState {
    /// Nothing is being fixated.
    NoFocus,
    /// A target is being hit but has not been confirmed yet.
    TrackingCandidate {
        target: FocusTarget,
        /// Consecutive frames on this target.
        streak: usize,
        since_s: f64,
        dwell_s: f64,
    },
    /// The target is the current focus point.
    Focused {
        target: FocusTarget,
        /// Time the target was first hit; not reset while it stays focused.
        since_s: f64,
        /// Frame time accumulated on the target, candidate frames included.
        dwell_s: f64,
    },
}

impl FocusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFocus => "none",
            Self::TrackingCandidate { .. } => "candidate",
            Self::Focused { .. } => "focused",
        }
    }

    fn target(&self) -> Option<&FocusTarget> {
        match self {
            Self::NoFocus => None,
            Self::TrackingCandidate { target, .. } | Self::Focused { target, .. } => Some(target),
        }
    }
}

// ── Focus aggregator ────────────────────────────────────────

/// Per-source focus tracker.
#[derive(Debug, Clone)]
pub struct FocusAggregator {
    pub config: FocusConfig,
    state: FocusState,
    /// Last two distinct focus targets, oldest first.
    recent_targets: VecDeque<String>,
    last_fixated: Option<FocusTarget>,
}

impl FocusAggregator {
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            state: FocusState::NoFocus,
            recent_targets: VecDeque::with_capacity(2),
            last_fixated: None,
        }
    }

    /// Advance one frame.
    ///
    /// `velocity_dps` is the history window average, `None` while the
    /// window is still filling. A missing velocity never confirms a focus
    /// but does not interrupt a candidate's streak either.
    pub fn update(
        &mut self,
        hit: Option<&RaycastHit>,
        velocity_dps: Option<f32>,
        tracked: bool,
        now_s: f64,
        dt_s: f64,
    ) -> Vec<GazeEvent> {
        let mut events = Vec::new();
        let threshold = self.config.velocity_threshold_dps;
        let in_saccade = velocity_dps.map_or(false, |v| !(v < threshold));

        let hit = match hit {
            Some(hit) if tracked && !in_saccade => hit,
            _ => {
                let reason = if !tracked {
                    "tracking-lost"
                } else if in_saccade {
                    "saccade"
                } else {
                    "no-hit"
                };
                self.drop_focus(reason, &mut events);
                return events;
            }
        };
        let steady = velocity_dps.map_or(false, |v| v < threshold);

        let previous = std::mem::replace(&mut self.state, FocusState::NoFocus);
        let next = match previous {
            FocusState::Focused {
                mut target,
                since_s,
                dwell_s,
            } if target.identifier == hit.target => {
                target.refresh(hit);
                target.growth += self.config.growth_per_frame;
                let dwell_s = dwell_s + dt_s;
                events.push(GazeEvent::FixationContinue {
                    target: target.identifier.clone(),
                    duration_s: dwell_s,
                });
                FocusState::Focused {
                    target,
                    since_s,
                    dwell_s,
                }
            }
            FocusState::Focused {
                target, dwell_s, ..
            } => {
                debug!(
                    "Focus switch: {} -> {} after {:.3}s",
                    target.identifier, hit.target, dwell_s
                );
                events.push(GazeEvent::FixationEnd {
                    target: target.identifier.clone(),
                    duration_s: dwell_s,
                });
                self.remember(&hit.target);
                events.push(GazeEvent::FocusShift {
                    from: target.identifier.clone(),
                    to: hit.target.clone(),
                });
                self.last_fixated = Some(target);
                self.candidate(hit, now_s, dt_s)
            }
            FocusState::TrackingCandidate {
                mut target,
                streak,
                since_s,
                dwell_s,
            } if target.identifier == hit.target => {
                target.refresh(hit);
                FocusState::TrackingCandidate {
                    target,
                    streak: streak + 1,
                    since_s,
                    dwell_s: dwell_s + dt_s,
                }
            }
            FocusState::TrackingCandidate { .. } | FocusState::NoFocus => {
                self.candidate(hit, now_s, dt_s)
            }
        };

        self.state = self.promote(next, steady, &mut events);
        events
    }

    fn candidate(&self, hit: &RaycastHit, now_s: f64, dt_s: f64) -> FocusState {
        FocusState::TrackingCandidate {
            target: FocusTarget::from_hit(hit),
            streak: 1,
            since_s: now_s,
            dwell_s: dt_s,
        }
    }

    fn promote(&mut self, state: FocusState, steady: bool, events: &mut Vec<GazeEvent>) -> FocusState {
        match state {
            FocusState::TrackingCandidate {
                target,
                streak,
                since_s,
                dwell_s,
            } if steady && streak >= self.config.frame_count.max(1) => {
                debug!("Focus confirmed: {} after {} frames", target.identifier, streak);
                self.remember(&target.identifier);
                events.push(GazeEvent::FixationStart {
                    target: target.identifier.clone(),
                });
                FocusState::Focused {
                    target,
                    since_s,
                    dwell_s,
                }
            }
            other => other,
        }
    }

    fn drop_focus(&mut self, reason: &str, events: &mut Vec<GazeEvent>) {
        let previous = std::mem::replace(&mut self.state, FocusState::NoFocus);
        if let FocusState::Focused {
            target, dwell_s, ..
        } = previous
        {
            debug!("Focus lost ({}): {} after {:.3}s", reason, target.identifier, dwell_s);
            events.push(GazeEvent::FixationEnd {
                target: target.identifier.clone(),
                duration_s: dwell_s,
            });
            self.last_fixated = Some(target);
        }
    }

    fn remember(&mut self, identifier: &str) {
        if self.recent_targets.back().map(String::as_str) == Some(identifier) {
            return;
        }
        self.recent_targets.push_back(identifier.to_string());
        while self.recent_targets.len() > 2 {
            self.recent_targets.pop_front();
        }
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// The focused target, if any.
    pub fn current_target(&self) -> Option<&FocusTarget> {
        match &self.state {
            FocusState::Focused { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The target being hit, confirmed or not.
    pub fn tracked_target(&self) -> Option<&FocusTarget> {
        self.state.target()
    }

    /// Seconds spent on the focused target, 0 when nothing is focused.
    pub fn fixation_duration(&self) -> f64 {
        match &self.state {
            FocusState::Focused { dwell_s, .. } => *dwell_s,
            _ => 0.0,
        }
    }

    /// The most recently fixated target: the current focus, or the last one
    /// that ended.
    pub fn last_fixated(&self) -> Option<&FocusTarget> {
        self.current_target().or(self.last_fixated.as_ref())
    }

    /// Link between the last two distinct focus targets, oldest first.
    pub fn link(&self) -> Option<(&str, &str)> {
        match (self.recent_targets.front(), self.recent_targets.back()) {
            (Some(a), Some(b)) if self.recent_targets.len() == 2 => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }

    /// Drop all focus state. Emits `FixationEnd` for a focused target.
    pub fn reset(&mut self) -> Vec<GazeEvent> {
        let mut events = Vec::new();
        self.drop_focus("reset", &mut events);
        self.recent_targets.clear();
        events
    }
}
