//! Per-source gaze pipeline: classify → history → focus → events.
//!
//! One `GazePipeline` owns every piece of state for one gaze stream. Run one
//! per stream (left, right, central); instances share nothing, so they can
//! be moved to separate threads without locking.

use tracing::{debug, info};

use super::classifier::{Classification, ClassifierConfig, SignalClassifier};
use super::event::GazeEvent;
use super::focus::{FocusAggregator, FocusConfig};
use super::history::HistoryBuffer;
use super::sample::{GazeSample, GazeSource};
use super::scene::{Raycast, RaycastHit};
use super::stats::SessionStats;

/// Everything the pipeline derived from one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub timestamp_s: f64,
    pub classification: Classification,
    pub hit: Option<RaycastHit>,
    /// History window average, `None` while the window is filling.
    pub velocity_dps: Option<f32>,
    /// Focus state name after this frame.
    pub focus_state: &'static str,
    pub events: Vec<GazeEvent>,
    /// The frame was ignored (non-positive `dt`).
    pub skipped: bool,
}

impl FrameReport {
    /// Name of the object hit this frame, or `"None"`.
    pub fn looked_at(&self) -> &str {
        self.hit.as_ref().map(|h| h.target.as_str()).unwrap_or("None")
    }
}

/// Classifier, history buffer and focus aggregator for one gaze stream.
#[derive(Debug, Clone)]
pub struct GazePipeline {
    pub source: GazeSource,
    pub classifier: SignalClassifier,
    pub history: HistoryBuffer,
    pub focus: FocusAggregator,
    pub stats: SessionStats,
}

impl GazePipeline {
    pub fn new(
        source: GazeSource,
        classifier: ClassifierConfig,
        history_capacity: usize,
        focus: FocusConfig,
    ) -> Self {
        info!(
            "Gaze pipeline initialized: source={} saccade={} blink={} history={} frames={}",
            source.as_str(),
            classifier.saccade_mode.as_str(),
            classifier.blink_mode.as_str(),
            history_capacity,
            focus.frame_count
        );
        Self {
            source,
            classifier: SignalClassifier::new(source, classifier),
            history: HistoryBuffer::new(history_capacity),
            focus: FocusAggregator::new(focus),
            stats: SessionStats::default(),
        }
    }

    /// Pipeline with default thresholds for `source`.
    pub fn with_defaults(source: GazeSource) -> Self {
        Self::new(
            source,
            ClassifierConfig::for_source(source),
            super::history::DEFAULT_CAPACITY,
            FocusConfig::default(),
        )
    }

    /// Process one frame. `dt_s` is the time since the previous frame.
    pub fn step(&mut self, sample: &GazeSample, dt_s: f64, scene: &dyn Raycast) -> FrameReport {
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return FrameReport {
                timestamp_s: sample.timestamp_s,
                classification: self.classifier.state.last,
                hit: None,
                velocity_dps: None,
                focus_state: self.focus.state().as_str(),
                events: Vec::new(),
                skipped: true,
            };
        }

        let classification = self.classifier.classify(sample, dt_s);
        self.stats.record_frame();

        let mut events = Vec::new();
        if let Some(eye) = classification.blink_eye {
            events.push(GazeEvent::Blink { eye });
        }
        if classification.is_saccade {
            events.push(GazeEvent::Saccade {
                eye: self.source.eye(),
                speed: classification.saccade_speed,
            });
        }

        // Closed eyes hold the focus state: no history sample, no raycast,
        // no dwell.
        if classification.is_blink && classification.is_tracked {
            for event in &events {
                self.stats.record_event(event);
            }
            return FrameReport {
                timestamp_s: sample.timestamp_s,
                classification,
                hit: None,
                velocity_dps: None,
                focus_state: self.focus.state().as_str(),
                events,
                skipped: false,
            };
        }

        // A tracking gap restarts the velocity window.
        let hit = if classification.is_tracked {
            self.history.push(sample.direction);
            scene.raycast(sample.position, sample.direction)
        } else {
            if !self.history.is_empty() {
                debug!(source = self.source.as_str(), "Tracking lost, clearing gaze history");
            }
            self.history.clear();
            None
        };

        let velocity_dps = self
            .history
            .window_average(self.focus.config.frame_count, dt_s);

        events.extend(self.focus.update(
            hit.as_ref(),
            velocity_dps,
            classification.is_tracked,
            sample.timestamp_s,
            dt_s,
        ));

        for event in &events {
            self.stats.record_event(event);
        }

        FrameReport {
            timestamp_s: sample.timestamp_s,
            classification,
            hit,
            velocity_dps,
            focus_state: self.focus.state().as_str(),
            events,
            skipped: false,
        }
    }

    /// End the session: closes any open fixation.
    pub fn finish(&mut self) -> Vec<GazeEvent> {
        let events = self.focus.reset();
        for event in &events {
            self.stats.record_event(event);
        }
        info!(
            "Gaze pipeline finished: source={} {}",
            self.source.as_str(),
            self.stats.status_sexp()
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::math::Vec3;
    use crate::gaze::sample::Eye;
    use crate::gaze::scene::{EmptyScene, SphereCollider, SphereScene};

    const DT: f64 = 0.016;

    fn scene() -> SphereScene {
        let mut s = SphereScene::new();
        s.add(SphereCollider::new("A", Vec3::new(0.0, 0.0, 5.0), 0.5, 1));
        s.add(SphereCollider::new("B", Vec3::new(5.0, 0.0, 5.0), 0.5, 2));
        s
    }

    fn look_at(t: f64, target: Vec3) -> GazeSample {
        let origin = Vec3::new(0.0, 0.0, 0.01);
        GazeSample::new(t, origin, target - origin)
    }

    #[test]
    fn test_steady_gaze_focuses_target() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let scene = scene();
        let mut started = Vec::new();
        for i in 0..5 {
            let r = p.step(&look_at(i as f64 * DT, Vec3::new(0.0, 0.0, 5.0)), DT, &scene);
            assert_eq!(r.looked_at(), "A");
            if r.events.iter().any(|e| matches!(e, GazeEvent::FixationStart { .. })) {
                started.push(i);
            }
        }
        assert_eq!(started, vec![2], "focus confirmed on the third frame");
        assert_eq!(p.stats.fixations_started, 1);
    }

    #[test]
    fn test_gaze_jump_drops_focus() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let scene = scene();
        for i in 0..5 {
            p.step(&look_at(i as f64 * DT, Vec3::new(0.0, 0.0, 5.0)), DT, &scene);
        }
        assert!(p.focus.current_target().is_some());
        // 45 degree jump in one frame: far above 10 deg/s averaged over 3.
        let r = p.step(&look_at(5.0 * DT, Vec3::new(5.0, 0.0, 5.0)), DT, &scene);
        assert!(r.events.iter().any(|e| matches!(e, GazeEvent::FixationEnd { .. })));
        assert_eq!(r.focus_state, "none");
    }

    #[test]
    fn test_zero_dt_frame_is_skipped() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let r = p.step(&look_at(0.0, Vec3::new(0.0, 0.0, 5.0)), 0.0, &EmptyScene);
        assert!(r.skipped);
        assert_eq!(p.stats.frames, 0);
        assert!(p.history.is_empty());
    }

    #[test]
    fn test_untracked_frame_clears_history() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let scene = scene();
        for i in 0..4 {
            p.step(&look_at(i as f64 * DT, Vec3::new(0.0, 0.0, 5.0)), DT, &scene);
        }
        assert_eq!(p.history.len(), 4);
        let lost = look_at(4.0 * DT, Vec3::new(0.0, 0.0, 5.0)).with_tracked(false);
        let r = p.step(&lost, DT, &scene);
        assert!(p.history.is_empty());
        assert!(r.hit.is_none());
        assert_eq!(r.focus_state, "none");
    }

    #[test]
    fn test_blink_event_emitted() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let s = GazeSample::new(0.0, Vec3::ZERO, Vec3::FORWARD);
        let r = p.step(&s, DT, &EmptyScene);
        assert!(matches!(r.events.first(), Some(GazeEvent::Blink { .. })));
        assert_eq!(p.stats.blinks, 1);
    }

    #[test]
    fn test_blink_holds_focus_without_extending_dwell() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let scene = scene();
        let open = |i: usize| look_at(i as f64 * DT, Vec3::new(0.0, 0.0, 5.0)).with_openness(1.0, 1.0);
        for i in 0..4 {
            p.step(&open(i), DT, &scene);
        }
        let dwell = p.focus.fixation_duration();
        assert!(dwell > 0.0);

        let closed = look_at(4.0 * DT, Vec3::new(0.0, 0.0, 5.0)).with_openness(0.0, 0.0);
        let r = p.step(&closed, DT, &scene);
        assert!(matches!(r.events.as_slice(), [GazeEvent::Blink { eye: Eye::Both }]), "events: {:?}", r.events);
        assert_eq!(r.focus_state, "focused", "blink does not drop the focus");
        assert_eq!(p.focus.fixation_duration(), dwell, "blink frame adds no dwell");
        assert_eq!(p.history.len(), 4, "blink direction is not recorded");

        let r = p.step(&open(5), DT, &scene);
        assert!(r
            .events
            .iter()
            .any(|e| matches!(e, GazeEvent::FixationContinue { target, .. } if target == "A")));
        assert!((p.focus.fixation_duration() - (dwell + DT)).abs() < 1e-9);
    }

    #[test]
    fn test_finish_closes_open_fixation() {
        let mut p = GazePipeline::with_defaults(GazeSource::Central);
        let scene = scene();
        for i in 0..4 {
            p.step(&look_at(i as f64 * DT, Vec3::new(0.0, 0.0, 5.0)), DT, &scene);
        }
        let events = p.finish();
        assert!(matches!(events.as_slice(), [GazeEvent::FixationEnd { target, .. }] if target == "A"));
        assert_eq!(p.stats.fixations_ended, 1);
    }
}
