//! Session statistics — running counts of classified events for reporting
//! at the end of a recording.

use super::event::GazeEvent;

/// Completed fixation durations kept for the mean.
const DURATION_WINDOW: usize = 100;

/// Running counters for one gaze source.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Frames processed (no-op frames excluded).
    pub frames: u64,
    pub blinks: u64,
    pub saccades: u64,
    pub fixations_started: u64,
    pub fixations_ended: u64,
    pub focus_shifts: u64,
    /// Last 100 completed fixation durations (seconds).
    pub fixation_durations: Vec<f64>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            frames: 0,
            blinks: 0,
            saccades: 0,
            fixations_started: 0,
            fixations_ended: 0,
            focus_shifts: 0,
            fixation_durations: Vec::with_capacity(DURATION_WINDOW),
        }
    }
}

impl SessionStats {
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Count an emitted event.
    pub fn record_event(&mut self, event: &GazeEvent) {
        match event {
            GazeEvent::Blink { .. } => self.blinks += 1,
            GazeEvent::Saccade { .. } => self.saccades += 1,
            GazeEvent::FixationStart { .. } => self.fixations_started += 1,
            GazeEvent::FixationContinue { .. } => {}
            GazeEvent::FixationEnd { duration_s, .. } => {
                self.fixations_ended += 1;
                if self.fixation_durations.len() >= DURATION_WINDOW {
                    self.fixation_durations.remove(0);
                }
                self.fixation_durations.push(*duration_s);
            }
            GazeEvent::FocusShift { .. } => self.focus_shifts += 1,
        }
    }

    /// Mean of the retained fixation durations, 0 when none completed.
    pub fn mean_fixation_s(&self) -> f64 {
        if self.fixation_durations.is_empty() {
            return 0.0;
        }
        self.fixation_durations.iter().sum::<f64>() / self.fixation_durations.len() as f64
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:frames {} :blinks {} :saccades {} :fixations {} :fixations-ended {} :focus-shifts {} :mean-fixation-s {:.3})",
            self.frames,
            self.blinks,
            self.saccades,
            self.fixations_started,
            self.fixations_ended,
            self.focus_shifts,
            self.mean_fixation_s(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::sample::Eye;

    #[test]
    fn test_counts_events() {
        let mut s = SessionStats::default();
        s.record_event(&GazeEvent::Blink { eye: Eye::Left });
        s.record_event(&GazeEvent::Saccade {
            eye: Eye::Central,
            speed: 3.0,
        });
        s.record_event(&GazeEvent::FixationStart { target: "A".into() });
        s.record_event(&GazeEvent::FixationEnd {
            target: "A".into(),
            duration_s: 0.5,
        });
        s.record_event(&GazeEvent::FixationEnd {
            target: "B".into(),
            duration_s: 1.5,
        });
        assert_eq!(s.blinks, 1);
        assert_eq!(s.saccades, 1);
        assert_eq!(s.fixations_started, 1);
        assert_eq!(s.fixations_ended, 2);
        assert!((s.mean_fixation_s() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_window_is_bounded() {
        let mut s = SessionStats::default();
        for i in 0..250 {
            s.record_event(&GazeEvent::FixationEnd {
                target: "A".into(),
                duration_s: i as f64,
            });
        }
        assert_eq!(s.fixation_durations.len(), DURATION_WINDOW);
        assert_eq!(s.fixation_durations[0], 150.0);
    }

    #[test]
    fn test_status_sexp_parses() {
        let s = SessionStats::default();
        let sexp = s.status_sexp();
        assert!(sexp.starts_with("(:frames 0"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}
