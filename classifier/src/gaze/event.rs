//! Events emitted by the gaze pipeline for logging and visualization sinks.

use super::sample::{Eye, GazeSource};

/// Discrete gaze events. Consumers decide what they mean; the pipeline only
/// reports them.
#[derive(Debug, Clone, PartialEq)]
pub enum GazeEvent {
    /// Eye(s) closed this frame.
    Blink { eye: Eye },
    /// Gaze jumped this frame.
    Saccade { eye: Eye, speed: f32 },
    /// A target has been fixated long enough to count as a focus point.
    FixationStart { target: String },
    /// The focused target is still being looked at.
    FixationContinue { target: String, duration_s: f64 },
    /// Gaze left the focused target.
    FixationEnd { target: String, duration_s: f64 },
    /// Focus moved from one target to another (drawn as a connecting line).
    FocusShift { from: String, to: String },
}

impl GazeEvent {
    /// Short event name used in logs and s-expressions.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Blink { .. } => "blink",
            Self::Saccade { .. } => "saccade",
            Self::FixationStart { .. } => "fixation-start",
            Self::FixationContinue { .. } => "fixation-continue",
            Self::FixationEnd { .. } => "fixation-end",
            Self::FocusShift { .. } => "focus-shift",
        }
    }

    /// Serialize as an s-expression tagged with the gaze source.
    pub fn to_sexp(&self, source: GazeSource) -> String {
        match self {
            Self::Blink { eye } => format!(
                "(:type :event :event :blink :source :{} :eye :{})",
                source.as_str(),
                eye.as_str()
            ),
            Self::Saccade { eye, speed } => format!(
                "(:type :event :event :saccade :source :{} :eye :{} :speed {:.3})",
                source.as_str(),
                eye.as_str(),
                speed
            ),
            Self::FixationStart { target } => format!(
                "(:type :event :event :fixation-start :source :{} :target \"{}\")",
                source.as_str(),
                escape(target)
            ),
            Self::FixationContinue { target, duration_s } => format!(
                "(:type :event :event :fixation-continue :source :{} :target \"{}\" :duration {:.3})",
                source.as_str(),
                escape(target),
                duration_s
            ),
            Self::FixationEnd { target, duration_s } => format!(
                "(:type :event :event :fixation-end :source :{} :target \"{}\" :duration {:.3})",
                source.as_str(),
                escape(target),
                duration_s
            ),
            Self::FocusShift { from, to } => format!(
                "(:type :event :event :focus-shift :source :{} :from \"{}\" :to \"{}\")",
                source.as_str(),
                escape(from),
                escape(to)
            ),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
