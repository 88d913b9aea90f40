//! Session configuration — classifier, history, focus and log settings,
//! loaded from an s-expression plist file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lexpr::Value;
use tracing::{info, warn};

use super::sexp::{get_float, get_int, get_keyword};
use crate::gaze::classifier::{BlinkMode, ClassifierConfig, SaccadeMode};
use crate::gaze::focus::FocusConfig;
use crate::gaze::history::DEFAULT_CAPACITY;
use crate::gaze::pipeline::GazePipeline;
use crate::gaze::sample::GazeSource;

/// CSV log settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory the session CSV is written into.
    pub output_dir: PathBuf,
    /// Rows buffered before the file is flushed.
    pub flush_every: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Data"),
            flush_every: 256,
        }
    }
}

/// Effective configuration for a recording session.
#[derive(Debug, Clone)]
pub struct GazeConfig {
    pub classifier: ClassifierConfig,
    /// Explicit saccade detector; `None` picks the canonical one per source.
    pub saccade_mode: Option<SaccadeMode>,
    pub history_capacity: usize,
    pub focus: FocusConfig,
    pub log: LogConfig,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            saccade_mode: None,
            history_capacity: DEFAULT_CAPACITY,
            focus: FocusConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl GazeConfig {
    /// Read a config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a config plist. Invalid values are ignored with a warning.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = lexpr::from_str(raw)?;
        let mut config = Self::default();
        config.apply(&value);
        Ok(config)
    }

    fn apply(&mut self, value: &Value) {
        if let Some(s) = get_keyword(value, "blink-mode") {
            match BlinkMode::from_str(&s) {
                Some(mode) => self.classifier.blink_mode = mode,
                None => warn!("Unknown blink mode {:?}, keeping {}", s, self.classifier.blink_mode.as_str()),
            }
        }
        if let Some(s) = get_keyword(value, "saccade-mode") {
            match parse_saccade_mode(&s) {
                Some(mode) => self.saccade_mode = mode,
                None => warn!("Unknown saccade mode {:?}, using per-source default", s),
            }
        }

        set_positive(value, "saccade-threshold", &mut self.classifier.saccade_threshold);
        set_positive(value, "angle-threshold", &mut self.classifier.angle_threshold_deg);
        set_positive(value, "distance-threshold", &mut self.classifier.distance_threshold);
        set_positive(value, "openness-threshold", &mut self.classifier.openness_threshold);
        set_positive(value, "velocity-threshold", &mut self.focus.velocity_threshold_dps);

        set_count(value, "history-capacity", &mut self.history_capacity);
        set_count(value, "frame-count", &mut self.focus.frame_count);
        set_count(value, "flush-every", &mut self.log.flush_every);

        if let Some(dir) = get_keyword(value, "output-dir") {
            self.log.output_dir = PathBuf::from(dir);
        }

        if self.focus.frame_count > self.history_capacity {
            warn!(
                "frame-count {} exceeds history-capacity {}; focus can never be confirmed",
                self.focus.frame_count, self.history_capacity
            );
        }
    }

    /// Classifier settings for one gaze stream.
    pub fn classifier_for(&self, source: GazeSource) -> ClassifierConfig {
        ClassifierConfig {
            saccade_mode: self
                .saccade_mode
                .unwrap_or_else(|| SaccadeMode::for_source(source)),
            ..self.classifier.clone()
        }
    }

    /// Build a pipeline for one gaze stream.
    pub fn pipeline(&self, source: GazeSource) -> GazePipeline {
        GazePipeline::new(
            source,
            self.classifier_for(source),
            self.history_capacity,
            self.focus.clone(),
        )
    }

    /// Render the effective configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:blink-mode :{} :saccade-mode :{} :saccade-threshold {} :angle-threshold {} :distance-threshold {} :openness-threshold {} :history-capacity {} :frame-count {} :velocity-threshold {} :flush-every {} :output-dir \"{}\")",
            self.classifier.blink_mode.as_str(),
            self.saccade_mode.map(|m| m.as_str()).unwrap_or("auto"),
            self.classifier.saccade_threshold,
            self.classifier.angle_threshold_deg,
            self.classifier.distance_threshold,
            self.classifier.openness_threshold,
            self.history_capacity,
            self.focus.frame_count,
            self.focus.velocity_threshold_dps,
            self.log.flush_every,
            self.log.output_dir.display().to_string().replace('\\', "\\\\").replace('"', "\\\""),
        )
    }
}

/// `auto` selects the per-source detector.
fn parse_saccade_mode(s: &str) -> Option<Option<SaccadeMode>> {
    match s {
        "auto" => Some(None),
        other => SaccadeMode::from_str(other).map(Some),
    }
}

fn set_positive(value: &Value, key: &str, slot: &mut f32) {
    if let Some(v) = get_float(value, key) {
        if v > 0.0 && v.is_finite() {
            *slot = v as f32;
        } else {
            warn!("Ignoring {} = {}: must be positive", key, v);
        }
    }
}

fn set_count(value: &Value, key: &str, slot: &mut usize) {
    if let Some(v) = get_int(value, key) {
        if v > 0 {
            *slot = v as usize;
        } else {
            warn!("Ignoring {} = {}: must be at least 1", key, v);
        }
    }
}
