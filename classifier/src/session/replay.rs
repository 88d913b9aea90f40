//! Multi-stream replay: one independent pipeline per gaze source.
//!
//! Dual-eye recordings carry left and right streams (and sometimes the
//! central gaze) in the same frame. Each source gets its own classifier,
//! history and focus state; nothing is shared between them.

use tracing::info;

use super::config::GazeConfig;
use super::trace::TraceFrame;
use crate::gaze::event::GazeEvent;
use crate::gaze::pipeline::{FrameReport, GazePipeline};
use crate::gaze::sample::GazeSource;
use crate::gaze::scene::Raycast;

pub struct GazeSession {
    config: GazeConfig,
    /// Process only this stream when set.
    only: Option<GazeSource>,
    pipelines: Vec<GazePipeline>,
}

impl GazeSession {
    pub fn new(config: GazeConfig) -> Self {
        Self {
            config,
            only: None,
            pipelines: Vec::new(),
        }
    }

    /// Restrict the session to one gaze stream.
    pub fn only(mut self, source: GazeSource) -> Self {
        self.only = Some(source);
        self
    }

    fn pipeline_mut(&mut self, source: GazeSource) -> &mut GazePipeline {
        let idx = match self.pipelines.iter().position(|p| p.source == source) {
            Some(idx) => idx,
            None => {
                info!("New gaze stream in trace: {}", source.as_str());
                self.pipelines.push(self.config.pipeline(source));
                self.pipelines.len() - 1
            }
        };
        &mut self.pipelines[idx]
    }

    /// Step every stream present in `frame`, in frame order.
    pub fn step(
        &mut self,
        frame: &TraceFrame,
        dt_s: f64,
        scene: &dyn Raycast,
    ) -> Vec<(GazeSource, FrameReport)> {
        let mut reports = Vec::with_capacity(frame.samples.len());
        for (source, sample) in &frame.samples {
            if self.only.map_or(false, |only| only != *source) {
                continue;
            }
            let report = self.pipeline_mut(*source).step(sample, dt_s, scene);
            reports.push((*source, report));
        }
        reports
    }

    pub fn pipeline(&self, source: GazeSource) -> Option<&GazePipeline> {
        self.pipelines.iter().find(|p| p.source == source)
    }

    /// Pipelines in the order their streams first appeared.
    pub fn pipelines(&self) -> &[GazePipeline] {
        &self.pipelines
    }

    /// Close every stream; returns the closing events per source.
    pub fn finish(&mut self) -> Vec<(GazeSource, Vec<GazeEvent>)> {
        self.pipelines
            .iter_mut()
            .map(|p| (p.source, p.finish()))
            .collect()
    }

    /// Per-source statistics, one s-expression per stream.
    pub fn status_sexp(&self) -> String {
        let streams: Vec<String> = self
            .pipelines
            .iter()
            .map(|p| format!("(:source :{} :stats {})", p.source.as_str(), p.stats.status_sexp()))
            .collect();
        format!("({})", streams.join(" "))
    }
}
