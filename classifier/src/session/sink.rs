//! Event sinks: where pipeline events go after each frame.

use std::io::Write;

use anyhow::{Context, Result};

use crate::gaze::event::GazeEvent;
use crate::gaze::sample::GazeSource;

pub trait EventSink {
    fn emit(&mut self, source: GazeSource, event: &GazeEvent) -> Result<()>;

    fn emit_all(&mut self, source: GazeSource, events: &[GazeEvent]) -> Result<()> {
        for event in events {
            self.emit(source, event)?;
        }
        Ok(())
    }
}

/// Writes one s-expression per event, newline separated.
pub struct SexpWriter<W: Write> {
    out: W,
    /// Drop `fixation-continue` events, which fire every focused frame.
    pub skip_continue: bool,
}

impl<W: Write> SexpWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            skip_continue: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for SexpWriter<W> {
    fn emit(&mut self, source: GazeSource, event: &GazeEvent) -> Result<()> {
        if self.skip_continue && matches!(event, GazeEvent::FixationContinue { .. }) {
            return Ok(());
        }
        writeln!(self.out, "{}", event.to_sexp(source)).context("writing event")
    }
}

/// Collects events in memory.
impl EventSink for Vec<(GazeSource, GazeEvent)> {
    fn emit(&mut self, source: GazeSource, event: &GazeEvent) -> Result<()> {
        self.push((source, event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::sample::Eye;

    #[test]
    fn test_sexp_writer_lines() {
        let mut w = SexpWriter::new(Vec::new());
        w.emit_all(
            GazeSource::Left,
            &[
                GazeEvent::Blink { eye: Eye::Left },
                GazeEvent::FixationStart {
                    target: "Cube".into(),
                },
            ],
        )
        .unwrap();
        let text = String::from_utf8(w.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(":event :blink"));
        assert!(lines[1].contains(":target \"Cube\""));
    }

    #[test]
    fn test_skip_continue() {
        let mut w = SexpWriter::new(Vec::new());
        w.skip_continue = true;
        w.emit(
            GazeSource::Central,
            &GazeEvent::FixationContinue {
                target: "Cube".into(),
                duration_s: 0.5,
            },
        )
        .unwrap();
        assert!(w.into_inner().is_empty());
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut events: Vec<(GazeSource, GazeEvent)> = Vec::new();
        events
            .emit(GazeSource::Right, &GazeEvent::Blink { eye: Eye::Right })
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, GazeSource::Right);
    }
}
