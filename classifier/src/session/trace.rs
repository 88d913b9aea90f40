//! Recorded input feeds — gaze trace replay and sphere scene files.
//!
//! Both formats hold one s-expression plist per line. Blank lines and lines
//! starting with `;` are ignored.
//!
//! Trace frame:
//! `(:t 0.016 :dt 0.016 :pos (x y z) :dir (x y z) :left-open 1.0 :right-open 1.0
//!   :left-pupil 3.1 :right-pupil 3.2 :tracked t :state 3
//!   :head-pos (x y z) :head-rot (x y z w))`
//! `:rot (x y z w)` may replace `:dir`; the direction is then the pose's
//! forward axis. Per-eye streams use the same keys prefixed with `left-` or
//! `right-` (`:left-pos`, `:left-dir`, `:left-rot`, `:left-tracked`, ...).
//! A frame carries any non-empty subset of the central, left and right
//! streams; openness, pupil and tracking state are shared between them.
//!
//! Scene collider: `(:name "Cube" :center (x y z) :radius 0.5 :collider 7)`

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use lexpr::Value;
use tracing::{info, warn};

use super::sexp::{get_bool, get_float, get_int, get_keyword, get_quat, get_value, get_vec3};
use crate::gaze::sample::{GazeSample, GazeSource, HeadPose};
use crate::gaze::scene::{SphereCollider, SphereScene};

/// Frame interval assumed for a first frame that carries no `:dt` (90 Hz).
pub const DEFAULT_FRAME_DT: f64 = 1.0 / 90.0;

/// One replayed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub timestamp_s: f64,
    /// Gaze streams present in the frame, central first.
    pub samples: Vec<(GazeSource, GazeSample)>,
    pub head: Option<HeadPose>,
    /// Explicit frame interval, if the line carried one.
    pub dt_s: Option<f64>,
}

impl TraceFrame {
    pub fn sample(&self, source: GazeSource) -> Option<&GazeSample> {
        self.samples
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, sample)| sample)
    }
}

const STREAMS: [(GazeSource, &str); 3] = [
    (GazeSource::Central, ""),
    (GazeSource::Left, "left-"),
    (GazeSource::Right, "right-"),
];

/// Parse one trace line.
pub fn parse_frame(line: &str) -> Result<TraceFrame> {
    let value = lexpr::from_str(line)?;
    let t = get_float(&value, "t").ok_or_else(|| anyhow!("missing :t"))?;

    let mut samples = Vec::new();
    for (source, prefix) in STREAMS {
        if let Some(sample) = parse_stream(&value, t, prefix)? {
            samples.push((source, sample));
        }
    }
    if samples.is_empty() {
        return Err(anyhow!("no gaze stream: expected :pos, :left-pos or :right-pos"));
    }

    let head = get_vec3(&value, "head-pos").map(|position| HeadPose {
        position,
        rotation: get_quat(&value, "head-rot").unwrap_or_default(),
    });

    Ok(TraceFrame {
        timestamp_s: t,
        samples,
        head,
        dt_s: get_float(&value, "dt"),
    })
}

/// One gaze stream of a frame, keyed by `prefix`. `None` when the stream
/// has no position.
fn parse_stream(value: &Value, t: f64, prefix: &str) -> Result<Option<GazeSample>> {
    let key = |name: &str| format!("{}{}", prefix, name);
    let position = match get_vec3(value, &key("pos")) {
        Some(position) => position,
        None if get_value(value, &key("pos")).is_some() => {
            return Err(anyhow!("invalid :{}", key("pos")))
        }
        None if get_value(value, &key("dir")).is_some() || get_value(value, &key("rot")).is_some() => {
            return Err(anyhow!("missing :{}", key("pos")))
        }
        None => return Ok(None),
    };
    let mut sample = match (get_vec3(value, &key("dir")), get_quat(value, &key("rot"))) {
        (Some(dir), _) => GazeSample::new(t, position, dir),
        (None, Some(rot)) => GazeSample::from_pose(t, position, rot),
        (None, None) => return Err(anyhow!("missing :{} or :{}", key("dir"), key("rot"))),
    };

    if let (Some(l), Some(r)) = (get_float(value, "left-open"), get_float(value, "right-open")) {
        sample = sample.with_openness(l as f32, r as f32);
    }
    if let (Some(l), Some(r)) = (get_float(value, "left-pupil"), get_float(value, "right-pupil")) {
        sample = sample.with_pupil(l as f32, r as f32);
    }
    if let Some(tracked) = get_bool(value, &key("tracked")).or_else(|| get_bool(value, "tracked")) {
        sample = sample.with_tracked(tracked);
    }
    if let Some(state) = get_int(value, "state") {
        sample = sample.with_tracking_state(state as i32);
    }
    Ok(Some(sample))
}

fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(';')
}

/// Iterates the frames of a trace, resolving each frame's `dt`.
///
/// Malformed lines are logged and skipped; I/O errors end the iteration
/// with an error.
pub struct TraceReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    last_t: Option<f64>,
    /// Number of malformed lines skipped so far.
    pub skipped: usize,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening trace {}", path.display()))?;
        info!("Replaying trace {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            last_t: None,
            skipped: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    /// A frame and the interval to step it with.
    type Item = Result<(TraceFrame, f64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e).context(format!("reading trace line {}", self.line_no + 1))),
            };
            self.line_no += 1;
            if is_skippable(&line) {
                continue;
            }
            match parse_frame(&line) {
                Ok(frame) => {
                    let t = frame.timestamp_s;
                    let dt = frame
                        .dt_s
                        .unwrap_or_else(|| self.last_t.map_or(DEFAULT_FRAME_DT, |last| t - last));
                    self.last_t = Some(t);
                    return Some(Ok((frame, dt)));
                }
                Err(e) => {
                    warn!("Skipping trace line {}: {}", self.line_no, e);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Parse one scene collider line.
pub fn parse_collider(line: &str) -> Result<SphereCollider> {
    let value = lexpr::from_str(line)?;
    let name = get_keyword(&value, "name").ok_or_else(|| anyhow!("missing :name"))?;
    let center = get_vec3(&value, "center").ok_or_else(|| anyhow!("missing or invalid :center"))?;
    let radius = get_float(&value, "radius").ok_or_else(|| anyhow!("missing :radius"))?;
    if !(radius > 0.0) {
        return Err(anyhow!("radius must be positive, got {}", radius));
    }
    let handle = get_int(&value, "collider").unwrap_or(0).max(0) as u64;
    Ok(SphereCollider::new(name, center, radius as f32, handle))
}

/// Read a scene from any reader. Colliders without a `:collider` handle are
/// numbered by line order.
pub fn read_scene<R: BufRead>(reader: R) -> Result<SphereScene> {
    let mut scene = SphereScene::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading scene line {}", idx + 1))?;
        if is_skippable(&line) {
            continue;
        }
        let mut collider = parse_collider(&line).with_context(|| format!("scene line {}", idx + 1))?;
        if collider.handle.0 == 0 {
            collider.handle.0 = scene.len() as u64 + 1;
        }
        scene.add(collider);
    }
    Ok(scene)
}

pub fn load_scene(path: &Path) -> Result<SphereScene> {
    let file = File::open(path).with_context(|| format!("opening scene {}", path.display()))?;
    let scene = read_scene(BufReader::new(file))?;
    info!("Loaded {} colliders from {}", scene.len(), path.display());
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::math::Vec3;
    use std::io::Cursor;

    #[test]
    fn test_parse_full_frame() {
        let f = parse_frame(
            "(:t 1.5 :dt 0.011 :pos (0 1.6 0) :dir (0 0 2) :left-open 0.9 :right-open 0.05 \
             :left-pupil 3.1 :right-pupil 3.3 :tracked t :state 3 :head-pos (0 1.7 0) :head-rot (0 0 0 1))",
        )
        .unwrap();
        assert_eq!(f.samples.len(), 1);
        let s = f.sample(GazeSource::Central).unwrap();
        assert_eq!(s.timestamp_s, 1.5);
        assert_eq!(s.position, Vec3::new(0.0, 1.6, 0.0));
        assert_eq!(s.direction, Vec3::FORWARD);
        assert_eq!(s.openness.map(|o| o.right), Some(0.05));
        assert_eq!(s.pupil.map(|p| p.left), Some(3.1));
        assert_eq!(s.is_tracked, Some(true));
        assert_eq!(s.tracking_state, Some(3));
        assert_eq!(f.dt_s, Some(0.011));
        assert_eq!(f.head.map(|h| h.position), Some(Vec3::new(0.0, 1.7, 0.0)));
    }

    #[test]
    fn test_parse_frame_from_rotation() {
        let f = parse_frame("(:t 0 :pos (0 0 0) :rot (0 0 0 1))").unwrap();
        let s = f.sample(GazeSource::Central).unwrap();
        assert_eq!(s.direction, Vec3::FORWARD);
        assert_eq!(s.openness, None);
        assert_eq!(f.head, None);
    }

    #[test]
    fn test_parse_two_eye_frame() {
        let f = parse_frame(
            "(:t 0.5 :left-pos (-0.03 1.6 0) :left-dir (0 0 1) :right-pos (0.03 1.6 0) :right-rot (0 0 0 1) \
             :left-open 0.02 :right-open 0.9 :tracked t :right-tracked nil)",
        )
        .unwrap();
        let sources: Vec<GazeSource> = f.samples.iter().map(|(s, _)| *s).collect();
        assert_eq!(sources, vec![GazeSource::Left, GazeSource::Right]);
        assert!(f.sample(GazeSource::Central).is_none());

        let left = f.sample(GazeSource::Left).unwrap();
        let right = f.sample(GazeSource::Right).unwrap();
        assert_eq!(left.position, Vec3::new(-0.03, 1.6, 0.0));
        assert_eq!(right.direction, Vec3::FORWARD);
        assert_eq!(left.openness, right.openness, "openness is shared");
        assert_eq!(left.is_tracked, Some(true));
        assert_eq!(right.is_tracked, Some(false), "per-eye flag overrides :tracked");
    }

    #[test]
    fn test_parse_eye_stream_missing_direction() {
        assert!(parse_frame("(:t 0 :left-pos (0 0 0))").is_err());
        assert!(parse_frame("(:t 0 :right-dir (0 0 1))").is_err());
        assert!(parse_frame("(:t 0 :head-pos (0 1.7 0))").is_err());
    }

    #[test]
    fn test_parse_frame_missing_fields() {
        assert!(parse_frame("(:pos (0 0 0) :dir (0 0 1))").is_err());
        assert!(parse_frame("(:t 0 :dir (0 0 1))").is_err());
        assert!(parse_frame("(:t 0 :pos (0 0 0))").is_err());
        assert!(parse_frame("not a plist (").is_err());
    }

    #[test]
    fn test_reader_resolves_dt_and_skips_bad_lines() {
        let trace = "; header comment\n\
                     (:t 0.0 :pos (0 0 1) :dir (0 0 1))\n\
                     \n\
                     (:t 0.02 :pos (0 0 1) :dir (0 0 1))\n\
                     (:t oops)\n\
                     (:t 0.05 :dt 0.01 :pos (0 0 1) :dir (0 0 1))\n";
        let mut reader = TraceReader::new(Cursor::new(trace));
        let dts: Vec<f64> = reader
            .by_ref()
            .map(|r| r.map(|(_, dt)| dt).unwrap_or(f64::NAN))
            .collect();
        assert_eq!(dts.len(), 3);
        assert!((dts[0] - DEFAULT_FRAME_DT).abs() < 1e-12);
        assert!((dts[1] - 0.02).abs() < 1e-12);
        assert!((dts[2] - 0.01).abs() < 1e-12);
        assert_eq!(reader.skipped, 1);
    }

    #[test]
    fn test_read_scene() {
        let text = "(:name \"Cube\" :center (0 0 5) :radius 0.5 :collider 7)\n\
                    ; comment\n\
                    (:name \"Sphere\" :center (1 0 5) :radius 0.25)\n";
        let scene = read_scene(Cursor::new(text)).unwrap();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.colliders[0].handle.0, 7);
        assert_eq!(scene.colliders[1].handle.0, 2);
        assert_eq!(scene.colliders[1].name, "Sphere");
    }

    #[test]
    fn test_read_scene_rejects_bad_radius() {
        let err = read_scene(Cursor::new("(:name \"X\" :center (0 0 0) :radius 0)\n"));
        assert!(err.is_err());
    }
}
