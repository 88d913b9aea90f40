//! Per-frame CSV session log.
//!
//! Rows are buffered and flushed every `flush_every` frames, and once more
//! when the logger is closed or dropped.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::gaze::pipeline::FrameReport;
use crate::gaze::sample::{GazeSample, GazeSource, HeadPose};

pub const HEADER: &[&str] = &[
    "Timestamp",
    "Source",
    "PosX",
    "PosY",
    "PosZ",
    "DirX",
    "DirY",
    "DirZ",
    "LeftOpenness",
    "RightOpenness",
    "LeftPupilDiameter",
    "RightPupilDiameter",
    "IsTracked",
    "TrackingState",
    "Blink",
    "Saccade",
    "SaccadeSpeed",
    "FixationDuration",
    "LookedAtObject",
    "FocusState",
    "HeadPosX",
    "HeadPosY",
    "HeadPosZ",
    "HeadRotX",
    "HeadRotY",
    "HeadRotZ",
    "HeadRotW",
];

/// File name for a session started at `unix_secs`.
pub fn session_file_name(unix_secs: u64) -> String {
    format!("EyeTrackingData_{}.csv", unix_secs)
}

pub struct CsvLogger {
    writer: BufWriter<File>,
    path: PathBuf,
    flush_every: usize,
    pending: usize,
    rows: u64,
    closed: bool,
}

impl CsvLogger {
    /// Create a new session file inside `dir`, creating the directory if needed.
    pub fn create(dir: &Path, flush_every: usize) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::create_at(&dir.join(session_file_name(secs)), flush_every)
    }

    /// Create (or truncate) the log at an explicit path.
    pub fn create_at(path: &Path, flush_every: usize) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER.join(",")).context("writing CSV header")?;
        info!("Logging gaze data to {}", path.display());
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            flush_every: flush_every.max(1),
            pending: 0,
            rows: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one frame. Skipped frames are not logged.
    pub fn write_row(
        &mut self,
        source: GazeSource,
        report: &FrameReport,
        sample: &GazeSample,
        head: Option<&HeadPose>,
    ) -> Result<()> {
        if report.skipped {
            return Ok(());
        }
        let line = format_row(source, report, sample, head);
        writeln!(self.writer, "{}", line).with_context(|| format!("writing {}", self.path.display()))?;
        self.rows += 1;
        self.pending += 1;
        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))?;
        debug!("Flushed {} rows to {}", self.pending, self.path.display());
        self.pending = 0;
        Ok(())
    }

    /// Flush remaining rows and return the file path.
    pub fn close(mut self) -> Result<PathBuf> {
        self.flush()?;
        self.closed = true;
        info!("Wrote {} rows to {}", self.rows, self.path.display());
        Ok(self.path.clone())
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.writer.flush() {
                warn!("Failed to flush {} on drop: {}", self.path.display(), e);
            }
        }
    }
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one CSV row in `HEADER` order.
pub fn format_row(
    source: GazeSource,
    report: &FrameReport,
    sample: &GazeSample,
    head: Option<&HeadPose>,
) -> String {
    let c = &report.classification;
    let mut row = String::new();
    let _ = write!(
        row,
        "{},{},{},{},{},{},{},{},",
        report.timestamp_s,
        source.as_str(),
        sample.position.x,
        sample.position.y,
        sample.position.z,
        sample.direction.x,
        sample.direction.y,
        sample.direction.z,
    );
    let _ = write!(
        row,
        "{},{},{},{},{},{},",
        opt(sample.openness.map(|o| o.left)),
        opt(sample.openness.map(|o| o.right)),
        opt(sample.pupil.map(|p| p.left)),
        opt(sample.pupil.map(|p| p.right)),
        c.is_tracked,
        opt(sample.tracking_state),
    );
    let _ = write!(
        row,
        "{},{},{},{},{},{},",
        c.is_blink,
        c.is_saccade,
        c.saccade_speed,
        c.fixation_duration,
        quote(report.looked_at()),
        report.focus_state,
    );
    let _ = write!(
        row,
        "{},{},{},{},{},{},{}",
        opt(head.map(|h| h.position.x)),
        opt(head.map(|h| h.position.y)),
        opt(head.map(|h| h.position.z)),
        opt(head.map(|h| h.rotation.x)),
        opt(head.map(|h| h.rotation.y)),
        opt(head.map(|h| h.rotation.z)),
        opt(head.map(|h| h.rotation.w)),
    );
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::classifier::Classification;
    use crate::gaze::math::{Quat, Vec3};
    use crate::gaze::scene::{ColliderHandle, RaycastHit};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gaze-csv-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn report(hit: Option<&str>) -> FrameReport {
        FrameReport {
            timestamp_s: 0.5,
            classification: Classification {
                is_tracked: true,
                fixation_duration: 0.25,
                ..Classification::default()
            },
            hit: hit.map(|name| RaycastHit {
                target: name.to_string(),
                point: Vec3::ZERO,
                collider: ColliderHandle(1),
                distance: 1.0,
            }),
            velocity_dps: Some(1.0),
            focus_state: "candidate",
            events: Vec::new(),
            skipped: false,
        }
    }

    #[test]
    fn test_row_matches_header_width() {
        let sample = GazeSample::new(0.5, Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD);
        let row = format_row(GazeSource::Central, &report(Some("Cube")), &sample, None);
        assert_eq!(row.split(',').count(), HEADER.len(), "row: {}", row);
        assert!(row.starts_with("0.5,central,0,1,0,0,0,1,"));
        assert!(row.contains(",Cube,candidate,"));
    }

    #[test]
    fn test_row_optional_fields() {
        let sample = GazeSample::new(0.5, Vec3::ZERO, Vec3::FORWARD)
            .with_openness(0.8, 0.9)
            .with_tracking_state(3);
        let head = HeadPose {
            position: Vec3::new(0.0, 1.7, 0.0),
            rotation: Quat::IDENTITY,
        };
        let row = format_row(GazeSource::Left, &report(None), &sample, Some(&head));
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[8], "0.8");
        assert_eq!(cells[10], "", "pupil absent");
        assert_eq!(cells[13], "3");
        assert_eq!(cells[18], "None");
        assert_eq!(cells[21], "1.7");
        assert_eq!(cells[26], "1");
    }

    #[test]
    fn test_target_with_comma_is_quoted() {
        let sample = GazeSample::new(0.0, Vec3::ZERO, Vec3::FORWARD);
        let row = format_row(GazeSource::Central, &report(Some("a,b")), &sample, None);
        assert!(row.contains(",\"a,b\","));
    }

    #[test]
    fn test_logger_writes_header_and_rows() {
        let dir = temp_dir("rows");
        let mut log = CsvLogger::create(&dir, 2).unwrap();
        assert!(log
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("EyeTrackingData_") && n.ends_with(".csv")));

        let sample = GazeSample::new(0.5, Vec3::ZERO, Vec3::FORWARD);
        for _ in 0..3 {
            log.write_row(GazeSource::Central, &report(None), &sample, None).unwrap();
        }
        let mut skipped = report(None);
        skipped.skipped = true;
        log.write_row(GazeSource::Central, &skipped, &sample, None).unwrap();
        assert_eq!(log.rows(), 3);

        let path = log.close().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER.join(","));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_drop_flushes_pending_rows() {
        let dir = temp_dir("drop");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("drop.csv");
        {
            let mut log = CsvLogger::create_at(&path, 1000).unwrap();
            let sample = GazeSample::new(0.0, Vec3::ZERO, Vec3::FORWARD);
            log.write_row(GazeSource::Right, &report(None), &sample, None).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        let _ = fs::remove_dir_all(&dir);
    }
}
