//! Gaze event classifier library — blink, saccade and fixation detection
//! for head-mounted eye tracking.
//!
//! `gaze` holds the frame-driven core (no I/O); `session` holds config
//! loading, trace replay, scene files and CSV logging. The binary entry
//! point lives in `main.rs`.

pub mod gaze;
pub mod session;
