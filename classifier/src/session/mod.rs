//! Session I/O around the gaze core: configuration, recorded-trace replay
//! across gaze streams, scene files, CSV logging and event sinks.

pub mod config;
pub mod csv_log;
pub mod replay;
pub mod sexp;
pub mod sink;
pub mod trace;

pub use config::{GazeConfig, LogConfig};
pub use csv_log::CsvLogger;
pub use replay::GazeSession;
pub use sink::{EventSink, SexpWriter};
pub use trace::{load_scene, TraceFrame, TraceReader};
