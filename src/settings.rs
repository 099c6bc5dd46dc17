//! Runtime configuration consumed by the sampling core.
//!
//! Parsing the command line into this struct is the binary's job; the core
//! only sees the validated value.

use std::fmt;
use std::path::PathBuf;

/// Configuration errors are fatal: reported to the user before any
/// sampling begins, with a non-zero exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The sampling interval must be a positive number of milliseconds.
    BadInterval(u64),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::BadInterval(ms) => {
                write!(f, "bad interval {} ms, must be positive", ms)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Sampling interval in milliseconds.
    pub interval_ms: u64,
    /// Sample per-core CPU counters at all.
    pub use_cpu_stats: bool,
    /// Explicit list of pids to track.
    pub pids: Vec<i32>,
    /// Track every process present, rediscovered each iteration.
    pub track_all: bool,
    /// CPU utilization CSV file, if any.
    pub cpu_csv: Option<PathBuf>,
    /// Process sample CSV file, if any.
    pub pid_csv: Option<PathBuf>,
    /// Field delimiter for the CSV files.
    pub delim: char,
    /// Emit header rows (CSV) and the table heading.
    pub write_header: bool,
    /// Render utilization as a fraction in [0,1] instead of a percentage.
    pub normalize: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            use_cpu_stats: true,
            pids: Vec::new(),
            track_all: false,
            cpu_csv: None,
            pid_csv: None,
            delim: ';',
            write_header: true,
            normalize: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.interval_ms == 0 {
            return Err(SettingsError::BadInterval(self.interval_ms));
        }
        Ok(())
    }

    /// Whether any process tracking is configured.
    pub fn track_processes(&self) -> bool {
        self.track_all || !self.pids.is_empty()
    }
}
