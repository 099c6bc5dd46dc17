//! Delimited-file writers for CPU utilization and process samples.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::error;

use crate::model::{CpuUtil, ProcessSample};
use crate::sampler::{CpuUtilAcceptor, ProcessSampleAcceptor};
use crate::util::iso_time_ms;

use super::Consumer;

/// Sink configuration shared by both writers.
#[derive(Debug, Clone)]
pub struct CsvSettings {
    pub path: PathBuf,
    pub delim: char,
    pub write_header: bool,
}

impl CsvSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delim: ';',
            write_header: true,
        }
    }
}

/// Accumulates the most recent utilization value per core and writes one
/// line per iteration: timestamp, then one field per core, blank where no
/// value arrived this cycle.
pub struct CpuUtilCsvWriter {
    settings: CsvSettings,
    normalize: bool,
    slots: Vec<Option<f64>>,
    iter_timestamp: String,
    out: Option<BufWriter<File>>,
}

impl CpuUtilCsvWriter {
    pub fn new(settings: CsvSettings, num_cpus: usize, normalize: bool) -> Self {
        Self {
            settings,
            normalize,
            slots: vec![None; num_cpus],
            iter_timestamp: String::new(),
            out: None,
        }
    }

    fn format_value(&self, busy: f64) -> String {
        if self.normalize {
            format!("{:.5}", busy)
        } else {
            format!("{:.2}", busy * 100.0)
        }
    }
}

impl Consumer for CpuUtilCsvWriter {
    fn name(&self) -> &'static str {
        "cpu-csv"
    }

    fn start(&mut self) -> bool {
        let file = match File::create(&self.settings.path) {
            Ok(file) => file,
            Err(e) => {
                error!(
                    "failed to open {} for writing: {}",
                    self.settings.path.display(),
                    e
                );
                return false;
            }
        };
        let mut out = BufWriter::new(file);
        if self.settings.write_header {
            let mut header = String::from("timestamp");
            for i in 0..self.slots.len() {
                header.push(self.settings.delim);
                header.push_str(&format!("cpu{}", i));
            }
            let _ = writeln!(out, "{}", header);
        }
        self.out = Some(out);
        true
    }

    fn begin_iter(&mut self) {
        self.iter_timestamp = iso_time_ms();
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    fn end_iter(&mut self) {
        let mut line = self.iter_timestamp.clone();
        for slot in &self.slots {
            line.push(self.settings.delim);
            if let Some(busy) = slot {
                line.push_str(&self.format_value(*busy));
            }
        }
        if let Some(out) = self.out.as_mut() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }

    fn finish(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
    }
}

impl CpuUtilAcceptor for CpuUtilCsvWriter {
    fn accept_util(&mut self, value: &CpuUtil, _last_in_batch: bool) {
        if let Some(slot) = self.slots.get_mut(value.core) {
            *slot = Some(value.busy);
        }
    }
}

/// Writes one line per process-sample event immediately on delivery:
/// timestamp, pid, assigned core (blank when absent), state label.
pub struct ProcessCsvWriter {
    settings: CsvSettings,
    iter_timestamp: String,
    out: Option<BufWriter<File>>,
}

impl ProcessCsvWriter {
    pub fn new(settings: CsvSettings) -> Self {
        Self {
            settings,
            iter_timestamp: String::new(),
            out: None,
        }
    }
}

impl Consumer for ProcessCsvWriter {
    fn name(&self) -> &'static str {
        "pid-csv"
    }

    fn start(&mut self) -> bool {
        let file = match File::create(&self.settings.path) {
            Ok(file) => file,
            Err(e) => {
                error!(
                    "failed to open {} for writing: {}",
                    self.settings.path.display(),
                    e
                );
                return false;
            }
        };
        let mut out = BufWriter::new(file);
        if self.settings.write_header {
            let d = self.settings.delim;
            let _ = writeln!(out, "timestamp{d}pid{d}cpu{d}state");
        }
        self.out = Some(out);
        true
    }

    fn begin_iter(&mut self) {
        self.iter_timestamp = iso_time_ms();
    }

    fn end_iter(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.flush();
        }
    }

    fn finish(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
    }
}

impl ProcessSampleAcceptor for ProcessCsvWriter {
    fn accept_process(&mut self, value: &ProcessSample, _last_in_batch: bool) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        let d = self.settings.delim;
        let core = value
            .core
            .map(|c| c.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{}{d}{}{d}{}{d}{}",
            self.iter_timestamp,
            value.pid,
            core,
            value.state.label()
        );
    }
}
