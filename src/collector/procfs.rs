//! Parsing of `/proc/stat` and `/proc/<pid>/stat` into typed records.

use std::path::Path;

use tracing::debug;

use crate::model::{CpuTimes, NUM_CPU_FIELDS, ProcState, ProcessSample};
use crate::util::nth_word;

use super::traits::FileSystem;

/// Word offset of the state character in `/proc/<pid>/stat` (field 3).
const STATE_WORD_SKIP: usize = 2;

/// Additional word offset from the state field to the assigned-core field
/// (field 39).
const CORE_WORD_SKIP: usize = 36;

/// Reads kernel counter sources under a configurable proc path.
///
/// Stateless apart from the filesystem handle; all methods are point-in-time
/// reads.
pub struct ProcReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcReader<F> {
    /// # Arguments
    /// * `fs` - filesystem implementation (real or mock)
    /// * `proc_path` - base path of the proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Counts per-core lines in `/proc/stat`: prefix `cpu` followed
    /// immediately by a decimal digit. The aggregate `cpu ` line does not
    /// count. Returns 0 when the source is unreadable; callers must treat
    /// 0 cores as a degenerate but valid state.
    pub fn count_cpu_cores(&self) -> usize {
        let path = format!("{}/stat", self.proc_path);
        let Ok(content) = self.fs.read_to_string(Path::new(&path)) else {
            debug!("cannot read {}", path);
            return 0;
        };
        content
            .lines()
            .filter(|line| parse_cpu_line(line).is_some())
            .count()
    }

    /// Re-reads `/proc/stat` into `slots` in place.
    ///
    /// All slots are zero-filled first, so a core line that is missing or
    /// malformed this cycle leaves a zeroed slot (which downstream turns
    /// into a withheld utilization value) instead of data from two cycles
    /// ago. A line is committed only when it parses to exactly
    /// [`NUM_CPU_FIELDS`] integers and its index is within bounds; bad
    /// lines are skipped without aborting the read. `slots` is never
    /// resized.
    pub fn read_cpu_times(&self, slots: &mut [CpuTimes]) {
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.core = i;
            slot.values = [0; NUM_CPU_FIELDS];
        }
        let path = format!("{}/stat", self.proc_path);
        let Ok(content) = self.fs.read_to_string(Path::new(&path)) else {
            debug!("cannot read {}", path);
            return;
        };
        for line in content.lines() {
            let Some((index, values)) = parse_cpu_line(line) else {
                continue;
            };
            if index >= slots.len() {
                debug!("skipping out-of-range core line: {}", line);
                continue;
            }
            slots[index].values = values;
        }
    }

    /// Reads scheduling state and assigned core for one process.
    ///
    /// Returns a `NotFound` sample when the stat file cannot be opened
    /// (the process exited). Fields are located by counting
    /// whitespace-delimited words from the line start, because the comm
    /// field may contain embedded whitespace inside parentheses and must
    /// not anchor the parse.
    pub fn read_process_sample(&self, pid: i32) -> ProcessSample {
        let path = format!("{}/{}/stat", self.proc_path, pid);
        let Ok(content) = self.fs.read_to_string(Path::new(&path)) else {
            return ProcessSample::not_found(pid);
        };
        let line = content.lines().next().unwrap_or("");
        let state_field = nth_word(line, STATE_WORD_SKIP);
        let Some(state_char) = state_field.chars().next() else {
            debug!("bad line in {}: missing state column", path);
            return ProcessSample::not_found(pid);
        };
        let state = ProcState::from_char(state_char);
        let core_field = nth_word(state_field, CORE_WORD_SKIP);
        let core = core_field
            .split_whitespace()
            .next()
            .and_then(|word| word.parse::<u32>().ok());
        if core.is_none() {
            debug!("bad line in {}: missing CPU column", path);
        }
        ProcessSample { pid, state, core }
    }

    /// Lists pids currently present under the proc path: entries whose
    /// name is entirely decimal digits and which contain a `stat` file.
    /// Order is filesystem-enumeration order and must not be relied on.
    pub fn list_process_ids(&self) -> Vec<i32> {
        let Ok(entries) = self.fs.read_dir(Path::new(&self.proc_path)) else {
            debug!("cannot list {}", self.proc_path);
            return Vec::new();
        };
        let mut pids = Vec::new();
        for entry in entries {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if !self.fs.exists(&entry.join("stat")) {
                continue;
            }
            if let Ok(pid) = name.parse::<i32>() {
                pids.push(pid);
            }
        }
        pids
    }
}

/// Parses one `/proc/stat` line of the form
/// `cpu<index> v0 v1 ... v9`.
///
/// Returns `None` for the aggregate `cpu ` line, for non-cpu lines, and
/// for lines that do not yield exactly [`NUM_CPU_FIELDS`] counters.
fn parse_cpu_line(line: &str) -> Option<(usize, [u64; NUM_CPU_FIELDS])> {
    let rest = line.strip_prefix("cpu")?;
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let mut words = rest.split_whitespace();
    let index: usize = words.next()?.parse().ok()?;
    let mut values = [0u64; NUM_CPU_FIELDS];
    for slot in values.iter_mut() {
        *slot = words.next()?.parse().ok()?;
    }
    Some((index, values))
}
