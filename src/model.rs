//! Typed records produced by the collector and samplers.

use std::fmt;

/// Number of cumulative time counters on a `/proc/stat` cpu line.
pub const NUM_CPU_FIELDS: usize = 10;

/// Index of the `idle` counter within [`CpuTimes::values`].
pub const IDLE_FIELD: usize = 3;

/// Static identity of one logical core, discovered once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuIdentity {
    /// Dense 0-based core index.
    pub core: usize,
    /// Human-readable label, e.g. `cpu0`.
    pub label: String,
}

/// Cumulative time counters for one core at one instant.
///
/// The counters are, in order: user, nice, system, idle, iowait, irq,
/// softirq, steal, guest, guest_nice. All are monotonically non-decreasing
/// under normal kernel behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub core: usize,
    pub values: [u64; NUM_CPU_FIELDS],
}

impl CpuTimes {
    /// Per-field delta against an earlier snapshot.
    ///
    /// Saturating: a counter reset (wraparound) yields 0 for the affected
    /// field for one cycle instead of a huge bogus delta.
    pub fn delta(&self, prev: &CpuTimes) -> [u64; NUM_CPU_FIELDS] {
        let mut out = [0u64; NUM_CPU_FIELDS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.values[i].saturating_sub(prev.values[i]);
        }
        out
    }
}

/// Per-interval utilization of one core, recomputed each cycle.
///
/// `busy + idle == 1` by construction whenever a value is produced at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuUtil {
    pub core: usize,
    pub busy: f64,
    pub idle: f64,
}

/// Scheduling state of a process, from the state character in
/// `/proc/<pid>/stat`.
///
/// `NotFound` is produced when the stat file cannot be opened (the process
/// exited); `Unknown` when the state character is unrecognized. They are
/// distinct signals, not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Running,
    Sleeping,
    Waiting,
    Zombie,
    Stopped,
    TracingStop,
    Dead,
    WakeKill,
    WakingPaging,
    Parked,
    NotFound,
    Unknown,
}

impl ProcState {
    /// Fixed mapping from the kernel state character.
    pub fn from_char(c: char) -> ProcState {
        match c {
            'R' => ProcState::Running,
            'S' => ProcState::Sleeping,
            'D' => ProcState::Waiting,
            'Z' => ProcState::Zombie,
            'T' => ProcState::Stopped,
            't' => ProcState::TracingStop,
            'W' => ProcState::WakingPaging,
            'X' | 'x' => ProcState::Dead,
            'K' => ProcState::WakeKill,
            'P' => ProcState::Parked,
            _ => ProcState::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcState::Running => "running",
            ProcState::Sleeping => "sleeping",
            ProcState::Waiting => "waiting",
            ProcState::Zombie => "zombie",
            ProcState::Stopped => "stopped",
            ProcState::TracingStop => "tracing_stop",
            ProcState::Dead => "dead",
            ProcState::WakeKill => "wakekill",
            ProcState::WakingPaging => "waking or paging",
            ProcState::Parked => "parked",
            ProcState::NotFound => "not found",
            ProcState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One per-iteration observation of a tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSample {
    pub pid: i32,
    pub state: ProcState,
    /// Core the process was last scheduled on. `None` when the process was
    /// not found or the field could not be parsed.
    pub core: Option<u32>,
}

impl ProcessSample {
    pub fn not_found(pid: i32) -> ProcessSample {
        ProcessSample {
            pid,
            state: ProcState::NotFound,
            core: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_char_mapping() {
        assert_eq!(ProcState::from_char('R'), ProcState::Running);
        assert_eq!(ProcState::from_char('S'), ProcState::Sleeping);
        assert_eq!(ProcState::from_char('D'), ProcState::Waiting);
        assert_eq!(ProcState::from_char('Z'), ProcState::Zombie);
        assert_eq!(ProcState::from_char('T'), ProcState::Stopped);
        assert_eq!(ProcState::from_char('t'), ProcState::TracingStop);
        assert_eq!(ProcState::from_char('W'), ProcState::WakingPaging);
        assert_eq!(ProcState::from_char('X'), ProcState::Dead);
        assert_eq!(ProcState::from_char('x'), ProcState::Dead);
        assert_eq!(ProcState::from_char('K'), ProcState::WakeKill);
        assert_eq!(ProcState::from_char('P'), ProcState::Parked);
        assert_eq!(ProcState::from_char('?'), ProcState::Unknown);
        assert_eq!(ProcState::from_char('r'), ProcState::Unknown);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(ProcState::Running.label(), "running");
        assert_eq!(ProcState::WakingPaging.label(), "waking or paging");
        assert_eq!(ProcState::NotFound.label(), "not found");
        assert_eq!(ProcState::TracingStop.to_string(), "tracing_stop");
    }

    #[test]
    fn test_delta_per_field() {
        let prev = CpuTimes {
            core: 0,
            values: [100, 0, 100, 200, 0, 0, 0, 0, 0, 0],
        };
        let curr = CpuTimes {
            core: 0,
            values: [110, 0, 105, 210, 0, 0, 0, 0, 0, 0],
        };
        let d = curr.delta(&prev);
        assert_eq!(d, [10, 0, 5, 10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(d.iter().sum::<u64>(), 25);
    }

    #[test]
    fn test_delta_saturates_on_counter_reset() {
        let prev = CpuTimes {
            core: 0,
            values: [100; NUM_CPU_FIELDS],
        };
        let curr = CpuTimes {
            core: 0,
            values: [50; NUM_CPU_FIELDS],
        };
        assert_eq!(curr.delta(&prev), [0; NUM_CPU_FIELDS]);
    }
}
