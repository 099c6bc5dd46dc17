//! Line-oriented table renderer for interactive use.

use std::io::Write;

use tracing::warn;

use crate::model::{CpuIdentity, CpuUtil, ProcessSample};
use crate::sampler::{CpuIdentityAcceptor, CpuUtilAcceptor, ProcessSampleAcceptor};
use crate::util::iso_time_ms;

use super::Consumer;

const TIME_WIDTH: usize = 14;
const PID_WIDTH: usize = 8;
const CPU_WIDTH: usize = 9;
const STATUS_WIDTH: usize = 16;

/// Cosmetic and content switches for the table.
#[derive(Debug, Clone)]
pub struct TableSettings {
    pub show_heading: bool,
    pub show_divider: bool,
    pub show_outer_delims: bool,
    pub show_cpu_stats: bool,
    pub show_pid_stats: bool,
    pub delim: char,
    pub num_cpus: usize,
    /// Render utilization as a fraction in [0,1] instead of a percentage.
    pub normalize_cpu_util: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            show_heading: true,
            show_divider: true,
            show_outer_delims: false,
            show_cpu_stats: true,
            show_pid_stats: false,
            delim: '|',
            num_cpus: 0,
            normalize_cpu_util: false,
        }
    }
}

struct Col {
    head: String,
    width: usize,
}

/// Accumulates one cell per column for the current visual row and prints
/// the row when it is flagged complete: the CPU summary row on the
/// last-core utilization event, process rows immediately.
///
/// Columns are fixed at construction: timestamp, optional PID, one column
/// per core, optional process status. Unfilled cells render as blank
/// padding of the column's width.
pub struct Table<W: Write> {
    settings: TableSettings,
    columns: Vec<Col>,
    row: Vec<Option<String>>,
    empty_row: bool,
    out: W,
}

impl<W: Write> Table<W> {
    pub fn new(settings: TableSettings, out: W) -> Self {
        let mut columns = Vec::new();
        columns.push(Col {
            head: "Timestamp".to_string(),
            width: TIME_WIDTH,
        });
        if settings.show_pid_stats {
            columns.push(Col {
                head: "PID".to_string(),
                width: PID_WIDTH,
            });
        }
        for i in 0..settings.num_cpus {
            columns.push(Col {
                head: format!("cpu{}", i),
                width: CPU_WIDTH,
            });
        }
        if settings.show_pid_stats {
            columns.push(Col {
                head: "Proc.status".to_string(),
                width: STATUS_WIDTH,
            });
        }
        let row = vec![None; columns.len()];
        Self {
            settings,
            columns,
            row,
            empty_row: true,
            out,
        }
    }

    fn pid_col(&self) -> usize {
        1
    }

    fn cpu_col(&self, core: usize) -> Option<usize> {
        if core >= self.settings.num_cpus {
            return None;
        }
        let base = if self.settings.show_pid_stats { 2 } else { 1 };
        Some(base + core)
    }

    fn status_col(&self) -> usize {
        self.columns.len() - 1
    }

    fn set_cell(&mut self, col: usize, value: String) {
        self.row[col] = Some(value);
        self.empty_row = false;
    }

    fn print_row(&mut self) {
        if self.empty_row {
            return;
        }
        let mut line = String::new();
        if self.settings.show_outer_delims {
            line.push(self.settings.delim);
        }
        for i in 0..self.row.len() {
            match self.row[i].take() {
                Some(value) => line.push_str(&value),
                None => line.push_str(&" ".repeat(self.columns[i].width)),
            }
            if self.settings.show_outer_delims || i + 1 < self.row.len() {
                line.push(self.settings.delim);
            }
        }
        let _ = writeln!(self.out, "{}", line);
        self.empty_row = true;
    }

    fn print_divider(&mut self) {
        let mut line = String::new();
        if self.settings.show_outer_delims {
            line.push(self.settings.delim);
        }
        for (i, col) in self.columns.iter().enumerate() {
            line.push_str(&"-".repeat(col.width));
            if self.settings.show_outer_delims || i + 1 < self.columns.len() {
                line.push('+');
            }
        }
        let _ = writeln!(self.out, "{}", line);
    }
}

impl<W: Write> Consumer for Table<W> {
    fn name(&self) -> &'static str {
        "table"
    }

    fn start(&mut self) -> bool {
        if self.settings.show_heading {
            for i in 0..self.columns.len() {
                let cell = format!("{:^1$}", self.columns[i].head, self.columns[i].width);
                self.set_cell(i, cell);
            }
            self.print_row();
            if self.settings.show_divider {
                self.print_divider();
            }
        }
        true
    }

    fn begin_iter(&mut self) {
        let width = self.columns[0].width;
        let cell = format!(" {:<1$}", iso_time_ms(), width - 1);
        self.set_cell(0, cell);
    }

    fn end_iter(&mut self) {
        self.print_row();
        if self.settings.show_divider {
            self.print_divider();
        }
    }

    fn finish(&mut self) {
        let _ = self.out.flush();
    }
}

impl<W: Write> CpuIdentityAcceptor for Table<W> {
    fn accept_identity(&mut self, _value: &CpuIdentity, _last_in_batch: bool) {
        // Core identities do not change the fixed column layout.
    }
}

impl<W: Write> CpuUtilAcceptor for Table<W> {
    fn accept_util(&mut self, value: &CpuUtil, last_in_batch: bool) {
        if !self.settings.show_cpu_stats {
            return;
        }
        let Some(col) = self.cpu_col(value.core) else {
            warn!("bad CPU number {}", value.core);
            return;
        };
        let text = if self.settings.normalize_cpu_util {
            format!("{:>7.5}", value.busy)
        } else {
            format!("{:>6.2}%", value.busy * 100.0)
        };
        let width = self.columns[col].width;
        let cell = format!("{:^1$}", text, width);
        self.set_cell(col, cell);
        if last_in_batch {
            self.print_row();
        }
    }
}

impl<W: Write> ProcessSampleAcceptor for Table<W> {
    fn accept_process(&mut self, value: &ProcessSample, _last_in_batch: bool) {
        if !self.settings.show_pid_stats {
            return;
        }
        let pid_cell = format!("{:^1$}", value.pid, PID_WIDTH);
        self.set_cell(self.pid_col(), pid_cell);
        if let Some(core) = value.core {
            match self.cpu_col(core as usize) {
                Some(col) => {
                    let width = self.columns[col].width;
                    let mark = format!("{:^1$}", "x", width);
                    self.set_cell(col, mark);
                }
                None => warn!("bad CPU number {}", core),
            }
        }
        let status_cell = format!(" {:<1$}", value.state.label(), STATUS_WIDTH - 1);
        self.set_cell(self.status_col(), status_cell);
        self.print_row();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcState;

    fn output(table: &Table<Vec<u8>>) -> String {
        String::from_utf8(table.out.clone()).unwrap()
    }

    fn bare(num_cpus: usize, show_pid_stats: bool) -> Table<Vec<u8>> {
        Table::new(
            TableSettings {
                show_heading: false,
                show_divider: false,
                show_pid_stats,
                num_cpus,
                ..TableSettings::default()
            },
            Vec::new(),
        )
    }

    #[test]
    fn test_heading_and_divider_printed_once_at_start() {
        let mut table = Table::new(
            TableSettings {
                num_cpus: 2,
                ..TableSettings::default()
            },
            Vec::new(),
        );
        assert!(table.start());
        let out = output(&table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "  Timestamp   |  cpu0   |  cpu1   ");
        assert_eq!(lines[1], "--------------+---------+---------");
    }

    #[test]
    fn test_row_flushes_only_on_end_of_batch_flag() {
        let mut table = bare(3, false);
        assert!(table.start());
        table.begin_iter();
        let utils = [
            CpuUtil { core: 0, busy: 0.5, idle: 0.5 },
            CpuUtil { core: 1, busy: 0.25, idle: 0.75 },
            CpuUtil { core: 2, busy: 1.0, idle: 0.0 },
        ];
        table.accept_util(&utils[0], false);
        table.accept_util(&utils[1], false);
        assert!(output(&table).is_empty(), "partial deliveries print nothing");
        table.accept_util(&utils[2], true);
        let out = output(&table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        let cells: Vec<&str> = lines[0].split('|').collect();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1], "  50.00% ");
        assert_eq!(cells[2], "  25.00% ");
        assert_eq!(cells[3], " 100.00% ");
    }

    #[test]
    fn test_normalized_rendering() {
        let mut table = Table::new(
            TableSettings {
                show_heading: false,
                show_divider: false,
                num_cpus: 1,
                normalize_cpu_util: true,
                ..TableSettings::default()
            },
            Vec::new(),
        );
        table.begin_iter();
        table.accept_util(
            &CpuUtil {
                core: 0,
                busy: 0.6,
                idle: 0.4,
            },
            true,
        );
        let out = output(&table);
        assert!(out.contains("0.60000"), "got: {}", out);
    }

    #[test]
    fn test_process_row_marks_assigned_core_and_prints_immediately() {
        let mut table = bare(2, true);
        table.begin_iter();
        table.accept_process(
            &ProcessSample {
                pid: 101,
                state: ProcState::Running,
                core: Some(1),
            },
            true,
        );
        let out = output(&table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        let cells: Vec<&str> = lines[0].split('|').collect();
        // timestamp, pid, cpu0, cpu1, status
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[1].trim(), "101");
        assert_eq!(cells[2].trim(), "");
        assert_eq!(cells[3].trim(), "x");
        assert_eq!(cells[4].trim(), "running");
    }

    #[test]
    fn test_not_found_row_has_no_core_mark() {
        let mut table = bare(2, true);
        table.begin_iter();
        table.accept_process(&ProcessSample::not_found(999), true);
        let out = output(&table);
        let cells: Vec<&str> = out.lines().next().unwrap().split('|').collect();
        assert_eq!(cells[2].trim(), "");
        assert_eq!(cells[3].trim(), "");
        assert_eq!(cells[4].trim(), "not found");
    }

    #[test]
    fn test_out_of_range_core_is_skipped() {
        let mut table = bare(2, true);
        table.begin_iter();
        table.accept_process(
            &ProcessSample {
                pid: 7,
                state: ProcState::Running,
                core: Some(9),
            },
            true,
        );
        let out = output(&table);
        let cells: Vec<&str> = out.lines().next().unwrap().split('|').collect();
        assert_eq!(cells[2].trim(), "");
        assert_eq!(cells[3].trim(), "");
        assert_eq!(cells[4].trim(), "running");
    }

    #[test]
    fn test_end_iter_flushes_leftover_timestamp_row() {
        let mut table = bare(1, false);
        table.begin_iter();
        table.end_iter();
        let out = output(&table);
        assert_eq!(out.lines().count(), 1);
        // A second end_iter with nothing accumulated prints nothing.
        table.end_iter();
        assert_eq!(output(&table).lines().count(), 1);
    }

    #[test]
    fn test_disabled_cpu_stats_ignores_util_events() {
        let mut table = Table::new(
            TableSettings {
                show_heading: false,
                show_divider: false,
                show_cpu_stats: false,
                num_cpus: 1,
                ..TableSettings::default()
            },
            Vec::new(),
        );
        table.accept_util(
            &CpuUtil {
                core: 0,
                busy: 0.5,
                idle: 0.5,
            },
            true,
        );
        assert!(output(&table).is_empty());
    }

    #[test]
    fn test_outer_delims_wrap_the_row() {
        let mut table = Table::new(
            TableSettings {
                show_heading: false,
                show_divider: false,
                show_outer_delims: true,
                num_cpus: 1,
                ..TableSettings::default()
            },
            Vec::new(),
        );
        table.begin_iter();
        table.end_iter();
        let out = output(&table);
        let line = out.lines().next().unwrap();
        assert!(line.starts_with('|'));
        assert!(line.ends_with('|'));
    }
}
