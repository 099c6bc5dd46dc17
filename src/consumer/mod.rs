//! Output sinks for sampled events.
//!
//! Every consumer follows the same 4-phase lifecycle, driven by the runner
//! in lockstep with the samplers. A consumer additionally implements the
//! acceptor traits (see [`crate::sampler`]) for the event kinds it renders.

mod csv;
mod table;

pub use csv::{CpuUtilCsvWriter, CsvSettings, ProcessCsvWriter};
pub use table::{Table, TableSettings};

/// Consumer lifecycle.
pub trait Consumer {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Prepares the sink (e.g. opens a file). Returning `false` disables
    /// this consumer only; the rest of the pipeline proceeds.
    fn start(&mut self) -> bool;

    /// Called at the start of every iteration, before sampler updates:
    /// snapshot the timestamp, clear per-iteration accumulation.
    fn begin_iter(&mut self);

    /// Called at the end of every iteration, after sampler updates: flush
    /// whatever this iteration accumulated.
    fn end_iter(&mut self);

    /// Releases resources once the loop has stopped.
    fn finish(&mut self);
}
