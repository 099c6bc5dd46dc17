//! Samplers own the read-and-distribute step of one iteration.
//!
//! Each sampler keeps an ordered list of acceptors per event kind it can
//! produce. Registration order is delivery order, and fan-out is per-event:
//! every acceptor sees an event before the next event of the batch is
//! produced. Acceptors are shared with the driver's consumer list, so they
//! are held as `Rc<RefCell<_>>`; everything runs on the single loop thread.

mod cpu;
mod process;

pub use cpu::CpuSampler;
pub use process::ProcessSampler;

use crate::model::{CpuIdentity, CpuTimes, CpuUtil, ProcessSample};

/// Lifecycle of a sampler, driven by the runner.
///
/// `init` runs once before the loop starts and may already deliver events
/// (core identities, the initial counter snapshot). `update` runs once per
/// iteration between the consumers' begin/end boundaries.
pub trait Sampler {
    fn init(&mut self);
    fn update(&mut self);
    fn finish(&mut self) {}
}

/// Receives static core identities, delivered once at startup.
pub trait CpuIdentityAcceptor {
    fn accept_identity(&mut self, value: &CpuIdentity, last_in_batch: bool);
}

/// Receives raw counter snapshots, delivered at init and on every update.
pub trait CpuTimesAcceptor {
    fn accept_times(&mut self, value: &CpuTimes, last_in_batch: bool);
}

/// Receives computed per-interval utilization values.
///
/// `last_in_batch` marks the last core delivered this iteration; consumers
/// that render one row per iteration flush on it.
pub trait CpuUtilAcceptor {
    fn accept_util(&mut self, value: &CpuUtil, last_in_batch: bool);
}

/// Receives per-process samples.
///
/// `last_in_batch` here marks the last *acceptor in the registration list*
/// for each pid, not the last pid: every pid is its own mini-batch across
/// consumers. This deliberately differs from the CPU utilization flag.
pub trait ProcessSampleAcceptor {
    fn accept_process(&mut self, value: &ProcessSample, last_in_batch: bool);
}
