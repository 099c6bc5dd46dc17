//! Per-core utilization sampling over double-buffered counter snapshots.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::collector::{FileSystem, ProcReader};
use crate::model::{CpuIdentity, CpuTimes, CpuUtil};

use super::{CpuIdentityAcceptor, CpuTimesAcceptor, CpuUtilAcceptor, Sampler};

/// Samples `/proc/stat` and distributes identity, raw-counter and
/// utilization events.
///
/// Counter snapshots live in two fixed-size buffers whose roles alternate
/// each cycle; the previous buffer is only overwritten after the delta that
/// needed it has been computed and delivered.
pub struct CpuSampler<F: FileSystem> {
    reader: ProcReader<F>,
    identities: Vec<CpuIdentity>,
    buffers: [Vec<CpuTimes>; 2],
    /// Index of the "current" buffer within `buffers`.
    current: usize,
    identity_acceptors: Vec<Rc<RefCell<dyn CpuIdentityAcceptor>>>,
    times_acceptors: Vec<Rc<RefCell<dyn CpuTimesAcceptor>>>,
    util_acceptors: Vec<Rc<RefCell<dyn CpuUtilAcceptor>>>,
}

impl<F: FileSystem> CpuSampler<F> {
    pub fn new(reader: ProcReader<F>) -> Self {
        Self {
            reader,
            identities: Vec::new(),
            buffers: [Vec::new(), Vec::new()],
            current: 0,
            identity_acceptors: Vec::new(),
            times_acceptors: Vec::new(),
            util_acceptors: Vec::new(),
        }
    }

    pub fn add_identity_acceptor(&mut self, acceptor: Rc<RefCell<dyn CpuIdentityAcceptor>>) {
        self.identity_acceptors.push(acceptor);
    }

    pub fn add_times_acceptor(&mut self, acceptor: Rc<RefCell<dyn CpuTimesAcceptor>>) {
        self.times_acceptors.push(acceptor);
    }

    pub fn add_util_acceptor(&mut self, acceptor: Rc<RefCell<dyn CpuUtilAcceptor>>) {
        self.util_acceptors.push(acceptor);
    }

    fn dispatch_identities(&self) {
        let count = self.identities.len();
        for (i, identity) in self.identities.iter().enumerate() {
            let last = i + 1 == count;
            for acceptor in &self.identity_acceptors {
                acceptor.borrow_mut().accept_identity(identity, last);
            }
        }
    }

    fn dispatch_times(&self) {
        let snapshot = &self.buffers[self.current];
        let count = snapshot.len();
        for (i, times) in snapshot.iter().enumerate() {
            let last = i + 1 == count;
            for acceptor in &self.times_acceptors {
                acceptor.borrow_mut().accept_times(times, last);
            }
        }
    }

    fn dispatch_utils(&self, utils: &[CpuUtil]) {
        let count = utils.len();
        for (i, util) in utils.iter().enumerate() {
            let last = i + 1 == count;
            for acceptor in &self.util_acceptors {
                acceptor.borrow_mut().accept_util(util, last);
            }
        }
    }

    fn current_and_previous(&self) -> (&Vec<CpuTimes>, &Vec<CpuTimes>) {
        let (left, right) = self.buffers.split_at(1);
        if self.current == 0 {
            (&left[0], &right[0])
        } else {
            (&right[0], &left[0])
        }
    }
}

impl<F: FileSystem> Sampler for CpuSampler<F> {
    /// Discovers core identities, sizes both buffers and reads the first
    /// snapshot. No utilization is computable yet (there is no previous
    /// snapshot); identity events are delivered here and never again.
    fn init(&mut self) {
        let n = self.reader.count_cpu_cores();
        debug!("discovered {} cpu cores", n);
        self.identities = (0..n)
            .map(|core| CpuIdentity {
                core,
                label: format!("cpu{}", core),
            })
            .collect();
        for buffer in &mut self.buffers {
            buffer.clear();
            buffer.resize(n, CpuTimes::default());
        }
        self.reader.read_cpu_times(&mut self.buffers[self.current]);

        self.dispatch_identities();
        self.dispatch_times();
    }

    /// Swaps buffer roles, reads a fresh snapshot and delivers raw-counter
    /// events, then one utilization event per computable core in ascending
    /// core order. A core whose total delta is zero is withheld for this
    /// cycle rather than divided by zero. The last delivered utilization
    /// event carries the end-of-batch flag.
    fn update(&mut self) {
        // The old previous buffer becomes current; its contents were
        // consumed by last cycle's delta and may be overwritten now.
        self.current = 1 - self.current;
        self.reader.read_cpu_times(&mut self.buffers[self.current]);
        self.dispatch_times();

        let (current, previous) = self.current_and_previous();
        let mut utils = Vec::with_capacity(current.len());
        for (curr, prev) in current.iter().zip(previous.iter()) {
            let delta = curr.delta(prev);
            let total: u64 = delta.iter().sum();
            if total == 0 {
                debug!("zero counter delta for core {}, withholding", curr.core);
                continue;
            }
            let idle_delta = delta[crate::model::IDLE_FIELD];
            let busy = (total - idle_delta) as f64 / total as f64;
            let idle = idle_delta as f64 / total as f64;
            utils.push(CpuUtil {
                core: curr.core,
                busy,
                idle,
            });
        }
        self.dispatch_utils(&utils);
    }
}
