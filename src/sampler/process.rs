//! Per-process scheduling-state sampling.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::collector::{FileSystem, ProcReader};

use super::{ProcessSampleAcceptor, Sampler};

/// Samples `/proc/<pid>/stat` for a configured or discovered set of pids.
///
/// With `track_all` set, the pid set is rediscovered every iteration and may
/// grow or shrink; a process that vanished surfaces as a `NotFound` sample
/// on the next read, never as an error.
pub struct ProcessSampler<F: FileSystem> {
    reader: ProcReader<F>,
    pids: Vec<i32>,
    track_all: bool,
    acceptors: Vec<Rc<RefCell<dyn ProcessSampleAcceptor>>>,
}

impl<F: FileSystem> ProcessSampler<F> {
    pub fn new(reader: ProcReader<F>) -> Self {
        Self {
            reader,
            pids: Vec::new(),
            track_all: false,
            acceptors: Vec::new(),
        }
    }

    pub fn add_pid(&mut self, pid: i32) {
        self.pids.push(pid);
    }

    pub fn set_track_all(&mut self, enabled: bool) {
        self.track_all = enabled;
    }

    pub fn track_all(&self) -> bool {
        self.track_all
    }

    pub fn add_acceptor(&mut self, acceptor: Rc<RefCell<dyn ProcessSampleAcceptor>>) {
        self.acceptors.push(acceptor);
    }
}

impl<F: FileSystem> Sampler for ProcessSampler<F> {
    /// Nothing to establish ahead of sampling.
    fn init(&mut self) {}

    /// Reads one sample per tracked pid and delivers it to every acceptor
    /// in registration order. The last acceptor in the list gets the
    /// end-of-batch flag for each pid: each pid is its own mini-batch
    /// across the consumer list.
    fn update(&mut self) {
        if self.track_all {
            self.pids = self.reader.list_process_ids();
            debug!("tracking {} processes", self.pids.len());
        }
        for &pid in &self.pids {
            let sample = self.reader.read_process_sample(pid);
            let count = self.acceptors.len();
            for (i, acceptor) in self.acceptors.iter().enumerate() {
                let last = i + 1 == count;
                acceptor.borrow_mut().accept_process(&sample, last);
            }
        }
    }
}
