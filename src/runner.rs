//! Fixed-interval sampling loop and its stop signal.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::consumer::Consumer;
use crate::sampler::Sampler;

/// Granularity of the interruptible interval wait.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Cancellation token shared between the loop thread and the signal
/// handler. The only cross-thread state in the program.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the loop to stop. The current iteration still completes;
    /// the request is observed at the next iteration boundary.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Sleeps for `interval` in slices, returning early once `stop` is set.
fn wait_interval(interval: Duration, stop: &StopToken) {
    let mut remaining = interval;
    while remaining > Duration::ZERO && !stop.is_stopped() {
        let slice = remaining.min(WAIT_SLICE);
        thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

/// Drives samplers and consumers in lockstep on a fixed interval.
///
/// Per iteration: wait, then `begin_iter` on every consumer, `update` on
/// every sampler (which delivers events into the consumers), `end_iter` on
/// every consumer. Lists are walked in registration order. A stop request
/// never interrupts an iteration in progress.
#[derive(Default)]
pub struct Runner {
    samplers: Vec<Box<dyn Sampler>>,
    consumers: Vec<Rc<RefCell<dyn Consumer>>>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sampler(&mut self, sampler: Box<dyn Sampler>) {
        self.samplers.push(sampler);
    }

    pub fn add_consumer(&mut self, consumer: Rc<RefCell<dyn Consumer>>) {
        self.consumers.push(consumer);
    }

    /// Runs the loop until `stop` is set.
    ///
    /// Samplers are initialized first (delivering core identities and the
    /// initial counter snapshot), then consumers start; one that fails to
    /// start is dropped with a log line while the rest proceed.
    pub fn run(&mut self, interval: Duration, stop: &StopToken) {
        for sampler in &mut self.samplers {
            sampler.init();
        }
        self.consumers.retain(|consumer| {
            let ok = consumer.borrow_mut().start();
            if !ok {
                warn!("consumer {} failed to start, disabled", consumer.borrow().name());
            }
            ok
        });

        loop {
            wait_interval(interval, stop);
            if stop.is_stopped() {
                break;
            }
            for consumer in &self.consumers {
                consumer.borrow_mut().begin_iter();
            }
            for sampler in &mut self.samplers {
                sampler.update();
            }
            for consumer in &self.consumers {
                consumer.borrow_mut().end_iter();
            }
        }

        debug!("loop stopped, finishing consumers");
        for consumer in &self.consumers {
            consumer.borrow_mut().finish();
        }
        for sampler in &mut self.samplers {
            sampler.finish();
        }
        info!("shutdown complete");
    }
}
