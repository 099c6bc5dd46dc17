//! corestat - Periodic CPU utilization and process core-assignment sampler.
//!
//! Reads per-core counters from `/proc/stat` and per-process scheduling
//! state from `/proc/<pid>/stat` on a fixed interval, and distributes each
//! sample to the registered consumers (stdout table, CSV writers).

pub mod collector;
pub mod consumer;
pub mod model;
pub mod runner;
pub mod sampler;
pub mod settings;
pub mod util;
