//! Reading and parsing of kernel counter sources under `/proc`.

pub mod mock;
mod procfs;
mod traits;

pub use procfs::ProcReader;
pub use traits::{FileSystem, RealFs};
