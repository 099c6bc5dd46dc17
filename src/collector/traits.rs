//! Filesystem abstraction so the reader can run against the real `/proc`
//! or an in-memory mock in tests and on non-Linux hosts.

use std::io;
use std::path::{Path, PathBuf};

/// Minimal filesystem surface needed by [`super::ProcReader`].
pub trait FileSystem: Send {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        let content = fs.read_to_string(&cargo_toml).unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn test_real_fs_exists() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        assert!(fs.exists(&cargo_toml));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let fs = RealFs::new();
        let src_dir = env::current_dir().unwrap().join("src");
        assert!(!fs.read_dir(&src_dir).unwrap().is_empty());
    }
}
