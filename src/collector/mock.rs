//! In-memory filesystem for tests and for running on non-Linux hosts.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use super::traits::FileSystem;

/// Mock filesystem holding file contents in a map.
///
/// A path is treated as a directory when some stored file lives beneath it.
#[derive(Debug, Default, Clone)]
pub struct MockFs {
    files: BTreeMap<PathBuf, String>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Removes a file, e.g. to simulate a process exiting mid-run.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|k| k.parent().is_some_and(|parent| parent.starts_with(path)))
    }

    /// A two-core system with one running and one sleeping process.
    ///
    /// Counters are chosen so that a second read after
    /// [`MockFs::advance_two_core_system`] gives core0 busy=0.60 and
    /// core1 busy=0.20.
    pub fn two_core_system() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/stat",
            "cpu  210 0 205 410 0 0 0 0 0 0\n\
             cpu0 100 0 100 200 0 0 0 0 0 0\n\
             cpu1 110 0 105 210 0 0 0 0 0 0\n\
             intr 12345 0 0\n\
             ctxt 500000\n",
        );
        fs.add_file(
            "/proc/101/stat",
            "101 (loop) R 1 101 101 0 -1 4194304 100 0 0 0 5 3 0 0 20 0 1 0 \
             400 10000000 250 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 \
             17 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n",
        );
        // Both comm values are single words: a space inside the
        // parentheses shifts positional field counting.
        fs.add_file(
            "/proc/202/stat",
            "202 (idleworker) S 1 202 202 0 -1 4194304 100 0 0 0 5 3 0 0 20 0 1 0 \
             400 10000000 250 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 \
             17 1 0 0 0 0 0 0 0 0 0 0 0 0 0\n",
        );
        fs
    }

    /// Replaces `/proc/stat` with the "one interval later" counters for
    /// [`MockFs::two_core_system`].
    pub fn advance_two_core_system(&mut self) {
        self.add_file(
            "/proc/stat",
            "cpu  221 0 211 428 0 0 0 0 0 0\n\
             cpu0 110 0 105 210 0 0 0 0 0 0\n\
             cpu1 111 0 106 218 0 0 0 0 0 0\n\
             intr 12399 0 0\n\
             ctxt 500100\n",
        );
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.is_dir(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}", path.display()),
            ));
        }
        let mut entries: Vec<PathBuf> = Vec::new();
        for key in self.files.keys() {
            let Ok(rest) = key.strip_prefix(path) else {
                continue;
            };
            if let Some(first) = rest.components().next() {
                let child = path.join(first);
                if !entries.contains(&child) {
                    entries.push(child);
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file_is_not_found() {
        let fs = MockFs::new();
        let err = fs.read_to_string(Path::new("/proc/stat")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_exists_for_files_and_dirs() {
        let fs = MockFs::two_core_system();
        assert!(fs.exists(Path::new("/proc/stat")));
        assert!(fs.exists(Path::new("/proc/101")));
        assert!(fs.exists(Path::new("/proc")));
        assert!(!fs.exists(Path::new("/proc/999")));
    }

    #[test]
    fn test_read_dir_lists_immediate_children() {
        let fs = MockFs::two_core_system();
        let mut entries = fs.read_dir(Path::new("/proc")).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/proc/101"),
                PathBuf::from("/proc/202"),
                PathBuf::from("/proc/stat"),
            ]
        );
    }

    #[test]
    fn test_remove_file() {
        let mut fs = MockFs::two_core_system();
        fs.remove_file("/proc/101/stat");
        assert!(!fs.exists(Path::new("/proc/101/stat")));
    }
}
