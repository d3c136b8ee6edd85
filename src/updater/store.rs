use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::env;

/// Local cache of the last successfully installed payload version.
#[derive(Clone, Debug)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored version string, or `""` when the file is
    /// absent or unreadable. Never errors: an unknown local version just
    /// means the next check downloads.
    pub fn get_local_version(&self) -> String {
        fs::read_to_string(&self.path)
            .map(|raw| raw.trim().to_owned())
            .unwrap_or_default()
    }

    /// Overwrite the stored version. Failure is logged and reported, not
    /// fatal: the payload itself is already on disk at that point.
    pub fn write_local_version(&self, version: &str) -> bool {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("version store: unable to create {}: {err}", parent.display());
                return false;
            }
        }
        match fs::write(&self.path, version.as_bytes()) {
            Ok(()) => true,
            Err(err) => {
                warn!("version store: unable to persist version: {err}");
                false
            }
        }
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new(env::version_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VersionStore::new(tmp.path().join("version.txt"));
        assert_eq!(store.get_local_version(), "");
    }

    #[test]
    fn write_then_read_trims_whitespace() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VersionStore::new(tmp.path().join("version.txt"));
        assert!(store.write_local_version("2024.01.01\n"));
        assert_eq!(store.get_local_version(), "2024.01.01");
    }

    #[test]
    fn write_creates_missing_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VersionStore::new(tmp.path().join("nested").join("version.txt"));
        assert!(store.write_local_version("1"));
        assert_eq!(store.get_local_version(), "1");
    }
}
