//! Removal of the `check` configuration file when the invocation ends.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

/// Removes its file when dropped, unless `keep` is set.
///
/// Dropping happens on every exit path of the owning scope, errors included.
#[derive(Debug)]
pub struct TransientConfig {
    path: PathBuf,
    keep: bool,
}

impl TransientConfig {
    pub fn new(path: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            path: path.into(),
            keep,
        }
    }
}

impl Drop for TransientConfig {
    fn drop(&mut self) {
        if self.keep {
            debug!(config = %self.path.display(), "configuration file kept");
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(config = %self.path.display(), "configuration file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(config = %self.path.display(), error = %e, "could not remove configuration file")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nvd.json");
        std::fs::write(&path, "{}").unwrap();
        drop(TransientConfig::new(&path, false));
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_when_requested() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nvd.json");
        std::fs::write(&path, "{}").unwrap();
        drop(TransientConfig::new(&path, true));
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempdir().unwrap();
        drop(TransientConfig::new(dir.path().join("gone.json"), false));
    }
}
