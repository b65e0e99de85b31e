//! Local store maintenance: refresh from the remote feed, or delete.
//!
//! Neither operation locks the store. Running `update`, `purge` and `check`
//! concurrently against the same data directory is unsupported.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::populate_settings;
use crate::document::Document;
use crate::engine::store::store_path;
use crate::engine::{self, Engine, EngineSession, LifecycleState};
use crate::error::NvdError;
use crate::settings::{Setting, Settings};

/// What `purge` found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    Removed(PathBuf),
    Absent(PathBuf),
}

/// Refresh the local store. No dependency scan takes place.
pub fn update(doc: &Document) -> Result<(), NvdError> {
    let settings = populate_settings(doc)?;
    let session = engine::create(settings)?;
    update_with(session)
}

pub fn update_with<E: Engine>(mut session: EngineSession<E>) -> Result<(), NvdError> {
    session.update_database().map_err(NvdError::Update)?;
    session.transition(LifecycleState::DatabaseOperationDone);
    session.cleanup();
    info!("vulnerability database updated");
    Ok(())
}

/// Delete the local store. A missing store is not an error.
pub fn purge(doc: &Document) -> Result<PurgeOutcome, NvdError> {
    let settings = populate_settings(doc)?;
    purge_store(settings)
}

/// Delete the store under the settings' data directory, consuming the settings.
pub fn purge_store(settings: Settings) -> Result<PurgeOutcome, NvdError> {
    let data_dir = settings.data_directory().ok_or_else(|| NvdError::ConfigField {
        field: Setting::DataDirectory.key().to_owned(),
        reason: "not set".to_owned(),
    })?;
    let path = store_path(&data_dir);

    let outcome = match std::fs::remove_file(&path) {
        Ok(()) => {
            info!(store = %path.display(), "local store deleted");
            PurgeOutcome::Removed(path.clone())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(store = %path.display(), "no local store to delete");
            PurgeOutcome::Absent(path.clone())
        }
        Err(source) => {
            return Err(NvdError::StoreAccess {
                path: path.display().to_string(),
                source,
            })
        }
    };

    // An interrupted update can leave its temp file behind.
    let tmp = path.with_extension("json.tmp");
    match std::fs::remove_file(&tmp) {
        Ok(()) => debug!(file = %tmp.display(), "stale temp store deleted"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => {
            return Err(NvdError::StoreAccess {
                path: tmp.display().to_string(),
                source,
            })
        }
    }

    drop(settings);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FailPoint, FakeEngine};
    use serde_json::json;
    use tempfile::tempdir;

    fn doc_for(dir: &std::path::Path) -> Document {
        Document::from_value(json!({ "nvd": { "data-directory": dir.display().to_string() } }))
            .unwrap()
    }

    #[test]
    fn test_purge_removes_existing_store() {
        let dir = tempdir().unwrap();
        let store = store_path(dir.path());
        std::fs::write(&store, "{}").unwrap();

        assert_eq!(purge(&doc_for(dir.path())).unwrap(), PurgeOutcome::Removed(store.clone()));
        assert!(!store.exists());
    }

    #[test]
    fn test_purge_twice_on_empty_directory() {
        let dir = tempdir().unwrap();
        let doc = doc_for(dir.path());
        let expected = PurgeOutcome::Absent(store_path(dir.path()));
        assert_eq!(purge(&doc).unwrap(), expected);
        assert_eq!(purge(&doc).unwrap(), expected);
    }

    #[test]
    fn test_purge_is_idempotent_after_removal() {
        let dir = tempdir().unwrap();
        std::fs::write(store_path(dir.path()), "{}").unwrap();
        let doc = doc_for(dir.path());
        assert!(matches!(purge(&doc).unwrap(), PurgeOutcome::Removed(_)));
        assert!(matches!(purge(&doc).unwrap(), PurgeOutcome::Absent(_)));
    }

    #[test]
    fn test_purge_unremovable_store_is_store_access_error() {
        let dir = tempdir().unwrap();
        // A directory where the store file should be cannot be removed with remove_file.
        std::fs::create_dir(store_path(dir.path())).unwrap();
        assert!(matches!(
            purge(&doc_for(dir.path())),
            Err(NvdError::StoreAccess { .. })
        ));
    }

    #[test]
    fn test_update_with_cleans_up_once() {
        let engine = FakeEngine::new();
        let recorder = engine.recorder.clone();
        update_with(EngineSession::new(engine)).unwrap();
        assert_eq!(recorder.updates.get(), 1);
        assert_eq!(recorder.closes.get(), 1);
    }

    #[test]
    fn test_update_failure_is_update_error_and_cleans_up() {
        let engine = FakeEngine::failing_on(FailPoint::Update);
        let recorder = engine.recorder.clone();
        let err = update_with(EngineSession::new(engine)).unwrap_err();
        assert!(matches!(err, NvdError::Update(_)));
        assert_eq!(recorder.closes.get(), 1);
    }

    #[test]
    fn test_update_from_local_mirror() {
        let dir = tempdir().unwrap();
        let feed = dir.path().join("feed.json");
        std::fs::write(&feed, r#"[{"id": "CVE-1", "package": "a", "severity": "LOW"}]"#).unwrap();
        let doc = Document::from_value(json!({
            "nvd": {
                "data-directory": dir.path().join("data").display().to_string(),
                "cve": { "url-2.0-base": feed.display().to_string() }
            }
        }))
        .unwrap();

        update(&doc).unwrap();
        assert!(store_path(&dir.path().join("data")).is_file());
    }

    #[test]
    fn test_update_without_feed_is_update_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            update(&doc_for(dir.path())),
            Err(NvdError::Update(_))
        ));
    }
}
