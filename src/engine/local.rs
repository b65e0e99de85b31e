//! The bundled engine: file-name identification matched against the local store.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use super::analyzer::{active_analyzers, Analyzer};
use super::feed::FeedClient;
use super::store::{merge_feeds, store_path, unix_now, VulnStore};
use super::suppression::Suppressions;
use super::Engine;
use crate::error::EngineError;
use crate::models::{AppLabel, Dependency, ReportFormat};
use crate::report;
use crate::settings::{Setting, Settings};

pub struct LocalEngine {
    settings: Settings,
    data_dir: PathBuf,
    analyzers: Vec<Box<dyn Analyzer>>,
    dependencies: Vec<Dependency>,
    store: Option<VulnStore>,
}

impl LocalEngine {
    /// Create the engine. Touches no files; the data directory is created on first store write.
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        let data_dir = settings
            .data_directory()
            .ok_or_else(|| EngineError::Message(format!("{} is not set", Setting::DataDirectory)))?;

        let analyzers = active_analyzers(&settings)?;
        debug!(settings = ?settings, "engine settings");

        Ok(Self {
            settings,
            data_dir,
            analyzers,
            dependencies: Vec::new(),
            store: None,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        store_path(&self.data_dir)
    }

    fn valid_for(&self) -> Duration {
        let hours = self.settings.get_int(Setting::CveCheckValidForHours).unwrap_or(4);
        Duration::from_secs(hours.saturating_mul(3_600))
    }

    /// Load the store, refreshing it first when auto-update is on and it is missing or stale.
    fn open_store(&mut self) -> Result<VulnStore, EngineError> {
        let path = self.store_path();
        let existing = VulnStore::load(&path)?;

        if self.settings.get_bool(Setting::AutoUpdate) {
            let needs_update = match &existing {
                None => true,
                Some(store) => store.is_stale(self.valid_for(), SystemTime::now()),
            };
            if needs_update {
                info!("local store missing or stale, updating before analysis");
                return self.download_store();
            }
        }

        match existing {
            Some(store) => {
                debug!(
                    advisories = store.len(),
                    updated_at = store.updated_at(),
                    "local store loaded"
                );
                Ok(store)
            }
            None => {
                warn!(
                    store = %path.display(),
                    "no local vulnerability store and auto-update is off; nothing will match"
                );
                Ok(VulnStore::default())
            }
        }
    }

    fn download_store(&self) -> Result<VulnStore, EngineError> {
        let locations: Vec<&str> = [Setting::CveSchema20, Setting::CveModified20Url]
            .into_iter()
            .filter_map(|s| self.settings.get_string(s))
            .collect();
        if locations.is_empty() {
            return Err(EngineError::Message(format!(
                "no advisory feed configured (set {} or {})",
                Setting::CveSchema20,
                Setting::CveModified20Url
            )));
        }

        let client = FeedClient::from_settings(&self.settings)?;
        let feeds = locations
            .into_iter()
            .map(|location| client.fetch(location))
            .collect::<Result<Vec<_>, _>>()?;

        let store = VulnStore::from_advisories(merge_feeds(feeds), unix_now());
        store.save(&self.store_path())?;
        info!(advisories = store.len(), store = %self.store_path().display(), "local store updated");
        Ok(store)
    }

    fn suppressions(&self) -> Result<Suppressions, EngineError> {
        match self.settings.get_string(Setting::SuppressionFile) {
            Some(file) => {
                let s = Suppressions::load(Path::new(file))?;
                if s.is_empty() {
                    warn!(file, "suppression file lists no vulnerabilities");
                } else {
                    debug!(count = s.len(), "suppressions loaded");
                }
                Ok(s)
            }
            None => Ok(Suppressions::default()),
        }
    }
}

impl Engine for LocalEngine {
    fn scan(&mut self, path: &Path) -> Result<(), EngineError> {
        if !path.is_file() {
            warn!(path = %path.display(), "classpath entry is not a readable file, skipped");
            return Ok(());
        }
        debug!(path = %path.display(), "dependency registered");
        self.dependencies.push(Dependency::new(path));
        Ok(())
    }

    fn analyze(&mut self) -> Result<(), EngineError> {
        for dep in &mut self.dependencies {
            for analyzer in &self.analyzers {
                analyzer.analyze(dep)?;
            }
        }

        let suppressions = self.suppressions()?;
        let store = self.open_store()?;
        if store.is_empty() {
            warn!("local vulnerability store has no advisories");
        }

        for dep in &mut self.dependencies {
            let (Some(name), Some(version)) = (dep.name.as_deref(), dep.version.as_deref()) else {
                debug!(file = %dep.file_name, "dependency not identified, skipping match");
                continue;
            };
            dep.vulnerabilities = store
                .matching(name, version)
                .into_iter()
                .filter(|a| !suppressions.is_suppressed(&a.id))
                .map(|a| a.to_vulnerability())
                .collect();
            if !dep.vulnerabilities.is_empty() {
                debug!(file = %dep.file_name, count = dep.vulnerabilities.len(), "findings attached");
            }
        }

        self.store = Some(store);
        Ok(())
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn analyzers(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    fn update_database(&mut self) -> Result<(), EngineError> {
        let store = self.download_store()?;
        self.store = Some(store);
        Ok(())
    }

    fn write_reports(
        &self,
        app: &AppLabel,
        output_dir: &Path,
        format: ReportFormat,
    ) -> Result<(), EngineError> {
        report::write_reports(&self.dependencies, app, output_dir, format)
    }

    fn close(&mut self) {
        self.store = None;
        self.dependencies.clear();
        debug!(data_dir = %self.data_dir.display(), "local engine closed");
    }
}
