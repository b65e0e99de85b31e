//! The analysis engine boundary.
//!
//! [`Engine`] is the capability this crate drives. [`EngineSession`] owns one
//! engine instance for exactly one invocation and closes it when dropped, so
//! every exit path (success, `?` propagation, panic unwinding) releases the
//! engine and the settings it owns exactly once.
//!
//! # Lifecycle
//!
//! ```text
//! Created -> Scanning -> Analyzing -> ReportReady -----------> Cleaned
//!    \                                                          ^
//!     `-------------------------> DatabaseOperationDone -------'
//! ```

pub mod analyzer;
pub mod feed;
pub mod local;
pub mod store;
pub mod suppression;
pub mod version;

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, NvdError};
use crate::models::{AppLabel, Dependency, ReportFormat};
use crate::settings::Settings;

pub use local::LocalEngine;

/// Operations the orchestration layer needs from an analysis engine.
pub trait Engine {
    /// Register one artifact for analysis. No analysis happens yet.
    fn scan(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Run every active analyzer over the registered dependencies and attach findings.
    fn analyze(&mut self) -> Result<(), EngineError>;

    /// Dependencies known to the engine, with whatever findings analysis attached.
    fn dependencies(&self) -> &[Dependency];

    /// Names of the analyzers that run during [`Engine::analyze`].
    fn analyzers(&self) -> Vec<&'static str>;

    /// Synchronise the local store with the remote feed.
    fn update_database(&mut self) -> Result<(), EngineError>;

    /// Render reports for every dependency into `output_dir`.
    ///
    /// `format` may be [`ReportFormat::All`].
    fn write_reports(
        &self,
        app: &AppLabel,
        output_dir: &Path,
        format: ReportFormat,
    ) -> Result<(), EngineError>;

    /// Release held resources. Called exactly once, by [`EngineSession`].
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Scanning,
    Analyzing,
    ReportReady,
    DatabaseOperationDone,
    Cleaned,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Scanning => "scanning",
            LifecycleState::Analyzing => "analyzing",
            LifecycleState::ReportReady => "report-ready",
            LifecycleState::DatabaseOperationDone => "database-operation-done",
            LifecycleState::Cleaned => "cleaned",
        };
        f.write_str(name)
    }
}

/// Scoped owner of one engine instance.
pub struct EngineSession<E: Engine> {
    engine: E,
    state: LifecycleState,
}

impl<E: Engine> EngineSession<E> {
    /// Take ownership of a freshly created engine.
    pub fn new(engine: E) -> Self {
        debug!(state = %LifecycleState::Created, "engine session opened");
        Self {
            engine,
            state: LifecycleState::Created,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn transition(&mut self, next: LifecycleState) {
        debug!(from = %self.state, to = %next, "engine lifecycle transition");
        self.state = next;
    }

    /// Close the engine now. Equivalent to dropping the session.
    pub fn cleanup(self) {}
}

impl<E: Engine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: Engine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        let from = self.state();
        if from == LifecycleState::Cleaned {
            return;
        }
        self.engine.close();
        self.state = LifecycleState::Cleaned;
        debug!(%from, "engine session cleaned up");
    }
}

/// Create the bundled engine for one invocation.
///
/// The settings move into the engine and are dropped with it.
pub fn create(settings: Settings) -> Result<EngineSession<LocalEngine>, NvdError> {
    let engine = LocalEngine::new(settings).map_err(|e| NvdError::EngineCreation(e.to_string()))?;
    Ok(EngineSession::new(engine))
}

#[cfg(test)]
pub mod testing {
    //! A recording engine for orchestration tests.

    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use super::Engine;
    use crate::error::EngineError;
    use crate::models::{AppLabel, Dependency, ReportFormat, Vulnerability};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailPoint {
        Scan,
        Analyze,
        Update,
        Report,
    }

    /// Shared view of what the fake engine saw, readable after the session is gone.
    #[derive(Debug, Default, Clone)]
    pub struct Recorder {
        pub closes: Rc<Cell<usize>>,
        pub updates: Rc<Cell<usize>>,
        pub scanned: Rc<RefCell<Vec<PathBuf>>>,
        pub reports: Rc<RefCell<Vec<(AppLabel, PathBuf, ReportFormat)>>>,
    }

    pub struct FakeEngine {
        pub recorder: Recorder,
        pub fail_on: Option<FailPoint>,
        /// Findings attached during analysis, keyed by artifact file name.
        pub findings: HashMap<String, Vec<Vulnerability>>,
        deps: Vec<Dependency>,
    }

    impl FakeEngine {
        pub fn new() -> Self {
            Self {
                recorder: Recorder::default(),
                fail_on: None,
                findings: HashMap::new(),
                deps: Vec::new(),
            }
        }

        pub fn failing_on(point: FailPoint) -> Self {
            Self {
                fail_on: Some(point),
                ..Self::new()
            }
        }

        pub fn with_finding(mut self, file_name: &str, vuln: Vulnerability) -> Self {
            self.findings.entry(file_name.to_owned()).or_default().push(vuln);
            self
        }

        fn check(&self, point: FailPoint) -> Result<(), EngineError> {
            if self.fail_on == Some(point) {
                Err(EngineError::Message(format!("injected failure at {point:?}")))
            } else {
                Ok(())
            }
        }
    }

    impl Engine for FakeEngine {
        fn scan(&mut self, path: &Path) -> Result<(), EngineError> {
            self.check(FailPoint::Scan)?;
            self.recorder.scanned.borrow_mut().push(path.to_path_buf());
            self.deps.push(Dependency::new(path));
            Ok(())
        }

        fn analyze(&mut self) -> Result<(), EngineError> {
            self.check(FailPoint::Analyze)?;
            for dep in &mut self.deps {
                if let Some(found) = self.findings.get(&dep.file_name) {
                    dep.vulnerabilities = found.clone();
                }
            }
            Ok(())
        }

        fn dependencies(&self) -> &[Dependency] {
            &self.deps
        }

        fn analyzers(&self) -> Vec<&'static str> {
            vec!["fake"]
        }

        fn update_database(&mut self) -> Result<(), EngineError> {
            self.check(FailPoint::Update)?;
            self.recorder.updates.set(self.recorder.updates.get() + 1);
            Ok(())
        }

        fn write_reports(
            &self,
            app: &AppLabel,
            output_dir: &Path,
            format: ReportFormat,
        ) -> Result<(), EngineError> {
            self.check(FailPoint::Report)?;
            self.recorder
                .reports
                .borrow_mut()
                .push((app.clone(), output_dir.to_path_buf(), format));
            Ok(())
        }

        fn close(&mut self) {
            self.recorder.closes.set(self.recorder.closes.get() + 1);
        }
    }
}
