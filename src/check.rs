//! The `check` flow: scan, analyze, report, decide.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::config::{populate_settings, ProjectConfig};
use crate::document::Document;
use crate::engine::{self, Engine, EngineSession, LifecycleState};
use crate::error::{EngineError, NvdError, EXIT_OK, EXIT_VULNERABLE};
use crate::models::{AppLabel, ReportFormat, Vulnerability};
use crate::report::terminal;
use crate::transient::TransientConfig;

/// File extensions registered for scanning; everything else on the classpath is ignored.
pub const PACKAGED_EXTENSIONS: &[&str] = &["jar"];

/// Result of a completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Vulnerable(usize),
}

impl Outcome {
    pub fn decide(findings: &BTreeSet<Vulnerability>) -> Self {
        if findings.is_empty() {
            Outcome::Clean
        } else {
            Outcome::Vulnerable(findings.len())
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => EXIT_OK,
            Outcome::Vulnerable(_) => EXIT_VULNERABLE,
        }
    }
}

pub fn is_packaged_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PACKAGED_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
        .unwrap_or(false)
}

/// Register every packaged artifact on `classpath`, then run analysis.
pub fn scan_and_analyze<E: Engine>(
    session: &mut EngineSession<E>,
    classpath: &[String],
) -> Result<(), NvdError> {
    session.transition(LifecycleState::Scanning);
    for entry in classpath {
        let path = Path::new(entry);
        if !is_packaged_artifact(path) {
            debug!(entry = %entry, "classpath entry skipped");
            continue;
        }
        session.scan(path).map_err(NvdError::Analysis)?;
    }

    session.transition(LifecycleState::Analyzing);
    info!(
        dependencies = session.dependencies().len(),
        analyzers = ?session.analyzers(),
        "analyzing dependencies"
    );
    session.analyze().map_err(NvdError::Analysis)
}

/// Union of every dependency's findings. Recomputed on each call.
pub fn vulnerabilities<E: Engine + ?Sized>(engine: &E) -> BTreeSet<Vulnerability> {
    engine
        .dependencies()
        .iter()
        .flat_map(|dep| dep.vulnerabilities.iter().cloned())
        .collect()
}

/// Ask the engine to render reports in `output_format` into `output_dir`.
pub fn generate_report<E: Engine>(
    session: &mut EngineSession<E>,
    app: &AppLabel,
    output_dir: &Path,
    output_format: &str,
) -> Result<(), NvdError> {
    let format: ReportFormat = output_format
        .parse()
        .map_err(|reason| NvdError::Report(EngineError::Message(reason)))?;
    session
        .write_reports(app, output_dir, format)
        .map_err(NvdError::Report)?;
    session.transition(LifecycleState::ReportReady);
    info!(dir = %output_dir.display(), %format, "reports generated");
    Ok(())
}

/// Drive one session through the whole check. The session is closed on every path.
pub fn run<E: Engine>(
    mut session: EngineSession<E>,
    project: &ProjectConfig,
    quiet: bool,
) -> Result<Outcome, NvdError> {
    let app = AppLabel {
        name: project.title(),
        version: project.version.clone(),
    };
    terminal::print_status(&app);

    scan_and_analyze(&mut session, &project.classpath)?;
    generate_report(
        &mut session,
        &app,
        &project.nvd.output_dir,
        &project.nvd.output_format,
    )?;

    let findings = vulnerabilities(&*session);
    terminal::render(session.dependencies(), &findings, quiet);
    session.cleanup();

    Ok(Outcome::decide(&findings))
}

/// Full check from a configuration document.
///
/// Configuration problems surface before any engine exists.
pub fn check(doc: &Document, quiet: bool) -> Result<Outcome, NvdError> {
    let project = ProjectConfig::from_document(doc)?;
    let settings = populate_settings(doc)?;
    let session = engine::create(settings)?;
    run(session, &project, quiet)
}

/// Full check from a configuration file, which is removed afterwards unless `keep_config`.
///
/// The file goes away on success and on every error, including an unreadable document.
pub fn check_file(config: &Path, keep_config: bool, quiet: bool) -> Result<Outcome, NvdError> {
    let _transient = TransientConfig::new(config, keep_config);
    let doc = Document::load(config)?;
    check(&doc, quiet)
}
