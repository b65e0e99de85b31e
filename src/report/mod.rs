//! Report renderers.
//!
//! - [`write_reports`]: file reports (HTML, XML, CSV, JSON) written by the bundled engine.
//! - [`terminal`]: console status lines and the colored summary table.

pub mod html;
pub mod terminal;
pub mod xml;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::engine::store::unix_now;
use crate::error::EngineError;
use crate::models::{AppLabel, Dependency, ReportFormat};

/// Base name shared by every report file.
pub const REPORT_BASENAME: &str = "dependency-check-report";

/// Everything a report renders.
#[derive(Debug, Serialize)]
pub struct ReportData<'a> {
    pub application: &'a AppLabel,
    pub generated_at: u64,
    pub dependency_count: usize,
    pub vulnerability_count: usize,
    pub dependencies: &'a [Dependency],
}

impl<'a> ReportData<'a> {
    pub fn new(application: &'a AppLabel, dependencies: &'a [Dependency]) -> Self {
        Self {
            application,
            generated_at: unix_now(),
            dependency_count: dependencies.len(),
            vulnerability_count: dependencies.iter().map(|d| d.vulnerabilities.len()).sum(),
            dependencies,
        }
    }
}

/// Path of the report file for one concrete format.
pub fn report_path(output_dir: &Path, format: ReportFormat) -> PathBuf {
    output_dir.join(format!("{REPORT_BASENAME}.{}", format.extension()))
}

/// Write `format` (or every format for [`ReportFormat::All`]) into `output_dir`.
pub fn write_reports(
    dependencies: &[Dependency],
    app: &AppLabel,
    output_dir: &Path,
    format: ReportFormat,
) -> Result<(), EngineError> {
    std::fs::create_dir_all(output_dir).map_err(|e| EngineError::io(output_dir, e))?;
    let data = ReportData::new(app, dependencies);

    for concrete in format.expand() {
        let body = match concrete {
            ReportFormat::Html => html::render(&data),
            ReportFormat::Xml => xml::render(&data)?,
            ReportFormat::Csv => render_csv(&data),
            ReportFormat::Json => {
                serde_json::to_string_pretty(&data).map_err(|source| EngineError::Json {
                    context: "json report".to_owned(),
                    source,
                })?
            }
            ReportFormat::All => continue,
        };
        let path = report_path(output_dir, *concrete);
        std::fs::write(&path, body).map_err(|e| EngineError::io(&path, e))?;
        info!(format = %concrete, path = %path.display(), "report written");
    }

    Ok(())
}

/// One row per (dependency, finding); unaffected dependencies get one row with empty finding columns.
fn render_csv(data: &ReportData<'_>) -> String {
    let mut out = String::from("Project,File,Path,Package,Version,Vulnerability,Severity,Description\n");
    let project = data.application.to_string();

    for dep in data.dependencies {
        let path = dep.path.display().to_string();
        let prefix = [
            project.as_str(),
            dep.file_name.as_str(),
            path.as_str(),
            dep.name.as_deref().unwrap_or(""),
            dep.version.as_deref().unwrap_or(""),
        ]
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");

        if dep.vulnerabilities.is_empty() {
            out.push_str(&format!("{prefix},,,\n"));
        }
        for v in &dep.vulnerabilities {
            out.push_str(&format!(
                "{prefix},{},{},{}\n",
                csv_field(&v.id),
                csv_field(&v.severity.to_string()),
                csv_field(&v.description)
            ));
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{AppLabel, Dependency, Severity, Vulnerability};

    pub fn app() -> AppLabel {
        AppLabel {
            name: "libfoo".to_owned(),
            version: "1.0".to_owned(),
        }
    }

    pub fn dependencies() -> Vec<Dependency> {
        let mut vulnerable = Dependency::new("lib/commons-collections-3.2.1.jar");
        vulnerable.name = Some("commons-collections".to_owned());
        vulnerable.version = Some("3.2.1".to_owned());
        vulnerable.vulnerabilities = vec![Vulnerability {
            id: "CVE-2015-7501".to_owned(),
            severity: Severity::Critical,
            description: "Unsafe <deserialization>, \"InvokerTransformer\"".to_owned(),
        }];
        vec![vulnerable, Dependency::new("lib/tools.jar")]
    }
}
