use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One scanned artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Path the artifact was registered under.
    pub path: PathBuf,
    /// File name of the artifact.
    pub file_name: String,
    /// Identified package name, if an analyzer recognised it.
    pub name: Option<String>,
    /// Identified package version, if an analyzer recognised it.
    pub version: Option<String>,
    /// Findings matched against this dependency.
    pub vulnerabilities: Vec<Vulnerability>,
}

impl Dependency {
    /// A freshly registered, not yet analyzed dependency.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            file_name,
            name: None,
            version: None,
            vulnerabilities: Vec::new(),
        }
    }
}

/// A single known vulnerability. Identity (equality, ordering, hashing) is
/// the advisory id together with its severity and description.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lenient parse of a feed severity label; unrecognised labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" | "moderate" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Unknown => write!(f, "UNKNOWN"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Name and version of the application being checked, as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppLabel {
    pub name: String,
    pub version: String,
}

impl fmt::Display for AppLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

/// Report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Xml,
    Csv,
    Json,
    All,
}

impl ReportFormat {
    /// The concrete formats this option expands to.
    pub fn expand(self) -> &'static [ReportFormat] {
        match self {
            ReportFormat::Html => &[ReportFormat::Html],
            ReportFormat::Xml => &[ReportFormat::Xml],
            ReportFormat::Csv => &[ReportFormat::Csv],
            ReportFormat::Json => &[ReportFormat::Json],
            ReportFormat::All => &[
                ReportFormat::Html,
                ReportFormat::Xml,
                ReportFormat::Csv,
                ReportFormat::Json,
            ],
        }
    }

    /// File extension of a concrete format.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Xml => "xml",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::All => "",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HTML" => Ok(ReportFormat::Html),
            "XML" => Ok(ReportFormat::Xml),
            "CSV" => Ok(ReportFormat::Csv),
            "JSON" => Ok(ReportFormat::Json),
            "ALL" => Ok(ReportFormat::All),
            other => Err(format!(
                "unsupported report format '{other}', expected one of HTML, XML, CSV, JSON, ALL"
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Html => write!(f, "HTML"),
            ReportFormat::Xml => write!(f, "XML"),
            ReportFormat::Csv => write!(f, "CSV"),
            ReportFormat::Json => write!(f, "JSON"),
            ReportFormat::All => write!(f, "ALL"),
        }
    }
}
