use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::document::{dotted, kind, Document};
use crate::error::NvdError;
use crate::settings::{Setting, Settings};

/// How a document value is coerced before it is stored in the settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coercion {
    Str,
    Bool,
}

/// Setting identifier, document path, coercion.
///
/// Each identifier appears exactly once.
const MAPPINGS: &[(Setting, &[&str], Coercion)] = &[
    (Setting::AnalyzerNexusUrl, &["nvd", "analyzer", "nexus-url"], Coercion::Str),
    (Setting::AnalyzerAssemblyMonoPath, &["nvd", "analyzer", "path-to-mono"], Coercion::Str),
    (Setting::AdditionalZipExtensions, &["nvd", "zip-extensions"], Coercion::Str),
    (Setting::CveModified12Url, &["nvd", "cve", "url-1.2-modified"], Coercion::Str),
    (Setting::CveModified20Url, &["nvd", "cve", "url-2.0-modified"], Coercion::Str),
    (Setting::CveSchema12, &["nvd", "cve", "url-1.2-base"], Coercion::Str),
    (Setting::CveSchema20, &["nvd", "cve", "url-2.0-base"], Coercion::Str),
    (Setting::ConnectionTimeout, &["nvd", "database", "connection-timeout"], Coercion::Str),
    (Setting::DbDriverName, &["nvd", "database", "driver-name"], Coercion::Str),
    (Setting::DbDriverPath, &["nvd", "database", "driver-path"], Coercion::Str),
    (Setting::DbConnectionString, &["nvd", "database", "connection-string"], Coercion::Str),
    (Setting::DbUser, &["nvd", "database", "user"], Coercion::Str),
    (Setting::DbPassword, &["nvd", "database", "password"], Coercion::Str),
    (Setting::ProxyServer, &["nvd", "proxy", "server"], Coercion::Str),
    (Setting::ProxyPort, &["nvd", "proxy", "port"], Coercion::Str),
    (Setting::ProxyUsername, &["nvd", "proxy", "user"], Coercion::Str),
    (Setting::ProxyPassword, &["nvd", "proxy", "password"], Coercion::Str),
    (Setting::SuppressionFile, &["nvd", "suppression-file"], Coercion::Str),
    (Setting::AutoUpdate, &["nvd", "auto-update"], Coercion::Bool),
    (Setting::AnalyzerNexusEnabled, &["nvd", "analyzer", "nexus-enabled"], Coercion::Bool),
    (Setting::AnalyzerNexusUsesProxy, &["nvd", "analyzer", "nexus-uses-proxy"], Coercion::Bool),
    (Setting::AnalyzerJarEnabled, &["nvd", "analyzer", "jar-enabled"], Coercion::Bool),
    (
        Setting::AnalyzerPythonDistributionEnabled,
        &["nvd", "analyzer", "python-distribution-enabled"],
        Coercion::Bool,
    ),
    (
        Setting::AnalyzerPythonPackageEnabled,
        &["nvd", "analyzer", "python-package-enabled"],
        Coercion::Bool,
    ),
    (
        Setting::AnalyzerRubyGemspecEnabled,
        &["nvd", "analyzer", "ruby-gemspec-enabled"],
        Coercion::Bool,
    ),
    (Setting::AnalyzerOpensslEnabled, &["nvd", "analyzer", "openssl-enabled"], Coercion::Bool),
    (Setting::AnalyzerCmakeEnabled, &["nvd", "analyzer", "cmake-enabled"], Coercion::Bool),
    (Setting::AnalyzerAutoconfEnabled, &["nvd", "analyzer", "autoconf-enabled"], Coercion::Bool),
    (
        Setting::AnalyzerComposerLockEnabled,
        &["nvd", "analyzer", "composer-lock-enabled"],
        Coercion::Bool,
    ),
    (
        Setting::AnalyzerNodePackageEnabled,
        &["nvd", "analyzer", "node-package-enabled"],
        Coercion::Bool,
    ),
    (Setting::AnalyzerNuspecEnabled, &["nvd", "analyzer", "nuspec-enabled"], Coercion::Bool),
    (Setting::AnalyzerCentralEnabled, &["nvd", "analyzer", "central-enabled"], Coercion::Bool),
    (Setting::AnalyzerArchiveEnabled, &["nvd", "analyzer", "archive-enabled"], Coercion::Bool),
    (Setting::AnalyzerAssemblyEnabled, &["nvd", "analyzer", "assembly-enabled"], Coercion::Bool),
];

const VALID_FOR_HOURS_PATH: &[&str] = &["nvd", "cve", "valid-for-hours"];
const DATA_DIRECTORY_PATH: &[&str] = &["nvd", "data-directory"];

/// Default data directory, relative to the invoking user's home.
pub fn default_data_directory(home: &Path) -> PathBuf {
    home.join(".lein").join(".nvd")
}

/// Build the settings table for one invocation from the user's home directory.
pub fn populate_settings(doc: &Document) -> Result<Settings, NvdError> {
    populate_settings_with_home(doc, dirs::home_dir().as_deref())
}

/// Build the settings table, resolving the default data directory against `home`.
///
/// Absent values leave the engine default untouched. Values that are present
/// but cannot be coerced fail with [`NvdError::ConfigField`] before anything
/// is handed to an engine.
pub fn populate_settings_with_home(
    doc: &Document,
    home: Option<&Path>,
) -> Result<Settings, NvdError> {
    let mut settings = Settings::with_defaults();

    for (setting, path, coercion) in MAPPINGS {
        let Some(value) = doc.resolve(path) else {
            continue;
        };
        match coercion {
            Coercion::Str => {
                let text = coerce_string(path, value)?;
                if text.is_empty() {
                    continue;
                }
                settings.set_string(*setting, text);
            }
            Coercion::Bool => settings.set_bool(*setting, coerce_bool(path, value)?),
        }
        debug!(setting = %setting, secret = setting.is_secret(), "setting applied from config");
    }

    if let Some(value) = doc.resolve(VALID_FOR_HOURS_PATH) {
        settings.set_int(
            Setting::CveCheckValidForHours,
            coerce_int(VALID_FOR_HOURS_PATH, value)?,
        );
    }

    let data_dir = match doc.resolve(DATA_DIRECTORY_PATH) {
        Some(value) => Some(coerce_string(DATA_DIRECTORY_PATH, value)?).filter(|s| !s.is_empty()),
        None => None,
    };
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => {
            let home = home.ok_or_else(|| NvdError::ConfigField {
                field: dotted(DATA_DIRECTORY_PATH),
                reason: "not set and the home directory could not be determined".to_owned(),
            })?;
            default_data_directory(home).display().to_string()
        }
    };
    debug!(data_directory = %data_dir, "data directory resolved");
    settings.set_string(Setting::DataDirectory, data_dir);

    Ok(settings)
}

fn coerce_string(path: &[&str], value: &Value) -> Result<String, NvdError> {
    match value {
        Value::String(s) => Ok(s.trim().to_owned()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(NvdError::ConfigField {
            field: dotted(path),
            reason: format!("expected a scalar, found {}", kind(other)),
        }),
    }
}

fn coerce_bool(path: &[&str], value: &Value) -> Result<bool, NvdError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(NvdError::ConfigField {
            field: dotted(path),
            reason: format!("expected a boolean, found {}", kind(other)),
        }),
    }
}

fn coerce_int(path: &[&str], value: &Value) -> Result<u64, NvdError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| NvdError::ConfigField {
        field: dotted(path),
        reason: format!("expected a non-negative integer, found {value}"),
    })
}

/// The project section of the configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub nvd: OutputConfig,
}

/// Where and how reports are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_format: default_output_format(),
        }
    }
}

fn default_name() -> String {
    "unnamed".to_owned()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target").join("nvd")
}

fn default_output_format() -> String {
    "ALL".to_owned()
}

impl ProjectConfig {
    /// Read the typed project section out of a document.
    ///
    /// Unknown keys (the engine settings under `nvd`) are ignored here.
    pub fn from_document(doc: &Document) -> Result<Self, NvdError> {
        let root = strip_keyword_keys(doc.root().clone());
        serde_json::from_value(root).map_err(|e| NvdError::Config {
            path: "<project>".to_owned(),
            reason: e.to_string(),
        })
    }

    /// Display name of the checked application (`group/name` when a distinct group is set).
    pub fn title(&self) -> String {
        match self.group.as_deref() {
            Some(group) if !group.is_empty() && group != self.name => {
                format!("{}/{}", group, self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// Rewrite `":key"` object keys to `"key"` so serde sees one spelling.
/// Null members are dropped so they fall back to their defaults.
fn strip_keyword_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let key = k.strip_prefix(':').map(str::to_owned).unwrap_or(k);
                    (key, strip_keyword_keys(v))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_keyword_keys).collect()),
        other => other,
    }
}
