//! Flat, typed settings consumed by the analysis engine.
//!
//! A [`Settings`] value is built once per invocation by
//! [`config::populate_settings`](crate::config::populate_settings), moved into
//! the engine, and dropped when the engine session ends.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Every setting identifier the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Setting {
    AutoUpdate,
    DataDirectory,
    SuppressionFile,
    AdditionalZipExtensions,
    CveCheckValidForHours,
    CveModified12Url,
    CveModified20Url,
    CveSchema12,
    CveSchema20,
    ProxyServer,
    ProxyPort,
    ProxyUsername,
    ProxyPassword,
    ConnectionTimeout,
    DbDriverName,
    DbDriverPath,
    DbConnectionString,
    DbUser,
    DbPassword,
    AnalyzerNexusUrl,
    AnalyzerNexusEnabled,
    AnalyzerNexusUsesProxy,
    AnalyzerAssemblyMonoPath,
    AnalyzerJarEnabled,
    AnalyzerPythonDistributionEnabled,
    AnalyzerPythonPackageEnabled,
    AnalyzerRubyGemspecEnabled,
    AnalyzerOpensslEnabled,
    AnalyzerCmakeEnabled,
    AnalyzerAutoconfEnabled,
    AnalyzerComposerLockEnabled,
    AnalyzerNodePackageEnabled,
    AnalyzerNuspecEnabled,
    AnalyzerCentralEnabled,
    AnalyzerArchiveEnabled,
    AnalyzerAssemblyEnabled,
}

impl Setting {
    /// Property-style key, as the engine would read it from a properties file.
    pub fn key(self) -> &'static str {
        match self {
            Setting::AutoUpdate => "autoupdate",
            Setting::DataDirectory => "data.directory",
            Setting::SuppressionFile => "suppression.file",
            Setting::AdditionalZipExtensions => "extensions.zip",
            Setting::CveCheckValidForHours => "cve.check.validforhours",
            Setting::CveModified12Url => "cve.url-1.2.modified",
            Setting::CveModified20Url => "cve.url-2.0.modified",
            Setting::CveSchema12 => "cve.url-1.2.base",
            Setting::CveSchema20 => "cve.url-2.0.base",
            Setting::ProxyServer => "proxy.server",
            Setting::ProxyPort => "proxy.port",
            Setting::ProxyUsername => "proxy.username",
            Setting::ProxyPassword => "proxy.password",
            Setting::ConnectionTimeout => "connection.timeout",
            Setting::DbDriverName => "data.driver_name",
            Setting::DbDriverPath => "data.driver_path",
            Setting::DbConnectionString => "data.connection_string",
            Setting::DbUser => "data.user",
            Setting::DbPassword => "data.password",
            Setting::AnalyzerNexusUrl => "analyzer.nexus.url",
            Setting::AnalyzerNexusEnabled => "analyzer.nexus.enabled",
            Setting::AnalyzerNexusUsesProxy => "analyzer.nexus.proxy",
            Setting::AnalyzerAssemblyMonoPath => "analyzer.assembly.mono.path",
            Setting::AnalyzerJarEnabled => "analyzer.jar.enabled",
            Setting::AnalyzerPythonDistributionEnabled => "analyzer.python.distribution.enabled",
            Setting::AnalyzerPythonPackageEnabled => "analyzer.python.package.enabled",
            Setting::AnalyzerRubyGemspecEnabled => "analyzer.ruby.gemspec.enabled",
            Setting::AnalyzerOpensslEnabled => "analyzer.openssl.enabled",
            Setting::AnalyzerCmakeEnabled => "analyzer.cmake.enabled",
            Setting::AnalyzerAutoconfEnabled => "analyzer.autoconf.enabled",
            Setting::AnalyzerComposerLockEnabled => "analyzer.composer.lock.enabled",
            Setting::AnalyzerNodePackageEnabled => "analyzer.node.package.enabled",
            Setting::AnalyzerNuspecEnabled => "analyzer.nuspec.enabled",
            Setting::AnalyzerCentralEnabled => "analyzer.central.enabled",
            Setting::AnalyzerArchiveEnabled => "analyzer.archive.enabled",
            Setting::AnalyzerAssemblyEnabled => "analyzer.assembly.enabled",
        }
    }

    /// Whether the value must never appear in logs.
    pub fn is_secret(self) -> bool {
        matches!(self, Setting::ProxyPassword | Setting::DbPassword)
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Str(String),
    Bool(bool),
    Int(u64),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => write!(f, "{s}"),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
        }
    }
}

/// The settings table.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<Setting, SettingValue>,
}

impl Settings {
    /// A table holding only the engine's built-in defaults.
    pub fn with_defaults() -> Self {
        let mut values = BTreeMap::new();
        values.insert(Setting::AutoUpdate, SettingValue::Bool(true));
        values.insert(Setting::CveCheckValidForHours, SettingValue::Int(4));
        values.insert(Setting::AnalyzerNexusEnabled, SettingValue::Bool(false));
        values.insert(Setting::AnalyzerNexusUsesProxy, SettingValue::Bool(true));

        for analyzer in [
            Setting::AnalyzerJarEnabled,
            Setting::AnalyzerPythonDistributionEnabled,
            Setting::AnalyzerPythonPackageEnabled,
            Setting::AnalyzerRubyGemspecEnabled,
            Setting::AnalyzerOpensslEnabled,
            Setting::AnalyzerCmakeEnabled,
            Setting::AnalyzerAutoconfEnabled,
            Setting::AnalyzerComposerLockEnabled,
            Setting::AnalyzerNodePackageEnabled,
            Setting::AnalyzerNuspecEnabled,
            Setting::AnalyzerCentralEnabled,
            Setting::AnalyzerArchiveEnabled,
            Setting::AnalyzerAssemblyEnabled,
        ] {
            values.insert(analyzer, SettingValue::Bool(true));
        }

        Self { values }
    }

    pub fn set_string(&mut self, setting: Setting, value: impl Into<String>) {
        self.values.insert(setting, SettingValue::Str(value.into()));
    }

    pub fn set_bool(&mut self, setting: Setting, value: bool) {
        self.values.insert(setting, SettingValue::Bool(value));
    }

    pub fn set_int(&mut self, setting: Setting, value: u64) {
        self.values.insert(setting, SettingValue::Int(value));
    }

    pub fn get(&self, setting: Setting) -> Option<&SettingValue> {
        self.values.get(&setting)
    }

    pub fn get_string(&self, setting: Setting) -> Option<&str> {
        match self.get(setting) {
            Some(SettingValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Boolean lookup; unset or non-boolean values read as `false`.
    pub fn get_bool(&self, setting: Setting) -> bool {
        matches!(self.get(setting), Some(SettingValue::Bool(true)))
    }

    pub fn get_int(&self, setting: Setting) -> Option<u64> {
        match self.get(setting) {
            Some(SettingValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// The local data directory. Always present after normalization.
    pub fn data_directory(&self) -> Option<PathBuf> {
        self.get_string(Setting::DataDirectory).map(PathBuf::from)
    }

    /// Iterate entries with secrets redacted.
    pub fn redacted(&self) -> impl Iterator<Item = (Setting, String)> + '_ {
        self.values.iter().map(|(k, v)| {
            let shown = if k.is_secret() {
                "********".to_owned()
            } else {
                v.to_string()
            };
            (*k, shown)
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.redacted().map(|(k, v)| (k.key(), v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::with_defaults();
        assert!(s.get_bool(Setting::AutoUpdate));
        assert!(s.get_bool(Setting::AnalyzerJarEnabled));
        assert!(!s.get_bool(Setting::AnalyzerNexusEnabled));
        assert_eq!(s.get_int(Setting::CveCheckValidForHours), Some(4));
        assert_eq!(s.get_string(Setting::CveSchema20), None);
        assert_eq!(s.data_directory(), None);
    }

    #[test]
    fn test_typed_getters_do_not_cross_types() {
        let mut s = Settings::with_defaults();
        s.set_string(Setting::ProxyPort, "8080");
        assert_eq!(s.get_string(Setting::ProxyPort), Some("8080"));
        assert_eq!(s.get_int(Setting::ProxyPort), None);
        assert!(!s.get_bool(Setting::ProxyPort));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let mut s = Settings::with_defaults();
        s.set_string(Setting::ProxyPassword, "hunter2");
        s.set_string(Setting::DbPassword, "s3cret");
        let rendered = format!("{s:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("proxy.password"));
    }
}
