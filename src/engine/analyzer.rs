use regex::Regex;

use crate::error::EngineError;
use crate::models::Dependency;
use crate::settings::{Setting, Settings};

/// An analyzer enriches a registered dependency with identifying evidence.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    /// Setting that switches this analyzer on or off.
    fn enabled_by(&self) -> Setting;

    fn analyze(&self, dep: &mut Dependency) -> Result<(), EngineError>;
}

/// Identifies `name` and `version` from a packaged artifact's file name,
/// e.g. `commons-collections-3.2.1.jar`.
pub struct JarAnalyzer {
    pattern: Regex,
}

impl JarAnalyzer {
    pub fn new() -> Result<Self, EngineError> {
        // Version starts at the first `-<digit>` segment.
        let pattern = Regex::new(r"^(?P<name>.+?)-(?P<version>\d[^-]*(?:-[^-]+)*?)\.jar$")
            .map_err(|e| EngineError::Message(format!("jar analyzer pattern: {e}")))?;
        Ok(Self { pattern })
    }
}

impl Analyzer for JarAnalyzer {
    fn name(&self) -> &'static str {
        "jar"
    }

    fn enabled_by(&self) -> Setting {
        Setting::AnalyzerJarEnabled
    }

    fn analyze(&self, dep: &mut Dependency) -> Result<(), EngineError> {
        if let Some(caps) = self.pattern.captures(&dep.file_name) {
            dep.name = Some(caps["name"].to_owned());
            dep.version = Some(caps["version"].to_owned());
        }
        Ok(())
    }
}

/// The analyzers bundled with the local engine, filtered by their enable switch.
pub fn active_analyzers(settings: &Settings) -> Result<Vec<Box<dyn Analyzer>>, EngineError> {
    let all: Vec<Box<dyn Analyzer>> = vec![Box::new(JarAnalyzer::new()?)];
    Ok(all
        .into_iter()
        .filter(|a| settings.get_bool(a.enabled_by()))
        .collect())
}
