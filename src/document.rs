use std::path::Path;

use serde_json::Value;

use crate::error::NvdError;

/// A loosely typed, nested configuration document.
///
/// Keys may be written plain (`"nvd"`) or keyword style (`":nvd"`); lookups
/// accept either. `null` values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Wrap an already parsed value. The root must be an object (or null,
    /// which is treated as an empty document).
    pub fn from_value(root: Value) -> Result<Self, NvdError> {
        match root {
            Value::Object(_) => Ok(Self { root }),
            Value::Null => Ok(Self::default()),
            other => Err(NvdError::Config {
                path: "<inline>".to_owned(),
                reason: format!("top-level value must be an object, found {}", kind(&other)),
            }),
        }
    }

    /// Load a document from disk.
    ///
    /// `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, NvdError> {
        let config_err = |reason: String| NvdError::Config {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let root: Value = if is_toml {
            let table: toml::Value = toml::from_str(&content).map_err(|e| config_err(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| config_err(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))?
        };

        Self::from_value(root).map_err(|e| match e {
            NvdError::Config { reason, .. } => config_err(reason),
            other => other,
        })
    }

    /// The raw root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolve a key path. Returns `None` when any segment is missing or the
    /// final value is `null`.
    pub fn resolve(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path {
            let map = current.as_object()?;
            current = map
                .get(*segment)
                .or_else(|| map.get(&format!(":{segment}")))?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }
}

/// Short name of a JSON value kind, for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Dotted representation of a key path, for logs and errors.
pub fn dotted(path: &[&str]) -> String {
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_resolve_nested_and_keyword_keys() {
        let doc = Document::from_value(json!({
            ":nvd": { "cve": { ":valid-for-hours": 12 } }
        }))
        .unwrap();
        assert_eq!(
            doc.resolve(&["nvd", "cve", "valid-for-hours"]),
            Some(&json!(12))
        );
    }

    #[test]
    fn test_resolve_null_is_absent() {
        let doc = Document::from_value(json!({ "nvd": { "suppression-file": null } })).unwrap();
        assert_eq!(doc.resolve(&["nvd", "suppression-file"]), None);
        assert_eq!(doc.resolve(&["nvd", "missing", "deeper"]), None);
    }

    #[test]
    fn test_non_object_root_rejected() {
        assert!(matches!(
            Document::from_value(json!([1, 2])),
            Err(NvdError::Config { .. })
        ));
    }

    #[test]
    fn test_load_json_file() {
        let mut f = Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, r#"{{"name": "libfoo", "version": "1.0"}}"#).unwrap();
        let doc = Document::load(f.path()).unwrap();
        assert_eq!(doc.resolve(&["name"]), Some(&json!("libfoo")));
    }

    #[test]
    fn test_load_toml_file() {
        let mut f = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            f,
            "name = \"libfoo\"\n[nvd]\nauto-update = false\n"
        )
        .unwrap();
        let doc = Document::load(f.path()).unwrap();
        assert_eq!(doc.resolve(&["nvd", "auto-update"]), Some(&json!(false)));
    }

    #[test]
    fn test_load_malformed_json_is_config_error() {
        let mut f = Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, "{{ not json").unwrap();
        assert!(matches!(
            Document::load(f.path()),
            Err(NvdError::Config { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = Document::load(Path::new("/nonexistent/nvd-config.json"));
        assert!(matches!(result, Err(NvdError::Config { .. })));
    }
}
