use serde::Serialize;

use super::ReportData;
use crate::error::EngineError;

#[derive(Serialize)]
struct XmlAnalysis<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@version")]
    version: &'a str,
    #[serde(rename = "generatedAt")]
    generated_at: u64,
    dependencies: XmlDependencies<'a>,
}

#[derive(Serialize)]
struct XmlDependencies<'a> {
    #[serde(rename = "dependency")]
    items: Vec<XmlDependency<'a>>,
}

#[derive(Serialize)]
struct XmlDependency<'a> {
    #[serde(rename = "fileName")]
    file_name: &'a str,
    #[serde(rename = "filePath")]
    file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    vulnerabilities: XmlVulnerabilities<'a>,
}

#[derive(Serialize)]
struct XmlVulnerabilities<'a> {
    #[serde(rename = "vulnerability")]
    items: Vec<XmlVulnerability<'a>>,
}

#[derive(Serialize)]
struct XmlVulnerability<'a> {
    name: &'a str,
    severity: String,
    description: &'a str,
}

/// Render the report as an `<analysis>` XML document.
pub fn render(data: &ReportData<'_>) -> Result<String, EngineError> {
    let analysis = XmlAnalysis {
        name: &data.application.name,
        version: &data.application.version,
        generated_at: data.generated_at,
        dependencies: XmlDependencies {
            items: data
                .dependencies
                .iter()
                .map(|dep| XmlDependency {
                    file_name: &dep.file_name,
                    file_path: dep.path.display().to_string(),
                    package: dep.name.as_deref(),
                    version: dep.version.as_deref(),
                    vulnerabilities: XmlVulnerabilities {
                        items: dep
                            .vulnerabilities
                            .iter()
                            .map(|v| XmlVulnerability {
                                name: &v.id,
                                severity: v.severity.to_string(),
                                description: &v.description,
                            })
                            .collect(),
                    },
                })
                .collect(),
        },
    };

    let body = quick_xml::se::to_string_with_root("analysis", &analysis)
        .map_err(|e| EngineError::Message(format!("xml report: {e}")))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{app, dependencies};

    #[test]
    fn test_render_xml() {
        let deps = dependencies();
        let app = app();
        let xml = render(&ReportData::new(&app, &deps)).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<analysis name="libfoo" version="1.0">"#));
        assert_eq!(xml.matches("<dependency>").count(), 2);
        assert!(xml.contains("<name>CVE-2015-7501</name>"));
        assert!(xml.contains("&lt;deserialization&gt;"));
    }
}
