use std::fmt::Write as _;

use super::ReportData;

/// Render a self-contained HTML page.
pub fn render(data: &ReportData<'_>) -> String {
    let title = escape(&data.application.to_string());
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Dependency-Check Report: {title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; }}
th {{ background: #eee; }}
.CRITICAL, .HIGH {{ color: #b00; font-weight: bold; }}
.MEDIUM {{ color: #c60; }}
.LOW, .UNKNOWN {{ color: #666; }}
</style>
</head>
<body>
<h1>Dependency-Check Report</h1>
<p>Project: <strong>{title}</strong></p>
<p>Dependencies scanned: {deps} &middot; Vulnerabilities found: {vulns}</p>
<table>
<thead><tr><th>Dependency</th><th>Package</th><th>Version</th><th>Vulnerability</th><th>Severity</th><th>Description</th></tr></thead>
<tbody>
"#,
        deps = data.dependency_count,
        vulns = data.vulnerability_count,
    );

    for dep in data.dependencies {
        let file = escape(&dep.file_name);
        let name = escape(dep.name.as_deref().unwrap_or("-"));
        let version = escape(dep.version.as_deref().unwrap_or("-"));

        if dep.vulnerabilities.is_empty() {
            let _ = writeln!(
                html,
                "<tr><td>{file}</td><td>{name}</td><td>{version}</td><td colspan=\"3\">none</td></tr>"
            );
            continue;
        }

        for v in &dep.vulnerabilities {
            let _ = writeln!(
                html,
                "<tr><td>{file}</td><td>{name}</td><td>{version}</td><td>{id}</td><td class=\"{sev}\">{sev}</td><td>{desc}</td></tr>",
                id = escape(&v.id),
                sev = v.severity,
                desc = escape(&v.description),
            );
        }
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
