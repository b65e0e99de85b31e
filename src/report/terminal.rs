use std::collections::BTreeSet;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{AppLabel, Dependency, Severity, Vulnerability};

/// The line announcing which application is checked.
pub fn status_line(app: &AppLabel) -> String {
    format!("Checking dependencies for {app} ...")
}

/// One console line per finding.
pub fn finding_line(dep: &Dependency, vuln: &Vulnerability) -> String {
    format!("  {} [{}] {}", vuln.id, vuln.severity, dep.file_name)
}

pub fn print_status(app: &AppLabel) {
    println!("{}", status_line(app).bold());
}

/// Print one line per finding, then the summary (table or single line when `quiet`).
pub fn render(deps: &[Dependency], findings: &BTreeSet<Vulnerability>, quiet: bool) {
    let vulnerable = deps.iter().filter(|d| !d.vulnerabilities.is_empty()).count();

    if !quiet {
        for dep in deps {
            for vuln in &dep.vulnerabilities {
                let line = finding_line(dep, vuln);
                match vuln.severity {
                    Severity::Critical | Severity::High => println!("{}", line.red()),
                    Severity::Medium => println!("{}", line.yellow()),
                    Severity::Low | Severity::Unknown => println!("{}", line.dimmed()),
                }
            }
        }
    }

    let summary = format!(
        "Dependencies: {}  Vulnerable: {}  Vulnerabilities: {}",
        deps.len(),
        vulnerable,
        findings.len()
    );

    if quiet || findings.is_empty() {
        if findings.is_empty() {
            println!("{} {}", "✓".green(), summary);
        } else {
            println!("{} {}", "✗".red(), summary);
        }
        return;
    }

    println!();
    render_table(deps);
    println!("\n {} {}", "[VULNERABLE]".red().bold(), summary);
}

fn render_table(deps: &[Dependency]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Vulnerability").add_attribute(Attribute::Bold),
            Cell::new("Severity").add_attribute(Attribute::Bold),
        ]);

    for dep in deps.iter().filter(|d| !d.vulnerabilities.is_empty()) {
        for vuln in &dep.vulnerabilities {
            let severity_color = match vuln.severity {
                Severity::Critical => Color::Magenta,
                Severity::High => Color::Red,
                Severity::Medium => Color::Yellow,
                Severity::Low => Color::Green,
                Severity::Unknown => Color::DarkGrey,
            };

            table.add_row(vec![
                Cell::new(&dep.file_name),
                Cell::new(dep.name.as_deref().unwrap_or("-")),
                Cell::new(dep.version.as_deref().unwrap_or("-")),
                Cell::new(&vuln.id),
                Cell::new(vuln.severity.to_string())
                    .fg(severity_color)
                    .set_alignment(CellAlignment::Center),
            ]);
        }
    }

    println!("{}", table);
}
