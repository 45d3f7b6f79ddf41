//! Cross-check between the attribute walk and the export scan.
//!
//! Divergences are informational: the report lists them, the caller decides
//! what to do with them.

use super::{ApiIndex, RecordKind, SurfaceReport};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMismatch {
    pub walk: String,
    pub scan: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageReport {
    pub package: String,
    /// Objects the walk recorded that no export list declares.
    pub walk_only: Vec<String>,
    /// Exported objects the walk never reached.
    pub scan_only: Vec<String>,
    /// Objects both modes found under different canonical names.
    pub mismatched_names: Vec<NameMismatch>,
    pub shared: usize,
}

impl CoverageReport {
    pub fn is_consistent(&self) -> bool {
        self.scan_only.is_empty() && self.mismatched_names.is_empty()
    }
}

/// Compare by identity. Class members from the scan are left out since the
/// walk never descends into classes.
pub fn compare(package: &str, surface: &SurfaceReport, index: &ApiIndex) -> CoverageReport {
    let mut report = CoverageReport {
        package: package.to_string(),
        ..Default::default()
    };

    let mut exported = HashSet::new();
    for entry in index.entries() {
        if entry.kind == Some(RecordKind::ClassMethod) {
            continue;
        }
        exported.insert(entry.identity);

        match surface.canonical_for(entry.identity) {
            None => report.scan_only.push(entry.canonical_name().to_string()),
            Some(walk_name) => {
                report.shared += 1;
                if walk_name != entry.canonical_name() {
                    report.mismatched_names.push(NameMismatch {
                        walk: walk_name.to_string(),
                        scan: entry.canonical_name().to_string(),
                    });
                }
            }
        }
    }

    report.walk_only = surface
        .identities()
        .filter(|(token, _)| !exported.contains(token))
        .map(|(_, name)| name.to_string())
        .collect();

    report.walk_only.sort();
    report.scan_only.sort();
    report
        .mismatched_names
        .sort_by(|a, b| a.walk.cmp(&b.walk));
    report
}

pub fn format_coverage_markdown(report: &CoverageReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# API Coverage: {}\n\n", report.package));
    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Found by both**: {}\n", report.shared));
    output.push_str(&format!(
        "- **Only reachable by attribute walk**: {}\n",
        report.walk_only.len()
    ));
    output.push_str(&format!(
        "- **Only declared in export lists**: {}\n",
        report.scan_only.len()
    ));
    output.push_str(&format!(
        "- **Canonical name differs**: {}\n\n",
        report.mismatched_names.len()
    ));

    if !report.scan_only.is_empty() {
        output.push_str(&format!(
            "## Exported but Unreachable ({})\n\n",
            report.scan_only.len()
        ));
        for name in &report.scan_only {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    if !report.mismatched_names.is_empty() {
        output.push_str(&format!(
            "## Name Mismatches ({})\n\n",
            report.mismatched_names.len()
        ));
        for mismatch in &report.mismatched_names {
            output.push_str(&format!(
                "- `{}` (walk) vs `{}` (exports)\n",
                mismatch.walk, mismatch.scan
            ));
        }
        output.push('\n');
    }

    if !report.walk_only.is_empty() {
        output.push_str(&format!(
            "## Reachable but Not Exported ({})\n\n",
            report.walk_only.len()
        ));
        for name in &report.walk_only {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    output
}

pub fn format_coverage_json(report: &CoverageReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
