use super::serialize::Snapshot;
use crate::digest::ContentDigest;
use crate::surface::SurfaceRecord;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    pub baseline_created_at: String,
    pub current_created_at: String,

    /// Symbols with no name in the baseline.
    pub added: Vec<String>,

    /// Baseline symbols that no current name reaches.
    pub removed: Vec<String>,

    /// Symbols reachable in both whose documentation digest changed.
    pub doc_changed: Vec<String>,

    /// A removed and an added symbol carrying the same documentation.
    pub renamed: Vec<Rename>,

    /// Errors present now that the baseline did not have.
    pub new_errors: Vec<String>,
}

impl SnapshotDiff {
    pub fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.doc_changed.is_empty()
            && self.renamed.is_empty()
            && self.new_errors.is_empty()
    }
}

/// Records by every name they answer to.
fn by_name(snapshot: &Snapshot) -> HashMap<&str, &SurfaceRecord> {
    snapshot
        .records
        .iter()
        .flat_map(|r| r.names.iter().map(move |name| (name.as_str(), r)))
        .collect()
}

pub fn compute_diff(baseline: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    let baseline_names = by_name(baseline);
    let current_names = by_name(current);

    let mut removed = Vec::new();
    let mut doc_changed = Vec::new();
    for record in &baseline.records {
        let found = record
            .names
            .iter()
            .find_map(|name| current_names.get(name.as_str()));
        match found {
            None => removed.push(record),
            Some(now) if now.digest != record.digest => {
                doc_changed.push(record.canonical_name().to_string())
            }
            Some(_) => {}
        }
    }

    let added: Vec<&SurfaceRecord> = current
        .records
        .iter()
        .filter(|r| {
            !r.names
                .iter()
                .any(|name| baseline_names.contains_key(name.as_str()))
        })
        .collect();

    // Undocumented symbols all share one digest, so they never pair up.
    let empty = ContentDigest::of_text("");
    let unique_digests = |records: &[&SurfaceRecord]| -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            if let Some(hex) = record.digest.as_hex() {
                if record.digest != empty {
                    *counts.entry(hex.to_string()).or_default() += 1;
                }
            }
        }
        counts
    };
    let removed_counts = unique_digests(&removed);
    let added_counts = unique_digests(&added);

    let mut renamed = Vec::new();
    let mut paired: HashSet<&str> = HashSet::new();
    for record in &removed {
        let Some(hex) = record.digest.as_hex() else {
            continue;
        };
        if removed_counts.get(hex) != Some(&1) || added_counts.get(hex) != Some(&1) {
            continue;
        }
        if let Some(target) = added.iter().find(|r| r.digest.as_hex() == Some(hex)) {
            paired.insert(record.canonical_name());
            paired.insert(target.canonical_name());
            renamed.push(Rename {
                from: record.canonical_name().to_string(),
                to: target.canonical_name().to_string(),
            });
        }
    }

    let mut added: Vec<String> = added
        .iter()
        .map(|r| r.canonical_name())
        .filter(|name| !paired.contains(name))
        .map(String::from)
        .collect();
    let mut removed: Vec<String> = removed
        .iter()
        .map(|r| r.canonical_name())
        .filter(|name| !paired.contains(name))
        .map(String::from)
        .collect();

    let baseline_errors: HashSet<&String> = baseline.errors.iter().collect();
    let new_errors: Vec<String> = current
        .errors
        .iter()
        .filter(|e| !baseline_errors.contains(e))
        .cloned()
        .collect();

    added.sort();
    removed.sort();
    doc_changed.sort();
    renamed.sort_by(|a, b| a.from.cmp(&b.from));

    SnapshotDiff {
        baseline_created_at: baseline.created_at.clone(),
        current_created_at: current.created_at.clone(),
        added,
        removed,
        doc_changed,
        renamed,
        new_errors,
    }
}

/// Format diff as markdown
pub fn format_diff_markdown(diff: &SnapshotDiff) -> String {
    let mut output = String::new();

    output.push_str("# API Surface Diff\n\n");

    output.push_str(&format!(
        "**Baseline**: {} | **Current**: {}\n\n",
        diff.baseline_created_at, diff.current_created_at
    ));

    output.push_str("## Summary\n\n");
    output.push_str(&format!(
        "- **Symbols**: +{} added, -{} removed, {} renamed\n",
        diff.added.len(),
        diff.removed.len(),
        diff.renamed.len()
    ));
    output.push_str(&format!(
        "- **Documentation changed**: {}\n",
        diff.doc_changed.len()
    ));
    output.push_str(&format!("- **New errors**: {}\n\n", diff.new_errors.len()));

    if !diff.removed.is_empty() {
        output.push_str(&format!("## Removed ({})\n\n", diff.removed.len()));
        for name in &diff.removed {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    if !diff.renamed.is_empty() {
        output.push_str(&format!("## Renamed ({})\n\n", diff.renamed.len()));
        for rename in &diff.renamed {
            output.push_str(&format!("- `{}` → `{}`\n", rename.from, rename.to));
        }
        output.push('\n');
    }

    if !diff.added.is_empty() {
        output.push_str(&format!("## Added ({})\n\n", diff.added.len()));
        for name in &diff.added {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    if !diff.doc_changed.is_empty() {
        output.push_str(&format!(
            "## Documentation Changed ({})\n\n",
            diff.doc_changed.len()
        ));
        for name in &diff.doc_changed {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    if !diff.new_errors.is_empty() {
        output.push_str(&format!("## New Errors ({})\n\n", diff.new_errors.len()));
        for name in &diff.new_errors {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    output
}

/// Format diff as JSON
pub fn format_diff_json(diff: &SnapshotDiff) -> String {
    use serde_json::json;

    let output = json!({
        "baseline_created_at": diff.baseline_created_at,
        "current_created_at": diff.current_created_at,
        "summary": {
            "added": diff.added.len(),
            "removed": diff.removed.len(),
            "renamed": diff.renamed.len(),
            "doc_changed": diff.doc_changed.len(),
            "new_errors": diff.new_errors.len()
        },
        "added": diff.added,
        "removed": diff.removed,
        "doc_changed": diff.doc_changed,
        "renamed": diff.renamed.iter().map(|r| {
            json!({"from": r.from, "to": r.to})
        }).collect::<Vec<_>>(),
        "new_errors": diff.new_errors
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(names: &[&str], doc: &str) -> SurfaceRecord {
        SurfaceRecord {
            names: names.iter().map(|n| n.to_string()).collect(),
            digest: ContentDigest::of_text(doc),
            kind: None,
        }
    }

    fn snapshot(records: Vec<SurfaceRecord>, errors: &[&str]) -> Snapshot {
        Snapshot {
            version: 1,
            created_at: "0".to_string(),
            package: "demo".to_string(),
            records,
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_added_removed_and_doc_changes() {
        let baseline = snapshot(
            vec![
                record(&["demo.foo"], "Computes X"),
                record(&["demo.gone"], ""),
                record(&["demo.keep", "demo.sub.keep"], "Keeps"),
            ],
            &[],
        );
        let current = snapshot(
            vec![
                record(&["demo.foo"], "Computes Y"),
                record(&["demo.new"], ""),
                // Canonical name moved but the alias still resolves.
                record(&["demo.sub.keep"], "Keeps"),
            ],
            &["demo.broken"],
        );

        let diff = compute_diff(&baseline, &current);
        assert_eq!(diff.added, vec!["demo.new"]);
        assert_eq!(diff.removed, vec!["demo.gone"]);
        assert_eq!(diff.doc_changed, vec!["demo.foo"]);
        assert!(diff.renamed.is_empty());
        assert_eq!(diff.new_errors, vec!["demo.broken"]);
        assert!(diff.has_removals());
    }

    #[test]
    fn test_rename_pairs_unique_documentation() {
        let baseline = snapshot(
            vec![
                record(&["demo.old_name"], "Does the thing"),
                record(&["demo.a"], ""),
            ],
            &[],
        );
        let current = snapshot(
            vec![
                record(&["demo.new_name"], "Does the thing"),
                record(&["demo.b"], ""),
            ],
            &[],
        );

        let diff = compute_diff(&baseline, &current);
        assert_eq!(
            diff.renamed,
            vec![Rename {
                from: "demo.old_name".to_string(),
                to: "demo.new_name".to_string()
            }]
        );
        assert_eq!(diff.added, vec!["demo.b"]);
        assert_eq!(diff.removed, vec!["demo.a"]);

        let markdown = format_diff_markdown(&diff);
        assert!(markdown.contains("`demo.old_name` → `demo.new_name`"));
        let json: serde_json::Value = serde_json::from_str(&format_diff_json(&diff)).unwrap();
        assert_eq!(json["summary"]["renamed"], 1);
    }

    #[test]
    fn test_identical_snapshots_have_no_diff() {
        let baseline = snapshot(vec![record(&["demo.foo"], "Computes X")], &[]);
        let diff = compute_diff(&baseline, &baseline.clone());
        assert!(diff.is_empty());
    }
}
