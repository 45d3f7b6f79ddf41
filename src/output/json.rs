use crate::digest::ContentDigest;
use crate::output::ReportFormatter;
use crate::surface::{AliasNote, ApiIndex, RecordKind, SurfaceReport};
use serde::Serialize;
use std::io::Write;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    records: Vec<JsonRecord<'a>>,
    aliases: &'a [AliasNote],
    errors: Vec<&'a str>,
    modules_visited: usize,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    name: &'a str,
    aliases: &'a [String],
    digest: &'a ContentDigest,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<RecordKind>,
}

#[derive(Serialize)]
struct JsonIndex<'a> {
    collected: usize,
    distinct: usize,
    apis: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    names: &'a [String],
    type_name: &'a str,
    docstring: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<RecordKind>,
}

impl ReportFormatter for JsonOutput {
    fn format<W: Write>(&self, report: &SurfaceReport, writer: &mut W) -> std::io::Result<()> {
        let json_report = JsonReport {
            records: report
                .records
                .values()
                .map(|r| JsonRecord {
                    name: r.canonical_name(),
                    aliases: r.aliases(),
                    digest: &r.digest,
                    kind: r.kind,
                })
                .collect(),
            aliases: &report.aliases,
            errors: report.errors.iter().map(String::as_str).collect(),
            modules_visited: report.modules_visited,
        };

        let json = serde_json::to_string_pretty(&json_report).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)
    }
}

/// Export-scan index as JSON, entries sorted by canonical name.
pub fn format_index_json(index: &ApiIndex) -> String {
    let mut apis: Vec<JsonEntry> = index
        .entries()
        .iter()
        .map(|e| JsonEntry {
            names: &e.names,
            type_name: &e.type_name,
            docstring: e.docstring.as_deref(),
            kind: e.kind,
        })
        .collect();
    apis.sort_by(|a, b| a.names[0].cmp(&b.names[0]));

    let output = JsonIndex {
        collected: index.collected,
        distinct: index.len(),
        apis,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}
