use crate::output::ReportFormatter;
use crate::surface::{SurfaceRecord, SurfaceReport};
use std::io::Write;

/// One line per record, in canonical-name order:
///
/// ```text
/// demo.foo (demo.foo, ('document', '3f2a...'))
/// ```
///
/// An undigestable record prints an empty digest.
pub struct SignatureOutput;

impl SignatureOutput {
    pub fn new() -> Self {
        Self
    }

    pub fn line(record: &SurfaceRecord) -> String {
        let name = record.canonical_name();
        format!("{} ({}, ('document', '{}'))", name, name, record.digest)
    }
}

impl Default for SignatureOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for SignatureOutput {
    fn format<W: Write>(&self, report: &SurfaceReport, writer: &mut W) -> std::io::Result<()> {
        for record in report.records.values() {
            writeln!(writer, "{}", Self::line(record))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::ContentDigest;
    use crate::model::{DocText, Object, ObjectGraph};
    use crate::surface::{Scope, SurfaceWalker};

    #[test]
    fn test_lines_are_sorted_and_exact() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let zeta = graph.add(Object::function("zeta"));
        let foo = graph.add(Object::function("foo").with_doc("Computes X"));
        graph.bind(demo, "zeta", zeta);
        graph.bind(demo, "foo", foo);

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        let mut out = Vec::new();
        SignatureOutput::new().format(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let foo_digest = ContentDigest::of_text("Computes X");
        let empty_digest = ContentDigest::of_text("");
        assert_eq!(
            text,
            format!(
                "demo.foo (demo.foo, ('document', '{}'))\ndemo.zeta (demo.zeta, ('document', '{}'))\n",
                foo_digest, empty_digest
            )
        );
    }

    #[test]
    fn test_undigestable_prints_empty_digest() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let bad = graph.add(Object::function("bad").with_doc(DocText::Raw(vec![0xff])));
        graph.bind(demo, "bad", bad);

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        let mut out = Vec::new();
        SignatureOutput::new().format(&report, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "demo.bad (demo.bad, ('document', ''))\n"
        );
    }
}
