//! Alias and error lines for stderr. The wording is fixed; downstream tooling
//! greps for it.

use crate::surface::{AliasNote, SurfaceReport};
use std::io::Write;

pub fn alias_line(note: &AliasNote) -> String {
    format!(
        "Found alias API, alias name is: {}, original name is: {}",
        note.alias, note.original
    )
}

pub fn error_line(name: &str) -> String {
    format!("Error, new function {} is unreachable", name)
}

/// Alias notes in discovery order, then errors in name order.
pub fn write_diagnostics<W: Write>(report: &SurfaceReport, writer: &mut W) -> std::io::Result<()> {
    for note in &report.aliases {
        writeln!(writer, "{}", alias_line(note))?;
    }
    for name in &report.errors {
        writeln!(writer, "{}", error_line(name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Object, ObjectGraph};
    use crate::surface::{Scope, SurfaceWalker};

    #[test]
    fn test_alias_then_error_lines() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let foo = graph.add(Object::function("foo"));
        graph.bind(demo, "bar", foo);
        graph.bind_unavailable(demo, "broken", "ImportError");

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        let mut out = Vec::new();
        write_diagnostics(&report, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Found alias API, alias name is: bar, original name is: foo\n\
             Error, new function demo.broken is unreachable\n"
        );
    }
}
