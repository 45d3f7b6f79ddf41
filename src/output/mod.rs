mod diagnostics;
mod json;
mod signature;

pub use diagnostics::{alias_line, error_line, write_diagnostics};
pub use json::{JsonOutput, format_index_json};
pub use signature::SignatureOutput;

use crate::surface::SurfaceReport;
use std::io::Write;

pub trait ReportFormatter {
    fn format<W: Write>(&self, report: &SurfaceReport, writer: &mut W) -> std::io::Result<()>;
}
