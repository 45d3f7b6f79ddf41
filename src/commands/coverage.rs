use crate::cli::{CoverageArgs, OutputFormat};
use crate::surface::coverage::{format_coverage_json, format_coverage_markdown};

use super::{CommandContext, emit};

/// Divergences are reported, not treated as failure.
pub fn cmd_coverage(args: CoverageArgs) -> i32 {
    let ctx = match CommandContext::new(&args.package, &args.source) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let report = ctx.session.coverage();

    let output_str = match args.format {
        OutputFormat::Markdown => format_coverage_markdown(&report),
        OutputFormat::Json => format!("{}\n", format_coverage_json(&report)),
    };

    emit(
        args.output.as_deref(),
        &output_str,
        args.format == OutputFormat::Markdown,
    )
}
