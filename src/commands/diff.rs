use crate::cli::{DiffArgs, OutputFormat};
use crate::fs::RealFs;
use crate::snapshot::{
    Snapshot, compute_diff, format_diff_json, format_diff_markdown, load_snapshot,
};
use crate::style;

use super::{CommandContext, emit};

pub fn cmd_diff(args: DiffArgs) -> i32 {
    let baseline = match load_snapshot(&RealFs, &args.baseline) {
        Ok(s) => s,
        Err(e) => {
            style::error(&format!("Failed to load baseline snapshot: {}", e));
            return 1;
        }
    };

    let ctx = match CommandContext::new(&args.package, &args.source) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    if baseline.package != ctx.session.name() {
        style::warning(&format!(
            "baseline was taken of `{}`, comparing against `{}`",
            baseline.package,
            ctx.session.name()
        ));
    }

    let current = Snapshot::from_report(ctx.session.name(), &ctx.session.fingerprint());
    let diff = compute_diff(&baseline, &current);

    let output_str = match args.format {
        OutputFormat::Markdown => format_diff_markdown(&diff),
        OutputFormat::Json => format!("{}\n", format_diff_json(&diff)),
    };

    let code = emit(
        args.output.as_deref(),
        &output_str,
        args.format == OutputFormat::Markdown,
    );
    if code != 0 {
        return code;
    }

    if args.fail_on_removal && diff.has_removals() {
        style::error(&format!(
            "{} symbols were removed since the baseline",
            diff.removed.len()
        ));
        return 1;
    }

    0
}
