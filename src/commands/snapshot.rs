use crate::cli::SnapshotArgs;
use crate::fs::RealFs;
use crate::snapshot::{Snapshot, save_snapshot};
use crate::style;

use super::CommandContext;

pub fn cmd_snapshot(args: SnapshotArgs) -> i32 {
    let ctx = match CommandContext::new(&args.package, &args.source) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let report = ctx.session.fingerprint();
    let snapshot = Snapshot::from_report(ctx.session.name(), &report);

    let output_path = &args.save;
    if let Err(e) = save_snapshot(&RealFs, &snapshot, output_path) {
        style::error(&format!("Failed to save snapshot: {}", e));
        return 1;
    }

    style::success(&format!("Snapshot saved to: {}", style::path(output_path)));
    style::section("Summary");
    println!("{}", style::metric("Symbols", snapshot.records.len()));
    println!(
        "{}",
        style::metric(
            "Aliases",
            snapshot.records.iter().map(|r| r.aliases().len()).sum::<usize>()
        )
    );
    println!("{}", style::metric("Modules", report.modules_visited));
    println!("{}", style::metric("Unreachable", snapshot.errors.len()));

    if !snapshot.errors.is_empty() {
        style::warning(&format!(
            "{} members could not be reached; run `apisig print` for details",
            snapshot.errors.len()
        ));
    }

    0
}
