use crate::cli::ScanArgs;
use crate::output::format_index_json;

use super::{CommandContext, emit};

pub fn cmd_scan(args: ScanArgs) -> i32 {
    let ctx = match CommandContext::new(&args.package, &args.source) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let index = ctx.session.scan();

    let content = if args.json {
        format!("{}\n", format_index_json(&index))
    } else {
        index
            .canonical_names()
            .iter()
            .map(|name| format!("{}\n", name))
            .collect()
    };

    emit(args.output.as_deref(), &content, false)
}
