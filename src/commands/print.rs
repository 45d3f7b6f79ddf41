use crate::cli::{PrintArgs, PrintFormat};
use crate::output::{JsonOutput, ReportFormatter, SignatureOutput, write_diagnostics};
use crate::style;
use std::io;

use super::{CommandContext, emit};

pub fn cmd_print(args: PrintArgs) -> i32 {
    let ctx = match CommandContext::new(&args.package, &args.source) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let report = ctx.session.fingerprint();

    let mut buffer = Vec::new();
    let formatted = match args.format {
        PrintFormat::Text => SignatureOutput::new().format(&report, &mut buffer),
        PrintFormat::Json => JsonOutput::new().format(&report, &mut buffer),
    };
    if let Err(e) = formatted {
        style::error(&format!("Failed to format report: {}", e));
        return 1;
    }

    let code = emit(
        args.output.as_deref(),
        &String::from_utf8_lossy(&buffer),
        false,
    );
    if code != 0 {
        return code;
    }

    if let Err(e) = write_diagnostics(&report, &mut io::stderr()) {
        style::error(&format!("Failed to write diagnostics: {}", e));
        return 1;
    }

    report.exit_code()
}
