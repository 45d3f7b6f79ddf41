use apisig::cli::{Cli, Command, PrintArgs};
use apisig::{cmd_coverage, cmd_diff, cmd_init, cmd_print, cmd_scan, cmd_snapshot};
use clap::{CommandFactory, Parser};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Some(Command::Print(args)) => cmd_print(args),
        Some(Command::Scan(args)) => cmd_scan(args),
        Some(Command::Coverage(args)) => cmd_coverage(args),
        Some(Command::Snapshot(args)) => cmd_snapshot(args),
        Some(Command::Diff(args)) => cmd_diff(args),
        Some(Command::Init(args)) => cmd_init(args),
        None => match cli.package {
            // A bare package name behaves like `print`
            Some(package) => cmd_print(PrintArgs {
                package,
                source: cli.source,
                format: Default::default(),
                output: None,
            }),
            None => {
                let _ = Cli::command().print_help();
                2
            }
        },
    };

    std::process::exit(exit_code);
}

/// Logs go to stderr so stdout stays a clean signature listing.
/// RUST_LOG overrides the verbosity flag.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "apisig=warn",
        1 => "apisig=debug",
        _ => "apisig=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
