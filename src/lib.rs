pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod digest;
pub mod fs;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod output;
pub mod parser;
pub mod reflect;
pub mod snapshot;
pub mod style;
pub mod surface;

pub use api::{ApisigError, FingerprintOptions, Session, coverage, fingerprint, scan};
pub use cli::Cli;
pub use commands::{cmd_coverage, cmd_diff, cmd_init, cmd_print, cmd_scan, cmd_snapshot};
pub use config::Config;
pub use digest::ContentDigest;
pub use reflect::{IdentityToken, Reflect, ReflectError};
pub use surface::{ApiIndex, CoverageReport, SurfaceRecord, SurfaceReport};
