mod coverage;
mod diff;
mod init;
mod print;
mod scan;
mod snapshot;

pub use coverage::cmd_coverage;
pub use diff::cmd_diff;
pub use init::cmd_init;
pub use print::cmd_print;
pub use scan::cmd_scan;
pub use snapshot::cmd_snapshot;

use crate::api::{ApisigError, FingerprintOptions, Session};
use crate::cli::SourceArgs;
use crate::fs::{FileSystem, RealFs};
use crate::loader::LoadError;
use crate::style;
use std::io;
use std::path::Path;

/// Shared context for command execution, reducing boilerplate across commands.
pub struct CommandContext {
    pub session: Session,
}

impl CommandContext {
    /// Load the package and its configuration.
    /// Returns Err(exit_code) if setup fails.
    pub fn new(package: &str, source: &SourceArgs) -> Result<Self, i32> {
        if !source.path.is_dir() {
            style::error(&format!(
                "Could not resolve path: {}",
                style::path(&source.path)
            ));
            return Err(1);
        }

        let options = FingerprintOptions {
            search_path: source.path.clone(),
            manifest: source.manifest.clone(),
            skip: source.skip.clone(),
        };

        match Session::open(package, &options) {
            Ok(session) => Ok(Self { session }),
            Err(e) => {
                style::error(&e.to_string());
                if matches!(e, ApisigError::Load(LoadError::PackageNotFound { .. })) {
                    style::hint("use --path to point at the directory that contains the package");
                }
                Err(1)
            }
        }
    }
}

/// Write command output to a file, or to stdout. Markdown bound for a
/// terminal is rendered.
fn emit(output: Option<&Path>, content: &str, markdown: bool) -> i32 {
    emit_with_fs(output, content, markdown, &RealFs)
}

fn emit_with_fs(output: Option<&Path>, content: &str, markdown: bool, fs: &dyn FileSystem) -> i32 {
    let result = match output {
        Some(path) => fs.write(path, content),
        None if markdown => style::render_markdown(content, &mut io::stdout()),
        None => {
            print!("{}", content);
            Ok(())
        }
    };

    if let Err(e) = result {
        style::error(&format!("Failed to write output: {}", e));
        return 1;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;

    #[test]
    fn test_emit_writes_to_file() {
        let fs = MockFs::new();
        let code = emit_with_fs(Some(Path::new("/out.txt")), "demo.foo\n", false, &fs);
        assert_eq!(code, 0);
        assert_eq!(fs.read_to_string(Path::new("/out.txt")).unwrap(), "demo.foo\n");
    }

    #[test]
    fn test_missing_search_path_fails_setup() {
        let source = SourceArgs {
            path: "/nonexistent/apisig/path".into(),
            ..Default::default()
        };
        assert_eq!(CommandContext::new("demo", &source).err(), Some(1));
    }
}
