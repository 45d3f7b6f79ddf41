//! Clean library API for apisig.
//!
//! Unlike the CLI commands which print output and return exit codes, these
//! functions return proper Result types that can be handled by calling code.
//!
//! # Example
//!
//! ```no_run
//! use apisig::{fingerprint, FingerprintOptions};
//!
//! let report = fingerprint("demo", &FingerprintOptions::default())?;
//! for record in report.records.values() {
//!     println!("{} {}", record.canonical_name(), record.digest);
//! }
//! std::process::exit(report.exit_code());
//! # Ok::<(), apisig::ApisigError>(())
//! ```

use crate::config::{Config, ConfigError};
use crate::fs::{FileSystem, RealFs};
use crate::loader::{LoadError, LoadedPackage, PackageLoader};
use crate::manifest::{ManifestError, load_manifest};
use crate::model::ObjectGraph;
use crate::snapshot::SnapshotError;
use crate::surface::{
    ApiIndex, CoverageReport, ExportScanner, Scope, SurfaceReport, SurfaceWalker, coverage,
};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during apisig operations.
#[derive(Debug, Error)]
pub enum ApisigError {
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The package could not be found or read.
    #[error("{0}")]
    Load(#[from] LoadError),

    /// The metadata manifest could not be read.
    #[error("{0}")]
    Manifest(#[from] ManifestError),

    /// The manifest has no module with the requested name.
    #[error("package `{0}` is not in the manifest")]
    PackageNotInManifest(String),

    #[error("{0}")]
    Snapshot(#[from] SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where to find the package and what to leave out.
#[derive(Debug, Clone)]
pub struct FingerprintOptions {
    /// Directory holding the package (and `.apisig.toml`).
    pub search_path: PathBuf,

    /// Read the object graph from this JSON manifest instead of sources.
    pub manifest: Option<PathBuf>,

    /// Extra qualified names exempt from error reporting.
    pub skip: Vec<String>,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            search_path: PathBuf::from("."),
            manifest: None,
            skip: Vec::new(),
        }
    }
}

/// A loaded package ready to be walked or scanned any number of times.
pub struct Session {
    package: LoadedPackage,
    scope: Scope,
}

impl Session {
    pub fn open(package: &str, options: &FingerprintOptions) -> Result<Self, ApisigError> {
        Self::open_with_fs(package, options, &RealFs)
    }

    pub fn open_with_fs(
        package: &str,
        options: &FingerprintOptions,
        fs: &dyn FileSystem,
    ) -> Result<Self, ApisigError> {
        let config = Config::load_with_fs(&options.search_path, fs)?;

        let loaded = match &options.manifest {
            Some(manifest) => {
                let mut loaded = load_manifest(fs, manifest)?;
                if loaded.name != package {
                    loaded.root = loaded
                        .graph
                        .module(package)
                        .ok_or_else(|| ApisigError::PackageNotInManifest(package.to_string()))?;
                    loaded.name = package.to_string();
                }
                loaded
            }
            None => PackageLoader::new(fs, &options.search_path).load(package)?,
        };

        Ok(Self {
            scope: config.scope_for(package, &options.skip),
            package: loaded,
        })
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.package.graph
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Attribute walk from the root module.
    pub fn fingerprint(&self) -> SurfaceReport {
        SurfaceWalker::new(&self.package.graph, &self.scope).walk(self.package.root)
    }

    /// Export-list scan over every discovered module.
    pub fn scan(&self) -> ApiIndex {
        ExportScanner::new(&self.package.graph, &self.scope).scan(&self.package.name)
    }

    pub fn coverage(&self) -> CoverageReport {
        coverage::compare(&self.package.name, &self.fingerprint(), &self.scan())
    }
}

/// Fingerprint a package's public surface.
///
/// Records are keyed by canonical name; `report.errors` lists members whose
/// attribute access failed. A report with errors still carries every record
/// that could be produced.
pub fn fingerprint(
    package: &str,
    options: &FingerprintOptions,
) -> Result<SurfaceReport, ApisigError> {
    Ok(Session::open(package, options)?.fingerprint())
}

/// Index everything the package's export lists declare.
pub fn scan(package: &str, options: &FingerprintOptions) -> Result<ApiIndex, ApisigError> {
    Ok(Session::open(package, options)?.scan())
}

/// Compare the attribute walk with the export scan.
pub fn coverage(
    package: &str,
    options: &FingerprintOptions,
) -> Result<CoverageReport, ApisigError> {
    Ok(Session::open(package, options)?.coverage())
}
