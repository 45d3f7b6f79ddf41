use crate::fs::{FileSystem, RealFs};
use crate::surface::Scope;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".apisig.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Namespace the walk stays inside. Defaults to the package name.
    pub prefix: Option<String>,
    /// Sub-namespaces that are never expanded.
    pub exclude: Vec<String>,
    /// Qualified names whose failures are not reported.
    pub skip: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    scope: Option<RawScope>,
    errors: Option<RawErrors>,
}

#[derive(Debug, Deserialize)]
struct RawScope {
    prefix: Option<String>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawErrors {
    skip: Option<Vec<String>>,
}

impl Config {
    pub fn load(project_path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_fs(project_path, &RealFs)
    }

    pub fn load_with_fs(project_path: &Path, fs: &dyn FileSystem) -> Result<Self, ConfigError> {
        let config_path = project_path.join(CONFIG_FILE);

        if !fs.exists(&config_path) {
            return Ok(Self::default());
        }

        let content = fs.read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        let (prefix, exclude) = match raw.scope {
            Some(scope) => (scope.prefix, scope.exclude.unwrap_or_default()),
            None => (None, Vec::new()),
        };
        let skip = raw.errors.and_then(|e| e.skip).unwrap_or_default();

        Ok(Self {
            prefix,
            exclude,
            skip,
        })
    }

    /// Scope for fingerprinting `package`, with extra skip-list entries
    /// from the command line.
    pub fn scope_for(&self, package: &str, extra_skip: &[String]) -> Scope {
        let prefix = self.prefix.clone().unwrap_or_else(|| package.to_string());
        Scope::new(prefix)
            .with_exclude(self.exclude.iter().cloned())
            .with_skip(self.skip.iter().chain(extra_skip).cloned())
    }
}

pub fn generate_config_template() -> String {
    r#"# apisig configuration

[scope]
# Only modules equal to or nested under this name are expanded.
# Defaults to the package being fingerprinted.
# prefix = "mypackage"

# Sub-namespaces that are never expanded, e.g. native internals.
# exclude = ["mypackage.core"]

[errors]
# Qualified names whose attribute failures do not fail the run.
# skip = ["mypackage.legacy_function"]
"#
    .to_string()
}
