//! Surface discovery and identity resolution.
//!
//! Two traversals share the same identity rules:
//! - [`SurfaceWalker`] follows attributes from the root module depth-first,
//!   expanding every in-scope module exactly once.
//! - [`ExportScanner`] visits every importable module found by path discovery
//!   and indexes what their export lists declare.
//!
//! [`coverage::compare`] lines the two results up against each other.

pub mod coverage;
mod registry;
mod scan;
mod walker;

pub use coverage::CoverageReport;
pub use registry::{IdentityRegistry, VisitedSet};
pub use scan::{ApiEntry, ApiIndex, ExportScanner, clean_doc};
pub use walker::SurfaceWalker;

use crate::digest::ContentDigest;
use crate::reflect::IdentityToken;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Which names are in play for a run.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Containers must equal this name or live under it.
    pub prefix: String,
    /// Sub-namespaces that are never expanded (native or opaque internals).
    pub exclude: Vec<String>,
    /// Qualified names exempt from error reporting.
    pub skip: BTreeSet<String>,
}

impl Scope {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(exclude.into_iter().map(Into::into));
        self
    }

    pub fn with_skip<I, S>(mut self, skip: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(skip.into_iter().map(Into::into));
        self
    }

    /// Whether a container with this qualified name should be expanded.
    pub fn admits(&self, name: &str) -> bool {
        is_within(name, &self.prefix) && !self.exclude.iter().any(|ns| is_within(name, ns))
    }

    pub fn is_skipped(&self, qualified_name: &str) -> bool {
        self.skip.contains(qualified_name)
    }
}

fn is_within(name: &str, namespace: &str) -> bool {
    name == namespace
        || (name.len() > namespace.len()
            && name.starts_with(namespace)
            && name.as_bytes()[namespace.len()] == b'.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Found by enumerating a class's members rather than a module's.
    ClassMethod,
}

/// One uniquely identified public symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRecord {
    /// Canonical name first, then aliases in discovery order.
    pub names: Vec<String>,
    pub digest: ContentDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
}

impl SurfaceRecord {
    pub fn new(name: String, digest: ContentDigest) -> Self {
        Self {
            names: vec![name],
            digest,
            kind: None,
        }
    }

    pub fn canonical_name(&self) -> &str {
        &self.names[0]
    }

    pub fn aliases(&self) -> &[String] {
        &self.names[1..]
    }

    fn add_alias(&mut self, name: String) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }
}

/// An object reached under a name other than the one it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasNote {
    pub alias: String,
    pub original: String,
}

/// Result of a module-tree walk.
#[derive(Debug, Default)]
pub struct SurfaceReport {
    /// Records keyed (and therefore ordered) by canonical name.
    pub records: BTreeMap<String, SurfaceRecord>,
    pub aliases: Vec<AliasNote>,
    /// Qualified names whose attribute access failed, minus the skip-list.
    pub errors: BTreeSet<String>,
    pub modules_visited: usize,
    owners: HashMap<IdentityToken, String>,
}

impl SurfaceReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn get(&self, name: &str) -> Option<&SurfaceRecord> {
        self.records.get(name)
    }

    /// Canonical name of the record holding this identity.
    pub fn canonical_for(&self, token: IdentityToken) -> Option<&str> {
        self.owners.get(&token).map(String::as_str)
    }

    pub fn identities(&self) -> impl Iterator<Item = (IdentityToken, &str)> {
        self.owners.iter().map(|(token, name)| (*token, name.as_str()))
    }
}
