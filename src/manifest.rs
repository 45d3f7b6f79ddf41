//! Object graphs read from a JSON metadata table.
//!
//! The table is what a runtime-reflection dump of a live library looks like:
//!
//! ```json
//! {
//!   "root": "demo",
//!   "objects": [
//!     { "id": 0, "kind": "module", "name": "demo", "exports": ["foo"],
//!       "members": { "foo": 1, "broken": null } },
//!     { "id": 1, "kind": "function", "name": "foo", "doc": "Computes X" }
//!   ]
//! }
//! ```
//!
//! A member whose value is `null`, `{"error": "..."}` or an id that is not
//! in the table fails on attribute access.

use crate::fs::FileSystem;
use crate::loader::LoadedPackage;
use crate::model::{DocText, Object, ObjectGraph, ObjectId, ObjectKind};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object id {0} appears more than once")]
    DuplicateId(u64),
    #[error("root module `{0}` is not in the manifest")]
    RootNotFound(String),
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    root: String,
    objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KindEntry {
    Module,
    Class,
    Function,
    Constant,
    Opaque,
}

impl From<KindEntry> for ObjectKind {
    fn from(kind: KindEntry) -> Self {
        match kind {
            KindEntry::Module => ObjectKind::Module,
            KindEntry::Class => ObjectKind::Class,
            KindEntry::Function => ObjectKind::Function,
            KindEntry::Constant => ObjectKind::Constant,
            KindEntry::Opaque => ObjectKind::Opaque,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberEntry {
    Id(u64),
    Failure { error: String },
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    id: u64,
    kind: KindEntry,
    name: Option<String>,
    type_name: Option<String>,
    doc: Option<String>,
    /// Documentation that was not valid text, as raw bytes.
    doc_bytes: Option<Vec<u8>>,
    exports: Option<Vec<String>>,
    #[serde(default)]
    members: BTreeMap<String, Option<MemberEntry>>,
}

pub fn load_manifest(fs: &dyn FileSystem, path: &Path) -> Result<LoadedPackage, ManifestError> {
    let content = fs.read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content)
}

pub fn parse_manifest(json: &str) -> Result<LoadedPackage, ManifestError> {
    let manifest: ManifestFile = serde_json::from_str(json)?;

    let mut graph = ObjectGraph::new();
    let mut ids: HashMap<u64, ObjectId> = HashMap::new();

    for entry in &manifest.objects {
        let mut object = match entry.kind {
            KindEntry::Module => Object::module(entry.name.clone().unwrap_or_default()),
            // A nameless entry declares no name rather than an empty one.
            _ => {
                let mut object = Object::opaque(entry.name.clone());
                object.kind = entry.kind.into();
                object
            }
        };
        if entry.type_name.is_some() {
            object.type_name = entry.type_name.clone();
        }
        object.doc = match (&entry.doc, &entry.doc_bytes) {
            (Some(text), _) => Some(DocText::from(text.as_str())),
            (None, Some(bytes)) => Some(DocText::from_bytes(bytes.clone())),
            (None, None) => None,
        };
        object.exports = entry.exports.clone();

        let id = if object.is_module() {
            graph.add_module(object)
        } else {
            graph.add(object)
        };
        if ids.insert(entry.id, id).is_some() {
            return Err(ManifestError::DuplicateId(entry.id));
        }
    }

    for entry in &manifest.objects {
        let container = ids[&entry.id];
        for (name, member) in &entry.members {
            match member {
                Some(MemberEntry::Id(target)) => match ids.get(target) {
                    Some(&target) => graph.bind(container, name.clone(), target),
                    None => graph.bind_unavailable(
                        container,
                        name.clone(),
                        format!("dangling reference to object {}", target),
                    ),
                },
                Some(MemberEntry::Failure { error }) => {
                    graph.bind_unavailable(container, name.clone(), error.clone())
                }
                None => graph.bind_unavailable(container, name.clone(), "attribute access raised"),
            }
        }
    }

    let root = graph
        .module(&manifest.root)
        .ok_or_else(|| ManifestError::RootNotFound(manifest.root.clone()))?;
    Ok(LoadedPackage {
        name: manifest.root,
        graph,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;
    use crate::reflect::Reflect;
    use crate::surface::{Scope, SurfaceWalker};

    const DEMO: &str = r#"{
        "root": "demo",
        "objects": [
            { "id": 10, "kind": "module", "name": "demo", "exports": ["foo"],
              "members": { "foo": 11, "sub": 12, "broken": null,
                           "gone": 99, "odd": { "error": "RuntimeError: boom" } } },
            { "id": 11, "kind": "function", "name": "foo", "doc": "Computes X" },
            { "id": 12, "kind": "module", "name": "demo.sub", "members": { "bar": 11, "n": 13, "bad": 14 } },
            { "id": 13, "kind": "constant", "type_name": "int" },
            { "id": 14, "kind": "function", "name": "bad", "doc_bytes": [98, 255] }
        ]
    }"#;

    #[test]
    fn test_manifest_builds_graph() {
        let LoadedPackage { name, graph, root } = parse_manifest(DEMO).unwrap();
        assert_eq!(name, "demo");

        let foo = graph.get_attr(root, "foo").unwrap();
        let sub = graph.get_attr(root, "sub").unwrap();
        let bar = graph.get_attr(sub, "bar").unwrap();
        assert_eq!(graph.identity(foo), graph.identity(bar));
        assert_eq!(graph.doc(foo), Some(&DocText::from("Computes X")));
        assert!(graph.is_module(sub));
        assert_eq!(graph.type_name(graph.get_attr(sub, "n").unwrap()), "int");
        assert_eq!(graph.declared_name(graph.get_attr(sub, "n").unwrap()), None);

        let discovered: Vec<String> = graph
            .discover_modules("demo")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(discovered, vec!["demo", "demo.sub"]);
    }

    #[test]
    fn test_null_dangling_and_error_members_are_unavailable() {
        let LoadedPackage { graph, root, .. } = parse_manifest(DEMO).unwrap();
        for name in ["broken", "gone", "odd"] {
            assert!(graph.get_attr(root, name).is_err(), "{name} should fail");
        }
        let err = graph.get_attr(root, "odd").unwrap_err();
        assert!(err.to_string().contains("RuntimeError: boom"));
    }

    #[test]
    fn test_nameless_function_declares_no_name() {
        let json = r#"{"root": "a", "objects": [
            {"id": 0, "kind": "module", "name": "a", "members": {"f": 1}},
            {"id": 1, "kind": "function"}]}"#;
        let LoadedPackage { graph, root, .. } = parse_manifest(json).unwrap();
        let f = graph.get_attr(root, "f").unwrap();
        assert_eq!(graph.declared_name(f), None);
        assert_eq!(graph.type_name(f), "function");

        let scope = Scope::new("a");
        let report = SurfaceWalker::new(&graph, &scope).walk(root);
        assert!(report.aliases.is_empty());
        assert!(report.get("a.f").is_some());
    }

    #[test]
    fn test_doc_bytes_become_raw_doc() {
        let LoadedPackage { graph, root, .. } = parse_manifest(DEMO).unwrap();
        let sub = graph.get_attr(root, "sub").unwrap();
        let bad = graph.get_attr(sub, "bad").unwrap();
        assert!(matches!(graph.doc(bad), Some(DocText::Raw(_))));
    }

    #[test]
    fn test_duplicate_ids_and_missing_root() {
        let duplicate = r#"{"root": "a", "objects": [
            {"id": 1, "kind": "module", "name": "a"},
            {"id": 1, "kind": "function", "name": "f"}]}"#;
        assert!(matches!(
            parse_manifest(duplicate),
            Err(ManifestError::DuplicateId(1))
        ));

        let rootless = r#"{"root": "a", "objects": []}"#;
        assert!(matches!(
            parse_manifest(rootless),
            Err(ManifestError::RootNotFound(_))
        ));
        assert!(matches!(parse_manifest("{"), Err(ManifestError::Json(_))));
    }

    #[test]
    fn test_load_manifest_reads_through_filesystem() {
        let fs = MockFs::with_files([(Path::new("/dump/demo.json"), DEMO)]);
        let loaded = load_manifest(&fs, Path::new("/dump/demo.json")).unwrap();
        assert_eq!(loaded.graph.module_count(), 2);

        let err = load_manifest(&fs, Path::new("/dump/missing.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
