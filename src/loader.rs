//! Builds an [`ObjectGraph`] from a Python package on disk, without running it.
//!
//! Every module under the package directory is parsed and becomes an
//! importable module object. Names are bound the way the import system would
//! bind them: definitions create objects, `import`/`from ... import` and plain
//! aliases (`bar = foo`) point at existing ones, and a name that cannot be
//! bound is kept as an unavailable member carrying the import error.
//!
//! Submodules appear as attributes of their parent only when importing the
//! root package loads them.

use crate::fs::FileSystem;
use crate::model::{DocText, Member, Object, ObjectGraph, ObjectId, ObjectKind};
use crate::parser::{ModuleSource, ParseError, PythonParser, Statement, Value};
use ignore::WalkBuilder;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use petgraph::visit::Dfs;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("`{0}` is not a valid package name")]
    InvalidName(String),
    #[error("package `{package}` not found in {}", .path.display())]
    PackageNotFound { package: String, path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse module `{module}`: {source}")]
    Parse { module: String, source: ParseError },
}

/// An object graph plus the handle of the package it was built for.
#[derive(Debug)]
pub struct LoadedPackage {
    /// Dotted name of the root package.
    pub name: String,
    pub graph: ObjectGraph,
    pub root: ObjectId,
}

#[derive(Debug, Clone)]
struct ModuleFile {
    name: String,
    path: PathBuf,
    is_package: bool,
    /// Compiled extension module; nothing inside it can be read.
    native: bool,
}

pub struct PackageLoader<'a> {
    fs: &'a dyn FileSystem,
    search_path: PathBuf,
    parser: PythonParser,
}

impl<'a> PackageLoader<'a> {
    /// `search_path` is the directory the package lives in, like an entry of
    /// the module search path.
    pub fn new(fs: &'a dyn FileSystem, search_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            search_path: search_path.into(),
            parser: PythonParser::new(),
        }
    }

    pub fn load(&self, package: &str) -> Result<LoadedPackage, LoadError> {
        let files = self.discover(package)?;

        let mut sources = BTreeMap::new();
        let mut native = BTreeSet::new();
        for file in &files {
            if file.native {
                native.insert(file.name.clone());
                continue;
            }
            let bytes = self.fs.read(&file.path).map_err(|source| LoadError::Io {
                path: file.path.clone(),
                source,
            })?;
            let module = self
                .parser
                .parse_module(&file.name, file.is_package, &bytes)
                .map_err(|source| LoadError::Parse {
                    module: file.name.clone(),
                    source,
                })?;
            sources.insert(file.name.clone(), module);
        }

        let loaded = loaded_modules(package, &sources, &native);
        debug!(
            "{}: {} modules discovered, {} loaded on import",
            package,
            files.len(),
            loaded.len()
        );

        let mut resolver = Resolver::new(package, &sources, &native, &loaded);
        resolver.materialize();

        let graph = resolver.graph;
        let root = graph
            .module(package)
            .ok_or_else(|| LoadError::PackageNotFound {
                package: package.to_string(),
                path: self.search_path.clone(),
            })?;
        Ok(LoadedPackage {
            name: package.to_string(),
            graph,
            root,
        })
    }

    fn discover(&self, package: &str) -> Result<Vec<ModuleFile>, LoadError> {
        if !is_identifier(package) {
            return Err(LoadError::InvalidName(package.to_string()));
        }

        let package_dir = self.search_path.join(package);
        if self.fs.exists(&package_dir.join("__init__.py")) {
            return Ok(self.walk_package(package, &package_dir));
        }

        let single = self.search_path.join(format!("{}.py", package));
        if self.fs.exists(&single) {
            return Ok(vec![ModuleFile {
                name: package.to_string(),
                path: single,
                is_package: false,
                native: false,
            }]);
        }

        Err(LoadError::PackageNotFound {
            package: package.to_string(),
            path: self.search_path.clone(),
        })
    }

    fn walk_package(&self, package: &str, dir: &Path) -> Vec<ModuleFile> {
        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(|entry| entry.file_name() != "__pycache__")
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut modules = Vec::new();
        for entry in walker.flatten() {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            if let Some(module) = self.module_file(package, dir, relative) {
                modules.push(module);
            }
        }
        modules
    }

    /// Module for a file at `relative` inside the package directory, if the
    /// import system could reach it.
    fn module_file(&self, package: &str, dir: &Path, relative: &Path) -> Option<ModuleFile> {
        let mut parts = vec![package.to_string()];
        let mut current = dir.to_path_buf();
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                let segment = component.as_os_str().to_str()?;
                current.push(segment);
                // Directories without `__init__.py` are not packages.
                if !is_identifier(segment) || !self.fs.exists(&current.join("__init__.py")) {
                    return None;
                }
                parts.push(segment.to_string());
            }
        }

        let file_name = relative.file_name()?.to_str()?;
        let path = dir.join(relative);
        if file_name == "__init__.py" {
            return Some(ModuleFile {
                name: parts.join("."),
                path,
                is_package: true,
                native: false,
            });
        }

        let native = file_name.ends_with(".so") || file_name.ends_with(".pyd");
        let stem = if native {
            // `core.cpython-312-x86_64-linux-gnu.so` is module `core`.
            file_name.split('.').next()?
        } else {
            file_name.strip_suffix(".py")?
        };
        if !is_identifier(stem) {
            return None;
        }
        parts.push(stem.to_string());

        Some(ModuleFile {
            name: parts.join("."),
            path,
            is_package: false,
            native,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn within(name: &str, package: &str) -> bool {
    name == package
        || name
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn parent_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}

/// `a.b.c` -> `a`, `a.b`, `a.b.c`
fn with_ancestors(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('.')
        .map(move |(i, _)| &name[..i])
        .chain(std::iter::once(name))
}

/// Modules that end up imported when the root package is imported.
fn loaded_modules(
    root: &str,
    sources: &BTreeMap<String, ModuleSource>,
    native: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes = HashMap::new();
    for name in sources.keys().chain(native.iter()) {
        nodes.insert(name.clone(), graph.add_node(name.clone()));
    }

    for (name, module) in sources {
        let from = nodes[name];
        for import in &module.imports {
            for target in with_ancestors(import) {
                if let Some(&to) = nodes.get(target) {
                    if to != from {
                        graph.update_edge(from, to, ());
                    }
                }
            }
        }
    }

    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let mut names: Vec<&str> = scc.iter().map(|idx| graph[*idx].as_str()).collect();
            names.sort();
            debug!("import cycle: {}", names.join(" -> "));
        }
    }

    // Importing a submodule imports its parent package first.
    for (name, &idx) in &nodes {
        if let Some(&parent) = parent_of(name).and_then(|p| nodes.get(p)) {
            graph.update_edge(idx, parent, ());
        }
    }

    let mut loaded = BTreeSet::new();
    let Some(&start) = nodes.get(root) else {
        return loaded;
    };
    let mut dfs = Dfs::new(&graph, start);
    while let Some(idx) = dfs.next(&graph) {
        loaded.insert(graph[idx].clone());
    }
    loaded
}

/// Outcome of binding one name: the object, or the import error text.
type Resolved = Result<ObjectId, String>;

/// Lazily binds `(module, name)` pairs, each exactly once.
struct Resolver<'s> {
    package: &'s str,
    sources: &'s BTreeMap<String, ModuleSource>,
    loaded: &'s BTreeSet<String>,
    graph: ObjectGraph,
    memo: HashMap<(String, String), Resolved>,
    pending: HashSet<(String, String)>,
    /// Times a lookup ran into a name still being resolved. A failure seen
    /// after such a hit depends on where resolution started, so it is not
    /// memoized.
    cycle_hits: usize,
    /// Placeholders for names from outside the package, by dotted path.
    externals: HashMap<String, ObjectId>,
    external_paths: HashMap<ObjectId, String>,
}

impl<'s> Resolver<'s> {
    fn new(
        package: &'s str,
        sources: &'s BTreeMap<String, ModuleSource>,
        native: &BTreeSet<String>,
        loaded: &'s BTreeSet<String>,
    ) -> Self {
        let mut graph = ObjectGraph::new();
        let names: BTreeSet<&String> = sources.keys().chain(native.iter()).collect();
        for name in names {
            let mut module = Object::module(name.clone());
            if let Some(source) = sources.get(name) {
                module.doc = source.doc.clone();
                module.exports = source.exports.clone();
            }
            graph.add_module(module);
        }

        Self {
            package,
            sources,
            loaded,
            graph,
            memo: HashMap::new(),
            pending: HashSet::new(),
            cycle_hits: 0,
            externals: HashMap::new(),
            external_paths: HashMap::new(),
        }
    }

    /// Bind every name each module defines, plus its loaded submodules.
    fn materialize(&mut self) {
        let sources = self.sources;
        for (module_name, source) in sources {
            let Some(module_id) = self.graph.module(module_name) else {
                continue;
            };

            let mut names: BTreeSet<String> = source.bound_names().map(String::from).collect();
            for statement in &source.statements {
                if let Statement::Star { module } = statement {
                    names.extend(self.star_names(module));
                }
            }
            for child in self.loaded {
                if parent_of(child) == Some(module_name.as_str()) {
                    if let Some((_, short)) = child.rsplit_once('.') {
                        names.insert(short.to_string());
                    }
                }
            }

            for name in names {
                match self.resolve_name(module_name, &name) {
                    Ok(target) => self.graph.bind(module_id, name, target),
                    Err(reason) => {
                        debug!("{}.{} is unavailable: {}", module_name, name, reason);
                        self.graph.bind_unavailable(module_id, name, reason);
                    }
                }
            }
        }
    }

    fn resolve_name(&mut self, module: &str, name: &str) -> Resolved {
        let key = (module.to_string(), name.to_string());
        if let Some(resolved) = self.memo.get(&key) {
            return resolved.clone();
        }
        if !self.pending.insert(key.clone()) {
            self.cycle_hits += 1;
            return Err(format!(
                "cannot import name '{}' from partially initialized module '{}' \
                 (most likely due to a circular import)",
                name, module
            ));
        }

        let hits_before = self.cycle_hits;
        let resolved = self.lookup(module, name);
        self.pending.remove(&key);
        if resolved.is_ok() || self.cycle_hits == hits_before {
            self.memo.insert(key, resolved.clone());
        }
        resolved
    }

    /// The last statement binding `name` wins. A star import that cannot
    /// supply the name binds nothing, so earlier statements still count.
    fn lookup(&mut self, module: &str, name: &str) -> Resolved {
        let sources = self.sources;
        let mut star_failure = None;
        if let Some(source) = sources.get(module) {
            for statement in source.statements.iter().rev() {
                match statement {
                    Statement::Bind { name: bound, value } if bound == name => {
                        return self.resolve_value(module, value);
                    }
                    Statement::Star { module: from } if self.star_names(from).contains(name) => {
                        match self.resolve_name(from, name) {
                            Ok(id) => return Ok(id),
                            Err(reason) => {
                                star_failure.get_or_insert(reason);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let child = format!("{}.{}", module, name);
        if self.loaded.contains(&child) {
            if let Some(id) = self.graph.module(&child) {
                return Ok(id);
            }
        }
        Err(star_failure.unwrap_or_else(|| {
            format!("module '{}' has no attribute '{}'", module, name)
        }))
    }

    fn resolve_value(&mut self, module: &str, value: &Value) -> Resolved {
        match value {
            Value::Function { name, doc } => {
                Ok(self.graph.add(documented(Object::function(name.clone()), doc)))
            }
            Value::Class { name, doc, body } => Ok(self.build_class(module, name, doc, body)),
            Value::Constant { type_name } => {
                Ok(self.graph.add(Object::constant(type_name.clone())))
            }
            Value::Reference(path) => self.resolve_path(module, path),
            Value::Module(target) => self.import_module(target),
            Value::From { module: from, name } => self.import_from(from, name),
            Value::ImportError(reason) => Err(reason.clone()),
        }
    }

    fn build_class(
        &mut self,
        module: &str,
        name: &str,
        doc: &Option<DocText>,
        body: &[Statement],
    ) -> ObjectId {
        let class = self.graph.add(documented(Object::class(name), doc));
        for statement in body {
            let Statement::Bind {
                name: member,
                value,
            } = statement
            else {
                continue;
            };

            // Class bodies see their own earlier names before module globals.
            let resolved = match value {
                Value::Reference(path) => match self.graph.get(class).members.get(&path[0]) {
                    Some(Member::Bound(first)) => self.walk_attributes(*first, &path[1..]),
                    _ => self.resolve_path(module, path),
                },
                other => self.resolve_value(module, other),
            };

            match resolved {
                Ok(target) => self.graph.bind(class, member.clone(), target),
                Err(reason) => self.graph.bind_unavailable(class, member.clone(), reason),
            }
        }
        class
    }

    fn resolve_path(&mut self, module: &str, path: &[String]) -> Resolved {
        let Some((first, rest)) = path.split_first() else {
            return Err("empty reference".to_string());
        };
        let start = self.resolve_name(module, first)?;
        self.walk_attributes(start, rest)
    }

    fn walk_attributes(&mut self, start: ObjectId, path: &[String]) -> Resolved {
        let mut current = start;
        for part in path {
            current = self.attribute(current, part)?;
        }
        Ok(current)
    }

    fn attribute(&mut self, obj: ObjectId, name: &str) -> Resolved {
        if let Some(base) = self.external_paths.get(&obj) {
            let path = format!("{}.{}", base, name);
            return Ok(self.external(path, ObjectKind::Opaque, name));
        }

        let object = self.graph.get(obj);
        if object.kind == ObjectKind::Module {
            let module_name = object.name.clone().unwrap_or_default();
            return self.resolve_name(&module_name, name);
        }

        match object.members.get(name) {
            Some(Member::Bound(id)) => Ok(*id),
            Some(Member::Unavailable(reason)) => Err(reason.clone()),
            None => Err(format!(
                "'{}' object has no attribute '{}'",
                object.type_name(),
                name
            )),
        }
    }

    fn import_module(&mut self, target: &str) -> Resolved {
        if !within(target, self.package) {
            return Ok(self.external(target.to_string(), ObjectKind::Module, target));
        }
        self.graph
            .module(target)
            .ok_or_else(|| format!("No module named '{}'", target))
    }

    fn import_from(&mut self, from: &str, name: &str) -> Resolved {
        if !within(from, self.package) {
            let path = format!("{}.{}", from, name);
            return Ok(self.external(path, ObjectKind::Opaque, name));
        }
        if self.graph.module(from).is_none() {
            return Err(format!("No module named '{}'", from));
        }

        // `from pkg import name` falls back to importing submodule `pkg.name`.
        match self.resolve_name(from, name) {
            Ok(id) => Ok(id),
            Err(reason) => self
                .graph
                .module(&format!("{}.{}", from, name))
                .ok_or(reason),
        }
    }

    /// Shared stand-in for something defined outside the package.
    fn external(&mut self, path: String, kind: ObjectKind, declared: &str) -> ObjectId {
        if let Some(&id) = self.externals.get(&path) {
            return id;
        }
        let object = match kind {
            // Not registered as importable, so it is never in scope.
            ObjectKind::Module => Object::module(declared),
            _ => Object::opaque(Some(declared.to_string())),
        };
        let id = self.graph.add(object);
        self.externals.insert(path.clone(), id);
        self.external_paths.insert(id, path);
        id
    }

    /// Names `from module import *` brings in.
    fn star_names(&self, module: &str) -> BTreeSet<String> {
        let mut seen = HashSet::new();
        self.public_names(module, &mut seen)
    }

    fn public_names(&self, module: &str, seen: &mut HashSet<String>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        if !seen.insert(module.to_string()) {
            return names;
        }
        let Some(source) = self.sources.get(module) else {
            return names;
        };
        if let Some(exports) = &source.exports {
            return exports.iter().cloned().collect();
        }

        for statement in &source.statements {
            match statement {
                Statement::Bind { name, .. } if !name.starts_with('_') => {
                    names.insert(name.clone());
                }
                Statement::Star { module: from } => names.extend(self.public_names(from, seen)),
                _ => {}
            }
        }
        names
    }
}

fn documented(mut object: Object, doc: &Option<DocText>) -> Object {
    object.doc = doc.clone();
    object
}
