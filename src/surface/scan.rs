use super::{RecordKind, Scope};
use crate::model::DocText;
use crate::reflect::{IdentityToken, Reflect, is_malformed_export};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// One distinct object declared through export lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEntry {
    /// Every qualified name the object was declared under, first one canonical.
    pub names: Vec<String>,
    pub identity: IdentityToken,
    pub type_name: String,
    /// Documentation with indentation cleaned up, if the object has any.
    pub docstring: Option<String>,
    pub kind: Option<RecordKind>,
}

impl ApiEntry {
    pub fn canonical_name(&self) -> &str {
        &self.names[0]
    }
}

/// Identity-keyed index built by [`ExportScanner`].
#[derive(Debug, Default)]
pub struct ApiIndex {
    entries: Vec<ApiEntry>,
    by_identity: HashMap<IdentityToken, usize>,
    /// Successful insertions, counting repeats of the same object.
    pub collected: usize,
}

impl ApiIndex {
    pub fn entries(&self) -> &[ApiEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, token: IdentityToken) -> Option<&ApiEntry> {
        self.by_identity.get(&token).map(|&i| &self.entries[i])
    }

    /// Canonical name of every entry, sorted.
    pub fn canonical_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.canonical_name().to_string())
            .collect();
        names.sort();
        names
    }

    fn insert<R: Reflect>(
        &mut self,
        host: &R,
        full_name: String,
        obj: R::Object,
        kind: Option<RecordKind>,
    ) {
        debug!("adding {} to the api index", full_name);
        self.collected += 1;

        let token = host.identity(obj);
        if let Some(&i) = self.by_identity.get(&token) {
            let entry = &mut self.entries[i];
            if !entry.names.contains(&full_name) {
                entry.names.push(full_name);
            }
            return;
        }

        self.by_identity.insert(token, self.entries.len());
        self.entries.push(ApiEntry {
            names: vec![full_name],
            identity: token,
            type_name: host.type_name(obj).to_string(),
            docstring: host
                .doc(obj)
                .and_then(DocText::as_text)
                .map(clean_doc)
                .filter(|doc| !doc.is_empty()),
            kind,
        });
    }
}

/// Indexes every export-list entry of every importable module under a root.
pub struct ExportScanner<'a, R: Reflect> {
    host: &'a R,
    scope: &'a Scope,
}

impl<'a, R: Reflect> ExportScanner<'a, R> {
    pub fn new(host: &'a R, scope: &'a Scope) -> Self {
        Self { host, scope }
    }

    /// Scan `root` first, then every other discovered module in name order.
    pub fn scan(&self, root: &str) -> ApiIndex {
        let mut index = ApiIndex::default();
        let modules = self.host.discover_modules(root);

        let (roots, nested): (Vec<_>, Vec<_>) =
            modules.into_iter().partition(|(name, _)| name == root);

        for (name, module) in roots.into_iter().chain(nested) {
            if !self.scope.admits(&name) {
                debug!("skipping excluded module {}", name);
                continue;
            }
            self.process_module(&name, module, &mut index);
        }

        info!(
            "{}: collected {} apis, {} distinct apis",
            root,
            index.collected,
            index.len()
        );
        index
    }

    fn process_module(&self, module_name: &str, module: R::Object, index: &mut ApiIndex) {
        let Some(exports) = self.host.exports(module) else {
            return;
        };

        let declared: BTreeSet<&str> = exports.iter().map(String::as_str).collect();
        for api in declared {
            if is_malformed_export(api) {
                continue;
            }

            let full_name = format!("{}.{}", module_name, api);
            let obj = match self.host.get_attr(module, api) {
                Ok(obj) => obj,
                Err(err) => {
                    warn!("cannot resolve exported name {}: {}", full_name, err);
                    continue;
                }
            };

            index.insert(self.host, full_name.clone(), obj, None);

            if self.host.is_class(obj) {
                for (name, value) in self.host.class_members(obj) {
                    if name.starts_with('_') || self.host.declared_name(value).is_none() {
                        continue;
                    }
                    let method_name = format!("{}.{}", full_name, name);
                    index.insert(self.host, method_name, value, Some(RecordKind::ClassMethod));
                }
            }
        }
    }
}

/// Strip docstring indentation the way Python's `inspect.cleandoc` does.
///
/// The first line loses its leading whitespace, the remaining lines lose
/// their common indentation, and blank lines at either end are dropped.
pub fn clean_doc(doc: &str) -> String {
    let expanded = expand_tabs(doc);
    let lines: Vec<&str> = expanded.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start());
    }
    for line in lines.iter().skip(1) {
        match line.get(margin..) {
            Some(rest) => cleaned.push(rest),
            None => cleaned.push(line.trim_start()),
        }
    }

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();

    cleaned[leading..].join("\n")
}

/// Replace tabs with spaces up to the next multiple-of-eight column.
fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let width = 8 - column % 8;
                out.extend(std::iter::repeat_n(' ', width));
                column += width;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}
