use std::collections::BTreeMap;

/// Index of an object inside an [`ObjectGraph`].
///
/// Two handles are equal iff they point at the same arena slot, which is the
/// identity rule the surface engine relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Module,
    Class,
    Function,
    Constant,
    /// Something we cannot look inside: native extension modules and
    /// names imported from outside the package.
    Opaque,
}

/// Documentation text as declared on an object.
///
/// `Raw` holds text that cannot be encoded as UTF-8 (invalid bytes in the
/// source file, or lone surrogate escapes in a string literal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocText {
    Text(String),
    Raw(Vec<u8>),
}

impl DocText {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => DocText::Text(text),
            Err(e) => DocText::Raw(e.into_bytes()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DocText::Text(text) => Some(text),
            DocText::Raw(_) => None,
        }
    }
}

impl From<&str> for DocText {
    fn from(text: &str) -> Self {
        DocText::Text(text.to_string())
    }
}

/// Value slot of a named member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Bound(ObjectId),
    /// Attribute access on this name fails; the string says why.
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct Object {
    pub kind: ObjectKind,
    /// The object's own declared name (`__name__`). Modules carry their
    /// fully qualified dotted name here.
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub doc: Option<DocText>,
    pub members: BTreeMap<String, Member>,
    pub exports: Option<Vec<String>>,
}

impl Object {
    fn new(kind: ObjectKind, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            type_name: None,
            doc: None,
            members: BTreeMap::new(),
            exports: None,
        }
    }

    pub fn module(qualified_name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Module, Some(qualified_name.into()))
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Class, Some(name.into()))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Function, Some(name.into()))
    }

    pub fn constant(type_name: impl Into<String>) -> Self {
        let mut object = Self::new(ObjectKind::Constant, None);
        object.type_name = Some(type_name.into());
        object
    }

    pub fn opaque(name: Option<String>) -> Self {
        Self::new(ObjectKind::Opaque, name)
    }

    pub fn with_doc(mut self, doc: impl Into<DocText>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = Some(exports.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_module(&self) -> bool {
        self.kind == ObjectKind::Module
    }

    /// Python-style `type(obj).__name__`.
    pub fn type_name(&self) -> &str {
        if let Some(name) = &self.type_name {
            return name;
        }
        match self.kind {
            ObjectKind::Module => "module",
            ObjectKind::Class => "type",
            ObjectKind::Function => "function",
            ObjectKind::Constant => "object",
            ObjectKind::Opaque => "object",
        }
    }
}

/// Arena of host objects plus the table of importable modules.
///
/// Loaders build one of these per run; the surface engine only ever sees
/// it through the [`crate::reflect::Reflect`] trait.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: Vec<Object>,
    modules: BTreeMap<String, ObjectId>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    /// Add a module object and make it importable under its qualified name.
    pub fn add_module(&mut self, object: Object) -> ObjectId {
        let name = object.name.clone();
        let id = self.add(object);
        if let Some(name) = name {
            self.modules.insert(name, id);
        }
        id
    }

    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0]
    }

    pub fn bind(&mut self, container: ObjectId, name: impl Into<String>, target: ObjectId) {
        self.get_mut(container)
            .members
            .insert(name.into(), Member::Bound(target));
    }

    pub fn bind_unavailable(
        &mut self,
        container: ObjectId,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.get_mut(container)
            .members
            .insert(name.into(), Member::Unavailable(reason.into()));
    }

    pub fn module(&self, name: &str) -> Option<ObjectId> {
        self.modules.get(name).copied()
    }

    /// Every importable module named `root` or nested under it, in name order.
    pub fn modules_under(&self, root: &str) -> Vec<(String, ObjectId)> {
        let nested = format!("{}.", root);
        self.modules
            .iter()
            .filter(|(name, _)| name.as_str() == root || name.starts_with(&nested))
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
