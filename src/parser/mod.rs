mod common;
mod python;

use crate::model::DocText;
use thiserror::Error;

pub use common::{decode_string_literal, string_literal};
pub use python::PythonParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse: {0}")]
    Parse(String),
}

/// What a single source module binds at import time, in statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSource {
    /// Fully qualified dotted module name.
    pub name: String,
    /// `true` for a package's `__init__` module.
    pub is_package: bool,
    pub doc: Option<DocText>,
    pub statements: Vec<Statement>,
    /// Contents of `__all__`, if the module declares one.
    pub exports: Option<Vec<String>>,
    /// Absolute names this module imports. `from a import b` lists both `a`
    /// and `a.b`, since `b` may be a submodule.
    pub imports: Vec<String>,
}

impl ModuleSource {
    pub fn new(name: impl Into<String>, is_package: bool) -> Self {
        Self {
            name: name.into(),
            is_package,
            doc: None,
            statements: Vec::new(),
            exports: None,
            imports: Vec::new(),
        }
    }

    /// Every name bound explicitly, in statement order (may repeat).
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Bind { name, .. } => Some(name.as_str()),
            Statement::Star { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Bind { name: String, value: Value },
    /// `from module import *`
    Star { module: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Function {
        name: String,
        doc: Option<DocText>,
    },
    Class {
        name: String,
        doc: Option<DocText>,
        body: Vec<Statement>,
    },
    Constant {
        type_name: String,
    },
    /// Another binding, e.g. `bar = foo` or `run = ops.run`.
    Reference(Vec<String>),
    /// `import a.b` (binds `a`) or `import a.b as c` (binds `a.b`).
    Module(String),
    /// `from module import name`
    From { module: String, name: String },
    /// An import that fails wherever it runs, with the error text.
    ImportError(String),
}
