use crate::define_parser;
use crate::model::DocText;
use crate::parser::{ModuleSource, ParseError, Statement, Value, decode_string_literal};
use tree_sitter::Node;

define_parser!(PYTHON_PARSER, tree_sitter_python::LANGUAGE);

pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one module. `name` is its dotted name and `is_package` tells
    /// whether it is a package `__init__`, which changes how relative
    /// imports resolve.
    pub fn parse_module(
        &self,
        name: &str,
        is_package: bool,
        source: &[u8],
    ) -> Result<ModuleSource, ParseError> {
        let tree = PYTHON_PARSER
            .with(|parser| parser.borrow_mut().parse(source, None))
            .ok_or_else(|| ParseError::Parse("Failed to parse file".to_string()))?;

        let root = tree.root_node();
        let ctx = Context {
            source,
            module: name,
            is_package,
        };

        let mut collector = Collector::new(ctx, false);
        collector.block(&root);

        let mut module = ModuleSource::new(name, is_package);
        module.doc = ctx.docstring(&root);
        module.statements = collector.statements;
        module.exports = collector.exports;
        module.imports = collector.imports;
        Ok(module)
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
struct Context<'s> {
    source: &'s [u8],
    module: &'s str,
    is_package: bool,
}

impl<'s> Context<'s> {
    fn text(&self, node: &Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: &Node, field: &str) -> Option<&'s str> {
        node.child_by_field_name(field).map(|n| self.text(&n))
    }

    /// `a . b` and `a.b` both name module `a.b`.
    fn dotted_text(&self, node: &Node) -> String {
        self.text(node)
            .split('.')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// First statement of a block, if it is a string literal.
    fn docstring(&self, block: &Node) -> Option<DocText> {
        let mut cursor = block.walk();
        let first = block
            .named_children(&mut cursor)
            .find(|n| n.kind() != "comment")?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let mut inner = first.walk();
        let expr = first.named_children(&mut inner).next()?;
        self.string_value(&expr).map(DocText::from_bytes)
    }

    fn string_value(&self, node: &Node) -> Option<Vec<u8>> {
        match node.kind() {
            "string" => decode_string_literal(&self.source[node.start_byte()..node.end_byte()]),
            "concatenated_string" => {
                let mut out = Vec::new();
                let mut cursor = node.walk();
                for part in node.named_children(&mut cursor) {
                    if part.kind() == "string" {
                        out.extend(self.string_value(&part)?);
                    }
                }
                Some(out)
            }
            _ => None,
        }
    }

    /// String entries of a list/tuple literal, following `+` concatenation.
    fn string_list(&self, node: &Node) -> Vec<String> {
        let mut out = Vec::new();
        match node.kind() {
            "list" | "tuple" | "expression_list" => {
                let mut cursor = node.walk();
                for item in node.named_children(&mut cursor) {
                    if let Some(s) = self
                        .string_value(&item)
                        .and_then(|b| String::from_utf8(b).ok())
                    {
                        out.push(s);
                    }
                }
            }
            "binary_operator" => {
                if self.field_text(node, "operator") == Some("+") {
                    if let Some(left) = node.child_by_field_name("left") {
                        out.extend(self.string_list(&left));
                    }
                    if let Some(right) = node.child_by_field_name("right") {
                        out.extend(self.string_list(&right));
                    }
                }
            }
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                if let Some(inner) = node.named_children(&mut cursor).next() {
                    out.extend(self.string_list(&inner));
                }
            }
            _ => {}
        }
        out
    }

    /// Absolute module name for the text of a `relative_import` node.
    fn resolve_relative(&self, text: &str) -> Option<String> {
        let dots = text.chars().take_while(|c| *c == '.').count();
        let tail: Vec<&str> = text[dots..]
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut parts: Vec<&str> = self.module.split('.').collect();
        if !self.is_package {
            parts.pop();
        }
        for _ in 1..dots {
            parts.pop()?;
        }
        if parts.is_empty() {
            return None;
        }
        parts.extend(tail);
        Some(parts.join("."))
    }

    fn value(&self, node: &Node) -> Value {
        let type_name = match node.kind() {
            "identifier" => return Value::Reference(vec![self.text(node).to_string()]),
            "attribute" => {
                return match dotted_path(self.text(node)) {
                    Some(path) => Value::Reference(path),
                    None => constant("object"),
                };
            }
            "lambda" => {
                return Value::Function {
                    name: "<lambda>".to_string(),
                    doc: None,
                };
            }
            "string" | "concatenated_string" => "str",
            "integer" => "int",
            "float" => "float",
            "true" | "false" => "bool",
            "none" => "NoneType",
            "list" | "list_comprehension" => "list",
            "dictionary" | "dictionary_comprehension" => "dict",
            "set" | "set_comprehension" => "set",
            "tuple" | "expression_list" => "tuple",
            _ => "object",
        };
        constant(type_name)
    }
}

fn constant(type_name: &str) -> Value {
    Value::Constant {
        type_name: type_name.to_string(),
    }
}

fn dotted_path(text: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = text.split('.').map(|p| p.trim().to_string()).collect();
    let valid = parts.iter().all(|p| {
        !p.is_empty()
            && p.chars().all(|c| c.is_alphanumeric() || c == '_')
            && !p.starts_with(|c: char| c.is_ascii_digit())
    });
    if valid { Some(parts) } else { None }
}

/// Blocks nested in compound statements that still run at import time.
fn nested_blocks<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut blocks = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "block" => blocks.push(child),
            "elif_clause"
            | "else_clause"
            | "except_clause"
            | "except_group_clause"
            | "finally_clause" => blocks.extend(nested_blocks(&child)),
            _ => {}
        }
    }
    blocks
}

/// Walks statements of a module or class body and records what they bind.
struct Collector<'s> {
    ctx: Context<'s>,
    in_class: bool,
    statements: Vec<Statement>,
    exports: Option<Vec<String>>,
    imports: Vec<String>,
}

impl<'s> Collector<'s> {
    fn new(ctx: Context<'s>, in_class: bool) -> Self {
        Self {
            ctx,
            in_class,
            statements: Vec::new(),
            exports: None,
            imports: Vec::new(),
        }
    }

    fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.statements.push(Statement::Bind {
            name: name.into(),
            value,
        });
    }

    fn block(&mut self, node: &Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.statement(&child);
        }
    }

    fn statement(&mut self, node: &Node) {
        match node.kind() {
            "function_definition" => self.function(node),
            "class_definition" => self.class(node),
            "decorated_definition" => {
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.statement(&definition);
                }
            }
            "expression_statement" => self.expression_statement(node),
            "import_statement" if !self.in_class => self.import(node),
            "import_from_statement" if !self.in_class => self.import_from(node),
            "if_statement" | "try_statement" | "with_statement" => {
                for block in nested_blocks(node) {
                    self.block(&block);
                }
            }
            _ => {}
        }
    }

    fn function(&mut self, node: &Node) {
        let Some(name) = self.ctx.field_text(node, "name") else {
            return;
        };
        let doc = node
            .child_by_field_name("body")
            .and_then(|body| self.ctx.docstring(&body));
        self.bind(
            name,
            Value::Function {
                name: name.to_string(),
                doc,
            },
        );
    }

    fn class(&mut self, node: &Node) {
        let Some(name) = self.ctx.field_text(node, "name") else {
            return;
        };
        let body = node.child_by_field_name("body");
        let doc = body.and_then(|b| self.ctx.docstring(&b));

        let mut members = Collector::new(self.ctx, true);
        if let Some(body) = body {
            members.block(&body);
        }

        self.bind(
            name,
            Value::Class {
                name: name.to_string(),
                doc,
                body: members.statements,
            },
        );
    }

    fn expression_statement(&mut self, node: &Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "assignment" => self.assignment(&child),
                "augmented_assignment" => self.augmented_assignment(&child),
                "call" if !self.in_class => self.export_call(&child),
                _ => {}
            }
        }
    }

    fn assignment(&mut self, node: &Node) {
        // `a = b = value` nests: the right side is another assignment.
        let mut targets = Vec::new();
        let mut current = *node;
        let value_node = loop {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(left);
            }
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                Some(right) => break right,
                // Bare annotation, nothing is bound.
                None => return,
            }
        };

        let mut first: Option<String> = None;
        for target in targets.iter().rev() {
            match target.kind() {
                "identifier" => {
                    let name = self.ctx.text(target).to_string();
                    if name == "__all__" && !self.in_class {
                        self.exports = Some(self.ctx.string_list(&value_node));
                    }
                    match &first {
                        None => {
                            let value = self.ctx.value(&value_node);
                            self.bind(name.clone(), value);
                            first = Some(name);
                        }
                        Some(shared) => {
                            let value = Value::Reference(vec![shared.clone()]);
                            self.bind(name, value);
                        }
                    }
                }
                "pattern_list" | "tuple_pattern" | "list_pattern" => {
                    let mut cursor = target.walk();
                    let names: Vec<String> = target
                        .named_children(&mut cursor)
                        .filter(|n| n.kind() == "identifier")
                        .map(|n| self.ctx.text(&n).to_string())
                        .collect();
                    for name in names {
                        self.bind(name, constant("object"));
                    }
                }
                _ => {}
            }
        }
    }

    fn augmented_assignment(&mut self, node: &Node) {
        let is_all = self.ctx.field_text(node, "left") == Some("__all__");
        if !is_all || self.in_class || self.ctx.field_text(node, "operator") != Some("+=") {
            return;
        }
        if let Some(right) = node.child_by_field_name("right") {
            let extra = self.ctx.string_list(&right);
            self.exports.get_or_insert_with(Vec::new).extend(extra);
        }
    }

    /// `__all__.extend([...])` and `__all__.append("name")`.
    fn export_call(&mut self, node: &Node) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        if function.kind() != "attribute"
            || self.ctx.field_text(&function, "object") != Some("__all__")
        {
            return;
        }
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = arguments.walk();
        let Some(argument) = arguments.named_children(&mut cursor).next() else {
            return;
        };

        let extra = match self.ctx.field_text(&function, "attribute") {
            Some("extend") => self.ctx.string_list(&argument),
            Some("append") => self
                .ctx
                .string_value(&argument)
                .and_then(|b| String::from_utf8(b).ok())
                .into_iter()
                .collect(),
            _ => return,
        };
        self.exports.get_or_insert_with(Vec::new).extend(extra);
    }

    fn import(&mut self, node: &Node) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            match name_node.kind() {
                "dotted_name" => {
                    // `import a.b` binds `a`.
                    let module = self.ctx.dotted_text(&name_node);
                    let head = module.split('.').next().unwrap_or_default().to_string();
                    self.imports.push(module);
                    self.bind(head.clone(), Value::Module(head));
                }
                "aliased_import" => {
                    let (Some(module), Some(alias)) = (
                        name_node
                            .child_by_field_name("name")
                            .map(|n| self.ctx.dotted_text(&n)),
                        self.ctx.field_text(&name_node, "alias"),
                    ) else {
                        continue;
                    };
                    self.imports.push(module.clone());
                    self.bind(alias, Value::Module(module));
                }
                _ => {}
            }
        }
    }

    fn import_from(&mut self, node: &Node) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let module = if module_node.kind() == "relative_import" {
            self.ctx.resolve_relative(self.ctx.text(&module_node))
        } else {
            Some(self.ctx.dotted_text(&module_node))
        };

        let mut cursor = node.walk();
        let is_star = node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");
        if let Some(module) = &module {
            self.imports.push(module.clone());
            if is_star {
                self.statements.push(Statement::Star {
                    module: module.clone(),
                });
                return;
            }
        }

        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let (name, alias) = match name_node.kind() {
                "dotted_name" => {
                    let name = self.ctx.dotted_text(&name_node);
                    (name.clone(), name)
                }
                "aliased_import" => {
                    let (Some(name), Some(alias)) = (
                        name_node
                            .child_by_field_name("name")
                            .map(|n| self.ctx.dotted_text(&n)),
                        self.ctx.field_text(&name_node, "alias"),
                    ) else {
                        continue;
                    };
                    (name, alias.to_string())
                }
                _ => continue,
            };
            let Some(module) = &module else {
                self.bind(
                    alias,
                    Value::ImportError(
                        "attempted relative import beyond top-level package".to_string(),
                    ),
                );
                continue;
            };
            self.imports.push(format!("{}.{}", module, name));
            self.bind(
                alias,
                Value::From {
                    module: module.clone(),
                    name,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, is_package: bool, source: &str) -> ModuleSource {
        PythonParser::new()
            .parse_module(name, is_package, source.as_bytes())
            .unwrap()
    }

    fn binding<'a>(module: &'a ModuleSource, name: &str) -> Option<&'a Value> {
        module.statements.iter().rev().find_map(|s| match s {
            Statement::Bind { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    #[test]
    fn test_definitions_and_docstrings() {
        let module = parse(
            "demo",
            true,
            r#""""Demo package."""

def foo():
    """Computes X"""
    return 1

@decorator
class Model:
    # leading comment
    """A model."""

    def fit(self):
        pass

    limit = 3
"#,
        );

        assert_eq!(module.doc, Some(DocText::from("Demo package.")));
        assert_eq!(
            binding(&module, "foo"),
            Some(&Value::Function {
                name: "foo".to_string(),
                doc: Some(DocText::from("Computes X")),
            })
        );

        let Some(Value::Class { doc, body, .. }) = binding(&module, "Model") else {
            panic!("Model should be a class");
        };
        assert_eq!(doc, &Some(DocText::from("A model.")));
        let member_names: Vec<_> = body
            .iter()
            .filter_map(|s| match s {
                Statement::Bind { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(member_names, vec!["fit", "limit"]);
    }

    #[test]
    fn test_imports_resolve_relative_names() {
        let module = parse(
            "demo.sub",
            false,
            r#"
import os
import demo.ops as ops
from . import utils
from .impl import run as go
from ..outer import thing
from demo.core import *
"#,
        );

        assert_eq!(binding(&module, "os"), Some(&Value::Module("os".to_string())));
        assert_eq!(
            binding(&module, "ops"),
            Some(&Value::Module("demo.ops".to_string()))
        );
        assert_eq!(
            binding(&module, "utils"),
            Some(&Value::From {
                module: "demo".to_string(),
                name: "utils".to_string()
            })
        );
        assert_eq!(
            binding(&module, "go"),
            Some(&Value::From {
                module: "demo.impl".to_string(),
                name: "run".to_string()
            })
        );
        // `..` from a top-level module escapes the package.
        assert_eq!(
            binding(&module, "thing"),
            Some(&Value::ImportError(
                "attempted relative import beyond top-level package".to_string()
            ))
        );
        assert!(!module.imports.iter().any(|m| m.starts_with("outer")));
        assert!(module.statements.contains(&Statement::Star {
            module: "demo.core".to_string()
        }));
        assert!(module.imports.contains(&"demo.utils".to_string()));
    }

    #[test]
    fn test_all_forms_are_collected() {
        let module = parse(
            "demo",
            true,
            r#"
__all__ = ['a', "b"] + ['c']
__all__ += ('d',)
__all__.extend(['e'])
__all__.append('f')
__all__.append(name_var)
"#,
        );
        assert_eq!(
            module.exports,
            Some(vec!["a", "b", "c", "d", "e", "f"].into_iter().map(String::from).collect())
        );
    }

    #[test]
    fn test_aliases_and_constants() {
        let module = parse(
            "demo",
            true,
            r#"
import demo.sub
bar = foo
run = ops.run
x = y = 3
a, b = 1, 2
n: int
VERSION = "1.0"
try:
    from fast import speedy
except ImportError:
    speedy = None
"#,
        );
        assert_eq!(binding(&module, "demo"), Some(&Value::Module("demo".to_string())));
        assert_eq!(
            binding(&module, "bar"),
            Some(&Value::Reference(vec!["foo".to_string()]))
        );
        assert_eq!(
            binding(&module, "run"),
            Some(&Value::Reference(vec!["ops".to_string(), "run".to_string()]))
        );
        assert_eq!(binding(&module, "y"), Some(&constant("int")));
        assert_eq!(
            binding(&module, "x"),
            Some(&Value::Reference(vec!["y".to_string()]))
        );
        assert_eq!(binding(&module, "a"), Some(&constant("object")));
        assert_eq!(binding(&module, "n"), None);
        assert_eq!(binding(&module, "VERSION"), Some(&constant("str")));
        assert_eq!(binding(&module, "speedy"), Some(&constant("NoneType")));
    }
}
