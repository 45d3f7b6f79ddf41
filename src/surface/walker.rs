use super::{AliasNote, IdentityRegistry, Scope, SurfaceRecord, SurfaceReport, VisitedSet};
use crate::digest::ContentDigest;
use crate::reflect::Reflect;
use tracing::debug;

/// Depth-first walk over the module tree reachable from a root module.
pub struct SurfaceWalker<'a, R: Reflect> {
    host: &'a R,
    scope: &'a Scope,
}

/// Mutable state of one walk.
struct WalkContext {
    registry: IdentityRegistry,
    visited: VisitedSet,
    report: SurfaceReport,
}

/// A container whose members are being enumerated.
struct Frame<O> {
    container: O,
    qualified_name: String,
    members: std::vec::IntoIter<String>,
}

impl<'a, R: Reflect> SurfaceWalker<'a, R> {
    pub fn new(host: &'a R, scope: &'a Scope) -> Self {
        Self { host, scope }
    }

    pub fn walk(&self, root: R::Object) -> SurfaceReport {
        let mut ctx = WalkContext {
            registry: IdentityRegistry::new(),
            visited: VisitedSet::new(),
            report: SurfaceReport::default(),
        };

        // Explicit frontier instead of recursion; a frame is pushed when a
        // module member is met, so member order matches a recursive walk.
        let mut frontier: Vec<Frame<R::Object>> = Vec::new();
        if let Some(frame) = self.enter(root, &mut ctx) {
            frontier.push(frame);
        }

        loop {
            let Some(frame) = frontier.last_mut() else {
                break;
            };
            let Some(member_name) = frame.members.next() else {
                frontier.pop();
                continue;
            };
            let container = frame.container;
            let qualified_name = format!("{}.{}", frame.qualified_name, member_name);

            match self.host.get_attr(container, &member_name) {
                Ok(member) if self.host.is_module(member) => {
                    if let Some(frame) = self.enter(member, &mut ctx) {
                        frontier.push(frame);
                    }
                }
                Ok(member) => self.visit_member(&member_name, qualified_name, member, &mut ctx),
                Err(err) => {
                    debug!("{}: {}", qualified_name, err);
                    if !self.scope.is_skipped(&qualified_name) {
                        ctx.report.errors.insert(qualified_name);
                    }
                }
            }
        }

        ctx.report.modules_visited = ctx.visited.len();
        ctx.report
    }

    /// Open a container for enumeration, or `None` if it is out of scope or
    /// was expanded before.
    fn enter(&self, container: R::Object, ctx: &mut WalkContext) -> Option<Frame<R::Object>> {
        let name = self.host.declared_name(container)?;
        if !self.scope.admits(name) {
            return None;
        }

        let token = self.host.identity(container);
        if ctx.visited.visited(token) {
            return None;
        }
        ctx.visited.mark(token);

        let members: Vec<String> = self
            .host
            .member_names(container)
            .into_iter()
            .filter(|member| !member.starts_with("__"))
            .collect();

        debug!("expanding {} ({} members)", name, members.len());

        Some(Frame {
            container,
            qualified_name: name.to_string(),
            members: members.into_iter(),
        })
    }

    fn visit_member(
        &self,
        member_name: &str,
        qualified_name: String,
        member: R::Object,
        ctx: &mut WalkContext,
    ) {
        if let Some(declared) = self.host.declared_name(member) {
            if declared != member_name {
                ctx.report.aliases.push(AliasNote {
                    alias: member_name.to_string(),
                    original: declared.to_string(),
                });
            }
        }

        let token = self.host.identity(member);
        if ctx.registry.seen(token) {
            let owner = ctx.report.owners.get(&token).cloned();
            if let Some(record) = owner.and_then(|owner| ctx.report.records.get_mut(&owner)) {
                record.add_alias(qualified_name);
            }
            return;
        }

        ctx.registry.record(token);
        let digest = ContentDigest::of_doc(self.host.doc(member));
        ctx.report.owners.insert(token, qualified_name.clone());
        ctx.report
            .records
            .insert(qualified_name.clone(), SurfaceRecord::new(qualified_name, digest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::ContentDigest;
    use crate::model::{DocText, Object, ObjectGraph, ObjectId};

    fn demo_graph() -> (ObjectGraph, ObjectId) {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let sub = graph.add_module(Object::module("demo.sub"));
        let foo = graph.add(Object::function("foo").with_doc("Computes X"));
        graph.bind(demo, "foo", foo);
        graph.bind(demo, "sub", sub);
        graph.bind(sub, "bar", foo);
        (graph, demo)
    }

    #[test]
    fn test_reexport_collapses_into_one_record() {
        let (graph, demo) = demo_graph();
        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert_eq!(report.records.len(), 1);
        let record = report.get("demo.foo").unwrap();
        assert_eq!(record.names, vec!["demo.foo", "demo.sub.bar"]);
        assert_eq!(record.digest, ContentDigest::of_text("Computes X"));
        assert_eq!(
            report.aliases,
            vec![AliasNote {
                alias: "bar".to_string(),
                original: "foo".to_string()
            }]
        );
        assert!(report.is_success());
        assert_eq!(report.modules_visited, 2);
    }

    #[test]
    fn test_self_import_cycle_terminates() {
        let mut graph = ObjectGraph::new();
        let a = graph.add_module(Object::module("pkg"));
        let b = graph.add_module(Object::module("pkg.b"));
        let f = graph.add(Object::function("f"));
        graph.bind(a, "pkg", a);
        graph.bind(a, "b", b);
        graph.bind(b, "parent", a);
        graph.bind(b, "b", b);
        graph.bind(b, "f", f);

        let scope = Scope::new("pkg");
        let report = SurfaceWalker::new(&graph, &scope).walk(a);

        assert_eq!(report.modules_visited, 2);
        assert_eq!(report.records.keys().collect::<Vec<_>>(), vec!["pkg.b.f"]);
    }

    #[test]
    fn test_failing_member_is_isolated() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo3"));
        let a = graph.add(Object::function("a"));
        let c = graph.add(Object::function("c"));
        graph.bind(demo, "a", a);
        graph.bind_unavailable(demo, "b", "boom");
        graph.bind(demo, "c", c);

        let scope = Scope::new("demo3");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert_eq!(
            report.records.keys().collect::<Vec<_>>(),
            vec!["demo3.a", "demo3.c"]
        );
        assert_eq!(report.errors.iter().collect::<Vec<_>>(), vec!["demo3.b"]);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_skip_list_suppresses_error() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo3"));
        graph.bind_unavailable(demo, "b", "boom");

        let scope = Scope::new("demo3").with_skip(["demo3.b"]);
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert!(report.errors.is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_out_of_scope_and_excluded_modules_are_not_expanded() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let os = graph.add_module(Object::module("os"));
        let core = graph.add_module(Object::module("demo.core"));
        let getcwd = graph.add(Object::function("getcwd"));
        let native = graph.add(Object::function("native"));
        graph.bind(os, "getcwd", getcwd);
        graph.bind(core, "native", native);
        graph.bind(demo, "os", os);
        graph.bind(demo, "core", core);

        let scope = Scope::new("demo").with_exclude(["demo.core"]);
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert!(report.records.is_empty());
        assert_eq!(report.modules_visited, 1);
    }

    #[test]
    fn test_dunder_members_skipped_but_single_underscore_kept() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let version = graph.add(Object::constant("str"));
        let helper = graph.add(Object::function("_helper"));
        graph.bind(demo, "__version__", version);
        graph.bind(demo, "_helper", helper);

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert_eq!(report.records.keys().collect::<Vec<_>>(), vec!["demo._helper"]);
    }

    #[test]
    fn test_undeclared_export_is_reported_unreachable() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo").with_exports(["missing"]));

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert!(report.errors.contains("demo.missing"));
    }

    #[test]
    fn test_undigestable_doc_still_creates_record() {
        let mut graph = ObjectGraph::new();
        let demo = graph.add_module(Object::module("demo"));
        let mut odd = Object::function("odd");
        odd.doc = Some(DocText::Raw(vec![0xed, 0xb0, 0x80]));
        let odd = graph.add(odd);
        graph.bind(demo, "odd", odd);

        let scope = Scope::new("demo");
        let report = SurfaceWalker::new(&graph, &scope).walk(demo);

        assert_eq!(
            report.get("demo.odd").map(|r| &r.digest),
            Some(&ContentDigest::Undigestable)
        );
    }

    #[test]
    fn test_depth_first_order_decides_canonical_name() {
        // `a.inner.x` is reached before `b` because `a` is expanded fully
        // before the walker moves on to the next root member.
        let mut graph = ObjectGraph::new();
        let root = graph.add_module(Object::module("pkg"));
        let a = graph.add_module(Object::module("pkg.a"));
        let inner = graph.add_module(Object::module("pkg.a.inner"));
        let x = graph.add(Object::function("x"));
        graph.bind(root, "a", a);
        graph.bind(a, "inner", inner);
        graph.bind(inner, "x", x);
        graph.bind(root, "b", x);

        let scope = Scope::new("pkg");
        let report = SurfaceWalker::new(&graph, &scope).walk(root);

        let record = report.get("pkg.a.inner.x").unwrap();
        assert_eq!(record.aliases(), ["pkg.b".to_string()]);
        assert_eq!(report.canonical_for(graph.identity(x)), Some("pkg.a.inner.x"));
    }

    #[test]
    fn test_walk_is_deterministic() {
        let (graph, demo) = demo_graph();
        let scope = Scope::new("demo");
        let first = SurfaceWalker::new(&graph, &scope).walk(demo);
        let second = SurfaceWalker::new(&graph, &scope).walk(demo);
        assert_eq!(first.records, second.records);
        assert_eq!(first.aliases, second.aliases);
    }
}
