use crate::reflect::IdentityToken;
use std::collections::HashSet;

/// Identities that already own a record. Append-only for the run.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    seen: HashSet<IdentityToken>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, token: IdentityToken) -> bool {
        self.seen.contains(&token)
    }

    /// Returns `true` if the token was not recorded before.
    pub fn record(&mut self, token: IdentityToken) -> bool {
        self.seen.insert(token)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Containers whose members have already been enumerated.
///
/// Kept apart from [`IdentityRegistry`]: a module is marked here when it is
/// expanded, which says nothing about whether it owns a record.
#[derive(Debug, Default)]
pub struct VisitedSet {
    containers: HashSet<IdentityToken>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self, container: IdentityToken) -> bool {
        self.containers.contains(&container)
    }

    /// Returns `true` if the container was not marked before.
    pub fn mark(&mut self, container: IdentityToken) -> bool {
        self.containers.insert(container)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Object, ObjectGraph};
    use crate::reflect::Reflect;

    #[test]
    fn test_registry_records_each_identity_once() {
        let mut graph = ObjectGraph::new();
        let foo = graph.add(Object::function("foo"));
        let bar = graph.add(Object::function("bar"));
        let (foo, bar) = (graph.identity(foo), graph.identity(bar));

        let mut registry = IdentityRegistry::new();
        assert!(!registry.seen(foo));
        assert!(registry.record(foo));
        assert!(registry.seen(foo));
        assert!(!registry.record(foo));
        assert!(!registry.seen(bar));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_visited_set_is_independent_of_registry() {
        let mut graph = ObjectGraph::new();
        let module = graph.add_module(Object::module("demo"));
        let module = graph.identity(module);

        let mut visited = VisitedSet::new();
        let registry = IdentityRegistry::new();
        assert!(visited.is_empty());
        assert!(visited.mark(module));
        assert!(visited.visited(module));
        assert!(!visited.mark(module));
        assert!(!registry.seen(module));
    }
}
