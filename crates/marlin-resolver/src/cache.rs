//! Bookkeeping shared by the recursive POM loads of one resolution.

use std::collections::HashSet;

use marlin_core::dependency::Dependency;

/// Coordinates on the current parent/BOM import chain.
///
/// Each nested load clones the chain and visits its own coordinate, so a
/// POM that inherits from or imports one of its descendants is detected
/// instead of recursing forever.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    visited: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a coordinate as visited. Returns `false` if already visited.
    pub fn visit(&mut self, dep: &Dependency) -> bool {
        let key = coordinate(dep);
        self.order.push(key.clone());
        self.visited.insert(key)
    }

    pub fn contains(&self, dep: &Dependency) -> bool {
        self.visited.contains(&coordinate(dep))
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// The chain in visiting order, `a -> b -> c`.
    pub fn describe(&self) -> String {
        self.order.join(" -> ")
    }
}

fn coordinate(dep: &Dependency) -> String {
    format!("{}:{}:{}", dep.group_id, dep.artifact_id, dep.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(s: &str) -> Dependency {
        Dependency::parse(s).unwrap()
    }

    #[test]
    fn visited_tracking() {
        let mut set = VisitedSet::new();
        assert!(set.visit(&dep("org.example:lib:1.0")));
        assert!(!set.visit(&dep("org.example:lib:1.0")));
        assert!(set.contains(&dep("org.example:lib:1.0")));
        assert!(!set.contains(&dep("org.example:lib:2.0")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn describe_lists_the_chain_with_the_repeat() {
        let mut set = VisitedSet::new();
        set.visit(&dep("a:child:1"));
        set.visit(&dep("a:parent:1@pom"));
        set.visit(&dep("a:child:1"));
        assert_eq!(set.describe(), "a:child:1 -> a:parent:1 -> a:child:1");
    }
}
