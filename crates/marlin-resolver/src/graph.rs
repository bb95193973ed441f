//! Dependency tree construction and rendering.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use marlin_core::dependency::{Dependency, DependencyKey};

use crate::resolver::Resolution;

/// Which node introduced which, as discovered by the resolver.
pub struct DependencyTree {
    graph: DiGraph<Dependency, ()>,
    index: HashMap<DependencyKey, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Build the tree from a resolution's parent side table.
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut tree = Self::new();
        for dep in &resolution.dependencies {
            tree.add_node(dep.clone());
        }
        if let Some(root) = tree.find(&resolution.root.key()) {
            tree.set_root(root);
        }
        for dep in &resolution.dependencies {
            let key = dep.key();
            let parent = resolution
                .parent_of(&key)
                .and_then(|parent| tree.find(parent));
            if let (Some(from), Some(to)) = (parent, tree.find(&key)) {
                tree.add_edge(from, to);
            }
        }
        tree
    }

    /// Add or retrieve a node. If the identity already exists, returns the existing index.
    pub fn add_node(&mut self, dep: Dependency) -> NodeIndex {
        let key = dep.key();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(dep);
        self.index.insert(key, idx);
        idx
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn find(&self, key: &DependencyKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &Dependency {
        &self.graph[idx]
    }

    /// Children of a node, in insertion order.
    pub fn children_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields outgoing edges newest first
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        children.reverse();
        children
    }

    /// Render the tree, one dependency per line.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let children = self.children_of(root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                &mut output,
                child,
                "",
                i == count - 1,
                1,
                max_depth,
                &mut visited,
            );
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if max_depth.is_some_and(|max| depth >= max) || !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children_of(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }
    }

    /// The chain of dependencies from the root to `key`.
    pub fn find_path(&self, key: &DependencyKey) -> Option<Vec<&Dependency>> {
        let root = self.root?;
        let mut current = self.find(key)?;
        let mut path = vec![&self.graph[current]];
        while current != root {
            current = self
                .graph
                .edges_directed(current, Direction::Incoming)
                .next()?
                .source();
            path.push(&self.graph[current]);
        }
        path.reverse();
        Some(path)
    }

    /// Number of nodes (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyTree {
    fn default() -> Self {
        Self::new()
    }
}
