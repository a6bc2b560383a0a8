// ABOUTME: Directed task graph with structural validation and ordered traversal
// ABOUTME: Provides depth-first post-order traversal and independent-group partitioning

use indexmap::IndexMap;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Direction;
use std::collections::HashSet;

use crate::error::{BuildError, Result};
use crate::task::canonical_name;

/// Directed graph over task names. An edge `start -> end` means that `end`
/// depends on `start`, so `start` must run first. Node identity is
/// case-insensitive; nodes and edges keep their insertion order, which makes
/// traversal deterministic for a given registration order.
pub struct TaskGraph {
    graph: Graph<String, ()>,
    indices: IndexMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            indices: IndexMap::new(),
        }
    }

    /// Append a node. Fails if a node with the same name already exists.
    pub fn add(&mut self, name: &str) -> Result<()> {
        let canonical = canonical_name(name);
        if self.indices.contains_key(&canonical) {
            return Err(BuildError::DuplicateNode {
                name: name.to_string(),
            });
        }

        let index = self.graph.add_node(name.to_string());
        self.indices.insert(canonical, index);
        Ok(())
    }

    /// Insert the edge `start -> end`, adding either endpoint if absent.
    /// Reflexive edges and inverses of existing edges are rejected;
    /// duplicate edges are a silent no-op.
    pub fn connect(&mut self, start: &str, end: &str) -> Result<()> {
        self.insert_edge(start, end, true)
    }

    /// Edge insertion used when wiring task dependencies. A mutual pair is
    /// admitted here so it surfaces as a cycle during traversal, once the
    /// whole build is bracketed by setup and teardown.
    pub(crate) fn connect_allowing_mutual(&mut self, start: &str, end: &str) -> Result<()> {
        self.insert_edge(start, end, false)
    }

    fn insert_edge(&mut self, start: &str, end: &str, reject_inverse: bool) -> Result<()> {
        if canonical_name(start) == canonical_name(end) {
            return Err(BuildError::ReflexiveEdge {
                name: start.to_string(),
            });
        }

        let start_index = self.ensure_node(start);
        let end_index = self.ensure_node(end);

        if reject_inverse && self.graph.find_edge(end_index, start_index).is_some() {
            return Err(BuildError::InverseEdge {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if self.graph.find_edge(start_index, end_index).is_none() {
            self.graph.add_edge(start_index, end_index, ());
        }

        Ok(())
    }

    /// Case-insensitive membership test.
    pub fn exists(&self, name: &str) -> bool {
        self.indices.contains_key(&canonical_name(name))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> Vec<&str> {
        self.indices
            .values()
            .map(|&index| self.graph[index].as_str())
            .collect()
    }

    /// Depth-first post-order traversal ending at `target`: every transitive
    /// prerequisite appears exactly once, before anything that depends on it.
    /// Revisiting a node that is still on the active path means the graph is
    /// cyclic. An unknown target yields an empty order.
    pub fn traverse(&self, target: &str) -> Result<Vec<String>> {
        let Some(&start) = self.indices.get(&canonical_name(target)) else {
            return Ok(Vec::new());
        };

        let mut order = Vec::new();
        let mut emitted = HashSet::new();
        let mut on_path = HashSet::new();
        self.visit(start, &mut order, &mut emitted, &mut on_path)?;
        Ok(order)
    }

    fn visit(
        &self,
        node: NodeIndex,
        order: &mut Vec<String>,
        emitted: &mut HashSet<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
    ) -> Result<()> {
        if on_path.contains(&node) {
            return Err(BuildError::CyclicGraph {
                name: self.graph[node].clone(),
            });
        }
        if emitted.contains(&node) {
            // Shared prerequisite that has already been scheduled.
            return Ok(());
        }

        on_path.insert(node);

        // petgraph walks neighbors most-recent-edge first; reverse to get
        // edge insertion order back.
        let mut predecessors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        predecessors.reverse();

        for predecessor in predecessors {
            self.visit(predecessor, order, emitted, on_path)?;
        }

        on_path.remove(&node);
        emitted.insert(node);
        order.push(self.graph[node].clone());
        Ok(())
    }

    /// Partition the linear traversal into groups of mutually independent
    /// nodes. Walking the flat order, a node that transitively depends on any
    /// member of the running group closes that group and opens the next one,
    /// so every group may execute concurrently while groups themselves stay
    /// ordered. The target always ends up in a final singleton group.
    pub fn traverse_and_group(&self, target: &str) -> Result<Vec<Vec<String>>> {
        let order = self.traverse(target)?;

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for name in order {
            let closes_group = current
                .iter()
                .any(|member| self.depends_transitively(&name, member));

            if closes_group {
                groups.push(std::mem::take(&mut current));
            }
            current.push(name);
        }

        if !current.is_empty() {
            groups.push(current);
        }

        Ok(groups)
    }

    /// Whether `node` transitively depends on `other`, i.e. some path of
    /// edges leads from `other` to `node`.
    fn depends_transitively(&self, node: &str, other: &str) -> bool {
        let (Some(&node_index), Some(&other_index)) = (
            self.indices.get(&canonical_name(node)),
            self.indices.get(&canonical_name(other)),
        ) else {
            return false;
        };

        has_path_connecting(&self.graph, other_index, node_index, None)
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        let canonical = canonical_name(name);
        if let Some(&index) = self.indices.get(&canonical) {
            return index;
        }

        let index = self.graph.add_node(name.to_string());
        self.indices.insert(canonical, index);
        index
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}
