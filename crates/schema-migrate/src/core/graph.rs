//! Directed dependency multigraph with topological sorting.
//!
//! One node per schema object, one edge per dependency (e.g. a foreign key
//! from child table to parent table). Used by the foreign-key cycle lint
//! rule and for reporting a dependency-consistent table order.

use std::collections::HashMap;

use crate::core::identifier::Identifier;
use crate::error::{CycleEdge, Result, SchemaError};

#[derive(Debug, Clone)]
struct Edge<P> {
    from: usize,
    to: usize,
    payload: P,
}

/// A directed multigraph over identifiers with edge payloads.
///
/// Parallel edges are allowed (two foreign keys between the same pair of
/// tables are two edges). Node identity is exact [`Identifier`] equality, so
/// callers should insert already-qualified, already-resolved names.
#[derive(Debug, Clone)]
pub struct DependencyGraph<P> {
    nodes: Vec<Identifier>,
    index: HashMap<Identifier, usize>,
    edges: Vec<Edge<P>>,
}

impl<P> Default for DependencyGraph<P> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }
}

impl<P> DependencyGraph<P> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index. Adding an existing node is a no-op.
    pub fn add_node(&mut self, id: Identifier) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(id);
        idx
    }

    /// Add a directed edge `from -> to`, creating nodes as needed.
    pub fn add_edge(&mut self, from: Identifier, to: Identifier, payload: P) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.edges.push(Edge { from, to, payload });
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over edges as `(from, to, payload)`.
    pub fn edges(&self) -> impl Iterator<Item = (&Identifier, &Identifier, &P)> {
        self.edges
            .iter()
            .map(|e| (&self.nodes[e.from], &self.nodes[e.to], &e.payload))
    }

    /// Produce a total order in which every edge's `from` node precedes its
    /// `to` node.
    ///
    /// Among unordered nodes, insertion order is kept, so output is
    /// deterministic. Fails with `CycleDetected` carrying the edges that
    /// could not be ordered when no full ordering exists.
    pub fn topological_sort(&self) -> Result<Vec<Identifier>> {
        let mut indegree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            // Self-loops are immediately unorderable; counting them keeps
            // the node's indegree from ever reaching zero.
            indegree[edge.to] += 1;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        loop {
            let next = (0..self.nodes.len()).find(|&i| !visited[i] && indegree[i] == 0);
            let Some(i) = next else { break };
            visited[i] = true;
            order.push(self.nodes[i].clone());
            for edge in &self.edges {
                if edge.from == i {
                    indegree[edge.to] -= 1;
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let edges = self
            .edges
            .iter()
            .filter(|e| !visited[e.from] && !visited[e.to])
            .map(|e| CycleEdge {
                from: self.nodes[e.from].to_string(),
                to: self.nodes[e.to].to_string(),
            })
            .collect();
        Err(SchemaError::CycleDetected { edges })
    }
}
