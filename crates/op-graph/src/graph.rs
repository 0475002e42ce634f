// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Computation graph: a training workload's forward pass as a DAG of typed
//! operation nodes.
//!
//! # Type-State Pattern
//!
//! ```text
//! ComputationGraph<Loaded>     — nodes and edges collected, not yet checked.
//!       │  .validate()
//!       ▼
//! ComputationGraph<Validated>  — DAG invariants hold, topological order known.
//! ```
//!
//! The cost model only accepts `ComputationGraph<Validated>`, so it never
//! has to re-check ids, dangling edges or cycles.

use crate::{DType, GraphError, OpKind, OpParams, Shape};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been assembled but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph satisfies every DAG invariant.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Nodes and edges ────────────────────────────────────────────────

/// A single typed operation in the graph.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationNode {
    /// Unique identifier within the graph (e.g. `"gcn_2"`).
    pub id: String,
    /// The computation this node performs.
    pub kind: OpKind,
    /// Shape of the activation consumed by the node.
    pub input_shape: Shape,
    /// Shape of the activation produced by the node.
    pub output_shape: Shape,
    /// Kind-specific parameters.
    #[serde(default, skip_serializing_if = "OpParams::is_empty")]
    pub params: OpParams,
}

impl OperationNode {
    /// Creates a node without parameters.
    pub fn new(id: impl Into<String>, kind: OpKind, input_shape: Shape, output_shape: Shape) -> Self {
        Self {
            id: id.into(),
            kind,
            input_shape,
            output_shape,
            params: OpParams::default(),
        }
    }

    /// Attaches parameters to the node.
    pub fn with_params(mut self, params: OpParams) -> Self {
        self.params = params;
        self
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) {} -> {}",
            self.id, self.kind, self.input_shape, self.output_shape
        )
    }
}

/// A data dependency between two nodes, referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ── ComputationGraph ───────────────────────────────────────────────

/// A directed acyclic graph of operation nodes.
///
/// The graph is built fresh for every prediction and discarded afterwards;
/// it is never executed.
#[derive(Debug, Clone)]
pub struct ComputationGraph<S: GraphState = Loaded> {
    /// Human-readable graph name (usually the architecture template).
    pub name: String,
    /// Element type used to size activations and weights.
    pub dtype: DType,
    nodes: Vec<OperationNode>,
    edges: Vec<Edge>,
    /// Node indices in topological order (filled in by validation).
    order: Vec<usize>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ComputationGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(name: impl Into<String>, nodes: Vec<OperationNode>, edges: Vec<Edge>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::default(),
            nodes,
            edges,
            order: Vec::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Creates a linear chain: every node feeds the next one.
    pub fn chain(name: impl Into<String>, nodes: Vec<OperationNode>) -> Self {
        let edges = nodes
            .windows(2)
            .map(|pair| Edge::new(pair[0].id.clone(), pair[1].id.clone()))
            .collect();
        Self::new(name, nodes, edges)
    }

    /// Sets the element type for the whole graph.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty.
    /// - Node ids are unique.
    /// - No node has a zero-element input or output shape.
    /// - Every edge endpoint references an existing node.
    /// - At least one node has no incoming edge.
    /// - The graph is acyclic.
    pub fn validate(self) -> Result<ComputationGraph<Validated>, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::InvalidGraph("graph contains no nodes".into()));
        }

        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index_of.insert(node.id.as_str(), i).is_some() {
                return Err(GraphError::InvalidNode {
                    node: node.id.clone(),
                    detail: "duplicate node id".into(),
                });
            }
            if node.input_shape.num_elements() == 0 || node.output_shape.num_elements() == 0 {
                return Err(GraphError::InvalidNode {
                    node: node.id.clone(),
                    detail: "shape has zero elements".into(),
                });
            }
        }

        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        let mut seen_edges = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            let resolve = |id: &str| {
                index_of.get(id).copied().ok_or_else(|| {
                    GraphError::InvalidGraph(format!(
                        "edge {} -> {} references unknown node '{id}'",
                        edge.from, edge.to
                    ))
                })
            };
            let from = resolve(&edge.from)?;
            let to = resolve(&edge.to)?;
            if !seen_edges.insert((from, to)) {
                tracing::debug!("ignoring duplicate edge {} -> {}", edge.from, edge.to);
                continue;
            }
            successors[from].push(to);
            in_degree[to] += 1;
        }

        // Kahn's algorithm; ties are broken by declaration order so the
        // topological order is deterministic.
        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        if queue.is_empty() {
            return Err(GraphError::InvalidGraph(
                "graph has no source node (every node has an incoming edge)".into(),
            ));
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &next in &successors[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck: Vec<&str> = (0..self.nodes.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].id.as_str())
                .collect();
            return Err(GraphError::InvalidGraph(format!(
                "graph contains a cycle through {stuck:?}"
            )));
        }

        Ok(ComputationGraph {
            name: self.name,
            dtype: self.dtype,
            nodes: self.nodes,
            edges: self.edges,
            order,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ComputationGraph<Validated> {
    /// A one-node graph, trivially valid.
    pub(crate) fn single_node(name: impl Into<String>, node: OperationNode) -> Self {
        Self {
            name: name.into(),
            dtype: DType::default(),
            nodes: vec![node],
            edges: Vec::new(),
            order: vec![0],
            _state: std::marker::PhantomData,
        }
    }

    /// Iterates over the nodes in topological order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &OperationNode> {
        self.order.iter().map(move |&i| &self.nodes[i])
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&OperationNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the edges of the graph.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the ids of nodes without incoming edges.
    pub fn sources(&self) -> Vec<&str> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.to.as_str()).collect();
        self.iter_nodes()
            .filter(|n| !targets.contains(n.id.as_str()))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Returns the distinct operation kinds present, in taxonomy order.
    pub fn kinds(&self) -> BTreeSet<OpKind> {
        self.nodes.iter().map(|n| n.kind).collect()
    }

    /// Returns how many nodes of each kind the graph contains.
    pub fn count_by_kind(&self) -> BTreeMap<OpKind, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Returns a one-line summary of the graph.
    pub fn summary(&self) -> String {
        let kinds: Vec<String> = self
            .count_by_kind()
            .into_iter()
            .map(|(kind, n)| format!("{n}x{kind}"))
            .collect();
        format!(
            "Graph '{}': {} nodes, {} edges, {} [{}]",
            self.name,
            self.num_nodes(),
            self.edges.len(),
            self.dtype.as_str(),
            kinds.join(", "),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> ComputationGraph<S> {
    /// Returns the number of operation nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

impl<S: GraphState> fmt::Display for ComputationGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ComputationGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(id: &str, rows: usize, width: usize) -> OperationNode {
        OperationNode::new(
            id,
            OpKind::Dense,
            Shape::matrix(rows, width),
            Shape::matrix(rows, width),
        )
    }

    fn make_chain(n: usize) -> ComputationGraph<Loaded> {
        let nodes = (0..n).map(|i| dense(&format!("fc_{i}"), 8, 64)).collect();
        ComputationGraph::chain("chain", nodes)
    }

    #[test]
    fn test_validate_chain() {
        let g = make_chain(4).validate().unwrap();
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.edges().len(), 3);
        assert_eq!(g.sources(), vec!["fc_0"]);
    }

    #[test]
    fn test_validate_empty() {
        let g = ComputationGraph::new("empty", vec![], vec![]);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_id() {
        let g = ComputationGraph::chain("dup", vec![dense("a", 1, 4), dense("a", 1, 4)]);
        assert!(matches!(g.validate(), Err(GraphError::InvalidNode { .. })));
    }

    #[test]
    fn test_validate_dangling_edge() {
        let g = ComputationGraph::new(
            "dangling",
            vec![dense("a", 1, 4)],
            vec![Edge::new("a", "missing")],
        );
        assert!(matches!(g.validate(), Err(GraphError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_cycle() {
        let g = ComputationGraph::new(
            "cycle",
            vec![dense("src", 1, 4), dense("a", 1, 4), dense("b", 1, 4)],
            vec![Edge::new("src", "a"), Edge::new("a", "b"), Edge::new("b", "a")],
        );
        let err = g.validate().unwrap_err().to_string();
        assert!(err.contains("cycle"), "{err}");
    }

    #[test]
    fn test_validate_no_source() {
        let g = ComputationGraph::new(
            "ring",
            vec![dense("a", 1, 4), dense("b", 1, 4)],
            vec![Edge::new("a", "b"), Edge::new("b", "a")],
        );
        let err = g.validate().unwrap_err().to_string();
        assert!(err.contains("no source"), "{err}");
    }

    #[test]
    fn test_validate_zero_shape() {
        let mut node = dense("a", 1, 4);
        node.output_shape = Shape::new(vec![1, 0]);
        let g = ComputationGraph::new("zero", vec![node], vec![]);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_topological_order_follows_edges() {
        // Declared out of order: c depends on b depends on a.
        let g = ComputationGraph::new(
            "diamond",
            vec![dense("c", 1, 4), dense("a", 1, 4), dense("b", 1, 4), dense("d", 1, 4)],
            vec![
                Edge::new("a", "b"),
                Edge::new("b", "c"),
                Edge::new("a", "d"),
                Edge::new("d", "c"),
            ],
        )
        .validate()
        .unwrap();
        let ids: Vec<_> = g.iter_nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_kinds_and_counts() {
        let nodes = vec![
            OperationNode::new("in", OpKind::Input, Shape::matrix(2, 4), Shape::matrix(2, 4)),
            dense("fc_0", 2, 4),
            dense("fc_1", 2, 4),
        ];
        let g = ComputationGraph::chain("mixed", nodes).validate().unwrap();
        assert_eq!(g.kinds().len(), 2);
        assert_eq!(g.count_by_kind()[&OpKind::Dense], 2);
        assert!(g.summary().contains("2xdense"));
    }

    #[test]
    fn test_display_lists_nodes() {
        let display = format!("{}", make_chain(2));
        assert!(display.contains("fc_0"));
        assert!(display.contains("fc_1"));
    }
}
