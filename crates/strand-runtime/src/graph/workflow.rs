//! Persisted workflow record and its runtime graph representation.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Edge, Node, NodeId, WorkflowId};
use crate::error::{WorkflowError, WorkflowResult};

/// A persisted workflow: nodes, edges, and the opaque UI definition.
///
/// The engine reads this record from the graph store; it never writes
/// it. `definition` is the denormalized editor round-trip copy and is
/// ignored by execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier.
    pub id: WorkflowId,
    /// Owning account.
    pub account_id: Uuid,
    /// Display name.
    pub name: String,
    /// Nodes keyed by their ID.
    pub nodes: HashMap<NodeId, Node>,
    /// Edges in definition order.
    pub edges: Vec<Edge>,
    /// Opaque editor round-trip copy of the graph.
    #[serde(default)]
    pub definition: serde_json::Value,
}

impl Workflow {
    /// Creates an empty workflow owned by the given account.
    pub fn new(account_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::new(),
            account_id,
            name: name.into(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            definition: serde_json::Value::Null,
        }
    }

    /// Adds a node to the workflow.
    pub fn add_node(&mut self, id: NodeId, node: Node) -> &mut Self {
        self.nodes.insert(id, node);
        self
    }

    /// Adds an edge to the workflow.
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Connects two nodes with a plain edge.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> &mut Self {
        self.add_edge(Edge::new(source, target))
    }
}

/// Structural view of a workflow used by the scheduler.
///
/// Wraps petgraph's `DiGraph` for cycle detection while keeping the
/// definition-ordered edge list: input aggregation iterates edges in
/// that stable order, never in completion order.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    graph: DiGraph<NodeId, ()>,
    node_indices: HashMap<NodeId, NodeIndex>,
    nodes: HashMap<NodeId, Node>,
    edges: Vec<Edge>,
}

impl WorkflowGraph {
    /// Builds the runtime graph from a persisted workflow.
    ///
    /// Fails if any edge references a node missing from the workflow.
    pub fn from_workflow(workflow: &Workflow) -> WorkflowResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::with_capacity(workflow.nodes.len());

        for id in workflow.nodes.keys() {
            let index = graph.add_node(*id);
            node_indices.insert(*id, index);
        }

        for edge in &workflow.edges {
            let source = *node_indices
                .get(&edge.source)
                .ok_or(WorkflowError::MissingNode(edge.source))?;
            let target = *node_indices
                .get(&edge.target)
                .ok_or(WorkflowError::MissingNode(edge.target))?;
            graph.add_edge(source, target, ());
        }

        Ok(Self {
            graph,
            node_indices,
            nodes: workflow.nodes.clone(),
            edges: workflow.edges.clone(),
        })
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Returns an iterator over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_indices.keys().copied()
    }

    /// Returns all edges in definition order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the edges targeting a node, in definition order.
    pub fn edges_into(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.target == id)
    }

    /// Returns the declared parents of a node (one entry per edge).
    pub fn parents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges_into(id).map(|edge| edge.source)
    }

    /// Returns whether a node is ready to execute.
    ///
    /// A node is ready iff every incoming edge's source satisfies
    /// `is_completed`; a node with no incoming edges is always ready.
    pub fn is_ready<F>(&self, id: NodeId, is_completed: F) -> bool
    where
        F: Fn(NodeId) -> bool,
    {
        self.edges_into(id).all(|edge| is_completed(edge.source))
    }

    /// Rejects graphs containing a cycle (self-loops included).
    pub fn validate_acyclic(&self) -> WorkflowResult<()> {
        if is_cyclic_directed(&self.graph) {
            return Err(WorkflowError::CycleDetected);
        }
        Ok(())
    }

    /// Computes the minimal upstream closure of a set of target nodes.
    ///
    /// Backward breadth-first traversal from each target, accumulating
    /// visited ids. The visited set makes this terminate even on graphs
    /// that (incorrectly) contain a cycle reachable from a target.
    pub fn upstream_closure(
        &self,
        targets: impl IntoIterator<Item = NodeId>,
    ) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = targets
            .into_iter()
            .filter(|id| self.contains_node(*id))
            .collect();

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for parent in self.parents(id) {
                if !visited.contains(&parent) {
                    queue.push_back(parent);
                }
            }
        }

        visited
    }
}
