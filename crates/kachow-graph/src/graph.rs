use std::collections::HashMap;
use std::fmt;

use kachow_core::MetricsRecord;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Whether a node is a walked file or a synthesized folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Folder => write!(f, "folder"),
        }
    }
}

/// Fixed layer tag used by the presentation layer to group nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Walked source files.
    Backend,
    /// Synthesized folders.
    System,
}

/// A node in the dependency graph.
///
/// # Examples
///
/// ```
/// use kachow_core::MetricsRecord;
/// use kachow_graph::graph::{GraphNode, Layer, NodeKind};
///
/// let node = GraphNode::file("app/main.py", MetricsRecord::perfect());
/// assert_eq!(node.label, "main.py");
/// assert_eq!(node.kind, NodeKind::File);
/// assert_eq!(node.layer, Layer::Backend);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Relative path of the file or folder, `/`-separated.
    pub id: String,
    /// Last path component.
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub metrics: MetricsRecord,
    pub layer: Layer,
}

impl GraphNode {
    /// A file node carrying its fetched metrics.
    pub fn file(id: &str, metrics: MetricsRecord) -> Self {
        Self {
            id: id.to_string(),
            label: last_component(id).to_string(),
            kind: NodeKind::File,
            metrics,
            layer: Layer::Backend,
        }
    }

    /// A synthesized folder node with placeholder perfect-health metrics.
    pub fn folder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: last_component(id).to_string(),
            kind: NodeKind::Folder,
            metrics: MetricsRecord::perfect(),
            layer: Layer::System,
        }
    }
}

/// Kind of relation an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// File imports file.
    Imports,
    /// Folder contains file.
    Contains,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Imports => write!(f, "imports"),
            Relation::Contains => write!(f, "contains"),
        }
    }
}

/// A directed edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

/// Directed graph of files and folders keyed by node id.
///
/// Insertion is idempotent: adding a node id twice keeps the first node, and
/// self-edges or repeated `(source, target, relation)` triples are refused.
/// Nodes and edges iterate in insertion order.
///
/// # Examples
///
/// ```
/// use kachow_core::MetricsRecord;
/// use kachow_graph::graph::{DependencyGraph, GraphNode, Relation};
///
/// let mut graph = DependencyGraph::new();
/// graph.add_node(GraphNode::file("a.py", MetricsRecord::perfect()));
/// graph.add_node(GraphNode::file("b.py", MetricsRecord::perfect()));
///
/// assert!(graph.add_edge("b.py", "a.py", Relation::Imports));
/// assert!(!graph.add_edge("b.py", "a.py", Relation::Imports));
/// assert!(!graph.add_edge("a.py", "a.py", Relation::Imports));
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, Relation>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless its id is already present. Returns `true` if inserted.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Returns `false` (and changes nothing) for self-edges, unknown
    /// endpoints, and edges that already exist with the same relation.
    pub fn add_edge(&mut self, source: &str, target: &str, relation: Relation) -> bool {
        if source == target {
            return false;
        }
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        if self.has_edge_between(from, to, relation) {
            return false;
        }
        self.graph.add_edge(from, to, relation);
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.graph.edge_references().map(|e| GraphEdge {
            source: self.graph[e.source()].id.clone(),
            target: self.graph[e.target()].id.clone(),
            relation: *e.weight(),
        })
    }

    /// Ids of all file nodes, in insertion order.
    pub fn file_ids(&self) -> Vec<String> {
        self.nodes()
            .filter(|n| n.kind == NodeKind::File)
            .map(|n| n.id.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Split into owned node and edge lists, both in insertion order.
    pub fn into_parts(self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let edges: Vec<GraphEdge> = self.edges().collect();
        let (nodes, _) = self.graph.into_nodes_edges();
        let nodes = nodes.into_iter().map(|n| n.weight).collect();
        (nodes, edges)
    }

    fn has_edge_between(&self, from: NodeIndex, to: NodeIndex, relation: Relation) -> bool {
        self.graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == relation)
    }
}

fn last_component(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(ids: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in ids {
            graph.add_node(GraphNode::file(id, MetricsRecord::perfect()));
        }
        graph
    }

    #[test]
    fn duplicate_node_ids_keep_first() {
        let mut graph = graph_with(&["a.py"]);
        let mut replacement = GraphNode::file("a.py", MetricsRecord::perfect());
        replacement.metrics.code_smells = 9;
        assert!(!graph.add_node(replacement));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.nodes().next().unwrap().metrics.code_smells, 0);
    }

    #[test]
    fn same_pair_allows_one_edge_per_relation() {
        let mut graph = graph_with(&["a.py"]);
        graph.add_node(GraphNode::folder("pkg"));
        assert!(graph.add_edge("pkg", "a.py", Relation::Contains));
        assert!(graph.add_edge("pkg", "a.py", Relation::Imports));
        assert!(!graph.add_edge("pkg", "a.py", Relation::Contains));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn edges_to_unknown_nodes_are_refused() {
        let mut graph = graph_with(&["a.py"]);
        assert!(!graph.add_edge("a.py", "ghost.py", Relation::Imports));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn into_parts_preserves_insertion_order() {
        let mut graph = graph_with(&["c.py", "a.py", "b.py"]);
        graph.add_edge("c.py", "b.py", Relation::Imports);
        graph.add_edge("a.py", "c.py", Relation::Imports);

        let (nodes, edges) = graph.into_parts();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c.py", "a.py", "b.py"]);
        assert_eq!(edges[0].source, "c.py");
        assert_eq!(edges[1].source, "a.py");
    }

    #[test]
    fn edges_carry_their_relation() {
        let mut graph = graph_with(&["pkg/a.py", "pkg/b.py"]);
        graph.add_node(GraphNode::folder("pkg"));
        graph.add_edge("pkg/a.py", "pkg/b.py", Relation::Imports);
        graph.add_edge("pkg", "pkg/a.py", Relation::Contains);

        let relations: Vec<(String, Relation)> =
            graph.edges().map(|e| (e.source, e.relation)).collect();
        assert_eq!(
            relations,
            vec![
                ("pkg/a.py".to_string(), Relation::Imports),
                ("pkg".to_string(), Relation::Contains),
            ]
        );
    }

    #[test]
    fn node_json_uses_type_key() {
        let node = GraphNode::folder("app/core");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["label"], "core");
        assert_eq!(json["layer"], "system");
    }
}
