//! The labelled directed multigraph shared by every translator and the
//! layout engine (`3. DATA MODEL`, `4.D Graph model`).
//!
//! Nodes and edges are held in two flat `Vec`s indexed by stable integer
//! ids; there is no generic graph crate underneath; adjacency is tracked
//! explicitly alongside the attribute vectors so that removal, relabeling
//! and subgraph extraction stay simple index bookkeeping.

use crate::term::Term;
use std::collections::{HashMap, HashSet};

/// Stable index into [`Graph`]'s node vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Stable index into [`Graph`]'s edge vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub usize);

/// Attributes carried by a graph node: its term identity plus whatever
/// layout/diagram bookkeeping later components attach.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub term: Term,
    /// Display label shown on the diagram shape or read from one.
    pub label: String,
    /// Additional `rdfs:label`/`skos:altLabel` strings (`4.C` aliases).
    pub alt_labels: Vec<String>,
    pub is_class: bool,
    pub is_instance: bool,
    pub is_literal: bool,
    pub is_axiom: bool,
    pub is_collection: bool,
    pub is_in_diagram: bool,
    /// Set when this term was resolved via term-table substitution rather
    /// than minted fresh; drives the `skos:exactMatch self` marker (`4.J`).
    pub is_substituted: bool,
    pub removed: bool,
}

impl NodeData {
    pub fn new(term: Term, label: impl Into<String>) -> Self {
        Self {
            term,
            label: label.into(),
            alt_labels: Vec::new(),
            is_class: false,
            is_instance: false,
            is_literal: false,
            is_axiom: false,
            is_collection: false,
            is_in_diagram: false,
            is_substituted: false,
            removed: false,
        }
    }
}

/// Attributes carried by a graph edge: its predicate term plus the
/// diagram-facing label text.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub source: NodeId,
    pub target: NodeId,
    pub predicate: Term,
    pub label: String,
    /// This edge's predicate is itself a first-class term in the graph
    /// (`4.D`: "every predicate is also a first-class term").
    pub is_predicate: bool,
    /// Edge whose label is in the configured rank-property set, typically
    /// `rdfs:subClassOf` / `rdf:type`. `is_rank ⇒ is_strat` (`3. DATA MODEL`).
    pub is_rank: bool,
    /// Superset of `is_rank`: rank edges plus any transitively
    /// user-declared annotation/datatype property. The decomposer's
    /// tree-eligibility gate (open question in `9. DESIGN NOTES`).
    pub is_strat: bool,
    /// Part of a reified collection (`mds:hasCollectionMember` /
    /// `mds:CollectionType`) rather than a direct instance-data edge.
    pub is_collection: bool,
    /// Part of the axiom subgraph (`rdfs:domain`/`rdfs:range` reification,
    /// `4.E` step 9).
    pub is_axiom: bool,
    pub removed: bool,
}

impl EdgeData {
    fn carry_attributes_from(&mut self, other: &EdgeData) {
        self.is_predicate = other.is_predicate;
        self.is_rank = other.is_rank;
        self.is_strat = other.is_strat;
        self.is_collection = other.is_collection;
        self.is_axiom = other.is_axiom;
    }
}

/// A labelled directed multigraph of [`NodeData`]/[`EdgeData`], indexed by
/// stable [`NodeId`]/[`EdgeId`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    /// Outgoing edge ids per node, in insertion order.
    out_adj: Vec<Vec<EdgeId>>,
    /// Incoming edge ids per node, in insertion order.
    in_adj: Vec<Vec<EdgeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, predicate: Term, label: impl Into<String>) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeData {
            source,
            target,
            predicate,
            label: label.into(),
            is_predicate: false,
            is_rank: false,
            is_strat: false,
            is_collection: false,
            is_axiom: false,
            removed: false,
        });
        self.out_adj[source.0].push(id);
        self.in_adj[target.0].push(id);
        id
    }

    /// Build a dense subgraph containing only edges with `is_strat` set, the
    /// shape the tree decomposer expects (`4.G`: "a directed graph containing
    /// only rank/strat edges"). Nodes with no surviving incident edge are
    /// dropped too.
    pub fn strat_subgraph(&self) -> Graph {
        let mut out = Graph::new();
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        for edge_id in self.edge_ids() {
            let edge = &self.edges[edge_id.0];
            if !edge.is_strat || edge.source == edge.target {
                continue;
            }
            let source = *mapping
                .entry(edge.source)
                .or_insert_with(|| out.add_node(self.nodes[edge.source.0].clone()));
            let target = *mapping
                .entry(edge.target)
                .or_insert_with(|| out.add_node(self.nodes[edge.target.0].clone()));
            let new_id = out.add_edge(source, target, edge.predicate.clone(), edge.label.clone());
            out.edges[new_id.0].carry_attributes_from(edge);
        }
        out
    }

    /// Mark a node removed. Its incident edges are removed too. Ids are
    /// never reused or compacted; use [`Graph::relabel`] to obtain a dense
    /// graph afterward.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.nodes[id.0].removed {
            return;
        }
        self.nodes[id.0].removed = true;
        let incident: Vec<EdgeId> = self.out_adj[id.0]
            .iter()
            .chain(self.in_adj[id.0].iter())
            .copied()
            .collect();
        for edge_id in incident {
            self.remove_edge(edge_id);
        }
    }

    pub fn remove_edge(&mut self, id: EdgeId) {
        self.edges[id.0].removed = true;
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &EdgeData {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut EdgeData {
        &mut self.edges[id.0]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(move |id| !self.nodes[id.0].removed)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len())
            .map(EdgeId)
            .filter(move |id| !self.edges[id.0].removed)
    }

    pub fn node_count(&self) -> usize {
        self.node_ids().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_ids().count()
    }

    /// Edge ids leaving `id`, live edges only.
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_adj[id.0]
            .iter()
            .copied()
            .filter(move |e| !self.edges[e.0].removed)
    }

    /// Edge ids entering `id`, live edges only.
    pub fn in_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.in_adj[id.0]
            .iter()
            .copied()
            .filter(move |e| !self.edges[e.0].removed)
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(id).map(move |e| self.edges[e.0].target)
    }

    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges(id).map(move |e| self.edges[e.0].source)
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.out_edges(id).count()
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.in_edges(id).count()
    }

    /// Partition live nodes into weakly connected components, each returned
    /// as a `Vec<NodeId>` in discovery order (`4.G` decomposition's first
    /// step operates per component).
    pub fn weakly_connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut components = Vec::new();

        for start in self.node_ids() {
            if seen.contains(&start) {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start];
            seen.insert(start);
            while let Some(node) = stack.pop() {
                component.push(node);
                let neighbors = self
                    .successors(node)
                    .chain(self.predecessors(node))
                    .collect::<Vec<_>>();
                for neighbor in neighbors {
                    if seen.insert(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
            component.sort_by_key(|n| n.0);
            components.push(component);
        }
        components
    }

    /// Build a dense copy containing only live nodes/edges, with ids
    /// reassigned from 0. Returns the new graph and the old-to-new node id
    /// mapping.
    pub fn relabel(&self) -> (Graph, HashMap<NodeId, NodeId>) {
        let mut mapping = HashMap::new();
        let mut out = Graph::new();
        for old_id in self.node_ids() {
            let new_id = out.add_node(self.nodes[old_id.0].clone());
            mapping.insert(old_id, new_id);
        }
        for old_edge in self.edge_ids() {
            let edge = &self.edges[old_edge.0];
            let source = mapping[&edge.source];
            let target = mapping[&edge.target];
            let new_id = out.add_edge(source, target, edge.predicate.clone(), edge.label.clone());
            out.edges[new_id.0].carry_attributes_from(edge);
        }
        (out, mapping)
    }

    /// Build a dense subgraph containing only the given nodes and any live
    /// edges between them, with fresh ids. Returns the subgraph and the
    /// old-to-new node id mapping.
    pub fn subgraph(&self, nodes: &[NodeId]) -> (Graph, HashMap<NodeId, NodeId>) {
        let wanted: HashSet<NodeId> = nodes.iter().copied().collect();
        let mut mapping = HashMap::new();
        let mut out = Graph::new();
        for &old_id in nodes {
            let new_id = out.add_node(self.nodes[old_id.0].clone());
            mapping.insert(old_id, new_id);
        }
        for old_edge in self.edge_ids() {
            let edge = &self.edges[old_edge.0];
            if wanted.contains(&edge.source) && wanted.contains(&edge.target) {
                let source = mapping[&edge.source];
                let target = mapping[&edge.target];
                let new_id = out.add_edge(source, target, edge.predicate.clone(), edge.label.clone());
                out.edges[new_id.0].carry_attributes_from(edge);
            }
        }
        (out, mapping)
    }

    /// Build a new graph with every edge's source/target swapped.
    pub fn reverse(&self) -> Graph {
        let mut out = Graph::new();
        for node in &self.nodes {
            out.nodes.push(node.clone());
            out.out_adj.push(Vec::new());
            out.in_adj.push(Vec::new());
        }
        for edge in self.edge_ids() {
            let e = &self.edges[edge.0];
            let new_id = out.add_edge(e.target, e.source, e.predicate.clone(), e.label.clone());
            out.edges[new_id.0].carry_attributes_from(e);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iri::IRI;

    fn node(label: &str) -> NodeData {
        NodeData::new(Term::Iri(IRI::new(format!("http://example.org/{label}")).unwrap()), label)
    }

    fn predicate() -> Term {
        Term::Iri(IRI::new("http://example.org/p").unwrap())
    }

    #[test]
    fn add_and_iterate_nodes_and_edges() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        g.add_edge(a, b, predicate(), "p");
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.successors(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(g.predecessors(b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        g.add_edge(a, b, predicate(), "p");
        g.remove_node(b);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.out_degree(a), 0);
    }

    #[test]
    fn weakly_connected_components_splits_disjoint_parts() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let c = g.add_node(node("C"));
        g.add_edge(a, b, predicate(), "p");
        let components = g.weakly_connected_components();
        assert_eq!(components.len(), 2);
        let sizes: Vec<usize> = components.iter().map(Vec::len).collect();
        assert!(sizes.contains(&2) && sizes.contains(&1));
        assert!(components.iter().any(|c_| c_.contains(&c)));
    }

    #[test]
    fn relabel_compacts_ids_after_removal() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let c = g.add_node(node("C"));
        g.add_edge(a, b, predicate(), "p");
        g.add_edge(b, c, predicate(), "q");
        g.remove_node(a);
        let (relabeled, mapping) = g.relabel();
        assert_eq!(relabeled.node_count(), 2);
        assert_eq!(relabeled.edge_count(), 1);
        assert_eq!(mapping[&b], NodeId(0));
        assert_eq!(mapping[&c], NodeId(1));
    }

    #[test]
    fn subgraph_keeps_only_edges_between_selected_nodes() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let c = g.add_node(node("C"));
        g.add_edge(a, b, predicate(), "p");
        g.add_edge(b, c, predicate(), "q");
        let (sub, _) = g.subgraph(&[a, b]);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 1);
    }

    #[test]
    fn reverse_swaps_edge_direction() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        g.add_edge(a, b, predicate(), "p");
        let reversed = g.reverse();
        assert_eq!(reversed.successors(b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn strat_subgraph_keeps_only_strat_edges_and_drops_isolated_nodes() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let c = g.add_node(node("C"));
        let isolated = g.add_node(node("Isolated"));
        let _ = isolated;
        let rank_edge = g.add_edge(a, b, predicate(), "subClassOf");
        g.edge_mut(rank_edge).is_strat = true;
        g.add_edge(b, c, predicate(), "worksFor"); // not strat, stays out

        let strat = g.strat_subgraph();
        assert_eq!(strat.node_count(), 2);
        assert_eq!(strat.edge_count(), 1);
        let edge_id = strat.edge_ids().next().unwrap();
        assert_eq!(strat.node(strat.edge(edge_id).source).label, "A");
        assert_eq!(strat.node(strat.edge(edge_id).target).label, "B");
    }

    #[test]
    fn strat_subgraph_excludes_self_loops() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let self_loop = g.add_edge(a, a, predicate(), "sameAs");
        g.edge_mut(self_loop).is_strat = true;

        let strat = g.strat_subgraph();
        assert_eq!(strat.node_count(), 0);
        assert_eq!(strat.edge_count(), 0);
    }
}
