//! Tree decomposition: turning a rank/strat subgraph with forks and
//! diamonds into a forest of single-parent trees plus a severed-edge list
//! (`4.G Tree decomposer`).

use crate::graph::{EdgeId, Graph, NodeData, NodeId};
use crate::term::Term;
use std::collections::{HashMap, HashSet, VecDeque};

/// One edge that had to be cut to break a fork or a diamond, recorded so the
/// diagram can redraw it as a dashed ghost connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeveredEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
}

/// The decomposition of one weakly-connected component: a single-parent
/// tree plus the edges severed to produce it.
#[derive(Debug, Clone)]
pub struct Tree {
    pub graph: Graph,
    pub root: NodeId,
}

/// Decompose `input` (expected to contain only rank/strat edges) into a
/// forest of trees and the list of edges severed to achieve it.
pub fn decompose(input: &Graph) -> Result<(Vec<Tree>, Vec<SeveredEdge>), crate::error::BridgeError> {
    let mut trees = Vec::new();
    let mut all_severed = Vec::new();

    for component in input.weakly_connected_components() {
        let (mut component_trees, severed) = decompose_component(input, &component)?;
        trees.append(&mut component_trees);
        all_severed.extend(severed);
    }

    Ok((trees, all_severed))
}

fn decompose_component(
    input: &Graph,
    component: &[NodeId],
) -> Result<(Vec<Tree>, Vec<SeveredEdge>), crate::error::BridgeError> {
    let (mut sub, mapping) = input.subgraph(component);
    let reverse_mapping: HashMap<NodeId, NodeId> = mapping.iter().map(|(&k, &v)| (v, k)).collect();

    // Step 2: anchor a synthetic dummy node into every zero-in-degree root.
    let dummy_term = Term::BlankNode("dummy".to_string());
    let dummy = sub.add_node(NodeData::new(dummy_term, "dummy"));
    let roots: Vec<NodeId> = sub
        .node_ids()
        .filter(|&n| n != dummy && sub.in_degree(n) == 0)
        .collect();
    for root in &roots {
        sub.add_edge(dummy, *root, Term::BlankNode("dummy-edge".to_string()), "");
    }

    // Step 3: fork nodes in DFS post-order from dummy.
    let fork_order = dfs_post_order(&sub, dummy);
    let forks: Vec<NodeId> = fork_order
        .into_iter()
        .filter(|&n| sub.in_degree(n) > 1)
        .collect();

    let mut severed = Vec::new();

    if !forks.is_empty() {
        // Step 4: sort forks by shortest-path depth from dummy, shallowest first.
        let depths = bfs_depths(&sub, dummy);
        let mut sorted_forks = forks.clone();
        sorted_forks.sort_by_key(|n| depths.get(n).copied().unwrap_or(usize::MAX));

        // Step 5: diamond heads - for each root/fork pair with >1 simple
        // path, mark the first node on the first such path.
        let mut diamond_heads: HashSet<NodeId> = HashSet::new();
        for &fork in &sorted_forks {
            for &root in &roots {
                let paths = count_simple_paths(&sub, root, fork, 3);
                if paths > 1 {
                    if let Some(first_path) = first_simple_path(&sub, root, fork) {
                        if first_path.len() > 1 {
                            diamond_heads.insert(first_path[0]);
                        }
                    }
                }
            }
        }

        // Step 6: for each fork, keep its first predecessor, sever the rest.
        for &fork in &sorted_forks {
            let incoming: Vec<EdgeId> = sub.in_edges(fork).collect();
            for (i, edge_id) in incoming.iter().enumerate() {
                if i == 0 {
                    continue;
                }
                let edge = sub.edge(*edge_id);
                severed.push(SeveredEdge {
                    source: reverse_mapping[&edge.source],
                    target: reverse_mapping[&edge.target],
                    label: edge.label.clone(),
                });
                sub.remove_edge(*edge_id);
            }
        }

        // Step 7: for each diamond head, keep its first successor, sever the rest.
        for &head in &diamond_heads {
            let outgoing: Vec<EdgeId> = sub.out_edges(head).collect();
            for (i, edge_id) in outgoing.iter().enumerate() {
                if i == 0 {
                    continue;
                }
                let edge = sub.edge(*edge_id);
                severed.push(SeveredEdge {
                    source: reverse_mapping[&edge.source],
                    target: reverse_mapping[&edge.target],
                    label: edge.label.clone(),
                });
                sub.remove_edge(*edge_id);
            }
        }
    }

    // Step 8: remove the dummy node, then re-split into weakly-connected
    // components - severing a fork/diamond can leave subtrees unreachable
    // from any remaining root, and those must surface as their own trees
    // rather than hang off the chosen root's node set.
    sub.remove_node(dummy);
    let mut trees = Vec::new();
    for piece in sub.weakly_connected_components() {
        let (piece_graph, remap) = sub.subgraph(&piece);
        let root = piece
            .iter()
            .find(|&&n| sub.in_degree(n) == 0)
            .or_else(|| piece.first())
            .and_then(|r| remap.get(r))
            .copied()
            .unwrap_or(NodeId(0));
        trees.push(Tree {
            graph: piece_graph,
            root,
        });
    }

    Ok((trees, severed))
}

fn dfs_post_order(g: &Graph, start: NodeId) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    dfs_visit(g, start, &mut visited, &mut order);
    order
}

fn dfs_visit(g: &Graph, node: NodeId, visited: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
    if !visited.insert(node) {
        return;
    }
    for child in g.successors(node) {
        dfs_visit(g, child, visited, order);
    }
    order.push(node);
}

fn bfs_depths(g: &Graph, start: NodeId) -> HashMap<NodeId, usize> {
    let mut depths = HashMap::new();
    depths.insert(start, 0);
    let mut queue = VecDeque::new();
    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        let depth = depths[&node];
        for child in g.successors(node) {
            if !depths.contains_key(&child) {
                depths.insert(child, depth + 1);
                queue.push_back(child);
            }
        }
    }
    depths
}

/// Count simple paths from `from` to `to`, capped at `limit` (decomposition
/// only needs to know whether there is more than one).
fn count_simple_paths(g: &Graph, from: NodeId, to: NodeId, limit: usize) -> usize {
    let mut count = 0;
    let mut visiting = HashSet::new();
    count_simple_paths_rec(g, from, to, &mut visiting, &mut count, limit);
    count
}

fn count_simple_paths_rec(
    g: &Graph,
    node: NodeId,
    to: NodeId,
    visiting: &mut HashSet<NodeId>,
    count: &mut usize,
    limit: usize,
) {
    if *count >= limit {
        return;
    }
    if node == to {
        *count += 1;
        return;
    }
    if !visiting.insert(node) {
        return;
    }
    for child in g.successors(node) {
        count_simple_paths_rec(g, child, to, visiting, count, limit);
        if *count >= limit {
            break;
        }
    }
    visiting.remove(&node);
}

fn first_simple_path(g: &Graph, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    let mut visiting = HashSet::new();
    let mut path = Vec::new();
    if first_simple_path_rec(g, from, to, &mut visiting, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn first_simple_path_rec(
    g: &Graph,
    node: NodeId,
    to: NodeId,
    visiting: &mut HashSet<NodeId>,
    path: &mut Vec<NodeId>,
) -> bool {
    if !visiting.insert(node) {
        return false;
    }
    path.push(node);
    if node == to {
        return true;
    }
    for child in g.successors(node) {
        if first_simple_path_rec(g, child, to, visiting, path) {
            return true;
        }
    }
    path.pop();
    visiting.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iri::IRI;

    fn node(label: &str) -> NodeData {
        NodeData::new(Term::Iri(IRI::new(format!("http://example.org/{label}")).unwrap()), label)
    }

    fn predicate() -> Term {
        Term::Iri(IRI::new("http://example.org/subClassOf").unwrap())
    }

    #[test]
    fn already_a_tree_is_returned_unchanged() {
        let mut g = Graph::new();
        let root = g.add_node(node("Root"));
        let child = g.add_node(node("Child"));
        g.add_edge(root, child, predicate(), "subClassOf");
        let (trees, severed) = decompose(&g).unwrap();
        assert_eq!(trees.len(), 1);
        assert!(severed.is_empty());
        assert_eq!(trees[0].graph.node_count(), 2);
    }

    #[test]
    fn fork_node_keeps_first_predecessor_and_severs_rest() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let fork = g.add_node(node("Fork"));
        g.add_edge(a, fork, predicate(), "subClassOf");
        g.add_edge(b, fork, predicate(), "subClassOf");
        let (trees, severed) = decompose(&g).unwrap();
        assert_eq!(severed.len(), 1);
        // Severing b's edge into the fork leaves b with no edges at all, so
        // it surfaces as its own single-node tree alongside {a, fork}.
        assert_eq!(trees.len(), 2);
        let total_nodes: usize = trees.iter().map(|t| t.graph.node_count()).sum();
        assert_eq!(total_nodes, 3);
    }

    #[test]
    fn severing_a_diamond_yields_one_tree_per_leftover_component() {
        // A -> B, A -> C, B -> D, C -> D
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        let c = g.add_node(node("C"));
        let d = g.add_node(node("D"));
        g.add_edge(a, b, predicate(), "subClassOf");
        g.add_edge(a, c, predicate(), "subClassOf");
        g.add_edge(b, d, predicate(), "subClassOf");
        g.add_edge(c, d, predicate(), "subClassOf");
        let (trees, severed) = decompose(&g).unwrap();
        assert_eq!(severed.len(), 2);
        // A->B->D stays connected; C is left with neither an incoming nor
        // (after its A->C edge is severed as the diamond head's second
        // outgoing edge) an outgoing edge, so it surfaces as its own tree.
        assert_eq!(trees.len(), 2);
        let total_nodes: usize = trees.iter().map(|t| t.graph.node_count()).sum();
        assert_eq!(total_nodes, 4);
        let sizes: std::collections::HashSet<usize> =
            trees.iter().map(|t| t.graph.node_count()).collect();
        assert_eq!(sizes, std::collections::HashSet::from([3, 1]));
    }

    #[test]
    fn disjoint_components_become_separate_trees() {
        let mut g = Graph::new();
        let a = g.add_node(node("A"));
        let b = g.add_node(node("B"));
        g.add_edge(a, b, predicate(), "subClassOf");
        let c = g.add_node(node("C"));
        let d = g.add_node(node("D"));
        g.add_edge(c, d, predicate(), "subClassOf");
        let (trees, severed) = decompose(&g).unwrap();
        assert_eq!(trees.len(), 2);
        assert!(severed.is_empty());
    }
}
