//! Hierarchical grid layout: two passes over a single-parent tree turning
//! parent/child structure into pixel coordinates (`4.H Layout engine`).

use crate::config::LayoutConfig;
use crate::decomposer::Tree;
use crate::error::{BridgeError, BridgeResult};
use crate::graph::NodeId;
use std::collections::{HashMap, VecDeque};

/// Grid and pixel coordinates computed for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub reserved_x: usize,
    pub reserved_y: usize,
    pub draw_x: f64,
    pub draw_y: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

/// Grid placements for every node of every tree in a forest, each tree
/// offset along the concatenation axis so trees don't overlap.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    placements: HashMap<NodeId, Placement>,
}

impl Layout {
    pub fn get(&self, node: NodeId) -> BridgeResult<&Placement> {
        self.placements.get(&node).ok_or(BridgeError::MissingRequiredLayoutKey {
            key: "reserved_x",
            node_id: node.0,
        })
    }
}

/// Lay out an entire forest of trees, concatenating them along x (vertical
/// layouts) or y (horizontal layouts), and return the combined placement
/// table.
pub fn layout_forest(trees: &[Tree], config: &LayoutConfig) -> Layout {
    let mut layout = Layout::default();
    let mut offset = 0usize;
    for tree in trees {
        let (tree_layout, extent) = layout_tree(tree, config);
        for (node, mut placement) in tree_layout {
            if config.horizontal {
                placement.draw_y += offset as f64;
            } else {
                placement.draw_x += offset as f64;
            }
            placement.pixel_x = (placement.draw_x) * (2.0 * config.shape_width + config.padding_x);
            placement.pixel_y = (placement.draw_y) * (2.0 * config.shape_height + config.padding_y);
            layout.placements.insert(node, placement);
        }
        offset += extent;
    }
    layout
}

/// Compute grid and draw coordinates for one tree, returning per-node
/// placements (draw_x/draw_y pre-offset) and the tree's total extent along
/// the concatenation axis, in grid cells.
fn layout_tree(tree: &Tree, config: &LayoutConfig) -> (HashMap<NodeId, Placement>, usize) {
    let g = &tree.graph;
    let mut placements: HashMap<NodeId, Placement> = HashMap::new();
    for node in g.node_ids() {
        placements.insert(node, Placement::default());
    }

    // Bottom-up grid allocation: reverse BFS order from the root.
    let bfs_order = bfs_order_from(tree.root, g);
    for &node in bfs_order.iter().rev() {
        let children: Vec<NodeId> = g.successors(node).collect();
        if children.is_empty() {
            placements.get_mut(&node).unwrap().reserved_x = 1;
            placements.get_mut(&node).unwrap().reserved_y = 1;
        } else {
            let reserved_x: usize = children.iter().map(|c| placements[c].reserved_x).sum();
            let reserved_y = children.iter().map(|c| placements[c].reserved_y).max().unwrap_or(0) + 1;
            let p = placements.get_mut(&node).unwrap();
            p.reserved_x = reserved_x.max(1);
            p.reserved_y = reserved_y;
        }
    }

    // Top-down draw positions.
    let depths = bfs_depths_map(tree.root, g);
    for (&node, &depth) in &depths {
        placements.get_mut(&node).unwrap().draw_y = depth as f64;
    }

    let mut cursor_x: HashMap<NodeId, f64> = HashMap::new();
    cursor_x.insert(tree.root, 0.0);
    let pre_order = pre_order_from(tree.root, g);
    for node in pre_order {
        let node_cursor = *cursor_x.get(&node).unwrap_or(&0.0);
        let reserved = placements[&node].reserved_x as f64;
        placements.get_mut(&node).unwrap().draw_x = node_cursor + reserved / 2.0;

        let mut sibling_offset = node_cursor;
        for child in g.successors(node) {
            cursor_x.insert(child, sibling_offset);
            sibling_offset += placements[&child].reserved_x as f64;
        }
    }

    if config.horizontal {
        for placement in placements.values_mut() {
            std::mem::swap(&mut placement.draw_x, &mut placement.draw_y);
        }
    }

    let extent = placements.get(&tree.root).map(|p| p.reserved_x).unwrap_or(1);
    (placements, extent)
}

fn bfs_order_from(root: NodeId, g: &crate::graph::Graph) -> Vec<NodeId> {
    let mut visited = std::collections::HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    visited.insert(root);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for child in g.successors(node) {
            if visited.insert(child) {
                queue.push_back(child);
            }
        }
    }
    order
}

fn bfs_depths_map(root: NodeId, g: &crate::graph::Graph) -> HashMap<NodeId, usize> {
    let mut depths = HashMap::new();
    depths.insert(root, 0);
    let mut queue = VecDeque::new();
    queue.push_back(root);
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

fn pre_order_from(root: NodeId, g: &crate::graph::Graph) -> Vec<NodeId> {
    let mut visited = std::collections::HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root];
    visited.insert(root);
    while let Some(node) = stack.pop() {
        order.push(node);
        let mut children: Vec<NodeId> = g.successors(node).filter(|c| visited.insert(*c)).collect();
        children.reverse();
        for child in children {
            stack.push(child);
        }
    }
    order
}
