// Graph engine - builds an in-memory graph from a wall's records and
// relationship data, and answers path queries over it. Pure given its
// inputs; persistence never leaks in here.

pub mod layout;
pub mod path_cache;
pub mod stats;

pub use layout::{apply_layout, force_layout, Position};
pub use path_cache::PathCache;
pub use stats::{relationship_stats, ItemDegree, RelationshipStats};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Item, ObjectRelationship, RelationshipDefinition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub object_type_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub relationship_definition_id: String,
    /// Mirrored definitions are traversable from either endpoint.
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub positions: HashMap<String, Position>,
}

/// Assemble the graph for a wall: one node per item, one graph edge per
/// stored edge. Edges referencing items outside the node set are dropped
/// (they can appear mid-deletion). Positions start empty; `apply_layout`
/// fills them.
pub fn build_graph(
    items: &[Item],
    definitions: &[RelationshipDefinition],
    edges: &[ObjectRelationship],
) -> WallGraph {
    let bidirectional: HashSet<&str> = definitions
        .iter()
        .filter(|d| d.bidirectional)
        .map(|d| d.id.as_str())
        .collect();

    let nodes: Vec<GraphNode> = items
        .iter()
        .map(|item| GraphNode {
            id: item.id.clone(),
            label: item.display_label().to_string(),
            object_type_id: item.object_type_id.clone(),
        })
        .collect();
    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let edges: Vec<GraphEdge> = edges
        .iter()
        .filter(|e| node_ids.contains(e.from_item_id.as_str()) && node_ids.contains(e.to_item_id.as_str()))
        .map(|e| GraphEdge {
            id: e.id.clone(),
            from: e.from_item_id.clone(),
            to: e.to_item_id.clone(),
            relationship_definition_id: e.relationship_definition_id.clone(),
            bidirectional: bidirectional.contains(e.relationship_definition_id.as_str()),
        })
        .collect();

    WallGraph {
        nodes,
        edges,
        positions: HashMap::new(),
    }
}

/// Unweighted shortest path by breadth-first search. A stored edge is
/// traversable from its `from` endpoint, and in reverse only when its
/// definition is bidirectional. Adjacency is built in edge insertion
/// order, so equal-length ties resolve deterministically. Returns the
/// edge sequence, or None when the target is unreachable.
pub fn shortest_path<'a>(
    graph: &'a WallGraph,
    from_id: &str,
    to_id: &str,
) -> Option<Vec<&'a GraphEdge>> {
    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    if !node_ids.contains(from_id) || !node_ids.contains(to_id) {
        return None;
    }
    if from_id == to_id {
        return Some(Vec::new());
    }

    let mut adjacency: HashMap<&str, Vec<(usize, &str)>> = HashMap::new();
    for (index, edge) in graph.edges.iter().enumerate() {
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push((index, edge.to.as_str()));
        if edge.bidirectional {
            adjacency
                .entry(edge.to.as_str())
                .or_default()
                .push((index, edge.from.as_str()));
        }
    }

    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut visited: HashSet<&str> = HashSet::new();
    // node -> (edge index, previous node) along the discovered path
    let mut came_from: HashMap<&str, (usize, &str)> = HashMap::new();

    queue.push_back(from_id);
    visited.insert(from_id);

    while let Some(current) = queue.pop_front() {
        if current == to_id {
            let mut path = Vec::new();
            let mut cursor = current;
            while cursor != from_id {
                let (edge_index, previous) = came_from[cursor];
                path.push(&graph.edges[edge_index]);
                cursor = previous;
            }
            path.reverse();
            return Some(path);
        }
        if let Some(neighbors) = adjacency.get(current) {
            for &(edge_index, neighbor) in neighbors {
                if visited.insert(neighbor) {
                    came_from.insert(neighbor, (edge_index, current));
                    queue.push_back(neighbor);
                }
            }
        }
    }
    None
}
