// Force-directed layout - a fixed-iteration physics loop: inverse-square
// repulsion between every node pair, linear attraction along edges,
// positions clamped to the canvas. A visual aid, deterministic given the
// seed, not an optimal embedding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LayoutSettings;
use crate::graph::{GraphEdge, GraphNode, WallGraph};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// Below this separation the repulsion math degenerates; nodes are treated
// as this far apart instead.
const MIN_SEPARATION: f64 = 0.01;

/// Compute positions for every node. Same nodes, edges, settings and seed
/// yield the same positions.
pub fn force_layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    settings: &LayoutSettings,
    seed: u64,
) -> HashMap<String, Position> {
    if nodes.is_empty() {
        return HashMap::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let mut positions: Vec<(f64, f64)> = nodes
        .iter()
        .map(|_| {
            (
                rng.random_range(0.0..settings.canvas_width),
                rng.random_range(0.0..settings.canvas_height),
            )
        })
        .collect();

    // Displacement per step is capped by a temperature that cools linearly
    // to zero over the configured iteration count.
    let initial_temperature = settings.canvas_width.min(settings.canvas_height) / 10.0;
    let iterations = settings.iterations.max(1);

    for iteration in 0..iterations {
        let temperature =
            initial_temperature * (1.0 - f64::from(iteration) / f64::from(iterations));
        let mut forces: Vec<(f64, f64)> = vec![(0.0, 0.0); positions.len()];

        // Repulsion: every pair, inverse-square falloff.
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let (dx, dy, distance) = separation(positions[i], positions[j]);
                let magnitude = settings.repulsion / (distance * distance);
                let fx = magnitude * dx / distance;
                let fy = magnitude * dy / distance;
                forces[i].0 += fx;
                forces[i].1 += fy;
                forces[j].0 -= fx;
                forces[j].1 -= fy;
            }
        }

        // Attraction: linear in distance along every edge.
        for edge in edges {
            let (Some(&i), Some(&j)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            else {
                continue;
            };
            if i == j {
                continue;
            }
            let (dx, dy, distance) = separation(positions[i], positions[j]);
            let magnitude = settings.attraction * distance;
            let fx = magnitude * dx / distance;
            let fy = magnitude * dy / distance;
            forces[i].0 -= fx;
            forces[i].1 -= fy;
            forces[j].0 += fx;
            forces[j].1 += fy;
        }

        for (position, force) in positions.iter_mut().zip(&forces) {
            let length = (force.0 * force.0 + force.1 * force.1)
                .sqrt()
                .max(MIN_SEPARATION);
            let step = length.min(temperature);
            position.0 = (position.0 + force.0 / length * step)
                .clamp(0.0, settings.canvas_width);
            position.1 = (position.1 + force.1 / length * step)
                .clamp(0.0, settings.canvas_height);
        }
    }

    nodes
        .iter()
        .zip(positions)
        .map(|(node, (x, y))| (node.id.clone(), Position { x, y }))
        .collect()
}

fn separation(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    let distance = (dx * dx + dy * dy).sqrt().max(MIN_SEPARATION);
    (dx, dy, distance)
}

/// Fill a graph's positions in place.
pub fn apply_layout(graph: &mut WallGraph, settings: &LayoutSettings, seed: u64) {
    graph.positions = force_layout(&graph.nodes, &graph.edges, settings, seed);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            object_type_id: None,
        }
    }

    fn edge(id: &str, from: &str, to: &str) -> GraphEdge {
        GraphEdge {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            relationship_definition_id: "d1".to_string(),
            bidirectional: false,
        }
    }

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    #[test]
    fn positions_are_finite_and_inside_the_canvas() {
        let nodes: Vec<GraphNode> = (0..12).map(|i| node(&format!("n{}", i))).collect();
        let edges: Vec<GraphEdge> = (0..11)
            .map(|i| edge(&format!("e{}", i), &format!("n{}", i), &format!("n{}", i + 1)))
            .collect();
        let s = settings();
        let positions = force_layout(&nodes, &edges, &s, 7);
        assert_eq!(positions.len(), nodes.len());
        for position in positions.values() {
            assert!(position.x.is_finite() && position.y.is_finite());
            assert!((0.0..=s.canvas_width).contains(&position.x));
            assert!((0.0..=s.canvas_height).contains(&position.y));
        }
    }

    #[test]
    fn same_seed_means_same_layout() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![edge("e1", "a", "b")];
        let s = settings();
        assert_eq!(
            force_layout(&nodes, &edges, &s, 42),
            force_layout(&nodes, &edges, &s, 42)
        );
    }

    #[test]
    fn repulsion_separates_coincident_nodes() {
        let nodes = vec![node("a"), node("b")];
        let s = settings();
        let positions = force_layout(&nodes, &[], &s, 1);
        let a = positions["a"];
        let b = positions["b"];
        let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        assert!(distance > 1.0, "nodes stayed effectively coincident");
    }

    #[test]
    fn empty_graph_yields_no_positions() {
        assert!(force_layout(&[], &[], &settings(), 0).is_empty());
    }
}
