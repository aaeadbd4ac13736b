// Connectivity statistics over a wall's edge set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::ObjectRelationship;

const MOST_CONNECTED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDegree {
    pub item_id: String,
    /// In-degree plus out-degree over stored edges.
    pub degree: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipStats {
    pub total_relationships: usize,
    pub per_definition: HashMap<String, usize>,
    /// Top ten items by degree, ties broken by item id for determinism.
    pub most_connected: Vec<ItemDegree>,
}

pub fn relationship_stats(edges: &[ObjectRelationship]) -> RelationshipStats {
    let mut per_definition: HashMap<String, usize> = HashMap::new();
    let mut degrees: HashMap<&str, usize> = HashMap::new();
    for edge in edges {
        *per_definition
            .entry(edge.relationship_definition_id.clone())
            .or_insert(0) += 1;
        *degrees.entry(edge.from_item_id.as_str()).or_insert(0) += 1;
        *degrees.entry(edge.to_item_id.as_str()).or_insert(0) += 1;
    }

    let mut most_connected: Vec<ItemDegree> = degrees
        .into_iter()
        .map(|(item_id, degree)| ItemDegree {
            item_id: item_id.to_string(),
            degree,
        })
        .collect();
    most_connected.sort_by(|a, b| {
        b.degree
            .cmp(&a.degree)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    most_connected.truncate(MOST_CONNECTED_LIMIT);

    RelationshipStats {
        total_relationships: edges.len(),
        per_definition,
        most_connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn edge(id: &str, from: &str, to: &str, definition_id: &str) -> ObjectRelationship {
        ObjectRelationship {
            id: id.to_string(),
            wall_id: "w1".to_string(),
            from_item_id: from.to_string(),
            to_item_id: to.to_string(),
            relationship_definition_id: definition_id.to_string(),
            metadata: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    #[test]
    fn counts_per_definition_and_total() {
        let edges = vec![
            edge("e1", "a", "b", "served_with"),
            edge("e2", "a", "c", "served_with"),
            edge("e3", "b", "c", "deployed_to"),
        ];
        let stats = relationship_stats(&edges);
        assert_eq!(stats.total_relationships, 3);
        assert_eq!(stats.per_definition["served_with"], 2);
        assert_eq!(stats.per_definition["deployed_to"], 1);
    }

    #[test]
    fn ranks_by_degree_with_id_tiebreak() {
        let edges = vec![
            edge("e1", "a", "b", "d1"),
            edge("e2", "a", "c", "d1"),
            edge("e3", "c", "b", "d1"),
        ];
        let stats = relationship_stats(&edges);
        // a and b and c all have degree 2; ties resolve by id.
        assert_eq!(
            stats
                .most_connected
                .iter()
                .map(|d| d.item_id.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn caps_the_ranking_at_ten() {
        let edges: Vec<ObjectRelationship> = (0..15)
            .map(|i| edge(&format!("e{}", i), &format!("n{}", i), "hub", "d1"))
            .collect();
        let stats = relationship_stats(&edges);
        assert_eq!(stats.most_connected.len(), 10);
        assert_eq!(stats.most_connected[0].item_id, "hub");
        assert_eq!(stats.most_connected[0].degree, 15);
    }

    #[test]
    fn empty_edge_set_is_empty_stats() {
        let stats = relationship_stats(&[]);
        assert_eq!(stats.total_relationships, 0);
        assert!(stats.per_definition.is_empty());
        assert!(stats.most_connected.is_empty());
    }
}
