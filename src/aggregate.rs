// Aggregation layer - composes the registry, item store, relationship
// store and graph engine into enhanced views and cross-cutting operations.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::graph::{
    apply_layout, build_graph, relationship_stats, shortest_path, PathCache, RelationshipStats,
    WallGraph,
};
use crate::items::{ItemStore, NewItem};
use crate::models::{Item, ObjectType};
use crate::registry::SchemaRegistry;
use crate::relationships::RelationshipStore;

/// An item augmented with its relationship footprint, for display.
#[derive(Debug, Clone)]
pub struct EnhancedItem {
    pub item: Item,
    pub relationship_count: usize,
    pub related_item_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSortKey {
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub object_type_id: Option<String>,
    pub has_images: Option<bool>,
    pub has_relationships: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub sort: Option<(ItemSortKey, bool)>, // (key, newest_first)
}

/// The first fatal error of a bulk run, pinned to the input it failed on.
#[derive(Debug)]
pub struct BulkFailure {
    pub index: usize,
    pub error: AppError,
}

/// Outcome of a bulk create: individual, non-atomic sub-creates. Every
/// success is reported even when a sibling fails, so partial progress is
/// observable.
#[derive(Debug)]
pub struct BulkCreateOutcome {
    pub created: Vec<Item>,
    pub failed: Option<BulkFailure>,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub items: Vec<Item>,
    pub object_types: Vec<ObjectType>,
}

pub struct AggregationService {
    registry: Arc<SchemaRegistry>,
    items: Arc<ItemStore>,
    relationships: Arc<RelationshipStore>,
    config: EngineConfig,
    path_cache: Mutex<PathCache>,
}

impl AggregationService {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        items: Arc<ItemStore>,
        relationships: Arc<RelationshipStore>,
        config: EngineConfig,
    ) -> Self {
        let path_cache = Mutex::new(PathCache::new(config.cache.capacity));
        Self {
            registry,
            items,
            relationships,
            config,
            path_cache,
        }
    }

    /// Every item on the wall with its relationship count and neighbors.
    pub async fn enhanced_items(&self, wall_id: &str) -> AppResult<Vec<EnhancedItem>> {
        let items = self.items.list_by_wall(wall_id).await?;
        let edges = self.relationships.list_for_wall(wall_id).await?;

        let mut neighbors: HashMap<&str, Vec<String>> = HashMap::new();
        for edge in &edges {
            neighbors
                .entry(edge.from_item_id.as_str())
                .or_default()
                .push(edge.to_item_id.clone());
            neighbors
                .entry(edge.to_item_id.as_str())
                .or_default()
                .push(edge.from_item_id.clone());
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let related = neighbors.remove(item.id.as_str()).unwrap_or_default();
                EnhancedItem {
                    relationship_count: related.len(),
                    related_item_ids: related,
                    item,
                }
            })
            .collect())
    }

    /// Create many records concurrently. Not atomic: each sub-create
    /// stands alone, the first failure is surfaced with its input index,
    /// and successes on either side of it are kept.
    pub async fn bulk_create(&self, new_items: Vec<NewItem>) -> AppResult<BulkCreateOutcome> {
        let total = new_items.len();
        let results = join_all(new_items.into_iter().map(|n| self.items.create(n))).await;

        let mut outcome = BulkCreateOutcome {
            created: Vec::new(),
            failed: None,
        };
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(item) => outcome.created.push(item),
                Err(error) => {
                    if outcome.failed.is_none() {
                        outcome.failed = Some(BulkFailure { index, error });
                    }
                }
            }
        }
        info!(
            "bulk_create: {}/{} records created{}",
            outcome.created.len(),
            total,
            outcome
                .failed
                .as_ref()
                .map(|f| format!(", first failure at index {}", f.index))
                .unwrap_or_default()
        );
        Ok(outcome)
    }

    /// Filtered, sorted listing over a wall's items.
    pub async fn list_filtered(&self, wall_id: &str, filter: &ItemFilter) -> AppResult<Vec<Item>> {
        let mut items = match &filter.object_type_id {
            Some(object_type_id) => {
                self.items
                    .list_by_object_type(wall_id, object_type_id)
                    .await?
            }
            None => self.items.list_by_wall(wall_id).await?,
        };

        if let Some(has_images) = filter.has_images {
            items.retain(|i| !i.images.is_empty() == has_images);
        }
        if let Some(after) = filter.created_after {
            items.retain(|i| i.created_at >= after);
        }
        if let Some(before) = filter.created_before {
            items.retain(|i| i.created_at <= before);
        }
        if let Some(has_relationships) = filter.has_relationships {
            let edges = self.relationships.list_for_wall(wall_id).await?;
            items.retain(|item| edges.iter().any(|e| e.touches(&item.id)) == has_relationships);
        }

        if let Some((key, newest_first)) = filter.sort {
            items.sort_by_key(|i| match key {
                ItemSortKey::CreatedAt => i.created_at,
                ItemSortKey::UpdatedAt => i.updated_at,
            });
            if newest_first {
                items.reverse();
            }
        }
        Ok(items)
    }

    /// Free-text search across records and object type names.
    pub async fn search(&self, wall_id: &str, term: &str) -> AppResult<SearchResults> {
        let items = self.items.search(wall_id, term).await?;
        let needle = term.to_lowercase();
        let object_types = if needle.is_empty() {
            Vec::new()
        } else {
            self.registry
                .list_for_wall(wall_id)
                .await?
                .into_iter()
                .filter(|t| t.name.to_lowercase().contains(&needle))
                .collect()
        };
        Ok(SearchResults {
            items,
            object_types,
        })
    }

    /// Build the wall's graph with layout positions.
    pub async fn wall_graph(&self, wall_id: &str, seed: u64) -> AppResult<WallGraph> {
        let mut graph = self.assemble_graph(wall_id).await?;
        apply_layout(&mut graph, &self.config.layout, seed);
        Ok(graph)
    }

    /// Shortest path between two items, as an edge-id sequence. Results
    /// (including "no path") are cached per wall until `invalidate_paths`.
    pub async fn shortest_path(
        &self,
        wall_id: &str,
        from_item_id: &str,
        to_item_id: &str,
    ) -> AppResult<Option<Vec<String>>> {
        let key = (
            wall_id.to_string(),
            from_item_id.to_string(),
            to_item_id.to_string(),
        );
        {
            let mut cache = self.path_cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                return Ok(cached.clone());
            }
        }

        let graph = self.assemble_graph(wall_id).await?;
        let path = shortest_path(&graph, from_item_id, to_item_id)
            .map(|edges| edges.iter().map(|e| e.id.clone()).collect::<Vec<_>>());

        let mut cache = self.path_cache.lock().await;
        cache.insert(key, path.clone());
        Ok(path)
    }

    /// Drop cached path results for a wall; call after edge or item
    /// writes on it.
    pub async fn invalidate_paths(&self, wall_id: &str) {
        self.path_cache.lock().await.invalidate_wall(wall_id);
    }

    /// Connectivity statistics over the wall's current edge set.
    pub async fn wall_statistics(&self, wall_id: &str) -> AppResult<RelationshipStats> {
        let edges = self.relationships.list_for_wall(wall_id).await?;
        Ok(relationship_stats(&edges))
    }

    async fn assemble_graph(&self, wall_id: &str) -> AppResult<WallGraph> {
        let items = self.items.list_by_wall(wall_id).await?;
        let definitions = self.registry.list_relationship_definitions(wall_id).await?;
        let edges = self.relationships.list_for_wall(wall_id).await?;
        Ok(build_graph(&items, &definitions, &edges))
    }
}
