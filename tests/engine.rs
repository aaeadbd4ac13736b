// End-to-end engine tests over the in-memory document store.

use std::sync::Arc;

use serde_json::json;
use wallgraph::aggregate::AggregationService;
use wallgraph::error::AppError;
use wallgraph::items::{ItemStore, NewItem};
use wallgraph::models::{FieldData, FieldDefinition, FieldType, RelationshipType};
use wallgraph::registry::{NewObjectType, NewRelationshipDefinition, SchemaRegistry};
use wallgraph::relationships::{NewEdge, RelationshipStore};
use wallgraph::storage::{DocumentStore, MemoryStore};
use wallgraph::{DisplaySettings, EngineConfig};

const WALL: &str = "wall-1";

struct Engine {
    store: Arc<MemoryStore>,
    registry: Arc<SchemaRegistry>,
    items: Arc<ItemStore>,
    relationships: Arc<RelationshipStore>,
    aggregate: AggregationService,
}

fn engine() -> Engine {
    wallgraph::observability::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SchemaRegistry::new(store.clone()));
    let relationships = Arc::new(RelationshipStore::new(store.clone(), registry.clone()));
    let items = Arc::new(ItemStore::new(
        store.clone(),
        registry.clone(),
        relationships.clone(),
    ));
    let aggregate = AggregationService::new(
        registry.clone(),
        items.clone(),
        relationships.clone(),
        EngineConfig::default(),
    );
    Engine {
        store,
        registry,
        items,
        relationships,
        aggregate,
    }
}

fn named_type(name: &str) -> NewObjectType {
    NewObjectType {
        wall_id: WALL.to_string(),
        name: name.to_string(),
        fields: vec![FieldDefinition::new("name", "Name", FieldType::Text).required()],
        display_settings: DisplaySettings {
            primary_field_id: Some("name".to_string()),
            secondary_field_id: None,
        },
        sort_order: 0,
    }
}

fn name_data(name: &str) -> FieldData {
    let mut data = FieldData::new();
    data.insert("name".to_string(), json!(name));
    data
}

fn edge_input(from: &str, to: &str, definition_id: &str) -> NewEdge {
    NewEdge {
        wall_id: WALL.to_string(),
        from_item_id: from.to_string(),
        to_item_id: to.to_string(),
        relationship_definition_id: definition_id.to_string(),
        metadata: None,
        created_by: None,
    }
}

fn definition_input(
    name: &str,
    from_type: &str,
    to_type: &str,
    relationship_type: RelationshipType,
) -> NewRelationshipDefinition {
    NewRelationshipDefinition {
        wall_id: WALL.to_string(),
        name: name.to_string(),
        from_object_type_id: from_type.to_string(),
        to_object_type_id: to_type.to_string(),
        relationship_type,
        bidirectional: false,
        required: false,
        cascade_delete: false,
    }
}

#[tokio::test]
async fn veteran_scenario_validation_and_one_to_many() {
    let engine = engine();
    let veteran = engine
        .registry
        .create_object_type(named_type("Veteran"))
        .await
        .unwrap();
    let deployment = engine
        .registry
        .create_object_type(named_type("Deployment"))
        .await
        .unwrap();

    // Valid create succeeds; empty create fails naming exactly `name`.
    let smith = engine
        .items
        .create(NewItem::new(WALL, &veteran.id, name_data("J. Smith")))
        .await
        .unwrap();
    let err = engine
        .items
        .create(NewItem::new(WALL, &veteran.id, FieldData::new()))
        .await
        .unwrap_err();
    assert_eq!(err.violated_fields(), vec!["name"]);

    let d1 = engine
        .items
        .create(NewItem::new(WALL, &deployment.id, name_data("Korea 1951")))
        .await
        .unwrap();
    let d2 = engine
        .items
        .create(NewItem::new(WALL, &deployment.id, name_data("Vietnam 1968")))
        .await
        .unwrap();

    let deployed = engine
        .registry
        .create_relationship_definition(definition_input(
            "deployed_to",
            &veteran.id,
            &deployment.id,
            RelationshipType::OneToMany,
        ))
        .await
        .unwrap();

    // Fan-out to two different deployments is fine.
    engine
        .relationships
        .create_edge(edge_input(&smith.id, &d1.id, &deployed.id))
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&smith.id, &d2.id, &deployed.id))
        .await
        .unwrap();
    // Duplicating the same target is rejected.
    let err = engine
        .relationships
        .create_edge(edge_input(&smith.id, &d1.id, &deployed.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
    assert_eq!(
        engine.relationships.list_for_item(&smith.id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn validation_reports_every_violated_field_at_once() {
    let engine = engine();
    let object_type = engine
        .registry
        .create_object_type(NewObjectType {
            wall_id: WALL.to_string(),
            name: "Profile".to_string(),
            fields: vec![
                FieldDefinition::new("name", "Name", FieldType::Text).required(),
                FieldDefinition::new("email", "Email", FieldType::Email).required(),
                FieldDefinition::new("site", "Site", FieldType::Url),
            ],
            display_settings: DisplaySettings::default(),
            sort_order: 0,
        })
        .await
        .unwrap();

    let mut data = FieldData::new();
    data.insert("site".to_string(), json!("not a url"));
    let err = engine
        .items
        .create(NewItem::new(WALL, &object_type.id, data))
        .await
        .unwrap_err();
    assert_eq!(err.violated_fields(), vec!["name", "email", "site"]);
}

#[tokio::test]
async fn one_to_one_rejects_any_second_edge_from_the_same_source() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    let c = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("C")))
        .await
        .unwrap();

    let spouse = engine
        .registry
        .create_relationship_definition(definition_input(
            "spouse_of",
            &person.id,
            &person.id,
            RelationshipType::OneToOne,
        ))
        .await
        .unwrap();

    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &spouse.id))
        .await
        .unwrap();
    // A second edge from the same source fails regardless of target.
    let err = engine
        .relationships
        .create_edge(edge_input(&a.id, &c.id, &spouse.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
}

#[tokio::test]
async fn self_loops_are_rejected() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();

    let err = engine
        .relationships
        .create_edge(edge_input(&a.id, &a.id, &knows.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
}

#[tokio::test]
async fn bidirectional_edges_are_mirrored_for_both_endpoints() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();

    let mut served = definition_input(
        "served_with",
        &person.id,
        &person.id,
        RelationshipType::ManyToMany,
    );
    served.bidirectional = true;
    let served = engine
        .registry
        .create_relationship_definition(served)
        .await
        .unwrap();

    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &served.id))
        .await
        .unwrap();

    let from_a = engine.relationships.list_for_item(&a.id).await.unwrap();
    let from_b = engine.relationships.list_for_item(&b.id).await.unwrap();
    // Two stored edges (forward + mirror), both visible from each side.
    assert_eq!(from_a.len(), 2);
    assert_eq!(from_b.len(), 2);
    assert!(from_a.iter().any(|e| e.from_item_id == a.id && e.to_item_id == b.id));
    assert!(from_a.iter().any(|e| e.from_item_id == b.id && e.to_item_id == a.id));
    assert!(from_a
        .iter()
        .all(|e| e.relationship_definition_id == served.id));

    // Deleting one direction removes the mirror too.
    let forward = from_a
        .iter()
        .find(|e| e.from_item_id == a.id)
        .unwrap()
        .id
        .clone();
    assert!(engine.relationships.delete_edge(&forward).await.unwrap());
    assert!(engine.relationships.list_for_item(&a.id).await.unwrap().is_empty());
    assert!(engine.relationships.list_for_item(&b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cascade_delete_removes_dependents_and_leaves_no_dangling_edges() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let medal = engine
        .registry
        .create_object_type(named_type("Medal"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &medal.id, name_data("Purple Heart")))
        .await
        .unwrap();

    let mut awarded = definition_input(
        "awarded",
        &person.id,
        &medal.id,
        RelationshipType::OneToMany,
    );
    awarded.cascade_delete = true;
    let awarded = engine
        .registry
        .create_relationship_definition(awarded)
        .await
        .unwrap();

    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &awarded.id))
        .await
        .unwrap();

    assert!(engine.items.delete(&a.id).await.unwrap());
    assert!(engine.items.find(&a.id).await.unwrap().is_none());
    assert!(engine.items.find(&b.id).await.unwrap().is_none());
    assert!(engine.relationships.list_for_item(&a.id).await.unwrap().is_empty());
    assert!(engine.relationships.list_for_item(&b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cascade_cycles_terminate() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();

    let mut bound = definition_input(
        "bound_to",
        &person.id,
        &person.id,
        RelationshipType::ManyToMany,
    );
    bound.cascade_delete = true;
    let bound = engine
        .registry
        .create_relationship_definition(bound)
        .await
        .unwrap();

    // A -> B and B -> A: deleting A must cascade to B exactly once.
    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &bound.id))
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&b.id, &a.id, &bound.id))
        .await
        .unwrap();

    assert!(engine.items.delete(&a.id).await.unwrap());
    assert!(engine.items.find(&b.id).await.unwrap().is_none());
    assert!(engine.relationships.list_for_wall(WALL).await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_all_for_item_without_edges_is_a_successful_noop() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();

    let summary = engine.relationships.remove_all_for_item(&a.id).await.unwrap();
    assert_eq!(summary.edges_removed, 0);
    assert_eq!(summary.items_cascade_deleted, 0);
}

#[tokio::test]
async fn shortest_path_follows_edge_direction() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let follows = engine
        .registry
        .create_relationship_definition(definition_input(
            "follows",
            &person.id,
            &person.id,
            RelationshipType::OneToMany,
        ))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let item = engine
            .items
            .create(NewItem::new(WALL, &person.id, name_data(name)))
            .await
            .unwrap();
        ids.push(item.id);
    }
    for pair in ids.windows(2) {
        engine
            .relationships
            .create_edge(edge_input(&pair[0], &pair[1], &follows.id))
            .await
            .unwrap();
    }

    let forward = engine
        .aggregate
        .shortest_path(WALL, &ids[0], &ids[3])
        .await
        .unwrap();
    assert_eq!(forward.map(|p| p.len()), Some(3));

    let backward = engine
        .aggregate
        .shortest_path(WALL, &ids[3], &ids[0])
        .await
        .unwrap();
    assert!(backward.is_none());

    // Cached result survives until explicit invalidation.
    engine.aggregate.invalidate_paths(WALL).await;
    let again = engine
        .aggregate
        .shortest_path(WALL, &ids[0], &ids[3])
        .await
        .unwrap();
    assert_eq!(again.map(|p| p.len()), Some(3));
}

#[tokio::test]
async fn round_trip_preserves_primitive_field_values() {
    let engine = engine();
    let object_type = engine
        .registry
        .create_object_type(NewObjectType {
            wall_id: WALL.to_string(),
            name: "Record".to_string(),
            fields: vec![
                FieldDefinition::new("s", "Text", FieldType::Text),
                FieldDefinition::new("n", "Number", FieldType::Number),
                FieldDefinition::new("b", "Flag", FieldType::Boolean),
                FieldDefinition::new("d", "Date", FieldType::Date),
            ],
            display_settings: DisplaySettings::default(),
            sort_order: 0,
        })
        .await
        .unwrap();

    let mut data = FieldData::new();
    data.insert("s".to_string(), json!("J. Smith"));
    data.insert("n".to_string(), json!(42.5));
    data.insert("b".to_string(), json!(true));
    data.insert("d".to_string(), json!("1944-06-06T06:30:00Z"));

    let created = engine
        .items
        .create(NewItem::new(WALL, &object_type.id, data.clone()))
        .await
        .unwrap();
    let read_back = engine.items.get(&created.id).await.unwrap();
    assert_eq!(read_back.field_data, data);
}

#[tokio::test]
async fn bulk_create_reports_partial_progress() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();

    let outcome = engine
        .aggregate
        .bulk_create(vec![
            NewItem::new(WALL, &person.id, name_data("A")),
            NewItem::new(WALL, &person.id, FieldData::new()), // fails validation
            NewItem::new(WALL, &person.id, name_data("C")),
        ])
        .await
        .unwrap();

    assert_eq!(outcome.created.len(), 2);
    let failure = outcome.failed.expect("one failure");
    assert_eq!(failure.index, 1);
    assert!(matches!(failure.error, AppError::Validation(_)));
}

#[tokio::test]
async fn enhanced_items_carry_relationship_counts() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();

    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    let c = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("C")))
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &knows.id))
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&a.id, &c.id, &knows.id))
        .await
        .unwrap();

    let enhanced = engine.aggregate.enhanced_items(WALL).await.unwrap();
    let for_a = enhanced.iter().find(|e| e.item.id == a.id).unwrap();
    let for_b = enhanced.iter().find(|e| e.item.id == b.id).unwrap();
    assert_eq!(for_a.relationship_count, 2);
    assert_eq!(for_b.relationship_count, 1);
    assert!(for_a.related_item_ids.contains(&b.id));
    assert!(for_a.related_item_ids.contains(&c.id));
}

#[tokio::test]
async fn search_spans_items_and_type_names() {
    let engine = engine();
    let veteran = engine
        .registry
        .create_object_type(named_type("Veteran"))
        .await
        .unwrap();
    engine
        .items
        .create(NewItem::new(WALL, &veteran.id, name_data("Sgt. Veteran Smith")))
        .await
        .unwrap();
    engine
        .items
        .create(NewItem::new(WALL, &veteran.id, name_data("Cpl. Jones")))
        .await
        .unwrap();

    let results = engine.aggregate.search(WALL, "veteran").await.unwrap();
    assert_eq!(results.items.len(), 1);
    assert_eq!(results.object_types.len(), 1);
    assert_eq!(results.object_types[0].id, veteran.id);
}

#[tokio::test]
async fn reconciliation_repairs_missing_mirrors() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();

    let mut served = definition_input(
        "served_with",
        &person.id,
        &person.id,
        RelationshipType::ManyToMany,
    );
    served.bidirectional = true;
    let served = engine
        .registry
        .create_relationship_definition(served)
        .await
        .unwrap();

    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &served.id))
        .await
        .unwrap();

    // Simulate a crash between the forward and mirror writes by stripping
    // the mirror document directly out of the store.
    let edges = engine.relationships.list_for_wall(WALL).await.unwrap();
    let mirror_id = edges
        .iter()
        .find(|e| e.from_item_id == b.id)
        .unwrap()
        .id
        .clone();
    assert!(engine
        .store
        .delete("object_relationships", &mirror_id)
        .await
        .unwrap());

    // Detection without repair is a conflict...
    let err = engine
        .relationships
        .reconcile_bidirectional(WALL, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // ...repair writes the mirror back and both endpoints see each other.
    let report = engine
        .relationships
        .reconcile_bidirectional(WALL, true)
        .await
        .unwrap();
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(engine.relationships.list_for_item(&b.id).await.unwrap().len(), 2);

    // A symmetric wall reconciles cleanly.
    let clean = engine
        .relationships
        .reconcile_bidirectional(WALL, false)
        .await
        .unwrap();
    assert!(clean.repaired.is_empty());
}

#[tokio::test]
async fn deactivated_types_reject_new_items_but_keep_existing_ones() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let existing = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();

    engine.registry.deactivate_object_type(&person.id).await.unwrap();

    let err = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
    // Existing records stay readable and updatable.
    let mut patch = FieldData::new();
    patch.insert("name".to_string(), json!("A. Updated"));
    let updated = engine
        .items
        .update(&existing.id, patch, None, false)
        .await
        .unwrap();
    assert_eq!(updated.field_data["name"], json!("A. Updated"));
}

#[tokio::test]
async fn partial_update_revalidates_only_touched_fields() {
    let engine = engine();
    let object_type = engine
        .registry
        .create_object_type(NewObjectType {
            wall_id: WALL.to_string(),
            name: "Profile".to_string(),
            fields: vec![
                FieldDefinition::new("name", "Name", FieldType::Text).required(),
                FieldDefinition::new("email", "Email", FieldType::Email),
            ],
            display_settings: DisplaySettings::default(),
            sort_order: 0,
        })
        .await
        .unwrap();
    let item = engine
        .items
        .create(NewItem::new(WALL, &object_type.id, name_data("A")))
        .await
        .unwrap();

    // Bad email on the touched field fails...
    let mut patch = FieldData::new();
    patch.insert("email".to_string(), json!("nope"));
    let err = engine
        .items
        .update(&item.id, patch, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.violated_fields(), vec!["email"]);

    // ...while a good patch to another field does not re-check it.
    let mut patch = FieldData::new();
    patch.insert("name".to_string(), json!("B"));
    engine.items.update(&item.id, patch, None, false).await.unwrap();
}

#[tokio::test]
async fn delete_object_type_is_refused_while_records_reference_it() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let item = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();

    let err = engine.registry.delete_object_type(&person.id).await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));

    engine.items.delete(&item.id).await.unwrap();
    engine.registry.delete_object_type(&person.id).await.unwrap();
    assert!(engine
        .registry
        .find_object_type(&person.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn wall_statistics_rank_most_connected_items() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();

    let hub = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("Hub")))
        .await
        .unwrap();
    for name in ["A", "B", "C"] {
        let other = engine
            .items
            .create(NewItem::new(WALL, &person.id, name_data(name)))
            .await
            .unwrap();
        engine
            .relationships
            .create_edge(edge_input(&hub.id, &other.id, &knows.id))
            .await
            .unwrap();
    }

    let stats = engine.aggregate.wall_statistics(WALL).await.unwrap();
    assert_eq!(stats.total_relationships, 3);
    assert_eq!(stats.per_definition[&knows.id], 3);
    assert_eq!(stats.most_connected[0].item_id, hub.id);
    assert_eq!(stats.most_connected[0].degree, 3);
}

#[tokio::test]
async fn templates_author_usable_types() {
    let engine = engine();
    for draft in wallgraph::templates::all(WALL) {
        engine.registry.create_object_type(draft).await.unwrap();
    }
    let types = engine.registry.list_for_wall(WALL).await.unwrap();
    assert_eq!(
        types.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["Person", "Event", "Place"]
    );

    let person = &types[0];
    let mut data = name_data("J. Smith");
    data.insert("email".to_string(), json!("j.smith@example.org"));
    engine
        .items
        .create(NewItem::new(WALL, &person.id, data))
        .await
        .unwrap();
    // The template's required name field still bites.
    let err = engine
        .items
        .create(NewItem::new(WALL, &person.id, FieldData::new()))
        .await
        .unwrap_err();
    assert_eq!(err.violated_fields(), vec!["name"]);
}

#[tokio::test]
async fn filtered_listing_by_type_images_and_relationships() {
    use wallgraph::models::ItemImage;
    use wallgraph::{ItemFilter, ItemSortKey};

    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let medal = engine
        .registry
        .create_object_type(named_type("Medal"))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();

    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    engine
        .items
        .create(NewItem::new(WALL, &medal.id, name_data("Silver Star")))
        .await
        .unwrap();
    engine
        .items
        .set_images(
            &a.id,
            vec![ItemImage {
                id: "img-1".to_string(),
                url: "https://assets.example.org/a.jpg".to_string(),
                metadata: None,
            }],
        )
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &knows.id))
        .await
        .unwrap();

    let people = engine
        .aggregate
        .list_filtered(
            WALL,
            &ItemFilter {
                object_type_id: Some(person.id.clone()),
                sort: Some((ItemSortKey::CreatedAt, false)),
                ..ItemFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].id, a.id);

    let with_images = engine
        .aggregate
        .list_filtered(
            WALL,
            &ItemFilter {
                has_images: Some(true),
                ..ItemFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(with_images.len(), 1);
    assert_eq!(with_images[0].id, a.id);

    let unconnected = engine
        .aggregate
        .list_filtered(
            WALL,
            &ItemFilter {
                has_relationships: Some(false),
                ..ItemFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unconnected.len(), 1);
    assert_eq!(unconnected[0].field_data["name"], json!("Silver Star"));
}

#[tokio::test]
async fn object_type_edits_keep_stale_record_keys_readable() {
    let engine = engine();
    let mut person = engine
        .registry
        .create_object_type(NewObjectType {
            wall_id: WALL.to_string(),
            name: "Person".to_string(),
            fields: vec![
                FieldDefinition::new("name", "Name", FieldType::Text).required(),
                FieldDefinition::new("rank", "Rank", FieldType::Text),
            ],
            display_settings: DisplaySettings::default(),
            sort_order: 0,
        })
        .await
        .unwrap();

    let mut data = name_data("A");
    data.insert("rank".to_string(), json!("Sergeant"));
    let item = engine
        .items
        .create(NewItem::new(WALL, &person.id, data))
        .await
        .unwrap();

    // Drop the rank field from the schema; the stored key survives and
    // later writes no longer validate it.
    person.fields.retain(|f| f.id != "rank");
    engine.registry.update_object_type(person).await.unwrap();

    let read_back = engine.items.get(&item.id).await.unwrap();
    assert_eq!(read_back.field_data["rank"], json!("Sergeant"));

    let mut patch = FieldData::new();
    patch.insert("rank".to_string(), json!(12345)); // no longer validated
    engine.items.update(&item.id, patch, None, true).await.unwrap();
}

#[tokio::test]
async fn relationship_definition_delete_is_guarded_by_edges() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();
    // The owning type now advertises the definition.
    let person = engine.registry.get_object_type(&person.id).await.unwrap();
    assert!(person.relationship_definition_ids.contains(&knows.id));

    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    let edge = engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &knows.id))
        .await
        .unwrap();

    let err = engine
        .registry
        .delete_relationship_definition(&knows.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));

    engine.relationships.delete_edge(&edge.id).await.unwrap();
    engine
        .registry
        .delete_relationship_definition(&knows.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn edges_require_existing_endpoints_and_known_definitions() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();

    let err = engine
        .relationships
        .create_edge(edge_input(&a.id, "ghost", &knows.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    let err = engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, "no-such-definition"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The self-loop check fires before definition resolution.
    let err = engine
        .relationships
        .create_edge(edge_input(&a.id, &a.id, "no-such-definition"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));
}

#[tokio::test]
async fn wall_graph_lays_out_every_node_inside_the_canvas() {
    let engine = engine();
    let person = engine
        .registry
        .create_object_type(named_type("Person"))
        .await
        .unwrap();
    let knows = engine
        .registry
        .create_relationship_definition(definition_input(
            "knows",
            &person.id,
            &person.id,
            RelationshipType::ManyToMany,
        ))
        .await
        .unwrap();
    let a = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("A")))
        .await
        .unwrap();
    let b = engine
        .items
        .create(NewItem::new(WALL, &person.id, name_data("B")))
        .await
        .unwrap();
    engine
        .relationships
        .create_edge(edge_input(&a.id, &b.id, &knows.id))
        .await
        .unwrap();

    let config = EngineConfig::default();
    let graph = engine.aggregate.wall_graph(WALL, 7).await.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.positions.len(), 2);
    for position in graph.positions.values() {
        assert!(position.x.is_finite() && position.y.is_finite());
        assert!((0.0..=config.layout.canvas_width).contains(&position.x));
        assert!((0.0..=config.layout.canvas_height).contains(&position.y));
    }
}
