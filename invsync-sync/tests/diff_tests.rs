use invsync_model::dcim::{self, Building, Model, Room, field, locations_family};
use invsync_model::{Entity, ModelFamily};
use invsync_store::GraphStore;
use invsync_sync::diff::diff;
use invsync_sync::{Change, Operation};
use invsync_types::{FieldValue, Fields, IdentityKey};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn family() -> Arc<ModelFamily> {
    Arc::new(locations_family().unwrap())
}

fn building(name: &str, status: &str, longitude: Option<f64>) -> Entity {
    Building {
        name: name.to_string(),
        status: status.to_string(),
        external_id: Some(1),
        longitude,
        latitude: None,
        technical_reference: None,
    }
    .into_entity()
    .unwrap()
}

fn room(name: &str, building: &str, external_id: i64) -> Entity {
    Room {
        name: name.to_string(),
        building: building.to_string(),
        external_id,
        status: "Planned".to_string(),
    }
    .into_entity()
    .unwrap()
}

fn graph(entities: Vec<Entity>) -> GraphStore {
    let mut graph = GraphStore::new(family());
    for entity in entities {
        graph.add(entity).unwrap();
    }
    graph
}

fn summary(changes: &[Change]) -> Vec<(Operation, String, String)> {
    changes
        .iter()
        .map(|c| (c.operation, c.entity_type.clone(), c.key.to_string()))
        .collect()
}

// ── No-op ───────────────────────────────────────────────────────

#[test]
fn identical_graphs_produce_no_changes() {
    let source = graph(vec![
        building("Tower A", "Planned", Some(4.35)),
        room("A-101", "Tower A", 10),
    ]);
    let target = source.clone();

    let result = diff(&family(), &source, &target).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.unchanged.get(dcim::BUILDING), Some(&1));
    assert_eq!(result.unchanged.get(dcim::ROOM), Some(&1));
}

#[test]
fn integer_and_float_values_compare_numerically() {
    let mut fields = Building::schema().attribute_fields(building("T", "Planned", None).fields());
    fields.insert(field::NAME.to_string(), "T".into());
    fields.insert(field::LONGITUDE.to_string(), FieldValue::Int(4));
    let as_int = Entity::new(Building::schema(), fields).unwrap();

    let source = graph(vec![building("T", "Planned", Some(4.0))]);
    let target = graph(vec![as_int]);
    assert!(diff(&family(), &source, &target).unwrap().is_empty());
}

// ── Creates ─────────────────────────────────────────────────────

#[test]
fn source_only_keys_become_creates() {
    let source = graph(vec![
        building("Tower A", "Planned", None),
        building("Tower B", "Planned", None),
    ]);
    let target = graph(vec![building("Tower A", "Planned", None)]);

    let result = diff(&family(), &source, &target).unwrap();
    assert_eq!(
        summary(&result.changes),
        vec![(Operation::Create, "building".to_string(), "Tower B".to_string())]
    );

    let create = &result.changes[0];
    assert_eq!(create.identifiers.get(field::NAME), Some(&"Tower B".into()));
    assert!(!create.attributes.contains_key(field::NAME));
    assert_eq!(create.attributes.get(field::STATUS), Some(&"Planned".into()));
}

#[test]
fn target_only_keys_are_counted_not_deleted() {
    let source = graph(vec![]);
    let target = graph(vec![
        building("Tower A", "Planned", None),
        room("A-101", "Tower A", 10),
    ]);

    let result = diff(&family(), &source, &target).unwrap();
    assert!(result.changes.is_empty());
    assert_eq!(result.target_only.get(dcim::BUILDING), Some(&1));
    assert_eq!(result.target_only.get(dcim::ROOM), Some(&1));
    assert!(result.changes.iter().all(|c| c.operation != Operation::Delete));
}

#[test]
fn parents_precede_children_then_source_order() {
    let mut source = graph(vec![
        room("R2", "Tower A", 2),
        room("R1", "Tower A", 1),
        building("Tower A", "Planned", None),
    ]);
    let tower = IdentityKey::text(["Tower A"]);
    source
        .add_child(dcim::BUILDING, &tower, dcim::ROOM, room("R1", "Tower A", 1).key())
        .unwrap();
    let target = graph(vec![]);

    let result = diff(&family(), &source, &target).unwrap();
    assert_eq!(
        summary(&result.changes),
        vec![
            (Operation::Create, "building".to_string(), "Tower A".to_string()),
            (Operation::Create, "room".to_string(), "R2__Tower A__2".to_string()),
            (Operation::Create, "room".to_string(), "R1__Tower A__1".to_string()),
        ]
    );
    assert_eq!(result.changes[1].parent, None);
    assert_eq!(
        result.changes[2].parent,
        Some((dcim::BUILDING.to_string(), tower))
    );
    assert!(result.changes[0].rank < result.changes[1].rank);
}

// ── Updates ─────────────────────────────────────────────────────

#[test]
fn update_carries_only_differing_attributes() {
    let source = graph(vec![building("Tower A", "Retired", Some(4.35))]);
    let target = graph(vec![building("Tower A", "Active", Some(4.35))]);

    let result = diff(&family(), &source, &target).unwrap();
    assert_eq!(result.changes.len(), 1);
    let update = &result.changes[0];
    assert_eq!(update.operation, Operation::Update);

    let mut expected = Fields::new();
    expected.insert(field::STATUS.to_string(), "Retired".into());
    assert_eq!(update.attributes, expected);
}

#[test]
fn source_null_against_target_value_is_an_update_to_null() {
    let source = graph(vec![building("Tower A", "Planned", None)]);
    let target = graph(vec![building("Tower A", "Planned", Some(4.35))]);

    let result = diff(&family(), &source, &target).unwrap();
    assert_eq!(
        result.changes[0].attributes.get(field::LONGITUDE),
        Some(&FieldValue::Null)
    );
    assert_eq!(result.count(dcim::BUILDING, Operation::Update), 1);
}

#[test]
fn diff_is_deterministic() {
    let source = graph(vec![
        building("B", "Planned", None),
        building("A", "Planned", None),
        building("C", "Planned", Some(1.0)),
    ]);
    let target = graph(vec![building("C", "Planned", Some(2.0))]);

    let first = diff(&family(), &source, &target).unwrap();
    let second = diff(&family(), &source, &target).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        summary(&first.changes),
        vec![
            (Operation::Create, "building".to_string(), "B".to_string()),
            (Operation::Create, "building".to_string(), "A".to_string()),
            (Operation::Update, "building".to_string(), "C".to_string()),
        ]
    );
}

// ── Properties ──────────────────────────────────────────────────

mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn buildings() -> impl Strategy<Value = BTreeMap<String, (bool, Option<f64>)>> {
        prop::collection::btree_map(
            "[A-Z][a-z]{2,8}",
            (any::<bool>(), prop::option::of(-180.0f64..180.0)),
            0..12,
        )
    }

    fn build(set: &BTreeMap<String, (bool, Option<f64>)>) -> GraphStore {
        graph(
            set.iter()
                .map(|(name, (retired, lon))| {
                    building(name, if *retired { "Retired" } else { "Planned" }, *lon)
                })
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn a_graph_never_differs_from_itself(set in buildings()) {
            let family = family();
            let changes = diff(&family, &build(&set), &build(&set)).unwrap();
            prop_assert!(changes.is_empty());
            prop_assert_eq!(changes.unchanged.get(dcim::BUILDING).copied().unwrap_or(0), set.len());
        }

        #[test]
        fn against_an_empty_target_everything_is_created(set in buildings()) {
            let family = family();
            let changes = diff(&family, &build(&set), &graph(Vec::new())).unwrap();
            prop_assert_eq!(changes.count(dcim::BUILDING, Operation::Create), set.len());
            prop_assert!(changes.changes.iter().all(|c| c.operation == Operation::Create));
        }
    }
}
