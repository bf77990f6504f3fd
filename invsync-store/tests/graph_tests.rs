use invsync_model::dcim::{self, field, Building, Model, Room};
use invsync_model::{Entity, ModelFamily};
use invsync_store::{GraphStore, StoreError};
use invsync_types::{Fields, IdentityKey, RecordId};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn store() -> GraphStore {
    GraphStore::new(Arc::new(dcim::locations_family().unwrap()))
}

fn building(name: &str, status: &str) -> Entity {
    Building {
        name: name.into(),
        status: status.into(),
        external_id: None,
        longitude: None,
        latitude: None,
        technical_reference: None,
    }
    .into_entity()
    .unwrap()
}

fn room(name: &str, building: &str, id: i64) -> Entity {
    Room {
        name: name.into(),
        building: building.into(),
        external_id: id,
        status: "Planned".into(),
    }
    .into_entity()
    .unwrap()
}

fn names(store: &GraphStore, entity_type: &str) -> Vec<String> {
    store
        .get_all(entity_type)
        .map(|e| e.key().to_string())
        .collect()
}

// ── add / get ───────────────────────────────────────────────────

#[test]
fn add_then_get() {
    let mut s = store();
    s.add(building("Tower A", "Planned")).unwrap();
    let got = s.get(dcim::BUILDING, &IdentityKey::text(["Tower A"])).unwrap();
    assert_eq!(got.get_str(field::STATUS), Some("Planned"));
    assert_eq!(s.count(dcim::BUILDING), 1);
    assert_eq!(s.len(), 1);
}

#[test]
fn duplicate_is_rejected_and_first_wins() {
    let mut s = store();
    s.add(building("Tower A", "Planned")).unwrap();
    let err = s.add(building("Tower A", "Retired")).unwrap_err();
    match err {
        StoreError::DuplicateIdentity { entity_type, key } => {
            assert_eq!(entity_type, "building");
            assert_eq!(key, IdentityKey::text(["Tower A"]));
        }
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(s.count(dcim::BUILDING), 1);
    let kept = s.get(dcim::BUILDING, &IdentityKey::text(["Tower A"])).unwrap();
    assert_eq!(kept.get_str(field::STATUS), Some("Planned"));
}

#[test]
fn get_missing_is_not_found() {
    let s = store();
    assert!(matches!(
        s.get(dcim::BUILDING, &IdentityKey::text(["nope"])),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn unknown_type_is_rejected() {
    let mut s = store();
    let device_family = Arc::new(dcim::network_family().unwrap());
    let ns = dcim::Namespace {
        name: "A".into(),
        description: None,
    }
    .into_entity()
    .unwrap();
    assert!(matches!(s.add(ns), Err(StoreError::UnknownType(_))));
    assert_eq!(GraphStore::new(device_family).count(dcim::BUILDING), 0);
}

// ── get_all ─────────────────────────────────────────────────────

#[test]
fn get_all_is_insertion_ordered() {
    let mut s = store();
    for name in ["C", "A", "B"] {
        s.add(building(name, "Planned")).unwrap();
    }
    assert_eq!(names(&s, dcim::BUILDING), vec!["C", "A", "B"]);
}

#[test]
fn get_all_is_restartable() {
    let mut s = store();
    s.add(building("A", "Planned")).unwrap();
    s.add(building("B", "Planned")).unwrap();

    let mut it = s.get_all(dcim::BUILDING);
    assert_eq!(it.next().map(|e| e.key().to_string()), Some("A".into()));
    let rest = it.clone();
    assert_eq!(it.count(), 1);
    assert_eq!(rest.count(), 1);
    assert_eq!(s.get_all(dcim::BUILDING).count(), 2);
}

#[test]
fn get_all_of_unregistered_type_is_empty() {
    let s = store();
    assert_eq!(s.get_all("device").count(), 0);
}

// ── children ────────────────────────────────────────────────────

#[test]
fn add_child_records_key_on_parent() {
    let mut s = store();
    s.add(building("Tower A", "Planned")).unwrap();
    let r = room("101", "Tower A", 7);
    let room_key = r.key().clone();
    s.add(r).unwrap();

    let parent = IdentityKey::text(["Tower A"]);
    s.add_child(dcim::BUILDING, &parent, dcim::ROOM, &room_key).unwrap();
    let b = s.get(dcim::BUILDING, &parent).unwrap();
    assert_eq!(b.children("rooms"), &[room_key]);
}

#[test]
fn add_child_requires_both_entities() {
    let mut s = store();
    let r = room("101", "Tower A", 7);
    let room_key = r.key().clone();
    s.add(r).unwrap();
    let parent = IdentityKey::text(["Tower A"]);
    assert!(matches!(
        s.add_child(dcim::BUILDING, &parent, dcim::ROOM, &room_key),
        Err(StoreError::NotFound { .. })
    ));

    s.add(building("Tower A", "Planned")).unwrap();
    let ghost = IdentityKey::text(["ghost"]);
    assert!(matches!(
        s.add_child(dcim::BUILDING, &parent, dcim::ROOM, &ghost),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn add_child_requires_declared_relationship() {
    let mut s = store();
    s.add(building("A", "Planned")).unwrap();
    s.add(building("B", "Planned")).unwrap();
    let a = IdentityKey::text(["A"]);
    let b = IdentityKey::text(["B"]);
    assert!(matches!(
        s.add_child(dcim::BUILDING, &a, dcim::BUILDING, &b),
        Err(StoreError::UndeclaredChild { .. })
    ));
}

#[test]
fn children_do_not_affect_identity() {
    let mut s = store();
    s.add(building("A", "Planned")).unwrap();
    let r = room("1", "A", 1);
    let rk = r.key().clone();
    s.add(r).unwrap();
    let a = IdentityKey::text(["A"]);
    s.add_child(dcim::BUILDING, &a, dcim::ROOM, &rk).unwrap();
    assert_eq!(s.get(dcim::BUILDING, &a).unwrap().key(), &a);
    assert_eq!(s.count(dcim::ROOM), 1);
}

// ── update / remove ─────────────────────────────────────────────

#[test]
fn update_is_partial() {
    let mut s = store();
    let mut b = building("A", "Planned");
    b.apply(
        Building::schema(),
        &Fields::from([(field::LATITUDE.to_string(), 10.5f64.into())]),
    )
    .unwrap();
    s.add(b).unwrap();

    let key = IdentityKey::text(["A"]);
    s.update(
        dcim::BUILDING,
        &key,
        &Fields::from([(field::STATUS.to_string(), "Retired".into())]),
    )
    .unwrap();
    let got = s.get(dcim::BUILDING, &key).unwrap();
    assert_eq!(got.get_str(field::STATUS), Some("Retired"));
    assert_eq!(got.get_f64(field::LATITUDE), Some(10.5));
}

#[test]
fn set_handle_marks_entity() {
    let mut s = store();
    s.add(building("A", "Planned")).unwrap();
    let key = IdentityKey::text(["A"]);
    let id = RecordId::new();
    s.set_handle(dcim::BUILDING, &key, id).unwrap();
    assert_eq!(s.get(dcim::BUILDING, &key).unwrap().handle(), Some(id));
}

#[test]
fn remove_keeps_remaining_order() {
    let mut s = store();
    for name in ["A", "B", "C"] {
        s.add(building(name, "Planned")).unwrap();
    }
    let removed = s.remove(dcim::BUILDING, &IdentityKey::text(["B"])).unwrap();
    assert_eq!(removed.key().to_string(), "B");
    assert_eq!(names(&s, dcim::BUILDING), vec!["A", "C"]);
    assert!(s.remove(dcim::BUILDING, &IdentityKey::text(["B"])).is_err());
}

// ── dump ────────────────────────────────────────────────────────

#[test]
fn dump_nests_children() {
    let mut s = store();
    s.add(building("A", "Planned")).unwrap();
    let r = room("1", "A", 1);
    let rk = r.key().clone();
    s.add(r).unwrap();
    s.add_child(dcim::BUILDING, &IdentityKey::text(["A"]), dcim::ROOM, &rk)
        .unwrap();

    let tree = s.dump();
    assert_eq!(tree["building"][0]["key"], "A");
    assert_eq!(tree["building"][0]["rooms"][0]["key"], "1__A__1");
    assert!(tree.get("room").is_none());
}

#[test]
fn empty_family_store_is_empty() {
    let family = ModelFamily::builder("empty").build().unwrap();
    let s = GraphStore::new(Arc::new(family));
    assert!(s.is_empty());
}
