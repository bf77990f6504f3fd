use invsync_model::{Entity, EntitySchema, FieldSpec, ModelError};
use invsync_types::{FieldValue, Fields, IdentityKey, RecordId};
use pretty_assertions::assert_eq;

fn schema() -> EntitySchema {
    EntitySchema::new("building")
        .identifier(FieldSpec::text("name"))
        .attribute(FieldSpec::text("status"))
        .attribute(FieldSpec::float("latitude").optional())
        .child("room", "rooms")
}

fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn new_computes_key() {
    let e = Entity::new(
        &schema(),
        fields(&[("name", "Tower A".into()), ("status", "Planned".into())]),
    )
    .unwrap();
    assert_eq!(e.entity_type(), "building");
    assert_eq!(e.key(), &IdentityKey::text(["Tower A"]));
    assert_eq!(e.handle(), None);
}

#[test]
fn new_rejects_missing_identity() {
    let err = Entity::new(&schema(), fields(&[("status", "Planned".into())])).unwrap_err();
    assert!(matches!(err, ModelError::MissingIdentityField { .. }));
}

#[test]
fn new_rejects_mistyped_attribute() {
    let err = Entity::new(
        &schema(),
        fields(&[("name", "A".into()), ("latitude", "north".into())]),
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::FieldTypeMismatch { .. }));
}

#[test]
fn handle_roundtrip() {
    let id = RecordId::new();
    let e = Entity::new(&schema(), fields(&[("name", "A".into())]))
        .unwrap()
        .with_handle(id);
    assert_eq!(e.handle(), Some(id));
}

// ── Accessors ───────────────────────────────────────────────────

#[test]
fn typed_getters() {
    let e = Entity::new(
        &schema(),
        fields(&[
            ("name", "A".into()),
            ("status", "Planned".into()),
            ("latitude", 51.5f64.into()),
        ]),
    )
    .unwrap();
    assert_eq!(e.get_str("status"), Some("Planned"));
    assert_eq!(e.get_f64("latitude"), Some(51.5));
    assert_eq!(e.get_str("missing"), None);
    assert!(e.get("missing").is_null());
}

// ── Partial update ──────────────────────────────────────────────

#[test]
fn apply_changes_only_named_fields() {
    let s = schema();
    let mut e = Entity::new(
        &s,
        fields(&[
            ("name", "A".into()),
            ("status", "Planned".into()),
            ("latitude", 1.0f64.into()),
        ]),
    )
    .unwrap();
    e.apply(&s, &fields(&[("status", "Retired".into())])).unwrap();
    assert_eq!(e.get_str("status"), Some("Retired"));
    assert_eq!(e.get_f64("latitude"), Some(1.0));
}

#[test]
fn apply_rejects_identity_change() {
    let s = schema();
    let mut e = Entity::new(&s, fields(&[("name", "A".into())])).unwrap();
    let err = e.apply(&s, &fields(&[("name", "B".into())])).unwrap_err();
    assert!(matches!(err, ModelError::ImmutableIdentityField { .. }));
    assert_eq!(e.key(), &IdentityKey::text(["A"]));
}

// ── Children ────────────────────────────────────────────────────

#[test]
fn push_child_deduplicates() {
    let mut e = Entity::new(&schema(), fields(&[("name", "A".into())])).unwrap();
    assert!(e.children("rooms").is_empty());
    assert!(e.push_child("rooms", IdentityKey::text(["101"])));
    assert!(e.push_child("rooms", IdentityKey::text(["102"])));
    assert!(!e.push_child("rooms", IdentityKey::text(["101"])));
    assert_eq!(
        e.children("rooms"),
        &[IdentityKey::text(["101"]), IdentityKey::text(["102"])]
    );
}
