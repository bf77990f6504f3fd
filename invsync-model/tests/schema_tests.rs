use invsync_model::{EntitySchema, FieldSpec, FieldType, ModelError};
use invsync_types::{FieldValue, Fields, IdentityKey, KeyPart};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn device_schema() -> EntitySchema {
    EntitySchema::new("device")
        .identifier(FieldSpec::text("name"))
        .identifier(FieldSpec::text("site"))
        .attribute(FieldSpec::text("role"))
        .attribute(FieldSpec::integer("rack_units").optional())
        .attribute(FieldSpec::float("weight").optional())
        .attribute(FieldSpec::json("profile").optional())
        .child("interface", "interfaces")
}

fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn valid_schema_passes() {
    assert!(device_schema().validate().is_ok());
}

#[test]
fn schema_without_identity_is_invalid() {
    let schema = EntitySchema::new("thing").attribute(FieldSpec::text("a"));
    assert!(matches!(
        schema.validate(),
        Err(ModelError::InvalidSchema { .. })
    ));
}

#[test]
fn float_identity_field_is_invalid() {
    let schema = EntitySchema::new("thing").identifier(FieldSpec::float("x"));
    assert!(matches!(
        schema.validate(),
        Err(ModelError::InvalidSchema { .. })
    ));
}

#[test]
fn field_declared_twice_is_invalid() {
    let schema = EntitySchema::new("thing")
        .identifier(FieldSpec::text("name"))
        .attribute(FieldSpec::text("name"));
    assert!(schema.validate().is_err());
}

#[test]
fn child_field_lookup() {
    let schema = device_schema();
    assert_eq!(schema.child_field("interface"), Some("interfaces"));
    assert_eq!(schema.child_field("cable"), None);
}

// ── Identity ────────────────────────────────────────────────────

#[test]
fn identity_key_follows_declared_order() {
    let schema = device_schema();
    let f = fields(&[
        ("site", "Tower A".into()),
        ("name", "core-sw1".into()),
        ("role", "switch".into()),
    ]);
    let key = schema.identity_key(&f).unwrap();
    assert_eq!(key, IdentityKey::text(["core-sw1", "Tower A"]));
    assert_eq!(key.to_string(), "core-sw1__Tower A");
}

#[test]
fn missing_identity_field_is_an_error() {
    let schema = device_schema();
    let f = fields(&[("name", "core-sw1".into())]);
    match schema.identity_key(&f) {
        Err(ModelError::MissingIdentityField { entity_type, field }) => {
            assert_eq!(entity_type, "device");
            assert_eq!(field, "site");
        }
        other => panic!("expected missing identity field, got {other:?}"),
    }
}

#[test]
fn null_identity_field_is_an_error() {
    let schema = device_schema();
    let f = fields(&[("name", "x".into()), ("site", FieldValue::Null)]);
    assert!(schema.identity_key(&f).is_err());
}

#[test]
fn optional_identity_field_keys_as_null() {
    let schema = EntitySchema::new("room")
        .identifier(FieldSpec::text("name"))
        .identifier(FieldSpec::text("parent").optional());
    let key = schema.identity_key(&fields(&[("name", "101".into())])).unwrap();
    assert_eq!(
        key.parts(),
        &[KeyPart::Text("101".into()), KeyPart::Null]
    );
}

#[test]
fn wrong_identity_kind_is_an_error() {
    let schema = device_schema();
    let f = fields(&[("name", 7i64.into()), ("site", "A".into())]);
    assert!(matches!(
        schema.identity_key(&f),
        Err(ModelError::FieldTypeMismatch { .. })
    ));
}

#[test]
fn whole_float_in_integer_identity_keys_as_int() {
    let schema = EntitySchema::new("vlan").identifier(FieldSpec::integer("vid"));
    let a = schema.identity_key(&fields(&[("vid", 10i64.into())])).unwrap();
    let b = schema.identity_key(&fields(&[("vid", 10.0f64.into())])).unwrap();
    assert_eq!(a, b);
}

proptest! {
    #[test]
    fn identity_is_stable_and_ignores_attributes(
        name in "[a-z0-9-]{1,16}",
        site in "[A-Za-z ]{1,16}",
        role_a in "[a-z]{0,8}",
        role_b in "[a-z]{0,8}",
        weight in proptest::num::f64::NORMAL,
    ) {
        let schema = device_schema();
        let a = fields(&[
            ("name", name.clone().into()),
            ("site", site.clone().into()),
            ("role", role_a.into()),
        ]);
        let b = fields(&[
            ("name", name.into()),
            ("site", site.into()),
            ("role", role_b.into()),
            ("weight", weight.into()),
        ]);
        let first = schema.identity_key(&a).unwrap();
        prop_assert_eq!(&first, &schema.identity_key(&a).unwrap());
        prop_assert_eq!(&first, &schema.identity_key(&b).unwrap());
    }
}

// ── Attribute comparison ────────────────────────────────────────

#[test]
fn identical_fields_have_no_diff() {
    let schema = device_schema();
    let f = fields(&[
        ("name", "a".into()),
        ("site", "s".into()),
        ("role", "switch".into()),
        ("profile", json!({"snmp": true}).into()),
    ]);
    assert!(schema.diff_attributes(&f, &f.clone()).is_empty());
}

#[test]
fn diff_contains_only_differing_attributes() {
    let schema = device_schema();
    let source = fields(&[
        ("name", "a".into()),
        ("site", "s".into()),
        ("role", "router".into()),
        ("rack_units", 2i64.into()),
    ]);
    let target = fields(&[
        ("name", "a".into()),
        ("site", "s".into()),
        ("role", "switch".into()),
        ("rack_units", 2i64.into()),
    ]);
    let diff = schema.diff_attributes(&source, &target);
    assert_eq!(diff, fields(&[("role", "router".into())]));
}

#[test]
fn diff_carries_source_value() {
    let schema = device_schema();
    let source = fields(&[("role", "router".into())]);
    let target = fields(&[("role", "switch".into())]);
    assert_eq!(
        schema.diff_attributes(&source, &target).get("role"),
        Some(&FieldValue::from("router"))
    );
}

#[test]
fn integer_and_float_compare_numerically() {
    let schema = device_schema();
    let source = fields(&[("weight", 2i64.into())]);
    let target = fields(&[("weight", 2.0f64.into())]);
    assert!(schema.diff_attributes(&source, &target).is_empty());
}

#[test]
fn structured_fields_compare_structurally() {
    let schema = device_schema();
    let source = fields(&[("profile", json!({"a": 1, "b": [1, 2]}).into())]);
    let same = fields(&[("profile", json!({"b": [1, 2], "a": 1}).into())]);
    let other = fields(&[("profile", json!({"a": 1, "b": [2, 1]}).into())]);
    assert!(schema.diff_attributes(&source, &same).is_empty());
    assert_eq!(schema.diff_attributes(&source, &other).len(), 1);
}

#[test]
fn absent_attribute_equals_null_only() {
    let schema = device_schema();
    let source = fields(&[("rack_units", FieldValue::Null)]);
    assert!(schema.diff_attributes(&source, &Fields::new()).is_empty());

    let source = fields(&[("rack_units", 0i64.into())]);
    assert_eq!(schema.diff_attributes(&source, &Fields::new()).len(), 1);
}

#[test]
fn identity_and_undeclared_fields_never_diff() {
    let schema = device_schema();
    let source = fields(&[("name", "a".into()), ("vendor_id", 1i64.into())]);
    let target = fields(&[("name", "b".into()), ("vendor_id", 2i64.into())]);
    assert!(schema.diff_attributes(&source, &target).is_empty());
}

// ── Field types ─────────────────────────────────────────────────

#[test]
fn field_type_accepts() {
    assert!(FieldType::Text.accepts(&"x".into()));
    assert!(!FieldType::Text.accepts(&1i64.into()));
    assert!(FieldType::Integer.accepts(&3.0f64.into()));
    assert!(!FieldType::Integer.accepts(&3.5f64.into()));
    assert!(FieldType::Float.accepts(&3i64.into()));
    assert!(FieldType::Json.accepts(&"anything".into()));
    assert!(FieldType::Bool.accepts(&FieldValue::Null));
}

#[test]
fn check_fields_rejects_mismatch() {
    let schema = device_schema();
    let f = fields(&[("role", true.into())]);
    assert!(schema.check_fields(&f).is_err());
}

#[test]
fn projections() {
    let schema = device_schema();
    let f = fields(&[
        ("name", "a".into()),
        ("site", "s".into()),
        ("role", "r".into()),
    ]);
    assert_eq!(
        schema.identity_fields(&f),
        fields(&[("name", "a".into()), ("site", "s".into())])
    );
    let attrs = schema.attribute_fields(&f);
    assert_eq!(attrs.len(), 4);
    assert_eq!(attrs.get("rack_units"), Some(&FieldValue::Null));
}
