use invsync_inventory::{Filter, Record, RecordKind};
use invsync_types::RecordId;
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(data: serde_json::Value) -> Record {
    Record {
        id: RecordId::new(),
        kind: RecordKind::Device,
        data,
    }
}

// ── Kinds ───────────────────────────────────────────────────────

#[test]
fn kind_names_roundtrip() {
    for kind in RecordKind::ALL {
        assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
    }
    assert!("rack".parse::<RecordKind>().is_err());
}

#[test]
fn kind_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(RecordKind::IpAssignment).unwrap(),
        json!("ip_assignment")
    );
}

// ── Accessors ───────────────────────────────────────────────────

#[test]
fn typed_getters() {
    let id = RecordId::new();
    let r = record(json!({
        "name": "sw1",
        "vid": 10,
        "lat": 1.5,
        "mgmt_only": true,
        "location": id.to_string(),
        "serial": null,
        "custom_fields": {"external_id": 7}
    }));
    assert_eq!(r.get_str("name"), Some("sw1"));
    assert_eq!(r.get_i64("vid"), Some(10));
    assert_eq!(r.get_f64("lat"), Some(1.5));
    assert_eq!(r.get_bool("mgmt_only"), Some(true));
    assert_eq!(r.get_ref("location"), Some(id));
    assert_eq!(r.get("serial"), None);
    assert_eq!(r.pointer("/custom_fields/external_id"), Some(&json!(7)));
    assert_eq!(r.get_ref("name"), None);
}

// ── Filters ─────────────────────────────────────────────────────

#[test]
fn filter_matches_all_conditions() {
    let r = record(json!({"name": "sw1", "site": "A"}));
    assert!(Filter::new().matches(&r.data));
    assert!(Filter::new().eq("name", "sw1").eq("site", "A").matches(&r.data));
    assert!(!Filter::new().eq("name", "sw1").eq("site", "B").matches(&r.data));
}

#[test]
fn filter_on_absent_field_matches_null() {
    let r = record(json!({"name": "sw1"}));
    assert!(Filter::new().eq("parent", serde_json::Value::Null).matches(&r.data));
    assert!(!Filter::new().eq("parent", "x").matches(&r.data));
}

#[test]
fn filter_display() {
    assert_eq!(Filter::new().to_string(), "(all)");
    assert_eq!(
        Filter::new().eq("name", "sw1").eq("vid", 10).to_string(),
        "name=\"sw1\", vid=10"
    );
}
