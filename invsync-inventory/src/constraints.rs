//! Per-kind validation shared by every backend.
//!
//! Backends call [`validate`] while holding their own lock, handing in a
//! [`RecordReader`] over the locked state, so validation never re-enters
//! the backend.

use crate::{InventoryError, InventoryResult, Record, RecordKind};
use invsync_types::RecordId;
use ipnetwork::IpNetwork;
use serde_json::{Map, Value};

/// Read access to the records a backend currently holds.
pub(crate) trait RecordReader {
    fn read(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Option<Record>>;

    fn scan(&self, kind: RecordKind) -> InventoryResult<Vec<Record>>;
}

struct KindSpec {
    required: &'static [&'static str],
    refs: &'static [(&'static str, RecordKind)],
    unique: &'static [&'static [&'static str]],
}

fn spec(kind: RecordKind) -> KindSpec {
    use RecordKind as K;
    match kind {
        K::LocationType | K::Status | K::Manufacturer | K::Role => KindSpec {
            required: &["name"],
            refs: &[],
            unique: &[&["name"]],
        },
        K::Location => KindSpec {
            required: &["name", "location_type", "status"],
            refs: &[
                ("location_type", K::LocationType),
                ("status", K::Status),
                ("parent", K::Location),
            ],
            unique: &[&["parent", "name"]],
        },
        K::Namespace => KindSpec {
            required: &["name"],
            refs: &[("location", K::Location)],
            unique: &[&["name"]],
        },
        K::VlanGroup => KindSpec {
            required: &["name"],
            refs: &[("location", K::Location)],
            unique: &[&["name"]],
        },
        K::Vlan => KindSpec {
            required: &["vid", "name", "status"],
            refs: &[
                ("vlan_group", K::VlanGroup),
                ("location", K::Location),
                ("status", K::Status),
            ],
            unique: &[&["vlan_group", "vid"], &["vlan_group", "name"]],
        },
        K::Prefix => KindSpec {
            required: &["prefix", "namespace", "status", "type"],
            refs: &[("namespace", K::Namespace), ("status", K::Status)],
            unique: &[&["namespace", "prefix"]],
        },
        K::DeviceType => KindSpec {
            required: &["model", "manufacturer"],
            refs: &[("manufacturer", K::Manufacturer)],
            unique: &[&["manufacturer", "model"]],
        },
        K::Device => KindSpec {
            required: &["name", "device_type", "role", "status", "location"],
            refs: &[
                ("device_type", K::DeviceType),
                ("role", K::Role),
                ("status", K::Status),
                ("location", K::Location),
                ("primary_ip4", K::IpAddress),
            ],
            unique: &[&["location", "name"]],
        },
        K::Interface => KindSpec {
            required: &["name", "device", "type", "status"],
            refs: &[("device", K::Device), ("status", K::Status)],
            unique: &[&["device", "name"]],
        },
        K::IpAddress => KindSpec {
            required: &["address", "namespace", "status"],
            refs: &[("namespace", K::Namespace), ("status", K::Status)],
            unique: &[&["namespace", "address"]],
        },
        K::IpAssignment => KindSpec {
            required: &["ip_address", "interface"],
            refs: &[("ip_address", K::IpAddress), ("interface", K::Interface)],
            unique: &[&["ip_address", "interface"]],
        },
        K::Cable => KindSpec {
            required: &["termination_a", "termination_b", "status"],
            refs: &[
                ("termination_a", K::Interface),
                ("termination_b", K::Interface),
                ("status", K::Status),
            ],
            unique: &[],
        },
    }
}

/// Reference fields of a kind and the kinds they point at.
pub(crate) fn references(kind: RecordKind) -> &'static [(&'static str, RecordKind)] {
    spec(kind).refs
}

/// Merges `changes` into `base`. Nested objects merge recursively; any
/// other value, including `null`, replaces the old one.
pub(crate) fn merge(base: &mut Map<String, Value>, changes: &Map<String, Value>) {
    for (key, value) in changes {
        match (base.get_mut(key), value) {
            (Some(Value::Object(old)), Value::Object(new)) => merge(old, new),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Validates record data for `kind`. `own_id` is the record being
/// updated, which is excluded from uniqueness checks.
pub(crate) fn validate(
    kind: RecordKind,
    data: &Value,
    own_id: Option<RecordId>,
    reader: &dyn RecordReader,
) -> InventoryResult<()> {
    let Some(object) = data.as_object() else {
        return Err(InventoryError::NotAnObject(kind));
    };
    let spec = spec(kind);

    for field in spec.required {
        if object.get(*field).is_none_or(Value::is_null) {
            return Err(InventoryError::MissingField {
                kind,
                field: field.to_string(),
            });
        }
    }

    for (field, target) in spec.refs {
        let Some(value) = object.get(*field).filter(|v| !v.is_null()) else {
            continue;
        };
        let invalid = || InventoryError::InvalidReference {
            kind,
            field: field.to_string(),
            target: *target,
            value: value.to_string(),
        };
        let id: RecordId = value.as_str().and_then(|s| s.parse().ok()).ok_or_else(&invalid)?;
        if reader.read(*target, id)?.is_none() {
            return Err(invalid());
        }
    }

    check_values(kind, object)?;

    if !spec.unique.is_empty() || kind == RecordKind::Cable {
        let others: Vec<Record> = reader
            .scan(kind)?
            .into_iter()
            .filter(|r| Some(r.id) != own_id)
            .collect();

        for fields in spec.unique {
            let clash = others.iter().any(|other| {
                fields.iter().all(|f| {
                    other.data.get(*f).unwrap_or(&Value::Null)
                        == object.get(*f).unwrap_or(&Value::Null)
                })
            });
            if clash {
                return Err(InventoryError::UniqueViolation {
                    kind,
                    fields: fields.join(", "),
                });
            }
        }

        if kind == RecordKind::Cable {
            check_cable(object, &others)?;
        }
    }
    Ok(())
}

fn check_values(kind: RecordKind, object: &Map<String, Value>) -> InventoryResult<()> {
    let invalid = |field: &str, reason: String| InventoryError::InvalidValue {
        kind,
        field: field.to_string(),
        reason,
    };

    match kind {
        RecordKind::Vlan => {
            let vid = object.get("vid").and_then(Value::as_i64);
            match vid {
                Some(1..=4094) => {}
                _ => return Err(invalid("vid", "must be an integer between 1 and 4094".into())),
            }
        }
        RecordKind::Prefix => {
            let text = object.get("prefix").and_then(Value::as_str).unwrap_or_default();
            let network = parse_cidr(text).map_err(|reason| invalid("prefix", reason))?;
            if network.network() != network.ip() {
                return Err(invalid("prefix", format!("{text} has host bits set")));
            }
            let prefix_type = object.get("type").and_then(Value::as_str).unwrap_or_default();
            if !matches!(prefix_type, "network" | "pool" | "container") {
                return Err(invalid("type", format!("unknown prefix type {prefix_type:?}")));
            }
        }
        RecordKind::IpAddress => {
            let text = object.get("address").and_then(Value::as_str).unwrap_or_default();
            parse_cidr(text).map_err(|reason| invalid("address", reason))?;
        }
        RecordKind::Cable => {
            if object.get("termination_a") == object.get("termination_b") {
                return Err(invalid(
                    "termination_b",
                    "a cable cannot connect an interface to itself".into(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parses `address/mask`. A bare address without a mask is rejected.
fn parse_cidr(text: &str) -> Result<IpNetwork, String> {
    if !text.contains('/') {
        return Err(format!("{text:?} has no mask length"));
    }
    text.parse::<IpNetwork>().map_err(|e| format!("{text:?}: {e}"))
}

fn check_cable(object: &Map<String, Value>, others: &[Record]) -> InventoryResult<()> {
    for field in ["termination_a", "termination_b"] {
        let Some(endpoint) = object.get(field) else {
            continue;
        };
        let taken = others.iter().any(|cable| {
            cable.data.get("termination_a") == Some(endpoint)
                || cable.data.get("termination_b") == Some(endpoint)
        });
        if taken {
            return Err(InventoryError::InvalidValue {
                kind: RecordKind::Cable,
                field: field.to_string(),
                reason: format!("interface {endpoint} already has a cable"),
            });
        }
    }
    Ok(())
}
