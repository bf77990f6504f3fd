use invsync_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The kinds of record the inventory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Location,
    LocationType,
    Status,
    Namespace,
    VlanGroup,
    Vlan,
    Prefix,
    Manufacturer,
    DeviceType,
    Role,
    Device,
    Interface,
    IpAddress,
    /// Assignment of an IP address to an interface.
    IpAssignment,
    Cable,
}

impl RecordKind {
    pub const ALL: [RecordKind; 15] = [
        Self::Location,
        Self::LocationType,
        Self::Status,
        Self::Namespace,
        Self::VlanGroup,
        Self::Vlan,
        Self::Prefix,
        Self::Manufacturer,
        Self::DeviceType,
        Self::Role,
        Self::Device,
        Self::Interface,
        Self::IpAddress,
        Self::IpAssignment,
        Self::Cable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::LocationType => "location_type",
            Self::Status => "status",
            Self::Namespace => "namespace",
            Self::VlanGroup => "vlan_group",
            Self::Vlan => "vlan",
            Self::Prefix => "prefix",
            Self::Manufacturer => "manufacturer",
            Self::DeviceType => "device_type",
            Self::Role => "role",
            Self::Device => "device",
            Self::Interface => "interface",
            Self::IpAddress => "ip_address",
            Self::IpAssignment => "ip_assignment",
            Self::Cable => "cable",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown record kind: {s}"))
    }
}

/// A stored inventory record.
///
/// The `data` field holds a JSON object whose shape is fixed per kind.
/// References to other records are stored as their id strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    pub data: Value,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }

    /// Extract a string value from `data`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Extract a reference to another record.
    pub fn get_ref(&self, field: &str) -> Option<RecordId> {
        self.get_str(field).and_then(|s| s.parse().ok())
    }

    /// Extract a value using a JSON pointer (e.g. `/custom_fields/external_id`).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.pointer(pointer).filter(|v| !v.is_null())
    }
}

/// Field-equality filter over record data. An empty filter matches all
/// records; a condition on an absent field matches `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Adds an equality condition on a reference field.
    pub fn eq_ref(self, field: impl Into<String>, id: RecordId) -> Self {
        self.eq(field, id.to_string())
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| data.get(field).unwrap_or(&Value::Null) == value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("(all)");
        }
        for (i, (field, value)) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        Ok(())
    }
}
