//! Entity schemas.
//!
//! A schema is a declarative type descriptor: which fields form the
//! identity key, which fields are compared for drift, and which child
//! types the entity owns. Fields that appear in neither list are carried
//! along but never compared.

use crate::{ModelError, ModelResult};
use invsync_types::{FieldValue, Fields, IdentityKey, KeyPart};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared type of a field, which selects its equality rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Bool,
    /// Structured value compared by structural equality.
    Json,
}

impl FieldType {
    /// Returns true if a non-null value of this kind may be stored in the field.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (Self::Json, _) => true,
            (Self::Text, FieldValue::Text(_)) => true,
            (Self::Integer, v) => v.as_i64().is_some(),
            (Self::Float, FieldValue::Int(_) | FieldValue::Float(_)) => true,
            (Self::Bool, FieldValue::Bool(_)) => true,
            _ => false,
        }
    }

    /// Field equality under this type's rule.
    pub fn values_equal(self, a: &FieldValue, b: &FieldValue) -> bool {
        match self {
            Self::Json => a.to_json() == b.to_json(),
            _ => a == b,
        }
    }

    /// Identity fields must be hashable.
    pub fn is_hashable(self) -> bool {
        matches!(self, Self::Text | Self::Integer | Self::Bool)
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub optional: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Json)
    }

    /// Marks the field as optional. Optional identity fields contribute
    /// a null key part when absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A declared child relationship: entities of `entity_type` are owned
/// by this entity and listed under `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
    pub entity_type: String,
    pub field: String,
}

/// Schema for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    /// Identity fields in key order.
    pub identifiers: Vec<FieldSpec>,
    /// Fields compared for drift.
    pub attributes: Vec<FieldSpec>,
    /// Owned child types in declaration order.
    #[serde(default)]
    pub children: Vec<ChildSpec>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            identifiers: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn identifier(mut self, field: FieldSpec) -> Self {
        self.identifiers.push(field);
        self
    }

    pub fn attribute(mut self, field: FieldSpec) -> Self {
        self.attributes.push(field);
        self
    }

    pub fn child(mut self, entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        self.children.push(ChildSpec {
            entity_type: entity_type.into(),
            field: field.into(),
        });
        self
    }

    /// Checks the schema is well formed.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |reason: String| ModelError::InvalidSchema {
            entity_type: self.entity_type.clone(),
            reason,
        };

        if self.entity_type.is_empty() {
            return Err(invalid("empty type name".into()));
        }
        if self.identifiers.is_empty() {
            return Err(invalid("no identity fields".into()));
        }

        let mut seen = BTreeSet::new();
        for field in self.identifiers.iter().chain(&self.attributes) {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("field `{}` declared twice", field.name)));
            }
        }
        if let Some(field) = self.identifiers.iter().find(|f| !f.field_type.is_hashable()) {
            return Err(invalid(format!(
                "identity field `{}` has unhashable type {:?}",
                field.name, field.field_type
            )));
        }

        let mut child_fields = BTreeSet::new();
        for child in &self.children {
            if !child_fields.insert(child.field.as_str()) {
                return Err(invalid(format!("child field `{}` declared twice", child.field)));
            }
        }
        Ok(())
    }

    /// Looks up a declared field (identity or attribute).
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.identifiers
            .iter()
            .chain(&self.attributes)
            .find(|f| f.name == name)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifiers.iter().any(|f| f.name == name)
    }

    /// Field under which children of `child_type` are listed.
    pub fn child_field(&self, child_type: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.entity_type == child_type)
            .map(|c| c.field.as_str())
    }

    /// Computes the identity key from a field mapping, in declared order.
    ///
    /// Fails if a required identity field is absent or null, or holds a
    /// value of the wrong kind.
    pub fn identity_key(&self, fields: &Fields) -> ModelResult<IdentityKey> {
        let mut parts = Vec::with_capacity(self.identifiers.len());
        for spec in &self.identifiers {
            let value = fields.get(&spec.name).unwrap_or(&FieldValue::Null);
            if value.is_null() {
                if !spec.optional {
                    return Err(ModelError::MissingIdentityField {
                        entity_type: self.entity_type.clone(),
                        field: spec.name.clone(),
                    });
                }
                parts.push(KeyPart::Null);
                continue;
            }
            self.check_type(spec, value)?;
            // Whole floats in an integer field are keyed as integers.
            let part = match (spec.field_type, value.as_i64()) {
                (FieldType::Integer, Some(i)) => KeyPart::Int(i),
                _ => KeyPart::try_from(value)?,
            };
            parts.push(part);
        }
        Ok(IdentityKey::from_parts(parts))
    }

    /// Checks every declared field present in `fields` has the declared kind.
    pub fn check_fields(&self, fields: &Fields) -> ModelResult<()> {
        for (name, value) in fields {
            if let Some(spec) = self.field(name) {
                self.check_type(spec, value)?;
            }
        }
        Ok(())
    }

    /// Returns the attribute fields whose values differ between the two
    /// mappings, carrying the value from `source`. Absent fields count as
    /// null.
    pub fn diff_attributes(&self, source: &Fields, target: &Fields) -> Fields {
        let mut changed = Fields::new();
        for spec in &self.attributes {
            let ours = source.get(&spec.name).unwrap_or(&FieldValue::Null);
            let theirs = target.get(&spec.name).unwrap_or(&FieldValue::Null);
            if !spec.field_type.values_equal(ours, theirs) {
                changed.insert(spec.name.clone(), ours.clone());
            }
        }
        changed
    }

    /// Projects the identity fields out of a mapping.
    pub fn identity_fields(&self, fields: &Fields) -> Fields {
        self.project(&self.identifiers, fields)
    }

    /// Projects the attribute fields out of a mapping.
    pub fn attribute_fields(&self, fields: &Fields) -> Fields {
        self.project(&self.attributes, fields)
    }

    fn project(&self, specs: &[FieldSpec], fields: &Fields) -> Fields {
        specs
            .iter()
            .map(|spec| {
                let value = fields.get(&spec.name).cloned().unwrap_or_default();
                (spec.name.clone(), value)
            })
            .collect()
    }

    fn check_type(&self, spec: &FieldSpec, value: &FieldValue) -> ModelResult<()> {
        if spec.field_type.accepts(value) {
            Ok(())
        } else {
            Err(ModelError::FieldTypeMismatch {
                entity_type: self.entity_type.clone(),
                field: spec.name.clone(),
                expected: spec.field_type,
                found: value.kind_name(),
            })
        }
    }
}
