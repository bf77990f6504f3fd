//! Identity keys.
//!
//! An identity key is the ordered tuple of an entity's identity field
//! values. It is hashable and totally ordered, so it can index maps on
//! both sides of a sync. Surrogate handles never take part in it.

use crate::{Error, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One component of an [`IdentityKey`].
///
/// Only hashable kinds are allowed; floats and structured values are
/// rejected when the key is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl TryFrom<&FieldValue> for KeyPart {
    type Error = Error;

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Null => Ok(Self::Null),
            FieldValue::Bool(b) => Ok(Self::Bool(*b)),
            FieldValue::Int(i) => Ok(Self::Int(*i)),
            FieldValue::Text(s) => Ok(Self::Text(s.clone())),
            other => Err(Error::UnhashableKeyPart(other.kind_name())),
        }
    }
}

impl From<&KeyPart> for FieldValue {
    fn from(part: &KeyPart) -> Self {
        match part {
            KeyPart::Null => FieldValue::Null,
            KeyPart::Bool(b) => FieldValue::Bool(*b),
            KeyPart::Int(i) => FieldValue::Int(*i),
            KeyPart::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The ordered identity tuple of an entity within its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(Vec<KeyPart>);

impl IdentityKey {
    /// Builds a key from already-validated parts.
    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Builds a key from field values, in the given order.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a FieldValue>) -> crate::Result<Self> {
        values
            .into_iter()
            .map(KeyPart::try_from)
            .collect::<crate::Result<Vec<_>>>()
            .map(Self)
    }

    /// Convenience constructor for all-text keys (mostly used in tests).
    pub fn text<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(|p| KeyPart::Text(p.into())).collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders as the parts joined by `__`, e.g. `core-sw1__Tower A`.
impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("__")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
