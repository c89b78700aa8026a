//! Customer and room-selection field values.
//!
//! A field is a scalar value keyed by [`FieldId`]. Which values a field may
//! hold is decided by its [`FieldKind`], a tagged variant carried in the
//! business configuration under a `type` discriminator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::FieldId;

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Text value.
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Integer value.
    pub fn int(n: i64) -> Self {
        FieldValue::Number(n.into())
    }

    /// Borrow as text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check for null or empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// A map of field values, ordered by id so equality and serialization are
/// deterministic.
pub type FieldValues = BTreeMap<FieldId, FieldValue>;

/// The kind of a configured field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Number,
    Checkbox,
    Date,
    Choice {
        #[serde(default)]
        options: Vec<String>,
    },
}

impl FieldKind {
    /// Whether a value has the right shape for this kind.
    ///
    /// Blank values are always accepted; whether a field is required is a
    /// separate concern. This is a shape check only, business validation
    /// rules are applied elsewhere.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        if value.is_blank() {
            return true;
        }
        match (self, value) {
            (FieldKind::Text, FieldValue::Text(_)) => true,
            (FieldKind::Email, FieldValue::Text(s)) => {
                matches!(s.split_once('@'), Some((user, host)) if !user.is_empty() && host.contains('.'))
            }
            (FieldKind::Phone, FieldValue::Text(s)) => s
                .chars()
                .all(|c| c.is_ascii_digit() || " +-().".contains(c)),
            (FieldKind::Number, FieldValue::Number(_)) => true,
            (FieldKind::Checkbox, FieldValue::Bool(_)) => true,
            (FieldKind::Date, FieldValue::Text(_)) => true,
            (FieldKind::Choice { options }, FieldValue::Text(s)) => options.iter().any(|o| o == s),
            _ => false,
        }
    }
}

/// A field configured on the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub id: FieldId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    /// Check a value against this definition.
    pub fn admits(&self, value: Option<&FieldValue>) -> bool {
        match value {
            None => !self.required,
            Some(v) if v.is_blank() => !self.required,
            Some(v) => self.kind.accepts(v),
        }
    }
}

/// Ids of the definitions that a set of values does not satisfy.
pub fn unsatisfied<'a>(defs: &'a [FieldDef], values: &FieldValues) -> Vec<&'a FieldId> {
    defs.iter()
        .filter(|def| !def.admits(values.get(&def.id)))
        .map(|def| &def.id)
        .collect()
}
