//! The customer attached to an order.

use serde::{Deserialize, Serialize};

use crate::field::{FieldValue, FieldValues};
use crate::types::FieldId;

/// A customer: a bag of field values keyed by field id.
///
/// Equality compares the field-value maps, which is what the change-set
/// engine uses to detect customer edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Customer {
    values: FieldValues,
}

impl Customer {
    /// An empty customer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing values.
    pub fn from_values(values: FieldValues) -> Self {
        Self { values }
    }

    /// Get a field value.
    pub fn get(&self, id: &FieldId) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Set a field value, returning the previous one.
    pub fn set(&mut self, id: impl Into<FieldId>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.values.insert(id.into(), value.into())
    }

    /// Remove a field value.
    pub fn remove(&mut self, id: &FieldId) -> Option<FieldValue> {
        self.values.remove(id)
    }

    /// Whether no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(FieldValue::is_blank)
    }

    /// All field values.
    pub fn values(&self) -> &FieldValues {
        &self.values
    }
}
