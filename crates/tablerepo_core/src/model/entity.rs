//! Storage entity: the row shape the table store persists.
//!
//! # Responsibility
//! - Hold one keyed row with schema-light, typed properties.
//! - Provide typed accessors that mappers use to read columns back.
//!
//! # Invariants
//! - `timestamp` is owned by the store; mappers leave it `None`.
//! - Property names are unique per row (map semantics).

use crate::model::key::EntityKey;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Int64(i64),
    Double(f64),
    Bool(bool),
    /// Unix epoch milliseconds.
    DateTime(i64),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl PropertyValue {
    /// Compares two values of compatible type.
    ///
    /// Returns `None` for mismatched types. `Int64` and `Double` compare
    /// numerically with each other, exactly over the whole `i64` range.
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Int64(a), Self::Double(b)) => compare_int_double(*a, *b),
            (Self::Double(a), Self::Int64(b)) => {
                compare_int_double(*b, *a).map(Ordering::reverse)
            }
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Guid(a), Self::Guid(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Exact `i64` vs `f64` ordering; `None` only for NaN.
fn compare_int_double(int: i64, double: f64) -> Option<Ordering> {
    // 2^63; every finite double below it and >= -2^63 truncates into i64.
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if double.is_nan() {
        return None;
    }
    if double >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if double < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    let whole = double.trunc();
    Some(int.cmp(&(whole as i64)).then_with(|| {
        if double > whole {
            Ordering::Less
        } else if double < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int64(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// Keyed row with typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    pub key: EntityKey,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Epoch milliseconds of the last applied write, set by the store.
    pub timestamp: Option<i64>,
}

impl TableEntity {
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            properties: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Inserts or replaces one property.
    ///
    /// `PartitionKey`, `RowKey` and `Timestamp` are reserved filter fields;
    /// stores reject rows carrying a property with one of those names.
    /// Non-finite `Double` values are rejected at commit as well.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.properties.get(name) {
            Some(PropertyValue::Int64(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.properties.get(name) {
            Some(PropertyValue::Double(value)) => Some(*value),
            Some(PropertyValue::Int64(value)) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.properties.get(name) {
            Some(PropertyValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_datetime(&self, name: &str) -> Option<i64> {
        match self.properties.get(name) {
            Some(PropertyValue::DateTime(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_guid(&self, name: &str) -> Option<Uuid> {
        match self.properties.get(name) {
            Some(PropertyValue::Guid(value)) => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyValue, TableEntity};
    use crate::model::key::EntityKey;
    use std::cmp::Ordering;

    #[test]
    fn numeric_values_compare_across_int_and_double() {
        let int = PropertyValue::Int64(2);
        let double = PropertyValue::Double(2.5);
        assert_eq!(int.compare(&double), Some(Ordering::Less));
        assert_eq!(double.compare(&int), Some(Ordering::Greater));
    }

    #[test]
    fn int_double_comparison_is_exact_beyond_f64_precision() {
        let two_pow_53 = 9_007_199_254_740_992_i64;
        let int = PropertyValue::Int64(two_pow_53 + 1);
        let double = PropertyValue::Double(two_pow_53 as f64);
        assert_eq!(int.compare(&double), Some(Ordering::Greater));
        assert_eq!(double.compare(&int), Some(Ordering::Less));

        assert_eq!(
            PropertyValue::Int64(-3).compare(&PropertyValue::Double(-3.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            PropertyValue::Int64(4).compare(&PropertyValue::Double(4.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            PropertyValue::Int64(i64::MAX).compare(&PropertyValue::Double(f64::INFINITY)),
            Some(Ordering::Less)
        );
        assert_eq!(
            PropertyValue::Int64(i64::MIN).compare(&PropertyValue::Double(-1e300)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            PropertyValue::Int64(0).compare(&PropertyValue::Double(f64::NAN)),
            None
        );
    }

    #[test]
    fn entity_with_invalid_key_does_not_deserialize() {
        let json = r#"{"key":{"partition_key":"p","row_key":"a#b"},"properties":{},"timestamp":null}"#;
        assert!(serde_json::from_str::<TableEntity>(json).is_err());
    }

    #[test]
    fn mismatched_types_do_not_compare() {
        let text = PropertyValue::from("1");
        let int = PropertyValue::from(1_i64);
        assert_eq!(text.compare(&int), None);
    }

    #[test]
    fn typed_getters_ignore_other_types() {
        let entity = TableEntity::new(EntityKey::new("p", "r").unwrap())
            .with("name", "ada")
            .with("age", 36_i64);
        assert_eq!(entity.get_str("name"), Some("ada"));
        assert_eq!(entity.get_i64("name"), None);
        assert_eq!(entity.get_f64("age"), Some(36.0));
        assert!(entity.get("missing").is_none());
    }

    #[test]
    fn property_json_shape_is_tagged() {
        let json = serde_json::to_string(&PropertyValue::Int64(7)).unwrap();
        assert_eq!(json, r#"{"type":"int64","value":7}"#);
    }
}
