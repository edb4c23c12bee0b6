//! Composable filter expressions over storage-entity fields.
//!
//! # Responsibility
//! - Describe row predicates as plain values that stores can compile or
//!   evaluate.
//! - Provide the reference in-process evaluator (`Filter::matches`).
//!
//! # Invariants
//! - A comparison against a missing property never matches.
//! - Comparisons between incompatible value types never match.
//! - A filter list is the logical AND of its items; an empty list matches all.

use crate::model::entity::{PropertyValue, TableEntity};
use crate::model::key::EntityKey;
use std::cmp::Ordering;

/// Reserved field name addressing the partition key.
pub const PARTITION_KEY_FIELD: &str = "PartitionKey";
/// Reserved field name addressing the row key.
pub const ROW_KEY_FIELD: &str = "RowKey";
/// Reserved field name addressing the store-managed timestamp.
pub const TIMESTAMP_FIELD: &str = "Timestamp";

/// Returns `true` for names that address the key or timestamp instead of a
/// property.
pub fn is_reserved_field(name: &str) -> bool {
    matches!(name, PARTITION_KEY_FIELD | ROW_KEY_FIELD | TIMESTAMP_FIELD)
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }
}

/// Boolean filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        field: String,
        op: CompareOp,
        value: PropertyValue,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn compare(
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn partition_key_eq(partition_key: impl Into<String>) -> Self {
        Self::eq(PARTITION_KEY_FIELD, PropertyValue::String(partition_key.into()))
    }

    pub fn row_key_eq(row_key: impl Into<String>) -> Self {
        Self::eq(ROW_KEY_FIELD, PropertyValue::String(row_key.into()))
    }

    pub fn and(self, other: Filter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluates this expression against one row.
    pub fn matches(&self, entity: &TableEntity) -> bool {
        match self {
            Self::Compare { field, op, value } => match field_value(entity, field) {
                Some(actual) => actual
                    .compare(value)
                    .map_or(false, |ordering| op.accepts(ordering)),
                None => false,
            },
            Self::And(left, right) => left.matches(entity) && right.matches(entity),
            Self::Or(left, right) => left.matches(entity) || right.matches(entity),
            Self::Not(inner) => !inner.matches(entity),
        }
    }
}

/// Filters addressing exactly one row.
pub fn key_filter(key: &EntityKey) -> Vec<Filter> {
    vec![
        Filter::partition_key_eq(key.partition_key()),
        Filter::row_key_eq(key.row_key()),
    ]
}

/// Returns `true` when every filter matches.
pub fn matches_all(filters: &[Filter], entity: &TableEntity) -> bool {
    filters.iter().all(|filter| filter.matches(entity))
}

/// Finds a top-level `PartitionKey == value` constraint.
///
/// Only plain list items and `And` branches are inspected, so the returned
/// partition is a necessary condition for every match.
pub fn partition_key_of(filters: &[Filter]) -> Option<&str> {
    filters.iter().find_map(required_partition_key)
}

fn required_partition_key(filter: &Filter) -> Option<&str> {
    match filter {
        Filter::Compare {
            field,
            op: CompareOp::Eq,
            value: PropertyValue::String(value),
        } if field == PARTITION_KEY_FIELD => Some(value.as_str()),
        Filter::And(left, right) => {
            required_partition_key(left).or_else(|| required_partition_key(right))
        }
        _ => None,
    }
}

fn field_value(entity: &TableEntity, field: &str) -> Option<PropertyValue> {
    match field {
        PARTITION_KEY_FIELD => Some(PropertyValue::String(
            entity.key.partition_key().to_string(),
        )),
        ROW_KEY_FIELD => Some(PropertyValue::String(entity.key.row_key().to_string())),
        TIMESTAMP_FIELD => entity.timestamp.map(PropertyValue::DateTime),
        name => entity.properties.get(name).cloned(),
    }
}
