//! Composite storage key.
//!
//! # Responsibility
//! - Name one row in a partitioned table by `(partition_key, row_key)`.
//! - Reject key shapes the table store cannot address.
//!
//! # Invariants
//! - A constructed `EntityKey` always passes validation.
//! - Ordering is partition key first, then row key.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of characters allowed in one key component.
pub const MAX_KEY_COMPONENT_CHARS: usize = 1024;

const FORBIDDEN_KEY_CHARS: &[char] = &['/', '\\', '#', '?'];

/// Which half of the composite key failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyComponent {
    PartitionKey,
    RowKey,
}

impl KeyComponent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartitionKey => "partition_key",
            Self::RowKey => "row_key",
        }
    }
}

/// Key validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    Empty(KeyComponent),
    TooLong { component: KeyComponent, chars: usize },
    ForbiddenChar { component: KeyComponent, ch: char },
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(component) => write!(f, "{} must not be empty", component.as_str()),
            Self::TooLong { component, chars } => write!(
                f,
                "{} has {chars} chars; max is {MAX_KEY_COMPONENT_CHARS}",
                component.as_str()
            ),
            Self::ForbiddenChar { component, ch } => write!(
                f,
                "{} contains forbidden character {:?}",
                component.as_str(),
                ch
            ),
        }
    }
}

impl Error for KeyError {}

/// Validated `(partition_key, row_key)` pair.
///
/// Deserialization goes through `EntityKey::new`, so decoded keys are
/// validated too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntityKey")]
pub struct EntityKey {
    partition_key: String,
    row_key: String,
}

impl EntityKey {
    /// Builds a key, validating both components.
    ///
    /// The partition key may be empty; the row key may not.
    pub fn new(
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let partition_key = partition_key.into();
        let row_key = row_key.into();
        validate_component(KeyComponent::PartitionKey, &partition_key)?;
        validate_component(KeyComponent::RowKey, &row_key)?;
        if row_key.is_empty() {
            return Err(KeyError::Empty(KeyComponent::RowKey));
        }
        Ok(Self {
            partition_key,
            row_key,
        })
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }
}

#[derive(Deserialize)]
struct RawEntityKey {
    partition_key: String,
    row_key: String,
}

impl TryFrom<RawEntityKey> for EntityKey {
    type Error = KeyError;

    fn try_from(raw: RawEntityKey) -> Result<Self, Self::Error> {
        Self::new(raw.partition_key, raw.row_key)
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.row_key)
    }
}

fn validate_component(component: KeyComponent, value: &str) -> Result<(), KeyError> {
    let chars = value.chars().count();
    if chars > MAX_KEY_COMPONENT_CHARS {
        return Err(KeyError::TooLong { component, chars });
    }
    if let Some(ch) = value
        .chars()
        .find(|ch| FORBIDDEN_KEY_CHARS.contains(ch) || ch.is_control())
    {
        return Err(KeyError::ForbiddenChar { component, ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EntityKey, KeyComponent, KeyError, MAX_KEY_COMPONENT_CHARS};

    #[test]
    fn accepts_empty_partition_but_not_empty_row() {
        let key = EntityKey::new("", "1").expect("empty partition is addressable");
        assert_eq!(key.partition_key(), "");

        let err = EntityKey::new("customers", "").expect_err("empty row key must fail");
        assert_eq!(err, KeyError::Empty(KeyComponent::RowKey));
    }

    #[test]
    fn rejects_forbidden_and_control_chars() {
        let err = EntityKey::new("a/b", "1").expect_err("slash must fail");
        assert!(matches!(
            err,
            KeyError::ForbiddenChar {
                component: KeyComponent::PartitionKey,
                ch: '/'
            }
        ));

        let err = EntityKey::new("p", "row\n").expect_err("newline must fail");
        assert!(matches!(err, KeyError::ForbiddenChar { ch: '\n', .. }));
    }

    #[test]
    fn rejects_oversized_component() {
        let long = "x".repeat(MAX_KEY_COMPONENT_CHARS + 1);
        let err = EntityKey::new("p", long).expect_err("oversized row key must fail");
        assert!(matches!(err, KeyError::TooLong { chars, .. } if chars == MAX_KEY_COMPONENT_CHARS + 1));
    }

    #[test]
    fn deserialization_validates_components() {
        let key: EntityKey =
            serde_json::from_str(r#"{"partition_key":"p","row_key":"1"}"#).unwrap();
        assert_eq!(key, EntityKey::new("p", "1").unwrap());
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            r#"{"partition_key":"p","row_key":"1"}"#
        );

        let slash = r#"{"partition_key":"a/b","row_key":"1"}"#;
        let err = serde_json::from_str::<EntityKey>(slash).unwrap_err();
        assert!(err.to_string().contains("forbidden character"));
        let empty_row = r#"{"partition_key":"p","row_key":""}"#;
        assert!(serde_json::from_str::<EntityKey>(empty_row).is_err());
    }

    #[test]
    fn orders_by_partition_then_row() {
        let a = EntityKey::new("a", "2").unwrap();
        let b = EntityKey::new("b", "1").unwrap();
        let c = EntityKey::new("b", "2").unwrap();
        let mut keys = vec![c.clone(), a.clone(), b.clone()];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }
}
