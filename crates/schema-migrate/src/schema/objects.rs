//! Non-table schema objects: views, sequences, synonyms, routines.

use serde::{Deserialize, Serialize};

use crate::core::identifier::Identifier;

/// View metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// View name.
    pub name: Identifier,

    /// Defining SELECT text.
    pub definition: String,

    /// Whether the view is materialized.
    #[serde(default)]
    pub materialized: bool,
}

/// Sequence metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: Identifier,

    /// Start value.
    pub start: i64,

    /// Increment step.
    pub increment: i64,

    /// Minimum bound, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,

    /// Maximum bound, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,

    /// Whether the sequence cycles at its bounds.
    #[serde(default)]
    pub cycle: bool,

    /// Number of preallocated values.
    pub cache: i64,
}

impl Sequence {
    /// A sequence with common defaults: start 1, increment 1, no bounds,
    /// no cycling, cache 1.
    pub fn with_defaults(name: Identifier) -> Self {
        Self {
            name,
            start: 1,
            increment: 1,
            min_value: None,
            max_value: None,
            cycle: false,
            cache: 1,
        }
    }
}

/// Synonym metadata: an alias for another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    /// Synonym name.
    pub name: Identifier,

    /// Target object the synonym points at.
    pub target: Identifier,
}

/// Routine (stored procedure / function) metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    /// Routine name.
    pub name: Identifier,

    /// Full definition text.
    pub definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_defaults() {
        let seq = Sequence::with_defaults(Identifier::new("order_seq").unwrap());
        assert_eq!(seq.start, 1);
        assert_eq!(seq.increment, 1);
        assert!(seq.min_value.is_none());
        assert!(!seq.cycle);
    }

    #[test]
    fn test_sequence_bounds_serialize_as_absent() {
        let seq = Sequence::with_defaults(Identifier::new("s").unwrap());
        let json = serde_json::to_string(&seq).unwrap();
        assert!(!json.contains("min_value"));
        assert!(!json.contains("max_value"));

        let bounded = Sequence {
            min_value: Some(0),
            ..seq
        };
        let json = serde_json::to_string(&bounded).unwrap();
        assert!(json.contains("\"min_value\":0"));
    }
}
