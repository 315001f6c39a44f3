//! Error types for the schema analysis library.

use thiserror::Error;

/// One unorderable foreign-key edge reported by cycle detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEdge {
    /// Child (referencing) table.
    pub from: String,
    /// Parent (referenced) table.
    pub to: String,
}

impl std::fmt::Display for CycleEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Main error type for schema analysis operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A constructor or entry point received an empty/out-of-range value.
    /// Always raised at construction time, never deferred.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (invalid YAML, missing fields, unknown dialect, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A dialect does not support a requested schema feature.
    #[error("Dialect '{dialect}' does not support {feature}")]
    Unsupported { dialect: String, feature: String },

    /// The dependency graph has no valid topological order.
    #[error("foreign key relationships contain a cycle: {}", format_edges(edges))]
    CycleDetected { edges: Vec<CycleEdge> },

    /// An underlying I/O or driver error while introspecting a schema object.
    #[error("Schema load failed: {0}")]
    Load(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

fn format_edges(edges: &[CycleEdge]) -> String {
    edges
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SchemaError {
    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SchemaError::InvalidArgument(message.into())
    }

    /// Create an `Unsupported` error for a dialect/feature pair.
    pub fn unsupported(dialect: impl Into<String>, feature: impl Into<String>) -> Self {
        SchemaError::Unsupported {
            dialect: dialect.into(),
            feature: feature.into(),
        }
    }

    /// Create a `Load` error.
    pub fn load(message: impl Into<String>) -> Self {
        SchemaError::Load(message.into())
    }

    /// Clone a memoized failure so the cache can replay it to every waiter.
    ///
    /// Most variants carry cloneable payloads. Wrapped foreign errors
    /// (YAML/JSON) are not cloneable and are replayed as `Load` with the
    /// original message preserved.
    pub fn replay(err: &SchemaError) -> SchemaError {
        match err {
            SchemaError::InvalidArgument(m) => SchemaError::InvalidArgument(m.clone()),
            SchemaError::Config(m) => SchemaError::Config(m.clone()),
            SchemaError::Unsupported { dialect, feature } => SchemaError::Unsupported {
                dialect: dialect.clone(),
                feature: feature.clone(),
            },
            SchemaError::CycleDetected { edges } => SchemaError::CycleDetected {
                edges: edges.clone(),
            },
            SchemaError::Load(m) => SchemaError::Load(m.clone()),
            SchemaError::Io(e) => SchemaError::Io(std::io::Error::new(e.kind(), e.to_string())),
            SchemaError::Yaml(e) => SchemaError::Load(e.to_string()),
            SchemaError::Json(e) => SchemaError::Load(e.to_string()),
            SchemaError::Cancelled => SchemaError::Cancelled,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for CLI consumers.
    pub fn exit_code(&self) -> u8 {
        match self {
            SchemaError::Config(_) | SchemaError::InvalidArgument(_) => 2,
            SchemaError::Unsupported { .. } => 3,
            SchemaError::CycleDetected { .. } => 4,
            SchemaError::Cancelled => 130,
            _ => 1,
        }
    }
}

/// Result type alias for schema analysis operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_edges() {
        let err = SchemaError::CycleDetected {
            edges: vec![
                CycleEdge {
                    from: "a".to_string(),
                    to: "b".to_string(),
                },
                CycleEdge {
                    from: "b".to_string(),
                    to: "a".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("contain a cycle"));
        assert!(msg.contains("a -> b"));
        assert!(msg.contains("b -> a"));
    }

    #[test]
    fn test_replay_preserves_variant() {
        let original = SchemaError::unsupported("sqlite", "sequences");
        let replayed = SchemaError::replay(&original);
        assert!(matches!(replayed, SchemaError::Unsupported { .. }));
        assert_eq!(replayed.to_string(), original.to_string());

        let cancelled = SchemaError::replay(&SchemaError::Cancelled);
        assert!(matches!(cancelled, SchemaError::Cancelled));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SchemaError::Config("x".into()).exit_code(), 2);
        assert_eq!(SchemaError::unsupported("mysql", "synonyms").exit_code(), 3);
        assert_eq!(SchemaError::Cancelled.exit_code(), 130);
        assert_eq!(SchemaError::load("boom").exit_code(), 1);
    }
}
