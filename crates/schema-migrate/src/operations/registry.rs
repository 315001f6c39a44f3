//! Plan analyzers and the registry that dispatches them.
//!
//! Analyzers inspect one operation at a time and either keep it, veto it
//! with an error, or rewrite it into an equivalent sequence the target
//! dialect can execute. The registry is plain data built by the caller,
//! so the set of active analyzers is always explicit.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::operations::{MigrationOperation, OperationKind};

/// Outcome of analyzing a single operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The operation passes through unchanged.
    Keep,
    /// The operation is rewritten into this sequence. Replacements are not
    /// re-analyzed, so rewrites must produce operations that are already
    /// valid for the target.
    Replace(Vec<MigrationOperation>),
}

pub trait OperationAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, operation: &MigrationOperation) -> Result<Analysis>;
}

/// Dispatches registered analyzers over a migration plan.
///
/// Analyzers run in registration order for each operation's kind. The
/// first `Replace` ends the chain for that operation; a veto error aborts
/// the whole analysis.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<OperationKind, Vec<Arc<dyn OperationAnalyzer>>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: OperationKind, analyzer: Arc<dyn OperationAnalyzer>) {
        self.analyzers.entry(kind).or_default().push(analyzer);
    }

    pub fn has(&self, kind: OperationKind) -> bool {
        self.analyzers.get(&kind).is_some_and(|v| !v.is_empty())
    }

    pub fn analyzers_for(&self, kind: OperationKind) -> &[Arc<dyn OperationAnalyzer>] {
        self.analyzers.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn analyze(&self, operations: Vec<MigrationOperation>) -> Result<Vec<MigrationOperation>> {
        let mut result = Vec::with_capacity(operations.len());
        for operation in operations {
            let mut outcome = Analysis::Keep;
            for analyzer in self.analyzers_for(operation.kind()) {
                match analyzer.analyze(&operation)? {
                    Analysis::Keep => continue,
                    replace @ Analysis::Replace(_) => {
                        tracing::debug!(
                            analyzer = analyzer.name(),
                            operation = %operation.summary(),
                            "operation rewritten"
                        );
                        outcome = replace;
                        break;
                    }
                }
            }
            match outcome {
                Analysis::Keep => result.push(operation),
                Analysis::Replace(ops) => result.extend(ops),
            }
        }
        Ok(result)
    }
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(String, Vec<&str>)> = self
            .analyzers
            .iter()
            .map(|(kind, list)| {
                (
                    kind.to_string(),
                    list.iter().map(|a| a.name()).collect(),
                )
            })
            .collect();
        entries.sort();
        f.debug_struct("AnalyzerRegistry")
            .field("analyzers", &entries)
            .finish()
    }
}

// ============================================================================
// Built-in analyzers
// ============================================================================

/// Vetoes sequence operations on dialects without sequence support.
#[derive(Debug, Clone)]
pub struct SequenceCapabilityAnalyzer {
    dialect: String,
}

impl SequenceCapabilityAnalyzer {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub const KINDS: [OperationKind; 3] = [
        OperationKind::CreateSequence,
        OperationKind::DropSequence,
        OperationKind::AlterSequence,
    ];
}

impl OperationAnalyzer for SequenceCapabilityAnalyzer {
    fn name(&self) -> &str {
        "sequence-capability"
    }

    fn analyze(&self, _operation: &MigrationOperation) -> Result<Analysis> {
        Err(SchemaError::unsupported(&self.dialect, "sequences"))
    }
}

/// Vetoes synonym operations on dialects without synonym support.
#[derive(Debug, Clone)]
pub struct SynonymCapabilityAnalyzer {
    dialect: String,
}

impl SynonymCapabilityAnalyzer {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub const KINDS: [OperationKind; 2] =
        [OperationKind::CreateSynonym, OperationKind::DropSynonym];
}

impl OperationAnalyzer for SynonymCapabilityAnalyzer {
    fn name(&self) -> &str {
        "synonym-capability"
    }

    fn analyze(&self, _operation: &MigrationOperation) -> Result<Analysis> {
        Err(SchemaError::unsupported(&self.dialect, "synonyms"))
    }
}

/// Rewrites `AddColumn` of a NOT NULL column without a default into three
/// steps: add the column nullable, backfill with the type's zero value,
/// then tighten to NOT NULL. Adding NOT NULL directly fails on any table
/// that already has rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddNotNullColumnAnalyzer;

impl AddNotNullColumnAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl OperationAnalyzer for AddNotNullColumnAnalyzer {
    fn name(&self) -> &str {
        "add-not-null-column"
    }

    fn analyze(&self, operation: &MigrationOperation) -> Result<Analysis> {
        let MigrationOperation::AddColumn { table, column } = operation else {
            return Ok(Analysis::Keep);
        };
        if column.nullable || column.default_value.is_some() {
            return Ok(Analysis::Keep);
        }

        let mut relaxed = column.clone();
        relaxed.nullable = true;
        let backfill = MigrationOperation::sql(format!(
            "UPDATE {table} SET {col} = {zero} WHERE {col} IS NULL",
            col = column.name,
            zero = column.column_type.data_kind.zero_literal(),
        ))?;

        Ok(Analysis::Replace(vec![
            MigrationOperation::AddColumn {
                table: table.clone(),
                column: relaxed,
            },
            backfill,
            MigrationOperation::AlterColumn {
                table: table.clone(),
                column: column.clone(),
            },
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::Identifier;
    use crate::schema::column::{Column, DataKind};
    use crate::schema::objects::Sequence;

    fn table_id(name: &str) -> Identifier {
        Identifier::with_schema("public", name).unwrap()
    }

    fn registry_with_sequence_veto() -> AnalyzerRegistry {
        let mut registry = AnalyzerRegistry::new();
        let analyzer = Arc::new(SequenceCapabilityAnalyzer::new("sqlite"));
        for kind in SequenceCapabilityAnalyzer::KINDS {
            registry.register(kind, analyzer.clone());
        }
        registry
    }

    #[test]
    fn test_sequence_veto_is_unsupported_error() {
        let registry = registry_with_sequence_veto();
        let ops = vec![MigrationOperation::CreateSequence {
            sequence: Sequence::with_defaults(table_id("seq_id")),
        }];
        let err = registry.analyze(ops).unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported { .. }));
    }

    #[test]
    fn test_unregistered_kinds_pass_through() {
        let registry = registry_with_sequence_veto();
        let ops = vec![MigrationOperation::AddColumn {
            table: table_id("orders"),
            column: Column::nullable("note", DataKind::Text),
        }];
        let result = registry.analyze(ops).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_not_null_add_column_splits_into_three() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(
            OperationKind::AddColumn,
            Arc::new(AddNotNullColumnAnalyzer::new()),
        );
        let ops = vec![MigrationOperation::AddColumn {
            table: table_id("orders"),
            column: Column::required("total", DataKind::Integer),
        }];
        let result = registry.analyze(ops).unwrap();
        assert_eq!(result.len(), 3);

        let MigrationOperation::AddColumn { column, .. } = &result[0] else {
            panic!("expected add_column first, got {:?}", result[0].kind());
        };
        assert!(column.nullable);

        let MigrationOperation::Sql { sql } = &result[1] else {
            panic!("expected backfill sql, got {:?}", result[1].kind());
        };
        assert!(sql.contains("UPDATE"));
        assert!(sql.contains("total"));

        let MigrationOperation::AlterColumn { column, .. } = &result[2] else {
            panic!("expected alter_column last, got {:?}", result[2].kind());
        };
        assert!(!column.nullable);
    }

    #[test]
    fn test_nullable_add_column_is_kept() {
        let analyzer = AddNotNullColumnAnalyzer::new();
        let op = MigrationOperation::AddColumn {
            table: table_id("orders"),
            column: Column::nullable("note", DataKind::Text),
        };
        assert_eq!(analyzer.analyze(&op).unwrap(), Analysis::Keep);
    }

    #[test]
    fn test_not_null_with_default_is_kept() {
        let analyzer = AddNotNullColumnAnalyzer::new();
        let mut column = Column::required("total", DataKind::Integer);
        column.default_value = Some("0".to_string());
        let op = MigrationOperation::AddColumn {
            table: table_id("orders"),
            column,
        };
        assert_eq!(analyzer.analyze(&op).unwrap(), Analysis::Keep);
    }

    #[test]
    fn test_replacements_are_not_reanalyzed() {
        // An analyzer that doubles every raw Sql operation would diverge if
        // its own output were fed back through the registry.
        struct Doubler;
        impl OperationAnalyzer for Doubler {
            fn name(&self) -> &str {
                "doubler"
            }
            fn analyze(&self, operation: &MigrationOperation) -> Result<Analysis> {
                Ok(Analysis::Replace(vec![operation.clone(), operation.clone()]))
            }
        }
        let mut registry = AnalyzerRegistry::new();
        registry.register(OperationKind::Sql, Arc::new(Doubler));
        let ops = vec![MigrationOperation::sql("select 1").unwrap()];
        let result = registry.analyze(ops).unwrap();
        assert_eq!(result.len(), 2);
    }
}
