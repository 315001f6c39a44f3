//! Explicit dialect registry.
//!
//! Nothing registers itself; the binary (or a test) builds the catalog it
//! wants and passes it down. `with_builtins()` is the standard set.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dialect::{Dialect, MssqlDialect, MysqlDialect, PostgresDialect, SqliteDialect};
use crate::error::{Result, SchemaError};
use crate::operations::registry::{
    AddNotNullColumnAnalyzer, AnalyzerRegistry, SequenceCapabilityAnalyzer,
    SynonymCapabilityAnalyzer,
};
use crate::operations::OperationKind;

#[derive(Default)]
pub struct DialectCatalog {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with all built-in dialects registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(PostgresDialect));
        catalog.register(Arc::new(MssqlDialect));
        catalog.register(Arc::new(MysqlDialect));
        catalog.register(Arc::new(SqliteDialect));
        catalog
    }

    /// Keys are case-insensitive; `Postgres` and `postgres` name the same
    /// dialect.
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }

    pub fn register(&mut self, dialect: Arc<dyn Dialect>) {
        self.dialects
            .insert(Self::normalize_name(dialect.name()), dialect);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(&Self::normalize_name(name)).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.get(name).ok_or_else(|| {
            SchemaError::Config(format!(
                "unknown dialect '{}' (known: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Registered dialect names, sorted for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The analyzer set for one target dialect: capability vetoes for
    /// features it lacks, plus the MySQL NOT NULL column rewrite.
    pub fn analyzer_registry_for(&self, name: &str) -> Result<AnalyzerRegistry> {
        let dialect = self.require(name)?;
        let mut registry = AnalyzerRegistry::new();

        if !dialect.supports_sequences() {
            let analyzer = Arc::new(SequenceCapabilityAnalyzer::new(dialect.name()));
            for kind in SequenceCapabilityAnalyzer::KINDS {
                registry.register(kind, analyzer.clone());
            }
        }
        if !dialect.supports_synonyms() {
            let analyzer = Arc::new(SynonymCapabilityAnalyzer::new(dialect.name()));
            for kind in SynonymCapabilityAnalyzer::KINDS {
                registry.register(kind, analyzer.clone());
            }
        }
        if dialect.name() == MysqlDialect.name() {
            registry.register(
                OperationKind::AddColumn,
                Arc::new(AddNotNullColumnAnalyzer::new()),
            );
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::Identifier;
    use crate::operations::MigrationOperation;
    use crate::schema::column::{Column, DataKind};
    use crate::schema::objects::Synonym;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = DialectCatalog::with_builtins();
        assert!(catalog.get("Postgres").is_some());
        assert!(catalog.get(" MSSQL ").is_some());
        assert!(catalog.get("oracle").is_none());
    }

    #[test]
    fn test_require_names_known_dialects() {
        let catalog = DialectCatalog::with_builtins();
        let err = catalog.require("oracle").err().unwrap();
        let text = err.to_string();
        assert!(text.contains("oracle"));
        assert!(text.contains("postgres"));
    }

    #[test]
    fn test_names_are_sorted() {
        let catalog = DialectCatalog::with_builtins();
        assert_eq!(catalog.names(), ["mssql", "mysql", "postgres", "sqlite"]);
    }

    #[test]
    fn test_postgres_vetoes_synonyms_but_not_sequences() {
        let catalog = DialectCatalog::with_builtins();
        let registry = catalog.analyzer_registry_for("postgres").unwrap();
        assert!(registry.has(OperationKind::CreateSynonym));
        assert!(!registry.has(OperationKind::CreateSequence));

        let ops = vec![MigrationOperation::CreateSynonym {
            synonym: Synonym {
                name: Identifier::with_schema("public", "orders_syn").unwrap(),
                target: Identifier::with_schema("public", "orders").unwrap(),
            },
        }];
        assert!(registry.analyze(ops).is_err());
    }

    #[test]
    fn test_mssql_allows_synonyms() {
        let catalog = DialectCatalog::with_builtins();
        let registry = catalog.analyzer_registry_for("mssql").unwrap();
        assert!(!registry.has(OperationKind::CreateSynonym));
    }

    #[test]
    fn test_mysql_rewrites_not_null_add_column() {
        let catalog = DialectCatalog::with_builtins();
        let registry = catalog.analyzer_registry_for("mysql").unwrap();
        let ops = vec![MigrationOperation::AddColumn {
            table: Identifier::with_schema("app", "orders").unwrap(),
            column: Column::required("total", DataKind::Integer),
        }];
        let result = registry.analyze(ops).unwrap();
        assert_eq!(result.len(), 3);
    }
}
