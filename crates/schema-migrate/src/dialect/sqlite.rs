use crate::core::identifier::{quote_sqlite, Identifier, NameResolution};
use crate::dialect::Dialect;
use crate::error::{Result, SchemaError};
use crate::schema::column::{AutoIncrement, ColumnType, DataKind};

/// SQLite. Type affinity rather than strict types, single anonymous
/// schema, no sequences or synonyms, and almost no in-place DDL beyond
/// table and column renames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn resolution(&self) -> NameResolution {
        NameResolution::FoldLower
    }

    fn quote(&self, ident: &str) -> Result<String> {
        quote_sqlite(ident)
    }

    fn qualified_name(&self, id: &Identifier) -> Result<String> {
        // One schema per database file; prefixes are dropped.
        self.quote(&id.local_name)
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn supports_materialized_views(&self) -> bool {
        false
    }

    fn render_type(&self, column_type: &ColumnType) -> Result<String> {
        let rendered = match &column_type.data_kind {
            DataKind::Boolean
            | DataKind::SmallInteger
            | DataKind::Integer
            | DataKind::BigInteger => "INTEGER".to_string(),
            DataKind::Numeric | DataKind::Float => "REAL".to_string(),
            DataKind::Text
            | DataKind::Unicode
            | DataKind::Date
            | DataKind::Time
            | DataKind::Timestamp
            | DataKind::TimestampTz
            | DataKind::Uuid
            | DataKind::Json => "TEXT".to_string(),
            DataKind::Binary => "BLOB".to_string(),
            DataKind::Unknown(native) => native.clone(),
        };
        Ok(rendered)
    }

    fn auto_increment_clause(&self, auto_increment: &AutoIncrement) -> Result<String> {
        if auto_increment.initial != 1 || auto_increment.increment != 1 {
            return Err(SchemaError::unsupported(
                self.name(),
                "auto-increment seed/step",
            ));
        }
        Ok("AUTOINCREMENT".to_string())
    }

    fn rename_table_sql(&self, table: &Identifier, target: &Identifier) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.qualified_name(table)?,
            self.quote(&target.local_name)?
        ))
    }

    fn rename_column_sql(&self, table: &Identifier, column: &str, target: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.qualified_name(table)?,
            self.quote(column)?,
            self.quote(target)?
        ))
    }

    fn rename_constraint_sql(
        &self,
        _table: &Identifier,
        _name: &str,
        _target: &str,
    ) -> Result<String> {
        Err(SchemaError::unsupported(self.name(), "constraint rename"))
    }

    fn rename_index_sql(&self, _table: &Identifier, _name: &str, _target: &str) -> Result<String> {
        Err(SchemaError::unsupported(self.name(), "index rename"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_prefix_is_dropped() {
        let d = SqliteDialect;
        let id = Identifier::with_schema("main", "orders").unwrap();
        assert_eq!(d.qualified_name(&id).unwrap(), "\"orders\"");
    }

    #[test]
    fn test_affinity_types() {
        let d = SqliteDialect;
        assert_eq!(d.render_type(&ColumnType::varchar(255)).unwrap(), "TEXT");
        assert_eq!(
            d.render_type(&ColumnType::of(DataKind::BigInteger)).unwrap(),
            "INTEGER"
        );
    }

    #[test]
    fn test_index_rename_is_unsupported() {
        let d = SqliteDialect;
        let table = Identifier::new("orders").unwrap();
        assert!(d.rename_index_sql(&table, "a", "b").is_err());
    }
}
