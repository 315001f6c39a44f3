use crate::core::identifier::{quote_pg, Identifier, NameResolution};
use crate::dialect::{type_suffix, Dialect};
use crate::error::Result;
use crate::schema::column::{AutoIncrement, ColumnType, DataKind};

/// PostgreSQL. Unquoted identifiers fold to lowercase; sequences and
/// materialized views are native; synonyms do not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn resolution(&self) -> NameResolution {
        NameResolution::FoldLower
    }

    fn quote(&self, ident: &str) -> Result<String> {
        quote_pg(ident)
    }

    fn render_type(&self, column_type: &ColumnType) -> Result<String> {
        let rendered = match &column_type.data_kind {
            DataKind::Boolean => "BOOLEAN".to_string(),
            DataKind::SmallInteger => "SMALLINT".to_string(),
            DataKind::Integer => "INTEGER".to_string(),
            DataKind::BigInteger => "BIGINT".to_string(),
            DataKind::Numeric => format!("NUMERIC{}", type_suffix(column_type)),
            DataKind::Float => "DOUBLE PRECISION".to_string(),
            DataKind::Text | DataKind::Unicode => match column_type.length {
                Some(_) if column_type.fixed_length => {
                    format!("CHAR{}", type_suffix(column_type))
                }
                Some(_) => format!("VARCHAR{}", type_suffix(column_type)),
                None => "TEXT".to_string(),
            },
            DataKind::Binary => "BYTEA".to_string(),
            DataKind::Date => "DATE".to_string(),
            DataKind::Time => "TIME".to_string(),
            DataKind::Timestamp => "TIMESTAMP".to_string(),
            DataKind::TimestampTz => "TIMESTAMPTZ".to_string(),
            DataKind::Uuid => "UUID".to_string(),
            DataKind::Json => "JSONB".to_string(),
            DataKind::Unknown(native) => native.clone(),
        };
        Ok(rendered)
    }

    fn auto_increment_clause(&self, auto_increment: &AutoIncrement) -> Result<String> {
        Ok(format!(
            "GENERATED BY DEFAULT AS IDENTITY (START WITH {} INCREMENT BY {})",
            auto_increment.initial, auto_increment.increment
        ))
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
        table: &Identifier,
        name: &str,
        target: &str,
    ) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME CONSTRAINT {} TO {}",
            self.qualified_name(table)?,
            self.quote(name)?,
            self.quote(target)?
        ))
    }

    fn rename_index_sql(&self, table: &Identifier, name: &str, target: &str) -> Result<String> {
        // Indexes are schema-scoped, not table-scoped.
        let qualified = match &table.schema {
            Some(schema) => format!("{}.{}", self.quote(schema)?, self.quote(name)?),
            None => self.quote(name)?,
        };
        Ok(format!(
            "ALTER INDEX {qualified} RENAME TO {}",
            self.quote(target)?
        ))
    }
}
