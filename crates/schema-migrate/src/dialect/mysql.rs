use crate::core::identifier::{quote_mysql, Identifier, NameResolution};
use crate::dialect::{type_suffix, Dialect};
use crate::error::{Result, SchemaError};
use crate::schema::column::{AutoIncrement, ColumnType, DataKind};

/// MySQL / MariaDB. No sequences, no synonyms, no materialized views;
/// identifiers compare case-folded on the common lower_case_table_names
/// configurations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn resolution(&self) -> NameResolution {
        NameResolution::FoldLower
    }

    fn quote(&self, ident: &str) -> Result<String> {
        quote_mysql(ident)
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn supports_materialized_views(&self) -> bool {
        false
    }

    fn render_type(&self, column_type: &ColumnType) -> Result<String> {
        let rendered = match &column_type.data_kind {
            DataKind::Boolean => "TINYINT(1)".to_string(),
            DataKind::SmallInteger => "SMALLINT".to_string(),
            DataKind::Integer => "INT".to_string(),
            DataKind::BigInteger => "BIGINT".to_string(),
            DataKind::Numeric => format!("DECIMAL{}", type_suffix(column_type)),
            DataKind::Float => "DOUBLE".to_string(),
            DataKind::Text | DataKind::Unicode => match column_type.length {
                Some(_) if column_type.fixed_length => {
                    format!("CHAR{}", type_suffix(column_type))
                }
                Some(_) => format!("VARCHAR{}", type_suffix(column_type)),
                None => "LONGTEXT".to_string(),
            },
            DataKind::Binary => match column_type.length {
                Some(_) => format!("VARBINARY{}", type_suffix(column_type)),
                None => "LONGBLOB".to_string(),
            },
            DataKind::Date => "DATE".to_string(),
            DataKind::Time => "TIME".to_string(),
            DataKind::Timestamp => "DATETIME".to_string(),
            DataKind::TimestampTz => "TIMESTAMP".to_string(),
            DataKind::Uuid => "CHAR(36)".to_string(),
            DataKind::Json => "JSON".to_string(),
            DataKind::Unknown(native) => native.clone(),
        };
        Ok(rendered)
    }

    fn auto_increment_clause(&self, auto_increment: &AutoIncrement) -> Result<String> {
        if auto_increment.increment != 1 {
            return Err(SchemaError::unsupported(
                self.name(),
                "auto-increment step other than 1",
            ));
        }
        Ok("AUTO_INCREMENT".to_string())
    }

    fn rename_table_sql(&self, table: &Identifier, target: &Identifier) -> Result<String> {
        Ok(format!(
            "RENAME TABLE {} TO {}",
            self.qualified_name(table)?,
            self.qualified_name(target)?
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

    fn rename_index_sql(&self, table: &Identifier, name: &str, target: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME INDEX {} TO {}",
            self.qualified_name(table)?,
            self.quote(name)?,
            self.quote(target)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let d = MysqlDialect;
        assert!(!d.supports_sequences());
        assert!(!d.supports_synonyms());
    }

    #[test]
    fn test_constraint_rename_is_unsupported() {
        let d = MysqlDialect;
        let table = Identifier::with_schema("app", "orders").unwrap();
        let err = d.rename_constraint_sql(&table, "ck_a", "ck_b").unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported { .. }));
    }

    #[test]
    fn test_rename_index() {
        let d = MysqlDialect;
        let table = Identifier::with_schema("app", "orders").unwrap();
        assert_eq!(
            d.rename_index_sql(&table, "ix_a", "ix_b").unwrap(),
            "ALTER TABLE `app`.`orders` RENAME INDEX `ix_a` TO `ix_b`"
        );
    }
}
