use crate::core::identifier::{quote_mssql, Identifier, NameResolution};
use crate::dialect::{type_suffix, Dialect};
use crate::error::Result;
use crate::schema::column::{AutoIncrement, ColumnType, DataKind};

/// SQL Server. Case-insensitive by default collation, so names compare
/// case-folded; the only dialect here with synonym support. Renames go
/// through `sp_rename`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    fn sp_rename(&self, object: &str, target: &str, kind: Option<&str>) -> String {
        match kind {
            Some(kind) => format!("EXEC sp_rename N'{object}', N'{target}', N'{kind}'"),
            None => format!("EXEC sp_rename N'{object}', N'{target}'"),
        }
    }

    fn object_path(&self, table: &Identifier) -> String {
        match &table.schema {
            Some(schema) => format!("{schema}.{}", table.local_name),
            None => table.local_name.clone(),
        }
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn resolution(&self) -> NameResolution {
        NameResolution::FoldLower
    }

    fn quote(&self, ident: &str) -> Result<String> {
        quote_mssql(ident)
    }

    fn supports_synonyms(&self) -> bool {
        true
    }

    fn supports_materialized_views(&self) -> bool {
        // Indexed views exist but are not CREATE MATERIALIZED VIEW.
        false
    }

    fn render_type(&self, column_type: &ColumnType) -> Result<String> {
        let rendered = match &column_type.data_kind {
            DataKind::Boolean => "BIT".to_string(),
            DataKind::SmallInteger => "SMALLINT".to_string(),
            DataKind::Integer => "INT".to_string(),
            DataKind::BigInteger => "BIGINT".to_string(),
            DataKind::Numeric => format!("DECIMAL{}", type_suffix(column_type)),
            DataKind::Float => "FLOAT".to_string(),
            DataKind::Text => match column_type.length {
                Some(_) if column_type.fixed_length => {
                    format!("CHAR{}", type_suffix(column_type))
                }
                Some(_) => format!("VARCHAR{}", type_suffix(column_type)),
                None => "VARCHAR(MAX)".to_string(),
            },
            DataKind::Unicode => match column_type.length {
                Some(_) if column_type.fixed_length => {
                    format!("NCHAR{}", type_suffix(column_type))
                }
                Some(_) => format!("NVARCHAR{}", type_suffix(column_type)),
                None => "NVARCHAR(MAX)".to_string(),
            },
            DataKind::Binary => match column_type.length {
                Some(_) => format!("VARBINARY{}", type_suffix(column_type)),
                None => "VARBINARY(MAX)".to_string(),
            },
            DataKind::Date => "DATE".to_string(),
            DataKind::Time => "TIME".to_string(),
            DataKind::Timestamp => "DATETIME2".to_string(),
            DataKind::TimestampTz => "DATETIMEOFFSET".to_string(),
            DataKind::Uuid => "UNIQUEIDENTIFIER".to_string(),
            DataKind::Json => "NVARCHAR(MAX)".to_string(),
            DataKind::Unknown(native) => native.clone(),
        };
        Ok(rendered)
    }

    fn auto_increment_clause(&self, auto_increment: &AutoIncrement) -> Result<String> {
        Ok(format!(
            "IDENTITY({},{})",
            auto_increment.initial, auto_increment.increment
        ))
    }

    fn rename_table_sql(&self, table: &Identifier, target: &Identifier) -> Result<String> {
        Ok(self.sp_rename(&self.object_path(table), &target.local_name, None))
    }

    fn rename_column_sql(&self, table: &Identifier, column: &str, target: &str) -> Result<String> {
        Ok(self.sp_rename(
            &format!("{}.{column}", self.object_path(table)),
            target,
            Some("COLUMN"),
        ))
    }

    fn rename_constraint_sql(
        &self,
        table: &Identifier,
        name: &str,
        target: &str,
    ) -> Result<String> {
        let schema_prefix = table
            .schema
            .as_ref()
            .map(|s| format!("{s}."))
            .unwrap_or_default();
        Ok(self.sp_rename(&format!("{schema_prefix}{name}"), target, Some("OBJECT")))
    }

    fn rename_index_sql(&self, table: &Identifier, name: &str, target: &str) -> Result<String> {
        Ok(self.sp_rename(
            &format!("{}.{name}", self.object_path(table)),
            target,
            Some("INDEX"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_types() {
        let d = MssqlDialect;
        let mut ty = ColumnType::of(DataKind::Unicode);
        ty.length = Some(50);
        assert_eq!(d.render_type(&ty).unwrap(), "NVARCHAR(50)");
        ty.fixed_length = true;
        assert_eq!(d.render_type(&ty).unwrap(), "NCHAR(50)");
        ty.length = None;
        ty.fixed_length = false;
        assert_eq!(d.render_type(&ty).unwrap(), "NVARCHAR(MAX)");
    }

    #[test]
    fn test_renames_use_sp_rename() {
        let d = MssqlDialect;
        let table = Identifier::with_schema("dbo", "orders").unwrap();
        assert_eq!(
            d.rename_index_sql(&table, "ix_a", "ix_b").unwrap(),
            "EXEC sp_rename N'dbo.orders.ix_a', N'ix_b', N'INDEX'"
        );
        assert_eq!(
            d.rename_constraint_sql(&table, "pk_orders", "pk_orders_v2").unwrap(),
            "EXEC sp_rename N'dbo.pk_orders', N'pk_orders_v2', N'OBJECT'"
        );
    }

    #[test]
    fn test_identity_clause() {
        let d = MssqlDialect;
        let clause = d
            .auto_increment_clause(&AutoIncrement {
                initial: 1,
                increment: 1,
            })
            .unwrap();
        assert_eq!(clause, "IDENTITY(1,1)");
    }
}
