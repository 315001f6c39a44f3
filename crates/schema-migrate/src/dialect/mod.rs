//! Dialect capability boundary.
//!
//! A [`Dialect`] answers the questions the generator and analyzers ask of
//! a target database: how to quote, how names resolve, which features
//! exist, how a portable column type spells itself. Implementations are
//! stateless and registered in a [`DialectCatalog`] by the caller.

mod catalog;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use catalog::DialectCatalog;
pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::core::identifier::{Identifier, NameResolution};
use crate::error::Result;
use crate::schema::column::{AutoIncrement, ColumnType};

pub trait Dialect: Send + Sync {
    /// Catalog key, lowercase.
    fn name(&self) -> &'static str;

    /// How this dialect resolves unquoted identifiers.
    fn resolution(&self) -> NameResolution;

    /// Quote a single identifier part. Fails on names the dialect cannot
    /// represent (empty, embedded NUL, over-long).
    fn quote(&self, ident: &str) -> Result<String>;

    /// Quote and join the schema-qualified form of an identifier. Server
    /// and database parts are deployment location, not object identity,
    /// and are never rendered.
    fn qualified_name(&self, id: &Identifier) -> Result<String> {
        Ok(match &id.schema {
            Some(schema) => format!("{}.{}", self.quote(schema)?, self.quote(&id.local_name)?),
            None => self.quote(&id.local_name)?,
        })
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn supports_synonyms(&self) -> bool {
        false
    }

    fn supports_materialized_views(&self) -> bool {
        true
    }

    /// Render a portable column type as this dialect's type name.
    fn render_type(&self, column_type: &ColumnType) -> Result<String>;

    /// Column-level auto-increment clause.
    fn auto_increment_clause(&self, auto_increment: &AutoIncrement) -> Result<String>;

    /// `ALTER ... RENAME` statement for a table.
    fn rename_table_sql(&self, table: &Identifier, target: &Identifier) -> Result<String>;

    /// Rename a column in place.
    fn rename_column_sql(
        &self,
        table: &Identifier,
        column: &str,
        target: &str,
    ) -> Result<String>;

    /// Rename a table-level constraint (primary key, unique key, foreign
    /// key, check).
    fn rename_constraint_sql(
        &self,
        table: &Identifier,
        name: &str,
        target: &str,
    ) -> Result<String>;

    /// Rename an index.
    fn rename_index_sql(&self, table: &Identifier, name: &str, target: &str) -> Result<String>;
}

/// Parenthesized length/precision suffix shared by several dialects.
pub(crate) fn type_suffix(column_type: &ColumnType) -> String {
    if let Some(length) = column_type.length {
        return format!("({length})");
    }
    match (column_type.precision, column_type.scale) {
        (Some(p), Some(s)) => format!("({p},{s})"),
        (Some(p), None) => format!("({p})"),
        _ => String::new(),
    }
}
