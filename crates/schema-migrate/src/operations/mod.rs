//! Migration operation model.
//!
//! A migration plan is a flat list of [`MigrationOperation`] values. The
//! set of operations is closed; consumers match exhaustively so adding a
//! variant is a compile-time visible change everywhere it matters.

pub mod registry;
pub mod sorter;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::identifier::Identifier;
use crate::error::{Result, SchemaError};
use crate::schema::column::Column;
use crate::schema::objects::{Routine, Sequence, Synonym, View};
use crate::schema::table::{CheckConstraint, Index, Key, RelationalKey, Table, Trigger};

/// A single step in a migration plan.
///
/// Variants carrying a full object (`CreateTable`, `AlterColumn`, ...) hold
/// the desired end state; variants that only need to name their target
/// carry identifiers and constraint names. `Sql` is the escape hatch for
/// dialect rewrites that have no structured form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MigrationOperation {
    CreateTable { table: Table },
    DropTable { table: Identifier },
    RenameTable { table: Identifier, target_name: Identifier },

    AddColumn { table: Identifier, column: Column },
    DropColumn { table: Identifier, column: String },
    AlterColumn { table: Identifier, column: Column },
    RenameColumn { table: Identifier, column: String, target_name: String },

    AddPrimaryKey { table: Identifier, key: Key },
    DropPrimaryKey { table: Identifier, name: Option<String> },
    RenamePrimaryKey { table: Identifier, name: String, target_name: String },

    AddUniqueKey { table: Identifier, key: Key },
    DropUniqueKey { table: Identifier, name: String },
    RenameUniqueKey { table: Identifier, name: String, target_name: String },

    AddForeignKey { key: RelationalKey },
    DropForeignKey { table: Identifier, name: String },
    RenameForeignKey { table: Identifier, name: String, target_name: String },

    AddCheck { table: Identifier, check: CheckConstraint },
    DropCheck { table: Identifier, name: String },
    RenameCheck { table: Identifier, name: String, target_name: String },

    CreateIndex { table: Identifier, index: Index },
    DropIndex { table: Identifier, name: String },
    RenameIndex { table: Identifier, name: String, target_name: String },

    CreateTrigger { table: Identifier, trigger: Trigger },
    DropTrigger { table: Identifier, name: String },

    CreateView { view: View },
    DropView { view: Identifier },

    CreateSequence { sequence: Sequence },
    DropSequence { sequence: Identifier },
    AlterSequence { sequence: Sequence },

    CreateSynonym { synonym: Synonym },
    DropSynonym { synonym: Identifier },

    CreateRoutine { routine: Routine },
    DropRoutine { routine: Identifier },

    Sql { sql: String },
}

/// Discriminant tag for [`MigrationOperation`], used to key analyzer
/// registration and the sorter's phase table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateTable,
    DropTable,
    RenameTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    RenameColumn,
    AddPrimaryKey,
    DropPrimaryKey,
    RenamePrimaryKey,
    AddUniqueKey,
    DropUniqueKey,
    RenameUniqueKey,
    AddForeignKey,
    DropForeignKey,
    RenameForeignKey,
    AddCheck,
    DropCheck,
    RenameCheck,
    CreateIndex,
    DropIndex,
    RenameIndex,
    CreateTrigger,
    DropTrigger,
    CreateView,
    DropView,
    CreateSequence,
    DropSequence,
    AlterSequence,
    CreateSynonym,
    DropSynonym,
    CreateRoutine,
    DropRoutine,
    Sql,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::CreateTable => "create_table",
            OperationKind::DropTable => "drop_table",
            OperationKind::RenameTable => "rename_table",
            OperationKind::AddColumn => "add_column",
            OperationKind::DropColumn => "drop_column",
            OperationKind::AlterColumn => "alter_column",
            OperationKind::RenameColumn => "rename_column",
            OperationKind::AddPrimaryKey => "add_primary_key",
            OperationKind::DropPrimaryKey => "drop_primary_key",
            OperationKind::RenamePrimaryKey => "rename_primary_key",
            OperationKind::AddUniqueKey => "add_unique_key",
            OperationKind::DropUniqueKey => "drop_unique_key",
            OperationKind::RenameUniqueKey => "rename_unique_key",
            OperationKind::AddForeignKey => "add_foreign_key",
            OperationKind::DropForeignKey => "drop_foreign_key",
            OperationKind::RenameForeignKey => "rename_foreign_key",
            OperationKind::AddCheck => "add_check",
            OperationKind::DropCheck => "drop_check",
            OperationKind::RenameCheck => "rename_check",
            OperationKind::CreateIndex => "create_index",
            OperationKind::DropIndex => "drop_index",
            OperationKind::RenameIndex => "rename_index",
            OperationKind::CreateTrigger => "create_trigger",
            OperationKind::DropTrigger => "drop_trigger",
            OperationKind::CreateView => "create_view",
            OperationKind::DropView => "drop_view",
            OperationKind::CreateSequence => "create_sequence",
            OperationKind::DropSequence => "drop_sequence",
            OperationKind::AlterSequence => "alter_sequence",
            OperationKind::CreateSynonym => "create_synonym",
            OperationKind::DropSynonym => "drop_synonym",
            OperationKind::CreateRoutine => "create_routine",
            OperationKind::DropRoutine => "drop_routine",
            OperationKind::Sql => "sql",
        };
        f.write_str(name)
    }
}

fn require_name(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::invalid_argument(format!(
            "{what} must not be blank"
        )));
    }
    Ok(())
}

fn require_distinct(name: &str, target: &str, what: &str) -> Result<()> {
    if name == target {
        return Err(SchemaError::invalid_argument(format!(
            "rename of {what} '{name}' targets the same name"
        )));
    }
    Ok(())
}

impl MigrationOperation {
    pub fn rename_table(table: Identifier, target_name: Identifier) -> Result<Self> {
        if table == target_name {
            return Err(SchemaError::invalid_argument(format!(
                "rename of table '{table}' targets the same name"
            )));
        }
        Ok(Self::RenameTable { table, target_name })
    }

    pub fn drop_column(table: Identifier, column: impl Into<String>) -> Result<Self> {
        let column = column.into();
        require_name(&column, "column name")?;
        Ok(Self::DropColumn { table, column })
    }

    pub fn rename_column(
        table: Identifier,
        column: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let column = column.into();
        let target_name = target_name.into();
        require_name(&column, "column name")?;
        require_name(&target_name, "column rename target")?;
        require_distinct(&column, &target_name, "column")?;
        Ok(Self::RenameColumn {
            table,
            column,
            target_name,
        })
    }

    pub fn rename_primary_key(
        table: Identifier,
        name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let (name, target_name) = Self::rename_pair(name, target_name, "primary key")?;
        Ok(Self::RenamePrimaryKey {
            table,
            name,
            target_name,
        })
    }

    pub fn drop_unique_key(table: Identifier, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_name(&name, "unique key name")?;
        Ok(Self::DropUniqueKey { table, name })
    }

    pub fn rename_unique_key(
        table: Identifier,
        name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let (name, target_name) = Self::rename_pair(name, target_name, "unique key")?;
        Ok(Self::RenameUniqueKey {
            table,
            name,
            target_name,
        })
    }

    pub fn drop_foreign_key(table: Identifier, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_name(&name, "foreign key name")?;
        Ok(Self::DropForeignKey { table, name })
    }

    pub fn rename_foreign_key(
        table: Identifier,
        name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let (name, target_name) = Self::rename_pair(name, target_name, "foreign key")?;
        Ok(Self::RenameForeignKey {
            table,
            name,
            target_name,
        })
    }

    pub fn drop_check(table: Identifier, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_name(&name, "check constraint name")?;
        Ok(Self::DropCheck { table, name })
    }

    pub fn rename_check(
        table: Identifier,
        name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let (name, target_name) = Self::rename_pair(name, target_name, "check constraint")?;
        Ok(Self::RenameCheck {
            table,
            name,
            target_name,
        })
    }

    pub fn drop_index(table: Identifier, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_name(&name, "index name")?;
        Ok(Self::DropIndex { table, name })
    }

    pub fn rename_index(
        table: Identifier,
        name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let (name, target_name) = Self::rename_pair(name, target_name, "index")?;
        Ok(Self::RenameIndex {
            table,
            name,
            target_name,
        })
    }

    pub fn drop_trigger(table: Identifier, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_name(&name, "trigger name")?;
        Ok(Self::DropTrigger { table, name })
    }

    pub fn sql(sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        require_name(&sql, "raw sql")?;
        Ok(Self::Sql { sql })
    }

    fn rename_pair(
        name: impl Into<String>,
        target_name: impl Into<String>,
        what: &str,
    ) -> Result<(String, String)> {
        let name = name.into();
        let target_name = target_name.into();
        require_name(&name, &format!("{what} name"))?;
        require_name(&target_name, &format!("{what} rename target"))?;
        require_distinct(&name, &target_name, what)?;
        Ok((name, target_name))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable { .. } => OperationKind::CreateTable,
            Self::DropTable { .. } => OperationKind::DropTable,
            Self::RenameTable { .. } => OperationKind::RenameTable,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::DropColumn { .. } => OperationKind::DropColumn,
            Self::AlterColumn { .. } => OperationKind::AlterColumn,
            Self::RenameColumn { .. } => OperationKind::RenameColumn,
            Self::AddPrimaryKey { .. } => OperationKind::AddPrimaryKey,
            Self::DropPrimaryKey { .. } => OperationKind::DropPrimaryKey,
            Self::RenamePrimaryKey { .. } => OperationKind::RenamePrimaryKey,
            Self::AddUniqueKey { .. } => OperationKind::AddUniqueKey,
            Self::DropUniqueKey { .. } => OperationKind::DropUniqueKey,
            Self::RenameUniqueKey { .. } => OperationKind::RenameUniqueKey,
            Self::AddForeignKey { .. } => OperationKind::AddForeignKey,
            Self::DropForeignKey { .. } => OperationKind::DropForeignKey,
            Self::RenameForeignKey { .. } => OperationKind::RenameForeignKey,
            Self::AddCheck { .. } => OperationKind::AddCheck,
            Self::DropCheck { .. } => OperationKind::DropCheck,
            Self::RenameCheck { .. } => OperationKind::RenameCheck,
            Self::CreateIndex { .. } => OperationKind::CreateIndex,
            Self::DropIndex { .. } => OperationKind::DropIndex,
            Self::RenameIndex { .. } => OperationKind::RenameIndex,
            Self::CreateTrigger { .. } => OperationKind::CreateTrigger,
            Self::DropTrigger { .. } => OperationKind::DropTrigger,
            Self::CreateView { .. } => OperationKind::CreateView,
            Self::DropView { .. } => OperationKind::DropView,
            Self::CreateSequence { .. } => OperationKind::CreateSequence,
            Self::DropSequence { .. } => OperationKind::DropSequence,
            Self::AlterSequence { .. } => OperationKind::AlterSequence,
            Self::CreateSynonym { .. } => OperationKind::CreateSynonym,
            Self::DropSynonym { .. } => OperationKind::DropSynonym,
            Self::CreateRoutine { .. } => OperationKind::CreateRoutine,
            Self::DropRoutine { .. } => OperationKind::DropRoutine,
            Self::Sql { .. } => OperationKind::Sql,
        }
    }

    /// True for operations that can lose data or break callers: every drop,
    /// every rename, and raw SQL (opaque, so assumed destructive).
    pub fn is_destructive(&self) -> bool {
        matches!(
            self.kind(),
            OperationKind::DropTable
                | OperationKind::RenameTable
                | OperationKind::DropColumn
                | OperationKind::RenameColumn
                | OperationKind::DropPrimaryKey
                | OperationKind::RenamePrimaryKey
                | OperationKind::DropUniqueKey
                | OperationKind::RenameUniqueKey
                | OperationKind::DropForeignKey
                | OperationKind::RenameForeignKey
                | OperationKind::DropCheck
                | OperationKind::RenameCheck
                | OperationKind::DropIndex
                | OperationKind::RenameIndex
                | OperationKind::DropTrigger
                | OperationKind::DropView
                | OperationKind::DropSequence
                | OperationKind::DropSynonym
                | OperationKind::DropRoutine
                | OperationKind::Sql
        )
    }

    /// One-line description for plan logging and reports.
    pub fn summary(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("create table {}", table.name),
            Self::DropTable { table } => format!("drop table {table}"),
            Self::RenameTable { table, target_name } => {
                format!("rename table {table} to {target_name}")
            }
            Self::AddColumn { table, column } => {
                format!("add column {}.{}", table, column.name)
            }
            Self::DropColumn { table, column } => format!("drop column {table}.{column}"),
            Self::AlterColumn { table, column } => {
                format!("alter column {}.{}", table, column.name)
            }
            Self::RenameColumn {
                table,
                column,
                target_name,
            } => format!("rename column {table}.{column} to {target_name}"),
            Self::AddPrimaryKey { table, .. } => format!("add primary key on {table}"),
            Self::DropPrimaryKey { table, .. } => format!("drop primary key on {table}"),
            Self::RenamePrimaryKey {
                table,
                name,
                target_name,
            } => format!("rename primary key {name} to {target_name} on {table}"),
            Self::AddUniqueKey { table, key } => format!(
                "add unique key {} on {table}",
                key.name.as_deref().unwrap_or("<unnamed>")
            ),
            Self::DropUniqueKey { table, name } => {
                format!("drop unique key {name} on {table}")
            }
            Self::RenameUniqueKey {
                table,
                name,
                target_name,
            } => format!("rename unique key {name} to {target_name} on {table}"),
            Self::AddForeignKey { key } => format!(
                "add foreign key {} on {}",
                key.child_key.name.as_deref().unwrap_or("<unnamed>"),
                key.child_table
            ),
            Self::DropForeignKey { table, name } => {
                format!("drop foreign key {name} on {table}")
            }
            Self::RenameForeignKey {
                table,
                name,
                target_name,
            } => format!("rename foreign key {name} to {target_name} on {table}"),
            Self::AddCheck { table, check } => format!(
                "add check {} on {table}",
                check.name.as_deref().unwrap_or("<unnamed>")
            ),
            Self::DropCheck { table, name } => format!("drop check {name} on {table}"),
            Self::RenameCheck {
                table,
                name,
                target_name,
            } => format!("rename check {name} to {target_name} on {table}"),
            Self::CreateIndex { table, index } => {
                format!("create index {} on {table}", index.name)
            }
            Self::DropIndex { table, name } => format!("drop index {name} on {table}"),
            Self::RenameIndex {
                table,
                name,
                target_name,
            } => format!("rename index {name} to {target_name} on {table}"),
            Self::CreateTrigger { table, trigger } => {
                format!("create trigger {} on {table}", trigger.name)
            }
            Self::DropTrigger { table, name } => format!("drop trigger {name} on {table}"),
            Self::CreateView { view } => format!("create view {}", view.name),
            Self::DropView { view } => format!("drop view {view}"),
            Self::CreateSequence { sequence } => format!("create sequence {}", sequence.name),
            Self::DropSequence { sequence } => format!("drop sequence {sequence}"),
            Self::AlterSequence { sequence } => format!("alter sequence {}", sequence.name),
            Self::CreateSynonym { synonym } => {
                format!("create synonym {} for {}", synonym.name, synonym.target)
            }
            Self::DropSynonym { synonym } => format!("drop synonym {synonym}"),
            Self::CreateRoutine { routine } => format!("create routine {}", routine.name),
            Self::DropRoutine { routine } => format!("drop routine {routine}"),
            Self::Sql { sql } => {
                let line = sql.lines().next().unwrap_or("");
                format!("raw sql: {line}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::DataKind;

    fn table_id(name: &str) -> Identifier {
        Identifier::with_schema("public", name).unwrap()
    }

    // ========================================================================
    // Constructor validation
    // ========================================================================

    #[test]
    fn test_rename_table_rejects_same_name() {
        let id = table_id("orders");
        let err = MigrationOperation::rename_table(id.clone(), id).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArgument(_)));
    }

    #[test]
    fn test_rename_column_rejects_blank_target() {
        let err =
            MigrationOperation::rename_column(table_id("orders"), "total", "  ").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArgument(_)));
    }

    #[test]
    fn test_drop_index_rejects_blank_name() {
        let err = MigrationOperation::drop_index(table_id("orders"), "").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArgument(_)));
    }

    #[test]
    fn test_rename_primary_key_valid() {
        let op =
            MigrationOperation::rename_primary_key(table_id("orders"), "pk_old", "pk_new")
                .unwrap();
        assert_eq!(op.kind(), OperationKind::RenamePrimaryKey);
        assert!(op.is_destructive());
    }

    #[test]
    fn test_sql_rejects_blank() {
        assert!(MigrationOperation::sql("   ").is_err());
        assert!(MigrationOperation::sql("select 1").is_ok());
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_adds_and_creates_are_not_destructive() {
        let add = MigrationOperation::AddColumn {
            table: table_id("orders"),
            column: Column::nullable("note", DataKind::Text),
        };
        assert!(!add.is_destructive());
        assert_eq!(add.kind(), OperationKind::AddColumn);

        let drop = MigrationOperation::drop_column(table_id("orders"), "note").unwrap();
        assert!(drop.is_destructive());
    }

    #[test]
    fn test_raw_sql_is_destructive() {
        let op = MigrationOperation::sql("update orders set total = 0").unwrap();
        assert!(op.is_destructive());
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    #[test]
    fn test_operation_json_round_trip_with_tag() {
        let op = MigrationOperation::rename_index(table_id("orders"), "ix_a", "ix_b").unwrap();
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"rename_index\""));
        let back: MigrationOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }

    #[test]
    fn test_summary_mentions_object_names() {
        let op = MigrationOperation::rename_column(table_id("orders"), "total", "amount")
            .unwrap();
        let text = op.summary();
        assert!(text.contains("total"));
        assert!(text.contains("amount"));
        assert!(text.contains("orders"));
    }
}
