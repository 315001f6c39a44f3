//! DDL rendering for migration plans.
//!
//! [`GenericSqlGenerator`] turns operations into statements using only the
//! [`Dialect`] hooks, so it renders the syntax the dialects have in
//! common. Operations a dialect cannot express fail with `Unsupported`
//! rather than producing wrong SQL.

use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{Result, SchemaError};
use crate::operations::MigrationOperation;
use crate::schema::column::Column;
use crate::schema::objects::{Sequence, View};
use crate::schema::table::{
    Index, Key, RelationalKey, Table, Trigger, TriggerEvent, TriggerTiming,
};

pub trait SqlGenerator: Send + Sync {
    fn generate(&self, operations: &[MigrationOperation]) -> Result<Vec<String>>;
}

pub struct GenericSqlGenerator {
    dialect: Arc<dyn Dialect>,
}

impl GenericSqlGenerator {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self { dialect }
    }

    fn column_def(&self, column: &Column) -> Result<String> {
        let mut def = format!(
            "{} {}",
            self.dialect.quote(&column.name)?,
            self.dialect.render_type(&column.column_type)?
        );
        if let Some(auto) = &column.auto_increment {
            def.push(' ');
            def.push_str(&self.dialect.auto_increment_clause(auto)?);
        }
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default_value {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        Ok(def)
    }

    fn column_list(&self, columns: &[String]) -> Result<String> {
        let quoted = columns
            .iter()
            .map(|c| self.dialect.quote(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(quoted.join(", "))
    }

    fn key_constraint(&self, key: &Key, kind_sql: &str) -> Result<String> {
        let columns = self.column_list(&key.columns)?;
        Ok(match &key.name {
            Some(name) => format!(
                "CONSTRAINT {} {kind_sql} ({columns})",
                self.dialect.quote(name)?
            ),
            None => format!("{kind_sql} ({columns})"),
        })
    }

    fn create_table(&self, table: &Table) -> Result<String> {
        let mut parts = Vec::with_capacity(table.columns.len() + 4);
        for column in &table.columns {
            parts.push(format!("    {}", self.column_def(column)?));
        }
        if let Some(pk) = &table.primary_key {
            parts.push(format!("    {}", self.key_constraint(pk, "PRIMARY KEY")?));
        }
        for unique in &table.unique_keys {
            parts.push(format!("    {}", self.key_constraint(unique, "UNIQUE")?));
        }
        for check in &table.checks {
            let constraint = match &check.name {
                Some(name) => format!(
                    "    CONSTRAINT {} CHECK ({})",
                    self.dialect.quote(name)?,
                    check.definition
                ),
                None => format!("    CHECK ({})", check.definition),
            };
            parts.push(constraint);
        }
        Ok(format!(
            "CREATE TABLE {} (\n{}\n)",
            self.dialect.qualified_name(&table.name)?,
            parts.join(",\n")
        ))
    }

    fn add_foreign_key(&self, key: &RelationalKey) -> Result<String> {
        let name = key.child_key.name.as_ref().ok_or_else(|| {
            SchemaError::invalid_argument(format!(
                "foreign key on {} has no constraint name",
                key.child_table
            ))
        })?;
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.dialect.qualified_name(&key.child_table)?,
            self.dialect.quote(name)?,
            self.column_list(&key.child_key.columns)?,
            self.dialect.qualified_name(&key.parent_table)?,
            self.column_list(&key.parent_key.columns)?,
            key.delete_action.as_sql(),
            key.update_action.as_sql(),
        ))
    }

    fn create_index(
        &self,
        table: &crate::core::identifier::Identifier,
        index: &Index,
    ) -> Result<String> {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let columns = index
            .columns
            .iter()
            .map(|c| {
                let quoted = self.dialect.quote(&c.expression)?;
                Ok(match c.order {
                    crate::schema::table::IndexOrder::Ascending => quoted,
                    crate::schema::table::IndexOrder::Descending => format!("{quoted} DESC"),
                })
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let mut sql = format!(
            "CREATE {unique}INDEX {} ON {} ({columns})",
            self.dialect.quote(&index.name)?,
            self.dialect.qualified_name(table)?,
        );
        if !index.included_columns.is_empty() {
            sql.push_str(&format!(
                " INCLUDE ({})",
                self.column_list(&index.included_columns)?
            ));
        }
        Ok(sql)
    }

    fn create_trigger(
        &self,
        table: &crate::core::identifier::Identifier,
        trigger: &Trigger,
    ) -> Result<String> {
        let timing = match trigger.timing {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD OF",
        };
        let events = trigger
            .events
            .events()
            .iter()
            .map(|e| match e {
                TriggerEvent::Insert => "INSERT",
                TriggerEvent::Update => "UPDATE",
                TriggerEvent::Delete => "DELETE",
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        Ok(format!(
            "CREATE TRIGGER {} {timing} {events} ON {}\n{}",
            self.dialect.quote(&trigger.name)?,
            self.dialect.qualified_name(table)?,
            trigger.definition,
        ))
    }

    fn create_view(&self, view: &View) -> Result<String> {
        let keyword = if view.materialized {
            if !self.dialect.supports_materialized_views() {
                return Err(SchemaError::unsupported(
                    self.dialect.name(),
                    "materialized views",
                ));
            }
            "MATERIALIZED VIEW"
        } else {
            "VIEW"
        };
        Ok(format!(
            "CREATE {keyword} {} AS\n{}",
            self.dialect.qualified_name(&view.name)?,
            view.definition,
        ))
    }

    fn sequence_clauses(&self, sequence: &Sequence) -> String {
        let mut sql = format!(
            "START WITH {} INCREMENT BY {}",
            sequence.start, sequence.increment
        );
        if let Some(min) = sequence.min_value {
            sql.push_str(&format!(" MINVALUE {min}"));
        }
        if let Some(max) = sequence.max_value {
            sql.push_str(&format!(" MAXVALUE {max}"));
        }
        if sequence.cycle {
            sql.push_str(" CYCLE");
        }
        sql.push_str(&format!(" CACHE {}", sequence.cache));
        sql
    }

    fn require_sequences(&self) -> Result<()> {
        if !self.dialect.supports_sequences() {
            return Err(SchemaError::unsupported(self.dialect.name(), "sequences"));
        }
        Ok(())
    }

    fn require_synonyms(&self) -> Result<()> {
        if !self.dialect.supports_synonyms() {
            return Err(SchemaError::unsupported(self.dialect.name(), "synonyms"));
        }
        Ok(())
    }

    fn render(&self, operation: &MigrationOperation) -> Result<String> {
        let d = &self.dialect;
        let sql = match operation {
            MigrationOperation::CreateTable { table } => self.create_table(table)?,
            MigrationOperation::DropTable { table } => {
                format!("DROP TABLE {}", d.qualified_name(table)?)
            }
            MigrationOperation::RenameTable { table, target_name } => {
                d.rename_table_sql(table, target_name)?
            }
            MigrationOperation::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                d.qualified_name(table)?,
                self.column_def(column)?
            ),
            MigrationOperation::DropColumn { table, column } => format!(
                "ALTER TABLE {} DROP COLUMN {}",
                d.qualified_name(table)?,
                d.quote(column)?
            ),
            MigrationOperation::AlterColumn { table, column } => format!(
                "ALTER TABLE {} ALTER COLUMN {}",
                d.qualified_name(table)?,
                self.column_def(column)?
            ),
            MigrationOperation::RenameColumn {
                table,
                column,
                target_name,
            } => d.rename_column_sql(table, column, target_name)?,
            MigrationOperation::AddPrimaryKey { table, key } => format!(
                "ALTER TABLE {} ADD {}",
                d.qualified_name(table)?,
                self.key_constraint(key, "PRIMARY KEY")?
            ),
            MigrationOperation::DropPrimaryKey { table, name } => {
                let name = name.as_ref().ok_or_else(|| {
                    SchemaError::invalid_argument(format!(
                        "primary key on {table} has no constraint name to drop"
                    ))
                })?;
                format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    d.qualified_name(table)?,
                    d.quote(name)?
                )
            }
            MigrationOperation::RenamePrimaryKey {
                table,
                name,
                target_name,
            }
            | MigrationOperation::RenameUniqueKey {
                table,
                name,
                target_name,
            }
            | MigrationOperation::RenameForeignKey {
                table,
                name,
                target_name,
            }
            | MigrationOperation::RenameCheck {
                table,
                name,
                target_name,
            } => d.rename_constraint_sql(table, name, target_name)?,
            MigrationOperation::AddUniqueKey { table, key } => format!(
                "ALTER TABLE {} ADD {}",
                d.qualified_name(table)?,
                self.key_constraint(key, "UNIQUE")?
            ),
            MigrationOperation::DropUniqueKey { table, name }
            | MigrationOperation::DropForeignKey { table, name }
            | MigrationOperation::DropCheck { table, name } => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                d.qualified_name(table)?,
                d.quote(name)?
            ),
            MigrationOperation::AddForeignKey { key } => self.add_foreign_key(key)?,
            MigrationOperation::AddCheck { table, check } => {
                let constraint = match &check.name {
                    Some(name) => {
                        format!("CONSTRAINT {} CHECK ({})", d.quote(name)?, check.definition)
                    }
                    None => format!("CHECK ({})", check.definition),
                };
                format!("ALTER TABLE {} ADD {constraint}", d.qualified_name(table)?)
            }
            MigrationOperation::CreateIndex { table, index } => self.create_index(table, index)?,
            MigrationOperation::DropIndex { name, .. } => {
                format!("DROP INDEX {}", d.quote(name)?)
            }
            MigrationOperation::RenameIndex {
                table,
                name,
                target_name,
            } => d.rename_index_sql(table, name, target_name)?,
            MigrationOperation::CreateTrigger { table, trigger } => {
                self.create_trigger(table, trigger)?
            }
            MigrationOperation::DropTrigger { table, name } => format!(
                "DROP TRIGGER {} ON {}",
                d.quote(name)?,
                d.qualified_name(table)?
            ),
            MigrationOperation::CreateView { view } => self.create_view(view)?,
            MigrationOperation::DropView { view } => {
                format!("DROP VIEW {}", d.qualified_name(view)?)
            }
            MigrationOperation::CreateSequence { sequence } => {
                self.require_sequences()?;
                format!(
                    "CREATE SEQUENCE {} {}",
                    d.qualified_name(&sequence.name)?,
                    self.sequence_clauses(sequence)
                )
            }
            MigrationOperation::DropSequence { sequence } => {
                self.require_sequences()?;
                format!("DROP SEQUENCE {}", d.qualified_name(sequence)?)
            }
            MigrationOperation::AlterSequence { sequence } => {
                self.require_sequences()?;
                format!(
                    "ALTER SEQUENCE {} {}",
                    d.qualified_name(&sequence.name)?,
                    self.sequence_clauses(sequence)
                )
            }
            MigrationOperation::CreateSynonym { synonym } => {
                self.require_synonyms()?;
                format!(
                    "CREATE SYNONYM {} FOR {}",
                    d.qualified_name(&synonym.name)?,
                    d.qualified_name(&synonym.target)?
                )
            }
            MigrationOperation::DropSynonym { synonym } => {
                self.require_synonyms()?;
                format!("DROP SYNONYM {}", d.qualified_name(synonym)?)
            }
            MigrationOperation::CreateRoutine { routine } => routine.definition.clone(),
            MigrationOperation::DropRoutine { routine } => {
                format!("DROP ROUTINE {}", d.qualified_name(routine)?)
            }
            MigrationOperation::Sql { sql } => sql.clone(),
        };
        Ok(sql)
    }
}

impl SqlGenerator for GenericSqlGenerator {
    fn generate(&self, operations: &[MigrationOperation]) -> Result<Vec<String>> {
        operations.iter().map(|op| self.render(op)).collect()
    }
}
