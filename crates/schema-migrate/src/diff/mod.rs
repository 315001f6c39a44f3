//! Structural diffing of two schema snapshots.
//!
//! The differ pairs objects across snapshots by resolved name and emits
//! the smallest operation it can model for each difference: an add for a
//! new column, a rename when only the name of a constraint changed, a
//! drop-and-create where in-place alteration is not expressible. Output
//! order is by object kind; callers run the plan through
//! [`OperationSorter`](crate::operations::sorter::OperationSorter) before
//! execution.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::compare::{ComparerSuite, StructuralComparer};
use crate::core::identifier::NameResolution;
use crate::error::{Result, SchemaError};
use crate::operations::MigrationOperation;
use crate::schema::snapshot::DatabaseSnapshot;
use crate::schema::table::{Key, Table};

/// Diffs a source (current) snapshot against a target (desired) snapshot.
///
/// Objects present only in the target become creates, objects present only
/// in the source become drops, and objects present in both are compared
/// member by member. No rename inference is done for tables or columns;
/// pairing is strictly by resolved name. Named constraints and indexes do
/// get rename detection: an unmatched source/target pair that is equal in
/// everything but its name becomes a single rename operation.
pub struct SchemaDiffer {
    comparers: ComparerSuite,
}

/// Pairing of one named sub-collection (keys, checks, indexes) across the
/// two sides of a table diff.
struct NamedPairing<'a, T> {
    altered: Vec<(&'a T, &'a T)>,
    renamed: Vec<(&'a T, &'a T)>,
    added: Vec<&'a T>,
    dropped: Vec<&'a T>,
}

impl SchemaDiffer {
    pub fn new(resolution: NameResolution) -> Self {
        Self {
            comparers: ComparerSuite::new(resolution),
        }
    }

    pub fn with_comparers(comparers: ComparerSuite) -> Self {
        Self { comparers }
    }

    /// Compute the operations that transform `source` into `target`.
    pub fn diff(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        cancel: &CancellationToken,
    ) -> Result<Vec<MigrationOperation>> {
        let mut ops = Vec::new();

        self.diff_tables(source, target, cancel, &mut ops)?;
        self.checkpoint(cancel)?;
        self.diff_views(source, target, &mut ops);
        self.diff_sequences(source, target, &mut ops);
        self.diff_synonyms(source, target, &mut ops);
        self.diff_routines(source, target, &mut ops);

        debug!(operations = ops.len(), "diff complete");
        Ok(ops)
    }

    fn checkpoint(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        Ok(())
    }

    // ========================================================================
    // Tables
    // ========================================================================

    fn diff_tables(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        cancel: &CancellationToken,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        for target_table in &target.tables {
            self.checkpoint(cancel)?;
            match source.table(&target_table.name) {
                None => self.create_table_ops(target_table, ops),
                Some(source_table) => {
                    if !self.comparers.tables.equals(source_table, target_table) {
                        self.diff_one_table(source_table, target_table, ops)?;
                    }
                }
            }
        }

        for source_table in &source.tables {
            self.checkpoint(cancel)?;
            if target.table(&source_table.name).is_none() {
                self.drop_table_ops(source_table, ops)?;
            }
        }
        Ok(())
    }

    /// A new table: the create carries columns, keys, and checks; indexes,
    /// triggers, and outgoing foreign keys become separate operations so
    /// the sorter can place them after every table create.
    fn create_table_ops(&self, table: &Table, ops: &mut Vec<MigrationOperation>) {
        let mut stripped = table.clone();
        let indexes = std::mem::take(&mut stripped.indexes);
        let triggers = std::mem::take(&mut stripped.triggers);
        let parent_keys = std::mem::take(&mut stripped.parent_keys);
        stripped.child_keys.clear();

        ops.push(MigrationOperation::CreateTable { table: stripped });
        for key in parent_keys {
            ops.push(MigrationOperation::AddForeignKey { key });
        }
        for index in indexes {
            ops.push(MigrationOperation::CreateIndex {
                table: table.name.clone(),
                index,
            });
        }
        for trigger in triggers {
            ops.push(MigrationOperation::CreateTrigger {
                table: table.name.clone(),
                trigger,
            });
        }
    }

    /// A dropped table: dependent objects are dropped explicitly first —
    /// its triggers and indexes, plus incoming foreign keys from other
    /// tables, which would otherwise block the table drop.
    fn drop_table_ops(&self, table: &Table, ops: &mut Vec<MigrationOperation>) -> Result<()> {
        for trigger in &table.triggers {
            ops.push(MigrationOperation::drop_trigger(
                table.name.clone(),
                &trigger.name,
            )?);
        }
        for index in &table.indexes {
            ops.push(MigrationOperation::drop_index(
                table.name.clone(),
                &index.name,
            )?);
        }
        for incoming in &table.child_keys {
            if let Some(name) = &incoming.child_key.name {
                ops.push(MigrationOperation::drop_foreign_key(
                    incoming.child_table.clone(),
                    name,
                )?);
            }
        }
        ops.push(MigrationOperation::DropTable {
            table: table.name.clone(),
        });
        Ok(())
    }

    fn diff_one_table(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        self.diff_columns(source, target, ops)?;
        self.diff_primary_key(source, target, ops)?;
        self.diff_unique_keys(source, target, ops)?;
        self.diff_checks(source, target, ops)?;
        self.diff_indexes(source, target, ops)?;
        self.diff_foreign_keys(source, target, ops)?;
        self.diff_triggers(source, target, ops)?;
        Ok(())
    }

    /// Columns pair strictly by resolved name; a column that changed name
    /// reads as a drop plus an add.
    fn diff_columns(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let names = self.comparers.names;
        for target_column in &target.columns {
            let matched = source
                .columns
                .iter()
                .find(|c| names.names_equal(&c.name, &target_column.name));
            match matched {
                None => ops.push(MigrationOperation::AddColumn {
                    table: target.name.clone(),
                    column: target_column.clone(),
                }),
                Some(source_column) => {
                    if !self.comparers.columns.equals(source_column, target_column) {
                        ops.push(MigrationOperation::AlterColumn {
                            table: target.name.clone(),
                            column: target_column.clone(),
                        });
                    }
                }
            }
        }
        for source_column in &source.columns {
            let gone = !target
                .columns
                .iter()
                .any(|c| names.names_equal(&c.name, &source_column.name));
            if gone {
                ops.push(MigrationOperation::drop_column(
                    source.name.clone(),
                    &source_column.name,
                )?);
            }
        }
        Ok(())
    }

    fn diff_primary_key(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        match (&source.primary_key, &target.primary_key) {
            (None, None) => {}
            (None, Some(pk)) => ops.push(MigrationOperation::AddPrimaryKey {
                table: target.name.clone(),
                key: pk.clone(),
            }),
            (Some(pk), None) => ops.push(MigrationOperation::DropPrimaryKey {
                table: source.name.clone(),
                name: pk.name.clone(),
            }),
            (Some(src), Some(tgt)) => {
                if self.comparers.keys.equals(src, tgt) {
                    return Ok(());
                }
                if let (Some(src_name), Some(tgt_name)) =
                    (&src.name, &tgt.name)
                {
                    if self.comparers.keys.equals_ignoring_name(src, tgt) {
                        ops.push(MigrationOperation::rename_primary_key(
                            target.name.clone(),
                            src_name,
                            tgt_name,
                        )?);
                        return Ok(());
                    }
                }
                ops.push(MigrationOperation::DropPrimaryKey {
                    table: source.name.clone(),
                    name: src.name.clone(),
                });
                ops.push(MigrationOperation::AddPrimaryKey {
                    table: target.name.clone(),
                    key: tgt.clone(),
                });
            }
        }
        Ok(())
    }

    fn diff_unique_keys(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let keys = &self.comparers.keys;
        let pairing = self.pair_named(
            &source.unique_keys,
            &target.unique_keys,
            |k: &Key| k.name.as_deref(),
            |a, b| keys.equals(a, b),
            |a, b| keys.equals_ignoring_name(a, b),
        );
        for (src, tgt) in pairing.renamed {
            // Both sides are named or they would not have paired as renames.
            if let (Some(src_name), Some(tgt_name)) = (&src.name, &tgt.name) {
                ops.push(MigrationOperation::rename_unique_key(
                    target.name.clone(),
                    src_name,
                    tgt_name,
                )?);
            }
        }
        for (src, tgt) in pairing.altered {
            if let Some(name) = &src.name {
                ops.push(MigrationOperation::drop_unique_key(
                    source.name.clone(),
                    name,
                )?);
            }
            ops.push(MigrationOperation::AddUniqueKey {
                table: target.name.clone(),
                key: tgt.clone(),
            });
        }
        for tgt in pairing.added {
            ops.push(MigrationOperation::AddUniqueKey {
                table: target.name.clone(),
                key: tgt.clone(),
            });
        }
        for src in pairing.dropped {
            if let Some(name) = &src.name {
                ops.push(MigrationOperation::drop_unique_key(
                    source.name.clone(),
                    name,
                )?);
            }
        }
        Ok(())
    }

    fn diff_checks(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let checks = &self.comparers.checks;
        let pairing = self.pair_named(
            &source.checks,
            &target.checks,
            |c| c.name.as_deref(),
            |a, b| checks.equals(a, b),
            |a, b| checks.equals_ignoring_name(a, b),
        );
        for (src, tgt) in pairing.renamed {
            if let (Some(src_name), Some(tgt_name)) = (&src.name, &tgt.name) {
                ops.push(MigrationOperation::rename_check(
                    target.name.clone(),
                    src_name,
                    tgt_name,
                )?);
            }
        }
        for (src, tgt) in pairing.altered {
            if let Some(name) = &src.name {
                ops.push(MigrationOperation::drop_check(source.name.clone(), name)?);
            }
            ops.push(MigrationOperation::AddCheck {
                table: target.name.clone(),
                check: tgt.clone(),
            });
        }
        for tgt in pairing.added {
            ops.push(MigrationOperation::AddCheck {
                table: target.name.clone(),
                check: tgt.clone(),
            });
        }
        for src in pairing.dropped {
            if let Some(name) = &src.name {
                ops.push(MigrationOperation::drop_check(source.name.clone(), name)?);
            }
        }
        Ok(())
    }

    fn diff_indexes(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let indexes = &self.comparers.indexes;
        let pairing = self.pair_named(
            &source.indexes,
            &target.indexes,
            |i| Some(i.name.as_str()),
            |a, b| indexes.equals(a, b),
            |a, b| indexes.equals_ignoring_name(a, b),
        );
        for (src, tgt) in pairing.renamed {
            ops.push(MigrationOperation::rename_index(
                target.name.clone(),
                &src.name,
                &tgt.name,
            )?);
        }
        for (src, tgt) in pairing.altered {
            ops.push(MigrationOperation::drop_index(
                source.name.clone(),
                &src.name,
            )?);
            ops.push(MigrationOperation::CreateIndex {
                table: target.name.clone(),
                index: tgt.clone(),
            });
        }
        for tgt in pairing.added {
            ops.push(MigrationOperation::CreateIndex {
                table: target.name.clone(),
                index: tgt.clone(),
            });
        }
        for src in pairing.dropped {
            ops.push(MigrationOperation::drop_index(
                source.name.clone(),
                &src.name,
            )?);
        }
        Ok(())
    }

    fn diff_foreign_keys(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let fks = &self.comparers.relational_keys;
        let pairing = self.pair_named(
            &source.parent_keys,
            &target.parent_keys,
            |k| k.child_key.name.as_deref(),
            |a, b| fks.equals(a, b),
            |a, b| fks.equals_ignoring_name(a, b),
        );
        for (src, tgt) in pairing.renamed {
            if let (Some(src_name), Some(tgt_name)) =
                (&src.child_key.name, &tgt.child_key.name)
            {
                ops.push(MigrationOperation::rename_foreign_key(
                    target.name.clone(),
                    src_name,
                    tgt_name,
                )?);
            }
        }
        for (src, tgt) in pairing.altered {
            if let Some(name) = &src.child_key.name {
                ops.push(MigrationOperation::drop_foreign_key(
                    source.name.clone(),
                    name,
                )?);
            }
            ops.push(MigrationOperation::AddForeignKey { key: tgt.clone() });
        }
        for tgt in pairing.added {
            ops.push(MigrationOperation::AddForeignKey { key: tgt.clone() });
        }
        for src in pairing.dropped {
            if let Some(name) = &src.child_key.name {
                ops.push(MigrationOperation::drop_foreign_key(
                    source.name.clone(),
                    name,
                )?);
            }
        }
        Ok(())
    }

    /// Triggers have no in-place alter or rename; any change is a
    /// drop-and-create.
    fn diff_triggers(
        &self,
        source: &Table,
        target: &Table,
        ops: &mut Vec<MigrationOperation>,
    ) -> Result<()> {
        let names = self.comparers.names;
        for target_trigger in &target.triggers {
            let matched = source
                .triggers
                .iter()
                .find(|t| names.names_equal(&t.name, &target_trigger.name));
            match matched {
                None => ops.push(MigrationOperation::CreateTrigger {
                    table: target.name.clone(),
                    trigger: target_trigger.clone(),
                }),
                Some(source_trigger) => {
                    if !self.comparers.triggers.equals(source_trigger, target_trigger) {
                        ops.push(MigrationOperation::drop_trigger(
                            source.name.clone(),
                            &source_trigger.name,
                        )?);
                        ops.push(MigrationOperation::CreateTrigger {
                            table: target.name.clone(),
                            trigger: target_trigger.clone(),
                        });
                    }
                }
            }
        }
        for source_trigger in &source.triggers {
            let gone = !target
                .triggers
                .iter()
                .any(|t| names.names_equal(&t.name, &source_trigger.name));
            if gone {
                ops.push(MigrationOperation::drop_trigger(
                    source.name.clone(),
                    &source_trigger.name,
                )?);
            }
        }
        Ok(())
    }

    /// Pair members of a named sub-collection. Name matches come first;
    /// leftovers that are structurally equal apart from their name pair as
    /// renames; the rest are adds and drops. Unnamed members never pair by
    /// name and never pair as renames.
    fn pair_named<'a, T>(
        &self,
        source: &'a [T],
        target: &'a [T],
        name_of: impl Fn(&T) -> Option<&str>,
        equals: impl Fn(&T, &T) -> bool,
        equals_ignoring_name: impl Fn(&T, &T) -> bool,
    ) -> NamedPairing<'a, T> {
        let names = self.comparers.names;
        let mut pairing = NamedPairing {
            altered: Vec::new(),
            renamed: Vec::new(),
            added: Vec::new(),
            dropped: Vec::new(),
        };

        let mut unmatched_source: Vec<&T> = Vec::new();

        for src in source {
            let matched = name_of(src).and_then(|src_name| {
                target.iter().find(|tgt| {
                    name_of(tgt).is_some_and(|tgt_name| names.names_equal(src_name, tgt_name))
                })
            });
            match matched {
                Some(tgt) => {
                    if !equals(src, tgt) {
                        pairing.altered.push((src, tgt));
                    }
                }
                None => unmatched_source.push(src),
            }
        }

        for tgt in target {
            let name_matched = name_of(tgt).is_some_and(|tgt_name| {
                source.iter().any(|src| {
                    name_of(src).is_some_and(|src_name| names.names_equal(src_name, tgt_name))
                })
            });
            if name_matched {
                continue;
            }
            let rename = unmatched_source.iter().position(|src| {
                name_of(src).is_some()
                    && name_of(tgt).is_some()
                    && equals_ignoring_name(src, tgt)
            });
            match rename {
                Some(pos) => {
                    let src = unmatched_source.remove(pos);
                    pairing.renamed.push((src, tgt));
                }
                None => pairing.added.push(tgt),
            }
        }

        pairing.dropped.extend(unmatched_source);
        pairing
    }

    // ========================================================================
    // Non-table objects
    // ========================================================================

    fn diff_views(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        ops: &mut Vec<MigrationOperation>,
    ) {
        for target_view in &target.views {
            match source.view(&target_view.name) {
                None => ops.push(MigrationOperation::CreateView {
                    view: target_view.clone(),
                }),
                Some(source_view) => {
                    if !self.comparers.views.equals(source_view, target_view) {
                        ops.push(MigrationOperation::DropView {
                            view: source_view.name.clone(),
                        });
                        ops.push(MigrationOperation::CreateView {
                            view: target_view.clone(),
                        });
                    }
                }
            }
        }
        for source_view in &source.views {
            if target.view(&source_view.name).is_none() {
                ops.push(MigrationOperation::DropView {
                    view: source_view.name.clone(),
                });
            }
        }
    }

    fn diff_sequences(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        ops: &mut Vec<MigrationOperation>,
    ) {
        for target_sequence in &target.sequences {
            match source.sequence(&target_sequence.name) {
                None => ops.push(MigrationOperation::CreateSequence {
                    sequence: target_sequence.clone(),
                }),
                Some(source_sequence) => {
                    if !self
                        .comparers
                        .sequences
                        .equals(source_sequence, target_sequence)
                    {
                        ops.push(MigrationOperation::AlterSequence {
                            sequence: target_sequence.clone(),
                        });
                    }
                }
            }
        }
        for source_sequence in &source.sequences {
            if target.sequence(&source_sequence.name).is_none() {
                ops.push(MigrationOperation::DropSequence {
                    sequence: source_sequence.name.clone(),
                });
            }
        }
    }

    fn diff_synonyms(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        ops: &mut Vec<MigrationOperation>,
    ) {
        for target_synonym in &target.synonyms {
            match source.synonym(&target_synonym.name) {
                None => ops.push(MigrationOperation::CreateSynonym {
                    synonym: target_synonym.clone(),
                }),
                Some(source_synonym) => {
                    if !self
                        .comparers
                        .synonyms
                        .equals(source_synonym, target_synonym)
                    {
                        ops.push(MigrationOperation::DropSynonym {
                            synonym: source_synonym.name.clone(),
                        });
                        ops.push(MigrationOperation::CreateSynonym {
                            synonym: target_synonym.clone(),
                        });
                    }
                }
            }
        }
        for source_synonym in &source.synonyms {
            if target.synonym(&source_synonym.name).is_none() {
                ops.push(MigrationOperation::DropSynonym {
                    synonym: source_synonym.name.clone(),
                });
            }
        }
    }

    fn diff_routines(
        &self,
        source: &DatabaseSnapshot,
        target: &DatabaseSnapshot,
        ops: &mut Vec<MigrationOperation>,
    ) {
        for target_routine in &target.routines {
            match source.routine(&target_routine.name) {
                None => ops.push(MigrationOperation::CreateRoutine {
                    routine: target_routine.clone(),
                }),
                Some(source_routine) => {
                    if !self
                        .comparers
                        .routines
                        .equals(source_routine, target_routine)
                    {
                        ops.push(MigrationOperation::DropRoutine {
                            routine: source_routine.name.clone(),
                        });
                        ops.push(MigrationOperation::CreateRoutine {
                            routine: target_routine.clone(),
                        });
                    }
                }
            }
        }
        for source_routine in &source.routines {
            if target.routine(&source_routine.name).is_none() {
                ops.push(MigrationOperation::DropRoutine {
                    routine: source_routine.name.clone(),
                });
            }
        }
    }
}
