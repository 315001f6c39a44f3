//! Deterministic ordering of migration operations.

use crate::operations::{MigrationOperation, OperationKind};

/// Orders a migration plan into safe execution phases.
///
/// Drops run first, from the outermost dependents inward (views before
/// triggers before indexes before constraints before tables), then table
/// renames, then creates (sequences before the tables that use them,
/// tables before the views that read them). Everything else lands in a
/// trailing bucket so additive operations like `AddForeignKey` and
/// `CreateIndex` follow the `CreateTable` they depend on.
///
/// The sort is stable: operations sharing a phase keep their input order,
/// which keeps plans reproducible and diffs reviewable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationSorter;

impl OperationSorter {
    pub fn new() -> Self {
        Self
    }

    pub fn sort(&self, mut operations: Vec<MigrationOperation>) -> Vec<MigrationOperation> {
        operations.sort_by_key(|op| phase(op.kind()));
        operations
    }
}

fn phase(kind: OperationKind) -> u8 {
    match kind {
        OperationKind::DropView => 0,
        OperationKind::DropTrigger => 1,
        OperationKind::DropIndex => 2,
        OperationKind::DropForeignKey => 3,
        OperationKind::DropUniqueKey => 4,
        OperationKind::DropPrimaryKey => 5,
        OperationKind::DropCheck => 6,
        OperationKind::DropSynonym => 7,
        OperationKind::DropRoutine => 8,
        OperationKind::DropSequence => 9,
        OperationKind::DropColumn => 10,
        OperationKind::DropTable => 11,
        OperationKind::RenameTable => 13,
        OperationKind::CreateSequence => 15,
        OperationKind::CreateTable => 16,
        OperationKind::CreateView => 17,
        _ => 19,
    }
}
