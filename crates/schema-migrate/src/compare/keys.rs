//! Comparers for keys, foreign keys, checks, indexes, and triggers.
//!
//! Each comparer also offers `equals_ignoring_name`, used by the diff
//! engine to pair a dropped entity with an added one and emit a rename
//! instead of a drop-and-recreate.

use crate::compare::{HashFold, NameComparer, StructuralComparer};
use crate::schema::table::{CheckConstraint, Index, IndexColumn, Key, RelationalKey, Trigger};

/// Structural comparer for [`Key`].
#[derive(Debug, Clone)]
pub struct KeyComparer {
    names: NameComparer,
}

impl KeyComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    /// Equality over everything except the constraint name.
    pub fn equals_ignoring_name(&self, a: &Key, b: &Key) -> bool {
        a.kind == b.kind
            && a.enabled == b.enabled
            && a.columns.len() == b.columns.len()
            && a.columns
                .iter()
                .zip(b.columns.iter())
                .all(|(x, y)| self.names.names_equal(x, y))
    }
}

impl StructuralComparer<Key> for KeyComparer {
    fn equals(&self, a: &Key, b: &Key) -> bool {
        self.names.opt_names_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &Key) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_opt_name(&mut fold, &value.name);
        fold.add(&value.kind).add(&value.enabled).add(&value.columns.len());
        for column in &value.columns {
            self.names.hash_name(&mut fold, column);
        }
        fold.finish()
    }
}

/// Structural comparer for [`RelationalKey`].
#[derive(Debug, Clone)]
pub struct RelationalKeyComparer {
    names: NameComparer,
    keys: KeyComparer,
}

impl RelationalKeyComparer {
    pub fn new(names: NameComparer, keys: KeyComparer) -> Self {
        Self { names, keys }
    }

    /// Equality over everything except the foreign key constraint name
    /// (which lives on the child key).
    pub fn equals_ignoring_name(&self, a: &RelationalKey, b: &RelationalKey) -> bool {
        self.names.identifiers_equal(&a.child_table, &b.child_table)
            && self.names.identifiers_equal(&a.parent_table, &b.parent_table)
            && self.keys.equals_ignoring_name(&a.child_key, &b.child_key)
            && self.keys.equals(&a.parent_key, &b.parent_key)
            && a.delete_action == b.delete_action
            && a.update_action == b.update_action
    }
}

impl StructuralComparer<RelationalKey> for RelationalKeyComparer {
    fn equals(&self, a: &RelationalKey, b: &RelationalKey) -> bool {
        self.names.opt_names_equal(&a.child_key.name, &b.child_key.name)
            && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &RelationalKey) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.child_table);
        self.names.hash_identifier(&mut fold, &value.parent_table);
        fold.add_raw(self.keys.hash_one(&value.child_key))
            .add_raw(self.keys.hash_one(&value.parent_key))
            .add(&value.delete_action)
            .add(&value.update_action);
        fold.finish()
    }
}

/// Structural comparer for [`CheckConstraint`].
///
/// Definitions compare verbatim: normalizing SQL expression text is a
/// dialect concern that does not belong in the ground-truth comparer.
#[derive(Debug, Clone)]
pub struct CheckComparer {
    names: NameComparer,
}

impl CheckComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    /// Equality over everything except the constraint name.
    pub fn equals_ignoring_name(&self, a: &CheckConstraint, b: &CheckConstraint) -> bool {
        a.definition == b.definition && a.enabled == b.enabled
    }
}

impl StructuralComparer<CheckConstraint> for CheckComparer {
    fn equals(&self, a: &CheckConstraint, b: &CheckConstraint) -> bool {
        self.names.opt_names_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &CheckConstraint) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_opt_name(&mut fold, &value.name);
        fold.add(&value.definition).add(&value.enabled);
        fold.finish()
    }
}

/// Structural comparer for [`Index`].
#[derive(Debug, Clone)]
pub struct IndexComparer {
    names: NameComparer,
}

impl IndexComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    fn index_columns_equal(&self, a: &[IndexColumn], b: &[IndexColumn]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(x, y)| x.expression == y.expression && x.order == y.order)
    }

    /// Equality over everything except the index name.
    pub fn equals_ignoring_name(&self, a: &Index, b: &Index) -> bool {
        a.unique == b.unique
            && a.enabled == b.enabled
            && self.index_columns_equal(&a.columns, &b.columns)
            && a.included_columns.len() == b.included_columns.len()
            && a.included_columns
                .iter()
                .zip(b.included_columns.iter())
                .all(|(x, y)| self.names.names_equal(x, y))
    }
}

impl StructuralComparer<Index> for IndexComparer {
    fn equals(&self, a: &Index, b: &Index) -> bool {
        self.names.names_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &Index) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_name(&mut fold, &value.name);
        fold.add(&value.unique)
            .add(&value.enabled)
            .add(&value.columns.len());
        for column in &value.columns {
            fold.add(&column.expression).add(&column.order);
        }
        fold.add(&value.included_columns.len());
        for column in &value.included_columns {
            self.names.hash_name(&mut fold, column);
        }
        fold.finish()
    }
}

/// Structural comparer for [`Trigger`].
#[derive(Debug, Clone)]
pub struct TriggerComparer {
    names: NameComparer,
}

impl TriggerComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }
}

impl StructuralComparer<Trigger> for TriggerComparer {
    fn equals(&self, a: &Trigger, b: &Trigger) -> bool {
        self.names.names_equal(&a.name, &b.name)
            && a.definition == b.definition
            && a.timing == b.timing
            && a.events == b.events
            && a.enabled == b.enabled
    }

    fn hash_one(&self, value: &Trigger) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_name(&mut fold, &value.name);
        fold.add(&value.definition)
            .add(&value.timing)
            .add(&value.events)
            .add(&value.enabled);
        fold.finish()
    }
}
