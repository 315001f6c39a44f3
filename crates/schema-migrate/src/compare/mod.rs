//! Structural comparer suite: value-based equality and hashing over the
//! schema object graph.
//!
//! One comparer per entity kind. Composite comparers (table, key, index)
//! delegate to the comparers they are constructed with, so a caller can
//! swap in a different name resolution or a looser type comparer without
//! touching the composites. "Two tables are the same" is defined entirely
//! here — names are one attribute among many.
//!
//! Equality rules:
//! - Optional attributes are equal iff both absent, or both present with
//!   equal values. Absent never equals a default value.
//! - Ordered collections (columns, key columns, index columns) compare by
//!   sequence; unordered collections (checks, triggers, unique keys,
//!   indexes) compare as multisets.
//! - Hash codes fold every attribute (with a fixed sentinel for absent
//!   optionals), so equal objects always hash equally and the comparers
//!   can key dictionaries and sets during diffing.

pub mod column;
pub mod keys;
pub mod objects;
pub mod table;

pub use column::{ColumnComparer, ColumnTypeComparer};
pub use keys::{
    CheckComparer, IndexComparer, KeyComparer, RelationalKeyComparer, TriggerComparer,
};
pub use objects::{RoutineComparer, SequenceComparer, SynonymComparer, ViewComparer};
pub use table::TableComparer;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::core::identifier::{Identifier, NameResolution};

/// Value-based equality and hash computation for one entity kind.
///
/// Implementations guarantee `equals(a, b)` implies
/// `hash_one(a) == hash_one(b)`.
pub trait StructuralComparer<T>: Send + Sync {
    /// Structural equality over the entity's full attribute set.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Structural hash, consistent with [`StructuralComparer::equals`].
    fn hash_one(&self, value: &T) -> u64;
}

/// Sentinel folded in place of an absent optional attribute.
const ABSENT_SENTINEL: u64 = 0x9e37_79b9_7f4a_7c15;

/// Order-dependent hash accumulator (FNV-style fold).
#[derive(Debug, Clone)]
pub struct HashFold {
    state: u64,
}

impl HashFold {
    /// Start a fold.
    pub fn new() -> Self {
        Self {
            state: 0xcbf2_9ce4_8422_2325,
        }
    }

    fn combine(&mut self, value: u64) {
        self.state = self
            .state
            .wrapping_mul(0x0000_0100_0000_01b3)
            .wrapping_add(value);
    }

    /// Fold a hashable attribute.
    pub fn add<T: Hash>(&mut self, value: &T) -> &mut Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        self.combine(hasher.finish());
        self
    }

    /// Fold an optional attribute: the value's hash if present, a fixed
    /// sentinel if absent.
    pub fn add_opt<T: Hash>(&mut self, value: &Option<T>) -> &mut Self {
        match value {
            Some(v) => self.add(v),
            None => {
                self.combine(ABSENT_SENTINEL);
                self
            }
        }
    }

    /// Fold a pre-computed element hash.
    pub fn add_raw(&mut self, value: u64) -> &mut Self {
        self.combine(value);
        self
    }

    /// Fold an unordered collection of pre-computed element hashes; XOR
    /// makes the result independent of element order while the length
    /// keeps distinct multisets apart.
    pub fn add_unordered(&mut self, hashes: impl Iterator<Item = u64>) -> &mut Self {
        let mut acc = 0u64;
        let mut len = 0usize;
        for h in hashes {
            acc ^= h;
            len += 1;
        }
        self.add(&len);
        self.combine(acc);
        self
    }

    /// Finish the fold.
    pub fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for HashFold {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier/name comparison under a pluggable resolution strategy.
///
/// Structural comparison looks at schema and local name only: the server
/// and database components describe where a snapshot came from, not what
/// the object is, and including them would make otherwise-identical
/// schemas in two databases compare unequal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameComparer {
    resolution: NameResolution,
}

impl NameComparer {
    /// Comparer for the given resolution strategy.
    pub fn new(resolution: NameResolution) -> Self {
        Self { resolution }
    }

    /// The underlying resolution strategy.
    pub fn resolution(&self) -> NameResolution {
        self.resolution
    }

    /// Compare two names.
    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        self.resolution.names_equal(a, b)
    }

    /// Compare two optional names (both-absent or both-present-and-equal).
    pub fn opt_names_equal(&self, a: &Option<String>, b: &Option<String>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.names_equal(a, b),
            _ => false,
        }
    }

    /// Compare two identifiers on schema and local name.
    pub fn identifiers_equal(&self, a: &Identifier, b: &Identifier) -> bool {
        self.opt_names_equal(&a.schema, &b.schema) && self.names_equal(&a.local_name, &b.local_name)
    }

    /// Fold a name into a hash.
    pub fn hash_name(&self, fold: &mut HashFold, name: &str) {
        fold.add(&self.resolution.resolve(name));
    }

    /// Fold an optional name.
    pub fn hash_opt_name(&self, fold: &mut HashFold, name: &Option<String>) {
        match name {
            Some(n) => self.hash_name(fold, n),
            None => {
                fold.add_raw(ABSENT_SENTINEL);
            }
        }
    }

    /// Fold an identifier (schema and local name).
    pub fn hash_identifier(&self, fold: &mut HashFold, id: &Identifier) {
        self.hash_opt_name(fold, &id.schema);
        self.hash_name(fold, &id.local_name);
    }
}

/// Compare two slices element-wise (order matters).
pub(crate) fn sequence_equals<T, C: StructuralComparer<T>>(cmp: &C, a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| cmp.equals(x, y))
}

/// Compare two slices as multisets (order ignored, multiplicity kept).
pub(crate) fn multiset_equals<T, C: StructuralComparer<T>>(cmp: &C, a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !used[i] && cmp.equals(x, y) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Fold an ordered collection into a hash.
pub(crate) fn hash_sequence<T, C: StructuralComparer<T>>(
    cmp: &C,
    fold: &mut HashFold,
    items: &[T],
) {
    fold.add(&items.len());
    for item in items {
        fold.add_raw(cmp.hash_one(item));
    }
}

/// Fold an unordered collection into a hash.
pub(crate) fn hash_multiset<T, C: StructuralComparer<T>>(
    cmp: &C,
    fold: &mut HashFold,
    items: &[T],
) {
    fold.add_unordered(items.iter().map(|i| cmp.hash_one(i)));
}

/// The full comparer suite for one resolution strategy, wired together by
/// composition.
#[derive(Debug, Clone)]
pub struct ComparerSuite {
    pub names: NameComparer,
    pub column_types: ColumnTypeComparer,
    pub columns: ColumnComparer,
    pub keys: KeyComparer,
    pub relational_keys: RelationalKeyComparer,
    pub checks: CheckComparer,
    pub indexes: IndexComparer,
    pub triggers: TriggerComparer,
    pub tables: TableComparer,
    pub views: ViewComparer,
    pub sequences: SequenceComparer,
    pub synonyms: SynonymComparer,
    pub routines: RoutineComparer,
}

impl ComparerSuite {
    /// Build the default suite for a resolution strategy.
    pub fn new(resolution: NameResolution) -> Self {
        let names = NameComparer::new(resolution);
        let column_types = ColumnTypeComparer::new(names);
        let columns = ColumnComparer::new(names, column_types.clone());
        let keys = KeyComparer::new(names);
        let relational_keys = RelationalKeyComparer::new(names, keys.clone());
        let checks = CheckComparer::new(names);
        let indexes = IndexComparer::new(names);
        let triggers = TriggerComparer::new(names);
        let tables = TableComparer::new(
            names,
            columns.clone(),
            keys.clone(),
            relational_keys.clone(),
            checks.clone(),
            indexes.clone(),
            triggers.clone(),
        );
        Self {
            names,
            column_types,
            columns,
            keys,
            relational_keys,
            checks,
            indexes,
            triggers,
            tables,
            views: ViewComparer::new(names),
            sequences: SequenceComparer::new(names),
            synonyms: SynonymComparer::new(names),
            routines: RoutineComparer::new(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_is_deterministic_and_order_dependent() {
        let mut a = HashFold::new();
        a.add(&"x").add(&"y");
        let mut b = HashFold::new();
        b.add(&"x").add(&"y");
        assert_eq!(a.finish(), b.finish());

        let mut c = HashFold::new();
        c.add(&"y").add(&"x");
        assert_ne!(a.finish(), c.finish());
    }

    #[test]
    fn test_absent_optional_hashes_differently_from_default() {
        let mut absent = HashFold::new();
        absent.add_opt::<u32>(&None);
        let mut zero = HashFold::new();
        zero.add_opt(&Some(0u32));
        assert_ne!(absent.finish(), zero.finish());
    }

    #[test]
    fn test_unordered_fold_ignores_order() {
        let mut a = HashFold::new();
        a.add_unordered([1u64, 2, 3].into_iter());
        let mut b = HashFold::new();
        b.add_unordered([3u64, 1, 2].into_iter());
        assert_eq!(a.finish(), b.finish());

        let mut c = HashFold::new();
        c.add_unordered([1u64, 2].into_iter());
        assert_ne!(a.finish(), c.finish());
    }

    #[test]
    fn test_name_comparer_identifier_rules() {
        let cmp = NameComparer::new(NameResolution::FoldLower);
        let a = Identifier::with_schema("Public", "Users").unwrap();
        let b = Identifier::with_schema("public", "USERS").unwrap();
        assert!(cmp.identifiers_equal(&a, &b));

        let bare = Identifier::new("users").unwrap();
        assert!(!cmp.identifiers_equal(&a, &bare));
    }
}
