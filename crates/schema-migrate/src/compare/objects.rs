//! Comparers for non-table database objects.

use crate::compare::{HashFold, NameComparer, StructuralComparer};
use crate::schema::objects::{Routine, Sequence, Synonym, View};

/// Compares views on name, definition text, and materialization.
///
/// Definitions compare verbatim. Normalizing SQL text would require a
/// dialect-aware parser and false negatives here only cost a redundant
/// drop-and-create.
#[derive(Debug, Clone, Copy)]
pub struct ViewComparer {
    names: NameComparer,
}

impl ViewComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    /// Equality with the view name excluded, for rename pairing.
    pub fn equals_ignoring_name(&self, a: &View, b: &View) -> bool {
        a.definition == b.definition && a.materialized == b.materialized
    }
}

impl StructuralComparer<View> for ViewComparer {
    fn equals(&self, a: &View, b: &View) -> bool {
        self.names.identifiers_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &View) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.name);
        fold.add(&value.definition);
        fold.add(&value.materialized);
        fold.finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceComparer {
    names: NameComparer,
}

impl SequenceComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    pub fn equals_ignoring_name(&self, a: &Sequence, b: &Sequence) -> bool {
        a.start == b.start
            && a.increment == b.increment
            && a.min_value == b.min_value
            && a.max_value == b.max_value
            && a.cycle == b.cycle
            && a.cache == b.cache
    }
}

impl StructuralComparer<Sequence> for SequenceComparer {
    fn equals(&self, a: &Sequence, b: &Sequence) -> bool {
        self.names.identifiers_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &Sequence) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.name);
        fold.add(&value.start);
        fold.add(&value.increment);
        fold.add_opt(&value.min_value);
        fold.add_opt(&value.max_value);
        fold.add(&value.cycle);
        fold.add(&value.cache);
        fold.finish()
    }
}

/// Compares synonyms on name and target. The target is another object
/// identifier, so it folds under the same resolution rules as the name.
#[derive(Debug, Clone, Copy)]
pub struct SynonymComparer {
    names: NameComparer,
}

impl SynonymComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    pub fn equals_ignoring_name(&self, a: &Synonym, b: &Synonym) -> bool {
        self.names.identifiers_equal(&a.target, &b.target)
    }
}

impl StructuralComparer<Synonym> for SynonymComparer {
    fn equals(&self, a: &Synonym, b: &Synonym) -> bool {
        self.names.identifiers_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &Synonym) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.name);
        self.names.hash_identifier(&mut fold, &value.target);
        fold.finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoutineComparer {
    names: NameComparer,
}

impl RoutineComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }

    pub fn equals_ignoring_name(&self, a: &Routine, b: &Routine) -> bool {
        a.definition == b.definition
    }
}

impl StructuralComparer<Routine> for RoutineComparer {
    fn equals(&self, a: &Routine, b: &Routine) -> bool {
        self.names.identifiers_equal(&a.name, &b.name) && self.equals_ignoring_name(a, b)
    }

    fn hash_one(&self, value: &Routine) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.name);
        fold.add(&value.definition);
        fold.finish()
    }
}
