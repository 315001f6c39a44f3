//! Composite comparer for tables.

use crate::compare::{
    hash_multiset, hash_sequence, multiset_equals, sequence_equals, CheckComparer, ColumnComparer,
    HashFold, IndexComparer, KeyComparer, NameComparer, RelationalKeyComparer, StructuralComparer,
    TriggerComparer,
};
use crate::schema::table::Table;

/// Structural comparer for [`Table`].
///
/// The table name is one attribute among many. Columns compare as an
/// ordered sequence; unique keys, checks, indexes, triggers, and outgoing
/// foreign keys compare as multisets. Incoming foreign keys (`child_keys`)
/// are a navigation back-reference owned by the referencing tables and are
/// excluded — including them would make a table's identity depend on
/// unrelated tables.
#[derive(Debug, Clone)]
pub struct TableComparer {
    names: NameComparer,
    columns: ColumnComparer,
    keys: KeyComparer,
    relational_keys: RelationalKeyComparer,
    checks: CheckComparer,
    indexes: IndexComparer,
    triggers: TriggerComparer,
}

impl TableComparer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        names: NameComparer,
        columns: ColumnComparer,
        keys: KeyComparer,
        relational_keys: RelationalKeyComparer,
        checks: CheckComparer,
        indexes: IndexComparer,
        triggers: TriggerComparer,
    ) -> Self {
        Self {
            names,
            columns,
            keys,
            relational_keys,
            checks,
            indexes,
            triggers,
        }
    }

    fn primary_keys_equal(&self, a: &Table, b: &Table) -> bool {
        match (&a.primary_key, &b.primary_key) {
            (None, None) => true,
            (Some(x), Some(y)) => self.keys.equals(x, y),
            _ => false,
        }
    }
}

impl StructuralComparer<Table> for TableComparer {
    fn equals(&self, a: &Table, b: &Table) -> bool {
        self.names.identifiers_equal(&a.name, &b.name)
            && sequence_equals(&self.columns, &a.columns, &b.columns)
            && self.primary_keys_equal(a, b)
            && multiset_equals(&self.keys, &a.unique_keys, &b.unique_keys)
            && multiset_equals(&self.checks, &a.checks, &b.checks)
            && multiset_equals(&self.indexes, &a.indexes, &b.indexes)
            && multiset_equals(&self.triggers, &a.triggers, &b.triggers)
            && multiset_equals(&self.relational_keys, &a.parent_keys, &b.parent_keys)
    }

    fn hash_one(&self, value: &Table) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_identifier(&mut fold, &value.name);
        hash_sequence(&self.columns, &mut fold, &value.columns);
        match &value.primary_key {
            Some(pk) => fold.add_raw(self.keys.hash_one(pk)),
            None => fold.add_opt::<u64>(&None),
        };
        hash_multiset(&self.keys, &mut fold, &value.unique_keys);
        hash_multiset(&self.checks, &mut fold, &value.checks);
        hash_multiset(&self.indexes, &mut fold, &value.indexes);
        hash_multiset(&self.triggers, &mut fold, &value.triggers);
        hash_multiset(&self.relational_keys, &mut fold, &value.parent_keys);
        fold.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ComparerSuite;
    use crate::core::identifier::{Identifier, NameResolution};
    use crate::schema::column::{Column, DataKind};
    use crate::schema::table::{CheckConstraint, Key};

    fn sample_table() -> Table {
        let mut table = Table::new(Identifier::with_schema("public", "users").unwrap());
        table.columns.push(Column::required("id", DataKind::Integer));
        table.columns.push(Column::nullable("name", DataKind::Text));
        table.primary_key = Some(Key::primary(
            Some("pk_users".to_string()),
            vec!["id".to_string()],
        ));
        table.checks.push(CheckConstraint {
            name: Some("ck_name".to_string()),
            definition: "length(name) > 0".to_string(),
            enabled: true,
        });
        table
    }

    #[test]
    fn test_table_reflexive_symmetric_hash_consistent() {
        let suite = ComparerSuite::new(NameResolution::Verbatim);
        let a = sample_table();
        let b = sample_table();
        assert!(suite.tables.equals(&a, &a));
        assert!(suite.tables.equals(&a, &b));
        assert!(suite.tables.equals(&b, &a));
        assert_eq!(suite.tables.hash_one(&a), suite.tables.hash_one(&b));
    }

    #[test]
    fn test_column_order_matters() {
        let suite = ComparerSuite::new(NameResolution::Verbatim);
        let a = sample_table();
        let mut b = sample_table();
        b.columns.reverse();
        assert!(!suite.tables.equals(&a, &b));
    }

    #[test]
    fn test_unique_key_order_does_not_matter() {
        let suite = ComparerSuite::new(NameResolution::Verbatim);
        let mut a = sample_table();
        let mut b = sample_table();
        let k1 = Key::unique(Some("uq_a".to_string()), vec!["id".to_string()]);
        let k2 = Key::unique(Some("uq_b".to_string()), vec!["name".to_string()]);
        a.unique_keys = vec![k1.clone(), k2.clone()];
        b.unique_keys = vec![k2, k1];
        assert!(suite.tables.equals(&a, &b));
        assert_eq!(suite.tables.hash_one(&a), suite.tables.hash_one(&b));
    }

    #[test]
    fn test_missing_primary_key_differs() {
        let suite = ComparerSuite::new(NameResolution::Verbatim);
        let a = sample_table();
        let mut b = sample_table();
        b.primary_key = None;
        assert!(!suite.tables.equals(&a, &b));
        assert_ne!(suite.tables.hash_one(&a), suite.tables.hash_one(&b));
    }

    #[test]
    fn test_case_insensitive_suite_matches_folded_names() {
        let suite = ComparerSuite::new(NameResolution::FoldLower);
        let a = sample_table();
        let mut b = sample_table();
        b.name = Identifier::with_schema("PUBLIC", "USERS").unwrap();
        b.columns[0].name = "ID".to_string();
        assert!(suite.tables.equals(&a, &b));
        assert_eq!(suite.tables.hash_one(&a), suite.tables.hash_one(&b));
    }
}
