//! Comparers for column types and columns.

use crate::compare::{HashFold, NameComparer, StructuralComparer};
use crate::schema::column::{Column, ColumnType};

/// Structural comparer for [`ColumnType`].
///
/// Collation names are compared under the injected name resolution;
/// everything else compares exactly. Absent length/precision/scale never
/// equals an explicit value.
#[derive(Debug, Clone)]
pub struct ColumnTypeComparer {
    names: NameComparer,
}

impl ColumnTypeComparer {
    pub fn new(names: NameComparer) -> Self {
        Self { names }
    }
}

impl StructuralComparer<ColumnType> for ColumnTypeComparer {
    fn equals(&self, a: &ColumnType, b: &ColumnType) -> bool {
        a.data_kind == b.data_kind
            && a.fixed_length == b.fixed_length
            && a.length == b.length
            && a.precision == b.precision
            && a.scale == b.scale
            && self.names.opt_names_equal(&a.collation, &b.collation)
    }

    fn hash_one(&self, value: &ColumnType) -> u64 {
        let mut fold = HashFold::new();
        fold.add(&value.data_kind)
            .add(&value.fixed_length)
            .add_opt(&value.length)
            .add_opt(&value.precision)
            .add_opt(&value.scale);
        self.names.hash_opt_name(&mut fold, &value.collation);
        fold.finish()
    }
}

/// Structural comparer for [`Column`].
#[derive(Debug, Clone)]
pub struct ColumnComparer {
    names: NameComparer,
    types: ColumnTypeComparer,
}

impl ColumnComparer {
    pub fn new(names: NameComparer, types: ColumnTypeComparer) -> Self {
        Self { names, types }
    }
}

impl StructuralComparer<Column> for ColumnComparer {
    fn equals(&self, a: &Column, b: &Column) -> bool {
        self.names.names_equal(&a.name, &b.name)
            && self.types.equals(&a.column_type, &b.column_type)
            && a.nullable == b.nullable
            && a.computed == b.computed
            && a.default_value == b.default_value
            && a.auto_increment == b.auto_increment
    }

    fn hash_one(&self, value: &Column) -> u64 {
        let mut fold = HashFold::new();
        self.names.hash_name(&mut fold, &value.name);
        fold.add_raw(self.types.hash_one(&value.column_type))
            .add(&value.nullable)
            .add(&value.computed)
            .add_opt(&value.default_value)
            .add_opt(&value.auto_increment);
        fold.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::NameResolution;
    use crate::schema::column::{AutoIncrement, DataKind};

    fn comparers() -> (ColumnTypeComparer, ColumnComparer) {
        let names = NameComparer::new(NameResolution::Verbatim);
        let types = ColumnTypeComparer::new(names);
        (types.clone(), ColumnComparer::new(names, types))
    }

    #[test]
    fn test_column_type_reflexive_and_symmetric() {
        let (types, _) = comparers();
        let a = ColumnType::varchar(100);
        let b = ColumnType::varchar(100);
        assert!(types.equals(&a, &a));
        assert!(types.equals(&a, &b));
        assert!(types.equals(&b, &a));
        assert_eq!(types.hash_one(&a), types.hash_one(&b));
    }

    #[test]
    fn test_absent_length_not_equal_to_zero_length() {
        let (types, _) = comparers();
        let unbounded = ColumnType::of(DataKind::Text);
        let zero = ColumnType::varchar(0);
        assert!(!types.equals(&unbounded, &zero));
    }

    #[test]
    fn test_collation_compares_under_resolution() {
        let names = NameComparer::new(NameResolution::FoldLower);
        let types = ColumnTypeComparer::new(names);
        let a = ColumnType {
            collation: Some("UTF8_BIN".to_string()),
            ..ColumnType::of(DataKind::Text)
        };
        let b = ColumnType {
            collation: Some("utf8_bin".to_string()),
            ..ColumnType::of(DataKind::Text)
        };
        assert!(types.equals(&a, &b));
        assert_eq!(types.hash_one(&a), types.hash_one(&b));
    }

    #[test]
    fn test_column_differs_on_auto_increment() {
        let (_, columns) = comparers();
        let plain = Column::required("id", DataKind::Integer);
        let identity = Column {
            auto_increment: Some(AutoIncrement {
                initial: 1,
                increment: 1,
            }),
            ..plain.clone()
        };
        assert!(!columns.equals(&plain, &identity));
        assert_ne!(columns.hash_one(&plain), columns.hash_one(&identity));
    }

    #[test]
    fn test_column_equal_hash_equal() {
        let (_, columns) = comparers();
        let a = Column {
            default_value: Some("0".to_string()),
            ..Column::required("count", DataKind::Integer)
        };
        let b = a.clone();
        assert!(columns.equals(&a, &b));
        assert_eq!(columns.hash_one(&a), columns.hash_one(&b));
    }
}
