//! Column metadata: declared types, nullability, auto-increment.

use serde::{Deserialize, Serialize};

/// Dialect-neutral data kind for a column's declared type.
///
/// This is the hub of the type model: dialects render these into their
/// native type names, and the comparer suite compares columns through them
/// rather than through raw type strings. Types with no neutral form are
/// carried verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Boolean/bit type.
    Boolean,
    /// 16-bit signed integer.
    SmallInteger,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInteger,
    /// Exact decimal; precision/scale live on [`ColumnType`].
    Numeric,
    /// Double-precision floating point.
    Float,
    /// Character data; length and fixedness live on [`ColumnType`].
    Text,
    /// Unicode character data (NVARCHAR-style dialects distinguish this).
    Unicode,
    /// Binary data.
    Binary,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time without timezone.
    Timestamp,
    /// Date and time with timezone.
    TimestampTz,
    /// 128-bit UUID/GUID.
    Uuid,
    /// JSON document.
    Json,
    /// A native type with no neutral representation, carried verbatim.
    Unknown(String),
}

impl DataKind {
    /// A dialect-neutral zero/empty literal for backfilling this kind.
    ///
    /// Used when an add-not-null-column operation is split into
    /// add-nullable, backfill, alter-not-null.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            DataKind::Boolean => "FALSE",
            DataKind::SmallInteger
            | DataKind::Integer
            | DataKind::BigInteger
            | DataKind::Numeric
            | DataKind::Float => "0",
            DataKind::Text | DataKind::Unicode | DataKind::Unknown(_) => "''",
            DataKind::Binary => "''",
            DataKind::Date => "CURRENT_DATE",
            DataKind::Time => "CURRENT_TIME",
            DataKind::Timestamp | DataKind::TimestampTz => "CURRENT_TIMESTAMP",
            DataKind::Uuid => "'00000000-0000-0000-0000-000000000000'",
            DataKind::Json => "'{}'",
        }
    }
}

/// A column's declared type.
///
/// Every attribute that a dialect may or may not declare is an explicit
/// `Option`: an absent precision is not the same as precision zero, and the
/// comparers depend on that distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    /// Neutral data kind.
    pub data_kind: DataKind,

    /// Whether character/binary length is fixed (CHAR) or variable (VARCHAR).
    #[serde(default)]
    pub fixed_length: bool,

    /// Character/binary length. `None` for unbounded (TEXT/MAX) or
    /// non-length types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Numeric precision (total digits).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Numeric scale (digits after the decimal point).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Collation name, for character types that declare one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

impl ColumnType {
    /// A bare type of the given kind with no length/precision/collation.
    pub fn of(data_kind: DataKind) -> Self {
        Self {
            data_kind,
            fixed_length: false,
            length: None,
            precision: None,
            scale: None,
            collation: None,
        }
    }

    /// Variable-length character type.
    pub fn varchar(length: u32) -> Self {
        Self {
            length: Some(length),
            ..Self::of(DataKind::Text)
        }
    }

    /// Exact numeric type with precision and scale.
    pub fn numeric(precision: u32, scale: u32) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::of(DataKind::Numeric)
        }
    }
}

/// Auto-increment (identity) specification for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AutoIncrement {
    /// First generated value.
    pub initial: i64,
    /// Step between generated values.
    pub increment: i64,
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (local to the owning table).
    pub name: String,

    /// Declared type.
    pub column_type: ColumnType,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Whether the column is computed from an expression.
    #[serde(default)]
    pub computed: bool,

    /// Default value expression, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// Auto-increment specification, if the column is an identity column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<AutoIncrement>,
}

impl Column {
    /// A nullable column of the given kind, for programmatic snapshot
    /// construction.
    pub fn nullable(name: impl Into<String>, data_kind: DataKind) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::of(data_kind),
            nullable: true,
            computed: false,
            default_value: None,
            auto_increment: None,
        }
    }

    /// A NOT NULL column of the given kind.
    pub fn required(name: impl Into<String>, data_kind: DataKind) -> Self {
        Self {
            nullable: false,
            ..Self::nullable(name, data_kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_builders() {
        let vc = ColumnType::varchar(255);
        assert_eq!(vc.data_kind, DataKind::Text);
        assert_eq!(vc.length, Some(255));
        assert!(!vc.fixed_length);

        let num = ColumnType::numeric(10, 2);
        assert_eq!(num.precision, Some(10));
        assert_eq!(num.scale, Some(2));
        assert_eq!(num.length, None);
    }

    #[test]
    fn test_absent_precision_is_not_zero_precision() {
        let absent = ColumnType::of(DataKind::Numeric);
        let zero = ColumnType {
            precision: Some(0),
            ..ColumnType::of(DataKind::Numeric)
        };
        assert_ne!(absent, zero);
    }

    #[test]
    fn test_optional_attributes_serialize_as_absent() {
        let json = serde_json::to_string(&ColumnType::of(DataKind::Integer)).unwrap();
        // Quoted keys: "fixed_length" is always serialized and would
        // otherwise collide with a bare "length" substring check.
        assert!(!json.contains("\"length\""));
        assert!(!json.contains("\"precision\""));
        assert!(!json.contains("\"collation\""));
    }

    #[test]
    fn test_data_kind_symbolic_names() {
        assert_eq!(
            serde_json::to_string(&DataKind::BigInteger).unwrap(),
            "\"big_integer\""
        );
        let unknown: DataKind = serde_json::from_str("{\"unknown\":\"tsvector\"}").unwrap();
        assert_eq!(unknown, DataKind::Unknown("tsvector".to_string()));
    }
}
