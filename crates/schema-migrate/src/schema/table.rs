//! Table metadata: keys, constraints, indexes, triggers.

use serde::{Deserialize, Serialize};

use crate::core::identifier::Identifier;
use crate::schema::column::Column;

/// Key kind: primary, unique, or one side of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Primary,
    Unique,
    Foreign,
}

/// A key over an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Constraint name, if the database assigned or declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Key kind.
    pub kind: KeyKind,

    /// Column names, in key order. Order matters for equality.
    pub columns: Vec<String>,

    /// Whether the constraint is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Key {
    /// A primary key over the given columns.
    pub fn primary(name: Option<String>, columns: Vec<String>) -> Self {
        Self {
            name,
            kind: KeyKind::Primary,
            columns,
            enabled: true,
        }
    }

    /// A unique key over the given columns.
    pub fn unique(name: Option<String>, columns: Vec<String>) -> Self {
        Self {
            name,
            kind: KeyKind::Unique,
            columns,
            enabled: true,
        }
    }

    /// A foreign key (child or parent side) over the given columns.
    pub fn foreign(name: Option<String>, columns: Vec<String>) -> Self {
        Self {
            name,
            kind: KeyKind::Foreign,
            columns,
            enabled: true,
        }
    }
}

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ReferentialAction {
    /// SQL keyword form.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
        }
    }
}

/// A foreign key relationship: a child key paired with the parent key it
/// references, plus referential actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationalKey {
    /// Referencing (child) table.
    pub child_table: Identifier,

    /// Child-side key. Its `name` is the foreign key constraint name.
    pub child_key: Key,

    /// Referenced (parent) table.
    pub parent_table: Identifier,

    /// Parent-side key (primary or unique key being referenced).
    pub parent_key: Key,

    /// ON DELETE action.
    pub delete_action: ReferentialAction,

    /// ON UPDATE action.
    pub update_action: ReferentialAction,
}

/// Check constraint metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Constraint name, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Constraint definition (SQL expression).
    pub definition: String,

    /// Whether the constraint is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Sort order of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrder {
    Ascending,
    Descending,
}

/// One key column of an index: an expression (usually a bare column name)
/// plus its sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Indexed expression.
    pub expression: String,

    /// Sort order.
    pub order: IndexOrder,
}

impl IndexColumn {
    /// An ascending index column over a plain column name.
    pub fn ascending(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            order: IndexOrder::Ascending,
        }
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Key columns, in index order. Order matters for equality.
    pub columns: Vec<IndexColumn>,

    /// Included (covering) columns, non-key.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_columns: Vec<String>,

    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,

    /// Whether the index is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Trigger firing timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

/// A single trigger firing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

/// Set of trigger firing events.
///
/// Stored as a bitset; serialized as a list of symbolic event names for
/// forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TriggerEvents(u8);

const EVENT_INSERT: u8 = 1;
const EVENT_UPDATE: u8 = 2;
const EVENT_DELETE: u8 = 4;

impl TriggerEvents {
    /// Empty event set.
    pub fn none() -> Self {
        Self(0)
    }

    /// Build from a slice of events. Duplicates collapse.
    pub fn from_events(events: &[TriggerEvent]) -> Self {
        let mut set = Self::none();
        for event in events {
            set = set.with(*event);
        }
        set
    }

    /// Return the set with `event` added.
    pub fn with(self, event: TriggerEvent) -> Self {
        Self(self.0 | Self::bit(event))
    }

    /// Membership test.
    pub fn contains(&self, event: TriggerEvent) -> bool {
        self.0 & Self::bit(event) != 0
    }

    /// True if no events are set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Events in canonical (insert, update, delete) order.
    pub fn events(&self) -> Vec<TriggerEvent> {
        [
            TriggerEvent::Insert,
            TriggerEvent::Update,
            TriggerEvent::Delete,
        ]
        .into_iter()
        .filter(|e| self.contains(*e))
        .collect()
    }

    fn bit(event: TriggerEvent) -> u8 {
        match event {
            TriggerEvent::Insert => EVENT_INSERT,
            TriggerEvent::Update => EVENT_UPDATE,
            TriggerEvent::Delete => EVENT_DELETE,
        }
    }
}

impl Serialize for TriggerEvents {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.events().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TriggerEvents {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let events = Vec::<TriggerEvent>::deserialize(deserializer)?;
        Ok(Self::from_events(&events))
    }
}

/// Trigger metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,

    /// Trigger body / definition text.
    pub definition: String,

    /// Firing timing.
    pub timing: TriggerTiming,

    /// Firing events.
    pub events: TriggerEvents,

    /// Whether the trigger is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Table metadata.
///
/// `parent_keys` are outgoing foreign keys (this table is the child);
/// `child_keys` are incoming foreign keys (this table is the parent), kept
/// as a navigation back-reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: Identifier,

    /// Column definitions, in ordinal order.
    pub columns: Vec<Column>,

    /// Primary key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Key>,

    /// Unique keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_keys: Vec<Key>,

    /// Check constraints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckConstraint>,

    /// Non-key indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    /// Triggers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    /// Outgoing foreign keys (this table references others).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_keys: Vec<RelationalKey>,

    /// Incoming foreign keys (other tables reference this one).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_keys: Vec<RelationalKey>,
}

impl Table {
    /// An empty table with the given name.
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            checks: Vec::new(),
            indexes: Vec::new(),
            triggers: Vec::new(),
            parent_keys: Vec::new(),
            child_keys: Vec::new(),
        }
    }

    /// Find a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if the table has a primary key.
    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_events_bitset() {
        let events = TriggerEvents::from_events(&[
            TriggerEvent::Delete,
            TriggerEvent::Insert,
            TriggerEvent::Insert,
        ]);
        assert!(events.contains(TriggerEvent::Insert));
        assert!(events.contains(TriggerEvent::Delete));
        assert!(!events.contains(TriggerEvent::Update));
        // Canonical ordering regardless of construction order.
        assert_eq!(
            events.events(),
            vec![TriggerEvent::Insert, TriggerEvent::Delete]
        );
    }

    #[test]
    fn test_trigger_events_serialize_symbolic() {
        let events = TriggerEvents::from_events(&[TriggerEvent::Insert, TriggerEvent::Update]);
        let json = serde_json::to_string(&events).unwrap();
        assert_eq!(json, "[\"insert\",\"update\"]");

        let back: TriggerEvents = serde_json::from_str(&json).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn test_referential_action_sql() {
        assert_eq!(ReferentialAction::SetNull.as_sql(), "SET NULL");
        assert_eq!(ReferentialAction::NoAction.as_sql(), "NO ACTION");
    }

    #[test]
    fn test_key_enabled_defaults_true_on_deserialize() {
        let key: Key =
            serde_json::from_str(r#"{"kind":"primary","columns":["id"]}"#).unwrap();
        assert!(key.enabled);
        assert!(key.name.is_none());
    }

    #[test]
    fn test_table_column_lookup() {
        let mut table = Table::new(Identifier::new("users").unwrap());
        table
            .columns
            .push(Column::required("id", crate::schema::DataKind::Integer));
        assert!(table.column("id").is_some());
        assert!(table.column("missing").is_none());
    }
}
