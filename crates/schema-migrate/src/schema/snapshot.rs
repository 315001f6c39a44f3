//! Immutable schema snapshots.
//!
//! A [`DatabaseSnapshot`] is a fully resolved schema object graph captured
//! at one point in time: the output of introspection, the input of
//! diffing. Snapshots round-trip losslessly through JSON — every optional
//! attribute serializes as present/absent and enum-like fields serialize
//! as symbolic names.

use serde::{Deserialize, Serialize};

use crate::core::identifier::{Identifier, IdentifierDefaults, NameResolution};
use crate::error::Result;
use crate::schema::objects::{Routine, Sequence, Synonym, View};
use crate::schema::table::Table;

/// The kinds of schema objects a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    View,
    Sequence,
    Synonym,
    Routine,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Synonym => "synonym",
            ObjectKind::Routine => "routine",
        };
        write!(f, "{}", name)
    }
}

/// An immutable, fully-resolved schema object graph.
///
/// Entity vectors preserve introspection order for display; lookup goes
/// through [`DatabaseSnapshot::table`] and friends, which qualify the
/// requested name against the snapshot's defaults and compare under its
/// resolution strategy. Absent objects are `None`, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// The source database's naming context.
    #[serde(default)]
    pub defaults: IdentifierDefaults,

    /// Identifier resolution strategy of the source dialect.
    #[serde(default)]
    pub resolution: NameResolution,

    /// Tables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,

    /// Views.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,

    /// Sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequences: Vec<Sequence>,

    /// Synonyms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<Synonym>,

    /// Routines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routines: Vec<Routine>,
}

impl DatabaseSnapshot {
    /// An empty snapshot with the given naming context.
    pub fn new(defaults: IdentifierDefaults, resolution: NameResolution) -> Self {
        Self {
            defaults,
            resolution,
            tables: Vec::new(),
            views: Vec::new(),
            sequences: Vec::new(),
            synonyms: Vec::new(),
            routines: Vec::new(),
        }
    }

    fn matches(&self, candidate: &Identifier, wanted: &Identifier) -> bool {
        let a = self.resolution.resolve_identifier(&candidate.qualify(&self.defaults));
        let b = self.resolution.resolve_identifier(&wanted.qualify(&self.defaults));
        a == b
    }

    /// Look up a table by (possibly partial) name.
    pub fn table(&self, name: &Identifier) -> Option<&Table> {
        self.tables.iter().find(|t| self.matches(&t.name, name))
    }

    /// Look up a view by name.
    pub fn view(&self, name: &Identifier) -> Option<&View> {
        self.views.iter().find(|v| self.matches(&v.name, name))
    }

    /// Look up a sequence by name.
    pub fn sequence(&self, name: &Identifier) -> Option<&Sequence> {
        self.sequences.iter().find(|s| self.matches(&s.name, name))
    }

    /// Look up a synonym by name.
    pub fn synonym(&self, name: &Identifier) -> Option<&Synonym> {
        self.synonyms.iter().find(|s| self.matches(&s.name, name))
    }

    /// Look up a routine by name.
    pub fn routine(&self, name: &Identifier) -> Option<&Routine> {
        self.routines.iter().find(|r| self.matches(&r.name, name))
    }

    /// Names of all objects of the given kind, in snapshot order.
    pub fn names(&self, kind: ObjectKind) -> Vec<Identifier> {
        match kind {
            ObjectKind::Table => self.tables.iter().map(|t| t.name.clone()).collect(),
            ObjectKind::View => self.views.iter().map(|v| v.name.clone()).collect(),
            ObjectKind::Sequence => self.sequences.iter().map(|s| s.name.clone()).collect(),
            ObjectKind::Synonym => self.synonyms.iter().map(|s| s.name.clone()).collect(),
            ObjectKind::Routine => self.routines.iter().map(|r| r.name.clone()).collect(),
        }
    }

    /// Total object count across all kinds.
    pub fn object_count(&self) -> usize {
        self.tables.len()
            + self.views.len()
            + self.sequences.len()
            + self.synonyms.len()
            + self.routines.len()
    }

    /// Serialize to pretty-printed JSON. Output is deterministic: equal
    /// snapshots serialize byte-identically.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::{Column, DataKind};
    use crate::schema::table::Key;

    fn sample_snapshot() -> DatabaseSnapshot {
        let mut snapshot = DatabaseSnapshot::new(
            IdentifierDefaults {
                server: None,
                database: Some("appdb".to_string()),
                schema: Some("public".to_string()),
            },
            NameResolution::FoldLower,
        );
        let mut table = Table::new(Identifier::with_schema("public", "Users").unwrap());
        table.columns.push(Column::required("id", DataKind::Integer));
        table.columns.push(Column::nullable("email", DataKind::Text));
        table.primary_key = Some(Key::primary(
            Some("pk_users".to_string()),
            vec!["id".to_string()],
        ));
        snapshot.tables.push(table);
        snapshot
    }

    #[test]
    fn test_lookup_qualifies_and_resolves() {
        let snapshot = sample_snapshot();

        // Partial name picks up the default schema.
        assert!(snapshot.table(&Identifier::new("users").unwrap()).is_some());
        // Case folds under FoldLower.
        assert!(snapshot
            .table(&Identifier::with_schema("PUBLIC", "USERS").unwrap())
            .is_some());
        // A different schema does not match.
        assert!(snapshot
            .table(&Identifier::with_schema("audit", "users").unwrap())
            .is_none());
        // Absence is None, not an error.
        assert!(snapshot.table(&Identifier::new("missing").unwrap()).is_none());
    }

    #[test]
    fn test_json_round_trip_is_lossless_and_stable() {
        let snapshot = sample_snapshot();
        let json = snapshot.to_json().unwrap();
        let restored = DatabaseSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);

        // Re-serialization is byte-identical.
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn test_names_preserve_snapshot_order() {
        let mut snapshot = sample_snapshot();
        snapshot
            .tables
            .push(Table::new(Identifier::new("aaa_first_alphabetically").unwrap()));
        let names = snapshot.names(ObjectKind::Table);
        assert_eq!(names[0].local_name, "Users");
        assert_eq!(names[1].local_name, "aaa_first_alphabetically");
    }
}
