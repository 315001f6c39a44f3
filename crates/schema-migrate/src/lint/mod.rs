//! Snapshot lint rules.
//!
//! Rules inspect a whole snapshot. Advisory findings come back as
//! [`LintFinding`]s; structural problems that make the snapshot unusable
//! for migration planning (a foreign key cycle, for one) are hard errors.

use tracing::debug;

use crate::core::graph::DependencyGraph;
use crate::error::Result;
use crate::core::identifier::Identifier;
use crate::schema::snapshot::DatabaseSnapshot;

/// An advisory finding from a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    /// Name of the rule that produced the finding.
    pub rule: String,
    /// Human-readable message.
    pub message: String,
}

pub trait LintRule: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<LintFinding>>;
}

/// Runs a set of rules over a snapshot, collecting findings in rule order.
#[derive(Default)]
pub struct Linter {
    rules: Vec<Box<dyn LintRule>>,
}

impl Linter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard rule set.
    pub fn with_default_rules() -> Self {
        let mut linter = Self::new();
        linter.add_rule(Box::new(ForeignKeyCycleRule));
        linter.add_rule(Box::new(NoPrimaryKeyRule));
        linter
    }

    pub fn add_rule(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    pub fn lint(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<LintFinding>> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            let mut found = rule.check(snapshot)?;
            debug!(rule = rule.name(), findings = found.len(), "rule checked");
            findings.append(&mut found);
        }
        Ok(findings)
    }
}

/// Builds the table dependency graph (one edge per foreign key, pointing
/// from the referenced table to the referencing table) and fails with
/// `CycleDetected` when the graph has no topological order.
/// Self-references are cycles too.
pub struct ForeignKeyCycleRule;

impl ForeignKeyCycleRule {
    /// Topological order of the snapshot's tables, parents before children.
    /// This is the passing-case output the report command displays.
    pub fn table_order(snapshot: &DatabaseSnapshot) -> Result<Vec<Identifier>> {
        Self::build_graph(snapshot).topological_sort()
    }

    fn build_graph(snapshot: &DatabaseSnapshot) -> DependencyGraph<String> {
        let mut graph = DependencyGraph::new();
        for table in &snapshot.tables {
            graph.add_node(table.name.clone());
        }
        for table in &snapshot.tables {
            for fk in &table.parent_keys {
                let label = fk
                    .child_key
                    .name
                    .clone()
                    .unwrap_or_else(|| "<unnamed>".to_string());
                graph.add_edge(fk.parent_table.clone(), fk.child_table.clone(), label);
            }
        }
        graph
    }
}

impl LintRule for ForeignKeyCycleRule {
    fn name(&self) -> &str {
        "foreign-key-cycle"
    }

    fn check(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<LintFinding>> {
        Self::table_order(snapshot)?;
        Ok(Vec::new())
    }
}

/// Flags tables without a primary key. Heap tables defeat replication and
/// make row identity ambiguous for diff-based data migration.
pub struct NoPrimaryKeyRule;

impl LintRule for NoPrimaryKeyRule {
    fn name(&self) -> &str {
        "no-primary-key"
    }

    fn check(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<LintFinding>> {
        let findings = snapshot
            .tables
            .iter()
            .filter(|t| t.primary_key.is_none())
            .map(|t| LintFinding {
                rule: self.name().to_string(),
                message: format!("table {} has no primary key", t.name),
            })
            .collect();
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::{IdentifierDefaults, NameResolution};
    use crate::error::SchemaError;
    use crate::schema::column::{Column, DataKind};
    use crate::schema::table::{Key, ReferentialAction, RelationalKey, Table};

    fn table_id(name: &str) -> Identifier {
        Identifier::with_schema("public", name).unwrap()
    }

    fn keyed_table(name: &str) -> Table {
        let mut table = Table::new(table_id(name));
        table.columns.push(Column::required("id", DataKind::Integer));
        table.primary_key = Some(Key::primary(
            Some(format!("pk_{name}")),
            vec!["id".to_string()],
        ));
        table
    }

    fn fk(child: &str, parent: &str) -> RelationalKey {
        RelationalKey {
            child_table: table_id(child),
            child_key: Key::foreign(
                Some(format!("fk_{child}_{parent}")),
                vec![format!("{parent}_id")],
            ),
            parent_table: table_id(parent),
            parent_key: Key::primary(Some(format!("pk_{parent}")), vec!["id".to_string()]),
            delete_action: ReferentialAction::NoAction,
            update_action: ReferentialAction::NoAction,
        }
    }

    fn snapshot(tables: Vec<Table>) -> DatabaseSnapshot {
        let mut s = DatabaseSnapshot::new(IdentifierDefaults::default(), NameResolution::Verbatim);
        s.tables = tables;
        s
    }

    #[test]
    fn test_acyclic_tables_order_parents_first() {
        let mut child = keyed_table("order_lines");
        child.parent_keys.push(fk("order_lines", "orders"));
        let snapshot = snapshot(vec![child, keyed_table("orders")]);

        let order = ForeignKeyCycleRule::table_order(&snapshot).unwrap();
        let names: Vec<&str> = order.iter().map(|id| id.local_name.as_str()).collect();
        assert_eq!(names, ["orders", "order_lines"]);
    }

    #[test]
    fn test_three_table_cycle_is_detected_with_edges() {
        let mut a = keyed_table("a");
        a.parent_keys.push(fk("a", "b"));
        let mut b = keyed_table("b");
        b.parent_keys.push(fk("b", "c"));
        let mut c = keyed_table("c");
        c.parent_keys.push(fk("c", "a"));
        let snapshot = snapshot(vec![a, b, c]);

        let err = Linter::with_default_rules().lint(&snapshot).unwrap_err();
        let SchemaError::CycleDetected { edges } = err else {
            panic!("expected cycle, got {err:?}");
        };
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut node = keyed_table("categories");
        node.parent_keys.push(fk("categories", "categories"));
        let snapshot = snapshot(vec![node]);
        let err = ForeignKeyCycleRule::table_order(&snapshot).unwrap_err();
        assert!(matches!(err, SchemaError::CycleDetected { .. }));
    }

    #[test]
    fn test_heap_table_yields_finding() {
        let mut heap = Table::new(table_id("audit_log"));
        heap.columns.push(Column::nullable("entry", DataKind::Text));
        let snapshot = snapshot(vec![keyed_table("orders"), heap]);

        let findings = Linter::with_default_rules().lint(&snapshot).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "no-primary-key");
        assert!(findings[0].message.contains("audit_log"));
    }
}
