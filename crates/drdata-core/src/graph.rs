use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;

/// Table order in which every non-nullable foreign key target comes before
/// the tables that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsertionOrder(Vec<String>);

impl InsertionOrder {
    pub fn tables(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.0.iter().position(|name| name == table)
    }

    /// Exact reverse: children are emptied before their parents.
    pub fn truncation_order(&self) -> Vec<String> {
        self.0.iter().rev().cloned().collect()
    }

    /// Subsequence of tables present in `available`, order preserved.
    pub fn restricted_to(&self, available: &BTreeSet<String>) -> Vec<String> {
        self.0
            .iter()
            .filter(|table| available.contains(*table))
            .cloned()
            .collect()
    }
}

/// Node and edge counts of the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Builds the FK dependency graph of a snapshot and orders it.
///
/// Each non-nullable foreign key contributes an edge from the referenced
/// table to the referencing one. Nullable keys contribute nothing: they can
/// be satisfied with NULL, so they never constrain the order.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    graph: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyResolver {
    pub fn new(snapshot: &SchemaSnapshot) -> Self {
        let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for table in snapshot.tables.values() {
            graph.entry(table.name.clone()).or_default();

            for fk in table.required_foreign_keys() {
                graph
                    .entry(fk.referenced_table.clone())
                    .or_default()
                    .insert(table.name.clone());
            }
        }

        Self { graph }
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.graph.len(),
            edges: self.graph.values().map(BTreeSet::len).sum(),
        }
    }

    /// Deterministic topological order (smallest ready name first).
    pub fn resolve(&self) -> Result<InsertionOrder> {
        let mut indegree: BTreeMap<&str, usize> =
            self.graph.keys().map(|node| (node.as_str(), 0)).collect();

        for targets in self.graph.values() {
            for target in targets {
                *indegree.entry(target.as_str()).or_insert(0) += 1;
            }
        }

        let mut ready: BTreeSet<&str> = indegree
            .iter()
            .filter_map(|(node, count)| (*count == 0).then_some(*node))
            .collect();
        let mut order = Vec::with_capacity(self.graph.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.to_string());

            if let Some(targets) = self.graph.get(node) {
                for target in targets {
                    if let Some(count) = indegree.get_mut(target.as_str()) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            ready.insert(target.as_str());
                        }
                    }
                }
            }
        }

        if order.len() == self.graph.len() {
            return Ok(InsertionOrder(order));
        }

        let blocked: BTreeSet<&str> = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect();

        Err(Error::CyclicDependency {
            tables: self.cycle_members(&blocked),
        })
    }

    /// Blocked nodes that can reach themselves; nodes that are merely
    /// downstream of a cycle are left out.
    fn cycle_members(&self, blocked: &BTreeSet<&str>) -> Vec<String> {
        blocked
            .iter()
            .filter(|node| self.reaches(node, node, blocked))
            .map(|node| node.to_string())
            .collect()
    }

    fn reaches(&self, from: &str, to: &str, within: &BTreeSet<&str>) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();

        while let Some(node) = stack.pop() {
            let Some(targets) = self.graph.get(node) else {
                continue;
            };
            for target in targets {
                if target == to {
                    return true;
                }
                if within.contains(target.as_str()) && seen.insert(target.as_str()) {
                    stack.push(target.as_str());
                }
            }
        }

        false
    }
}

/// Resolve the insertion order of `snapshot`.
pub fn resolve_insertion_order(snapshot: &SchemaSnapshot) -> Result<InsertionOrder> {
    DependencyResolver::new(snapshot).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ForeignKey;
    use crate::schema::{Column, Table};
    use crate::types::{IntegerWidth, SemanticType};

    fn column(name: &str, nullable: bool) -> Column {
        Column {
            ordinal_position: 1,
            name: name.to_string(),
            declared_type: "integer".to_string(),
            semantic_type: SemanticType::Integer {
                width: IntegerWidth::Regular,
            },
            is_nullable: nullable,
            default: None,
            max_length: None,
            numeric_precision: Some(32),
            numeric_scale: Some(0),
            is_unique: name == "id",
            is_primary_key: name == "id",
            is_generated: false,
        }
    }

    fn table(name: &str, refs: &[(&str, &str, bool)]) -> Table {
        let mut columns = vec![column("id", false)];
        let mut foreign_keys = Vec::new();
        for (fk_column, referenced, nullable) in refs {
            columns.push(column(fk_column, *nullable));
            foreign_keys.push(ForeignKey {
                name: Some(format!("{name}_{fk_column}_fkey")),
                columns: vec![fk_column.to_string()],
                referenced_table: referenced.to_string(),
                referenced_columns: vec!["id".to_string()],
                is_nullable: *nullable,
            });
        }
        Table {
            name: name.to_string(),
            columns,
            primary_key: vec!["id".to_string()],
            unique_constraints: Vec::new(),
            foreign_keys,
        }
    }

    fn snapshot(tables: Vec<Table>) -> SchemaSnapshot {
        SchemaSnapshot {
            engine: "postgres".to_string(),
            database: Some("shop".to_string()),
            namespace: "public".to_string(),
            tables: tables
                .into_iter()
                .map(|table| (table.name.clone(), table))
                .collect(),
        }
    }

    fn names(order: &InsertionOrder) -> Vec<&str> {
        order.iter().collect()
    }

    #[test]
    fn orders_parents_before_children() {
        let schema = snapshot(vec![
            table("orders", &[("customer_id", "customers", false)]),
            table("customers", &[]),
        ]);

        let order = resolve_insertion_order(&schema).expect("order");
        assert_eq!(names(&order), vec!["customers", "orders"]);
    }

    #[test]
    fn every_required_dependency_precedes_its_dependent() {
        let schema = snapshot(vec![
            table("a", &[]),
            table("b", &[("a_id", "a", false)]),
            table("c", &[("b_id", "b", false), ("e_id", "e", false)]),
            table("d", &[("a_id", "a", false), ("c_id", "c", false)]),
            table("e", &[]),
            table("f", &[("d_id", "d", true)]),
        ]);

        let order = resolve_insertion_order(&schema).expect("order");
        assert_eq!(order.len(), schema.tables.len());
        for table in schema.tables.values() {
            let child = order.position(&table.name).unwrap();
            for fk in table.required_foreign_keys() {
                let parent = order.position(&fk.referenced_table).unwrap();
                assert!(parent < child, "{} must precede {}", fk.referenced_table, table.name);
            }
        }
    }

    #[test]
    fn ties_break_alphabetically_and_repeat() {
        let schema = snapshot(vec![
            table("zebra", &[]),
            table("apple", &[]),
            table("mango", &[("apple_id", "apple", false)]),
            table("kiwi", &[]),
        ]);

        let first = resolve_insertion_order(&schema).expect("order");
        let second = resolve_insertion_order(&schema).expect("order");
        assert_eq!(names(&first), vec!["apple", "kiwi", "mango", "zebra"]);
        assert_eq!(first, second);
    }

    #[test]
    fn mutual_required_keys_are_a_cycle() {
        let schema = snapshot(vec![
            table("a", &[("b_id", "b", false)]),
            table("b", &[("a_id", "a", false)]),
        ]);

        match resolve_insertion_order(&schema) {
            Err(Error::CyclicDependency { tables }) => {
                assert_eq!(tables, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn cycle_report_omits_downstream_tables() {
        let schema = snapshot(vec![
            table("a", &[("b_id", "b", false)]),
            table("b", &[("a_id", "a", false)]),
            table("c", &[("a_id", "a", false)]),
            table("root", &[]),
        ]);

        let err = resolve_insertion_order(&schema).unwrap_err();
        match err {
            Error::CyclicDependency { tables } => assert_eq!(tables, vec!["a", "b"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn required_self_reference_is_a_cycle() {
        let schema = snapshot(vec![table("nodes", &[("parent_id", "nodes", false)])]);

        let err = resolve_insertion_order(&schema).unwrap_err();
        assert!(err.to_string().contains("nodes"));
    }

    #[test]
    fn nullable_keys_break_cycles() {
        let schema = snapshot(vec![
            table("a", &[("b_id", "b", true)]),
            table("b", &[("a_id", "a", false)]),
            table("employees", &[("manager_id", "employees", true)]),
        ]);

        let order = resolve_insertion_order(&schema).expect("order");
        assert_eq!(names(&order), vec!["a", "b", "employees"]);
    }

    #[test]
    fn truncation_is_exact_reverse() {
        let schema = snapshot(vec![
            table("customers", &[]),
            table("orders", &[("customer_id", "customers", false)]),
            table("items", &[("order_id", "orders", false)]),
        ]);

        let order = resolve_insertion_order(&schema).expect("order");
        let mut reversed = order.tables().to_vec();
        reversed.reverse();
        assert_eq!(order.truncation_order(), reversed);
        assert_eq!(order.truncation_order(), vec!["items", "orders", "customers"]);
    }

    #[test]
    fn restriction_keeps_relative_order() {
        let schema = snapshot(vec![
            table("customers", &[]),
            table("orders", &[("customer_id", "customers", false)]),
            table("items", &[("order_id", "orders", false)]),
        ]);
        let order = resolve_insertion_order(&schema).expect("order");
        let available: BTreeSet<String> = ["items".to_string(), "customers".to_string()].into();

        assert_eq!(order.restricted_to(&available), vec!["customers", "items"]);
    }

    #[test]
    fn summary_counts_only_required_edges() {
        let schema = snapshot(vec![
            table("a", &[]),
            table("b", &[("a_id", "a", false), ("other_a", "a", true)]),
        ]);

        let summary = DependencyResolver::new(&schema).summary();
        assert_eq!(summary, GraphSummary { nodes: 2, edges: 1 });
    }
}
