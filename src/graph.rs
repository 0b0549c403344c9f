//! Named Type Graph
//!
//! [`TypeIndex`] maps every full name defined under a set of roots to its
//! definition so that [`Schema::Ref`] nodes can be followed. [`TypeGraph`]
//! lays the same definitions out as a petgraph digraph of references, which
//! is used to report recursive type groups (SCCs).

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

use crate::rules::{PathSegment, SchemaPath, Violation, TYPE_DUPLICATE_DEFINITION};
use crate::schema::Schema;

/// Full name of a record, enum or fixed
pub type TypeName = String;

// =============================================================================
// Type Index
// =============================================================================

/// Definitions of the named types reachable from a set of roots
#[derive(Debug, Default)]
pub struct TypeIndex<'a> {
    definitions: HashMap<TypeName, &'a Schema>,
    /// Definition order, for deterministic iteration
    order: Vec<TypeName>,
}

impl<'a> TypeIndex<'a> {
    /// Index every record, enum and fixed defined under `roots`.
    ///
    /// A full name defined twice with different content yields a
    /// duplicate-definition violation, located under the root that brought in
    /// the second definition; the first definition wins.
    pub fn build(roots: &'a [Schema]) -> (Self, Vec<Violation>) {
        let mut index = Self::default();
        let mut violations = Vec::new();
        for root in roots {
            let mut path = SchemaPath::new();
            if let Some(name) = root.full_name() {
                path.push(PathSegment::Type(name.to_string()));
            }
            index.collect(root, &path, &mut violations);
        }
        (index, violations)
    }

    fn collect(&mut self, schema: &'a Schema, root: &SchemaPath, violations: &mut Vec<Violation>) {
        match schema {
            Schema::Record(record) => {
                if self.insert(&record.name, schema, root, violations) {
                    for field in &record.fields {
                        self.collect(&field.schema, root, violations);
                    }
                }
            }
            Schema::Enum(e) => {
                self.insert(&e.name, schema, root, violations);
            }
            Schema::Fixed(f) => {
                self.insert(&f.name, schema, root, violations);
            }
            Schema::Logical { underlying, .. } => self.collect(underlying, root, violations),
            Schema::Union(union) => {
                for member in &union.members {
                    self.collect(member, root, violations);
                }
            }
            Schema::Array { items } => self.collect(items, root, violations),
            Schema::Map { values } => self.collect(values, root, violations),
            Schema::Primitive { .. } | Schema::Ref { .. } => {}
        }
    }

    /// Returns true when `schema` is a new definition whose children still
    /// need indexing.
    fn insert(&mut self, name: &str, schema: &'a Schema, root: &SchemaPath, violations: &mut Vec<Violation>) -> bool {
        match self.definitions.get(name) {
            Some(existing) => {
                if *existing != schema {
                    let path = if root.root() == Some(name) {
                        root.clone()
                    } else {
                        root.child(PathSegment::Type(name.to_string()))
                    };
                    violations.push(Violation::new(
                        path,
                        TYPE_DUPLICATE_DEFINITION,
                        format!("Type {} is defined more than once with different content.", name),
                    ));
                }
                false
            }
            None => {
                self.definitions.insert(name.to_string(), schema);
                self.order.push(name.to_string());
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Schema> {
        self.definitions.get(name).copied()
    }

    /// Full names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

// =============================================================================
// Type Graph
// =============================================================================

/// Reference graph between named types: an edge `A -> B` means a field
/// somewhere inside `A` has type `B` (directly, or through a union, array or map).
pub struct TypeGraph {
    graph: DiGraph<TypeName, ()>,
}

impl TypeGraph {
    pub fn from_index(index: &TypeIndex<'_>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<TypeName, NodeIndex> = HashMap::new();
        for name in index.names() {
            nodes.insert(name.to_string(), graph.add_node(name.to_string()));
        }

        for name in index.names() {
            let Some(Schema::Record(record)) = index.get(name) else {
                continue;
            };
            let mut targets = BTreeSet::new();
            for field in &record.fields {
                referenced_types(&field.schema, &mut targets);
            }
            let from = nodes[name];
            for target in targets {
                // Unresolved references are reported by the validator, not here
                if let Some(&to) = nodes.get(target) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph }
    }

    pub fn type_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn reference_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Groups of mutually recursive types, including single self-referential
    /// types. Members and groups are sorted by name.
    pub fn recursive_groups(&self) -> Vec<Vec<TypeName>> {
        let mut groups: Vec<Vec<TypeName>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || self
                        .graph
                        .edges_directed(scc[0], Direction::Outgoing)
                        .any(|e| e.target() == scc[0])
            })
            .map(|scc| {
                let mut members: Vec<TypeName> = scc.iter().map(|idx| self.graph[*idx].clone()).collect();
                members.sort();
                members
            })
            .collect();
        groups.sort();
        groups
    }
}

/// Names of the named types a field type points at, without entering them
fn referenced_types<'s>(schema: &'s Schema, out: &mut BTreeSet<&'s str>) {
    match schema {
        Schema::Record(r) => {
            out.insert(&r.name);
        }
        Schema::Enum(e) => {
            out.insert(&e.name);
        }
        Schema::Fixed(f) => {
            out.insert(&f.name);
        }
        Schema::Ref { name } => {
            out.insert(name);
        }
        Schema::Logical { underlying, .. } => referenced_types(underlying, out),
        Schema::Union(union) => {
            for member in &union.members {
                referenced_types(member, out);
            }
        }
        Schema::Array { items } => referenced_types(items, out),
        Schema::Map { values } => referenced_types(values, out),
        Schema::Primitive { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, Field, FixedSchema, LogicalType, RecordSchema};

    fn linked_list() -> Schema {
        RecordSchema::new("org.example.Node")
            .with_field(Field::new("value", Schema::string()))
            .with_field(Field::new(
                "next",
                Schema::union(vec![Schema::null(), Schema::reference("org.example.Node")]),
            ))
            .into()
    }

    #[test]
    fn test_index_collects_nested_definitions() {
        let roots: Vec<Schema> = vec![RecordSchema::new("org.example.Outer")
            .with_field(Field::new("state", EnumSchema::new("org.example.State", ["ON", "OFF"]).into()))
            .with_field(Field::new("items", Schema::array(linked_list())))
            .into()];
        let (index, violations) = TypeIndex::build(&roots);

        assert!(violations.is_empty());
        assert_eq!(
            index.names().collect::<Vec<_>>(),
            vec!["org.example.Outer", "org.example.State", "org.example.Node"]
        );
        assert!(index.get("org.example.Missing").is_none());
    }

    #[test]
    fn test_conflicting_definitions() {
        let roots: Vec<Schema> = vec![
            EnumSchema::new("org.example.State", ["ON"]).into(),
            EnumSchema::new("org.example.State", ["ON"]).into(),
            EnumSchema::new("org.example.State", ["OFF"]).into(),
        ];
        let (index, violations) = TypeIndex::build(&roots);

        assert_eq!(index.len(), 1);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, TYPE_DUPLICATE_DEFINITION);
        assert_eq!(violations[0].location.to_string(), "org.example.State");
    }

    #[test]
    fn test_conflicting_nested_definition_belongs_to_its_root() {
        let roots: Vec<Schema> = vec![
            RecordSchema::new("org.example.Phone")
                .with_field(Field::new("state", EnumSchema::new("org.example.State", ["ON"]).into()))
                .into(),
            RecordSchema::new("org.example.Watch")
                .with_field(Field::new("state", EnumSchema::new("org.example.State", ["OFF"]).into()))
                .into(),
        ];
        let (_, violations) = TypeIndex::build(&roots);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.root(), Some("org.example.Watch"));
        assert_eq!(violations[0].location.to_string(), "org.example.Watch<org.example.State>");
    }

    #[test]
    fn test_index_collects_fixed_types() {
        let roots: Vec<Schema> = vec![RecordSchema::new("org.example.Digest")
            .with_field(Field::new("md5", FixedSchema::new("org.example.Md5", 16).into()))
            .with_field(Field::new(
                "amount",
                Schema::logical(LogicalType::Decimal, FixedSchema::new("org.example.Amount", 8).into()),
            ))
            .into()];
        let (index, violations) = TypeIndex::build(&roots);

        assert!(violations.is_empty());
        assert!(matches!(index.get("org.example.Md5"), Some(Schema::Fixed(f)) if f.size == 16));
        assert!(index.get("org.example.Amount").is_some());
    }

    #[test]
    fn test_recursive_groups() {
        let roots: Vec<Schema> = vec![
            linked_list(),
            RecordSchema::new("org.example.A")
                .with_field(Field::new("b", RecordSchema::new("org.example.B")
                    .with_field(Field::new("a", Schema::union(vec![Schema::null(), Schema::reference("org.example.A")])))
                    .into()))
                .into(),
            RecordSchema::new("org.example.Leaf").with_field(Field::new("x", Schema::string())).into(),
        ];
        let (index, _) = TypeIndex::build(&roots);
        let graph = TypeGraph::from_index(&index);

        assert_eq!(graph.type_count(), 4);
        assert_eq!(graph.reference_count(), 3);
        assert_eq!(
            graph.recursive_groups(),
            vec![
                vec!["org.example.A".to_string(), "org.example.B".to_string()],
                vec!["org.example.Node".to_string()],
            ]
        );
    }
}
