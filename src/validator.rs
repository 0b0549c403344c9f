//! Schema graph walker
//!
//! [`SchemaValidator::validate`] walks every root through the configured
//! [`TypeRules`] and collects every violation into one report. Each root gets
//! its own [`Pass`], whose visited set guarantees a named type is validated at
//! most once and that recursive types terminate.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::ValidatorConfig;
use crate::error::{Result, SchemaError};
use crate::graph::{TypeGraph, TypeIndex, TypeName};
use crate::report::ValidationReport;
use crate::rules::{valid, ConventionTypeRules, PathSegment, SchemaPath, Scope, TypeRules, Violation, TYPE_UNRESOLVED};
use crate::schema::Schema;

// =============================================================================
// Pass
// =============================================================================

/// State of one descent from one root: the current location and the named
/// types already validated.
pub struct Pass<'a> {
    types: &'a TypeIndex<'a>,
    visited: HashSet<TypeName>,
    path: SchemaPath,
}

impl<'a> Pass<'a> {
    pub fn new(types: &'a TypeIndex<'a>) -> Self {
        Self {
            types,
            visited: HashSet::new(),
            path: SchemaPath::new(),
        }
    }

    /// The scope rules see at the current location
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.path, self.types)
    }

    pub fn path(&self) -> &SchemaPath {
        &self.path
    }

    pub fn enter(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Dispatch on any schema node
    pub fn descend(&mut self, schema: &Schema, rules: &dyn TypeRules) -> Vec<Violation> {
        match schema {
            Schema::Primitive { .. } => valid(),
            Schema::Logical { underlying, .. } => self.descend(underlying, rules),
            Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_) | Schema::Ref { .. } => {
                self.validate_named(schema, rules)
            }
            Schema::Union(union) => rules.validate_union(union, self),
            Schema::Array { items } => self.within(PathSegment::ArrayItems, |pass| pass.descend(items, rules)),
            Schema::Map { values } => self.within(PathSegment::MapValues, |pass| pass.descend(values, rules)),
        }
    }

    /// Validate a record, enum, fixed or reference, unless this pass already has
    pub fn validate_named(&mut self, schema: &Schema, rules: &dyn TypeRules) -> Vec<Violation> {
        let types = self.types;
        let definition = match schema {
            Schema::Ref { name } => match types.get(name) {
                Some(definition) => definition,
                None => {
                    return vec![self
                        .scope()
                        .violation(TYPE_UNRESOLVED, format!("Type {} is not defined.", name))];
                }
            },
            other => other,
        };

        match definition {
            Schema::Record(record) => self.visit(&record.name, |pass| rules.validate_record(record, pass)),
            Schema::Enum(e) => self.visit(&e.name, |pass| rules.validate_enum(e, pass)),
            // A fixed has nothing to check beyond its name resolving
            Schema::Fixed(f) => self.visit(&f.name, |_| valid()),
            Schema::Primitive { .. }
            | Schema::Logical { .. }
            | Schema::Union(_)
            | Schema::Array { .. }
            | Schema::Map { .. } => self.descend(definition, rules),
            // The index only holds records and enums
            Schema::Ref { .. } => valid(),
        }
    }

    fn visit<F>(&mut self, name: &str, validate: F) -> Vec<Violation>
    where
        F: FnOnce(&mut Self) -> Vec<Violation>,
    {
        if self.is_visited(name) {
            debug!(name, at = %self.path, "already validated in this pass");
            return valid();
        }
        self.visited.insert(name.to_string());
        self.within(PathSegment::Type(name.to_string()), validate)
    }

    fn within<F>(&mut self, segment: PathSegment, f: F) -> Vec<Violation>
    where
        F: FnOnce(&mut Self) -> Vec<Violation>,
    {
        self.enter(segment);
        let violations = f(self);
        self.leave();
        violations
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates schema graphs against a set of type rules
pub struct SchemaValidator {
    rules: Box<dyn TypeRules>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    /// Validator with the default conventions
    pub fn new() -> Self {
        Self::with_rules(ConventionTypeRules::default())
    }

    pub fn with_rules(rules: impl TypeRules + 'static) -> Self {
        Self { rules: Box::new(rules) }
    }

    /// Validator with conventions from configuration
    pub fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let rules = ConventionTypeRules::from_config(&config.rules, &config.documentation)?;
        Ok(Self::with_rules(rules))
    }

    /// Validate every root, collecting all violations.
    ///
    /// Broken schemas never make this fail; errors are reserved for calls the
    /// validator cannot serve: no roots, or a root that is not a record or enum.
    pub fn validate(&self, roots: &[Schema]) -> Result<ValidationReport> {
        if roots.is_empty() {
            return Err(SchemaError::EmptyInput);
        }
        let mut names = Vec::with_capacity(roots.len());
        for root in roots {
            match root {
                Schema::Record(r) => names.push(r.name.clone()),
                Schema::Enum(e) => names.push(e.name.clone()),
                other => {
                    return Err(SchemaError::InvalidRoot {
                        kind: other.kind().to_string(),
                    })
                }
            }
        }

        let (types, mut violations) = TypeIndex::build(roots);
        if tracing::enabled!(tracing::Level::DEBUG) && !types.is_empty() {
            let graph = TypeGraph::from_index(&types);
            debug!(
                types = graph.type_count(),
                references = graph.reference_count(),
                "indexed named types"
            );
            for group in graph.recursive_groups() {
                debug!(types = ?group, "recursive type group");
            }
        }

        for root in roots {
            let mut pass = Pass::new(&types);
            let found = pass.descend(root, self.rules.as_ref());
            debug!(
                root = root.full_name().unwrap_or_default(),
                visited = pass.visited_count(),
                violations = found.len(),
                "validated root"
            );
            violations.extend(found);
        }

        let report = ValidationReport::new(names, violations);
        info!(
            roots = roots.len(),
            types = types.len(),
            violations = report.len(),
            "schema validation finished"
        );
        Ok(report)
    }

    /// Validate a single root
    pub fn validate_one(&self, root: &Schema) -> Result<ValidationReport> {
        self.validate(std::slice::from_ref(root))
    }
}
