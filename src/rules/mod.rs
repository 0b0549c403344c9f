//! Schema Convention Rules
//!
//! A rule is a pure function from an input (a field, a record, an enum, a
//! union) to the violations it finds. Rules compose with [`Rule::and`], which
//! always evaluates both sides so that every problem with an input is reported
//! in one pass.
//!
//! ## Rule sets
//! - [`field`]: naming, documentation and default-value rules per field
//! - [`types`]: record, enum and union rules, and descent into nested types
//! - [`documentation`]: the shared documentation quality policy

pub mod documentation;
pub mod field;
pub mod types;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::TypeIndex;
use crate::schema::Schema;

pub use documentation::DocumentationPolicy;
pub use field::{ConventionFieldRules, FieldRules};
pub use types::{ConventionTypeRules, TypeRules};

// =============================================================================
// Rule codes
// =============================================================================

pub const FIELD_NAME_CASE: &str = "FIELD_NAME_CASE";
pub const FIELD_NAME_SUFFIX: &str = "FIELD_NAME_SUFFIX";
pub const FIELD_DOC: &str = "FIELD_DOC";
pub const FIELD_DEFAULT_ENUM: &str = "FIELD_DEFAULT_ENUM";
pub const FIELD_DEFAULT_UNION: &str = "FIELD_DEFAULT_UNION";
pub const FIELD_DEFAULT_NONE: &str = "FIELD_DEFAULT_NONE";
pub const RECORD_NAME: &str = "RECORD_NAME";
pub const RECORD_NAMESPACE: &str = "RECORD_NAMESPACE";
pub const RECORD_DOC: &str = "RECORD_DOC";
pub const RECORD_FIELDS_EMPTY: &str = "RECORD_FIELDS_EMPTY";
pub const RECORD_FIELD_DUPLICATE: &str = "RECORD_FIELD_DUPLICATE";
pub const ENUM_NAME: &str = "ENUM_NAME";
pub const ENUM_DOC: &str = "ENUM_DOC";
pub const ENUM_SYMBOLS_EMPTY: &str = "ENUM_SYMBOLS_EMPTY";
pub const ENUM_SYMBOL_CASE: &str = "ENUM_SYMBOL_CASE";
pub const ENUM_SYMBOL_DUPLICATE: &str = "ENUM_SYMBOL_DUPLICATE";
pub const ENUM_DEFAULT_SYMBOL: &str = "ENUM_DEFAULT_SYMBOL";
pub const UNION_DUPLICATE_KIND: &str = "UNION_DUPLICATE_KIND";
pub const UNION_NESTED: &str = "UNION_NESTED";
pub const TYPE_UNRESOLVED: &str = "TYPE_UNRESOLVED";
pub const TYPE_DUPLICATE_DEFINITION: &str = "TYPE_DUPLICATE_DEFINITION";

/// Every built-in rule code with a one-line description
pub const BUILTIN_RULES: &[(&str, &str)] = &[
    (FIELD_NAME_CASE, "Field names are lowerCamelCase"),
    (FIELD_NAME_SUFFIX, "Field names do not end with a disallowed suffix"),
    (FIELD_DOC, "Fields carry documentation"),
    (FIELD_DEFAULT_ENUM, "Enum fields with an UNKNOWN symbol default to UNKNOWN"),
    (FIELD_DEFAULT_UNION, "Nullable union fields default to null"),
    (FIELD_DEFAULT_NONE, "Other fields declare no default"),
    (RECORD_NAME, "Record names are UpperCamelCase"),
    (RECORD_NAMESPACE, "Record namespaces are lowercase dotted identifiers"),
    (RECORD_DOC, "Records carry documentation"),
    (RECORD_FIELDS_EMPTY, "Records declare at least one field"),
    (RECORD_FIELD_DUPLICATE, "Field names are unique within a record"),
    (ENUM_NAME, "Enum names are UpperCamelCase"),
    (ENUM_DOC, "Enums carry documentation"),
    (ENUM_SYMBOLS_EMPTY, "Enums declare at least one symbol"),
    (ENUM_SYMBOL_CASE, "Enum symbols are UPPER_SNAKE_CASE"),
    (ENUM_SYMBOL_DUPLICATE, "Enum symbols are unique"),
    (ENUM_DEFAULT_SYMBOL, "An enum's declared default is one of its symbols"),
    (UNION_DUPLICATE_KIND, "A union has at most one member of each unnamed kind"),
    (UNION_NESTED, "A union does not directly contain another union"),
    (TYPE_UNRESOLVED, "Type references resolve to a named type"),
    (TYPE_DUPLICATE_DEFINITION, "A full name has exactly one definition"),
];

// =============================================================================
// Location
// =============================================================================

/// A step on the path from a validation root to a violation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Entered a named type
    Type(String),
    /// A field of the current record
    Field(String),
    /// A member of a union, by position
    UnionMember(usize),
    /// Array items
    ArrayItems,
    /// Map values
    MapValues,
    /// A symbol of the current enum
    Symbol(String),
}

/// Path from the validation root to a location in the schema graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaPath(Vec<PathSegment>);

impl SchemaPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// A copy of this path extended by one segment
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Full name of the root type this path starts at
    pub fn root(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Type(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Type(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Type(name) => write!(f, "<{}>", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::UnionMember(index) => write!(f, "[{}]", index)?,
                PathSegment::ArrayItems => f.write_str("[]")?,
                PathSegment::MapValues => f.write_str("[*]")?,
                PathSegment::Symbol(symbol) => write!(f, "::{}", symbol)?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Violation
// =============================================================================

/// One broken rule at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub location: SchemaPath,
    pub rule: String,
    pub message: String,
}

impl Violation {
    pub fn new(location: SchemaPath, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location,
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.location, self.message, self.rule)
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Where a rule is being applied: the current location and the named types
/// visible to the pass.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub path: &'a SchemaPath,
    pub types: &'a TypeIndex<'a>,
}

impl<'a> Scope<'a> {
    pub fn new(path: &'a SchemaPath, types: &'a TypeIndex<'a>) -> Self {
        Self { path, types }
    }

    /// A violation at the current location
    pub fn violation(&self, rule: &str, message: impl Into<String>) -> Violation {
        Violation::new(self.path.clone(), rule, message)
    }

    /// A violation one segment below the current location
    pub fn violation_at(&self, segment: PathSegment, rule: &str, message: impl Into<String>) -> Violation {
        Violation::new(self.path.child(segment), rule, message)
    }

    /// Follow a reference to its definition. Non-reference schemas resolve to
    /// themselves; an unknown reference resolves to `None`.
    pub fn resolve<'s>(&self, schema: &'s Schema) -> Option<&'s Schema>
    where
        'a: 's,
    {
        match schema {
            Schema::Ref { name } => self.types.get(name),
            other => Some(other),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

type RuleFn<T> = dyn Fn(&T, &Scope<'_>) -> Vec<Violation> + Send + Sync;

/// A pure check over `T` yielding zero or more violations
pub struct Rule<T: ?Sized> {
    check: Box<RuleFn<T>>,
}

impl<T: ?Sized + 'static> Rule<T> {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&T, &Scope<'_>) -> Vec<Violation> + Send + Sync + 'static,
    {
        Self { check: Box::new(check) }
    }

    /// A rule that never fails
    pub fn always_valid() -> Self {
        Self::new(|_, _| valid())
    }

    pub fn apply(&self, input: &T, scope: &Scope<'_>) -> Vec<Violation> {
        (self.check)(input, scope)
    }

    /// Both rules, always both evaluated, violations concatenated in order
    pub fn and(self, other: Rule<T>) -> Rule<T> {
        Rule::new(move |input, scope| {
            let mut violations = self.apply(input, scope);
            violations.extend(other.apply(input, scope));
            violations
        })
    }

    /// Passes when either rule passes; when both fail both sets are reported
    pub fn or(self, other: Rule<T>) -> Rule<T> {
        Rule::new(move |input, scope| {
            let first = self.apply(input, scope);
            if first.is_empty() {
                return first;
            }
            let second = other.apply(input, scope);
            if second.is_empty() {
                return second;
            }
            let mut violations = first;
            violations.extend(second);
            violations
        })
    }

    /// AND-composition of any number of rules
    pub fn all(rules: impl IntoIterator<Item = Rule<T>>) -> Rule<T> {
        rules
            .into_iter()
            .reduce(Rule::and)
            .unwrap_or_else(Rule::always_valid)
    }
}

impl<T: ?Sized> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule")
    }
}

/// No violations
pub fn valid() -> Vec<Violation> {
    Vec::new()
}

/// The violation when `condition` does not hold, nothing otherwise
pub fn check(condition: bool, violation: impl FnOnce() -> Violation) -> Vec<Violation> {
    if condition {
        valid()
    } else {
        vec![violation()]
    }
}

/// A rule checking a string attribute of `T` against `pattern`
pub fn matches<T, E, M>(pattern: Regex, extract: E, on_mismatch: M) -> Rule<T>
where
    T: ?Sized + 'static,
    E: Fn(&T) -> &str + Send + Sync + 'static,
    M: Fn(&T, &Scope<'_>) -> Violation + Send + Sync + 'static,
{
    Rule::new(move |input, scope| {
        check(pattern.is_match(extract(input)), || on_mismatch(input, scope))
    })
}

/// Compile a rule pattern, naming the rule in the error
pub(crate) fn compile(rule: &'static str, pattern: &str) -> crate::Result<Regex> {
    Regex::new(pattern).map_err(|source| crate::SchemaError::InvalidPattern { rule, source })
}
