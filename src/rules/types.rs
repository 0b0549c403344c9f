//! Type rules
//!
//! Structural and naming constraints for records, enums and unions. A record
//! applies the field rules to each of its fields in declaration order and
//! descends into every nested type it references.

use regex::Regex;
use std::collections::HashSet;
use tracing::trace;

use super::documentation::DocumentationPolicy;
use super::field::{ConventionFieldRules, FieldRules};
use super::{
    check, compile, matches, valid, PathSegment, Rule, Scope, Violation, ENUM_DEFAULT_SYMBOL, ENUM_DOC,
    ENUM_NAME, ENUM_SYMBOLS_EMPTY, ENUM_SYMBOL_CASE, ENUM_SYMBOL_DUPLICATE, RECORD_DOC,
    RECORD_FIELDS_EMPTY, RECORD_FIELD_DUPLICATE, RECORD_NAME, RECORD_NAMESPACE, UNION_DUPLICATE_KIND,
    UNION_NESTED,
};
use crate::config::RuleConfig;
use crate::schema::{EnumSchema, Field, RecordSchema, Schema, UnionSchema};
use crate::validator::Pass;

/// UpperCamelCase
pub const TYPE_NAME_PATTERN: &str = r"^[A-Z][a-zA-Z0-9]*$";

/// Lowercase dotted identifiers
pub const NAMESPACE_PATTERN: &str = r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$";

/// UPPER_SNAKE_CASE
pub const ENUM_SYMBOL_PATTERN: &str = r"^[A-Z][A-Z0-9_]*$";

/// Rules for named types and unions
pub trait TypeRules: Send + Sync {
    /// Record constraints, every field rule, and descent into field types
    fn validate_record(&self, record: &RecordSchema, pass: &mut Pass<'_>) -> Vec<Violation>;

    fn validate_enum(&self, schema: &EnumSchema, pass: &mut Pass<'_>) -> Vec<Violation>;

    /// Union constraints and descent into each member
    fn validate_union(&self, union: &UnionSchema, pass: &mut Pass<'_>) -> Vec<Violation>;
}

/// The default type conventions
pub struct ConventionTypeRules {
    fields: Box<dyn FieldRules>,
    field_rule: Rule<Field>,
    record_rule: Rule<RecordSchema>,
    enum_rule: Rule<EnumSchema>,
    union_rule: Rule<UnionSchema>,
}

impl Default for ConventionTypeRules {
    fn default() -> Self {
        Self::with_field_rules(ConventionFieldRules::default(), &TypeConventions::default())
    }
}

/// Compiled patterns and toggles for the type rules
#[derive(Debug, Clone)]
struct TypeConventions {
    type_name: Regex,
    namespace: Regex,
    enum_symbol: Regex,
    documentation: Option<DocumentationPolicy>,
}

impl Default for TypeConventions {
    fn default() -> Self {
        Self {
            type_name: Regex::new(TYPE_NAME_PATTERN).expect("built-in type name pattern compiles"),
            namespace: Regex::new(NAMESPACE_PATTERN).expect("built-in namespace pattern compiles"),
            enum_symbol: Regex::new(ENUM_SYMBOL_PATTERN).expect("built-in enum symbol pattern compiles"),
            documentation: Some(DocumentationPolicy::default()),
        }
    }
}

impl ConventionTypeRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration; fails when a configured pattern does not compile
    pub fn from_config(rules: &RuleConfig, documentation: &DocumentationPolicy) -> crate::Result<Self> {
        let conventions = TypeConventions {
            type_name: compile(RECORD_NAME, &rules.type_name_pattern)?,
            namespace: compile(RECORD_NAMESPACE, &rules.namespace_pattern)?,
            enum_symbol: compile(ENUM_SYMBOL_CASE, &rules.enum_symbol_pattern)?,
            documentation: rules.type_documentation.then(|| documentation.clone()),
        };
        let fields = ConventionFieldRules::from_config(rules, documentation)?;
        Ok(Self::with_field_rules(fields, &conventions))
    }

    fn with_field_rules(fields: impl FieldRules + 'static, conventions: &TypeConventions) -> Self {
        let field_rule = fields.validate_field();
        Self {
            fields: Box::new(fields),
            field_rule,
            record_rule: record_rules(conventions),
            enum_rule: enum_rules(conventions),
            union_rule: union_rules(),
        }
    }

    /// Replace the field rule set
    pub fn field_rules(mut self, fields: impl FieldRules + 'static) -> Self {
        self.field_rule = fields.validate_field();
        self.fields = Box::new(fields);
        self
    }

    /// Add a rule evaluated once per validated record
    pub fn with_record_rule(mut self, rule: Rule<RecordSchema>) -> Self {
        self.record_rule = std::mem::replace(&mut self.record_rule, Rule::always_valid()).and(rule);
        self
    }

    /// Add a rule evaluated once per validated enum
    pub fn with_enum_rule(mut self, rule: Rule<EnumSchema>) -> Self {
        self.enum_rule = std::mem::replace(&mut self.enum_rule, Rule::always_valid()).and(rule);
        self
    }
}

impl TypeRules for ConventionTypeRules {
    fn validate_record(&self, record: &RecordSchema, pass: &mut Pass<'_>) -> Vec<Violation> {
        trace!(name = %record.name, fields = record.fields.len(), "validating record");
        let mut violations = self.record_rule.apply(record, &pass.scope());

        for field in &record.fields {
            pass.enter(PathSegment::Field(field.name.clone()));
            violations.extend(self.field_rule.apply(field, &pass.scope()));
            violations.extend(self.fields.validate_field_types(field, self, pass));
            pass.leave();
        }
        violations
    }

    fn validate_enum(&self, schema: &EnumSchema, pass: &mut Pass<'_>) -> Vec<Violation> {
        trace!(name = %schema.name, symbols = schema.symbols.len(), "validating enum");
        self.enum_rule.apply(schema, &pass.scope())
    }

    fn validate_union(&self, union: &UnionSchema, pass: &mut Pass<'_>) -> Vec<Violation> {
        let mut violations = self.union_rule.apply(union, &pass.scope());
        for (index, member) in union.members.iter().enumerate() {
            pass.enter(PathSegment::UnionMember(index));
            violations.extend(pass.descend(member, self));
            pass.leave();
        }
        violations
    }
}

// =============================================================================
// Record rules
// =============================================================================

fn record_rules(conventions: &TypeConventions) -> Rule<RecordSchema> {
    let name = matches(
        conventions.type_name.clone(),
        |record: &RecordSchema| record.simple_name(),
        |record: &RecordSchema, scope: &Scope<'_>| {
            scope.violation(
                RECORD_NAME,
                format!("Record name {} should be UpperCamelCase.", record.simple_name()),
            )
        },
    );

    let namespace_pattern = conventions.namespace.clone();
    let namespace = Rule::new(move |record: &RecordSchema, scope: &Scope<'_>| match record.namespace() {
        Some(ns) => check(namespace_pattern.is_match(ns), || {
            scope.violation(
                RECORD_NAMESPACE,
                format!("Namespace {} should consist of lowercase dotted identifiers.", ns),
            )
        }),
        None => vec![scope.violation(RECORD_NAMESPACE, "Record does not declare a namespace.")],
    });

    let fields = Rule::new(|record: &RecordSchema, scope: &Scope<'_>| {
        let mut violations = check(!record.fields.is_empty(), || {
            scope.violation(RECORD_FIELDS_EMPTY, "Record declares no fields.")
        });
        let mut seen = HashSet::new();
        for field in &record.fields {
            if !seen.insert(field.name.as_str()) {
                violations.push(scope.violation_at(
                    PathSegment::Field(field.name.clone()),
                    RECORD_FIELD_DUPLICATE,
                    format!("Field {} is declared more than once.", field.name),
                ));
            }
        }
        violations
    });

    let rule = name.and(namespace).and(fields);
    match &conventions.documentation {
        Some(policy) => rule.and(policy.rule(RECORD_DOC, |record: &RecordSchema| record.doc.as_deref())),
        None => rule,
    }
}

// =============================================================================
// Enum rules
// =============================================================================

fn enum_rules(conventions: &TypeConventions) -> Rule<EnumSchema> {
    let name = matches(
        conventions.type_name.clone(),
        |schema: &EnumSchema| schema.simple_name(),
        |schema: &EnumSchema, scope: &Scope<'_>| {
            scope.violation(
                ENUM_NAME,
                format!("Enum name {} should be UpperCamelCase.", schema.simple_name()),
            )
        },
    );

    let symbol_pattern = conventions.enum_symbol.clone();
    let symbols = Rule::new(move |schema: &EnumSchema, scope: &Scope<'_>| {
        let mut violations = check(!schema.symbols.is_empty(), || {
            scope.violation(ENUM_SYMBOLS_EMPTY, "Enum declares no symbols.")
        });
        let mut seen = HashSet::new();
        for symbol in &schema.symbols {
            if !seen.insert(symbol.as_str()) {
                violations.push(scope.violation_at(
                    PathSegment::Symbol(symbol.clone()),
                    ENUM_SYMBOL_DUPLICATE,
                    format!("Symbol {} is declared more than once.", symbol),
                ));
            }
            if !symbol_pattern.is_match(symbol) {
                violations.push(scope.violation_at(
                    PathSegment::Symbol(symbol.clone()),
                    ENUM_SYMBOL_CASE,
                    format!("Symbol {} should be UPPER_SNAKE_CASE.", symbol),
                ));
            }
        }
        violations
    });

    let default = Rule::new(|schema: &EnumSchema, scope: &Scope<'_>| match &schema.default {
        Some(symbol) => check(schema.has_symbol(symbol), || {
            scope.violation(
                ENUM_DEFAULT_SYMBOL,
                format!("Enum default {} is not one of its symbols.", symbol),
            )
        }),
        None => valid(),
    });

    let rule = name.and(symbols).and(default);
    match &conventions.documentation {
        Some(policy) => rule.and(policy.rule(ENUM_DOC, |schema: &EnumSchema| schema.doc.as_deref())),
        None => rule,
    }
}

// =============================================================================
// Union rules
// =============================================================================

fn union_rules() -> Rule<UnionSchema> {
    Rule::new(|union: &UnionSchema, scope: &Scope<'_>| {
        let mut violations = Vec::new();
        let mut kinds = HashSet::new();
        for (index, member) in union.members.iter().enumerate() {
            let kind = match member {
                Schema::Union(_) => {
                    violations.push(scope.violation_at(
                        PathSegment::UnionMember(index),
                        UNION_NESTED,
                        "Unions may not immediately contain other unions.",
                    ));
                    continue;
                }
                // Named members are told apart by name
                Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_) | Schema::Ref { .. } => continue,
                // A logical type is its own branch, keyed by its logical name
                Schema::Primitive { .. }
                | Schema::Logical { .. }
                | Schema::Array { .. }
                | Schema::Map { .. } => member.kind(),
            };
            if !kinds.insert(kind) {
                violations.push(scope.violation_at(
                    PathSegment::UnionMember(index),
                    UNION_DUPLICATE_KIND,
                    format!("Union contains more than one {} member.", kind),
                ));
            }
        }
        violations
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeIndex;
    use crate::rules::TYPE_UNRESOLVED;
    use crate::schema::{FixedSchema, LogicalType, PrimitiveType};

    fn lenient() -> ConventionTypeRules {
        let config = RuleConfig {
            field_documentation: false,
            type_documentation: false,
            ..RuleConfig::default()
        };
        ConventionTypeRules::from_config(&config, &DocumentationPolicy::default()).unwrap()
    }

    fn codes(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.rule.as_str()).collect()
    }

    fn run(schema: Schema, rules: &ConventionTypeRules) -> Vec<Violation> {
        let roots = vec![schema];
        let (types, _) = TypeIndex::build(&roots);
        let mut pass = Pass::new(&types);
        pass.descend(&roots[0], rules)
    }

    #[test]
    fn test_record_naming() {
        let record = RecordSchema::new("org.example.heart_rate").with_field(Field::new("bpm", Schema::string()));
        assert_eq!(codes(&run(record.into(), &lenient())), vec![RECORD_NAME]);

        let record = RecordSchema::new("HeartRate").with_field(Field::new("bpm", Schema::string()));
        assert_eq!(codes(&run(record.into(), &lenient())), vec![RECORD_NAMESPACE]);

        let record = RecordSchema::new("Org.Example.HeartRate").with_field(Field::new("bpm", Schema::string()));
        assert_eq!(codes(&run(record.into(), &lenient())), vec![RECORD_NAMESPACE]);
    }

    #[test]
    fn test_record_fields() {
        let empty = RecordSchema::new("org.example.Empty");
        assert_eq!(codes(&run(empty.into(), &lenient())), vec![RECORD_FIELDS_EMPTY]);

        let duplicated = RecordSchema::new("org.example.Twice")
            .with_field(Field::new("time", Schema::string()))
            .with_field(Field::new("time", Schema::string()));
        let violations = run(duplicated.into(), &lenient());
        assert_eq!(codes(&violations), vec![RECORD_FIELD_DUPLICATE]);
        assert_eq!(violations[0].location.to_string(), "org.example.Twice.time");
    }

    #[test]
    fn test_record_documentation() {
        let record = RecordSchema::new("org.example.Battery")
            .with_field(Field::new("level", Schema::primitive(PrimitiveType::Float)));
        let violations = run(record.clone().into(), &ConventionTypeRules::new());
        assert_eq!(codes(&violations), vec![RECORD_DOC, crate::rules::FIELD_DOC]);

        let record = RecordSchema::new("org.example.Battery")
            .with_doc("Battery state of a phone.")
            .with_field(
                Field::new("level", Schema::primitive(PrimitiveType::Float))
                    .with_doc("Battery level from 0 to 1."),
            );
        assert!(run(record.into(), &ConventionTypeRules::new()).is_empty());
    }

    #[test]
    fn test_enum_symbols() {
        let schema = EnumSchema::new("org.example.State", ["ON", "off", "ON"]);
        let violations = run(schema.into(), &lenient());
        assert_eq!(codes(&violations), vec![ENUM_SYMBOL_CASE, ENUM_SYMBOL_DUPLICATE]);
        assert_eq!(violations[1].location.to_string(), "org.example.State::ON");

        let schema = EnumSchema::new("org.example.State", Vec::<String>::new());
        assert_eq!(codes(&run(schema.into(), &lenient())), vec![ENUM_SYMBOLS_EMPTY]);

        let schema = EnumSchema::new("org.example.State", ["ON", "UNKNOWN"]).with_default("MISSING");
        assert_eq!(codes(&run(schema.into(), &lenient())), vec![ENUM_DEFAULT_SYMBOL]);

        let schema = EnumSchema::new("org.example.State", ["ON", "UNKNOWN"]).with_default("UNKNOWN");
        assert!(run(schema.into(), &lenient()).is_empty());
    }

    #[test]
    fn test_union_members() {
        let record = RecordSchema::new("org.example.Reading")
            .with_field(Field::new(
                "values",
                Schema::union(vec![
                    Schema::string(),
                    Schema::primitive(PrimitiveType::Int),
                    Schema::string(),
                    Schema::union(vec![Schema::null()]),
                ]),
            ));
        let violations = run(record.into(), &lenient());
        assert_eq!(codes(&violations), vec![UNION_DUPLICATE_KIND, UNION_NESTED]);
        assert_eq!(violations[0].location.to_string(), "org.example.Reading.values[2]");
    }

    #[test]
    fn test_union_with_named_members() {
        let record = RecordSchema::new("org.example.Event").with_field(Field::new(
            "payload",
            Schema::union(vec![
                RecordSchema::new("org.example.Tap").with_field(Field::new("x", Schema::string())).into(),
                RecordSchema::new("org.example.Swipe").with_field(Field::new("dx", Schema::string())).into(),
                Schema::reference("org.example.Tap"),
            ]),
        ));
        assert!(run(record.into(), &lenient()).is_empty());
    }

    #[test]
    fn test_union_of_named_fixed_types() {
        let record = RecordSchema::new("org.example.Digest").with_field(Field::new(
            "hash",
            Schema::union(vec![
                Schema::null(),
                FixedSchema::new("org.example.Md5", 16).into(),
                FixedSchema::new("org.example.Sha1", 20).into(),
            ]),
        ).with_default(serde_json::Value::Null));
        assert!(run(record.into(), &lenient()).is_empty());
    }

    #[test]
    fn test_union_of_logical_types() {
        let long = || Schema::primitive(PrimitiveType::Long);
        let record = RecordSchema::new("org.example.Stamp").with_field(Field::new(
            "when",
            Schema::union(vec![
                Schema::null(),
                Schema::logical(LogicalType::Date, Schema::primitive(PrimitiveType::Int)),
                Schema::logical(LogicalType::TimestampMillis, long()),
                long(),
            ]),
        ).with_default(serde_json::Value::Null));
        assert!(run(record.into(), &lenient()).is_empty());

        let repeated = RecordSchema::new("org.example.Stamp").with_field(Field::new(
            "when",
            Schema::union(vec![
                Schema::logical(LogicalType::TimestampMillis, long()),
                Schema::logical(LogicalType::TimestampMillis, long()),
            ]),
        ));
        let violations = run(repeated.into(), &lenient());
        assert_eq!(codes(&violations), vec![UNION_DUPLICATE_KIND]);
        assert_eq!(violations[0].message, "Union contains more than one timestamp-millis member.");
    }

    #[test]
    fn test_nested_violations_are_located() {
        let inner = RecordSchema::new("org.example.Inner").with_field(Field::new("bad_name", Schema::string()));
        let outer = RecordSchema::new("org.example.Outer").with_field(Field::new(
            "inner",
            Schema::array(inner.into()),
        ));
        let violations = run(outer.into(), &lenient());
        assert_eq!(codes(&violations), vec![crate::rules::FIELD_NAME_CASE]);
        assert_eq!(
            violations[0].location.to_string(),
            "org.example.Outer.inner[]<org.example.Inner>.bad_name"
        );
    }

    #[test]
    fn test_unresolved_reference() {
        let record = RecordSchema::new("org.example.Outer")
            .with_field(Field::new("other", Schema::map(Schema::reference("org.example.Gone"))));
        let violations = run(record.into(), &lenient());
        assert_eq!(codes(&violations), vec![TYPE_UNRESOLVED]);
        assert_eq!(violations[0].location.to_string(), "org.example.Outer.other[*]");
    }

    #[test]
    fn test_extra_record_rule() {
        let rules = lenient().with_record_rule(Rule::new(|record: &RecordSchema, scope: &Scope<'_>| {
            check(record.fields.len() <= 1, || scope.violation("TOO_WIDE", "Too many fields."))
        }));
        let record = RecordSchema::new("org.example.Wide")
            .with_field(Field::new("a", Schema::string()))
            .with_field(Field::new("b", Schema::string()));
        assert_eq!(codes(&run(record.into(), &rules)), vec!["TOO_WIDE"]);
    }
}
