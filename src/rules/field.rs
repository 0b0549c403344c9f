//! Field rules
//!
//! Naming, documentation and default-value conventions for a single record
//! field, plus the dispatch that descends from a field into its type.

use regex::Regex;
use serde_json::Value;

use super::documentation::DocumentationPolicy;
use super::types::TypeRules;
use super::{
    check, compile, matches, valid, Rule, Scope, Violation, FIELD_DEFAULT_ENUM, FIELD_DEFAULT_NONE,
    FIELD_DEFAULT_UNION, FIELD_DOC, FIELD_NAME_CASE, FIELD_NAME_SUFFIX,
};
use crate::config::RuleConfig;
use crate::schema::{Field, Schema, UNKNOWN_SYMBOL};
use crate::validator::Pass;

/// lowerCamelCase
pub const FIELD_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*([a-z0-9][A-Z][a-z0-9]+)?([A-Z][a-z0-9]+)*[A-Z]?$";

/// Suffixes a field name may not end with
pub const DISALLOWED_FIELD_SUFFIXES: &[&str] = &["value", "Value"];

/// Rules applied to every field of every record
pub trait FieldRules: Send + Sync {
    /// Name convention and disallowed suffixes, reported independently
    fn validate_field_name(&self) -> Rule<Field>;

    fn validate_field_documentation(&self) -> Rule<Field>;

    /// Whether the declared default is legal for the field's type
    fn validate_default(&self) -> Rule<Field>;

    /// Descend from the field into its type
    fn validate_field_types(&self, field: &Field, types: &dyn TypeRules, pass: &mut Pass<'_>) -> Vec<Violation>;

    /// All non-recursive field rules, AND-composed
    fn validate_field(&self) -> Rule<Field> {
        self.validate_field_name()
            .and(self.validate_field_documentation())
            .and(self.validate_default())
    }
}

/// The default field conventions
#[derive(Debug, Clone)]
pub struct ConventionFieldRules {
    name_pattern: Regex,
    disallowed_suffixes: Vec<String>,
    documentation: DocumentationPolicy,
    check_documentation: bool,
}

impl Default for ConventionFieldRules {
    fn default() -> Self {
        Self {
            name_pattern: Regex::new(FIELD_NAME_PATTERN).expect("built-in field name pattern compiles"),
            disallowed_suffixes: DISALLOWED_FIELD_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            documentation: DocumentationPolicy::default(),
            check_documentation: true,
        }
    }
}

impl ConventionFieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration; fails when the configured pattern does not compile
    pub fn from_config(rules: &RuleConfig, documentation: &DocumentationPolicy) -> crate::Result<Self> {
        Ok(Self {
            name_pattern: compile(FIELD_NAME_CASE, &rules.field_name_pattern)?,
            disallowed_suffixes: rules.disallowed_field_suffixes.clone(),
            documentation: documentation.clone(),
            check_documentation: rules.field_documentation,
        })
    }

    pub fn with_documentation(mut self, documentation: DocumentationPolicy) -> Self {
        self.documentation = documentation;
        self
    }

    fn suffix_rule(&self) -> Rule<Field> {
        let suffixes = self.disallowed_suffixes.clone();
        Rule::new(move |field: &Field, scope: &Scope<'_>| {
            check(!suffixes.iter().any(|s| field.name.ends_with(s.as_str())), || {
                scope.violation(
                    FIELD_NAME_SUFFIX,
                    format!(
                        "Field name may not end with the following values: {:?}.",
                        suffixes
                    ),
                )
            })
        })
    }
}

impl FieldRules for ConventionFieldRules {
    fn validate_field_name(&self) -> Rule<Field> {
        matches(
            self.name_pattern.clone(),
            |field: &Field| field.name.as_str(),
            |_: &Field, scope: &Scope<'_>| {
                scope.violation(
                    FIELD_NAME_CASE,
                    "Field name does not respect lowerCamelCase name convention. \
                     Please avoid abbreviations and write out the field name instead.",
                )
            },
        )
        .and(self.suffix_rule())
    }

    fn validate_field_documentation(&self) -> Rule<Field> {
        if !self.check_documentation {
            return Rule::always_valid();
        }
        self.documentation.rule(FIELD_DOC, |field: &Field| field.doc.as_deref())
    }

    fn validate_default(&self) -> Rule<Field> {
        Rule::new(|field: &Field, scope: &Scope<'_>| {
            // An unresolvable type is reported once, by type descent
            let Some(schema) = scope.resolve(&field.schema) else {
                return valid();
            };
            match schema {
                Schema::Enum(e) => check(
                    !e.has_symbol(UNKNOWN_SYMBOL)
                        || field.default.as_ref().and_then(Value::as_str) == Some(UNKNOWN_SYMBOL),
                    || {
                        scope.violation(
                            FIELD_DEFAULT_ENUM,
                            format!(
                                "Default is \"{}\". Any Avro enum type that has an \"UNKNOWN\" \
                                 symbol must set its default value to \"UNKNOWN\".",
                                field.default_display()
                            ),
                        )
                    },
                ),
                Schema::Union(union) => check(
                    !union.is_nullable() || matches!(field.default, Some(Value::Null)),
                    || {
                        scope.violation(
                            FIELD_DEFAULT_UNION,
                            "Default is not null. Any nullable Avro field must have its \
                             default value set to null.",
                        )
                    },
                ),
                Schema::Primitive { .. }
                | Schema::Fixed(_)
                | Schema::Logical { .. }
                | Schema::Record(_)
                | Schema::Array { .. }
                | Schema::Map { .. }
                | Schema::Ref { .. } => check(field.default.is_none(), || {
                    scope.violation(
                        FIELD_DEFAULT_NONE,
                        format!(
                            "Default of type {} is set to {}. The only acceptable default \
                             values are the \"UNKNOWN\" enum symbol and null.",
                            schema.kind(),
                            field.default_display()
                        ),
                    )
                }),
            }
        })
    }

    fn validate_field_types(&self, field: &Field, types: &dyn TypeRules, pass: &mut Pass<'_>) -> Vec<Violation> {
        match &field.schema {
            Schema::Union(union) => types.validate_union(union, pass),
            Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_) | Schema::Ref { .. } => {
                pass.validate_named(&field.schema, types)
            }
            Schema::Array { .. } | Schema::Map { .. } | Schema::Logical { .. } => pass.descend(&field.schema, types),
            Schema::Primitive { .. } => valid(),
        }
    }
}
