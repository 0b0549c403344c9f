//! Validation report
//!
//! Every violation found in a validation call, in the order the walk found
//! them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::rules::Violation;

/// Result of validating one or more root schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Full names of the validated roots
    roots: Vec<String>,
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(roots: Vec<String>, violations: Vec<Violation>) -> Self {
        Self { roots, violations }
    }

    /// True when no rule was broken
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations found while walking from `root`
    pub fn for_root<'a>(&'a self, root: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.location.root() == Some(root))
    }

    /// Number of violations per rule code
    pub fn count_by_rule(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for violation in &self.violations {
            *counts.entry(violation.rule.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Append another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.roots.extend(other.roots);
        self.violations.extend(other.violations);
    }

    /// One line per violation: `location: message [RULE]`
    pub fn format_all(&self) -> String {
        let mut output = String::new();
        for violation in &self.violations {
            output.push_str(&violation.to_string());
            output.push('\n');
        }
        output
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "{} schema(s) valid", self.roots.len());
        }
        writeln!(
            f,
            "{} violation(s) in {} schema(s):",
            self.violations.len(),
            self.roots.len()
        )?;
        write!(f, "{}", self.format_all().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{PathSegment, SchemaPath};

    fn at(root: &str, field: &str, rule: &str) -> Violation {
        let mut path = SchemaPath::new();
        path.push(PathSegment::Type(root.to_string()));
        path.push(PathSegment::Field(field.to_string()));
        Violation::new(path, rule, "broken")
    }

    #[test]
    fn test_counts_and_roots() {
        let report = ValidationReport::new(
            vec!["org.a.A".into(), "org.b.B".into()],
            vec![at("org.a.A", "x", "R1"), at("org.b.B", "y", "R1"), at("org.a.A", "z", "R2")],
        );

        assert!(!report.is_valid());
        assert_eq!(report.for_root("org.a.A").count(), 2);
        assert_eq!(report.count_by_rule().get("R1"), Some(&2));
        assert_eq!(
            report.format_all(),
            "org.a.A.x: broken [R1]\norg.b.B.y: broken [R1]\norg.a.A.z: broken [R2]\n"
        );
    }

    #[test]
    fn test_merge() {
        let mut report = ValidationReport::new(vec!["org.a.A".into()], Vec::new());
        assert!(report.is_valid());
        assert_eq!(report.to_string(), "1 schema(s) valid");

        report.merge(ValidationReport::new(vec!["org.b.B".into()], vec![at("org.b.B", "y", "R1")]));
        assert_eq!(report.roots().len(), 2);
        assert_eq!(report.len(), 1);
        assert!(report.to_string().starts_with("1 violation(s) in 2 schema(s):"));
    }
}
