//! Documentation quality policy shared by field, record and enum rules

use serde::{Deserialize, Serialize};

use super::{check, valid, Rule, Scope};

/// What counts as sufficiently documented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationPolicy {
    /// Whether documentation must be present at all
    #[serde(default = "default_true")]
    pub required: bool,

    /// Minimum length of the trimmed text
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// First character must be uppercase
    #[serde(default = "default_true")]
    pub require_capital: bool,

    /// Text must end with a period
    #[serde(default = "default_true")]
    pub require_period: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_length() -> usize {
    1
}

impl Default for DocumentationPolicy {
    fn default() -> Self {
        Self {
            required: true,
            min_length: default_min_length(),
            require_capital: true,
            require_period: true,
        }
    }
}

impl DocumentationPolicy {
    /// A policy that accepts anything
    pub fn disabled() -> Self {
        Self {
            required: false,
            min_length: 0,
            require_capital: false,
            require_period: false,
        }
    }

    /// Describe why `doc` falls short, or `None` when it is acceptable
    pub fn problem(&self, doc: Option<&str>) -> Option<String> {
        let text = match doc.map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ if self.required => return Some("Documentation is not set.".to_string()),
            _ => return None,
        };

        if text.chars().count() < self.min_length {
            return Some(format!(
                "Documentation is too short; write at least {} characters.",
                self.min_length
            ));
        }
        if self.require_capital && !text.chars().next().is_some_and(char::is_uppercase) {
            return Some("Documentation should start with a capital letter.".to_string());
        }
        if self.require_period && !text.ends_with('.') {
            return Some("Documentation should end with a period.".to_string());
        }
        None
    }

    /// A rule reporting `code` when the documentation extracted from `T` falls short
    pub fn rule<T, E>(&self, code: &'static str, extract: E) -> Rule<T>
    where
        T: ?Sized + 'static,
        E: Fn(&T) -> Option<&str> + Send + Sync + 'static,
    {
        let policy = self.clone();
        Rule::new(move |input: &T, scope: &Scope<'_>| match policy.problem(extract(input)) {
            Some(message) => check(false, || scope.violation(code, message)),
            None => valid(),
        })
    }
}
