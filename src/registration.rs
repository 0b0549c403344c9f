//! Topic registration
//!
//! Derives one topic per record in a catalogue and hands it to a
//! [`TopicRegistrar`]. A record with any violation gets no topic. A
//! [`TopicSelector`] narrows registration to one topic or to the topics
//! matching a pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalogue::Catalogue;
use crate::config::RegistrationConfig;
use crate::error::{Result, SchemaError};
use crate::schema::{split_full_name, Schema};
use crate::validator::SchemaValidator;

/// A topic to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: u32,
    pub replication: u16,
    /// Full name of the value schema
    pub schema: String,
}

/// Creates topics on a broker
pub trait TopicRegistrar {
    fn create_topic(&mut self, spec: &TopicSpec) -> Result<()>;
}

/// Registrar that only records what it was asked to create
#[derive(Debug, Default)]
pub struct DryRunRegistrar {
    pub planned: Vec<TopicSpec>,
}

impl TopicRegistrar for DryRunRegistrar {
    fn create_topic(&mut self, spec: &TopicSpec) -> Result<()> {
        info!(topic = %spec.name, schema = %spec.schema, "would create topic");
        self.planned.push(spec.clone());
        Ok(())
    }
}

/// A catalogue entry that was not registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusedEntry {
    pub schema: String,
    pub violations: usize,
}

/// Outcome of registering a catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    /// Names of created topics
    pub created: Vec<String>,
    pub refused: Vec<RefusedEntry>,
}

impl RegistrationSummary {
    pub fn is_complete(&self) -> bool {
        self.refused.is_empty()
    }
}

/// Which topics a registration run creates
#[derive(Debug, Clone, Default)]
pub enum TopicSelector {
    #[default]
    All,
    /// Exactly one topic, by name
    Named(String),
    /// Every topic whose name matches
    Matching(Regex),
}

impl TopicSelector {
    /// Selector from the `topic` and `topic_match` settings. A topic name
    /// takes precedence over a pattern.
    pub fn from_config(config: &RegistrationConfig) -> Result<Self> {
        if let Some(topic) = &config.topic {
            return Ok(Self::Named(topic.clone()));
        }
        match &config.topic_match {
            Some(pattern) => Regex::new(pattern).map(Self::Matching).map_err(|e| {
                SchemaError::InvalidRegistration(format!("invalid topic pattern {}: {}", pattern, e))
            }),
            None => Ok(Self::All),
        }
    }

    pub fn selects(&self, topic: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == topic,
            Self::Matching(pattern) => pattern.is_match(topic),
        }
    }
}

/// Topic name for a record: its simple name in snake case, optionally prefixed
pub fn topic_name(full_name: &str, prefix: Option<&str>) -> String {
    let name = to_snake_case(split_full_name(full_name).1);
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}_{}", prefix, name),
        _ => name,
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    result
}

/// Validate `catalogue` and create a topic for every record without violations
pub fn register_catalogue(
    catalogue: &Catalogue,
    validator: &SchemaValidator,
    registrar: &mut dyn TopicRegistrar,
    config: &RegistrationConfig,
) -> Result<RegistrationSummary> {
    if config.partitions == 0 {
        return Err(SchemaError::InvalidRegistration(
            "partitions must be at least 1".to_string(),
        ));
    }
    if config.replication == 0 || u32::from(config.replication) > config.brokers {
        return Err(SchemaError::InvalidRegistration(format!(
            "cannot assign a replication factor {} with {} broker(s)",
            config.replication, config.brokers
        )));
    }

    let selector = TopicSelector::from_config(config)?;
    let report = catalogue.validate(validator)?;
    let mut summary = RegistrationSummary::default();

    for entry in catalogue.entries() {
        let Schema::Record(record) = &entry.schema else {
            continue;
        };
        let name = topic_name(&record.name, config.topic_prefix.as_deref());
        if !selector.selects(&name) {
            debug!(topic = %name, "topic not selected");
            continue;
        }
        let violations = report.for_root(&record.name).count();
        if violations > 0 {
            warn!(schema = %record.name, violations, "refusing to register topic for invalid schema");
            summary.refused.push(RefusedEntry {
                schema: record.name.clone(),
                violations,
            });
            continue;
        }

        let spec = TopicSpec {
            name,
            partitions: config.partitions,
            replication: config.replication,
            schema: record.name.clone(),
        };
        registrar.create_topic(&spec)?;
        summary.created.push(spec.name);
    }

    info!(
        created = summary.created.len(),
        refused = summary.refused.len(),
        "topic registration finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GOOD: &str = r#"{"type": "record", "name": "PhoneAcceleration", "namespace": "org.example.phone",
        "doc": "Acceleration of a phone.", "fields": [
            {"name": "x", "type": "float", "doc": "Acceleration along x."}
        ]}"#;

    const BAD: &str = r#"{"type": "record", "name": "PhoneLight", "namespace": "org.example.phone",
        "doc": "Ambient light.", "fields": [
            {"name": "lightValue", "type": "float", "doc": "Light in lux."}
        ]}"#;

    const LEVEL: &str = r#"{"type": "enum", "name": "Level", "namespace": "org.example",
        "doc": "A level.", "symbols": ["LOW", "HIGH"]}"#;

    fn catalogue() -> Catalogue {
        Catalogue::from_sources(vec![
            (PathBuf::from("good.avsc"), GOOD.to_string()),
            (PathBuf::from("bad.avsc"), BAD.to_string()),
            (PathBuf::from("level.avsc"), LEVEL.to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_topic_name() {
        assert_eq!(topic_name("org.example.phone.PhoneAcceleration", None), "phone_acceleration");
        assert_eq!(topic_name("Acceleration3D", Some("android")), "android_acceleration3_d");
        assert_eq!(topic_name("HeartRate", Some("")), "heart_rate");
    }

    #[test]
    fn test_invalid_entries_are_refused() {
        let mut registrar = DryRunRegistrar::default();
        let summary = register_catalogue(
            &catalogue(),
            &SchemaValidator::new(),
            &mut registrar,
            &RegistrationConfig::default(),
        )
        .unwrap();

        assert_eq!(summary.created, vec!["phone_acceleration"]);
        assert_eq!(
            summary.refused,
            vec![RefusedEntry {
                schema: "org.example.phone.PhoneLight".to_string(),
                violations: 1
            }]
        );
        assert!(!summary.is_complete());
        assert_eq!(registrar.planned.len(), 1);
        assert_eq!(registrar.planned[0].schema, "org.example.phone.PhoneAcceleration");
    }

    #[test]
    fn test_replication_above_brokers_is_rejected() {
        let config = RegistrationConfig {
            replication: 3,
            brokers: 1,
            ..RegistrationConfig::default()
        };
        let mut registrar = DryRunRegistrar::default();
        let err = register_catalogue(&catalogue(), &SchemaValidator::new(), &mut registrar, &config).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRegistration(_)));
        assert!(registrar.planned.is_empty());
    }

    #[test]
    fn test_named_topic_only() {
        let config = RegistrationConfig {
            topic: Some("phone_light".to_string()),
            topic_match: Some("acceleration".to_string()),
            ..RegistrationConfig::default()
        };
        let mut registrar = DryRunRegistrar::default();
        let summary = register_catalogue(&catalogue(), &SchemaValidator::new(), &mut registrar, &config).unwrap();

        assert!(summary.created.is_empty());
        assert_eq!(summary.refused.len(), 1);
        assert!(registrar.planned.is_empty());
    }

    #[test]
    fn test_matching_topics_only() {
        let config = RegistrationConfig {
            topic_match: Some("^phone_acc".to_string()),
            ..RegistrationConfig::default()
        };
        let mut registrar = DryRunRegistrar::default();
        let summary = register_catalogue(&catalogue(), &SchemaValidator::new(), &mut registrar, &config).unwrap();

        assert_eq!(summary.created, vec!["phone_acceleration"]);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_bad_topic_pattern() {
        let config = RegistrationConfig {
            topic_match: Some("phone_(".to_string()),
            ..RegistrationConfig::default()
        };
        let err = TopicSelector::from_config(&config).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRegistration(_)));
        assert!(TopicSelector::default().selects("anything"));
    }

    struct FailingRegistrar;

    impl TopicRegistrar for FailingRegistrar {
        fn create_topic(&mut self, spec: &TopicSpec) -> Result<()> {
            Err(SchemaError::Registrar {
                topic: spec.name.clone(),
                reason: "broker unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_registrar_failure_is_propagated() {
        let err = register_catalogue(
            &catalogue(),
            &SchemaValidator::new(),
            &mut FailingRegistrar,
            &RegistrationConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("broker unavailable"));
    }
}
