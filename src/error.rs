//! Error types for the schema validator
//!
//! These are usage errors: conditions that make the validator itself unusable
//! for a call. Broken schemas are never reported through this type, they come
//! back as [`Violation`](crate::rules::Violation)s inside a report.

use thiserror::Error;

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema validator errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No root schemas given to validate")]
    EmptyInput,

    #[error("Root schema must be a record or enum, got {kind}")]
    InvalidRoot { kind: String },

    #[error("Invalid pattern for rule {rule}: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Invalid registration settings: {0}")]
    InvalidRegistration(String),

    #[error("Topic registration failed for {topic}: {reason}")]
    Registrar { topic: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}
