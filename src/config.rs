//! Configuration management for the schema validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (avro-lint.toml)
//! - Environment variables (AVRO_LINT__*)
//!
//! ## Example config file (avro-lint.toml):
//! ```toml
//! [rules]
//! disallowed_field_suffixes = ["value", "Value"]
//! type_documentation = true
//!
//! [documentation]
//! required = true
//! min_length = 10
//! require_period = true
//!
//! [catalogue]
//! root = "commons"
//! extension = "avsc"
//!
//! [registration]
//! partitions = 3
//! replication = 3
//! brokers = 3
//! topic_match = "^android_"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::rules::documentation::DocumentationPolicy;
use crate::rules::field::{DISALLOWED_FIELD_SUFFIXES, FIELD_NAME_PATTERN};
use crate::rules::types::{ENUM_SYMBOL_PATTERN, NAMESPACE_PATTERN, TYPE_NAME_PATTERN};

/// Main configuration for the validator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Naming patterns and rule toggles
    #[serde(default)]
    pub rules: RuleConfig,

    /// What counts as sufficiently documented
    #[serde(default)]
    pub documentation: DocumentationPolicy,

    /// Where schema files are found
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// Topic registration settings
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Pattern every field name must match
    #[serde(default = "default_field_name_pattern")]
    pub field_name_pattern: String,

    /// Suffixes a field name may not end with (case-sensitive)
    #[serde(default = "default_disallowed_suffixes")]
    pub disallowed_field_suffixes: Vec<String>,

    /// Pattern record and enum simple names must match
    #[serde(default = "default_type_name_pattern")]
    pub type_name_pattern: String,

    /// Pattern record namespaces must match
    #[serde(default = "default_namespace_pattern")]
    pub namespace_pattern: String,

    /// Pattern enum symbols must match
    #[serde(default = "default_enum_symbol_pattern")]
    pub enum_symbol_pattern: String,

    /// Check field documentation
    #[serde(default = "default_true")]
    pub field_documentation: bool,

    /// Check record and enum documentation
    #[serde(default = "default_true")]
    pub type_documentation: bool,
}

/// Catalogue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Directory searched for schema files
    #[serde(default = "default_catalogue_root")]
    pub root: PathBuf,

    /// Schema file extension
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Topic registration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Partitions per topic
    #[serde(default = "default_partitions")]
    pub partitions: u32,

    /// Replication factor per topic
    #[serde(default = "default_replication")]
    pub replication: u16,

    /// Number of brokers expected in the cluster
    #[serde(default = "default_brokers")]
    pub brokers: u32,

    /// Prefix prepended to every topic name
    #[serde(default)]
    pub topic_prefix: Option<String>,

    /// Register only the topic with this name
    #[serde(default)]
    pub topic: Option<String>,

    /// Register only topics whose name matches this regex; ignored when
    /// `topic` is set
    #[serde(default)]
    pub topic_match: Option<String>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_field_name_pattern() -> String {
    FIELD_NAME_PATTERN.to_string()
}

fn default_disallowed_suffixes() -> Vec<String> {
    DISALLOWED_FIELD_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_type_name_pattern() -> String {
    TYPE_NAME_PATTERN.to_string()
}

fn default_namespace_pattern() -> String {
    NAMESPACE_PATTERN.to_string()
}

fn default_enum_symbol_pattern() -> String {
    ENUM_SYMBOL_PATTERN.to_string()
}

fn default_catalogue_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "avsc".to_string()
}

fn default_partitions() -> u32 {
    3
}

fn default_replication() -> u16 {
    1
}

fn default_brokers() -> u32 {
    1
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            field_name_pattern: default_field_name_pattern(),
            disallowed_field_suffixes: default_disallowed_suffixes(),
            type_name_pattern: default_type_name_pattern(),
            namespace_pattern: default_namespace_pattern(),
            enum_symbol_pattern: default_enum_symbol_pattern(),
            field_documentation: true,
            type_documentation: true,
        }
    }
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            root: default_catalogue_root(),
            extension: default_extension(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
            replication: default_replication(),
            brokers: default_brokers(),
            topic_prefix: None,
            topic: None,
            topic_match: None,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["avro-lint.toml", ".avro-lint.toml", "config/avro-lint.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("org", "avro-lint", "avro-lint") {
            let xdg_config = config_dir.config_dir().join("avro-lint.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (AVRO_LINT__*)
        builder = builder.add_source(
            Environment::with_prefix("AVRO_LINT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Parse configuration from TOML text, ignoring files and environment
    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, config_crate::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Catalogue root (resolves relative paths)
    pub fn catalogue_root(&self) -> PathBuf {
        if self.catalogue.root.is_absolute() {
            self.catalogue.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.catalogue.root)
        }
    }
}
