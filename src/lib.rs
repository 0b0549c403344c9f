//! Avro Schema Linter
//!
//! Checks Avro schemas against naming, documentation and default-value
//! conventions before they are published to a message broker.
//!
//! ## Features
//!
//! - **Composable Rules**: Small rules combined with AND/OR; every broken rule is reported
//! - **Cycle Safe**: Recursive types are validated once per pass and never loop
//! - **Catalogue Loading**: Directories of `.avsc` files parsed together so cross-file references resolve
//! - **Topic Planning**: One topic per valid record, refused when the schema has violations
//!
//! ## Architecture
//!
//! ```text
//! catalogue (*.avsc) ──▶ avro::from_avro ──▶ schema::Schema
//!                                                 │
//!                   graph::TypeIndex ◀────────────┤
//!                                                 ▼
//!        rules::{field, types} ◀── validator::Pass (visited set, path)
//!                                                 │
//!                                                 ▼
//!                                     report::ValidationReport
//! ```

pub mod avro;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod graph;
pub mod registration;
pub mod report;
pub mod rules;
pub mod schema;
pub mod validator;

pub use catalogue::{Catalogue, CatalogueEntry};
pub use config::ValidatorConfig;
pub use error::{Result, SchemaError};
pub use registration::{register_catalogue, DryRunRegistrar, RegistrationSummary, TopicRegistrar, TopicSpec};
pub use report::ValidationReport;
pub use rules::{Rule, SchemaPath, Violation};
pub use schema::{EnumSchema, Field, PrimitiveType, RecordSchema, Schema, UnionSchema};
pub use validator::SchemaValidator;
