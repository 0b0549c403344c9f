//! Schema types and structures
//!
//! The in-memory schema graph the validator walks. The first occurrence of a
//! named type is its definition; later occurrences are [`Schema::Ref`]s to its
//! full name, which is how self-referential and mutually recursive types are
//! expressed without owning cycles.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name of the enum symbol that marks an unset or unrecognised value
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Unnamed leaf types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Avro logical types, each annotating an underlying schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalType {
    Decimal,
    Uuid,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    LocalTimestampMillis,
    LocalTimestampMicros,
    Duration,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::TimeMillis => "time-millis",
            Self::TimeMicros => "time-micros",
            Self::TimestampMillis => "timestamp-millis",
            Self::TimestampMicros => "timestamp-micros",
            Self::LocalTimestampMillis => "local-timestamp-millis",
            Self::LocalTimestampMicros => "local-timestamp-micros",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    Primitive { primitive: PrimitiveType },
    /// Named fixed-size byte array
    Fixed(FixedSchema),
    /// A logical type over its underlying schema (a primitive or a fixed)
    Logical { logical: LogicalType, underlying: Box<Schema> },
    Record(RecordSchema),
    Enum(EnumSchema),
    Union(UnionSchema),
    Array { items: Box<Schema> },
    Map { values: Box<Schema> },
    /// Reference to a named type defined elsewhere in the graph
    Ref { name: String },
}

impl Schema {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::Primitive { primitive }
    }

    pub fn null() -> Self {
        Self::primitive(PrimitiveType::Null)
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref { name: name.into() }
    }

    pub fn array(items: Schema) -> Self {
        Self::Array { items: Box::new(items) }
    }

    pub fn map(values: Schema) -> Self {
        Self::Map { values: Box::new(values) }
    }

    pub fn logical(logical: LogicalType, underlying: Schema) -> Self {
        Self::Logical {
            logical,
            underlying: Box::new(underlying),
        }
    }

    pub fn union(members: Vec<Schema>) -> Self {
        Self::Union(UnionSchema::new(members))
    }

    /// Full name of a named type or reference
    pub fn full_name(&self) -> Option<&str> {
        match self {
            Self::Record(r) => Some(&r.name),
            Self::Enum(e) => Some(&e.name),
            Self::Fixed(f) => Some(&f.name),
            Self::Ref { name } => Some(name),
            Self::Primitive { .. }
            | Self::Logical { .. }
            | Self::Union(_)
            | Self::Array { .. }
            | Self::Map { .. } => None,
        }
    }

    /// Short tag describing the kind of this node
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Primitive { primitive } => primitive.as_str(),
            Self::Fixed(_) => "fixed",
            Self::Logical { logical, .. } => logical.as_str(),
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Array { .. } => "array",
            Self::Map { .. } => "map",
            Self::Ref { .. } => "ref",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Primitive { primitive: PrimitiveType::Null })
    }
}

impl From<RecordSchema> for Schema {
    fn from(record: RecordSchema) -> Self {
        Self::Record(record)
    }
}

impl From<EnumSchema> for Schema {
    fn from(schema: EnumSchema) -> Self {
        Self::Enum(schema)
    }
}

/// Split a full name into its namespace and simple name
pub fn split_full_name(full_name: &str) -> (Option<&str>, &str) {
    match full_name.rsplit_once('.') {
        Some((namespace, name)) => (Some(namespace), name),
        None => (None, full_name),
    }
}

/// A record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Fully-qualified name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        split_full_name(&self.name).0
    }

    pub fn simple_name(&self) -> &str {
        split_full_name(&self.name).1
    }
}

/// A fixed type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedSchema {
    /// Fully-qualified name
    pub name: String,
    pub size: usize,
}

impl FixedSchema {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

impl From<FixedSchema> for Schema {
    fn from(fixed: FixedSchema) -> Self {
        Self::Fixed(fixed)
    }
}

/// An enum type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSchema {
    /// Fully-qualified name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub symbols: Vec<String>,
    /// Symbol used by readers that encounter an unknown symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl EnumSchema {
    pub fn new<S: Into<String>>(name: impl Into<String>, symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            symbols: symbols.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_default(mut self, symbol: impl Into<String>) -> Self {
        self.default = Some(symbol.into());
        self
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn simple_name(&self) -> &str {
        split_full_name(&self.name).1
    }
}

/// A union of member schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionSchema {
    pub members: Vec<Schema>,
}

impl UnionSchema {
    pub fn new(members: Vec<Schema>) -> Self {
        Self { members }
    }

    pub fn is_nullable(&self) -> bool {
        self.members.iter().any(Schema::is_null)
    }
}

/// A record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// `Some(Value::Null)` is an explicit null default, `None` means no default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            doc: None,
            default: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Render the default the way it appears in a schema file
    pub fn default_display(&self) -> String {
        match &self.default {
            None => "not set".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
