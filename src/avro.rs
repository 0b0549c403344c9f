//! Conversion from parsed Avro schemas into the validator's schema model

use apache_avro::schema::{Name, Schema as AvroSchema};

use crate::schema::{
    EnumSchema, Field, FixedSchema, LogicalType, PrimitiveType, RecordSchema, Schema, UnionSchema,
};

/// Convert a parsed Avro schema.
///
/// Names that lack a namespace inherit the namespace of the enclosing named
/// type, following Avro's name resolution. Logical types keep their
/// underlying schema; apache-avro does not retain the fixed behind a
/// `duration`, so it is rebuilt under the name apache-avro itself writes.
pub fn from_avro(schema: &AvroSchema) -> Schema {
    convert(schema, None)
}

fn full_name(name: &Name, enclosing: Option<&str>) -> String {
    name.fullname(enclosing.map(str::to_string))
}

fn namespace_of(full_name: &str) -> Option<&str> {
    full_name.rsplit_once('.').map(|(namespace, _)| namespace)
}

fn convert(schema: &AvroSchema, enclosing: Option<&str>) -> Schema {
    match schema {
        AvroSchema::Null => Schema::primitive(PrimitiveType::Null),
        AvroSchema::Boolean => Schema::primitive(PrimitiveType::Boolean),
        AvroSchema::Int => Schema::primitive(PrimitiveType::Int),
        AvroSchema::Long => Schema::primitive(PrimitiveType::Long),
        AvroSchema::Float => Schema::primitive(PrimitiveType::Float),
        AvroSchema::Double => Schema::primitive(PrimitiveType::Double),
        AvroSchema::Bytes => Schema::primitive(PrimitiveType::Bytes),
        AvroSchema::String => Schema::primitive(PrimitiveType::String),
        AvroSchema::Fixed(fixed) => Schema::Fixed(FixedSchema::new(full_name(&fixed.name, enclosing), fixed.size)),
        AvroSchema::Array(items) => Schema::array(convert(items, enclosing)),
        AvroSchema::Map(values) => Schema::map(convert(values, enclosing)),
        AvroSchema::Union(union) => Schema::Union(UnionSchema::new(
            union.variants().iter().map(|member| convert(member, enclosing)).collect(),
        )),
        AvroSchema::Record(record) => {
            let name = full_name(&record.name, enclosing);
            let namespace = namespace_of(&name);
            let fields = record
                .fields
                .iter()
                .map(|field| Field {
                    name: field.name.clone(),
                    schema: convert(&field.schema, namespace),
                    doc: field.doc.clone(),
                    default: field.default.clone(),
                })
                .collect();
            Schema::Record(RecordSchema {
                doc: record.doc.clone(),
                fields,
                name,
            })
        }
        AvroSchema::Enum(e) => Schema::Enum(EnumSchema {
            name: full_name(&e.name, enclosing),
            doc: e.doc.clone(),
            symbols: e.symbols.clone(),
            default: e.default.clone(),
        }),
        AvroSchema::Ref { name } => Schema::reference(full_name(name, enclosing)),
        AvroSchema::Decimal(decimal) => Schema::logical(LogicalType::Decimal, convert(&decimal.inner, enclosing)),
        AvroSchema::Uuid => Schema::logical(LogicalType::Uuid, Schema::string()),
        AvroSchema::Date => Schema::logical(LogicalType::Date, Schema::primitive(PrimitiveType::Int)),
        AvroSchema::TimeMillis => Schema::logical(LogicalType::TimeMillis, Schema::primitive(PrimitiveType::Int)),
        AvroSchema::TimeMicros => Schema::logical(LogicalType::TimeMicros, Schema::primitive(PrimitiveType::Long)),
        AvroSchema::TimestampMillis => {
            Schema::logical(LogicalType::TimestampMillis, Schema::primitive(PrimitiveType::Long))
        }
        AvroSchema::TimestampMicros => {
            Schema::logical(LogicalType::TimestampMicros, Schema::primitive(PrimitiveType::Long))
        }
        AvroSchema::LocalTimestampMillis => {
            Schema::logical(LogicalType::LocalTimestampMillis, Schema::primitive(PrimitiveType::Long))
        }
        AvroSchema::LocalTimestampMicros => {
            Schema::logical(LogicalType::LocalTimestampMicros, Schema::primitive(PrimitiveType::Long))
        }
        AvroSchema::Duration => Schema::logical(LogicalType::Duration, Schema::Fixed(FixedSchema::new("duration", 12))),
    }
}
