//! One-shot fragment generators for primitive schema kinds.
//!
//! These are plain field copies with no recursion and no effects; the
//! dispatcher invokes one per primitive variant.

use serde_json::Value;

use crate::document::{SchemaObject, SchemaType, TypeKind};

pub(super) fn string(format: Option<&str>) -> SchemaObject {
    SchemaObject {
        format: format.map(str::to_owned),
        ..SchemaObject::of_type(TypeKind::String)
    }
}

pub(super) fn number(integer: bool) -> SchemaObject {
    let kind = if integer {
        TypeKind::Integer
    } else {
        TypeKind::Number
    };
    SchemaObject::of_type(kind)
}

pub(super) fn boolean() -> SchemaObject {
    SchemaObject::of_type(TypeKind::Boolean)
}

pub(super) fn null() -> SchemaObject {
    SchemaObject::of_type(TypeKind::Null)
}

pub(super) fn date() -> SchemaObject {
    SchemaObject {
        format: Some("date-time".to_owned()),
        ..SchemaObject::of_type(TypeKind::String)
    }
}

pub(super) fn literal(value: &Value) -> SchemaObject {
    SchemaObject {
        schema_type: type_of_value(value).map(SchemaType::Single),
        const_value: Some(value.clone()),
        ..SchemaObject::default()
    }
}

pub(super) fn enumeration(members: &[String]) -> SchemaObject {
    SchemaObject {
        enum_values: members.iter().cloned().map(Value::String).collect(),
        ..SchemaObject::of_type(TypeKind::String)
    }
}

/// Native enums may mix member kinds; the `type` keyword lists every kind
/// observed among the members, deduplicated in first-seen order.
pub(super) fn native_enum(members: &[Value]) -> SchemaObject {
    let mut kinds = Vec::new();
    for member in members {
        if let Some(kind) = type_of_value(member) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    let schema_type = match kinds.as_slice() {
        [] => None,
        [only] => Some(SchemaType::Single(*only)),
        _ => Some(SchemaType::Many(kinds)),
    };
    SchemaObject {
        schema_type,
        enum_values: members.to_vec(),
        ..SchemaObject::default()
    }
}

fn type_of_value(value: &Value) -> Option<TypeKind> {
    match value {
        Value::Null => Some(TypeKind::Null),
        Value::Bool(_) => Some(TypeKind::Boolean),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                Some(TypeKind::Integer)
            } else {
                Some(TypeKind::Number)
            }
        }
        Value::String(_) => Some(TypeKind::String),
        Value::Array(_) => Some(TypeKind::Array),
        Value::Object(_) => Some(TypeKind::Object),
    }
}
