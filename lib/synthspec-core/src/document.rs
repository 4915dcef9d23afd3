//! The output document model: JSON-Schema-superset fragments and `$ref` values.
//!
//! Fragments synthesized by [`crate::synthesize`] are plain data. Serializing
//! one with `serde_json` yields an object ready to be embedded into an
//! OpenAPI document; key order follows insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schema-document fragment.
///
/// All keys are optional and skipped when unset, so a freshly built
/// fragment serializes to `{}`. Unlike a plain JSON-Schema model, `allOf`
/// may carry sibling keys at the same level: structural extensions are
/// emitted as `{"allOf": [<base ref>], "type": "object", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaObject {
    /// The `type` keyword; a list when `null` has been merged in.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    /// The `format` keyword (`date-time`, `email`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Ordered property name to schema mapping.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, RefOr<SchemaObject>>,

    /// Names of required properties, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// The `additionalProperties` keyword: a boolean or a catch-all schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    /// Compositional `allOf` list; may coexist with the object keys above.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<RefOr<SchemaObject>>,

    /// Union alternatives (`anyOf`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<RefOr<SchemaObject>>,

    /// Exclusive alternatives (`oneOf`), used with [`Self::discriminator`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<RefOr<SchemaObject>>,

    /// Array item schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RefOr<SchemaObject>>>,

    /// Positional item schemas for tuples.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<RefOr<SchemaObject>>,

    /// Minimum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Maximum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Enumerated member values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    /// Constant value for literal schemas.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    /// Default value applied when the property is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Discriminator for `oneOf` compositions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaObject {
    /// Creates a fragment with a single `type` keyword set.
    #[must_use]
    pub fn of_type(kind: TypeKind) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(kind)),
            ..Self::default()
        }
    }
}

/// The value of the `type` keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// A single type, e.g. `"string"`.
    Single(TypeKind),
    /// A list of types, e.g. `["string", "null"]`.
    Many(Vec<TypeKind>),
}

impl From<TypeKind> for SchemaType {
    fn from(kind: TypeKind) -> Self {
        Self::Single(kind)
    }
}

/// One JSON-Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"integer"`
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"object"`
    Object,
    /// `"array"`
    Array,
    /// `"null"`
    Null,
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows arbitrary unknown keys, `false` forbids them.
    Allowed(bool),
    /// Unknown keys are allowed when they match this schema.
    Schema(Box<RefOr<SchemaObject>>),
}

/// Discriminator object attached to `oneOf` compositions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// The property whose value selects the variant.
    pub property_name: String,
}

impl Discriminator {
    /// Creates a discriminator on the given property.
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
        }
    }
}

/// A `$ref` value pointing at a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// The reference location, e.g. `#/components/schemas/User`.
    #[serde(rename = "$ref")]
    pub ref_location: String,
}

impl Ref {
    /// Default location prefix for schema components.
    pub const SCHEMA_PREFIX: &'static str = "#/components/schemas/";

    /// Creates a reference from a raw location string.
    pub fn new(ref_location: impl Into<String>) -> Self {
        Self {
            ref_location: ref_location.into(),
        }
    }

    /// Creates a reference to a schema component under the default prefix.
    pub fn from_schema_name(name: impl AsRef<str>) -> Self {
        Self::new(format!("{}{}", Self::SCHEMA_PREFIX, name.as_ref()))
    }

    /// Extracts the schema name when the location uses the default prefix.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.ref_location.strip_prefix(Self::SCHEMA_PREFIX)
    }
}

/// Either a reference or an inlined value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A `$ref` to a registered component.
    Ref(Ref),
    /// An inlined value.
    T(T),
}

impl<T> RefOr<T> {
    /// Returns the reference, if this is one.
    pub fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            Self::Ref(reference) => Some(reference),
            Self::T(_) => None,
        }
    }
}

impl From<Ref> for RefOr<SchemaObject> {
    fn from(reference: Ref) -> Self {
        Self::Ref(reference)
    }
}

impl From<SchemaObject> for RefOr<SchemaObject> {
    fn from(schema: SchemaObject) -> Self {
        Self::T(schema)
    }
}
