//! The input schema-node model.
//!
//! A [`SchemaNode`] is one element of a composable validation-schema tree:
//! a tagged variant over primitive, composite and wrapper kinds. Nodes are
//! immutable once constructed and cheap to clone; every node carries a
//! stable [`NodeId`] assigned at construction, and clones share it. Two
//! separately constructed nodes are distinct identities even when their
//! shapes are identical, which is what the component registry keys on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde_json::Value;

use crate::document::SchemaObject;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Stable opaque identity of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("node#{_0}")]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One node of the input schema tree.
///
/// Cloning is cheap (the payload is shared) and preserves identity.
/// Wrapper constructors like [`SchemaNode::optional`] allocate a new node
/// with a fresh identity holding the wrapped one.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    inner: Arc<NodeInner>,
}

#[derive(Debug, Clone)]
struct NodeInner {
    id: NodeId,
    kind: NodeKind,
    name: Option<String>,
    manual_override: Option<SchemaObject>,
}

/// The closed variant set of schema-node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A string, optionally constrained to a format.
    String {
        /// JSON-Schema `format` hint (`email`, `uuid`, ...).
        format: Option<String>,
    },
    /// A number; `integer` selects the `integer` schema type.
    Number {
        /// Whole numbers only.
        integer: bool,
    },
    /// A boolean.
    Boolean,
    /// The JSON `null` value.
    Null,
    /// Exactly one JSON value.
    Literal(Value),
    /// A closed set of string members.
    Enum(Vec<String>),
    /// A closed set of arbitrary member values.
    NativeEnum(Vec<Value>),
    /// A calendar date-time.
    Date,
    /// A homogeneous list.
    Array(SchemaNode),
    /// A keyed shape; see [`ObjectShape`].
    Object(ObjectShape),
    /// Any of several alternatives.
    Union(Vec<SchemaNode>),
    /// Alternatives selected by a discriminant property.
    DiscriminatedUnion {
        /// Name of the discriminant property.
        tag: String,
        /// The object variants.
        variants: Vec<SchemaNode>,
    },
    /// Arbitrary string keys mapping to one value schema.
    Record(SchemaNode),
    /// A fixed-arity heterogeneous list.
    Tuple(Vec<SchemaNode>),
    /// The inner schema, or absent (object fields only).
    Optional(SchemaNode),
    /// The inner schema, or `null`.
    Nullable(SchemaNode),
    /// The inner schema with a value applied when absent.
    Default {
        /// The wrapped node.
        inner: SchemaNode,
        /// Value applied when the input omits this node.
        value: Value,
    },
    /// The inner schema with an attached runtime effect.
    Effect {
        /// The wrapped node.
        inner: SchemaNode,
        /// What the effect does to the value.
        effect: EffectType,
    },
    /// Deferred resolution, for self-referential schemas.
    Lazy(LazyNode),
    /// Matches nothing; elides the field it annotates.
    Never,
    /// The undefined sentinel; elides the field it annotates.
    Undefined,
}

/// What an [`NodeKind::Effect`] wrapper does to values at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectType {
    /// Rewrites the parsed value; output shape diverges from input.
    Transform,
    /// Rewrites the raw value before parsing; input shape diverges.
    Preprocess,
    /// Validates without rewriting; shapes stay identical.
    Refine,
}

impl EffectType {
    /// Whether this effect makes input and output shapes diverge.
    #[must_use]
    pub fn diverges(self) -> bool {
        matches!(self, Self::Transform | Self::Preprocess)
    }
}

/// Deferred node resolution.
///
/// Lets a schema refer to itself: create an unresolved handle, use it
/// inside the shape, then bind it to the finished node. The first binding
/// wins; later bindings are ignored.
#[derive(Debug, Clone, Default)]
pub struct LazyNode {
    target: Arc<OnceLock<SchemaNode>>,
}

impl LazyNode {
    /// Creates a handle with no target yet.
    #[must_use]
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Binds the handle to its target node.
    pub fn resolve(&self, node: SchemaNode) {
        let _ = self.target.set(node);
    }

    /// Returns the target node, if already bound.
    #[must_use]
    pub fn get(&self) -> Option<&SchemaNode> {
        self.target.get()
    }
}

/// Unknown-keys policy of an object shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Additional properties are forbidden.
    Strict,
    /// Additional properties pass through.
    #[default]
    Passthrough,
}

/// The property shape of an object node.
///
/// # Example
///
/// ```rust
/// use synthspec_core::{ObjectShape, SchemaNode};
///
/// let shape = ObjectShape::new()
///     .field("id", SchemaNode::integer())
///     .field("note", SchemaNode::string().optional())
///     .strict();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    fields: IndexMap<String, SchemaNode>,
    unknown_keys: UnknownKeys,
    catch_all: Option<SchemaNode>,
    extends: Option<SchemaNode>,
}

impl ObjectShape {
    /// Creates an empty shape with the permissive unknown-keys policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. Declaration order is preserved in the output.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Forbids unknown keys (`additionalProperties: false`).
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Sets the catch-all schema for unknown keys.
    ///
    /// A [`SchemaNode::never`] catch-all is equivalent to no catch-all.
    #[must_use]
    pub fn catch_all(mut self, node: SchemaNode) -> Self {
        self.catch_all = Some(node);
        self
    }

    /// Declares the base object node this shape structurally extends.
    ///
    /// When the base is a registered component and the extension is purely
    /// additive, synthesis emits `allOf: [<base ref>]` plus the added
    /// fields instead of a flat duplicate.
    #[must_use]
    pub fn extends(mut self, base: &SchemaNode) -> Self {
        self.extends = Some(base.clone());
        self
    }

    /// The ordered field map.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, SchemaNode> {
        &self.fields
    }

    /// The unknown-keys policy.
    #[must_use]
    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    /// The catch-all node, if any.
    #[must_use]
    pub fn catch_all_node(&self) -> Option<&SchemaNode> {
        self.catch_all.as_ref()
    }

    /// The extension base, if any.
    #[must_use]
    pub fn extension_base(&self) -> Option<&SchemaNode> {
        self.extends.as_ref()
    }
}

impl SchemaNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId::next(),
                kind,
                name: None,
                manual_override: None,
            }),
        }
    }

    /// A plain string.
    #[must_use]
    pub fn string() -> Self {
        Self::new(NodeKind::String { format: None })
    }

    /// A string with a `format` hint.
    pub fn string_with_format(format: impl Into<String>) -> Self {
        Self::new(NodeKind::String {
            format: Some(format.into()),
        })
    }

    /// A floating-point number.
    #[must_use]
    pub fn number() -> Self {
        Self::new(NodeKind::Number { integer: false })
    }

    /// A whole number.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(NodeKind::Number { integer: true })
    }

    /// A boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(NodeKind::Boolean)
    }

    /// The JSON `null` value.
    #[must_use]
    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    /// A calendar date-time.
    #[must_use]
    pub fn date() -> Self {
        Self::new(NodeKind::Date)
    }

    /// Exactly the given JSON value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Literal(value.into()))
    }

    /// A closed set of string members.
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(NodeKind::Enum(members.into_iter().map(Into::into).collect()))
    }

    /// A closed set of arbitrary member values.
    pub fn native_enum<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(NodeKind::NativeEnum(
            members.into_iter().map(Into::into).collect(),
        ))
    }

    /// A homogeneous list of `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self::new(NodeKind::Array(items))
    }

    /// A fixed-arity heterogeneous list.
    pub fn tuple(items: impl IntoIterator<Item = Self>) -> Self {
        Self::new(NodeKind::Tuple(items.into_iter().collect()))
    }

    /// Any of the given alternatives.
    pub fn union(variants: impl IntoIterator<Item = Self>) -> Self {
        Self::new(NodeKind::Union(variants.into_iter().collect()))
    }

    /// Alternatives selected by the `tag` property.
    pub fn discriminated_union(
        tag: impl Into<String>,
        variants: impl IntoIterator<Item = Self>,
    ) -> Self {
        Self::new(NodeKind::DiscriminatedUnion {
            tag: tag.into(),
            variants: variants.into_iter().collect(),
        })
    }

    /// Arbitrary string keys mapping to `values`.
    #[must_use]
    pub fn record(values: Self) -> Self {
        Self::new(NodeKind::Record(values))
    }

    /// An object with the given shape.
    #[must_use]
    pub fn object(shape: ObjectShape) -> Self {
        Self::new(NodeKind::Object(shape))
    }

    /// A deferred node; see [`LazyNode`].
    #[must_use]
    pub fn lazy(handle: &LazyNode) -> Self {
        Self::new(NodeKind::Lazy(handle.clone()))
    }

    /// The never sentinel: elides the object field it annotates.
    #[must_use]
    pub fn never() -> Self {
        Self::new(NodeKind::Never)
    }

    /// The undefined sentinel: elides the object field it annotates.
    #[must_use]
    pub fn undefined() -> Self {
        Self::new(NodeKind::Undefined)
    }

    /// Wraps this node as optional.
    #[must_use]
    pub fn optional(self) -> Self {
        Self::new(NodeKind::Optional(self))
    }

    /// Wraps this node as nullable.
    #[must_use]
    pub fn nullable(self) -> Self {
        Self::new(NodeKind::Nullable(self))
    }

    /// Wraps this node with a default value.
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Default {
            inner: self,
            value: value.into(),
        })
    }

    /// Wraps this node with a transform effect (output shape diverges).
    #[must_use]
    pub fn with_transform(self) -> Self {
        Self::new(NodeKind::Effect {
            inner: self,
            effect: EffectType::Transform,
        })
    }

    /// Wraps this node with a preprocess effect (input shape diverges).
    #[must_use]
    pub fn with_preprocess(self) -> Self {
        Self::new(NodeKind::Effect {
            inner: self,
            effect: EffectType::Preprocess,
        })
    }

    /// Wraps this node with a refinement (no divergence).
    #[must_use]
    pub fn with_refine(self) -> Self {
        Self::new(NodeKind::Effect {
            inner: self,
            effect: EffectType::Refine,
        })
    }

    /// Requests registration under `name`; identity is preserved.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.name = Some(name.into());
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Attaches a manual-override fragment; identity is preserved.
    ///
    /// The fragment is returned verbatim when the dispatcher has no
    /// generator for this node's kind.
    #[must_use]
    pub fn with_override(self, fragment: SchemaObject) -> Self {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.manual_override = Some(fragment);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// This node's identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// This node's kind.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.inner.kind
    }

    /// The requested component name, if any.
    #[must_use]
    pub fn component_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The manual-override fragment, if any.
    #[must_use]
    pub fn manual_override(&self) -> Option<&SchemaObject> {
        self.inner.manual_override.as_ref()
    }

    /// Short name of this node's kind, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.inner.kind {
            NodeKind::String { .. } => "string",
            NodeKind::Number { integer: false } => "number",
            NodeKind::Number { integer: true } => "integer",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
            NodeKind::Literal(_) => "literal",
            NodeKind::Enum(_) => "enum",
            NodeKind::NativeEnum(_) => "native enum",
            NodeKind::Date => "date",
            NodeKind::Array(_) => "array",
            NodeKind::Object(_) => "object",
            NodeKind::Union(_) => "union",
            NodeKind::DiscriminatedUnion { .. } => "discriminated union",
            NodeKind::Record(_) => "record",
            NodeKind::Tuple(_) => "tuple",
            NodeKind::Optional(_) => "optional",
            NodeKind::Nullable(_) => "nullable",
            NodeKind::Default { .. } => "default",
            NodeKind::Effect { .. } => "effect",
            NodeKind::Lazy(_) => "lazy",
            NodeKind::Never => "never",
            NodeKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component_name() {
            Some(name) => write!(formatter, "{} {:?} ({})", self.kind_name(), name, self.id()),
            None => write!(formatter, "{} ({})", self.kind_name(), self.id()),
        }
    }
}
