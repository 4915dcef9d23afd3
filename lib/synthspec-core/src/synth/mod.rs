//! The recursive schema-synthesis core.
//!
//! [`synthesize`] walks a [`SchemaNode`] tree depth-first and produces a
//! [`Fragment`] per node: primitive kinds go through one-shot leaf
//! generators, composites recurse through the same entry point, and named
//! nodes are intercepted by the [`ComponentRegistry`] which deduplicates
//! them into `$ref` values and breaks cycles.
//!
//! Synthesis is synchronous and single-threaded; recursion depth equals
//! schema nesting depth, and the registry's in-progress marking is the
//! only cycle guard, so self-referential schemas must close their loop
//! through a *named* node.

mod compose;
mod effect;
mod error;
mod leaf;
mod registry;

pub use self::effect::{Effect, EffectKind, Mode};
pub use self::error::SynthError;
pub use self::registry::{ComponentEntry, ComponentRegistry, ComponentState};

use serde_json::Value;

use crate::document::{
    AdditionalProperties, Discriminator, Ref, RefOr, SchemaObject, SchemaType, TypeKind,
};
use crate::schema::{NodeKind, SchemaNode};

/// Document-wide synthesis options.
#[derive(Debug, Clone)]
pub struct SynthOptions {
    /// Prefix prepended to component names when formatting `$ref` values.
    pub ref_path_prefix: String,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            ref_path_prefix: Ref::SCHEMA_PREFIX.to_owned(),
        }
    }
}

/// State threaded through every recursive synthesis call.
///
/// Cloned into child calls; path pushes are only visible below the
/// current node, so the path restores itself on return.
#[derive(Debug, Clone)]
pub struct SynthState {
    mode: Mode,
    path: Vec<String>,
    options: SynthOptions,
}

impl SynthState {
    /// Creates a root state for the given mode with default options.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self::with_options(mode, SynthOptions::default())
    }

    /// Creates a root state with explicit options.
    #[must_use]
    pub fn with_options(mode: Mode, options: SynthOptions) -> Self {
        Self {
            mode,
            path: Vec::new(),
            options,
        }
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The current traversal path, as rendered segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub(crate) fn push(&self, segment: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.path.push(segment.into());
        child
    }

    pub(crate) fn render_path(&self) -> String {
        if self.path.is_empty() {
            "schema root".to_owned()
        } else {
            self.path.join(" > ")
        }
    }

    pub(crate) fn schema_ref(&self, name: &str) -> Ref {
        Ref::new(format!("{}{name}", self.options.ref_path_prefix))
    }
}

/// The result of synthesizing one node: a document fragment plus every
/// effect observed beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The synthesized schema, inline or as a component reference.
    pub schema: RefOr<SchemaObject>,
    /// Input/output divergences, in traversal order.
    pub effects: Vec<Effect>,
}

impl Fragment {
    fn plain(schema: SchemaObject) -> Self {
        Self {
            schema: RefOr::T(schema),
            effects: Vec::new(),
        }
    }

    /// Unwraps the plain schema object, with this fragment's effects.
    ///
    /// # Errors
    ///
    /// [`SynthError::UnexpectedReferenceFragment`] when the fragment is a
    /// reference.
    pub fn into_object(self, state: &SynthState) -> Result<(SchemaObject, Vec<Effect>), SynthError> {
        match self.schema {
            RefOr::T(schema) => Ok((schema, self.effects)),
            RefOr::Ref(reference) => Err(SynthError::UnexpectedReferenceFragment {
                reference: reference.ref_location,
                path: state.render_path(),
            }),
        }
    }
}

/// Synthesizes a schema-document fragment for `node`.
///
/// This is the type dispatcher and the single recursion entry point.
/// Nodes carrying a component name are intercepted by the registry:
/// a complete entry returns its reference immediately without re-running
/// generators, an in-progress entry returns a forward reference plus a
/// `component`-kind effect (the cycle guard), and an absent entry is
/// marked in-progress *before* its definition is synthesized.
///
/// # Errors
///
/// See [`SynthError`] for the failure taxonomy; synthesis is
/// all-or-nothing per invocation.
pub fn synthesize(
    node: &SchemaNode,
    state: &SynthState,
    registry: &mut ComponentRegistry,
) -> Result<Fragment, SynthError> {
    if let Some(entry) = registry.get(node.id()) {
        let reference = state.schema_ref(entry.name());
        let effects = match entry.state() {
            ComponentState::Complete { effects, .. } => effects.clone(),
            ComponentState::InProgress => {
                tracing::debug!(node = %node, "cycle detected, emitting forward reference");
                vec![Effect::observed(EffectKind::Component, node.id(), state)]
            }
        };
        return Ok(Fragment {
            schema: RefOr::Ref(reference),
            effects,
        });
    }

    let Some(name) = node.component_name() else {
        return synthesize_kind(node, state, registry);
    };

    registry.begin(node, name)?;
    let fragment = synthesize_kind(node, state, registry)?;
    let (schema, effects) = fragment.into_object(state)?;
    registry.complete(node.id(), schema, effects.clone());
    Ok(Fragment {
        schema: RefOr::Ref(state.schema_ref(name)),
        effects,
    })
}

/// Dispatches on the node's variant. Exhaustive over the closed set;
/// kinds without a generator fall through to the manual-override escape
/// hatch or fail.
fn synthesize_kind(
    node: &SchemaNode,
    state: &SynthState,
    registry: &mut ComponentRegistry,
) -> Result<Fragment, SynthError> {
    let fragment = match node.kind() {
        NodeKind::String { format } => Fragment::plain(leaf::string(format.as_deref())),
        NodeKind::Number { integer } => Fragment::plain(leaf::number(*integer)),
        NodeKind::Boolean => Fragment::plain(leaf::boolean()),
        NodeKind::Null => Fragment::plain(leaf::null()),
        NodeKind::Literal(value) => Fragment::plain(leaf::literal(value)),
        NodeKind::Enum(members) => Fragment::plain(leaf::enumeration(members)),
        NodeKind::NativeEnum(members) => Fragment::plain(leaf::native_enum(members)),
        NodeKind::Date => Fragment::plain(leaf::date()),
        NodeKind::Array(items) => {
            let item = synthesize(items, &state.push("items"), registry)?;
            let schema = SchemaObject {
                items: Some(Box::new(item.schema)),
                ..SchemaObject::of_type(TypeKind::Array)
            };
            Fragment {
                schema: RefOr::T(schema),
                effects: item.effects,
            }
        }
        NodeKind::Tuple(items) => {
            let mut prefix_items = Vec::with_capacity(items.len());
            let mut effects = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let child = synthesize(item, &state.push(format!("tuple item {index}")), registry)?;
                prefix_items.push(child.schema);
                effects.extend(child.effects);
            }
            let schema = SchemaObject {
                prefix_items,
                min_items: Some(items.len()),
                max_items: Some(items.len()),
                ..SchemaObject::of_type(TypeKind::Array)
            };
            Fragment {
                schema: RefOr::T(schema),
                effects,
            }
        }
        NodeKind::Union(variants) => {
            let mut any_of = Vec::with_capacity(variants.len());
            let mut effects = Vec::new();
            for (index, variant) in variants.iter().enumerate() {
                let child =
                    synthesize(variant, &state.push(format!("union option {index}")), registry)?;
                any_of.push(child.schema);
                effects.extend(child.effects);
            }
            Fragment {
                schema: RefOr::T(SchemaObject {
                    any_of,
                    ..SchemaObject::default()
                }),
                effects,
            }
        }
        NodeKind::DiscriminatedUnion { tag, variants } => {
            let mut one_of = Vec::with_capacity(variants.len());
            let mut effects = Vec::new();
            for (index, variant) in variants.iter().enumerate() {
                let child = synthesize(
                    variant,
                    &state.push(format!("discriminated union option {index}")),
                    registry,
                )?;
                one_of.push(child.schema);
                effects.extend(child.effects);
            }
            Fragment {
                schema: RefOr::T(SchemaObject {
                    one_of,
                    discriminator: Some(Discriminator::new(tag.clone())),
                    ..SchemaObject::default()
                }),
                effects,
            }
        }
        NodeKind::Record(values) => {
            let value = synthesize(values, &state.push("additional properties"), registry)?;
            let schema = SchemaObject {
                additional_properties: Some(AdditionalProperties::Schema(Box::new(value.schema))),
                ..SchemaObject::of_type(TypeKind::Object)
            };
            Fragment {
                schema: RefOr::T(schema),
                effects: value.effects,
            }
        }
        NodeKind::Object(shape) => compose::object(shape, state, registry)?,
        NodeKind::Optional(inner) => synthesize(inner, state, registry)?,
        NodeKind::Nullable(inner) => apply_nullable(synthesize(inner, state, registry)?),
        NodeKind::Default { inner, value } => {
            apply_default(synthesize(inner, state, registry)?, value.clone())
        }
        NodeKind::Effect { inner, effect } => {
            let mut fragment = synthesize(inner, state, registry)?;
            if effect.diverges() {
                fragment
                    .effects
                    .insert(0, Effect::observed(EffectKind::Schema, node.id(), state));
            }
            fragment
        }
        NodeKind::Lazy(lazy) => match lazy.get() {
            Some(target) => synthesize(target, state, registry)?,
            None => unmatched(node, state)?,
        },
        NodeKind::Never | NodeKind::Undefined => unmatched(node, state)?,
    };
    Ok(fragment)
}

/// The escape hatch for kinds no generator matches: a pre-supplied
/// fragment is returned verbatim, anything else is a hard error.
fn unmatched(node: &SchemaNode, state: &SynthState) -> Result<Fragment, SynthError> {
    if let Some(fragment) = node.manual_override() {
        return Ok(Fragment::plain(fragment.clone()));
    }
    Err(SynthError::UnrecognizedSchemaKind {
        node: node.to_string(),
        path: state.render_path(),
    })
}

/// Merges `null` into a plain single-`type` fragment; references and
/// composite fragments are wrapped in `anyOf` instead.
fn apply_nullable(fragment: Fragment) -> Fragment {
    let Fragment { schema, effects } = fragment;
    let schema = match schema {
        RefOr::T(mut object)
            if object.schema_type.is_some()
                && object.all_of.is_empty()
                && object.any_of.is_empty()
                && object.one_of.is_empty() =>
        {
            object.schema_type = object.schema_type.map(merge_null);
            RefOr::T(object)
        }
        other => RefOr::T(SchemaObject {
            any_of: vec![other, RefOr::T(SchemaObject::of_type(TypeKind::Null))],
            ..SchemaObject::default()
        }),
    };
    Fragment { schema, effects }
}

fn merge_null(schema_type: SchemaType) -> SchemaType {
    match schema_type {
        SchemaType::Single(TypeKind::Null) => SchemaType::Single(TypeKind::Null),
        SchemaType::Single(kind) => SchemaType::Many(vec![kind, TypeKind::Null]),
        SchemaType::Many(mut kinds) => {
            if !kinds.contains(&TypeKind::Null) {
                kinds.push(TypeKind::Null);
            }
            SchemaType::Many(kinds)
        }
    }
}

/// Attaches the default value; a reference fragment is wrapped as
/// `allOf [ref]` first, since `$ref` tolerates no sibling keys.
fn apply_default(fragment: Fragment, value: Value) -> Fragment {
    let Fragment { schema, effects } = fragment;
    let schema = match schema {
        RefOr::T(mut object) => {
            object.default = Some(value);
            RefOr::T(object)
        }
        RefOr::Ref(reference) => RefOr::T(SchemaObject {
            all_of: vec![RefOr::Ref(reference)],
            default: Some(value),
            ..SchemaObject::default()
        }),
    };
    Fragment { schema, effects }
}
