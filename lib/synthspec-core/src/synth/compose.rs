//! Object-schema composition and structural-extension detection.

use indexmap::IndexMap;

use crate::document::{AdditionalProperties, RefOr, SchemaObject, TypeKind};
use crate::schema::{NodeKind, ObjectShape, SchemaNode, UnknownKeys};

use super::effect::{Effect, EffectKind, Mode};
use super::error::SynthError;
use super::registry::ComponentRegistry;
use super::{Fragment, SynthState, synthesize};

/// Builds an object fragment for `shape`.
///
/// When the shape declares an extension base that qualifies, the fragment
/// is emitted as `allOf: [<base ref>]` plus the added fields; otherwise
/// the full shape is synthesized flat.
pub(super) fn object(
    shape: &ObjectShape,
    state: &SynthState,
    registry: &mut ComponentRegistry,
) -> Result<Fragment, SynthError> {
    if let Some(base) = shape.extension_base() {
        if let Some(fragment) = try_extension(shape, base, state, registry)? {
            return Ok(fragment);
        }
    }
    compose_shape(shape.fields(), shape, state, registry)
}

/// Synthesizes `fields` into an object fragment, applying `shape`'s
/// unknown-keys policy and catch-all.
///
/// The field map is passed separately so extension synthesis can reuse
/// this for the diff-only fields while keeping the extended node's policy.
fn compose_shape(
    fields: &IndexMap<String, SchemaNode>,
    shape: &ObjectShape,
    state: &SynthState,
    registry: &mut ComponentRegistry,
) -> Result<Fragment, SynthError> {
    let mut properties = IndexMap::new();
    let mut required = Vec::new();
    let mut effects = Vec::new();

    for (name, field) in fields {
        if field_is_elided(field) {
            continue;
        }
        let field_state = state.push(format!("property: {name}"));
        if field_is_required(field, state.mode()) {
            required.push(name.clone());
        }
        if matches!(field.kind(), NodeKind::Default { .. }) {
            // defaults are required in output but optional in input
            effects.push(Effect::observed(EffectKind::Schema, field.id(), &field_state));
        }
        let fragment = synthesize(field, &field_state, registry)?;
        properties.insert(name.clone(), fragment.schema);
        effects.extend(fragment.effects);
    }

    let additional_properties = match (shape.unknown_keys(), shape.catch_all_node()) {
        (UnknownKeys::Strict, _) => Some(AdditionalProperties::Allowed(false)),
        (UnknownKeys::Passthrough, Some(catch_all))
            if !matches!(catch_all.kind(), NodeKind::Never) =>
        {
            let fragment = synthesize(catch_all, &state.push("additional properties"), registry)?;
            effects.extend(fragment.effects);
            Some(AdditionalProperties::Schema(Box::new(fragment.schema)))
        }
        _ => None,
    };

    let schema = SchemaObject {
        properties,
        required,
        additional_properties,
        ..SchemaObject::of_type(TypeKind::Object)
    };
    Ok(Fragment {
        schema: RefOr::T(schema),
        effects,
    })
}

/// Attempts the compositional form for a shape extending `base`.
///
/// Returns `None` when the extension does not qualify and the caller must
/// fall back to flat synthesis of the full shape. The extension qualifies
/// only if the base is (or will become) a registry entry, the base keeps
/// the permissive unknown-keys policy with no effective catch-all, and
/// every field shared with the base is identity-equal; an override of a
/// shared key disqualifies it.
fn try_extension(
    shape: &ObjectShape,
    base: &SchemaNode,
    state: &SynthState,
    registry: &mut ComponentRegistry,
) -> Result<Option<Fragment>, SynthError> {
    if base.component_name().is_none() && registry.get(base.id()).is_none() {
        return Ok(None);
    }
    let NodeKind::Object(base_shape) = base.kind() else {
        return Ok(None);
    };
    if base_shape.unknown_keys() == UnknownKeys::Strict {
        return Ok(None);
    }
    if let Some(catch_all) = base_shape.catch_all_node() {
        if !matches!(catch_all.kind(), NodeKind::Never) {
            return Ok(None);
        }
    }

    let mut added = IndexMap::new();
    for (name, field) in shape.fields() {
        match base_shape.fields().get(name) {
            Some(base_field) if base_field.id() == field.id() => {}
            Some(_) => return Ok(None),
            None => {
                added.insert(name.clone(), field.clone());
            }
        }
    }

    // registers the base if this is its first use; a base that is still
    // in progress (self-referential extension) yields a component effect
    // instead of recursing into it
    let base_fragment = synthesize(base, state, registry)?;
    let RefOr::Ref(base_reference) = base_fragment.schema else {
        return Ok(None);
    };

    let diff_fragment = compose_shape(&added, shape, state, registry)?;
    let (mut schema, diff_effects) = diff_fragment.into_object(state)?;
    schema.all_of = vec![RefOr::Ref(base_reference)];

    let mut effects = base_fragment.effects;
    effects.extend(diff_effects);
    Ok(Some(Fragment {
        schema: RefOr::T(schema),
        effects,
    }))
}

fn field_is_elided(field: &SchemaNode) -> bool {
    matches!(field.kind(), NodeKind::Never | NodeKind::Undefined)
}

/// A field is required unless its node is an optional wrapper, or a
/// default wrapper evaluated in input mode.
fn field_is_required(field: &SchemaNode, mode: Mode) -> bool {
    match field.kind() {
        NodeKind::Optional(_) => false,
        NodeKind::Default { .. } => mode == Mode::Output,
        _ => true,
    }
}
