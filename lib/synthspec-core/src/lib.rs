//! # Synthspec Core
//!
//! Synthesize OpenAPI / JSON-Schema document fragments from an in-memory,
//! composable validation-schema tree.
//!
//! A [`SchemaNode`] describes one element of a data-validation schema
//! (e.g. "an optional string", "an object extending `Base` with two more
//! fields"). [`synthesize`] converts a node tree into a [`Fragment`]: a
//! JSON-Schema-superset object ready to embed into an OpenAPI document,
//! plus the list of [`Effect`]s marking every point where the schema's
//! input and output interpretations diverge (defaults, preprocessing,
//! transforms).
//!
//! Named nodes are deduplicated through a [`ComponentRegistry`]: the first
//! use synthesizes the definition, every other use gets a
//! `#/components/schemas/<name>` reference, and self-referential schemas
//! terminate because the registry hands out forward references while a
//! definition is still in progress.
//!
//! ## Quick start
//!
//! ```rust
//! use synthspec_core::{ComponentRegistry, Mode, ObjectShape, SchemaNode, SynthState, synthesize};
//!
//! # fn main() -> Result<(), synthspec_core::SynthError> {
//! let user = SchemaNode::object(
//!     ObjectShape::new()
//!         .field("id", SchemaNode::integer())
//!         .field("nickname", SchemaNode::string().optional()),
//! )
//! .with_name("User");
//!
//! let mut registry = ComponentRegistry::new();
//! let fragment = synthesize(&user, &SynthState::new(Mode::Output), &mut registry)?;
//!
//! // the root fragment is a reference; the definition lives in the registry
//! let schemas = registry.schemas();
//! assert!(schemas.contains_key("User"));
//! assert!(fragment.effects.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Input and output modes
//!
//! A schema with defaults or transforms validates different shapes on the
//! way in and on the way out. Synthesis runs in one [`Mode`] at a time and
//! reports every divergence it crosses, so a caller can decide whether a
//! single document suffices or separate input-mode and output-mode
//! materializations are needed:
//!
//! ```rust
//! use synthspec_core::{ComponentRegistry, Mode, ObjectShape, SchemaNode, SynthState, synthesize};
//!
//! # fn main() -> Result<(), synthspec_core::SynthError> {
//! let node = SchemaNode::object(
//!     ObjectShape::new().field("page", SchemaNode::integer().with_default(1)),
//! );
//!
//! let mut registry = ComponentRegistry::new();
//! let output = synthesize(&node, &SynthState::new(Mode::Output), &mut registry)?;
//!
//! // `page` is always present in output mode, and the asymmetry is reported
//! assert_eq!(output.effects.len(), 1);
//! assert_eq!(output.effects[0].path, ["property: page"]);
//! # Ok(())
//! # }
//! ```

mod document;
pub use self::document::{
    AdditionalProperties, Discriminator, Ref, RefOr, SchemaObject, SchemaType, TypeKind,
};

mod schema;
pub use self::schema::{
    EffectType, LazyNode, NodeId, NodeKind, ObjectShape, SchemaNode, UnknownKeys,
};

mod synth;
pub use self::synth::{
    ComponentEntry, ComponentRegistry, ComponentState, Effect, EffectKind, Fragment, Mode,
    SynthError, SynthOptions, SynthState, synthesize,
};
