//! The identity-keyed component registry.
//!
//! Named sub-schemas are synthesized once, stored here, and referenced
//! everywhere else. The registry is also the cycle guard: an entry is
//! marked in-progress *before* its definition is synthesized, so a node
//! that reaches itself during recursion gets a reference back instead of
//! recursing forever.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::document::SchemaObject;
use crate::schema::{NodeId, SchemaNode};

use super::effect::Effect;
use super::error::SynthError;

/// Lifecycle of a registered component.
///
/// Transitions are monotonic: absent, then in-progress, then complete.
/// An entry never regresses.
#[derive(Debug, Clone)]
pub enum ComponentState {
    /// Registration started; the fragment is not yet materialized.
    /// Encountering this state during recursion is the cycle signal.
    InProgress,
    /// Fragment and effects are available, immutable from here on.
    Complete {
        /// The finished fragment.
        schema: SchemaObject,
        /// Effects observed while synthesizing it.
        effects: Vec<Effect>,
    },
}

/// One registry entry: a bound name plus its lifecycle state.
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    name: String,
    state: ComponentState,
}

impl ComponentEntry {
    /// The component name this entry is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry's lifecycle state.
    #[must_use]
    pub fn state(&self) -> &ComponentState {
        &self.state
    }

    /// Whether the fragment has been materialized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, ComponentState::Complete { .. })
    }
}

/// Identity-keyed store of named sub-schemas for one synthesis run.
///
/// Keys are [`NodeId`]s, never structural content: two nodes with
/// identical shapes are distinct entries. The registry is deliberately not
/// thread-safe; the whole algorithm runs on one call stack.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: IndexMap<NodeId, ComponentEntry>,
    names: HashMap<String, NodeId>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the entry for a node identity.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ComponentEntry> {
        self.entries.get(&id)
    }

    /// Number of registered entries, in-progress ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds `name` to the node and marks the entry in-progress.
    ///
    /// Must be called before recursing into the node's definition; the
    /// in-progress marking is the sole mechanism preventing unbounded
    /// recursion on cyclic schema graphs.
    pub(super) fn begin(&mut self, node: &SchemaNode, name: &str) -> Result<(), SynthError> {
        self.bind_name(name, node.id())?;
        self.entries.insert(
            node.id(),
            ComponentEntry {
                name: name.to_owned(),
                state: ComponentState::InProgress,
            },
        );
        tracing::debug!(node = %node, name, "component registration started");
        Ok(())
    }

    /// Stores the finished fragment for an in-progress entry.
    pub(super) fn complete(&mut self, id: NodeId, schema: SchemaObject, effects: Vec<Effect>) {
        if let Some(entry) = self.entries.get_mut(&id) {
            debug_assert!(!entry.is_complete(), "entry for {id} completed twice");
            entry.state = ComponentState::Complete { schema, effects };
            tracing::debug!(%id, name = %entry.name, "component registration complete");
        }
    }

    /// Registers an externally synthesized fragment as complete.
    ///
    /// This is the assembler-facing entry point: a surrounding document
    /// builder may seed components it produced itself. Registering an
    /// identity that is already complete under the same name is a no-op;
    /// binding a taken name to a different identity is a
    /// [`SynthError::DuplicateRef`].
    pub fn register_complete(
        &mut self,
        node: &SchemaNode,
        name: impl Into<String>,
        schema: SchemaObject,
        effects: Vec<Effect>,
    ) -> Result<(), SynthError> {
        let name = name.into();
        self.bind_name(&name, node.id())?;
        if let Some(entry) = self.entries.get(&node.id()) {
            if entry.is_complete() {
                return Ok(());
            }
        }
        self.entries.insert(
            node.id(),
            ComponentEntry {
                name,
                state: ComponentState::Complete { schema, effects },
            },
        );
        Ok(())
    }

    /// Entries whose registration never completed.
    ///
    /// A run that ends with orphans emitted a forward reference whose
    /// referent was never materialized, typically because synthesis
    /// aborted midway. This is not treated as an error here; strict
    /// callers can check and fail on their side.
    #[must_use]
    pub fn orphans(&self) -> Vec<(NodeId, &str)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_complete())
            .map(|(id, entry)| (*id, entry.name()))
            .collect()
    }

    /// The finished `components.schemas` map, in registration order.
    #[must_use]
    pub fn schemas(&self) -> IndexMap<String, SchemaObject> {
        let orphans = self.orphans();
        if !orphans.is_empty() {
            tracing::warn!(
                count = orphans.len(),
                "collecting schemas while components are still in progress"
            );
        }
        self.entries
            .values()
            .filter_map(|entry| match entry.state() {
                ComponentState::Complete { schema, .. } => {
                    Some((entry.name().to_owned(), schema.clone()))
                }
                ComponentState::InProgress => None,
            })
            .collect()
    }

    fn bind_name(&mut self, name: &str, id: NodeId) -> Result<(), SynthError> {
        if let Some(&existing) = self.names.get(name) {
            if existing != id {
                return Err(SynthError::DuplicateRef {
                    name: name.to_owned(),
                    existing,
                    requested: id,
                });
            }
            return Ok(());
        }
        self.names.insert(name.to_owned(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TypeKind;

    fn string_fragment() -> SchemaObject {
        SchemaObject::of_type(TypeKind::String)
    }

    #[test]
    fn should_start_absent() {
        let registry = ComponentRegistry::new();
        let node = SchemaNode::string();
        assert!(registry.get(node.id()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn should_transition_through_in_progress() {
        let mut registry = ComponentRegistry::new();
        let node = SchemaNode::string().with_name("Name");

        registry.begin(&node, "Name").expect("fresh name");
        let entry = registry.get(node.id()).expect("registered");
        assert!(!entry.is_complete());
        assert_eq!(registry.orphans().len(), 1);

        registry.complete(node.id(), string_fragment(), Vec::new());
        let entry = registry.get(node.id()).expect("registered");
        assert!(entry.is_complete());
        assert!(registry.orphans().is_empty());
    }

    #[test]
    fn should_reject_rebinding_name_to_other_identity() {
        let mut registry = ComponentRegistry::new();
        let first = SchemaNode::string();
        let second = SchemaNode::string();

        registry.begin(&first, "Name").expect("fresh name");
        let error = registry
            .begin(&second, "Name")
            .expect_err("name is taken by another identity");
        match error {
            SynthError::DuplicateRef {
                name,
                existing,
                requested,
            } => {
                assert_eq!(name, "Name");
                assert_eq!(existing, first.id());
                assert_eq!(requested, second.id());
            }
            other => panic!("expected DuplicateRef, got {other}"),
        }
    }

    #[test]
    fn should_accept_idempotent_external_registration() {
        let mut registry = ComponentRegistry::new();
        let node = SchemaNode::string();

        registry
            .register_complete(&node, "Name", string_fragment(), Vec::new())
            .expect("first registration");
        registry
            .register_complete(&node, "Name", string_fragment(), Vec::new())
            .expect("same identity, same name");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.schemas().len(), 1);
    }

    #[test]
    fn should_collect_schemas_in_registration_order() {
        let mut registry = ComponentRegistry::new();
        let zulu = SchemaNode::string();
        let alpha = SchemaNode::string();

        registry
            .register_complete(&zulu, "Zulu", string_fragment(), Vec::new())
            .expect("register zulu");
        registry
            .register_complete(&alpha, "Alpha", string_fragment(), Vec::new())
            .expect("register alpha");

        let names = registry.schemas().keys().cloned().collect::<Vec<_>>();
        assert_eq!(names, ["Zulu", "Alpha"]);
    }

    #[test]
    fn should_skip_orphans_when_collecting_schemas() {
        let mut registry = ComponentRegistry::new();
        let done = SchemaNode::string();
        let stuck = SchemaNode::string().with_name("Stuck");

        registry
            .register_complete(&done, "Done", string_fragment(), Vec::new())
            .expect("register done");
        registry.begin(&stuck, "Stuck").expect("fresh name");

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert!(schemas.contains_key("Done"));
        assert_eq!(registry.orphans(), vec![(stuck.id(), "Stuck")]);
    }
}
