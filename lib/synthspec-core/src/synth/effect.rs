//! Records of input/output shape divergence.

use crate::schema::NodeId;

use super::SynthState;

/// The two interpretations of a schema.
///
/// `Input` describes values before defaults and effects are applied,
/// `Output` the values after. Most schemas read identically in both modes;
/// every point where they do not is reported as an [`Effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Mode {
    /// The shape of values fed into validation.
    #[display("input")]
    Input,
    /// The shape of values produced by validation.
    #[display("output")]
    Output,
}

/// Where a divergence was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum EffectKind {
    /// Observed directly on a schema fragment.
    #[display("schema")]
    Schema,
    /// Observed through a component reference that was emitted before the
    /// referent finished synthesizing.
    #[display("component")]
    Component,
}

/// One observed point of divergence between input and output shapes.
///
/// Effects are a diagnostic trail, not a set: nested synthesis flattens
/// child effect lists into the parent's in traversal order, duplicates
/// permitted, and no composer may drop one. A caller inspecting the
/// top-level list can decide whether a schema needs separate input-mode
/// and output-mode materializations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    /// Where the divergence was observed.
    pub kind: EffectKind,
    /// The mode that was active when it was observed.
    pub mode: Mode,
    /// Identity of the originating node.
    pub node: NodeId,
    /// Traversal path at which it occurred.
    pub path: Vec<String>,
}

impl Effect {
    pub(crate) fn observed(kind: EffectKind, node: NodeId, state: &SynthState) -> Self {
        Self {
            kind,
            mode: state.mode(),
            node,
            path: state.path().to_vec(),
        }
    }
}
