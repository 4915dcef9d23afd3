//! Error taxonomy for schema synthesis.

use crate::schema::NodeId;

/// Errors raised while synthesizing schema fragments.
///
/// Synthesis is all-or-nothing: any of these aborts the whole run, and
/// none of them is transient, so there is no retry path. Registry entries
/// already complete before the failure stay valid; a caller may fix the
/// offending node and synthesize again against the same registry.
#[derive(Debug, derive_more::Error, derive_more::Display)]
pub enum SynthError {
    /// The node's variant has no generator and no manual-override fragment.
    ///
    /// A schema authoring defect: the dispatcher covers the closed variant
    /// set, so this surfaces sentinels used outside a field position and
    /// unresolved lazy nodes.
    #[display("no schema generator for {node} at {path}")]
    UnrecognizedSchemaKind {
        /// Rendering of the unresolvable node.
        node: String,
        /// Traversal path where dispatch failed.
        path: String,
    },

    /// Two distinct node identities requested the same component name.
    ///
    /// A user configuration mistake; the first binding is never silently
    /// overwritten.
    #[display("component name {name:?} is already bound to {existing}, refusing to rebind it to {requested}")]
    DuplicateRef {
        /// The contested component name.
        name: String,
        /// Identity the name is already bound to.
        existing: NodeId,
        /// Identity that requested the rebind.
        requested: NodeId,
    },

    /// A call site expected a plain fragment but received a reference.
    ///
    /// Internal invariant violation; not reachable through normal schema
    /// shapes.
    #[display("expected a plain schema fragment at {path}, found reference to {reference}")]
    UnexpectedReferenceFragment {
        /// Location of the offending reference.
        reference: String,
        /// Traversal path where the fragment was expected.
        path: String,
    },
}
