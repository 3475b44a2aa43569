//! Error taxonomy for widget construction and configuration mistakes.
//!
//! Everything here is a programmer error surfaced synchronously out of
//! `layout()`, `bind()` or tree maintenance calls. Nothing is retried; the host
//! decides whether to abort or log and continue.

use crate::binding::KeyChord;
use crate::node::NodeId;

/// Errors raised by the view tree, layout engine and key binding tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A containing dimension was negative.
    #[error("invalid geometry: containing dimension {dimension} is negative")]
    InvalidGeometry {
        /// The offending containing dimension.
        dimension: i32,
    },

    /// A position or dimension referenced a node whose Frame is not
    /// resolvable in the current layout pass.
    #[error("layout order: {node:?} references {target:?} before its frame is resolved")]
    LayoutOrder {
        /// The node being resolved.
        node: NodeId,
        /// The referenced node.
        target: NodeId,
    },

    /// Position/dimension references form a cycle.
    #[error("layout cycle detected while resolving {node:?}")]
    LayoutCycle {
        /// The node that was found already in progress.
        node: NodeId,
    },

    /// A key chord was bound to an empty command sequence.
    #[error("invalid binding: {chord} must map to at least one command")]
    InvalidBinding {
        /// The rejected chord.
        chord: KeyChord,
    },

    /// The id does not name a live node (disposed or never created).
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The requested tree edit would break the hierarchy.
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(&'static str),
}

/// Result alias used throughout `trellis-core`.
pub type Result<T> = std::result::Result<T, Error>;
