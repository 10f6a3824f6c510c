//! Errors raised by the instruction model.
//!
//! Every variant describes malformed input handed over by the graph builder
//! or a misuse of the positional editing API. None of them are transient.

use thiserror::Error;

use crate::graph::NodeId;
use crate::insn::InsnId;

/// Model result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or editing instruction groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An edit referenced an instruction handle that is not (or no longer)
    /// part of the list.
    #[error("instruction {0} is not part of this list")]
    UnknownInsn(InsnId),

    /// A node id does not exist in the group's node arena.
    #[error("node {node} is not part of group `{group}`")]
    UnknownNode {
        /// The offending node id.
        node: NodeId,
        /// Name of the group that was queried.
        group: String,
    },

    /// A type or method descriptor does not follow the descriptor grammar.
    #[error("malformed descriptor `{desc}`: {reason}")]
    MalformedDescriptor {
        /// The descriptor as given.
        desc: String,
        /// What the parser tripped over.
        reason: &'static str,
    },

    /// The group was synthesized already, its instructions are read-only.
    #[error("group `{0}` is frozen, its instructions can no longer change")]
    GroupFrozen(String),

    /// Two captured variables claim the same local slot.
    #[error("duplicate captured slot {slot} in group `{group}`")]
    DuplicateCapture {
        /// The slot claimed twice.
        slot: u16,
        /// Name of the group being built.
        group: String,
    },

    /// A group was built without any instructions.
    #[error("group `{0}` has no nodes")]
    EmptyGroup(String),
}
