//! Errors for group unit generation.
//!
//! # Error Categories
//!
//! - **Malformed input**: [`Error::MissingNamespace`], [`Error::UnknownCapture`],
//!   [`Error::UnexpectedInsn`], [`Error::UnknownDirection`],
//!   [`Error::MissingCallTarget`], [`Error::LocalsExhausted`], [`Error::Model`]
//! - **Synthesis failures**: [`Error::Sizing`], [`Error::Encode`], [`Error::Decode`]
//! - **Installation conflicts**: [`Error::DuplicateDefinition`], [`Error::NameMismatch`]
//!
//! # Error Handling Policy
//!
//! Every error is deterministic, caused by bad input or an internal
//! inconsistency, so nothing is retried. Errors surface to the caller of
//! [`crate::GroupUnitGenerator::process`] and abort preparation of the owning
//! type. A unit is never installed after an error.

use rulegen_insn::{NodeId, TypeName};
use thiserror::Error;

use crate::sizing::SizingError;

/// Generator result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synthesizing or installing group units.
#[derive(Debug, Error)]
pub enum Error {
    /// The instruction model rejected an edit or lookup.
    #[error(transparent)]
    Model(#[from] rulegen_insn::Error),

    /// The owner type lives in the unnamed namespace, so no sibling unit
    /// name can be derived from it.
    #[error("owner type `{0}` has no namespace separator")]
    MissingNamespace(TypeName),

    /// A captured load reads a slot no captured variable is declared for.
    #[error("group `{group}` loads captured slot {slot}, which has no field")]
    UnknownCapture {
        /// Group being rewritten.
        group: String,
        /// The slot read by the load.
        slot: u16,
    },

    /// A flagged node wraps an instruction of the wrong shape.
    #[error("node {node} in group `{group}` should wrap a {expected}")]
    UnexpectedInsn {
        /// Group being rewritten.
        group: String,
        /// The offending node.
        node: NodeId,
        /// Instruction shape the node's classification requires.
        expected: &'static str,
    },

    /// A context switch call whose name carries neither `UP` nor `DOWN`.
    #[error("context switch `{0}` has no UP/DOWN direction")]
    UnknownDirection(String),

    /// A context-aware call node has no producer for its call target.
    #[error("context-aware call {node} in group `{group}` has no call target")]
    MissingCallTarget {
        /// Group being rewritten.
        group: String,
        /// The call node.
        node: NodeId,
    },

    /// No local slot is left to cache a context-aware call target in.
    #[error("group `{0}` has no free local slot left")]
    LocalsExhausted(String),

    /// Capture conversion ran before the group was given its unit name.
    #[error("group `{0}` has no unit type yet")]
    UnnamedGroup(String),

    /// Stack or locals sizing failed for a generated method.
    #[error("cannot size method `{method}` of `{unit}`: {source}")]
    Sizing {
        /// Unit the method belongs to.
        unit: TypeName,
        /// The method being sized.
        method: String,
        /// What went wrong.
        #[source]
        source: SizingError,
    },

    /// The definition could not be serialized.
    #[error("failed to encode unit `{unit}`: {message}")]
    Encode {
        /// Unit being encoded.
        unit: TypeName,
        /// Encoder message.
        message: String,
    },

    /// Unit code is not a valid encoded definition.
    #[error("invalid unit code: {0}")]
    Decode(String),

    /// A definition with this name already exists in the loader scope.
    #[error("unit `{0}` is already defined in this scope")]
    DuplicateDefinition(TypeName),

    /// The code handed to a scope defines a different name than requested.
    #[error("code defines `{found}` but was installed as `{expected}`")]
    NameMismatch {
        /// Name the caller asked to define.
        expected: TypeName,
        /// Name found inside the code.
        found: TypeName,
    },
}
