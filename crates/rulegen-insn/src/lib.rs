//! Rulegen instruction model.
//!
//! This crate holds the data the group unit generator consumes: the
//! stack-machine instructions of a rule method, the dependency graph built
//! over them, and the extractable groups that graph analysis carves out of a
//! method. It carries no extraction policy. Deciding which expressions form a
//! group, and classifying graph nodes, happens before the data reaches here.
//!
//! # Architecture
//!
//! - [`descriptor`] - Internal type names and JVM-style type descriptors
//! - [`insn`] - The [`Insn`] instruction set and its stack effects
//! - [`list`] - [`InsnList`], an ordered list with stable instruction handles
//! - [`graph`] - [`InsnGraphNode`] dependency nodes and their classifications
//! - [`group`] - [`InsnGroup`], [`RuleMethod`] and [`OwnerType`]
//! - [`error`] - Error types for malformed model input
//!
//! # Example
//!
//! ```
//! use rulegen_insn::{Insn, InsnGroup, NodeRole, RootKind};
//!
//! let mut builder = InsnGroup::builder("Action$Ab12");
//! let ctx = builder.push(Insn::Load(1));
//! let call = builder.push_node(
//!     Insn::invoke_interface("rulegen/runtime/Context", "hasError", "()Z"),
//!     NodeRole::Plain,
//!     &[ctx],
//! );
//! builder.mark_root(call, RootKind::Action);
//! let group = builder.build().unwrap();
//! assert_eq!(group.instructions().len(), 2);
//! ```

pub mod descriptor;
pub mod error;
pub mod graph;
pub mod group;
pub mod insn;
pub mod list;

pub use descriptor::{MethodDesc, TypeName, value_size};
pub use error::{Error, Result};
pub use graph::{InsnGraphNode, NodeId, NodeRole, RootKind};
pub use group::{CapturedVar, GroupBuilder, GroupStage, InsnGroup, OwnerType, RuleMethod};
pub use insn::{
    BinaryOp, Condition, Constant, Insn, InsnId, InvokeKind, LabelId, ReturnKind, StackEffect,
};
pub use list::InsnList;
