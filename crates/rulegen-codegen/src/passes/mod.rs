//! Rewrite passes over a group's instructions.
//!
//! Each pass edits the group's [`rulegen_insn::InsnList`] in place and must
//! run before the group is frozen by synthesis. The passes are independent;
//! a [`crate::UnitStrategy`] picks the ones its unit kind needs and their
//! order.
//!
//! - [`fix_context_switches`] - bracket `UP*`/`DOWN*` calls with explicit
//!   context hand-offs
//! - [`insert_set_context_calls`] - install the context on context-aware
//!   call targets
//! - [`convert_captured_loads`] - turn loads of captured locals into field
//!   reads on the unit
//! - [`first_of_subtree`] - earliest instruction a node depends on

mod captures;
mod context_aware;
mod context_switch;
mod subtree;

pub use captures::convert_captured_loads;
pub use context_aware::insert_set_context_calls;
pub use context_switch::{HandOff, fix_context_switches};
pub use subtree::first_of_subtree;

use rulegen_insn::{InsnGroup, NodeId, NodeRole};

use crate::error::Result;

/// Nodes of `role`, in arena order.
fn nodes_with_role(group: &InsnGroup, role: NodeRole) -> Vec<NodeId> {
    group
        .node_ids()
        .filter(|&id| group.nodes()[id.index()].role() == role)
        .collect()
}

/// Current position of a node's instruction.
fn position(group: &InsnGroup, node: NodeId) -> Result<usize> {
    let insn = group.node(node)?.insn();
    group
        .instructions()
        .index_of(insn)
        .ok_or_else(|| rulegen_insn::Error::UnknownInsn(insn).into())
}
