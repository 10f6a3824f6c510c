use rulegen_insn::{Insn, InsnGroup, InvokeKind, NodeRole};
use tracing::debug;

use super::nodes_with_role;
use crate::config::Types;
use crate::error::{Error, Result};

/// Tell the target of every context-aware call which context it runs in.
///
/// Right before each flagged call the target receives
/// `setContext(<slot 1>)`. When the call has arguments beyond its target,
/// the target is no longer on top of the stack at the call site, so a copy
/// is parked in a fresh local right after the target is computed and
/// reloaded at the call site. Without arguments the target is still on top
/// and is simply duplicated. Either way the stack seen by the original call
/// is unchanged.
///
/// `last_local` is the highest local slot already in use; new slots are
/// allocated above it. Returns the highest slot in use afterwards.
pub fn insert_set_context_calls(
    group: &mut InsnGroup,
    types: &Types,
    mut last_local: u16,
) -> Result<u16> {
    let set_context = Insn::invoke(
        InvokeKind::Interface,
        types.context_aware.clone(),
        &types.set_context,
        &types.set_context_desc(),
    );

    for node in nodes_with_role(group, NodeRole::ContextAwareCall) {
        let graph_node = group.node(node)?;
        let call = graph_node.insn();
        let predecessors = graph_node.predecessors().to_vec();
        let Some(&target) = predecessors.first() else {
            return Err(Error::MissingCallTarget {
                group: group.name().to_string(),
                node,
            });
        };
        let target_insn = group.node(target)?.insn();

        let cache_local = if predecessors.len() > 1 {
            let local = last_local
                .checked_add(1)
                .ok_or_else(|| Error::LocalsExhausted(group.name().to_string()))?;
            Some(local)
        } else {
            None
        };

        let instructions = group.instructions_mut()?;
        if let Some(local) = cache_local {
            last_local = local;
            let dup = instructions.insert_after(target_insn, Insn::Dup)?;
            instructions.insert_after(dup, Insn::Store(last_local))?;
            instructions.insert_before(call, Insn::Load(last_local))?;
            debug!(%node, local = last_local, "context-aware target cached");
        } else {
            instructions.insert_before(call, Insn::Dup)?;
        }
        instructions.insert_before(call, Insn::Load(1))?;
        instructions.insert_before(call, set_context.clone())?;
    }

    Ok(last_local)
}
