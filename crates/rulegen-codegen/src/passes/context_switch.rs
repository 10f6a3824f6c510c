use rulegen_insn::{Insn, InsnGroup, InsnId, InsnList, NodeId, NodeRole, TypeName};
use tracing::debug;

use super::{first_of_subtree, nodes_with_role, position};
use crate::config::Types;
use crate::error::{Error, Result};

/// Direction of a context hand-off, parsed from a context switch call name.
///
/// Names are `UP` or `DOWN` followed by an optional suffix (`UP2`,
/// `DOWN3`). The suffix carries over unchanged to the inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOff {
    Up(String),
    Down(String),
}

impl HandOff {
    pub fn parse(name: &str) -> Result<Self> {
        if let Some(suffix) = name.strip_prefix("UP") {
            Ok(HandOff::Up(suffix.to_string()))
        } else if let Some(suffix) = name.strip_prefix("DOWN") {
            Ok(HandOff::Down(suffix.to_string()))
        } else {
            Err(Error::UnknownDirection(name.to_string()))
        }
    }

    /// The hand-off that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            HandOff::Up(suffix) => HandOff::Down(suffix.clone()),
            HandOff::Down(suffix) => HandOff::Up(suffix.clone()),
        }
    }

    /// Method name on the unit's base type performing the hand-off.
    pub fn method_name(&self) -> String {
        match self {
            HandOff::Up(suffix) => format!("UP{suffix}"),
            HandOff::Down(suffix) => format!("DOWN{suffix}"),
        }
    }
}

/// Replace every context switch call with a forward/inverse hand-off pair.
///
/// For each switch node, latest first: the forward hand-off goes right
/// before the earliest instruction the call's argument depends on, the
/// inverse right before the call, and the call itself is removed. Both
/// hand-offs leave the operand stack untouched, so the argument value stays
/// where the call's result used to be.
///
/// Returns the number of switches rewritten.
pub fn fix_context_switches(group: &mut InsnGroup, base: &TypeName, types: &Types) -> Result<usize> {
    let mut switches = nodes_with_role(group, NodeRole::ContextSwitch)
        .into_iter()
        .map(|node| position(group, node).map(|pos| (pos, node)))
        .collect::<Result<Vec<(usize, NodeId)>>>()?;
    switches.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let desc = types.context_switch_desc();
    for &(_, node) in &switches {
        let call = group.node(node)?.insn();
        let name = match group.instructions().get(call) {
            Some(Insn::Invoke { name, .. }) => name.clone(),
            _ => {
                return Err(Error::UnexpectedInsn {
                    group: group.name().to_string(),
                    node,
                    expected: "method call",
                });
            }
        };
        let forward = HandOff::parse(&name)?;
        let inverse = forward.inverse();
        let first = group.node(first_of_subtree(group, node)?)?.insn();

        debug!(
            group = group.name(),
            %node,
            forward = %forward.method_name(),
            inverse = %inverse.method_name(),
            "bracketing context switch"
        );

        let instructions = group.instructions_mut()?;
        insert_hand_off(instructions, first, base, &forward, &desc)?;
        insert_hand_off(instructions, call, base, &inverse, &desc)?;
        instructions.remove(call)?;
    }

    Ok(switches.len())
}

/// `this.<handoff>(ctx)` stored back into the context slot, before `anchor`.
fn insert_hand_off(
    instructions: &mut InsnList,
    anchor: InsnId,
    base: &TypeName,
    hand_off: &HandOff,
    desc: &str,
) -> Result<()> {
    instructions.insert_before(anchor, Insn::Load(0))?;
    instructions.insert_before(anchor, Insn::Load(1))?;
    instructions.insert_before(
        anchor,
        Insn::invoke_virtual(base.clone(), &hand_off.method_name(), desc),
    )?;
    instructions.insert_before(anchor, Insn::Store(1))?;
    Ok(())
}
