use rulegen_insn::{Insn, InsnGroup, NodeRole};
use tracing::debug;

use super::nodes_with_role;
use crate::error::{Error, Result};

/// Rewrite every captured load into a field read on the unit.
///
/// `load n` becomes `load 0; getfield <unit>.<field>`, where the field is
/// the captured variable declared for slot `n`. The group must already
/// carry its unit type.
pub fn convert_captured_loads(group: &mut InsnGroup) -> Result<usize> {
    let owner = group
        .unit_type()
        .cloned()
        .ok_or_else(|| Error::UnnamedGroup(group.name().to_string()))?;

    let loads = nodes_with_role(group, NodeRole::CapturedLoad);
    for &node in &loads {
        let insn = group.node(node)?.insn();
        let slot = match group.instructions().get(insn) {
            Some(Insn::Load(slot)) => *slot,
            _ => {
                return Err(Error::UnexpectedInsn {
                    group: group.name().to_string(),
                    node,
                    expected: "local load",
                });
            }
        };
        let capture = group
            .capture_for_slot(slot)
            .cloned()
            .ok_or_else(|| Error::UnknownCapture {
                group: group.name().to_string(),
                slot,
            })?;

        debug!(%node, slot, field = %capture.name, "captured load converted");

        let instructions = group.instructions_mut()?;
        instructions.insert_after(
            insn,
            Insn::GetField {
                owner: owner.clone(),
                name: capture.name,
                desc: capture.desc,
            },
        )?;
        instructions.replace(insn, Insn::Load(0))?;
    }

    Ok(loads.len())
}
