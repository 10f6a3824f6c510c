use std::collections::HashSet;

use rulegen_insn::{InsnGroup, NodeId};

use super::position;
use crate::error::Result;

/// Find the node whose instruction comes first, in program order, among
/// `node` and everything it transitively depends on.
///
/// Walks the predecessors with an explicit stack, visiting shared
/// predecessors once, so diamonds still yield the global earliest
/// instruction and deep dependency chains need no recursion.
pub fn first_of_subtree(group: &InsnGroup, node: NodeId) -> Result<NodeId> {
    let mut covered = HashSet::from([node]);
    let mut pending = vec![node];
    let mut first = (position(group, node)?, node);

    while let Some(current) = pending.pop() {
        let pos = position(group, current)?;
        if pos < first.0 {
            first = (pos, current);
        }
        for &predecessor in group.node(current)?.predecessors() {
            if covered.insert(predecessor) {
                pending.push(predecessor);
            }
        }
    }

    Ok(first.1)
}
