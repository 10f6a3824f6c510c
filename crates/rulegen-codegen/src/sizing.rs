//! Operand stack and local slot sizing for generated methods.
//!
//! Sizing walks the method body as a flow graph: straight-line code falls
//! through, jumps follow their labels, returns end a path. Each reachable
//! instruction gets exactly one entry depth. The largest depth seen on any
//! path is the method's stack size, the highest slot touched (or the
//! parameter area, whichever is larger) its locals size.

use std::collections::HashMap;

use rulegen_insn::{Insn, LabelId};
use thiserror::Error;

/// Computed frame dimensions of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub max_stack: u16,
    pub max_locals: u16,
}

/// Internal inconsistencies detected while sizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    /// An instruction pops more values than the stack holds.
    #[error("stack underflow at {index}: depth {depth}, needs {pops}")]
    Underflow { index: usize, depth: u16, pops: u16 },

    /// Two paths reach the same instruction with different depths.
    #[error("inconsistent stack depth at {index}: {expected} vs {found}")]
    InconsistentDepth {
        index: usize,
        expected: u16,
        found: u16,
    },

    /// A jump names a label that is not in the body.
    #[error("jump to unknown label {0}")]
    UnknownLabel(LabelId),

    /// A label is declared twice.
    #[error("label {0} declared twice")]
    DuplicateLabel(LabelId),

    /// A local slot or the parameter area lies past the addressable range.
    #[error("locals exceed the slot range at {index}")]
    TooManyLocals { index: usize },

    /// The operand stack grows past the addressable range.
    #[error("operand stack overflow at {index}")]
    StackOverflow { index: usize },

    /// Control reaches the end of the body without a return.
    #[error("control falls off the end of the method")]
    FallsOffEnd,

    /// An instruction's stack effect cannot be computed.
    #[error("instruction {index}: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: rulegen_insn::Error,
    },
}

/// Size the frame of `code`, whose parameters (receiver included) take
/// `param_slots` local slots.
pub fn compute_frame(code: &[Insn], param_slots: u16) -> Result<Frame, SizingError> {
    let labels = label_positions(code)?;
    let mut entry: Vec<Option<u16>> = vec![None; code.len()];
    let mut pending = Vec::new();
    let mut max_stack = 0u16;

    let mut max_locals = param_slots;
    for (index, insn) in code.iter().enumerate() {
        if let Some(slot) = insn.local_slot() {
            let needed = slot
                .checked_add(1)
                .ok_or(SizingError::TooManyLocals { index })?;
            max_locals = max_locals.max(needed);
        }
    }

    if code.is_empty() {
        return Err(SizingError::FallsOffEnd);
    }
    entry[0] = Some(0);
    pending.push(0usize);

    while let Some(index) = pending.pop() {
        let insn = &code[index];
        let depth = entry[index].unwrap_or_default();
        let effect = insn
            .stack_effect()
            .map_err(|source| SizingError::Malformed { index, source })?;
        if effect.pops > depth {
            return Err(SizingError::Underflow {
                index,
                depth,
                pops: effect.pops,
            });
        }
        let after = (depth - effect.pops)
            .checked_add(effect.pushes)
            .ok_or(SizingError::StackOverflow { index })?;
        max_stack = max_stack.max(after);

        let mut successors = Vec::with_capacity(2);
        if let Some(label) = insn.jump_target() {
            let target = labels
                .get(&label)
                .copied()
                .ok_or(SizingError::UnknownLabel(label))?;
            successors.push(target);
        }
        if !insn.is_terminal() {
            if index + 1 == code.len() {
                return Err(SizingError::FallsOffEnd);
            }
            successors.push(index + 1);
        }

        for next in successors {
            match entry[next] {
                None => {
                    entry[next] = Some(after);
                    pending.push(next);
                }
                Some(expected) if expected != after => {
                    return Err(SizingError::InconsistentDepth {
                        index: next,
                        expected,
                        found: after,
                    });
                }
                Some(_) => {}
            }
        }
    }

    Ok(Frame {
        max_stack,
        max_locals,
    })
}

fn label_positions(code: &[Insn]) -> Result<HashMap<LabelId, usize>, SizingError> {
    let mut labels = HashMap::new();
    for (index, insn) in code.iter().enumerate() {
        if let Insn::Label(label) = insn {
            if labels.insert(*label, index).is_some() {
                return Err(SizingError::DuplicateLabel(*label));
            }
        }
    }
    Ok(labels)
}
