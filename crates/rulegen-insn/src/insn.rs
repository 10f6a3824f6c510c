//! Instruction set of rule method bodies.
//!
//! Instructions operate on an implicit operand stack plus numbered local
//! slots. Slot 0 holds the receiver of an instance method. Every instruction
//! has a statically known [`StackEffect`], which is what the unit generator
//! uses to size operand stacks without tracking depths by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::{MethodDesc, TypeName, malformed, value_size};
use crate::error::Result;

/// Stable handle of an instruction inside an [`crate::InsnList`].
///
/// Handles survive insertions and removals around them, unlike positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsnId(pub(crate) u32);

impl InsnId {
    /// Raw handle value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Jump target marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub u32);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Literal pushed by [`Insn::Const`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Int(i32),
    Long(i64),
    Str(String),
}

/// Two-operand integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

/// Branch condition of [`Insn::JumpIf`], tested against the popped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Zero,
    NonZero,
    Null,
    NonNull,
}

/// Method dispatch flavor of [`Insn::Invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeKind {
    /// Dynamic dispatch on a class receiver.
    Virtual,
    /// Dynamic dispatch on an interface receiver.
    Interface,
    /// Non-virtual call (constructors, super calls).
    Special,
    /// No receiver.
    Static,
}

/// Value returned by [`Insn::Return`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    Void,
    Int,
    Reference,
}

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insn {
    /// Push a literal.
    Const(Constant),
    /// Push the value of a local slot.
    Load(u16),
    /// Pop the top value into a local slot.
    Store(u16),
    /// Duplicate the top value.
    Dup,
    /// Discard the top value.
    Pop,
    /// Exchange the two top values.
    Swap,
    /// Pop two integers, push the result.
    Binary(BinaryOp),
    /// Pop an object, push one of its fields.
    GetField {
        owner: TypeName,
        name: String,
        desc: String,
    },
    /// Pop an object and a value, store the value into the object's field.
    PutField {
        owner: TypeName,
        name: String,
        desc: String,
    },
    /// Call a method. Pops the arguments (and the receiver unless static),
    /// pushes the return value if any.
    Invoke {
        kind: InvokeKind,
        owner: TypeName,
        name: String,
        desc: String,
    },
    /// Jump target, no runtime effect.
    Label(LabelId),
    /// Unconditional jump.
    Jump(LabelId),
    /// Pop a value and jump when `cond` holds.
    JumpIf { cond: Condition, target: LabelId },
    /// Leave the method.
    Return(ReturnKind),
}

/// Operand stack effect of one instruction, in stack slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEffect {
    pub pops: u16,
    pub pushes: u16,
}

impl StackEffect {
    const fn new(pops: u16, pushes: u16) -> Self {
        Self { pops, pushes }
    }
}

impl Insn {
    /// `Invoke` with [`InvokeKind::Virtual`].
    pub fn invoke_virtual(owner: impl Into<TypeName>, name: &str, desc: &str) -> Self {
        Self::invoke(InvokeKind::Virtual, owner, name, desc)
    }

    /// `Invoke` with [`InvokeKind::Interface`].
    pub fn invoke_interface(owner: impl Into<TypeName>, name: &str, desc: &str) -> Self {
        Self::invoke(InvokeKind::Interface, owner, name, desc)
    }

    /// `Invoke` with [`InvokeKind::Static`].
    pub fn invoke_static(owner: impl Into<TypeName>, name: &str, desc: &str) -> Self {
        Self::invoke(InvokeKind::Static, owner, name, desc)
    }

    pub fn invoke(kind: InvokeKind, owner: impl Into<TypeName>, name: &str, desc: &str) -> Self {
        Self::Invoke {
            kind,
            owner: owner.into(),
            name: name.to_string(),
            desc: desc.to_string(),
        }
    }

    /// Name of the called method, for `Invoke` instructions.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Insn::Invoke { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Compute how many stack slots the instruction pops and pushes.
    ///
    /// # Errors
    ///
    /// Fails when a field or method descriptor is malformed.
    pub fn stack_effect(&self) -> Result<StackEffect> {
        let effect = match self {
            Insn::Const(Constant::Long(_)) => StackEffect::new(0, 2),
            Insn::Const(_) => StackEffect::new(0, 1),
            Insn::Load(_) => StackEffect::new(0, 1),
            Insn::Store(_) => StackEffect::new(1, 0),
            Insn::Dup => StackEffect::new(1, 2),
            Insn::Pop => StackEffect::new(1, 0),
            Insn::Swap => StackEffect::new(2, 2),
            Insn::Binary(_) => StackEffect::new(2, 1),
            Insn::GetField { desc, .. } => StackEffect::new(1, value_size(desc)?),
            Insn::PutField { desc, .. } => StackEffect::new(1 + value_size(desc)?, 0),
            Insn::Invoke { kind, desc, .. } => {
                let method = MethodDesc::parse(desc)?;
                let receiver = u16::from(*kind != InvokeKind::Static);
                let pops = method
                    .param_slots()
                    .checked_add(receiver)
                    .ok_or_else(|| malformed(desc, "arguments and receiver exceed the slot range"))?;
                StackEffect::new(pops, method.ret)
            }
            Insn::Label(_) | Insn::Jump(_) => StackEffect::new(0, 0),
            Insn::JumpIf { .. } => StackEffect::new(1, 0),
            Insn::Return(ReturnKind::Void) => StackEffect::new(0, 0),
            Insn::Return(_) => StackEffect::new(1, 0),
        };
        Ok(effect)
    }

    /// Local slot read or written by this instruction.
    pub fn local_slot(&self) -> Option<u16> {
        match self {
            Insn::Load(slot) | Insn::Store(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Whether control never falls through to the next instruction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Insn::Jump(_) | Insn::Return(_))
    }

    /// Label this instruction may transfer control to.
    pub fn jump_target(&self) -> Option<LabelId> {
        match self {
            Insn::Jump(target) | Insn::JumpIf { target, .. } => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Const(c) => write!(f, "const {c:?}"),
            Insn::Load(slot) => write!(f, "load {slot}"),
            Insn::Store(slot) => write!(f, "store {slot}"),
            Insn::Dup => f.write_str("dup"),
            Insn::Pop => f.write_str("pop"),
            Insn::Swap => f.write_str("swap"),
            Insn::Binary(op) => write!(f, "{op:?}"),
            Insn::GetField { owner, name, desc } => write!(f, "getfield {owner}.{name}:{desc}"),
            Insn::PutField { owner, name, desc } => write!(f, "putfield {owner}.{name}:{desc}"),
            Insn::Invoke {
                kind,
                owner,
                name,
                desc,
            } => write!(f, "invoke{kind:?} {owner}.{name}{desc}"),
            Insn::Label(label) => write!(f, "{label}:"),
            Insn::Jump(label) => write!(f, "goto {label}"),
            Insn::JumpIf { cond, target } => write!(f, "if{cond:?} {target}"),
            Insn::Return(kind) => write!(f, "return {kind:?}"),
        }
    }
}
