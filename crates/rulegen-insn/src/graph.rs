//! Dependency graph nodes over group instructions.

use std::fmt;

use crate::insn::InsnId;

/// Index of a node in its group's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// How the graph builder classified a node.
///
/// The classifications are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeRole {
    #[default]
    Plain,
    /// Call that must run in the caller's context (`UP*` / `DOWN*`).
    ContextSwitch,
    /// Call whose target must be told the current context first.
    ContextAwareCall,
    /// Load of a local captured from the enclosing method.
    CapturedLoad,
}

/// Kind of extraction a group root stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Action,
    VarInit,
}

/// One instruction plus the nodes producing the values it consumes.
#[derive(Debug, Clone)]
pub struct InsnGraphNode {
    insn: InsnId,
    predecessors: Vec<NodeId>,
    role: NodeRole,
    root: Option<RootKind>,
}

impl InsnGraphNode {
    pub fn new(insn: InsnId, role: NodeRole, predecessors: Vec<NodeId>) -> Self {
        Self {
            insn,
            predecessors,
            role,
            root: None,
        }
    }

    /// Handle of the wrapped instruction.
    pub fn insn(&self) -> InsnId {
        self.insn
    }

    /// Producers of the consumed values, in operand order.
    ///
    /// For calls the first predecessor produces the call target.
    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn root_kind(&self) -> Option<RootKind> {
        self.root
    }

    pub fn is_context_switch(&self) -> bool {
        self.role == NodeRole::ContextSwitch
    }

    pub fn is_context_aware_call(&self) -> bool {
        self.role == NodeRole::ContextAwareCall
    }

    pub fn is_captured_load(&self) -> bool {
        self.role == NodeRole::CapturedLoad
    }

    pub fn is_action_root(&self) -> bool {
        self.root == Some(RootKind::Action)
    }

    pub fn is_var_init_root(&self) -> bool {
        self.root == Some(RootKind::VarInit)
    }

    pub(crate) fn set_root(&mut self, kind: RootKind) {
        self.root = Some(kind);
    }
}
