//! Extractable instruction groups and their owners.
//!
//! A group is the unit of extraction: an ordered instruction fragment, the
//! dependency nodes over it, the locals it captures from the enclosing
//! method, and output slots the generator fills in (unit type and unit
//! code).
//!
//! # Lifecycle
//!
//! Groups start [`GroupStage::Open`]: rewrite passes may edit the
//! instruction list through [`InsnGroup::instructions_mut`]. The first
//! synthesis freezes the group, after which the instructions are read-only
//! and repeated synthesis sees exactly the same body.

use std::collections::HashSet;

use crate::descriptor::TypeName;
use crate::error::{Error, Result};
use crate::graph::{InsnGraphNode, NodeId, NodeRole, RootKind};
use crate::insn::Insn;
use crate::list::InsnList;

/// A local of the enclosing method that the group still reads.
///
/// Becomes one field of the synthesized unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedVar {
    /// Local slot the value lived in.
    pub slot: u16,
    /// Field name on the unit.
    pub name: String,
    /// Field type descriptor.
    pub desc: String,
}

impl CapturedVar {
    pub fn new(slot: u16, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Whether a group's instructions may still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStage {
    Open,
    Frozen,
}

/// An extractable fragment of a rule method.
#[derive(Debug, Clone)]
pub struct InsnGroup {
    name: String,
    root: NodeId,
    nodes: Vec<InsnGraphNode>,
    instructions: InsnList,
    captures: Vec<CapturedVar>,
    stage: GroupStage,
    unit_type: Option<TypeName>,
    unit_code: Option<Vec<u8>>,
}

impl InsnGroup {
    /// Start building a group with the given short name.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    /// Short name, unique within the owner's namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &InsnGraphNode {
        &self.nodes[self.root.index()]
    }

    /// All nodes, in the order the graph builder produced them.
    pub fn nodes(&self) -> &[InsnGraphNode] {
        &self.nodes
    }

    /// Ids of all nodes, in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Result<&InsnGraphNode> {
        self.nodes.get(id.index()).ok_or_else(|| Error::UnknownNode {
            node: id,
            group: self.name.clone(),
        })
    }

    pub fn instructions(&self) -> &InsnList {
        &self.instructions
    }

    /// Mutable access for rewrite passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupFrozen`] once the group has been synthesized.
    pub fn instructions_mut(&mut self) -> Result<&mut InsnList> {
        match self.stage {
            GroupStage::Open => Ok(&mut self.instructions),
            GroupStage::Frozen => Err(Error::GroupFrozen(self.name.clone())),
        }
    }

    /// Captured variables, ordered by slot.
    pub fn captures(&self) -> &[CapturedVar] {
        &self.captures
    }

    pub fn capture_for_slot(&self, slot: u16) -> Option<&CapturedVar> {
        self.captures.iter().find(|capture| capture.slot == slot)
    }

    pub fn stage(&self) -> GroupStage {
        self.stage
    }

    pub fn is_frozen(&self) -> bool {
        self.stage == GroupStage::Frozen
    }

    pub fn freeze(&mut self) {
        self.stage = GroupStage::Frozen;
    }

    /// Fully qualified name of the synthesized unit, once assigned.
    pub fn unit_type(&self) -> Option<&TypeName> {
        self.unit_type.as_ref()
    }

    pub fn set_unit_type(&mut self, name: TypeName) {
        self.unit_type = Some(name);
    }

    /// Binary form of the synthesized unit, once generated.
    pub fn unit_code(&self) -> Option<&[u8]> {
        self.unit_code.as_deref()
    }

    pub fn set_unit_code(&mut self, code: Vec<u8>) {
        self.unit_code = Some(code);
    }
}

/// Incremental constructor for [`InsnGroup`].
///
/// Every pushed instruction gets a graph node, and nodes are numbered in push
/// order, which is also program order.
#[derive(Debug)]
pub struct GroupBuilder {
    name: String,
    nodes: Vec<InsnGraphNode>,
    instructions: InsnList,
    captures: Vec<CapturedVar>,
    root: Option<NodeId>,
}

impl GroupBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            instructions: InsnList::new(),
            captures: Vec::new(),
            root: None,
        }
    }

    /// Push a plain instruction without predecessors.
    pub fn push(&mut self, insn: Insn) -> NodeId {
        self.push_node(insn, NodeRole::Plain, &[])
    }

    /// Push an instruction with its classification and producers.
    pub fn push_node(&mut self, insn: Insn, role: NodeRole, predecessors: &[NodeId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let handle = self.instructions.push(insn);
        self.nodes
            .push(InsnGraphNode::new(handle, role, predecessors.to_vec()));
        id
    }

    /// Register a captured local.
    pub fn capture(&mut self, capture: CapturedVar) -> &mut Self {
        self.captures.push(capture);
        self
    }

    /// Make `node` the group root and tag it with its extraction kind.
    ///
    /// Without a call to this the last pushed node is the (untagged) root.
    pub fn mark_root(&mut self, node: NodeId, kind: RootKind) -> &mut Self {
        self.root = Some(node);
        if let Some(target) = self.nodes.get_mut(node.index()) {
            target.set_root(kind);
        }
        self
    }

    /// Validate and assemble the group.
    pub fn build(self) -> Result<InsnGroup> {
        let Some(last) = self.nodes.len().checked_sub(1) else {
            return Err(Error::EmptyGroup(self.name));
        };
        let root = self.root.unwrap_or(NodeId(last as u32));
        let unknown = |node: NodeId| Error::UnknownNode {
            node,
            group: self.name.clone(),
        };

        if root.index() > last {
            return Err(unknown(root));
        }
        for node in &self.nodes {
            if let Some(&bad) = node.predecessors().iter().find(|p| p.index() > last) {
                return Err(unknown(bad));
            }
        }

        let mut seen = HashSet::new();
        for capture in &self.captures {
            if !seen.insert(capture.slot) {
                return Err(Error::DuplicateCapture {
                    slot: capture.slot,
                    group: self.name.clone(),
                });
            }
        }
        let mut captures = self.captures;
        captures.sort_by_key(|capture| capture.slot);

        Ok(InsnGroup {
            name: self.name,
            root,
            nodes: self.nodes,
            instructions: self.instructions,
            captures,
            stage: GroupStage::Open,
            unit_type: None,
            unit_code: None,
        })
    }
}

/// A rule method and the groups extracted from it.
#[derive(Debug, Clone)]
pub struct RuleMethod {
    name: String,
    groups: Vec<InsnGroup>,
}

impl RuleMethod {
    pub fn new(name: impl Into<String>, groups: Vec<InsnGroup>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[InsnGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [InsnGroup] {
        &mut self.groups
    }
}

/// The type whose rule methods are being prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerType {
    name: TypeName,
    source_file: Option<String>,
}

impl OwnerType {
    pub fn new(name: impl Into<TypeName>, source_file: Option<&str>) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.map(str::to_string),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Source file the owner was compiled from, for debug metadata.
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}
