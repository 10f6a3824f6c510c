//! Ordered instruction list with stable handles.

use crate::error::{Error, Result};
use crate::insn::{Insn, InsnId};

#[derive(Debug, Clone)]
struct Entry {
    id: InsnId,
    insn: Insn,
}

/// An ordered, editable instruction sequence.
///
/// Each instruction gets an [`InsnId`] when it enters the list. Handles stay
/// valid across edits elsewhere in the list, so graph nodes can keep
/// referring to their instruction while rewrite passes splice code around it.
/// Positions are derived on demand with [`InsnList::index_of`].
#[derive(Debug, Clone, Default)]
pub struct InsnList {
    entries: Vec<Entry>,
    next_id: u32,
}

impl InsnList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an instruction and return its handle.
    pub fn push(&mut self, insn: Insn) -> InsnId {
        let id = self.allocate();
        self.entries.push(Entry { id, insn });
        id
    }

    /// Current position of an instruction.
    pub fn index_of(&self, id: InsnId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn get(&self, id: InsnId) -> Option<&Insn> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.insn)
    }

    /// Instruction at a position.
    pub fn at(&self, index: usize) -> Option<&Insn> {
        self.entries.get(index).map(|entry| &entry.insn)
    }

    /// Insert `insn` immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: InsnId, insn: Insn) -> Result<InsnId> {
        let index = self.position(anchor)?;
        Ok(self.insert_at(index, insn))
    }

    /// Insert `insn` immediately after `anchor`.
    pub fn insert_after(&mut self, anchor: InsnId, insn: Insn) -> Result<InsnId> {
        let index = self.position(anchor)?;
        Ok(self.insert_at(index + 1, insn))
    }

    /// Replace the instruction behind `id`, keeping the handle.
    ///
    /// Returns the previous instruction.
    pub fn replace(&mut self, id: InsnId, insn: Insn) -> Result<Insn> {
        let index = self.position(id)?;
        Ok(std::mem::replace(&mut self.entries[index].insn, insn))
    }

    /// Remove an instruction. Its handle becomes invalid.
    pub fn remove(&mut self, id: InsnId) -> Result<Insn> {
        let index = self.position(id)?;
        Ok(self.entries.remove(index).insn)
    }

    /// Iterate over handles and instructions in program order.
    pub fn iter(&self) -> impl Iterator<Item = (InsnId, &Insn)> {
        self.entries.iter().map(|entry| (entry.id, &entry.insn))
    }

    /// Iterate over instructions in program order.
    pub fn insns(&self) -> impl Iterator<Item = &Insn> {
        self.entries.iter().map(|entry| &entry.insn)
    }

    /// Copy the instructions out, dropping handles.
    pub fn to_vec(&self) -> Vec<Insn> {
        self.insns().cloned().collect()
    }

    fn position(&self, id: InsnId) -> Result<usize> {
        self.index_of(id).ok_or(Error::UnknownInsn(id))
    }

    fn insert_at(&mut self, index: usize, insn: Insn) -> InsnId {
        let id = self.allocate();
        self.entries.insert(index, Entry { id, insn });
        id
    }

    fn allocate(&mut self) -> InsnId {
        let id = InsnId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl FromIterator<Insn> for InsnList {
    fn from_iter<I: IntoIterator<Item = Insn>>(iter: I) -> Self {
        let mut list = InsnList::new();
        for insn in iter {
            list.push(insn);
        }
        list
    }
}
