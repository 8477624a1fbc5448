//! Control Flow Graph over the flattened IR

use crate::shared::models::{IrInstruction, Opcode};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfgEdgeKind {
    /// Block runs off its end into the next LABEL
    Fallthrough,
    /// BRANCH
    Unconditional,
    /// BRANCH_IF taken
    True,
    /// BRANCH_IF not taken
    False,
    /// CALL_FUNCTION to a function defined in the same unit (informational)
    Call,
}

impl CfgEdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CfgEdgeKind::Fallthrough => "fallthrough",
            CfgEdgeKind::Unconditional => "unconditional",
            CfgEdgeKind::True => "true",
            CfgEdgeKind::False => "false",
            CfgEdgeKind::Call => "call",
        }
    }

    /// Call edges never carry control
    pub fn is_control(&self) -> bool {
        !matches!(self, CfgEdgeKind::Call)
    }
}

impl fmt::Display for CfgEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub target: String,
    pub kind: CfgEdgeKind,
}

impl CfgEdge {
    pub fn new(target: impl Into<String>, kind: CfgEdgeKind) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: String,
    /// Instructions after the block's LABEL, up to the next LABEL
    pub instructions: Vec<IrInstruction>,
    pub edges: Vec<CfgEdge>,
    /// Stream index of `instructions[0]`
    pub first_index: usize,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>, first_index: usize) -> Self {
        Self {
            label: label.into(),
            instructions: Vec::new(),
            edges: Vec::new(),
            first_index,
        }
    }

    pub fn last(&self) -> Option<&IrInstruction> {
        self.instructions.last()
    }

    pub fn ends_with(&self, opcode: Opcode) -> bool {
        self.last().is_some_and(|i| i.opcode == opcode)
    }

    /// RETURN or THROW as the final instruction
    pub fn is_exit(&self) -> bool {
        self.ends_with(Opcode::Return) || self.ends_with(Opcode::Throw)
    }

    /// Successor labels along control edges
    pub fn successors(&self) -> impl Iterator<Item = &str> + '_ {
        self.edges
            .iter()
            .filter(|e| e.kind.is_control())
            .map(|e| e.target.as_str())
    }

    /// Stream indices covered by this block's instructions
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.instructions.len()
    }
}

/// Blocks in stream order, addressable by label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cfg {
    pub entry: String,
    blocks: Vec<BasicBlock>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl Cfg {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            blocks: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Append a block; a label already present is left untouched and `false` returned
    pub fn push(&mut self, block: BasicBlock) -> bool {
        if self.index.contains_key(&block.label) {
            return false;
        }
        self.index.insert(block.label.clone(), self.blocks.len());
        self.blocks.push(block);
        true
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.index.get(label).map(|&i| &self.blocks[i])
    }

    pub(crate) fn block_mut(&mut self, label: &str) -> Option<&mut BasicBlock> {
        let i = *self.index.get(label)?;
        self.blocks.get_mut(i)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.blocks.iter().map(|b| b.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.blocks.iter().map(|b| b.edges.len()).sum()
    }

    /// Control-flow predecessors of `label`
    pub fn predecessors(&self, label: &str) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| b.successors().any(|s| s == label))
            .map(|b| b.label.as_str())
            .collect()
    }

    /// Keep only the blocks `keep` accepts, dropping edges into removed blocks
    pub fn retain(&mut self, mut keep: impl FnMut(&BasicBlock) -> bool) {
        self.blocks.retain(|b| keep(b));
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.label.clone(), i))
            .collect();
        let index = &self.index;
        for block in &mut self.blocks {
            block.edges.retain(|e| index.contains_key(&e.target));
        }
    }

    /// Rebuild the label index after deserialisation
    pub fn reindex(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.label.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(label: &str, edges: &[(&str, CfgEdgeKind)]) -> BasicBlock {
        let mut b = BasicBlock::new(label, 0);
        b.edges = edges.iter().map(|(t, k)| CfgEdge::new(*t, *k)).collect();
        b
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let mut cfg = Cfg::new("entry");
        assert!(cfg.push(block("entry", &[])));
        assert!(!cfg.push(block("entry", &[])));
        assert_eq!(cfg.len(), 1);
    }

    #[test]
    fn test_predecessors_ignore_call_edges() {
        let mut cfg = Cfg::new("a");
        cfg.push(block("a", &[("b", CfgEdgeKind::Unconditional), ("f", CfgEdgeKind::Call)]));
        cfg.push(block("b", &[]));
        cfg.push(block("f", &[]));
        assert_eq!(cfg.predecessors("b"), vec!["a"]);
        assert!(cfg.predecessors("f").is_empty());
    }

    #[test]
    fn test_retain_drops_dangling_edges() {
        let mut cfg = Cfg::new("a");
        cfg.push(block("a", &[("b", CfgEdgeKind::True), ("c", CfgEdgeKind::False)]));
        cfg.push(block("b", &[]));
        cfg.push(block("c", &[]));
        cfg.retain(|b| b.label != "c");
        assert_eq!(cfg.labels().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(cfg.block("a").map(|b| b.edges.len()), Some(1));
        assert_eq!(cfg.position("b"), Some(1));
    }
}
