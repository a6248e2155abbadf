//! Function construction: label interning, edge derivation, validation.

use crate::ir::{Block, BlockId, Function, Inst, Terminator};
use indexmap::IndexMap;
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised while assembling a function's control-flow graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CfgError {
    #[error("block label `{0}` defined more than once")]
    DuplicateLabel(String),
    #[error("label `{0}` is referenced but never defined")]
    UndefinedLabel(String),
    #[error("block `{0}` has no terminator")]
    MissingTerminator(String),
    #[error("block `{0}` already has a terminator")]
    AlreadyTerminated(String),
    #[error("instruction appears outside any block")]
    InstOutsideBlock,
    #[error("function has no basic blocks")]
    NoBlocks,
}

struct BlockSlot {
    label: String,
    defined: bool,
    insts: Vec<Inst>,
    terminator: Option<Terminator>,
}

/// Builds a [`Function`] incrementally.
///
/// Labels may be referenced before they are defined: [`block_id`] interns a
/// label and hands out its future id, and [`finish`] verifies that every
/// interned label was eventually started.
///
/// [`block_id`]: FunctionBuilder::block_id
/// [`finish`]: FunctionBuilder::finish
pub struct FunctionBuilder {
    name: String,
    params: Vec<String>,
    slots: Vec<BlockSlot>,
    by_label: IndexMap<String, BlockId>,
    current: Option<BlockId>,
    entry: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            slots: Vec::new(),
            by_label: IndexMap::new(),
            current: None,
            entry: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intern `label`, creating a forward-declared block if needed.
    pub fn block_id(&mut self, label: &str) -> BlockId {
        if let Some(&id) = self.by_label.get(label) {
            return id;
        }
        let id = BlockId(self.slots.len());
        self.slots.push(BlockSlot {
            label: label.to_string(),
            defined: false,
            insts: Vec::new(),
            terminator: None,
        });
        self.by_label.insert(label.to_string(), id);
        id
    }

    /// Begin the body of `label`. The first block started becomes the entry.
    pub fn start_block(&mut self, label: &str) -> Result<BlockId, CfgError> {
        let id = self.block_id(label);
        let slot = &mut self.slots[id.0];
        if slot.defined {
            return Err(CfgError::DuplicateLabel(label.to_string()));
        }
        slot.defined = true;
        self.current = Some(id);
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        Ok(id)
    }

    /// Append an instruction to the block currently being built.
    pub fn push(&mut self, inst: Inst) -> Result<(), CfgError> {
        let id = self.current.ok_or(CfgError::InstOutsideBlock)?;
        self.slots[id.0].insts.push(inst);
        Ok(())
    }

    /// Close the current block with `term`.
    pub fn terminate(&mut self, term: Terminator) -> Result<(), CfgError> {
        let id = self.current.take().ok_or(CfgError::InstOutsideBlock)?;
        let slot = &mut self.slots[id.0];
        if slot.terminator.is_some() {
            return Err(CfgError::AlreadyTerminated(slot.label.clone()));
        }
        slot.terminator = Some(term);
        Ok(())
    }

    /// Validate the function and derive predecessor/successor edges.
    pub fn finish(self) -> Result<Function, CfgError> {
        let entry = self.entry.ok_or(CfgError::NoBlocks)?;

        let mut blocks = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            if !slot.defined {
                return Err(CfgError::UndefinedLabel(slot.label));
            }
            let terminator = slot
                .terminator
                .ok_or_else(|| CfgError::MissingTerminator(slot.label.clone()))?;
            blocks.push(Block {
                label: slot.label,
                insts: slot.insts,
                terminator,
                predecessors: SmallVec::new(),
                successors: SmallVec::new(),
            });
        }

        for from in 0..blocks.len() {
            for to in blocks[from].terminator.targets() {
                add_edge(&mut blocks, BlockId(from), to);
            }
        }

        Ok(Function {
            name: self.name,
            params: self.params,
            blocks,
            entry,
        })
    }
}

fn add_edge(blocks: &mut [Block], from: BlockId, to: BlockId) {
    if !blocks[from.0].successors.contains(&to) {
        blocks[from.0].successors.push(to);
    }
    if !blocks[to.0].predecessors.contains(&from) {
        blocks[to.0].predecessors.push(from);
    }
}
