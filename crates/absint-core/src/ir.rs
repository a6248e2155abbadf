//! Intermediate representation: modules, functions, blocks, instructions.
//!
//! A [`Function`] owns its basic blocks in a stable arena indexed by
//! [`BlockId`], so analysis results keyed on `BlockId` stay valid for
//! comparison and hashing independently of how the function is stored.

use smallvec::SmallVec;
use std::fmt;

/// Unique identifier for a basic block within one function.
///
/// An index into the owning function's block arena. Ids are only ever
/// minted by [`crate::cfg::FunctionBuilder`] and are not meaningful across
/// functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// An instruction operand: a literal constant or a reference to a local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Const(i64),
    Var(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(c) => write!(f, "{c}"),
            Operand::Var(v) => write!(f, "%{v}"),
        }
    }
}

/// Integer comparison predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl Predicate {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A non-terminator instruction.
///
/// The enum is closed on purpose: every consumer matches exhaustively, so
/// adding a variant forces every transfer function to say what it does with
/// it. Opcodes the front end does not model land in [`Inst::Unknown`]
/// rather than failing the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Add {
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    Sub {
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    Mul {
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    ICmp {
        dest: String,
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// Value selected by the incoming control-flow edge.
    Phi {
        dest: String,
        incomings: Vec<(Operand, BlockId)>,
    },
    /// Parsed but unmodeled opcode; carried through so analyses can report it.
    Unknown {
        dest: Option<String>,
        mnemonic: String,
    },
}

impl Inst {
    /// The local this instruction binds, if any.
    pub fn dest(&self) -> Option<&str> {
        match self {
            Inst::Add { dest, .. }
            | Inst::Sub { dest, .. }
            | Inst::Mul { dest, .. }
            | Inst::ICmp { dest, .. }
            | Inst::Phi { dest, .. } => Some(dest),
            Inst::Unknown { dest, .. } => dest.as_deref(),
        }
    }
}

/// How a basic block transfers control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump.
    Br(BlockId),
    /// Two-way conditional branch.
    CondBr {
        cond: Operand,
        then_dest: BlockId,
        else_dest: BlockId,
    },
    /// Return from the function.
    Ret(Option<Operand>),
}

impl Terminator {
    /// Branch targets, in source order.
    pub fn targets(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Br(t) => SmallVec::from_slice(&[*t]),
            Terminator::CondBr {
                then_dest,
                else_dest,
                ..
            } => SmallVec::from_slice(&[*then_dest, *else_dest]),
            Terminator::Ret(_) => SmallVec::new(),
        }
    }
}

/// A basic block: a label, an ordered instruction sequence, a terminator,
/// and the edge lists derived from the terminators at build time.
#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub insts: Vec<Inst>,
    pub terminator: Terminator,
    pub(crate) predecessors: SmallVec<[BlockId; 2]>,
    pub(crate) successors: SmallVec<[BlockId; 2]>,
}

/// A function: formal parameters plus a block arena.
///
/// Implements the control-flow-graph contract the analyzer consumes: block
/// enumeration, entry test, predecessor/successor lookup, and parameter
/// enumeration. The structure is read-only once built.
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) entry: BlockId,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formal parameters as variable identifiers, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn is_entry(&self, id: BlockId) -> bool {
        id == self.entry
    }

    /// All block ids, in arena order.
    pub fn block_ids(&self) -> impl DoubleEndedIterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// The block behind `id`.
    ///
    /// `id` must have been minted for this function; a foreign id is a
    /// caller programming error.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn block_by_label(&self, label: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.label == label)
            .map(BlockId)
    }

    /// Direct predecessors of `id`. Unordered, duplicate-free.
    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.0].predecessors
    }

    /// Direct successors of `id`. Unordered, duplicate-free.
    pub fn successors(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.0].successors
    }
}

/// A parsed compilation unit: a list of functions.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}
