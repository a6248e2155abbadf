//! # Absint Core
//!
//! The intermediate representation consumed by the absint analyzer:
//! functions, basic blocks, instructions, and the control-flow structure
//! derived from block terminators, plus a line-oriented textual front end.
//!
//! ## Modules
//!
//! - **[`ir`]** - Module/function/block/instruction data model
//! - **[`cfg`]** - Function builder: label resolution and edge derivation
//! - **[`parser`]** - Parser for the `.abir` text format

pub mod cfg;
pub mod ir;
pub mod parser;

pub use cfg::{CfgError, FunctionBuilder};
pub use ir::{Block, BlockId, Function, Inst, Module, Operand, Predicate, Terminator};
pub use parser::{parse_module, ParseError};
