//! Interval abstract interpretation over an `absint-core` function.
//!
//! This crate implements:
//! - An interval lattice over extended-integer bounds
//! - An abstract memory state lifted point-wise over variable bindings
//! - A per-block transfer function for the modeled instruction set
//! - A worklist-driven two-phase (widening, then narrowing) fixpoint solver
//!
//! The entry point is [`analyze`], which maps every basic block of a
//! function to a sound over-approximation of the values its locals can take.

mod error;
mod lattice;
mod solver;
mod state;
mod transfer;

pub use error::AnalysisError;
pub use lattice::{Bound, Interval};
pub use solver::{analyze, Analysis, StateTable, Worklist};
pub use state::AbstractState;
pub use transfer::{transfer_block, NoticeSink, UnsupportedInst};
