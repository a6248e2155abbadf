//! Per-block transfer function over the interval domain.

use crate::lattice::Interval;
use crate::state::AbstractState;
use absint_core::{Block, BlockId, Inst, Operand, Predicate};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// An instruction the interval domain has no precise model for.
///
/// Its destination (when it has one) is bound to top, so the result is
/// sound but imprecise. The sink records one notice per distinct site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsupportedInst {
    pub block: BlockId,
    pub mnemonic: String,
}

impl fmt::Display for UnsupportedInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported instruction `{}` in {}", self.mnemonic, self.block)
    }
}

/// Collects unsupported-instruction notices across solver iterations.
///
/// The solver revisits blocks, so the same site would otherwise be
/// reported once per visit.
#[derive(Debug, Default)]
pub struct NoticeSink {
    seen: HashSet<UnsupportedInst>,
    notices: Vec<UnsupportedInst>,
}

impl NoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, block: BlockId, mnemonic: &str) {
        let notice = UnsupportedInst {
            block,
            mnemonic: mnemonic.to_owned(),
        };
        if self.seen.insert(notice.clone()) {
            warn!(%block, mnemonic, "treating unsupported instruction as top");
            self.notices.push(notice);
        }
    }

    pub fn notices(&self) -> &[UnsupportedInst] {
        &self.notices
    }

    pub fn into_notices(self) -> Vec<UnsupportedInst> {
        self.notices
    }
}

fn eval(state: &AbstractState, op: &Operand) -> Interval {
    match op {
        Operand::Const(v) => Interval::singleton(*v),
        Operand::Var(name) => state.get(name),
    }
}

/// Runs `block`'s instructions over `input`, producing the state at the
/// block's exit. Phi incomings are joined without path sensitivity.
pub fn transfer_block(
    id: BlockId,
    block: &Block,
    input: &AbstractState,
    sink: &mut NoticeSink,
) -> AbstractState {
    let mut state = input.clone();
    for inst in &block.insts {
        match inst {
            Inst::Add { dest, lhs, rhs } => {
                let v = eval(&state, lhs).add(eval(&state, rhs));
                state.set(dest.clone(), v);
            }
            Inst::Sub { dest, lhs, rhs } => {
                let v = eval(&state, lhs).sub(eval(&state, rhs));
                state.set(dest.clone(), v);
            }
            Inst::Mul { dest, lhs, rhs } => {
                let v = eval(&state, lhs).mul(eval(&state, rhs));
                state.set(dest.clone(), v);
            }
            Inst::ICmp {
                dest,
                pred,
                lhs,
                rhs,
            } => {
                let v = match pred {
                    Predicate::Slt => eval(&state, lhs).lt_signed(eval(&state, rhs)),
                    _ => {
                        sink.record(id, &format!("icmp {}", pred.mnemonic()));
                        Interval::TOP
                    }
                };
                state.set(dest.clone(), v);
            }
            Inst::Phi { dest, incomings } => {
                let v = incomings
                    .iter()
                    .fold(Interval::Bottom, |acc, (op, _)| acc.join(eval(&state, op)));
                state.set(dest.clone(), v);
            }
            Inst::Unknown { dest, mnemonic } => {
                sink.record(id, mnemonic);
                if let Some(dest) = dest {
                    state.set(dest.clone(), Interval::TOP);
                }
            }
        }
    }
    state
}
