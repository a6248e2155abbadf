//! Two-phase worklist solver for the interval analysis.
//!
//! Phase one ascends with widening until the per-block states stop growing;
//! widening forces loop bounds to infinity, so the phase terminates on any
//! graph. Phase two descends with narrowing, replacing only the infinite
//! bounds widening introduced with bounds the transfer function can prove.

use crate::error::AnalysisError;
use crate::lattice::Interval;
use crate::state::AbstractState;
use crate::transfer::{transfer_block, NoticeSink, UnsupportedInst};
use absint_core::{BlockId, Function};
use std::collections::HashMap;
use tracing::debug;

/// Pending blocks, most recently pushed first.
///
/// Duplicates are allowed; a block pushed twice is simply revisited, and the
/// change check in the solver makes the extra visit a no-op.
#[derive(Debug, Default)]
pub struct Worklist {
    items: Vec<BlockId>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: BlockId) {
        self.items.push(id);
    }

    pub fn pop(&mut self) -> Option<BlockId> {
        self.items.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-block exit states. A block never visited maps to the empty state,
/// which is bottom for every variable.
#[derive(Debug, Default)]
pub struct StateTable {
    states: HashMap<BlockId, AbstractState>,
    empty: AbstractState,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BlockId) -> &AbstractState {
        self.states.get(&id).unwrap_or(&self.empty)
    }

    pub fn set(&mut self, id: BlockId, state: AbstractState) {
        self.states.insert(id, state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &AbstractState)> {
        self.states.iter().map(|(id, s)| (*id, s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ascending,
    Descending,
}

/// Result of analyzing one function.
#[derive(Debug)]
pub struct Analysis {
    /// Exit state per block.
    pub table: StateTable,
    /// Total block visits across both phases.
    pub iterations: usize,
    /// Unsupported-instruction sites, one per distinct site.
    pub notices: Vec<UnsupportedInst>,
}

/// The state flowing into `id`.
///
/// The entry block starts from the formal parameters bound to top; every
/// other block joins its predecessors' exit states, with never-visited
/// predecessors contributing the empty state.
fn block_input(func: &Function, table: &StateTable, id: BlockId) -> AbstractState {
    let mut input = AbstractState::new();
    if func.is_entry(id) {
        for param in func.params() {
            input.set(param.clone(), Interval::TOP);
        }
        return input;
    }
    for pred in func.predecessors(id) {
        input = input.join(table.get(*pred));
    }
    input
}

fn run_phase(
    func: &Function,
    table: &mut StateTable,
    sink: &mut NoticeSink,
    phase: Phase,
) -> usize {
    let mut worklist = Worklist::new();
    for id in func.block_ids().rev() {
        worklist.push(id);
    }

    let mut visits = 0;
    while let Some(id) = worklist.pop() {
        visits += 1;
        let input = block_input(func, table, id);
        let candidate = transfer_block(id, func.block(id), &input, sink);
        let old = table.get(id);

        let next = match phase {
            Phase::Ascending => {
                if candidate.le(old) {
                    continue;
                }
                old.widen(&candidate)
            }
            Phase::Descending => {
                if !candidate.le(old) {
                    continue;
                }
                let next = old.narrow(&candidate);
                if next == *old {
                    continue;
                }
                next
            }
        };

        table.set(id, next);
        for succ in func.successors(id) {
            worklist.push(*succ);
        }
    }
    visits
}

/// Computes the interval fixpoint for `func`.
pub fn analyze(func: &Function) -> Result<Analysis, AnalysisError> {
    if func.block_ids().next().is_none() {
        return Err(AnalysisError::NoBlocks {
            function: func.name().to_owned(),
        });
    }

    let mut table = StateTable::new();
    let mut sink = NoticeSink::new();

    let ascending = run_phase(func, &mut table, &mut sink, Phase::Ascending);
    let descending = run_phase(func, &mut table, &mut sink, Phase::Descending);
    debug!(
        function = func.name(),
        ascending, descending, "fixpoint reached"
    );

    Ok(Analysis {
        table,
        iterations: ascending + descending,
        notices: sink.into_notices(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Bound::{Int, PosInf};
    use absint_core::parse_module;

    fn analyze_first(src: &str) -> Analysis {
        let module = parse_module(src).unwrap();
        analyze(&module.functions[0]).unwrap()
    }

    fn exit_state<'a>(analysis: &'a Analysis, func_src: &str, label: &str) -> &'a AbstractState {
        let module = parse_module(func_src).unwrap();
        let id = module.functions[0].block_by_label(label).unwrap();
        analysis.table.get(id)
    }

    #[test]
    fn straight_line_constants() {
        let src = "fn @f() {\nentry:\n  %a = add 3, 4\n  ret %a\n}\n";
        let analysis = analyze_first(src);
        let state = exit_state(&analysis, src, "entry");
        assert_eq!(state.get("a"), Interval::singleton(7));
    }

    #[test]
    fn params_start_at_top() {
        let src = "fn @f(%x) {\nentry:\n  %y = add %x, 1\n  ret %y\n}\n";
        let analysis = analyze_first(src);
        let state = exit_state(&analysis, src, "entry");
        assert_eq!(state.get("x"), Interval::TOP);
        assert_eq!(state.get("y"), Interval::TOP);
    }

    #[test]
    fn diamond_phi_joins_both_arms() {
        let src = "\
fn @f(%c) {
entry:
  br %c, %then, %else
then:
  %a = add 0, 1
  br %merge
else:
  %b = add 0, 5
  br %merge
merge:
  %v = phi [%a, %then], [%b, %else]
  ret %v
}
";
        let analysis = analyze_first(src);
        let state = exit_state(&analysis, src, "merge");
        assert_eq!(state.get("v"), Interval::range(Int(1), Int(5)));
    }

    #[test]
    fn loop_counter_widens_to_plus_infinity() {
        let src = "\
fn @count(%n) {
entry:
  br %loop
loop:
  %i = phi [0, %entry], [%j, %loop]
  %j = add %i, 1
  %c = icmp slt %j, %n
  br %c, %loop, %done
done:
  ret %i
}
";
        let analysis = analyze_first(src);
        let state = exit_state(&analysis, src, "loop");
        assert_eq!(state.get("i"), Interval::range(Int(0), PosInf));
        assert_eq!(state.get("j"), Interval::range(Int(1), PosInf));
        assert_eq!(state.get("c"), Interval::TOP);
        assert_eq!(state.get("n"), Interval::TOP);
    }

    #[test]
    fn second_descending_pass_changes_nothing() {
        let src = "\
fn @count(%n) {
entry:
  br %loop
loop:
  %i = phi [0, %entry], [%j, %loop]
  %j = add %i, 1
  %c = icmp slt %j, %n
  br %c, %loop, %done
done:
  ret %i
}
";
        let module = parse_module(src).unwrap();
        let func = &module.functions[0];
        let mut table = StateTable::new();
        let mut sink = NoticeSink::new();
        run_phase(func, &mut table, &mut sink, Phase::Ascending);
        run_phase(func, &mut table, &mut sink, Phase::Descending);

        let snapshot: Vec<AbstractState> =
            func.block_ids().map(|id| table.get(id).clone()).collect();
        run_phase(func, &mut table, &mut sink, Phase::Descending);
        for (id, before) in func.block_ids().zip(snapshot) {
            assert_eq!(table.get(id), &before);
        }
    }

    #[test]
    fn unreachable_block_input_is_empty() {
        let src = "\
fn @f() {
entry:
  ret
orphan:
  %x = add %ghost, 1
  %y = add 1, 1
  ret
}
";
        // The orphan block has no predecessors, so its input is the empty
        // state: variable operands evaluate to bottom and poison their
        // results, while literal operands still fold.
        let analysis = analyze_first(src);
        let state = exit_state(&analysis, src, "orphan");
        assert_eq!(state.get("x"), Interval::Bottom);
        assert_eq!(state.get("y"), Interval::singleton(2));
    }

    #[test]
    fn notices_are_collected_once() {
        let src = "\
fn @f(%p) {
entry:
  %x = load %p
  %y = add %x, %x
  br %entry2
entry2:
  %z = add %y, 1
  ret %z
}
";
        let analysis = analyze_first(src);
        assert_eq!(analysis.notices.len(), 1);
        assert_eq!(analysis.notices[0].mnemonic, "load");
    }
}
