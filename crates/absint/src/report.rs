//! Report construction and rendering for analysis results.

use absint_analysis::Analysis;
use absint_core::Function;
use colored::Colorize;
use serde::Serialize;

/// One variable binding at a block's exit.
#[derive(Debug, Serialize)]
pub struct Binding {
    pub var: String,
    pub interval: String,
}

/// The exit state of one basic block.
#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub label: String,
    pub bindings: Vec<Binding>,
}

/// Analysis results for a whole function, in block arena order.
#[derive(Debug, Serialize)]
pub struct FunctionReport {
    pub name: String,
    pub blocks: Vec<BlockReport>,
    pub notices: Vec<String>,
}

impl FunctionReport {
    pub fn new(func: &Function, analysis: &Analysis) -> Self {
        let blocks = func
            .block_ids()
            .map(|id| {
                let state = analysis.table.get(id);
                BlockReport {
                    label: func.block(id).label.clone(),
                    bindings: state
                        .iter()
                        .map(|(var, iv)| Binding {
                            var: var.to_string(),
                            interval: iv.to_string(),
                        })
                        .collect(),
                }
            })
            .collect();
        let notices = analysis.notices.iter().map(|n| n.to_string()).collect();
        FunctionReport {
            name: func.name().to_string(),
            blocks,
            notices,
        }
    }

    pub fn print_text(&self) {
        println!("{} @{}", "fn".bold(), self.name.bold());
        for block in &self.blocks {
            println!("  {}:", block.label.cyan());
            for binding in &block.bindings {
                println!("\t%{} |-> {}", binding.var, binding.interval);
            }
        }
        for notice in &self.notices {
            println!("  {} {}", "note:".yellow(), notice);
        }
        println!();
    }
}
