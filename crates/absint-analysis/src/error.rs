use thiserror::Error;

/// Errors surfaced by the fixpoint analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("function '{function}' has no basic blocks")]
    NoBlocks { function: String },
}
