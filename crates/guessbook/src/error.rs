//! Error types for guessbook

use guessbook_formula::FormulaError;
use thiserror::Error;

/// Result type for guessbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning a document or running a simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Formula failed to tokenize or parse
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Cell name declared more than once; the first declaration is kept
    #[error("Duplicate cell name: {0}")]
    DuplicateCell(String),

    /// Cell name is not a valid identifier
    #[error("Invalid cell name: {0}")]
    InvalidCellName(String),

    /// A cell failed to evaluate during a simulation run
    #[error("Failed to evaluate cell {cell}: {source}")]
    Evaluation {
        cell: String,
        #[source]
        source: FormulaError,
    },

    /// Simulation stopped through its cancellation token
    #[error("Simulation cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },
}

