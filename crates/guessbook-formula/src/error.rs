//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula tokenizing, parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Input contained a character sequence no token pattern matches
    #[error("Unrecognized input: '{0}'")]
    Lex(String),

    /// Malformed grammar (parentheses, commas, trailing or missing tokens)
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Variable referenced before its definition, or missing from the
    /// evaluation context
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// Call to a name that is not a built-in function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Argument outside the domain a function accepts
    #[error("Domain error: {0}")]
    Domain(String),
}

impl FormulaError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        FormulaError::Syntax(message.into())
    }
}
