//! Formula tokenizer
//!
//! Splits a formula into a flat list of lexemes. Tokens only carry their
//! literal text; the parser classifies them by matching on that text.

use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex;
use std::fmt;

/// Logical operator keywords, matched case-sensitively as whole words
pub const KEYWORDS: [&str; 3] = ["AND", "OR", "NOT"];

/// A single lexeme of a formula
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Create a token from its literal text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Literal text of the token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for tokens shaped like `[A-Za-z_][A-Za-z0-9_]*`.
    ///
    /// Keywords (`AND`, `OR`, `NOT`) match this shape too; see
    /// [`is_name`](Self::is_name).
    pub fn is_identifier(&self) -> bool {
        regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(&self.0)
    }

    /// True for the logical keywords `AND`, `OR` and `NOT`
    pub fn is_keyword(&self) -> bool {
        KEYWORDS.contains(&self.0.as_str())
    }

    /// True for identifiers that are not keywords, i.e. anything usable as
    /// a cell or function name
    pub fn is_name(&self) -> bool {
        self.is_identifier() && !self.is_keyword()
    }

    /// True for numeric literals (`[0-9]*\.?[0-9]+`)
    pub fn is_number(&self) -> bool {
        regex!(r"^[0-9]*\.?[0-9]+$").is_match(&self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Split a formula into tokens, dropping whitespace.
///
/// Alternatives are tried longest-first so that `>=` is one token rather
/// than `>` followed by `=`.
///
/// # Example
/// ```rust
/// use guessbook_formula::tokenize;
///
/// let tokens = tokenize("a >= 2 AND b").unwrap();
/// let text: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
/// assert_eq!(text, ["a", ">=", "2", "AND", "b"]);
/// ```
pub fn tokenize(formula: &str) -> FormulaResult<Vec<Token>> {
    let lexeme = regex!(
        r"^(?:>=|<=|==|!=|(?:AND|OR|NOT)\b|[-+*/%^(),<>]|\s+|[A-Za-z_][A-Za-z0-9_]*|[0-9]*\.?[0-9]+)"
    );

    let mut tokens = Vec::new();
    let mut rest = formula;

    while !rest.is_empty() {
        let found = lexeme.find(rest).ok_or_else(|| {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            FormulaError::Lex(rest[..end].to_string())
        })?;

        let text = found.as_str();
        if !text.trim().is_empty() {
            tokens.push(Token::new(text));
        }
        rest = &rest[found.end()..];
    }

    Ok(tokens)
}
