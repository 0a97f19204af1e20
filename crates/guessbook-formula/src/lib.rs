//! # guessbook-formula
//!
//! Formula language for guessbook documents.
//!
//! This crate provides:
//! - Tokenizing (text → tokens)
//! - Parsing with define-before-use checking (tokens → AST)
//! - Evaluation against per-iteration variables (AST → value)
//! - Built-in deterministic and stochastic functions
//!
//! ## Example
//!
//! ```rust
//! use guessbook_formula::{parse_formula, evaluate, DefinedVariables, EvaluationContext, Value};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let defined: DefinedVariables = ["price"].into_iter().collect();
//! let expr = parse_formula("price * uniform(1, 2)", &defined).unwrap();
//! assert_eq!(expr.repr(), "price * uniform(1, 2)");
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut ctx = EvaluationContext::new(&mut rng);
//! ctx.set("price", Value::Number(10.0));
//! let value = evaluate(&expr, &mut ctx).unwrap().as_number();
//! assert!((10.0..20.0).contains(&value));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOperator, ComparisonOperator, Expr, LogicalOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, Value};
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use lexer::{tokenize, Token, KEYWORDS};
pub use parser::{parse, parse_formula, DefinedVariables, MAX_DEPTH};
