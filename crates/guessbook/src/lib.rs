//! # guessbook
//!
//! Monte-Carlo estimation over documents of named formulas.
//!
//! A document is ordinary text with cell declarations such as
//! `[rent = uniform(1100, 1300)]` embedded in it. Guessbook scans the
//! declarations, runs every cell many times over to build an empirical
//! distribution for each, and ranks which cells a chosen target is most
//! sensitive to.
//!
//! ## Features
//!
//! - Formula language with arithmetic, comparison and logical operators
//! - Stochastic functions (`normal`, `uniform`, `triangular`, `bounded_normal`)
//! - Seeded, reproducible runs
//! - OLS sensitivity ranking against a target cell
//! - Summary statistics and histograms for display
//! - Parallel iterations (`parallel` feature)
//!
//! ## Example
//!
//! ```rust
//! use guessbook::prelude::*;
//!
//! let doc = Document::parse(
//!     "Monthly rent is [rent = uniform(1100, 1300)] and utilities are
//!      [utilities = normal(150, 20)], so a year costs [year = (rent + utilities) * 12].",
//! );
//!
//! let results = generate_results(&doc, 2_000, Some("year")).unwrap();
//! let year = results.summary("year").unwrap();
//! assert!(year.low < year.median && year.median < year.high);
//!
//! let ranked = results.sensitivities.unwrap();
//! assert_eq!(ranked.names().next(), Some("rent"));
//! ```

pub mod document;
pub mod error;
#[cfg(feature = "parallel")]
mod parallel;
pub mod prelude;
pub mod sensitivity;
pub mod simulation;
pub mod summary;

pub use document::{parse_input, Cell, Diagnostic, Document};
pub use error::{Error, Result};
pub use sensitivity::{Sensitivities, Sensitivity, SensitivityRecord};
pub use simulation::{
    generate_results, simulate, CancellationToken, CellSamples, DocumentSimulationExt,
    SimulationOptions, SimulationResults, SimulationStats, DEFAULT_ITERATIONS,
};
pub use summary::{histogram, Histogram, Summary, DEFAULT_BUCKETS};

// Re-export the formula language
pub use guessbook_formula::{
    evaluate, parse, parse_formula, tokenize, DefinedVariables, EvaluationContext, Expr,
    FormulaError, FormulaResult, FunctionRegistry, Token, Value,
};
