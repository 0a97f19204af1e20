//! Monte-Carlo simulation engine
//!
//! Runs a document's cells many times over. Every iteration starts from an
//! empty context and evaluates each cell once in declaration order, so a
//! cell sees the values its predecessors produced in the same iteration
//! and nothing from any other iteration.
//!
//! # Example
//!
//! ```rust
//! use guessbook::prelude::*;
//!
//! let doc = Document::parse("[a = uniform(1, 2)]\n[b = a * 10]");
//! let options = SimulationOptions {
//!     iterations: 500,
//!     seed: Some(42),
//!     target: Some("b".into()),
//!     ..Default::default()
//! };
//!
//! let results = doc.simulate_with_options(&options).unwrap();
//! assert_eq!(results.get("b").unwrap().len(), 500);
//! assert!(results.sensitivities.unwrap().get("a").unwrap().is_strong());
//! ```

use crate::document::{Cell, Document};
use crate::error::{Error, Result};
use crate::sensitivity::{rank, Sensitivities, DEFAULT_MAX_SENSITIVITIES};
use crate::summary::Summary;
use guessbook_formula::{EvaluationContext, Expr, FunctionRegistry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Iterations per run when not configured
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Options for a simulation run
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Number of iterations (default: 10000)
    pub iterations: usize,
    /// Fixed seed for a reproducible run; drawn at random when `None`
    pub seed: Option<u64>,
    /// Cell to run sensitivity analysis against
    pub target: Option<String>,
    /// Number of variables kept in the sensitivity ranking (default: 5)
    pub max_sensitivities: usize,
    /// Spread iterations over a thread pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            target: None,
            max_sensitivities: DEFAULT_MAX_SENSITIVITIES,
            parallel: false,
        }
    }
}

/// Statistics from a simulation run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SimulationStats {
    /// Iterations completed
    pub iterations: usize,
    /// Cells evaluated per iteration
    pub cells: usize,
    /// Cells whose formula calls a stochastic function
    pub stochastic_cells: usize,
    /// Seed the run used; pass it back in to reproduce the run
    pub seed: u64,
    /// Whether iterations ran on the thread pool
    pub parallel: bool,
}

/// Samples of one cell, one per iteration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CellSamples {
    pub name: String,
    /// Booleans are stored as 1.0 / 0.0
    pub values: Vec<f64>,
}

/// Output of a simulation run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SimulationResults {
    /// Per-cell samples in declaration order, index-aligned by iteration
    pub samples: Vec<CellSamples>,
    /// Ranked sensitivities; `None` unless a target present in the
    /// document was requested
    pub sensitivities: Option<Sensitivities>,
    pub stats: SimulationStats,
}

impl SimulationResults {
    /// Samples of a cell
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.samples
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    /// Cell names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.samples.iter().map(|s| s.name.as_str())
    }

    /// `(name, samples)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.samples
            .iter()
            .map(|s| (s.name.as_str(), s.values.as_slice()))
    }

    /// Summary statistics of a cell's samples
    pub fn summary(&self, name: &str) -> Option<Summary> {
        self.get(name).and_then(Summary::from_samples)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Cooperative cancellation for a running simulation
///
/// Clones share one flag. The engine checks it before every iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Extension trait for Document to add simulation methods
pub trait DocumentSimulationExt {
    /// Simulate with default options
    fn simulate(&self) -> Result<SimulationResults>;

    /// Simulate with custom options
    fn simulate_with_options(&self, options: &SimulationOptions) -> Result<SimulationResults>;
}

impl DocumentSimulationExt for Document {
    fn simulate(&self) -> Result<SimulationResults> {
        self.simulate_with_options(&SimulationOptions::default())
    }

    fn simulate_with_options(&self, options: &SimulationOptions) -> Result<SimulationResults> {
        simulate(self, options, &CancellationToken::new())
    }
}

/// Run `iterations` iterations of `doc`, optionally ranking sensitivities
/// against `target`
pub fn generate_results(
    doc: &Document,
    iterations: usize,
    target: Option<&str>,
) -> Result<SimulationResults> {
    let options = SimulationOptions {
        iterations,
        target: target.map(str::to_string),
        ..Default::default()
    };
    simulate(doc, &options, &CancellationToken::new())
}

/// Run a simulation that can be stopped through `cancel`
///
/// Fails with [`Error::Evaluation`] as soon as any cell fails to evaluate,
/// and with [`Error::Cancelled`] once cancellation is observed.
pub fn simulate(
    doc: &Document,
    options: &SimulationOptions,
    cancel: &CancellationToken,
) -> Result<SimulationResults> {
    SimulationEngine::new(doc, options).run(cancel)
}

/// The simulation engine
struct SimulationEngine<'a> {
    cells: &'a [Cell],
    options: &'a SimulationOptions,
    seed: u64,
}

impl<'a> SimulationEngine<'a> {
    fn new(doc: &'a Document, options: &'a SimulationOptions) -> Self {
        Self {
            cells: doc.cells(),
            options,
            seed: options.seed.unwrap_or_else(|| rand::thread_rng().gen()),
        }
    }

    fn run(&self, cancel: &CancellationToken) -> Result<SimulationResults> {
        let iterations = self.options.iterations;
        let mut stats = SimulationStats {
            iterations,
            cells: self.cells.len(),
            stochastic_cells: self
                .cells
                .iter()
                .filter(|cell| contains_stochastic_function(cell.expr()))
                .count(),
            seed: self.seed,
            parallel: false,
        };

        tracing::debug!(
            "Starting simulation: {iterations} iterations over {} cells (seed {})",
            stats.cells,
            stats.seed
        );

        let columns = match self.run_parallel(cancel) {
            Some(columns) => {
                stats.parallel = true;
                columns
            }
            None => self.run_sequential(cancel),
        }
        .map_err(|e| {
            if let Error::Cancelled { completed, .. } = &e {
                tracing::info!("Simulation cancelled after {completed} of {iterations} iterations");
            }
            e
        })?;

        let samples: Vec<CellSamples> = self
            .cells
            .iter()
            .zip(columns)
            .map(|(cell, values)| CellSamples {
                name: cell.name().to_string(),
                values,
            })
            .collect();

        let sensitivities = self.sensitivities(&samples);

        tracing::debug!(
            "Simulation finished: {iterations} iterations, {} stochastic cells",
            stats.stochastic_cells
        );

        Ok(SimulationResults {
            samples,
            sensitivities,
            stats,
        })
    }

    /// One empty sample vector per cell, each sized for the full run
    fn empty_columns(&self) -> Vec<Vec<f64>> {
        (0..self.cells.len())
            .map(|_| Vec::with_capacity(self.options.iterations))
            .collect()
    }

    /// Evaluate every iteration in order on the calling thread
    fn run_sequential(&self, cancel: &CancellationToken) -> Result<Vec<Vec<f64>>> {
        let iterations = self.options.iterations;
        let mut columns = self.empty_columns();
        let mut row = vec![0.0; self.cells.len()];

        for i in 0..iterations {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    completed: i,
                    requested: iterations,
                });
            }

            self.run_iteration(i, &mut row)?;
            for (column, &value) in columns.iter_mut().zip(&row) {
                column.push(value);
            }
        }

        Ok(columns)
    }

    /// Evaluate iterations on the crate's thread pool
    ///
    /// Returns `None` when parallel evaluation is disabled or no pool is
    /// available, so the caller falls back to [`run_sequential`](Self::run_sequential).
    #[cfg(feature = "parallel")]
    fn run_parallel(&self, cancel: &CancellationToken) -> Option<Result<Vec<Vec<f64>>>> {
        use rayon::prelude::*;
        use std::sync::atomic::AtomicUsize;

        if !self.options.parallel {
            return None;
        }
        let pool = crate::parallel::rayon_pool()?;

        let iterations = self.options.iterations;
        let completed = AtomicUsize::new(0);

        let rows: Result<Vec<Vec<f64>>> = pool.install(|| {
            (0..iterations)
                .into_par_iter()
                .map(|i| {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled {
                            completed: completed.load(Ordering::Relaxed),
                            requested: iterations,
                        });
                    }
                    let mut row = vec![0.0; self.cells.len()];
                    self.run_iteration(i, &mut row)?;
                    completed.fetch_add(1, Ordering::Relaxed);
                    Ok(row)
                })
                .collect()
        });

        let rows = match rows {
            Ok(rows) => rows,
            Err(Error::Cancelled { requested, .. }) => {
                return Some(Err(Error::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    requested,
                }))
            }
            Err(e) => return Some(Err(e)),
        };

        let mut columns = self.empty_columns();
        for row in rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Some(Ok(columns))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel(&self, _cancel: &CancellationToken) -> Option<Result<Vec<Vec<f64>>>> {
        None
    }

    /// Evaluate all cells once, writing one value per cell into `row`
    ///
    /// Each iteration draws from its own generator seeded from the run seed
    /// and the iteration index, so results do not depend on which thread
    /// ran the iteration.
    fn run_iteration(&self, index: usize, row: &mut [f64]) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(iteration_seed(self.seed, index));
        let mut ctx = EvaluationContext::with_capacity(&mut rng, self.cells.len());

        for (cell, slot) in self.cells.iter().zip(row.iter_mut()) {
            let value = cell.calculate(&mut ctx).map_err(|source| Error::Evaluation {
                cell: cell.name().to_string(),
                source,
            })?;
            ctx.set(cell.name(), value);
            *slot = value.as_number();
        }

        Ok(())
    }

    fn sensitivities(&self, samples: &[CellSamples]) -> Option<Sensitivities> {
        let target = self.options.target.as_deref()?;
        let Some(target_samples) = samples.iter().find(|s| s.name == target) else {
            tracing::debug!("Sensitivity target {target} is not a cell; skipping analysis");
            return None;
        };

        let variables = samples
            .iter()
            .filter(|s| s.name != target)
            .map(|s| (s.name.as_str(), s.values.as_slice()));

        Some(rank(
            &target_samples.values,
            variables,
            self.options.max_sensitivities,
        ))
    }
}

/// Seed for one iteration's generator
fn iteration_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Check if a formula calls any stochastic function
fn contains_stochastic_function(expr: &Expr) -> bool {
    match expr {
        Expr::Function { name, args } => {
            FunctionRegistry::global()
                .get(name)
                .is_some_and(|f| f.stochastic)
                || args.iter().any(contains_stochastic_function)
        }
        Expr::BinaryOp { left, right, .. }
        | Expr::Comparison { left, right, .. }
        | Expr::Logical { left, right, .. } => {
            contains_stochastic_function(left) || contains_stochastic_function(right)
        }
        Expr::Not(operand) => contains_stochastic_function(operand),
        Expr::Number(_) | Expr::Variable(_) => false,
    }
}
