//! Built-in functions
//!
//! A closed catalog of named functions. Each entry pairs a plain function
//! pointer with an arity rule; the parser rejects unknown names and bad
//! argument counts before anything is evaluated.

pub mod logical;
pub mod math;
pub mod random;
pub mod statistical;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Value;
use ahash::AHashMap;
use rand::RngCore;
use std::sync::OnceLock;

/// Function implementation signature
///
/// Arguments arrive fully evaluated. Stochastic functions draw from `rng`;
/// the rest ignore it.
pub type FunctionImpl = fn(&[Value], &mut dyn RngCore) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (lookups are case-sensitive)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Draws fresh randomness on every call
    pub stochastic: bool,
}

impl FunctionDef {
    /// Check an argument count against this function's arity rule
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        let too_few = actual < self.min_args;
        let too_many = self.max_args.is_some_and(|max| actual > max);
        if !too_few && !too_many {
            return Ok(());
        }

        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!("exactly {max}"),
            Some(max) => format!("between {} and {max}", self.min_args),
            None => format!("at least {}", self.min_args),
        };

        Err(FormulaError::ArgumentCount {
            function: self.name.to_string(),
            expected,
            actual,
        })
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_logical_functions();
        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_random_functions();

        registry
    }

    /// Shared registry of built-in functions
    pub fn global() -> &'static FunctionRegistry {
        FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Whether `name` is a built-in function
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "if",
            min_args: 3,
            max_args: Some(3),
            implementation: logical::fn_if,
            stochastic: false,
        });
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "round",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_round,
            stochastic: false,
        });

        let unary: [(&'static str, FunctionImpl); 5] = [
            ("log", math::fn_log),
            ("exp", math::fn_exp),
            ("sin", math::fn_sin),
            ("cos", math::fn_cos),
            ("tan", math::fn_tan),
        ];
        for (name, implementation) in unary {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: Some(1),
                implementation,
                stochastic: false,
            });
        }
    }

    fn register_statistical_functions(&mut self) {
        let aggregates: [(&'static str, FunctionImpl); 5] = [
            ("min", statistical::fn_min),
            ("max", statistical::fn_max),
            ("mean", statistical::fn_mean),
            ("median", statistical::fn_median),
            ("stdev", statistical::fn_stdev),
        ];
        for (name, implementation) in aggregates {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: None,
                implementation,
                stochastic: false,
            });
        }

        // PERCENTILE(p, value1, ...)
        self.register(FunctionDef {
            name: "percentile",
            min_args: 2,
            max_args: None,
            implementation: statistical::fn_percentile,
            stochastic: false,
        });
    }

    fn register_random_functions(&mut self) {
        self.register(FunctionDef {
            name: "normal",
            min_args: 2,
            max_args: Some(2),
            implementation: random::fn_normal,
            stochastic: true,
        });

        self.register(FunctionDef {
            name: "bounded_normal",
            min_args: 2,
            max_args: Some(2),
            implementation: random::fn_bounded_normal,
            stochastic: true,
        });

        self.register(FunctionDef {
            name: "uniform",
            min_args: 2,
            max_args: Some(2),
            implementation: random::fn_uniform,
            stochastic: true,
        });

        self.register(FunctionDef {
            name: "triangular",
            min_args: 3,
            max_args: Some(3),
            implementation: random::fn_triangular,
            stochastic: true,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric value of argument `index`, NaN when absent
pub(crate) fn number_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, |v| v.as_number())
}

/// All arguments as numbers
pub(crate) fn numbers(args: &[Value]) -> Vec<f64> {
    args.iter().map(|v| v.as_number()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_catalog() {
        let registry = FunctionRegistry::global();
        assert_eq!(
            registry.names(),
            vec![
                "bounded_normal",
                "cos",
                "exp",
                "if",
                "log",
                "max",
                "mean",
                "median",
                "min",
                "normal",
                "percentile",
                "round",
                "sin",
                "stdev",
                "tan",
                "triangular",
                "uniform",
            ]
        );
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.contains("normal"));
        assert!(!registry.contains("NORMAL"));
        assert!(registry.get("Normal").is_none());
    }

    #[test]
    fn test_stochastic_flags() {
        let registry = FunctionRegistry::new();
        let stochastic: Vec<_> = registry
            .names()
            .into_iter()
            .filter(|name| registry.get(name).is_some_and(|f| f.stochastic))
            .collect();
        assert_eq!(stochastic, vec!["bounded_normal", "normal", "triangular", "uniform"]);
    }

    #[test]
    fn test_check_arity() {
        let registry = FunctionRegistry::new();

        let normal = registry.get("normal").unwrap();
        assert!(normal.check_arity(2).is_ok());
        assert_eq!(
            normal.check_arity(3),
            Err(FormulaError::ArgumentCount {
                function: "normal".into(),
                expected: "exactly 2".into(),
                actual: 3,
            })
        );

        let max = registry.get("max").unwrap();
        assert!(max.check_arity(20).is_ok());
        assert_eq!(
            max.check_arity(0),
            Err(FormulaError::ArgumentCount {
                function: "max".into(),
                expected: "at least 1".into(),
                actual: 0,
            })
        );
    }
}
