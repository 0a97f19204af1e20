//! Formula evaluator
//!
//! Evaluates formula ASTs against a per-iteration variable context to
//! produce values.

use crate::ast::{BinaryOperator, ComparisonOperator, Expr, LogicalOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use ahash::AHashMap;
use rand::RngCore;
use std::fmt;

/// Value types during formula evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
}

impl Value {
    /// Numeric view of the value; booleans coerce to 1.0 / 0.0
    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
        }
    }

    /// Truthiness: `false`, `0` and `NaN` are false, everything else true
    pub fn is_truthy(self) -> bool {
        match self {
            Value::Number(n) => n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => b,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Context for formula evaluation
///
/// Holds the values of the cells already evaluated in the current
/// iteration, and the random source stochastic functions draw from.
pub struct EvaluationContext<'a> {
    variables: AHashMap<&'a str, Value>,
    rng: &'a mut dyn RngCore,
}

impl<'a> EvaluationContext<'a> {
    /// Create an empty context drawing randomness from `rng`
    pub fn new(rng: &'a mut dyn RngCore) -> Self {
        Self {
            variables: AHashMap::new(),
            rng,
        }
    }

    /// Create an empty context with room for `capacity` variables
    pub fn with_capacity(rng: &'a mut dyn RngCore, capacity: usize) -> Self {
        Self {
            variables: AHashMap::with_capacity(capacity),
            rng,
        }
    }

    /// Bind a variable, replacing any previous value
    pub fn set(&mut self, name: &'a str, value: Value) {
        self.variables.insert(name, value);
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.get(name).copied()
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Random source for stochastic functions
    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }
}

impl Expr {
    /// Evaluate this expression; see [`evaluate`]
    pub fn calculate(&self, ctx: &mut EvaluationContext<'_>) -> FormulaResult<Value> {
        evaluate(self, ctx)
    }
}

/// Evaluate an expression against a context
///
/// # Example
/// ```rust
/// use guessbook_formula::{evaluate, parse_formula, DefinedVariables, EvaluationContext, Value};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mut ctx = EvaluationContext::new(&mut rng);
/// ctx.set("a", Value::Number(4.0));
///
/// let defined: DefinedVariables = ["a"].into_iter().collect();
/// let expr = parse_formula("a * 2 + 1", &defined).unwrap();
/// assert_eq!(evaluate(&expr, &mut ctx).unwrap(), Value::Number(9.0));
/// ```
pub fn evaluate(expr: &Expr, ctx: &mut EvaluationContext<'_>) -> FormulaResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),

        Expr::Variable(name) => ctx
            .get(name)
            .ok_or_else(|| FormulaError::UndefinedVariable(name.clone())),

        Expr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        Expr::Comparison { op, left, right } => evaluate_comparison(*op, left, right, ctx),

        Expr::Logical { op, left, right } => {
            // Short-circuits like the host language: the right operand is
            // not evaluated (and draws no randomness) when the left decides.
            let left = evaluate(left, ctx)?.is_truthy();
            let result = match op {
                LogicalOperator::And => left && evaluate(right, ctx)?.is_truthy(),
                LogicalOperator::Or => left || evaluate(right, ctx)?.is_truthy(),
            };
            Ok(Value::Boolean(result))
        }

        Expr::Not(operand) => Ok(Value::Boolean(!evaluate(operand, ctx)?.is_truthy())),

        Expr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate an arithmetic operation
///
/// IEEE semantics throughout: division by zero yields an infinity or NaN
/// rather than an error.
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    ctx: &mut EvaluationContext<'_>,
) -> FormulaResult<Value> {
    let l = evaluate(left, ctx)?.as_number();
    let r = evaluate(right, ctx)?.as_number();

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => l / r,
        BinaryOperator::Remainder => l % r,
        BinaryOperator::Power => l.powf(r),
    };

    Ok(Value::Number(result))
}

/// Evaluate a comparison
///
/// Both sides are compared numerically, so a boolean operand (for example
/// the left side of a chained `a < b < c`) takes part as 1 or 0.
fn evaluate_comparison(
    op: ComparisonOperator,
    left: &Expr,
    right: &Expr,
    ctx: &mut EvaluationContext<'_>,
) -> FormulaResult<Value> {
    let l = evaluate(left, ctx)?.as_number();
    let r = evaluate(right, ctx)?.as_number();

    let result = match op {
        ComparisonOperator::GreaterThan => l > r,
        ComparisonOperator::LessThan => l < r,
        ComparisonOperator::GreaterEqual => l >= r,
        ComparisonOperator::LessEqual => l <= r,
        ComparisonOperator::Equal => l == r,
        ComparisonOperator::NotEqual => l != r,
    };

    Ok(Value::Boolean(result))
}

/// Evaluate a function call
///
/// All arguments are evaluated left to right before dispatch.
fn evaluate_function(
    name: &str,
    args: &[Expr],
    ctx: &mut EvaluationContext<'_>,
) -> FormulaResult<Value> {
    let func = FunctionRegistry::global()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    func.check_arity(args.len())?;

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&values, ctx.rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_formula, DefinedVariables};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn eval_with(formula: &str, vars: &[(&'static str, Value)]) -> FormulaResult<Value> {
        let defined: DefinedVariables = vars.iter().map(|(name, _)| *name).collect();
        let expr = parse_formula(formula, &defined)?;
        let mut rng = StdRng::seed_from_u64(42);
        let mut ctx = EvaluationContext::new(&mut rng);
        for &(name, value) in vars {
            ctx.set(name, value);
        }
        evaluate(&expr, &mut ctx)
    }

    fn eval(formula: &str) -> Value {
        eval_with(formula, &[]).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4"), Value::Number(14.0));
        assert_eq!(eval("(2 + 3) * 4"), Value::Number(20.0));
        assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
        assert_eq!(eval("2 * 3 ^ 2"), Value::Number(18.0));
    }

    #[test]
    fn test_power_is_left_associative() {
        assert_eq!(eval("2 ^ 3 ^ 2"), Value::Number(64.0));
    }

    #[test]
    fn test_remainder_and_division() {
        assert_eq!(eval("7 % 3"), Value::Number(1.0));
        assert_eq!(eval("7 / 2"), Value::Number(3.5));
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("3 > 2"), Value::Boolean(true));
        assert_eq!(eval("3 <= 2"), Value::Boolean(false));
        assert_eq!(eval("2 == 2.0"), Value::Boolean(true));
        assert_eq!(eval("2 != 2"), Value::Boolean(false));
    }

    #[test]
    fn test_chained_comparison_coerces_boolean() {
        // (3 < 2) is false -> 0, and 0 < 1
        assert_eq!(eval("3 < 2 < 1"), Value::Boolean(true));
        // (1 < 2) is true -> 1, and 1 < 1 is false
        assert_eq!(eval("1 < 2 < 1"), Value::Boolean(false));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(eval("1 > 0 AND 2 > 1"), Value::Boolean(true));
        assert_eq!(eval("1 > 0 AND 2 < 1"), Value::Boolean(false));
        assert_eq!(eval("1 < 0 OR 2 > 1"), Value::Boolean(true));
        assert_eq!(eval("NOT 1 < 0"), Value::Boolean(true));
        assert_eq!(eval("NOT 0"), Value::Boolean(true));
        // NOT binds over the whole rest of the expression
        assert_eq!(eval("NOT 1 > 0 OR 1 > 0"), Value::Boolean(false));
    }

    #[test]
    fn test_boolean_arithmetic_coercion() {
        assert_eq!(eval("(1 > 0) + (2 > 1)"), Value::Number(2.0));
    }

    #[test]
    fn test_variables() {
        let vars = [("a", Value::Number(5.0)), ("flag", Value::Boolean(true))];
        assert_eq!(eval_with("a * 2", &vars).unwrap(), Value::Number(10.0));
        assert_eq!(eval_with("if(flag, a, 0)", &vars).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_undefined_variable_at_evaluation() {
        let defined: DefinedVariables = ["a"].into_iter().collect();
        let expr = parse_formula("a + 1", &defined).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = EvaluationContext::new(&mut rng);
        assert_eq!(
            evaluate(&expr, &mut ctx),
            Err(FormulaError::UndefinedVariable("a".into()))
        );
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(eval("max(1, 5, 3)"), Value::Number(5.0));
        assert_eq!(eval("round(2.5) + round(0 - 2.5)"), Value::Number(1.0));
        assert_eq!(eval("if(2 > 1, 10, 20)"), Value::Number(10.0));
    }

    #[test]
    fn test_domain_error_propagates() {
        assert!(matches!(
            eval_with("percentile(150, 1, 2, 3)", &[]),
            Err(FormulaError::Domain(_))
        ));
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert_eq!(Value::Boolean(true).as_number(), 1.0);
    }
}
