//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::Value;
use rand::RngCore;

/// IF(condition, value_if_true, value_if_false)
///
/// Both branches are already evaluated by the time this runs, so a
/// stochastic call in the unused branch still draws from the random source.
pub fn fn_if(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let condition = args.first().is_some_and(|v| v.is_truthy());
    let picked = if condition { args.get(1) } else { args.get(2) };
    Ok(picked.copied().unwrap_or(Value::Number(f64::NAN)))
}
