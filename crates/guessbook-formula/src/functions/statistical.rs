//! Statistical functions
//!
//! Variable-arity aggregates over their (numeric-coerced) arguments.

use super::{number_arg, numbers};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Value;
use rand::RngCore;

/// MIN(value1, ...) - Smallest argument; NaN if any argument is NaN
pub fn fn_min(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let min = extremum(&numbers(args), f64::INFINITY, |n, best| n < best);
    Ok(Value::Number(min))
}

/// MAX(value1, ...) - Largest argument; NaN if any argument is NaN
pub fn fn_max(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let max = extremum(&numbers(args), f64::NEG_INFINITY, |n, best| n > best);
    Ok(Value::Number(max))
}

fn extremum(values: &[f64], empty: f64, better: impl Fn(f64, f64) -> bool) -> f64 {
    let mut result = empty;
    for &n in values {
        if n.is_nan() {
            return f64::NAN;
        }
        if better(n, result) {
            result = n;
        }
    }
    result
}

/// MEAN(value1, ...) - Arithmetic mean
pub fn fn_mean(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(mean(&numbers(args))))
}

/// MEDIAN(value1, ...) - Middle value, or the average of the two middle
/// values for an even count
pub fn fn_median(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let sorted = sorted(numbers(args));
    let n = sorted.len();
    if n == 0 {
        return Ok(Value::Number(f64::NAN));
    }

    let mid = n / 2;
    let median = if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    };
    Ok(Value::Number(median))
}

/// STDEV(value1, ...) - Population standard deviation (divides by n)
pub fn fn_stdev(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let values = numbers(args);
    let mean = mean(&values);
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(Value::Number(variance.sqrt()))
}

/// PERCENTILE(p, value1, ...) - Linearly interpolated percentile, `p` in
/// `[0, 100]`
pub fn fn_percentile(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let p = number_arg(args, 0);
    if !(0.0..=100.0).contains(&p) {
        return Err(FormulaError::Domain(format!(
            "Percentile must be between 0 and 100, got {p}"
        )));
    }

    let sorted = sorted(numbers(args.get(1..).unwrap_or_default()));
    Ok(Value::Number(percentile_of_sorted(&sorted, p)))
}

/// Percentile of already sorted data, interpolating between neighbours
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}
