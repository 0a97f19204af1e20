//! Stochastic sampling functions
//!
//! Every call draws fresh values from the random source it is given;
//! nothing is cached between calls.

use super::number_arg;
use crate::error::FormulaResult;
use crate::evaluator::Value;
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// NORMAL(mean, std_dev) - One Gaussian sample (Box-Muller)
pub fn fn_normal(args: &[Value], rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let mean = number_arg(args, 0);
    let std_dev = number_arg(args, 1);
    Ok(Value::Number(standard_normal(rng) * std_dev + mean))
}

/// BOUNDED_NORMAL(min, max) - Bell-shaped sample confined to `[min, max]`
///
/// Centred on the midpoint with a standard deviation of a tenth of the
/// range; draws falling outside the range are rejected and redrawn.
pub fn fn_bounded_normal(args: &[Value], rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let min = number_arg(args, 0);
    let max = number_arg(args, 1);

    let unit = loop {
        let x = standard_normal(rng) / 10.0 + 0.5;
        if (0.0..=1.0).contains(&x) {
            break x;
        }
    };

    Ok(Value::Number(min + (max - min) * unit))
}

/// UNIFORM(min, max) - Uniform sample in `[min, max)`
pub fn fn_uniform(args: &[Value], rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let min = number_arg(args, 0);
    let max = number_arg(args, 1);
    Ok(Value::Number(rng.gen::<f64>() * (max - min) + min))
}

/// TRIANGULAR(min, mode, max) - Triangular sample by inverse CDF
pub fn fn_triangular(args: &[Value], rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let min = number_arg(args, 0);
    let mode = number_arg(args, 1);
    let max = number_arg(args, 2);

    let u = rng.gen::<f64>();
    let split = (mode - min) / (max - min);
    let sample = if u < split {
        min + (u * (max - min) * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * (max - min) * (max - mode)).sqrt()
    };

    Ok(Value::Number(sample))
}

/// Standard normal draw via the Box-Muller transform
fn standard_normal(rng: &mut dyn RngCore) -> f64 {
    let u = open_unit(rng);
    let v = open_unit(rng);
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}

/// Uniform draw in `(0, 1)`, rejecting exact zero
fn open_unit(rng: &mut dyn RngCore) -> f64 {
    loop {
        let x = rng.gen::<f64>();
        if x != 0.0 {
            return x;
        }
    }
}
