//! Math functions

use super::number_arg;
use crate::error::FormulaResult;
use crate::evaluator::Value;
use rand::RngCore;

/// ROUND(number) - Rounds to the nearest integer, halves toward +infinity
///
/// `round(2.5)` is 3 and `round(-2.5)` is -2.
pub fn fn_round(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    let x = number_arg(args, 0);
    let floor = x.floor();
    let rounded = if x - floor >= 0.5 { floor + 1.0 } else { floor };
    Ok(Value::Number(rounded))
}

/// LOG(number) - Natural logarithm
pub fn fn_log(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0).ln()))
}

/// EXP(number) - e raised to a power
pub fn fn_exp(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0).exp()))
}

/// SIN(radians)
pub fn fn_sin(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0).sin()))
}

/// COS(radians)
pub fn fn_cos(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0).cos()))
}

/// TAN(radians)
pub fn fn_tan(args: &[Value], _rng: &mut dyn RngCore) -> FormulaResult<Value> {
    Ok(Value::Number(number_arg(args, 0).tan()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionImpl;
    use rand::rngs::mock::StepRng;

    fn call(f: FunctionImpl, x: f64) -> f64 {
        let mut rng = StepRng::new(0, 1);
        f(&[Value::Number(x)], &mut rng).unwrap().as_number()
    }

    #[test]
    fn test_round() {
        assert_eq!(call(fn_round, 2.4), 2.0);
        assert_eq!(call(fn_round, 2.5), 3.0);
        assert_eq!(call(fn_round, -2.5), -2.0);
        assert_eq!(call(fn_round, -2.6), -3.0);
        assert_eq!(call(fn_round, 7.0), 7.0);
    }

    #[test]
    fn test_transcendental() {
        assert_eq!(call(fn_log, 1.0), 0.0);
        assert!((call(fn_log, std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert!(call(fn_log, -1.0).is_nan());
        assert_eq!(call(fn_exp, 0.0), 1.0);
        assert_eq!(call(fn_sin, 0.0), 0.0);
        assert_eq!(call(fn_cos, 0.0), 1.0);
        assert!((call(fn_tan, std::f64::consts::FRAC_PI_4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_boolean_argument_coerces() {
        let mut rng = StepRng::new(0, 1);
        let result = fn_exp(&[Value::Boolean(false)], &mut rng).unwrap();
        assert_eq!(result, Value::Number(1.0));
    }
}
