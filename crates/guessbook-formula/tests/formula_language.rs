//! End-to-end tests for the formula language: text in, values out

use guessbook_formula::{
    evaluate, parse_formula, DefinedVariables, EvaluationContext, FormulaError, Value,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn run(formula: &str, vars: &[(&'static str, f64)]) -> Result<Value, FormulaError> {
    let defined: DefinedVariables = vars.iter().map(|(name, _)| *name).collect();
    let expr = parse_formula(formula, &defined)?;

    let mut rng = StdRng::seed_from_u64(2024);
    let mut ctx = EvaluationContext::new(&mut rng);
    for &(name, value) in vars {
        ctx.set(name, Value::Number(value));
    }
    evaluate(&expr, &mut ctx)
}

/// A formula referencing a name not yet defined never parses
#[test]
fn test_define_before_use() {
    assert_eq!(
        run("a + b", &[("a", 1.0)]),
        Err(FormulaError::UndefinedVariable("b".into()))
    );
    assert_eq!(run("a + 1", &[("a", 1.0)]), Ok(Value::Number(2.0)));
}

#[test]
fn test_spreadsheet_style_model() {
    let vars = [("price", 12.5), ("units", 8.0), ("cost", 60.0)];
    assert_eq!(
        run("price * units - cost", &vars),
        Ok(Value::Number(40.0))
    );
    assert_eq!(
        run("if(price * units > cost, 1, 0)", &vars),
        Ok(Value::Number(1.0))
    );
    assert_eq!(
        run("max(price, units, cost) / 2", &vars),
        Ok(Value::Number(30.0))
    );
}

#[test]
fn test_percentile_out_of_range_is_domain_error() {
    assert!(matches!(
        run("percentile(150, 1, 2, 3)", &[]),
        Err(FormulaError::Domain(_))
    ));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(run("1 +", &[]), Err(FormulaError::Syntax(_))));
    assert!(matches!(run("(1 + 2", &[]), Err(FormulaError::Syntax(_))));
    assert!(matches!(run("1 2", &[]), Err(FormulaError::Syntax(_))));
    assert!(matches!(run("1 $ 2", &[]), Err(FormulaError::Lex(_))));
    assert_eq!(
        run("nope(1)", &[]),
        Err(FormulaError::UnknownFunction("nope".into()))
    );
    assert!(matches!(
        run("uniform(1)", &[]),
        Err(FormulaError::ArgumentCount { actual: 1, .. })
    ));
}

#[test]
fn test_stochastic_call_stays_in_support() {
    let defined = DefinedVariables::new();
    let expr = parse_formula("uniform(3, 4) + triangular(0, 1, 2)", &defined).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let mut ctx = EvaluationContext::new(&mut rng);
    for _ in 0..1000 {
        let value = expr.calculate(&mut ctx).unwrap().as_number();
        assert!((3.0..=6.0).contains(&value), "value = {value}");
    }
}

#[test]
fn test_repr_matches_source_layout() {
    let defined: DefinedVariables = ["x", "y"].into_iter().collect();
    for source in [
        "x * 2",
        "normal(x, 1) + y",
        "NOT x > 1 AND y < 2",
        "percentile(90, x, y, 3.5)",
    ] {
        assert_eq!(parse_formula(source, &defined).unwrap().repr(), source);
    }
}
