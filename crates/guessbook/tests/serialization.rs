//! JSON shape of simulation results handed to a host UI

#![cfg(feature = "serde")]

use guessbook::prelude::*;
use serde_json::json;

#[test]
fn test_results_serialize() {
    let doc = Document::parse("[x = 1]\n[y = x * 2]");
    let results = generate_results(&doc, 2, Some("y")).unwrap();

    let value = serde_json::to_value(&results).unwrap();
    assert_eq!(
        value["samples"],
        json!([
            { "name": "x", "values": [1.0, 1.0] },
            { "name": "y", "values": [2.0, 2.0] },
        ])
    );
    // x is constant, so no regression is defined for it
    assert_eq!(value["sensitivities"], json!([]));
    assert_eq!(value["stats"]["cells"], json!(2));
}

#[test]
fn test_sensitivity_record_uses_camel_case() {
    let record = SensitivityRecord {
        slope: 2.0,
        intercept: 0.0,
        r_squared: 1.0,
        beta: 1.0,
    };
    assert_eq!(
        serde_json::to_value(record).unwrap(),
        json!({ "slope": 2.0, "intercept": 0.0, "rSquared": 1.0, "beta": 1.0 })
    );
}
