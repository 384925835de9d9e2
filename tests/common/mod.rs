//! Common test utilities for cfgrules integration tests
//!
//! Provides a ruleset covering every rule literal shape and value sets that
//! pass or break it.

#![allow(dead_code)]

use cfgrules::{
    Constraint, DISABLED, FINAL, RangeConstraint, Rule, Ruleset, ValueKind, and, or,
};
use indexmap::IndexMap;
use serde_json::{Value, json};

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a configuration mapping, keeping the given order
pub fn values(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Predicates
// =============================================================================

pub fn above_five() -> Rule {
    Rule::function("above_five", |v, _| Ok(v.as_f64().is_some_and(|v| v > 5.0)))
}

pub fn below_ten() -> Rule {
    Rule::function("below_ten", |v, _| Ok(v.as_f64().is_some_and(|v| v < 10.0)))
}

pub fn is_six() -> Rule {
    Rule::function("is_six", |v, _| Ok(v == &json!(6)))
}

/// `x > y` where `y` is the first positional argument or the `y` keyword
pub fn greater_than() -> Rule {
    Rule::function("greater_than", |v, args| {
        let bound = args
            .arg(0)
            .or_else(|| args.kwarg("y"))
            .and_then(Value::as_f64)
            .ok_or_else(|| "greater_than needs a bound".to_string())?;
        let value = v
            .as_f64()
            .ok_or_else(|| format!("'{}' is not comparable", ValueKind::of(v)))?;
        Ok(value > bound)
    })
}

fn int() -> Rule {
    Rule::Kind(ValueKind::Integer)
}

fn float() -> Rule {
    Rule::Kind(ValueKind::Float)
}

fn string() -> Rule {
    Rule::Kind(ValueKind::String)
}

// =============================================================================
// Fixture Ruleset
// =============================================================================

/// One field per rule literal shape
pub fn fixture_rules() -> Ruleset {
    let or_int_float = || or([int(), float()]).unwrap();

    Ruleset::named("fixture")
        .required("Required")
        .required("Mandatory")
        .rule("FINAL", FINAL)
        .default_value("FINAL", json!(10))
        .rule("NOT_ALLOWED", DISABLED)
        .rule("test_type", int())
        .rule("test_func", above_five())
        .rule("test_pattern", "abc[d|e]")
        .rule("test_multiple_and", vec![int(), above_five(), below_ten()])
        .rule("test_range_0", Constraint::from(RangeConstraint::between(5.0, 10.0)))
        .rule("test_range_1", Constraint::from(RangeConstraint::at_least(5.0)))
        .rule("test_types", Rule::tuple([int(), float(), string()]))
        .rule("test_range_2", (5, 10))
        .rule("test_range_3", (5, 10, true))
        .rule(
            "test_func_s",
            Rule::tuple([greater_than(), Rule::tuple([Rule::Integer(10)])]),
        )
        .rule(
            "test_func_s1",
            Rule::tuple([
                greater_than(),
                Rule::list([]),
                Rule::keywords([("y", json!(10))]),
            ]),
        )
        .rule("test_pattern_s", Rule::tuple([Rule::from("abc[d|e]")]))
        .rule("test_pattern_s1", ("abc[d|e]", "match"))
        .rule("test_or", or_int_float())
        .rule("test_and", and([int(), Rule::from((5, 10))]).unwrap())
        .rule(
            "test_nested",
            vec![Rule::from(or_int_float()), Rule::from((5, 10)), is_six()],
        )
        .rule(
            "test_nested_1",
            vec![
                Rule::from(or([int(), Rule::from(or([float(), string()]).unwrap())]).unwrap()),
                Rule::from((5, 10)),
            ],
        )
        .required("port")
}

/// Values satisfying every rule of [`fixture_rules`]
pub fn passing_values() -> IndexMap<String, Value> {
    values(&[
        ("port", json!(8080)),
        ("test_type", json!(1)),
        ("test_func", json!(6)),
        ("test_pattern", json!("abcd")),
        ("test_multiple_and", json!(7)),
        ("test_range_0", json!(7)),
        ("test_range_1", json!(100)),
        ("test_types", json!("s")),
        ("test_range_2", json!(6)),
        ("test_range_3", json!(10)),
        ("test_func_s", json!(11)),
        ("test_func_s1", json!(11)),
        ("test_pattern_s", json!("abce")),
        ("test_pattern_s1", json!("abcdzz")),
        ("test_or", json!(3.5)),
        ("test_and", json!(7)),
        ("test_nested", json!(6)),
        ("test_nested_1", json!(7)),
    ])
}
