//! Validation Workflow Integration Tests
//!
//! Tests for the complete validation lifecycle including:
//! - Diagnostics for every rule literal shape
//! - Required, final and disabled fields
//! - Deferred constraints bound to the validation environment
//! - Update modes and closing a scope

mod common;

use cfgrules::{
    CloseOptions, Context, ContextResolver, DeferredConstraint, Error, RulesRef, Ruleset,
    ValueKind, condition,
};
use common::{fixture_rules, init_logger, passing_values, values};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn fixture_context(configs: indexmap::IndexMap<String, serde_json::Value>) -> Context {
    Context::builder(configs)
        .tag("rule_fail")
        .rules(fixture_rules())
        .build()
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_passing_values_produce_no_diagnostics() {
    init_logger();
    let context = fixture_context(passing_values());
    assert_eq!(context.validate().unwrap(), Vec::<String>::new());
    assert!(context.check().is_ok());
}

#[test]
fn test_each_failure_is_reported_in_configuration_order() {
    init_logger();
    let context = fixture_context(values(&[
        ("FINAL", json!(11)),
        ("NOT_ALLOWED", json!(1)),
        ("test_type", json!("x")),
        ("test_func", json!(3)),
        ("test_pattern", json!("abcx")),
        ("test_range_2", json!(5)),
        ("test_or", json!("3")),
    ]));

    assert_eq!(
        context.validate().unwrap(),
        [
            "[FINAL] is final",
            "[NOT_ALLOWED] is not allowed",
            "[test_type] should match one of the types in (int)",
            "[test_func] failed predicate above_five",
            "[test_pattern] should match pattern \"abc[d|e]\" (f=fullmatch, flags=0)",
            "[test_range_2] should be in range (5, 10)",
            "[test_or] BEGIN_OR",
            "[test_or] should match one of the types in (int)",
            "[test_or] OR",
            "[test_or] should match one of the types in (float)",
            "[test_or] END_OR",
            "[port] missing required configuration",
        ]
    );
}

#[test]
fn test_and_reports_only_failing_sub_rules() {
    let context = fixture_context(values(&[
        ("port", json!(1)),
        ("test_multiple_and", json!(12)),
        ("test_nested", json!(7)),
    ]));

    assert_eq!(
        context.validate().unwrap(),
        [
            "[test_multiple_and] failed predicate below_ten",
            "[test_nested] failed predicate is_six",
        ]
    );
}

#[test]
fn test_predicate_error_becomes_diagnostic() {
    let context = fixture_context(values(&[("port", json!(1)), ("test_func_s", json!("11"))]));
    assert_eq!(
        context.validate().unwrap(),
        ["[test_func_s] 'str' is not comparable"]
    );
}

#[test]
#[should_panic(expected = "first element")]
fn test_panicking_predicate_is_not_captured() {
    let first_is_zero = cfgrules::Rule::function("first_is_zero", |v, _| {
        let first = v.as_array().and_then(|items| items.first()).expect("first element");
        Ok(first == &json!(0))
    });
    let context = Context::builder(values(&[("list", json!("not a list"))]))
        .rules(Ruleset::new().rule("list", first_is_zero))
        .build();
    let _ = context.validate();
}

#[test]
fn test_validate_is_idempotent() {
    let context = fixture_context(values(&[("test_type", json!(1.5)), ("test_or", json!(null))]));
    let first = context.validate().unwrap();
    let second = context.validate().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[test]
fn test_required_field_scenario() {
    let context = Context::builder(values(&[]))
        .rules(Ruleset::new().required("port"))
        .build();
    assert_eq!(
        context.validate().unwrap(),
        ["[port] missing required configuration"]
    );
}

#[test]
fn test_disabled_by_default() {
    let context = Context::builder(values(&[("known", json!(1)), ("unknown", json!(2))]))
        .rules(Ruleset::new().rule("known", ValueKind::Integer))
        .default_rule(cfgrules::DISABLED)
        .build();
    assert_eq!(context.validate().unwrap(), ["[unknown] is not allowed"]);
}

// =============================================================================
// Deferred Constraints
// =============================================================================

fn matches_default() -> DeferredConstraint {
    DeferredConstraint::new("matches_default", |value, _, env| {
        Ok(env.default == Some(value))
    })
}

#[test]
fn test_deferred_compares_with_declared_default() {
    let rules = Ruleset::new()
        .rule("level", matches_default())
        .default_value("level", json!(3));

    let same = Context::builder(values(&[("level", json!(3))]))
        .rules(rules.clone())
        .build();
    assert!(same.validate().unwrap().is_empty());

    let differing = Context::builder(values(&[("level", json!(4))]))
        .rules(rules)
        .build();
    assert_eq!(
        differing.validate().unwrap(),
        ["[level] failed predicate matches_default"]
    );
}

#[test]
fn test_deferred_inside_tree_sees_environment() {
    let tree = condition(ValueKind::Integer)
        .unwrap()
        .and(matches_default().into());
    let rules = Ruleset::new()
        .rule("level", tree)
        .default_value("level", json!(3));

    let context = Context::builder(values(&[("level", json!("3"))]))
        .rules(rules)
        .build();
    assert_eq!(
        context.validate().unwrap(),
        [
            "[level] should match one of the types in (int)",
            "[level] failed predicate matches_default",
        ]
    );
}

#[test]
fn test_bare_deferred_without_environment_is_usage_error() {
    let deferred = condition(matches_default()).unwrap();
    let err = deferred.check(&json!(3)).unwrap_err();
    assert!(err.is_usage_error());
    assert!(matches!(err, Error::EnvironmentNotBound(ref name) if name == "matches_default"));
}

// =============================================================================
// Update and Close
// =============================================================================

#[test]
fn test_update_modes() {
    let mut context = Context::from_values(values(&[("a", json!(1)), ("b", json!(2))]));

    context.update(values(&[("a", json!(1)), ("b", json!(3))]), false);
    assert_eq!(context.configs(), &values(&[("b", json!(3))]));

    context.update(values(&[("c", json!(4))]), true);
    assert_eq!(context.configs(), &values(&[("b", json!(3)), ("c", json!(4))]));
    assert!(context.is_updated());
}

#[test]
fn test_close_reports_aggregate_error() {
    init_logger();
    let mut context = Context::builder(values(&[])).tag("rule_fail").build();
    let err = context
        .close(
            values(&[("test_type", json!("x"))]),
            CloseOptions::new().rules(fixture_rules()),
        )
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Configuration at rule_fail breaks rules\n\
         [test_type] should match one of the types in (int)\n\
         [port] missing required configuration"
    );
    assert_eq!(err.diagnostics().len(), 2);
}

#[test]
fn test_close_twice_requires_force() {
    let mut context = Context::builder(values(&[])).tag("server").build();
    context
        .close(values(&[("port", json!(80))]), CloseOptions::new())
        .unwrap();

    let err = context
        .close(values(&[("port", json!(81))]), CloseOptions::new())
        .unwrap_err();
    assert!(err.is_usage_error());

    context
        .close(
            values(&[("port", json!(81))]),
            CloseOptions::new()
                .force(true)
                .rules(Ruleset::new().rule("port", ValueKind::Integer)),
        )
        .unwrap();
}

#[test]
fn test_close_resolves_named_rules() {
    let mut registry: HashMap<String, Arc<Context>> = HashMap::new();
    let declared = Context::builder(values(&[("port", json!(8080))]))
        .tag("defaults")
        .rule("port", (1024, 65536))
        .required("port")
        .build();
    registry.insert("defaults".into(), Arc::new(declared));
    assert!(registry.resolve("defaults").is_some());

    let mut context = Context::builder(values(&[])).tag("app").build();
    let err = context
        .close_with(
            values(&[("port", json!(80))]),
            CloseOptions::new().rules(RulesRef::named("defaults")),
            &registry,
        )
        .unwrap_err();
    assert_eq!(err.diagnostics(), ["[port] should be in range (1024, 65536)"]);
}
