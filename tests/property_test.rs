//! Property tests for the constraint algebra
//!
//! - Range membership, exclusive and inclusive
//! - Range tuple literals behave like explicit range constraints
//! - Type literals admit exactly their kinds
//! - OR composition is associative in outcome

use cfgrules::{Constraint, RangeConstraint, Rule, ValueKind, condition, or};
use proptest::prelude::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::from),
        (-1000.0f64..1000.0).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
        prop::collection::vec(any::<i32>(), 0..3).prop_map(Value::from),
    ]
}

fn arb_kind() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::Null),
        Just(ValueKind::Bool),
        Just(ValueKind::Integer),
        Just(ValueKind::Float),
        Just(ValueKind::Number),
        Just(ValueKind::String),
        Just(ValueKind::Array),
        Just(ValueKind::Object),
        Just(ValueKind::Any),
    ]
}

fn kind(k: ValueKind) -> Rule {
    Rule::Kind(k)
}

/// Which kinds accept which value variants, written out independently of
/// `ValueKind::admits`
fn expected_membership(kind: ValueKind, value: &Value) -> bool {
    use ValueKind as K;
    let accepted: &[ValueKind] = match value {
        Value::Null => &[K::Null, K::Any],
        Value::Bool(_) => &[K::Bool, K::Any],
        Value::Number(n) if n.is_f64() => &[K::Float, K::Number, K::Any],
        Value::Number(_) => &[K::Integer, K::Number, K::Any],
        Value::String(_) => &[K::String, K::Any],
        Value::Array(_) => &[K::Array, K::Any],
        Value::Object(_) => &[K::Object, K::Any],
    };
    accepted.contains(&kind)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn range_membership(min in -100i64..100, span in 1i64..100, v in -300i64..300) {
        let max = min + span;
        let exclusive: Constraint = RangeConstraint::between(min, max).into();
        let inclusive: Constraint = RangeConstraint::between(min, max)
            .inclusive()
            .into();
        let value = Value::from(v);

        prop_assert_eq!(exclusive.matches(&value).unwrap(), min < v && v < max);
        prop_assert_eq!(inclusive.matches(&value).unwrap(), min <= v && v <= max);
    }

    #[test]
    fn range_tuple_matches_explicit_range(
        min in -50i64..50,
        span in 1i64..50,
        allow_equals in any::<bool>(),
        v in -120i64..120,
    ) {
        let max = min + span;
        let literal = condition((min, max, allow_equals)).unwrap();
        let explicit: Constraint = RangeConstraint::between(min, max)
            .allow_equals(allow_equals)
            .into();
        let value = Value::from(v);

        prop_assert_eq!(literal.check(&value).unwrap(), explicit.check(&value).unwrap());
    }

    #[test]
    fn type_literal_admits_its_kind(k in arb_kind(), value in arb_value()) {
        let c = condition(k).unwrap();
        prop_assert_eq!(c.matches(&value).unwrap(), expected_membership(k, &value));
    }

    #[test]
    fn or_is_associative(
        a in arb_kind(),
        b in arb_kind(),
        c in arb_kind(),
        value in arb_value(),
    ) {
        let left = or([or([kind(a), kind(b)]).unwrap().into(), kind(c)]).unwrap();
        let right = or([kind(a), or([kind(b), kind(c)]).unwrap().into()]).unwrap();

        prop_assert_eq!(
            left.matches(&value).unwrap(),
            right.matches(&value).unwrap()
        );
    }
}
