//! Rule literals and the shortcut parser
//!
//! A [`Rule`] is the compact form a caller writes next to a field: a value
//! kind, a pattern string, a `(min, max)` pair, a function with bound
//! arguments, or a list of any of these. [`condition`] normalizes a rule into
//! a [`Constraint`].
//!
//! | Literal                               | Constraint                          |
//! |---------------------------------------|-------------------------------------|
//! | `Constraint`                          | unchanged                           |
//! | `Kind(k)`                             | `TypeConstraint(k)`                 |
//! | `Function(f)`                         | `PredicateConstraint(f)`            |
//! | `Text(p)`                             | `PatternConstraint(p)` (fullmatch)  |
//! | `Tuple` of kinds                      | `TypeConstraint(k1, k2, ..)`        |
//! | `(number, number[, bool])`            | `RangeConstraint`                   |
//! | `(function, args[, keywords])`        | `PredicateConstraint` with args     |
//! | `(text, mode[, integer flags])`       | `PatternConstraint`                 |
//! | other `Tuple`, `List`                 | AND of every element                |
//!
//! An unresolved sequence is never read as OR.

use crate::constraint::{
    Arguments, Constraint, MatchMode, PatternConstraint, PatternFlags, PredicateConstraint,
    RangeBound, RangeConstraint, TypeConstraint, ValueKind,
};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;

// =============================================================================
// Rule Literal
// =============================================================================

/// Unparsed rule literal
#[derive(Debug, Clone)]
pub enum Rule {
    /// Already a constraint
    Constraint(Constraint),
    /// Value kind ("type")
    Kind(ValueKind),
    /// Callable
    Function(PredicateConstraint),
    /// Pattern, or a match mode inside a tuple
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
    /// Open bound inside a range tuple
    Unset,
    /// Positional arguments for a function tuple
    Args(Vec<Value>),
    /// Keyword arguments for a function tuple
    Keywords(IndexMap<String, Value>),
    /// Fixed-size sequence, resolved through the tuple shortcuts
    Tuple(Vec<Rule>),
    /// Sequence of sub-rules, always AND-folded
    List(Vec<Rule>),
}

impl Rule {
    /// Callable literal
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Arguments) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        Rule::Function(PredicateConstraint::new(name, func))
    }

    pub fn tuple(items: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Rule>) -> Self {
        Rule::List(items.into_iter().collect())
    }

    pub fn args(values: impl IntoIterator<Item = Value>) -> Self {
        Rule::Args(values.into_iter().collect())
    }

    pub fn keywords<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Rule::Keywords(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Plain data carried by this literal, if any
    fn as_value(&self) -> Option<Value> {
        match self {
            Rule::Text(s) => Some(Value::String(s.clone())),
            Rule::Integer(i) => Some(Value::from(*i)),
            Rule::Number(n) => Number::from_f64(*n).map(Value::Number),
            Rule::Bool(b) => Some(Value::Bool(*b)),
            Rule::Unset => Some(Value::Null),
            Rule::Args(values) => Some(Value::Array(values.clone())),
            Rule::Keywords(map) => Some(Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
            Rule::Tuple(items) | Rule::List(items) => items
                .iter()
                .map(Rule::as_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Rule::Constraint(_) | Rule::Kind(_) | Rule::Function(_) => None,
        }
    }

    /// Positional arguments if this literal is iterable plain data
    fn as_positional(&self) -> Option<Vec<Value>> {
        match self {
            Rule::Args(values) => Some(values.clone()),
            Rule::Tuple(items) | Rule::List(items) => {
                items.iter().map(Rule::as_value).collect()
            }
            _ => None,
        }
    }

    /// Numeric bound: `Some(None)` for an open bound, `None` if not numeric
    fn as_bound(&self) -> Option<Option<RangeBound>> {
        match self {
            Rule::Integer(i) => Some(Some(RangeBound::Int(*i))),
            Rule::Number(n) => Some(Some(RangeBound::Float(*n))),
            Rule::Unset => Some(None),
            _ => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(items: &[Rule]) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Rule::Constraint(c) => write!(f, "{c}"),
            Rule::Kind(kind) => write!(f, "{kind}"),
            Rule::Function(p) => write!(f, "fn {}", p.name()),
            Rule::Text(s) => write!(f, "\"{s}\""),
            Rule::Integer(i) => write!(f, "{i}"),
            Rule::Number(n) => write!(f, "{n}"),
            Rule::Bool(b) => write!(f, "{b}"),
            Rule::Unset => f.write_str("unset"),
            Rule::Args(_) | Rule::Keywords(_) => {
                write!(f, "{}", self.as_value().unwrap_or(Value::Null))
            }
            Rule::Tuple(items) => write!(f, "({})", join(items)),
            Rule::List(items) => write!(f, "[{}]", join(items)),
        }
    }
}

impl From<Constraint> for Rule {
    fn from(c: Constraint) -> Self {
        Rule::Constraint(c)
    }
}

impl From<ValueKind> for Rule {
    fn from(kind: ValueKind) -> Self {
        Rule::Kind(kind)
    }
}

impl From<PredicateConstraint> for Rule {
    fn from(p: PredicateConstraint) -> Self {
        Rule::Function(p)
    }
}

impl From<crate::constraint::DeferredConstraint> for Rule {
    fn from(d: crate::constraint::DeferredConstraint) -> Self {
        Rule::Constraint(d.into())
    }
}

impl From<&str> for Rule {
    fn from(s: &str) -> Self {
        Rule::Text(s.to_string())
    }
}

impl From<String> for Rule {
    fn from(s: String) -> Self {
        Rule::Text(s)
    }
}

impl From<i32> for Rule {
    fn from(i: i32) -> Self {
        Rule::Integer(i64::from(i))
    }
}

impl From<i64> for Rule {
    fn from(i: i64) -> Self {
        Rule::Integer(i)
    }
}

impl From<f64> for Rule {
    fn from(n: f64) -> Self {
        Rule::Number(n)
    }
}

impl From<bool> for Rule {
    fn from(b: bool) -> Self {
        Rule::Bool(b)
    }
}

impl From<Vec<Rule>> for Rule {
    fn from(items: Vec<Rule>) -> Self {
        Rule::List(items)
    }
}

impl<A: Into<Rule>, B: Into<Rule>> From<(A, B)> for Rule {
    fn from((a, b): (A, B)) -> Self {
        Rule::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Rule>, B: Into<Rule>, C: Into<Rule>> From<(A, B, C)> for Rule {
    fn from((a, b, c): (A, B, C)) -> Self {
        Rule::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Convert a rule literal into a constraint
///
/// # Errors
///
/// Returns a rule parse error for literals that have no constraint meaning on
/// their own (a bare number, an argument list), empty sequences, and invalid
/// patterns or match modes.
///
/// # Example
///
/// ```
/// use cfgrules::{condition, Rule, ValueKind};
/// use serde_json::json;
///
/// let range = condition((5, 10))?;
/// assert!(range.matches(&json!(7))?);
/// assert!(!range.matches(&json!(10))?);
///
/// let kinds = condition(Rule::tuple([Rule::Kind(ValueKind::Integer), Rule::Kind(ValueKind::Float)]))?;
/// assert!(kinds.matches(&json!(2.5))?);
/// # Ok::<(), cfgrules::Error>(())
/// ```
pub fn condition(rule: impl Into<Rule>) -> Result<Constraint> {
    parse(rule.into())
}

fn parse(rule: Rule) -> Result<Constraint> {
    match rule {
        Rule::Constraint(c) => Ok(c),
        Rule::Kind(kind) => Ok(TypeConstraint::new([kind]).into()),
        Rule::Function(p) => Ok(p.into()),
        Rule::Text(pattern) => Ok(PatternConstraint::new(pattern)?.into()),
        Rule::Tuple(items) => match shortcut(&items)? {
            Some(c) => Ok(c),
            None => fold(items, Constraint::and),
        },
        Rule::List(items) => fold(items, Constraint::and),
        other => Err(Error::UnsupportedRule(other.to_string())),
    }
}

/// Resolve a tuple literal through the known shortcut shapes
///
/// Returns `Ok(None)` when the tuple matches no shape; the caller then treats
/// it as a list of sub-rules.
///
/// # Errors
///
/// Returns [`Error::InvalidRule`] for an empty tuple, and pattern errors when a
/// `(text, mode[, flags])` tuple cannot be compiled.
pub fn shortcut(items: &[Rule]) -> Result<Option<Constraint>> {
    match items {
        [] => Err(Error::InvalidRule {
            rule: "()".into(),
            reason: "at least one rule is required".into(),
        }),
        [only] => parse(only.clone()).map(Some),
        _ if items.iter().all(|r| matches!(r, Rule::Kind(_))) => {
            let kinds = items.iter().filter_map(|r| match r {
                Rule::Kind(kind) => Some(*kind),
                _ => None,
            });
            Ok(Some(TypeConstraint::new(kinds).into()))
        }
        [first, second] => resolve(first, second, None),
        [first, second, third] => resolve(first, second, Some(third)),
        _ => Ok(None),
    }
}

fn resolve(first: &Rule, second: &Rule, third: Option<&Rule>) -> Result<Option<Constraint>> {
    if let Some(range) = range_shortcut(first, second, third) {
        return Ok(Some(range.into()));
    }
    if let Some(predicate) = function_shortcut(first, second, third) {
        return Ok(Some(predicate.into()));
    }
    pattern_shortcut(first, second, third).map(|p| p.map(Constraint::from))
}

fn range_shortcut(first: &Rule, second: &Rule, third: Option<&Rule>) -> Option<RangeConstraint> {
    let min = first.as_bound()?;
    let max = second.as_bound()?;
    let allow_equals = match third {
        None => false,
        Some(Rule::Bool(b)) => *b,
        Some(_) => return None,
    };
    Some(RangeConstraint::new(min, max).allow_equals(allow_equals))
}

fn function_shortcut(
    first: &Rule,
    second: &Rule,
    third: Option<&Rule>,
) -> Option<PredicateConstraint> {
    let Rule::Function(predicate) = first else {
        return None;
    };
    let positional = second.as_positional()?;
    let keyword = match third {
        None => IndexMap::new(),
        Some(Rule::Keywords(map)) => map.clone(),
        Some(_) => return None,
    };
    Some(
        predicate
            .clone()
            .with_arguments(Arguments::new(positional, keyword)),
    )
}

fn pattern_shortcut(
    first: &Rule,
    second: &Rule,
    third: Option<&Rule>,
) -> Result<Option<PatternConstraint>> {
    let (Rule::Text(pattern), Rule::Text(mode)) = (first, second) else {
        return Ok(None);
    };
    let bits = match third {
        None => 0,
        Some(Rule::Integer(bits)) => u32::try_from(*bits).map_err(|_| Error::InvalidRule {
            rule: format!("flags={bits}"),
            reason: "flags must be a non-negative 32-bit integer".into(),
        })?,
        Some(_) => return Ok(None),
    };
    let mode: MatchMode = mode.parse()?;
    PatternConstraint::with_options(pattern.clone(), mode, PatternFlags::from_bits(bits)?)
        .map(Some)
}

fn fold(items: Vec<Rule>, join: fn(Constraint, Constraint) -> Constraint) -> Result<Constraint> {
    let mut iter = items.into_iter();
    let first = iter.next().ok_or_else(|| Error::InvalidRule {
        rule: "[]".into(),
        reason: "at least one rule is required".into(),
    })?;
    iter.try_fold(parse(first)?, |acc, rule| Ok(join(acc, parse(rule)?)))
}

/// AND of every rule, left to right
///
/// # Errors
///
/// Propagates parse errors of any sub-rule; an empty input is an error.
pub fn and(rules: impl IntoIterator<Item = Rule>) -> Result<Constraint> {
    condition(Rule::list(rules))
}

/// OR of every rule, left to right
///
/// # Errors
///
/// Propagates parse errors of any sub-rule; an empty input is an error.
pub fn or(rules: impl IntoIterator<Item = Rule>) -> Result<Constraint> {
    fold(rules.into_iter().collect(), Constraint::or)
}

// =============================================================================
// Tests
// =============================================================================
