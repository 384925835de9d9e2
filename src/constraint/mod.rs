//! Constraint algebra
//!
//! A [`Constraint`] is a composable matcher over a configuration value.
//! Checking one never mutates it: every call returns a fresh [`Outcome`]
//! carrying pass/fail and the collected diagnostics, so a single rule tree
//! can be shared between threads and validation passes.
//!
//! - Leaf kinds: [`TypeConstraint`], [`RangeConstraint`], [`PatternConstraint`],
//!   [`PredicateConstraint`]
//! - [`DeferredConstraint`] - predicate that reads the validation environment
//! - [`TreeConstraint`] - binary AND/OR node built with [`Constraint::and`] and
//!   [`Constraint::or`]

mod leaf;
mod predicate;

pub use leaf::{
    MatchMode, PatternConstraint, PatternFlags, RangeBound, RangeConstraint, TypeConstraint,
    ValueKind,
};
pub use predicate::{
    Arguments, DeferredConstraint, DeferredFn, PredicateConstraint, PredicateFn,
};

use crate::context::Environment;
use crate::error::Result;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

// =============================================================================
// Markers and Constants
// =============================================================================

/// Opens the diagnostics of a failed OR node
pub const OR_BEGIN: &str = "BEGIN_OR";
/// Separates the two branches of a failed OR node
pub const OR_SEPARATOR: &str = "OR";
/// Closes the diagnostics of a failed OR node
pub const OR_END: &str = "END_OR";

/// Always passes
pub const ALLOW: Constraint = Constraint::Allow;
/// Always fails with `is final`
pub const FINAL: Constraint = Constraint::Deny(Cow::Borrowed("is final"));
/// Always fails with `is not allowed`
pub const DISABLED: Constraint = Constraint::Deny(Cow::Borrowed("is not allowed"));

// =============================================================================
// Outcome
// =============================================================================

/// Result of checking one value against a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    passed: bool,
    messages: Vec<String>,
}

impl Outcome {
    /// Passing outcome with no diagnostics
    pub fn pass() -> Self {
        Self {
            passed: true,
            messages: Vec::new(),
        }
    }

    /// Failing outcome carrying `messages`
    pub fn fail(messages: Vec<String>) -> Self {
        Self {
            passed: false,
            messages,
        }
    }

    /// Whether the value satisfied the constraint
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Diagnostics in evaluation order, empty on pass
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Take the diagnostics out of the outcome
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Turn a leaf test result into an outcome, describing the constraint on failure
pub(crate) fn judge(
    result: std::result::Result<bool, String>,
    describe: impl FnOnce() -> String,
) -> Outcome {
    match result {
        Ok(true) => Outcome::pass(),
        Ok(false) => Outcome::fail(vec![describe()]),
        Err(err) => Outcome::fail(vec![err, describe()]),
    }
}

// =============================================================================
// Constraint
// =============================================================================

/// A composable rule over a single configuration value
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Always passes
    Allow,
    /// Always fails with a fixed message
    Deny(Cow<'static, str>),
    Type(TypeConstraint),
    Range(RangeConstraint),
    Pattern(PatternConstraint),
    Predicate(PredicateConstraint),
    Deferred(DeferredConstraint),
    Tree(Box<TreeConstraint>),
}

impl Constraint {
    /// Constraint that always fails with the given message
    pub fn deny(message: impl Into<String>) -> Self {
        Constraint::Deny(Cow::Owned(message.into()))
    }

    /// Check a value that needs no environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotBound`](crate::Error::EnvironmentNotBound)
    /// if the constraint contains a deferred node.
    pub fn check(&self, value: &Value) -> Result<Outcome> {
        self.check_in(value, None)
    }

    /// Check a value, threading `env` to every deferred node of the tree
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotBound`](crate::Error::EnvironmentNotBound)
    /// if a deferred node is reached while `env` is `None`.
    pub fn check_in(&self, value: &Value, env: Option<&Environment<'_>>) -> Result<Outcome> {
        let outcome = match self {
            Constraint::Allow => Outcome::pass(),
            Constraint::Deny(message) => Outcome::fail(vec![message.to_string()]),
            Constraint::Type(c) => c.evaluate(value),
            Constraint::Range(c) => c.evaluate(value),
            Constraint::Pattern(c) => c.evaluate(value),
            Constraint::Predicate(c) => c.check(value),
            Constraint::Deferred(c) => return c.check(value, env),
            Constraint::Tree(tree) => return tree.evaluate(value, env),
        };
        Ok(outcome)
    }

    /// Shorthand for `check(value)?.passed()`
    pub fn matches(&self, value: &Value) -> Result<bool> {
        Ok(self.check(value)?.passed())
    }

    /// Combine with AND: both sides must pass
    #[must_use]
    pub fn and(self, other: Constraint) -> Constraint {
        Constraint::Tree(Box::new(TreeConstraint::new(Operator::And, self, other)))
    }

    /// Combine with OR: at least one side must pass
    #[must_use]
    pub fn or(self, other: Constraint) -> Constraint {
        Constraint::Tree(Box::new(TreeConstraint::new(Operator::Or, self, other)))
    }

    /// Whether a deferred node appears anywhere in this constraint
    pub fn is_deferred(&self) -> bool {
        match self {
            Constraint::Deferred(_) => true,
            Constraint::Tree(tree) => tree.left.is_deferred() || tree.right.is_deferred(),
            _ => false,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Allow => f.write_str("allow"),
            Constraint::Deny(message) => write!(f, "deny(\"{message}\")"),
            Constraint::Type(c) => write!(f, "{c}"),
            Constraint::Range(c) => write!(f, "{c}"),
            Constraint::Pattern(c) => write!(f, "{c}"),
            Constraint::Predicate(c) => write!(f, "{c}"),
            Constraint::Deferred(c) => write!(f, "{c}"),
            Constraint::Tree(tree) => write!(f, "{tree}"),
        }
    }
}

impl From<TypeConstraint> for Constraint {
    fn from(c: TypeConstraint) -> Self {
        Constraint::Type(c)
    }
}

impl From<RangeConstraint> for Constraint {
    fn from(c: RangeConstraint) -> Self {
        Constraint::Range(c)
    }
}

impl From<PatternConstraint> for Constraint {
    fn from(c: PatternConstraint) -> Self {
        Constraint::Pattern(c)
    }
}

impl From<PredicateConstraint> for Constraint {
    fn from(c: PredicateConstraint) -> Self {
        Constraint::Predicate(c)
    }
}

impl From<DeferredConstraint> for Constraint {
    fn from(c: DeferredConstraint) -> Self {
        Constraint::Deferred(c)
    }
}

// =============================================================================
// Tree Combinator
// =============================================================================

/// Boolean operator of a [`TreeConstraint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

/// Binary AND/OR composition of two constraints
#[derive(Debug, Clone)]
pub struct TreeConstraint {
    op: Operator,
    left: Constraint,
    right: Constraint,
}

impl TreeConstraint {
    pub fn new(op: Operator, left: Constraint, right: Constraint) -> Self {
        Self { op, left, right }
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn left(&self) -> &Constraint {
        &self.left
    }

    pub fn right(&self) -> &Constraint {
        &self.right
    }

    /// OR returns as soon as one side passes. AND always evaluates both sides
    /// so every failing branch reports.
    fn evaluate(&self, value: &Value, env: Option<&Environment<'_>>) -> Result<Outcome> {
        let left = self.left.check_in(value, env)?;
        if left.passed && self.op == Operator::Or {
            return Ok(Outcome::pass());
        }

        let right = self.right.check_in(value, env)?;
        if right.passed && self.op == Operator::Or {
            return Ok(Outcome::pass());
        }

        match self.op {
            Operator::Or => {
                let mut messages =
                    Vec::with_capacity(left.messages.len() + right.messages.len() + 3);
                messages.push(OR_BEGIN.to_string());
                messages.extend(left.messages);
                messages.push(OR_SEPARATOR.to_string());
                messages.extend(right.messages);
                messages.push(OR_END.to_string());
                Ok(Outcome::fail(messages))
            }
            Operator::And => {
                if left.passed && right.passed {
                    return Ok(Outcome::pass());
                }
                let messages = [left, right]
                    .into_iter()
                    .filter(|side| !side.passed)
                    .flat_map(Outcome::into_messages)
                    .collect();
                Ok(Outcome::fail(messages))
            }
        }
    }
}

impl fmt::Display for TreeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Operator::And => "&",
            Operator::Or => "|",
        };
        write!(f, "({} {op} {})", self.left, self.right)
    }
}

// =============================================================================
// Tests
// =============================================================================
