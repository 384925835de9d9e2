//! Predicate constraints wrapping arbitrary functions
//!
//! A [`PredicateConstraint`] calls a function with the candidate value and a
//! set of bound [`Arguments`]. A [`DeferredConstraint`] additionally needs an
//! [`Environment`] that only exists while a context is being validated.

use super::Outcome;
use crate::context::Environment;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Type alias for a predicate function
///
/// `Err(text)` reports a failure that happened while evaluating; the text
/// becomes a diagnostic and the match counts as failed. Predicates must report
/// problems this way: a panic is not caught and unwinds out of
/// [`Context::validate`](crate::Context::validate).
pub type PredicateFn =
    Arc<dyn Fn(&Value, &Arguments) -> std::result::Result<bool, String> + Send + Sync>;

/// Type alias for a predicate function that reads the validation environment
///
/// Same contract as [`PredicateFn`]: report failures through `Err`, panics
/// propagate to the caller of the validation.
pub type DeferredFn = Arc<
    dyn Fn(&Value, &Arguments, &Environment<'_>) -> std::result::Result<bool, String>
        + Send
        + Sync,
>;

/// Positional and keyword arguments bound to a predicate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl Arguments {
    /// Bind positional and keyword arguments
    pub fn new(positional: Vec<Value>, keyword: IndexMap<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    /// Positional argument by index
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword argument by name
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// Whether no argument is bound
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

// =============================================================================
// Predicate Constraint
// =============================================================================

/// Constraint backed by a named function
#[derive(Clone)]
pub struct PredicateConstraint {
    name: String,
    func: PredicateFn,
    args: Arguments,
    message: Option<String>,
}

impl PredicateConstraint {
    /// Wrap a function under an explicit name
    ///
    /// # Example
    ///
    /// ```
    /// use cfgrules::PredicateConstraint;
    /// use serde_json::json;
    ///
    /// let positive = PredicateConstraint::new("positive", |v, _| {
    ///     v.as_f64().map(|n| n > 0.0).ok_or_else(|| "not a number".to_string())
    /// });
    /// assert!(positive.check(&json!(3)).passed());
    /// assert_eq!(positive.check(&json!(-3)).messages(), ["failed predicate positive"]);
    /// ```
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Arguments) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            args: Arguments::default(),
            message: None,
        }
    }

    /// Wrap a function, naming it after its type
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&Value, &Arguments) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<F>(), func)
    }

    /// Bind positional arguments
    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args.positional = args;
        self
    }

    /// Bind one keyword argument
    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.keyword.insert(name.into(), value);
        self
    }

    /// Replace all bound arguments
    #[must_use]
    pub fn with_arguments(mut self, args: Arguments) -> Self {
        self.args = args;
        self
    }

    /// Explicit failure message, replacing `failed predicate <name>`
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Name used in the default failure message
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound arguments
    pub fn arguments(&self) -> &Arguments {
        &self.args
    }

    /// Evaluate against a value
    pub fn check(&self, value: &Value) -> Outcome {
        settle((self.func)(value, &self.args), &self.name, self.message.as_deref())
    }
}

impl fmt::Debug for PredicateConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateConstraint")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PredicateConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "predicate({})", self.name)
    }
}

// =============================================================================
// Deferred Constraint
// =============================================================================

/// Predicate constraint that cannot run without an [`Environment`]
///
/// Validation binds the environment automatically for every field whose rule
/// contains a deferred node. Checking one outside of validation without an
/// environment is a usage error.
#[derive(Clone)]
pub struct DeferredConstraint {
    name: String,
    func: DeferredFn,
    args: Arguments,
    message: Option<String>,
}

impl DeferredConstraint {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Arguments, &Environment<'_>) -> std::result::Result<bool, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            args: Arguments::default(),
            message: None,
        }
    }

    /// Bind positional arguments
    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args.positional = args;
        self
    }

    /// Bind one keyword argument
    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.keyword.insert(name.into(), value);
        self
    }

    /// Explicit failure message, replacing `failed predicate <name>`
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Name used in the default failure message
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound arguments
    pub fn arguments(&self) -> &Arguments {
        &self.args
    }

    /// Evaluate against a value inside an environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotBound`] when `env` is `None`.
    pub fn check(&self, value: &Value, env: Option<&Environment<'_>>) -> Result<Outcome> {
        let env = env.ok_or_else(|| Error::EnvironmentNotBound(self.name.clone()))?;
        Ok(settle(
            (self.func)(value, &self.args, env),
            &self.name,
            self.message.as_deref(),
        ))
    }
}

impl fmt::Debug for DeferredConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredConstraint")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DeferredConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deferred({})", self.name)
    }
}

fn settle(
    result: std::result::Result<bool, String>,
    name: &str,
    message: Option<&str>,
) -> Outcome {
    match result {
        Ok(true) => Outcome::pass(),
        Ok(false) => Outcome::fail(vec![
            message.map_or_else(|| format!("failed predicate {name}"), str::to_string),
        ]),
        Err(err) => {
            let mut messages = vec![err];
            messages.extend(message.map(str::to_string));
            Outcome::fail(messages)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
