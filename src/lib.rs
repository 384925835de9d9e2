//! # cfgrules - declarative rules for configuration values
//!
//! Validate a named set of configuration values against composable rules and
//! get back every problem at once, as readable diagnostics, instead of failing
//! on the first one.
//!
//! ## Features
//!
//! - **Constraint algebra**: type membership, numeric ranges, regex patterns and
//!   arbitrary predicates, combined with short-circuiting AND/OR trees
//! - **Rule literals**: compact forms such as `(1024, 65536)` or
//!   `("[a-z]+", "match")` normalized by [`condition`]
//! - **Deferred constraints**: predicates that see the field's declared
//!   default and both contexts at validation time
//! - **Contexts**: configuration plus rules reference, with update tracking,
//!   required fields and a fail-fast [`Context::close`]
//! - **Snapshots**: serializable view of a context, written atomically
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgrules::{Context, Ruleset, ValueKind, DISABLED};
//! use indexmap::IndexMap;
//! use serde_json::json;
//!
//! let rules = Ruleset::named("server")
//!     .rule("port", (1024, 65536))
//!     .required("port")
//!     .rule("host", ValueKind::String)
//!     .rule("legacy_mode", DISABLED);
//!
//! let mut values = IndexMap::new();
//! values.insert("host".to_string(), json!("localhost"));
//! values.insert("legacy_mode".to_string(), json!(true));
//!
//! let context = Context::builder(values).tag("app").rules(rules).build();
//! assert_eq!(
//!     context.validate()?,
//!     [
//!         "[legacy_mode] is not allowed",
//!         "[port] missing required configuration",
//!     ]
//! );
//! # Ok::<(), cfgrules::Error>(())
//! ```
//!
//! ## Composing Constraints
//!
//! ```rust
//! use cfgrules::{and, or, Rule, ValueKind};
//! use serde_json::json;
//!
//! let above_five = Rule::function("above_five", |v, _| Ok(v.as_f64().is_some_and(|v| v > 5.0)));
//! let rule = and([Rule::Kind(ValueKind::Integer), above_five])?;
//! assert!(rule.matches(&json!(7))?);
//! assert_eq!(rule.check(&json!(3))?.messages(), ["failed predicate above_five"]);
//!
//! let numeric = or([Rule::Kind(ValueKind::Integer), Rule::Kind(ValueKind::Float)])?;
//! assert!(numeric.matches(&json!(3.0))?);
//! # Ok::<(), cfgrules::Error>(())
//! ```
//!
//! ## Fail-Fast
//!
//! [`Context::check`] and [`Context::close`] turn the diagnostic list into one
//! [`Error::RulesBroken`]:
//!
//! ```rust
//! use cfgrules::{CloseOptions, Context, Ruleset, ValueKind};
//! use indexmap::IndexMap;
//! use serde_json::json;
//!
//! let mut context = Context::builder(IndexMap::new()).tag("db").build();
//! let mut values = IndexMap::new();
//! values.insert("pool".to_string(), json!("large"));
//!
//! let err = context
//!     .close(values, CloseOptions::new().rules(Ruleset::new().rule("pool", ValueKind::Integer)))
//!     .unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Configuration at db breaks rules\n[pool] should match one of the types in (int)"
//! );
//! ```

// Core modules
mod error;
pub mod constraint;
pub mod shortcut;
pub mod storage;

// Grouped modules
pub mod config;
pub mod context;

pub use error::{Error, Result};

pub use constraint::{
    ALLOW, Arguments, Constraint, DISABLED, DeferredConstraint, FINAL, MatchMode, OR_BEGIN, OR_END,
    OR_SEPARATOR, Operator, Outcome, PatternConstraint, PatternFlags, PredicateConstraint,
    RangeBound, RangeConstraint, TreeConstraint, TypeConstraint, ValueKind,
};
pub use shortcut::{Rule, and, condition, or, shortcut};

pub use config::{
    ContextConfig, ContextConfigBuilder, FieldRequirement, MANDATORY, RESERVED_MARKERS,
    RuleSource, Ruleset,
};
pub use context::{
    CloseOptions, Context, ContextBuilder, ContextResolver, ContextSnapshot, Environment,
    MISSING_REQUIRED, RulesRef,
};
pub use storage::{JsonStorage, StorageBackend};
