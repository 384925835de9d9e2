//! Rule declarations and context configuration
//!
//! This module contains the types a caller uses to describe what to validate:
//! - `RuleSource` - Trait for anything that declares rules and defaults
//! - `Ruleset` - Builder-style rule source
//! - `FieldRequirement` - Required/optional marker per field
//! - `ContextConfig` - Options for creating a validation context

mod schema;
mod types;

pub use schema::{FieldRequirement, MANDATORY, RESERVED_MARKERS, RuleSource, Ruleset};

pub use types::{ContextConfig, ContextConfigBuilder};
