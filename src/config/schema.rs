//! Rule sources: where a context gets its per-field rules and defaults
//!
//! # Overview
//!
//! A rules source supplies three mappings, all keyed by field name and kept in
//! declaration order:
//!
//! - **rules** - the rule literal for each field ([`Rule`])
//! - **defaults** - the declared default value of each field
//! - **requirements** - whether a field must be present ([`FieldRequirement`])
//!
//! Implement [`RuleSource`] for your own type to plug an existing declaration
//! format in, or build a [`Ruleset`] directly:
//!
//! ```
//! use cfgrules::{Ruleset, ValueKind, DISABLED};
//! use serde_json::json;
//!
//! let rules = Ruleset::new()
//!     .rule("port", (1024, 65536))
//!     .required("port")
//!     .rule("host", ValueKind::String)
//!     .default_value("host", json!("localhost"))
//!     .rule("debug", DISABLED);
//! ```

use crate::shortcut::Rule;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Field Requirement
// =============================================================================

/// Whether a declared field must appear in the configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRequirement {
    /// Missing field produces `missing required configuration`
    Required,
    #[default]
    Optional,
}

/// Alias of [`FieldRequirement::Required`]
pub const MANDATORY: FieldRequirement = FieldRequirement::Required;

/// Marker names a declaration scope may bind to the requirement markers
/// themselves; they are never treated as fields.
pub const RESERVED_MARKERS: [&str; 2] = ["Required", "Mandatory"];

// =============================================================================
// Rule Source Trait
// =============================================================================

/// Trait for types that declare rules for a configuration
pub trait RuleSource: Send + Sync {
    /// Rule literal per field
    fn rules(&self) -> IndexMap<String, Rule>;

    /// Declared default value per field
    fn defaults(&self) -> IndexMap<String, Value> {
        IndexMap::new()
    }

    /// Requirement per field; fields not listed are optional
    fn requirements(&self) -> IndexMap<String, FieldRequirement> {
        IndexMap::new()
    }

    /// Name used as the tag of the context wrapping this source
    fn name(&self) -> Option<String> {
        None
    }
}

// =============================================================================
// Ruleset
// =============================================================================

/// Plain, builder-style [`RuleSource`]
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    name: Option<String>,
    rules: IndexMap<String, Rule>,
    defaults: IndexMap<String, Value>,
    requirements: IndexMap<String, FieldRequirement>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a named ruleset
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Declare the rule of a field
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.rules.insert(field.into(), rule.into());
        self
    }

    /// Declare the default value of a field
    #[must_use]
    pub fn default_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(field.into(), value);
        self
    }

    /// Mark a field as required
    #[must_use]
    pub fn required(self, field: impl Into<String>) -> Self {
        self.requirement(field, FieldRequirement::Required)
    }

    #[must_use]
    pub fn requirement(mut self, field: impl Into<String>, requirement: FieldRequirement) -> Self {
        self.requirements.insert(field.into(), requirement);
        self
    }

    pub fn get_rule(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field)
    }

    pub fn get_default(&self, field: &str) -> Option<&Value> {
        self.defaults.get(field)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.requirements.get(field) == Some(&FieldRequirement::Required)
    }
}

impl RuleSource for Ruleset {
    fn rules(&self) -> IndexMap<String, Rule> {
        self.rules.clone()
    }

    fn defaults(&self) -> IndexMap<String, Value> {
        self.defaults.clone()
    }

    fn requirements(&self) -> IndexMap<String, FieldRequirement> {
        self.requirements.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
