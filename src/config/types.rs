//! Construction options for a validation context

use super::schema::FieldRequirement;
use crate::constraint::ALLOW;
use crate::context::RulesRef;
use crate::shortcut::Rule;
use indexmap::IndexMap;

/// Configuration for creating a [`Context`](crate::Context)
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Textual tag identifying the declaration scope (used in error headers)
    pub tag: Option<String>,

    /// Rules the configuration is validated against
    /// If None, validation fails with a usage error until rules are set
    pub rules: Option<RulesRef>,

    /// Rule applied to fields without an explicit rule (default: allow)
    pub default_rule: Rule,

    /// Rules declared by this scope itself, used when another context
    /// validates against this one
    pub annotations: IndexMap<String, Rule>,

    /// Requirements declared by this scope itself
    pub requirements: IndexMap<String, FieldRequirement>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            tag: None,
            rules: None,
            default_rule: Rule::Constraint(ALLOW),
            annotations: IndexMap::new(),
            requirements: IndexMap::new(),
        }
    }
}

impl ContextConfig {
    /// Create a new builder for `ContextConfig`
    ///
    /// # Example
    /// ```rust
    /// use cfgrules::{ContextConfig, Ruleset, ValueKind, DISABLED};
    ///
    /// let config = ContextConfig::builder()
    ///     .tag("server")
    ///     .rules(Ruleset::new().rule("port", ValueKind::Integer))
    ///     .default_rule(DISABLED)
    ///     .build();
    /// assert_eq!(config.tag.as_deref(), Some("server"));
    /// ```
    pub fn builder() -> ContextConfigBuilder {
        ContextConfigBuilder::new()
    }
}

/// Builder for creating a [`ContextConfig`] with a fluent API
#[derive(Debug, Clone, Default)]
pub struct ContextConfigBuilder {
    config: ContextConfig,
}

impl ContextConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scope tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = Some(tag.into());
        self
    }

    /// Set the rules reference
    pub fn rules(mut self, rules: impl Into<RulesRef>) -> Self {
        self.config.rules = Some(rules.into());
        self
    }

    /// Rule for fields the rules source does not mention
    ///
    /// Use [`DISABLED`](crate::DISABLED) to reject unknown fields.
    pub fn default_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.config.default_rule = rule.into();
        self
    }

    /// Declare a rule on this scope
    pub fn rule(mut self, field: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.config.annotations.insert(field.into(), rule.into());
        self
    }

    /// Mark a field of this scope as required
    pub fn required(mut self, field: impl Into<String>) -> Self {
        self.config
            .requirements
            .insert(field.into(), FieldRequirement::Required);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ContextConfig {
        self.config
    }
}
