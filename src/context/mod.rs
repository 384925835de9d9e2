//! Validation contexts
//!
//! A [`Context`] pairs a configuration mapping with a reference to the rules
//! it must satisfy. [`Context::validate`] walks the configuration in
//! declaration order and returns one diagnostic per failed sub-rule, each
//! formatted as `[<field>] <message>`, followed by one
//! `[<field>] missing required configuration` per required field that is
//! absent.
//!
//! ```
//! use cfgrules::{Context, ContextConfig, Ruleset, ValueKind};
//! use indexmap::IndexMap;
//! use serde_json::json;
//!
//! let rules = Ruleset::new()
//!     .rule("port", (1024, 65536))
//!     .required("port")
//!     .rule("host", ValueKind::String);
//!
//! let mut values = IndexMap::new();
//! values.insert("host".to_string(), json!(8080));
//!
//! let context = Context::new(values, ContextConfig::builder().rules(rules).build());
//! assert_eq!(
//!     context.validate()?,
//!     [
//!         "[host] should match one of the types in (str)",
//!         "[port] missing required configuration",
//!     ]
//! );
//! # Ok::<(), cfgrules::Error>(())
//! ```

mod resolve;
mod snapshot;

pub use resolve::{ContextResolver, RulesRef};
pub use snapshot::ContextSnapshot;

use crate::config::{
    ContextConfig, ContextConfigBuilder, FieldRequirement, RESERVED_MARKERS, RuleSource,
};
use crate::error::{Error, Result};
use crate::shortcut::{Rule, condition};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;

/// Diagnostic for a required field that is absent from the configuration
pub const MISSING_REQUIRED: &str = "missing required configuration";

/// Scope name used in error headers when a context has no tag
const ANONYMOUS: &str = "<anonymous>";

fn format_message(field: &str, message: &str) -> String {
    format!("[{field}] {message}")
}

// =============================================================================
// Environment
// =============================================================================

/// Data handed to deferred constraints while a field is validated
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    /// Name of the field being validated
    pub field: &'a str,
    /// Rule literal declared for the field (or the default rule)
    pub rule: &'a Rule,
    /// Default value the rules source declares for the field
    pub default: Option<&'a Value>,
    /// Context being validated
    pub context: &'a Context,
    /// Context the rules were resolved into
    pub rules: &'a Context,
}

// =============================================================================
// Close Options
// =============================================================================

/// Options for [`Context::close`]
#[derive(Debug, Clone, Default)]
pub struct CloseOptions {
    /// Allow closing a context that was already updated
    pub force: bool,
    /// Validate even when no rules are set (fails with a usage error)
    pub force_validate: bool,
    /// Rules to set before validating
    pub rules: Option<RulesRef>,
}

impl CloseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn force_validate(mut self, force_validate: bool) -> Self {
        self.force_validate = force_validate;
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: impl Into<RulesRef>) -> Self {
        self.rules = Some(rules.into());
        self
    }
}

// =============================================================================
// Context
// =============================================================================

/// A configuration mapping together with the rules it is validated against
#[derive(Debug, Clone)]
pub struct Context {
    tag: Option<String>,
    configs: IndexMap<String, Value>,
    annotations: IndexMap<String, Rule>,
    requirements: IndexMap<String, FieldRequirement>,
    rules: Option<RulesRef>,
    default_rule: Rule,
    updated: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(IndexMap::new(), ContextConfig::default())
    }
}

impl Context {
    /// Create a context over a configuration mapping
    pub fn new(configs: IndexMap<String, Value>, config: ContextConfig) -> Self {
        Self {
            tag: config.tag,
            configs,
            annotations: config.annotations,
            requirements: config.requirements,
            rules: config.rules,
            default_rule: config.default_rule,
            updated: false,
        }
    }

    /// Start building a context over `configs`
    ///
    /// ```
    /// use cfgrules::{Context, Ruleset, ValueKind};
    /// use indexmap::IndexMap;
    ///
    /// let context = Context::builder(IndexMap::new())
    ///     .tag("server")
    ///     .rules(Ruleset::new().rule("port", ValueKind::Integer).required("port"))
    ///     .build();
    /// assert_eq!(context.validate()?, ["[port] missing required configuration"]);
    /// # Ok::<(), cfgrules::Error>(())
    /// ```
    pub fn builder(configs: IndexMap<String, Value>) -> ContextBuilder {
        ContextBuilder {
            configs,
            config: ContextConfig::builder(),
        }
    }

    /// Create a context with default options (no rules, allow by default)
    pub fn from_values(configs: IndexMap<String, Value>) -> Self {
        Self::new(configs, ContextConfig::default())
    }

    /// Wrap a rule source: rules become annotations, defaults become values
    pub fn from_source(source: &dyn RuleSource) -> Self {
        Self {
            tag: source.name(),
            configs: source.defaults(),
            annotations: source.rules(),
            requirements: source.requirements(),
            ..Self::default()
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Configuration values in declaration order
    pub fn configs(&self) -> &IndexMap<String, Value> {
        &self.configs
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.configs.get(field)
    }

    /// Rules declared by this context for contexts validated against it
    pub fn annotations(&self) -> &IndexMap<String, Rule> {
        &self.annotations
    }

    pub fn requirements(&self) -> &IndexMap<String, FieldRequirement> {
        &self.requirements
    }

    pub fn rules(&self) -> Option<&RulesRef> {
        self.rules.as_ref()
    }

    pub fn default_rule(&self) -> &Rule {
        &self.default_rule
    }

    /// Whether [`Context::update`] has been called
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    fn scope(&self) -> String {
        self.tag.clone().unwrap_or_else(|| ANONYMOUS.to_string())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub fn set_rules(&mut self, rules: impl Into<RulesRef>) {
        self.rules = Some(rules.into());
    }

    pub fn set_default_rule(&mut self, rule: impl Into<Rule>) {
        self.default_rule = rule.into();
    }

    /// Declare a rule on this context
    pub fn annotate(&mut self, field: impl Into<String>, rule: impl Into<Rule>) {
        self.annotations.insert(field.into(), rule.into());
    }

    /// Declare a requirement on this context
    pub fn require(&mut self, field: impl Into<String>, requirement: FieldRequirement) {
        self.requirements.insert(field.into(), requirement);
    }

    /// Apply new configuration values
    ///
    /// With `keep_existing`, new values are merged over the old ones.
    /// Otherwise the mapping is replaced and every field whose value did not
    /// change is dropped, leaving only what changed since the last update.
    pub fn update(&mut self, configs: IndexMap<String, Value>, keep_existing: bool) {
        if keep_existing {
            self.configs.extend(configs);
        } else {
            let mut configs = configs;
            configs.retain(|name, value| self.configs.get(name) != Some(value));
            self.configs = configs;
        }
        self.updated = true;
        debug!(
            "Updated context {} ({} fields)",
            self.scope(),
            self.configs.len()
        );
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the configuration and collect diagnostics
    ///
    /// An empty list means the configuration is valid.
    ///
    /// # Errors
    ///
    /// - [`Error::RulesNotSet`] if no rules reference was set
    /// - [`Error::UnresolvedRules`] for a named reference (use
    ///   [`Context::validate_with`])
    /// - rule parse errors for declared rules that are not valid literals
    pub fn validate(&self) -> Result<Vec<String>> {
        self.run_validation(None)
    }

    /// Validate, resolving named rules references through `resolver`
    ///
    /// # Errors
    ///
    /// Same as [`Context::validate`].
    pub fn validate_with(&self, resolver: &dyn ContextResolver) -> Result<Vec<String>> {
        self.run_validation(Some(resolver))
    }

    fn run_validation(&self, resolver: Option<&dyn ContextResolver>) -> Result<Vec<String>> {
        let rules_ref = self.rules.as_ref().ok_or(Error::RulesNotSet)?;
        let rules = rules_ref.resolve(resolver)?;
        let mut messages = Vec::new();

        for (field, value) in &self.configs {
            let rule = rules.annotations.get(field).unwrap_or(&self.default_rule);
            let matcher = condition(rule.clone())?;

            let env = matcher.is_deferred().then(|| Environment {
                field,
                rule,
                default: rules.configs.get(field),
                context: self,
                rules: &*rules,
            });
            let outcome = matcher.check_in(value, env.as_ref())?;
            debug!(
                "[{field}] {} against {matcher}",
                if outcome.passed() { "passed" } else { "failed" }
            );
            if outcome.passed() {
                continue;
            }

            let failures = outcome.into_messages();
            if failures.is_empty() {
                messages.push(format_message(
                    field,
                    &format!("could not match constraint {matcher}"),
                ));
            }
            messages.extend(failures.iter().map(|m| format_message(field, m)));
        }

        for (field, requirement) in &rules.requirements {
            if RESERVED_MARKERS.contains(&field.as_str()) {
                continue;
            }
            if *requirement == FieldRequirement::Required && !self.configs.contains_key(field) {
                messages.push(format_message(field, MISSING_REQUIRED));
            }
        }

        info!(
            "Validated {} ({} fields, {} diagnostics)",
            self.scope(),
            self.configs.len(),
            messages.len()
        );
        Ok(messages)
    }

    /// Validate and fail with one aggregate error if anything is wrong
    ///
    /// # Errors
    ///
    /// Returns [`Error::RulesBroken`] carrying every diagnostic, or any error
    /// from [`Context::validate`].
    pub fn check(&self) -> Result<()> {
        let messages = self.validate()?;
        self.ensure_valid(messages)
    }

    fn ensure_valid(&self, messages: Vec<String>) -> Result<()> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Error::RulesBroken {
                scope: self.scope(),
                messages,
            })
        }
    }

    /// Finish a declaration scope
    ///
    /// Replaces the values with `configs` (keeping only changed fields), then
    /// validates when rules are set or `force_validate` is requested.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyClosed`] if the context was already updated and
    ///   `force` is not set
    /// - [`Error::RulesBroken`] if validation produced diagnostics
    /// - any error from [`Context::validate`]
    pub fn close(&mut self, configs: IndexMap<String, Value>, options: CloseOptions) -> Result<()> {
        self.finish(configs, options, None)
    }

    /// [`Context::close`] with named rules resolved through `resolver`
    ///
    /// # Errors
    ///
    /// Same as [`Context::close`].
    pub fn close_with(
        &mut self,
        configs: IndexMap<String, Value>,
        options: CloseOptions,
        resolver: &dyn ContextResolver,
    ) -> Result<()> {
        self.finish(configs, options, Some(resolver))
    }

    fn finish(
        &mut self,
        configs: IndexMap<String, Value>,
        options: CloseOptions,
        resolver: Option<&dyn ContextResolver>,
    ) -> Result<()> {
        if self.updated && !options.force {
            return Err(Error::AlreadyClosed(self.scope()));
        }
        if let Some(rules) = options.rules {
            self.rules = Some(rules);
        }
        self.update(configs, false);

        if self.rules.is_some() || options.force_validate {
            let messages = self.run_validation(resolver)?;
            self.ensure_valid(messages)?;
        }
        info!("Closed configuration {}", self.scope());
        Ok(())
    }
}

/// Builder returned by [`Context::builder`]
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    configs: IndexMap<String, Value>,
    config: ContextConfigBuilder,
}

impl ContextBuilder {
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config = self.config.tag(tag);
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: impl Into<RulesRef>) -> Self {
        self.config = self.config.rules(rules);
        self
    }

    #[must_use]
    pub fn default_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.config = self.config.default_rule(rule);
        self
    }

    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.config = self.config.rule(field, rule);
        self
    }

    #[must_use]
    pub fn required(mut self, field: impl Into<String>) -> Self {
        self.config = self.config.required(field);
        self
    }

    pub fn build(self) -> Context {
        Context::new(self.configs, self.config.build())
    }
}

// =============================================================================
// Tests
// =============================================================================
