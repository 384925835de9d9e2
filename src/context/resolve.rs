//! Rules references and their resolution into a context

use super::Context;
use crate::config::{RuleSource, Ruleset};
use crate::error::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::ops::Deref;
use std::sync::Arc;

/// Where a context finds the rules it is validated against
#[derive(Clone)]
pub enum RulesRef {
    /// Another context; its annotations are the rules, its values the defaults
    Context(Arc<Context>),
    /// A rule source, wrapped into a context on every validation
    Source(Arc<dyn RuleSource>),
    /// A context registered under a tag, looked up through a [`ContextResolver`]
    Named(String),
}

impl RulesRef {
    pub fn named(tag: impl Into<String>) -> Self {
        RulesRef::Named(tag.into())
    }

    pub(crate) fn resolve<'a>(
        &'a self,
        resolver: Option<&dyn ContextResolver>,
    ) -> Result<ResolvedRules<'a>> {
        match self {
            RulesRef::Context(context) => Ok(ResolvedRules::Borrowed(context)),
            RulesRef::Source(source) => Ok(ResolvedRules::Owned(Context::from_source(
                source.as_ref(),
            ))),
            RulesRef::Named(tag) => {
                let context = resolver
                    .and_then(|r| r.resolve(tag))
                    .ok_or_else(|| Error::UnresolvedRules(tag.clone()))?;
                debug!("Resolved rules '{tag}' through registry");
                Ok(ResolvedRules::Shared(context))
            }
        }
    }
}

impl fmt::Debug for RulesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesRef::Context(context) => f
                .debug_tuple("Context")
                .field(&context.tag())
                .finish(),
            RulesRef::Source(source) => f.debug_tuple("Source").field(&source.name()).finish(),
            RulesRef::Named(tag) => f.debug_tuple("Named").field(tag).finish(),
        }
    }
}

impl From<Context> for RulesRef {
    fn from(context: Context) -> Self {
        RulesRef::Context(Arc::new(context))
    }
}

impl From<Arc<Context>> for RulesRef {
    fn from(context: Arc<Context>) -> Self {
        RulesRef::Context(context)
    }
}

impl From<Ruleset> for RulesRef {
    fn from(rules: Ruleset) -> Self {
        RulesRef::Source(Arc::new(rules))
    }
}

impl From<Arc<dyn RuleSource>> for RulesRef {
    fn from(source: Arc<dyn RuleSource>) -> Self {
        RulesRef::Source(source)
    }
}

/// Looks up contexts registered under a textual tag
pub trait ContextResolver {
    fn resolve(&self, tag: &str) -> Option<Arc<Context>>;
}

impl<S: BuildHasher> ContextResolver for HashMap<String, Arc<Context>, S> {
    fn resolve(&self, tag: &str) -> Option<Arc<Context>> {
        self.get(tag).cloned()
    }
}

/// Rules context borrowed, shared or built for one validation pass
pub(crate) enum ResolvedRules<'a> {
    Borrowed(&'a Context),
    Shared(Arc<Context>),
    Owned(Context),
}

impl Deref for ResolvedRules<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        match self {
            ResolvedRules::Borrowed(context) => *context,
            ResolvedRules::Shared(context) => context.as_ref(),
            ResolvedRules::Owned(context) => context,
        }
    }
}
