//! Serializable view of a context

use super::{Context, ContextResolver};
use crate::config::FieldRequirement;
use crate::error::Result;
use crate::storage::StorageBackend;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Plain-data copy of a [`Context`]
///
/// Rules are rendered as text since constraints hold functions. The rules
/// context is captured one level deep; when the rules reference cannot be
/// resolved it is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    pub configs: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub requirements: IndexMap<String, FieldRequirement>,

    pub default_rule: String,

    #[serde(default)]
    pub updated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Box<ContextSnapshot>>,
}

impl ContextSnapshot {
    fn shallow(context: &Context) -> Self {
        Self {
            tag: context.tag.clone(),
            configs: context.configs.clone(),
            annotations: context
                .annotations
                .iter()
                .map(|(field, rule)| (field.clone(), rule.to_string()))
                .collect(),
            requirements: context.requirements.clone(),
            default_rule: context.default_rule.to_string(),
            updated: context.updated,
            rules: None,
        }
    }

    /// Load a snapshot previously written with [`Context::dump`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<S: StorageBackend>(storage: &S, path: &Path) -> Result<Self> {
        storage.read(path)
    }
}

impl Context {
    /// Capture this context as plain data
    pub fn snapshot(&self) -> ContextSnapshot {
        self.capture(None)
    }

    /// [`Context::snapshot`] with named rules resolved through `resolver`
    pub fn snapshot_with(&self, resolver: &dyn ContextResolver) -> ContextSnapshot {
        self.capture(Some(resolver))
    }

    fn capture(&self, resolver: Option<&dyn ContextResolver>) -> ContextSnapshot {
        let mut snapshot = ContextSnapshot::shallow(self);
        if let Some(rules) = &self.rules {
            match rules.resolve(resolver) {
                Ok(context) => {
                    snapshot.rules = Some(Box::new(ContextSnapshot::shallow(&context)));
                }
                Err(e) => warn!("Leaving rules out of snapshot: {e}"),
            }
        }
        snapshot
    }

    /// Write a snapshot of this context to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn dump<S: StorageBackend>(&self, storage: &S, path: &Path) -> Result<()> {
        storage.write(path, &self.snapshot())?;
        debug!("Dumped context to {}", path.display());
        Ok(())
    }

    /// Write a snapshot into `dir`, named after the tag and the storage format
    ///
    /// An untagged context is written to `context.<extension>`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn dump_in<S: StorageBackend>(&self, storage: &S, dir: &Path) -> Result<PathBuf> {
        let stem = self.tag.as_deref().unwrap_or("context");
        let path = dir.join(format!("{stem}.{}", storage.extension()));
        self.dump(storage, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContextConfig, Ruleset};
    use crate::constraint::{DISABLED, ValueKind};
    use crate::context::RulesRef;
    use serde_json::json;

    fn sample() -> Context {
        let mut configs = IndexMap::new();
        configs.insert("port".to_string(), json!(8080));
        Context::new(
            configs,
            ContextConfig::builder()
                .tag("server")
                .rules(Ruleset::named("server-rules").rule("port", (1024, 65536)))
                .default_rule(DISABLED)
                .rule("name", ValueKind::String)
                .build(),
        )
    }

    #[test]
    fn test_snapshot_renders_rules() {
        let snapshot = sample().snapshot();

        assert_eq!(snapshot.tag.as_deref(), Some("server"));
        assert_eq!(snapshot.configs.get("port"), Some(&json!(8080)));
        assert_eq!(snapshot.annotations.get("name").map(String::as_str), Some("str"));
        assert_eq!(snapshot.default_rule, "deny(\"is not allowed\")");
        assert!(!snapshot.updated);

        let rules = snapshot.rules.unwrap();
        assert_eq!(rules.tag.as_deref(), Some("server-rules"));
        assert_eq!(
            rules.annotations.get("port").map(String::as_str),
            Some("(1024, 65536)")
        );
        assert!(rules.rules.is_none());
    }

    #[test]
    fn test_unresolved_rules_are_left_out() {
        let context = Context::new(
            IndexMap::new(),
            ContextConfig::builder().rules(RulesRef::named("missing")).build(),
        );
        assert!(context.snapshot().rules.is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = sample().snapshot();
        let text = serde_json::to_string(&snapshot).unwrap();
        let parsed: ContextSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
