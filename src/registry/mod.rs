//! Transformer registry
//!
//! Maps sub-provider tags to transformers. A [`TransformerRegistry`] value is
//! what a provider dispatches through; the process-wide instance behind
//! [`register_transformer`] / [`get_transformer`] is seeded with every
//! built-in vendor and is snapshotted by providers at construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use crate::providers;
use crate::transformers::SmsTransformer;

/// Tag-keyed transformer table.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    by_tag: HashMap<String, Arc<dyn SmsTransformer>>,
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl TransformerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in vendor.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for transformer in providers::builtin_transformers() {
            registry.register(transformer);
        }
        registry
    }

    /// Register under the transformer's own tag, replacing any previous entry.
    pub fn register(&mut self, transformer: Arc<dyn SmsTransformer>) {
        let tag = transformer.sub_provider().to_string();
        self.register_as(tag, transformer);
    }

    /// Register under an explicit tag, replacing any previous entry.
    pub fn register_as(&mut self, tag: impl Into<String>, transformer: Arc<dyn SmsTransformer>) {
        let tag = tag.into();
        tracing::debug!(
            target: "smsmux::registry",
            tag = %tag,
            "transformer registered"
        );
        self.by_tag.insert(tag, transformer);
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn SmsTransformer>> {
        self.by_tag.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

static GLOBAL: OnceLock<RwLock<TransformerRegistry>> = OnceLock::new();

/// Get global registry instance
pub fn global_registry() -> &'static RwLock<TransformerRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(TransformerRegistry::with_builtin()))
}

/// Register `transformer` under `tag` in the global registry.
///
/// Providers built afterwards see the new entry; existing providers keep
/// the snapshot they were built with.
pub fn register_transformer(tag: impl Into<String>, transformer: Arc<dyn SmsTransformer>) {
    let mut guard = global_registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.register_as(tag, transformer);
}

/// Look up `tag` in the global registry.
pub fn get_transformer(tag: &str) -> Option<Arc<dyn SmsTransformer>> {
    global_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(tag)
}

/// Copy of the global registry.
pub fn snapshot() -> TransformerRegistry {
    global_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
