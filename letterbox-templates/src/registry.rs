//! Closed set of templates, fixed at startup.

use crate::builtin::{self, BuiltinConfig};
use crate::error::TemplateResult;
use crate::generator::Generator;
use crate::metadata::TemplateMeta;
use std::collections::BTreeMap;
use tracing::debug;

/// A template: catalogue entry plus its generator.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub meta: TemplateMeta,
    pub generator: Generator,
}

/// Templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    entries: BTreeMap<String, TemplateEntry>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in template.
    pub fn with_builtins(config: &BuiltinConfig) -> TemplateResult<Self> {
        let mut registry = Self::new();
        builtin::register(&mut registry, config)?;
        debug!(templates = ?registry.keys(), "built-in templates registered");
        Ok(registry)
    }

    /// Register a template, replacing any previous one with the same key.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        meta: TemplateMeta,
        generator: Generator,
    ) -> &mut Self {
        self.entries.insert(key.into(), TemplateEntry { meta, generator });
        self
    }

    pub fn get(&self, key: &str) -> Option<&TemplateEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// The catalogue, keyed by template key.
    pub fn metadata(&self) -> BTreeMap<String, TemplateMeta> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.meta.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
