//! Engine registry and fallback selection.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engines::{Bing, Brave, DuckDuckGo};
use crate::Engine;

/// Fixed engine priority used for default selection and fallback.
///
/// Lookups never depend on map iteration order, so fallback is reproducible.
pub const DEFAULT_PRIORITY: &[&str] = &["duckduckgo", "bing", "brave"];

/// Name-keyed set of search engines.
///
/// Built once, then shared read-only across requests.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn Engine>>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in engines.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DuckDuckGo::new());
        registry.register(Bing::new());
        registry.register(Brave::new());
        registry
    }

    /// Registers an engine under its name, replacing any previous one.
    pub fn register<E: Engine + 'static>(&mut self, engine: E) {
        self.register_arc(Arc::new(engine));
    }

    /// Registers a shared engine under its name.
    pub fn register_arc(&mut self, engine: Arc<dyn Engine>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    /// Returns an enabled engine by name or shortcut.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Engine>> {
        self.engines
            .get(name)
            .or_else(|| self.engines.values().find(|e| e.shortcut() == name))
            .filter(|e| e.is_enabled())
    }

    /// Returns the number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Returns registered engine names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Selects the first preferred engine that is registered.
    ///
    /// With no preference, walks [`DEFAULT_PRIORITY`] instead.
    pub fn select(&self, preferred: &[String]) -> Option<Arc<dyn Engine>> {
        if preferred.is_empty() {
            return DEFAULT_PRIORITY
                .iter()
                .find_map(|name| self.get(name))
                .cloned();
        }
        preferred.iter().find_map(|name| self.get(name)).cloned()
    }

    /// Resolves names to engines, preserving order and dropping unknown names
    /// and repeats. Empty input resolves [`DEFAULT_PRIORITY`].
    pub fn resolve(&self, names: &[String]) -> Vec<Arc<dyn Engine>> {
        let defaults: Vec<String>;
        let names = if names.is_empty() {
            defaults = DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect();
            &defaults
        } else {
            names
        };

        let mut resolved: Vec<Arc<dyn Engine>> = Vec::new();
        for name in names {
            if let Some(engine) = self.get(name) {
                if !resolved.iter().any(|e| e.name() == engine.name()) {
                    resolved.push(Arc::clone(engine));
                }
            }
        }
        resolved
    }

    /// Engines to try after `failed`, in [`DEFAULT_PRIORITY`] order.
    pub fn fallback_chain(&self, failed: &str) -> Vec<Arc<dyn Engine>> {
        DEFAULT_PRIORITY
            .iter()
            .filter(|name| **name != failed)
            .filter_map(|name| self.get(name))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}
