//! Extension points.
//!
//! Every extension point is a [`HookChain`]: an ordered list of transform
//! functions, each receiving the current value and returning the value to use
//! going forward. Chains run synchronously in registration order and their
//! output is used without validation.
//!
//! ```rust
//! use helios_search_connector::hooks::Hooks;
//! use serde_json::json;
//!
//! let mut hooks = Hooks::default();
//! hooks.mapping.register(|mut mapping| {
//!     mapping["dynamic_templates"] = json!([]);
//!     mapping
//! });
//! let mapping = hooks.mapping.apply(json!({ "properties": {} }));
//! assert!(mapping["dynamic_templates"].is_array());
//! ```

use std::fmt;

use serde_json::Value;

use crate::search::EngineQuery;
use crate::types::{Document, Query, ResultSet};

type Hook<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// An ordered chain of transform functions for one extension point.
pub struct HookChain<T> {
    hooks: Vec<Hook<T>>,
}

impl<T> HookChain<T> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends a transform to the chain.
    pub fn register<F>(&mut self, hook: F)
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Runs the chain, threading the value through every transform.
    pub fn apply(&self, value: T) -> T {
        self.hooks.iter().fold(value, |current, hook| hook(current))
    }

    /// Returns the number of registered transforms.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no transform is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<T> Default for HookChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HookChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("len", &self.hooks.len())
            .finish()
    }
}

/// All extension points of the connector.
#[derive(Debug, Default)]
pub struct Hooks {
    /// Alters index settings before an index is created.
    pub index_settings: HookChain<Value>,
    /// Alters the mapping document before it is applied.
    pub mapping: HookChain<Value>,
    /// Alters each encoded document before it joins a bulk batch.
    pub document: HookChain<Document>,
    /// Alters the abstract query before it is translated.
    pub search_query: HookChain<Query>,
    /// Application-wide alteration of the built engine query.
    pub engine_query: HookChain<EngineQuery>,
    /// Structured "build query" event on the engine query, after `engine_query`.
    pub build_query: HookChain<EngineQuery>,
    /// Alters decoded results before they are returned.
    pub search_results: HookChain<ResultSet>,
}

impl Hooks {
    /// Creates a hook registry with empty chains.
    pub fn new() -> Self {
        Self::default()
    }
}
