//! The public entry point: parse filters, apply them to documents, and hold
//! the hooks an embedding wires in at construction.

use crate::config::EngineConfig;
use crate::error::SiftError;
use crate::filter;
use crate::filter::cache::ParseCache;
use crate::filter::functions::FunctionRegistry;
use crate::node::{JsonNode, NodeKind};
use crate::parser::{self, ast::Filter};
use crate::views::{ViewRegistry, ViewSource};
use std::sync::Arc;

type ContextFilterSource = dyn Fn(NodeKind) -> Option<String> + Send + Sync;

/// A configured filter engine.
///
/// The engine is stateless per invocation apart from its parse cache; a
/// single instance can serve concurrent walks over distinct documents.
pub struct Engine {
    config: EngineConfig,
    views: Arc<dyn ViewSource>,
    functions: FunctionRegistry,
    context_filter: Option<Box<ContextFilterSource>>,
    cache: ParseCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with default configuration, the built-in function library,
    /// and no registered views.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses filter text, going through the bounded parse cache. Identical
    /// filter text yields a shared parse; cached failures are re-thrown.
    pub fn parse(&self, text: &str) -> Result<Arc<Filter>, SiftError> {
        self.cache
            .get_or_parse(text, || parser::parse_filter(text, &*self.views, &self.config))
    }

    /// Applies the filters to the document in order, each one over the
    /// previous output. When configured, an ambient filter looked up for the
    /// result's node kind is appended after the user filters.
    pub fn apply<N: JsonNode>(&self, node: N, filters: &[&str]) -> Result<N, SiftError> {
        let mut node = node;
        for filter in filters {
            node = self.apply_filter(node, filter)?;
        }

        if self.config.append_context_in_node_filter {
            if let Some(source) = &self.context_filter {
                if let Some(ambient) = source(node.kind()) {
                    node = self.apply_filter(node, &ambient)?;
                }
            }
        }

        Ok(node)
    }

    fn apply_filter<N: JsonNode>(&self, node: N, filter: &str) -> Result<N, SiftError> {
        let parsed = self.parse(filter)?;
        let mut node = node;
        for statement in parsed.statements() {
            match filter::apply_statement(&node, statement, &self.functions) {
                Ok(next) => node = next,
                Err(err @ SiftError::Function { .. }) => {
                    // The statement is abandoned; the tree keeps its
                    // pre-statement state and later statements still apply.
                    log::warn!("filter '{filter}' statement aborted: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(node)
    }
}

/// One-shot builder for [`Engine`]. Views, functions and the context-filter
/// source can only be supplied here; they are immutable afterwards.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    views: Option<Arc<dyn ViewSource>>,
    functions: Option<FunctionRegistry>,
    context_filter: Option<Box<ContextFilterSource>>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn view_source<V: ViewSource + 'static>(mut self, views: V) -> Self {
        self.views = Some(Arc::new(views));
        self
    }

    pub fn function_registry(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Supplies the ambient filter lookup consulted after user filters when
    /// `append_context_in_node_filter` is enabled.
    pub fn context_filter_source<F>(mut self, source: F) -> Self
    where
        F: Fn(NodeKind) -> Option<String> + Send + Sync + 'static,
    {
        self.context_filter = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Engine {
        let EngineBuilder {
            config,
            views,
            functions,
            context_filter,
        } = self;
        let cache = ParseCache::new(config.parse_cache_max_entries);
        let views = views.unwrap_or_else(|| {
            Arc::new(ViewRegistry::with_base_fallback(
                config.property_add_non_annotated_fields_to_base_view,
            ))
        });
        Engine {
            config,
            views,
            functions: functions.unwrap_or_default(),
            context_filter,
            cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_successive_filters_narrow_the_tree() {
        let engine = Engine::new();
        let doc = json!({"id": 1, "name": "x", "secret": true});
        let out = engine.apply(doc, &["id,name", "id"]).unwrap();
        assert_eq!(out, json!({"id": 1}));
    }

    #[test]
    fn test_parse_is_cached() {
        let engine = Engine::new();
        let first = engine.parse("id,name").unwrap();
        let second = engine.parse("id,name").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_function_error_scopes_to_one_filter() {
        let engine = Engine::new();
        let doc = json!({"id": 1, "name": "x"});
        // The broken filter aborts without damage; the next one applies.
        let out = engine.apply(doc, &["id@bogus", "name"]).unwrap();
        assert_eq!(out, json!({"name": "x"}));
    }

    #[test]
    fn test_syntax_error_propagates() {
        let engine = Engine::new();
        let doc = json!({"id": 1});
        assert!(matches!(
            engine.apply(doc, &["a{b"]),
            Err(SiftError::Syntax { .. })
        ));
    }

    #[test]
    fn test_context_filter_is_appended() {
        let engine = Engine::builder()
            .context_filter_source(|kind| {
                (kind == NodeKind::Object).then(|| "id".to_string())
            })
            .build();
        let doc = json!({"id": 1, "name": "x"});
        let out = engine.apply(doc, &["**"]).unwrap();
        assert_eq!(out, json!({"id": 1}));
    }

    #[test]
    fn test_context_filter_can_be_disabled() {
        let config = EngineConfig {
            append_context_in_node_filter: false,
            ..EngineConfig::default()
        };
        let engine = Engine::builder()
            .config(config)
            .context_filter_source(|_| Some("id".to_string()))
            .build();
        let doc = json!({"id": 1, "name": "x"});
        let out = engine.apply(doc.clone(), &["**"]).unwrap();
        assert_eq!(out, doc);
    }
}
