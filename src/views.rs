//! View resolution: named bundles of field names substituted into filters
//! at parse time.

use std::collections::HashMap;

/// The view that holds a type's default fields. Other views implicitly
/// include it unless the engine is configured otherwise.
pub const BASE_VIEW: &str = "base";

/// Resolves a view name to the fields it bundles. Injected at engine
/// construction; the engine never introspects host types itself.
pub trait ViewSource: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Vec<String>>;
}

/// The default, map-backed [`ViewSource`].
///
/// Fields can be registered view-by-view or individually; a field registered
/// without explicit views lands in `base` when the registry was built with
/// that behavior enabled (the engine wires this to
/// `property_add_non_annotated_fields_to_base_view`).
#[derive(Debug, Clone)]
pub struct ViewRegistry {
    views: HashMap<String, Vec<String>>,
    add_non_annotated_to_base: bool,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            add_non_annotated_to_base: true,
        }
    }

    pub fn with_base_fallback(add_non_annotated_to_base: bool) -> Self {
        Self {
            views: HashMap::new(),
            add_non_annotated_to_base,
        }
    }

    /// Registers (or extends) a whole view.
    pub fn register_view<I, S>(&mut self, name: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.views.entry(name.to_string()).or_default();
        for field in fields {
            let field = field.into();
            if !entry.contains(&field) {
                entry.push(field);
            }
        }
    }

    /// Registers a single field in the given views. With no views listed the
    /// field goes to `base`, subject to the registry's fallback behavior.
    pub fn register_field(&mut self, field: &str, views: &[&str]) {
        if views.is_empty() {
            if self.add_non_annotated_to_base {
                self.register_view(BASE_VIEW, [field]);
            }
            return;
        }
        for view in views {
            self.register_view(view, [field]);
        }
    }
}

impl ViewSource for ViewRegistry {
    fn resolve(&self, name: &str) -> Option<Vec<String>> {
        self.views.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ViewRegistry::new();
        registry.register_view("summary", ["id", "title"]);
        assert_eq!(
            registry.resolve("summary"),
            Some(vec!["id".to_string(), "title".to_string()])
        );
        assert_eq!(registry.resolve("missing"), None);
    }

    #[test]
    fn test_register_field_defaults_to_base() {
        let mut registry = ViewRegistry::new();
        registry.register_field("id", &[]);
        registry.register_field("secret", &["admin"]);
        assert_eq!(registry.resolve(BASE_VIEW), Some(vec!["id".to_string()]));
        assert_eq!(registry.resolve("admin"), Some(vec!["secret".to_string()]));
    }

    #[test]
    fn test_base_fallback_disabled() {
        let mut registry = ViewRegistry::with_base_fallback(false);
        registry.register_field("id", &[]);
        assert_eq!(registry.resolve(BASE_VIEW), None);
    }

    #[test]
    fn test_duplicate_fields_collapse() {
        let mut registry = ViewRegistry::new();
        registry.register_view("summary", ["id"]);
        registry.register_view("summary", ["id", "title"]);
        assert_eq!(
            registry.resolve("summary"),
            Some(vec!["id".to_string(), "title".to_string()])
        );
    }
}
