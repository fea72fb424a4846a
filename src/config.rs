use serde::{Deserialize, Serialize};

/// Tunable behavior of an [`Engine`](crate::Engine).
///
/// All options are fixed at engine construction. Embedders that load
/// configuration from files can deserialize this struct directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// After user filters have been applied, look up an ambient filter for
    /// the root node via the engine's context-filter source and append it.
    ///
    /// Defaults to `true`.
    pub append_context_in_node_filter: bool,

    /// When a view reference is expanded, also include the fields of the
    /// `base` view (unless the reference *is* the `base` view).
    ///
    /// Defaults to `true`.
    pub filter_implicitly_include_base_fields_in_view: bool,

    /// Expand view references inside nested blocks, not only at the top
    /// level of a filter. A nested view name that collides with a sibling
    /// field name is treated as a field.
    ///
    /// Defaults to `false`.
    pub filter_propagate_view_to_nested_filters: bool,

    /// Fields registered in a [`ViewRegistry`](crate::views::ViewRegistry)
    /// without any explicit view membership are added to the `base` view.
    ///
    /// Defaults to `true`.
    pub property_add_non_annotated_fields_to_base_view: bool,

    /// Maximum number of parsed filters retained by the engine's parse
    /// cache. `0` disables caching entirely.
    ///
    /// Defaults to `10_000`.
    pub parse_cache_max_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            append_context_in_node_filter: true,
            filter_implicitly_include_base_fields_in_view: true,
            filter_propagate_view_to_nested_filters: false,
            property_add_non_annotated_fields_to_base_view: true,
            parse_cache_max_entries: 10_000,
        }
    }
}
