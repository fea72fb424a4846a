//! A path-expression engine for filtering and reshaping JSON trees at
//! serialization time.
//!
//! Filters select, exclude and transform fields of a document:
//!
//! ```
//! use serde_json::json;
//! use sift::Engine;
//!
//! let engine = Engine::new();
//! let doc = json!({
//!     "id": "ISSUE-1",
//!     "issueSummary": "Dragons Need Fed",
//!     "assignee": {"firstName": "Jorah", "lastName": "Mormont"},
//! });
//!
//! let filtered = engine.apply(doc, &["id,assignee[firstName]"]).unwrap();
//! assert_eq!(
//!     filtered,
//!     json!({"id": "ISSUE-1", "assignee": {"firstName": "Jorah"}})
//! );
//! ```
//!
//! The engine is parametric over the host's node representation via
//! [`JsonNode`]; an implementation for `serde_json::Value` is included.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod node;
pub mod parser;
pub mod views;

pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::SiftError;
pub use filter::functions::{FunctionInput, FunctionRegistry};
pub use filter::matcher::{ExpressionMatch, match_path};
pub use node::{DocumentPath, JsonNode, NodeContext, NodeKind, PathElement};
pub use parser::ast::{ExpressionNode, Filter, FunctionArg, FunctionCall, NameKind, Statement};
pub use parser::parse_filter;
pub use views::{BASE_VIEW, ViewRegistry, ViewSource};
