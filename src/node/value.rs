//! The reference [`JsonNode`] implementation for `serde_json::Value`.

use super::{DocumentPath, JsonNode, NodeContext, NodeKind, PathElement};
use crate::error::SiftError;
use serde_json::{Map, Value};

impl JsonNode for Value {
    fn kind(&self) -> NodeKind {
        match self {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) => NodeKind::String,
            Value::Number(_) => NodeKind::Number,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Null => NodeKind::Null,
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn create(&self, value: Value) -> Self {
        value
    }

    fn transform<F>(&self, f: &mut F) -> Result<Self, SiftError>
    where
        F: FnMut(&mut NodeContext<'_, Self>, Self) -> Result<Option<Self>, SiftError>,
    {
        let mut path = DocumentPath::new();
        let root = {
            let mut ctx = NodeContext::new(&path, String::new(), None);
            f(&mut ctx, self.clone())?
        };
        match root {
            Some(node) => walk_children(&node, &mut path, f),
            None => Ok(Value::Null),
        }
    }
}

/// Rebuilds `value` with the callback applied to each child, recursing into
/// whatever the callback returned. Pruned properties and elements are simply
/// not emitted.
fn walk_children<F>(value: &Value, path: &mut DocumentPath, f: &mut F) -> Result<Value, SiftError>
where
    F: FnMut(&mut NodeContext<'_, Value>, Value) -> Result<Option<Value>, SiftError>,
{
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                path.push(PathElement::Property(key.clone()));
                let (kept, out_key) = {
                    let mut ctx = NodeContext::new(path, key.clone(), Some(value));
                    let kept = f(&mut ctx, child.clone())?;
                    (kept, ctx.key)
                };
                let result = match kept {
                    Some(node) => Some(walk_children(&node, path, f)?),
                    None => None,
                };
                path.pop();
                if let Some(node) = result {
                    out.insert(out_key, node);
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, child) in items.iter().enumerate() {
                path.push(PathElement::Index(index));
                let kept = {
                    let mut ctx = NodeContext::new(path, index.to_string(), Some(value));
                    f(&mut ctx, child.clone())?
                };
                let result = match kept {
                    Some(node) => Some(walk_children(&node, path, f)?),
                    None => None,
                };
                path.pop();
                if let Some(node) = result {
                    out.push(node);
                }
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_transform() {
        let doc = json!({"a": 1, "b": {"c": [1, 2]}});
        let out = doc.transform(&mut |_, node| Ok(Some(node))).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn test_prune_by_key() {
        let doc = json!({"keep": 1, "drop": {"nested": true}});
        let out = doc
            .transform(&mut |ctx, node| {
                if ctx.key == "drop" {
                    Ok(None)
                } else {
                    Ok(Some(node))
                }
            })
            .unwrap();
        assert_eq!(out, json!({"keep": 1}));
    }

    #[test]
    fn test_pruned_descendants_not_visited() {
        let doc = json!({"drop": {"inner": 1}});
        let mut visited = Vec::new();
        doc.transform(&mut |ctx, node| {
            visited.push(ctx.path().to_string());
            if ctx.key == "drop" { Ok(None) } else { Ok(Some(node)) }
        })
        .unwrap();
        assert_eq!(visited, vec!["".to_string(), "drop".to_string()]);
    }

    #[test]
    fn test_rename_via_context_key() {
        let doc = json!({"old": 1});
        let out = doc
            .transform(&mut |ctx, node| {
                if ctx.key == "old" {
                    ctx.key = "new".to_string();
                }
                Ok(Some(node))
            })
            .unwrap();
        assert_eq!(out, json!({"new": 1}));
    }

    #[test]
    fn test_paths_include_array_indexes() {
        let doc = json!({"items": [{"id": 1}]});
        let mut paths = Vec::new();
        doc.transform(&mut |ctx, node| {
            paths.push(ctx.path().to_string());
            Ok(Some(node))
        })
        .unwrap();
        assert_eq!(paths, vec!["", "items", "items.0", "items.0.id"]);
    }

    #[test]
    fn test_replacement_is_descended_into() {
        let doc = json!({"items": [1, 2, 3, 4]});
        let out = doc
            .transform(&mut |ctx, node| {
                if ctx.key == "items" {
                    // Truncate, then expect the walk to continue over the
                    // truncated array only.
                    let Value::Array(mut items) = node else { unreachable!() };
                    items.truncate(2);
                    Ok(Some(Value::Array(items)))
                } else {
                    Ok(Some(node))
                }
            })
            .unwrap();
        assert_eq!(out, json!({"items": [1, 2]}));
    }
}
