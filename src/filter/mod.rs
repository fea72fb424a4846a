//! Depth-first application of parsed filters to document trees.

pub(crate) mod cache;
pub mod functions;
pub mod matcher;

use crate::error::SiftError;
use crate::node::{JsonNode, PathElement};
use crate::parser::ast::Statement;
use functions::FunctionRegistry;
use matcher::ExpressionMatch;
use serde_json::Value;

/// Applies one statement to the tree, returning the projected copy.
///
/// Each visited property is matched against the statement root; winners get
/// their key functions applied to the output key and their value functions
/// applied to the node, losers are pruned along with their descendants.
pub(crate) fn apply_statement<N: JsonNode>(
    node: &N,
    statement: &Statement,
    functions: &FunctionRegistry,
) -> Result<N, SiftError> {
    let root = statement.root();
    if root.is_negated() {
        return Err(SiftError::Match(
            "statement root must not be negated".to_string(),
        ));
    }

    // A bare ** statement is the identity projection: skip the walk and
    // apply its value functions, if any, to the whole tree.
    if let [single] = root.children() {
        if single.is_any_deep() && !single.is_negated() && single.children().is_empty() {
            if single.value_functions().is_empty() {
                return Ok(node.clone());
            }
            let out = functions.invoke(node.to_value(), "", None, single.value_functions())?;
            return Ok(node.create(out));
        }
    }

    node.transform(&mut |ctx, json_node| {
        if ctx.path().is_empty() {
            return Ok(Some(json_node));
        }
        if ctx.path().last().is_some_and(PathElement::is_index) {
            // Array element level; filtering happens at the fields inside.
            return Ok(Some(json_node));
        }

        match matcher::match_path(ctx.path(), root) {
            ExpressionMatch::Exclude | ExpressionMatch::NeverMatch => Ok(None),
            ExpressionMatch::Include(expr) => {
                if !expr.key_functions().is_empty() {
                    let parent = ctx.parent().map(JsonNode::to_value);
                    let renamed = functions.invoke(
                        Value::String(ctx.key.clone()),
                        &ctx.key,
                        parent.as_ref(),
                        expr.key_functions(),
                    )?;
                    ctx.key = key_string(renamed);
                }
                if expr.value_functions().is_empty() {
                    Ok(Some(json_node))
                } else {
                    let parent = ctx.parent().map(JsonNode::to_value);
                    let out = functions.invoke(
                        json_node.to_value(),
                        &ctx.key,
                        parent.as_ref(),
                        expr.value_functions(),
                    )?;
                    Ok(Some(json_node.create(out)))
                }
            }
        }
    })
}

/// Coerces a key-function result back into a property key.
fn key_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
