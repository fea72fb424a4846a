//! A `nom`-based parser for the property-filter DSL.
//!
//! Parsing happens in two layers: the combinators below build the raw tree,
//! and an analysis pass merges duplicate siblings, inserts the implicit
//! deep-include nodes that make exclusion-only filters keep their
//! surroundings, expands view references and compiles name patterns.

pub mod ast;
pub(crate) mod lexer;

use crate::config::EngineConfig;
use crate::error::SiftError;
use crate::views::{BASE_VIEW, ViewSource};
use ast::{ExpressionNode, Filter, FunctionArg, FunctionCall, NameKind, Statement};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, opt},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, preceded},
};
use serde_json::Value;

use lexer::ws;

/// One comma-separated top-level branch, before assembly into the tree.
/// A parenthesized group contributes several nodes to a single branch.
struct Branch {
    nodes: Vec<ExpressionNode>,
    negated: bool,
}

// --- Main Public Parser ---

/// Parses filter text into a [`Filter`], expanding registered view names
/// and compiling wildcard/regex patterns.
pub fn parse_filter(
    text: &str,
    views: &dyn ViewSource,
    config: &EngineConfig,
) -> Result<Filter, SiftError> {
    let trimmed = text.trim();
    let mut root = ExpressionNode::root();

    if !trimmed.is_empty() {
        match branches(trimmed) {
            Ok(("", parsed)) => {
                let all_negated = parsed.iter().all(|b| b.negated);
                let children = root.children_mut();
                for branch in parsed {
                    for node in branch.nodes {
                        ExpressionNode::add_merged(children, node);
                    }
                }
                if all_negated && !children.is_empty() {
                    ExpressionNode::add_merged(children, ExpressionNode::any_deep());
                }
            }
            Ok((rest, _)) => {
                return Err(SiftError::syntax(
                    trimmed.len() - rest.len(),
                    format!("unexpected trailing input '{rest}'"),
                ));
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(SiftError::syntax(
                    trimmed.len() - e.input.len(),
                    format!("expected {:?}", e.code),
                ));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(SiftError::syntax(trimmed.len(), "unexpected end of input"));
            }
        }
    }

    expand_views(&mut root, views, config, true);
    root.compile_patterns(0)?;
    Ok(Filter::new(vec![Statement::new(root)]))
}

// --- Grammar ---

fn branches(input: &str) -> IResult<&str, Vec<Branch>> {
    separated_list1(ws(char(',')), branch).parse(input)
}

fn branch(input: &str) -> IResult<&str, Branch> {
    let (i, negated) = lexer::negation(input)?;
    let (i, mut nodes) = alt((group, map(segment, |n| vec![n]))).parse(i)?;
    if negated {
        for node in &mut nodes {
            negate_chain(node);
        }
    }
    Ok((i, Branch { nodes, negated }))
}

/// One path segment: a name, its function chains, and an optional tail
/// (a dot-path continuation or a nested block).
fn segment(input: &str) -> IResult<&str, ExpressionNode> {
    let (i, mut node) = alt((
        map(lexer::regex_literal, ExpressionNode::regex_literal),
        map(lexer::field_name, ExpressionNode::named),
    ))
    .parse(input)?;

    let (i, chains) = many0(function_chain).parse(i)?;
    for (is_key, calls) in chains {
        for call in calls {
            if is_key {
                node.push_key_function(call);
            } else {
                node.push_value_function(call);
            }
        }
    }

    let (i, tail) = opt(alt((
        map(dot_tail, Tail::Dot),
        map(nested_block, Tail::Nested),
    )))
    .parse(i)?;

    match tail {
        Some(Tail::Dot(child)) => {
            // Dot-path sugar: a.b.c nests without marking intermediates squiggly.
            node.children_mut().push(*child);
        }
        Some(Tail::Nested(nested)) => attach_nested(&mut node, nested),
        None => {}
    }

    Ok((i, node))
}

enum Tail {
    Dot(Box<ExpressionNode>),
    Nested(Vec<Branch>),
}

fn dot_tail(input: &str) -> IResult<&str, Box<ExpressionNode>> {
    map(preceded(char('.'), segment), Box::new).parse(input)
}

fn nested_block(input: &str) -> IResult<&str, Vec<Branch>> {
    map(
        alt((
            delimited(ws(char('{')), opt(branches), ws(char('}'))),
            delimited(ws(char('[')), opt(branches), ws(char(']'))),
        )),
        Option::unwrap_or_default,
    )
    .parse(input)
}

/// A parenthesized group `(a,b)`; trailing function chains and a tail
/// distribute across every member.
fn group(input: &str) -> IResult<&str, Vec<ExpressionNode>> {
    let (i, inner) = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), branch),
        ws(char(')')),
    )
    .parse(input)?;

    let (i, chains) = many0(function_chain).parse(i)?;
    let (i, tail) = opt(alt((
        map(dot_tail, Tail::Dot),
        map(nested_block, Tail::Nested),
    )))
    .parse(i)?;

    let mut nodes = Vec::new();
    for branch in inner {
        for mut node in branch.nodes {
            let leaf = chain_leaf_mut(&mut node);
            for (is_key, calls) in &chains {
                for call in calls {
                    if *is_key {
                        leaf.push_key_function(call.clone());
                    } else {
                        leaf.push_value_function(call.clone());
                    }
                }
            }
            match &tail {
                Some(Tail::Dot(child)) => leaf.children_mut().push((**child).clone()),
                Some(Tail::Nested(nested)) => attach_nested_cloned(leaf, nested),
                None => {}
            }
            nodes.push(node);
        }
    }
    Ok((i, nodes))
}

fn function_chain(input: &str) -> IResult<&str, (bool, Vec<FunctionCall>)> {
    let (i, marker) = alt((tag("@@"), tag("@"))).parse(input)?;
    let (i, calls) = separated_list1(char('.'), function_call).parse(i)?;
    Ok((i, (marker == "@@", calls)))
}

fn function_call(input: &str) -> IResult<&str, FunctionCall> {
    let (i, name) = lexer::identifier(input)?;
    let (i, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), function_arg),
        ws(char(')')),
    ))
    .parse(i)?;
    Ok((
        i,
        FunctionCall {
            name: name.to_string(),
            args: args.unwrap_or_default(),
        },
    ))
}

fn function_arg(input: &str) -> IResult<&str, FunctionArg> {
    // An identifier is a keyword literal, a nested call (when followed by
    // parentheses) or a plain reference, in that order.
    if let Ok((i, name)) = lexer::identifier(input) {
        match name {
            "true" => return Ok((i, FunctionArg::Literal(Value::Bool(true)))),
            "false" => return Ok((i, FunctionArg::Literal(Value::Bool(false)))),
            "null" => return Ok((i, FunctionArg::Literal(Value::Null))),
            _ => {}
        }
        let (i, args) = opt(delimited(
            ws(char('(')),
            separated_list0(ws(char(',')), function_arg),
            ws(char(')')),
        ))
        .parse(i)?;
        return Ok((
            i,
            match args {
                Some(args) => FunctionArg::Call(FunctionCall {
                    name: name.to_string(),
                    args,
                }),
                None => FunctionArg::Ref(name.to_string()),
            },
        ));
    }
    map(lexer::literal, FunctionArg::Literal).parse(input)
}

// --- Tree assembly ---

fn attach_nested(node: &mut ExpressionNode, branches: Vec<Branch>) {
    node.set_squiggly(true);
    let all_negated = !branches.is_empty() && branches.iter().all(|b| b.negated);
    let children = node.children_mut();
    for branch in branches {
        for child in branch.nodes {
            ExpressionNode::add_merged(children, child);
        }
    }
    if all_negated {
        ExpressionNode::add_merged(children, ExpressionNode::any_deep());
    }
    let is_empty = children.is_empty();
    node.set_empty_nested(is_empty);
}

fn attach_nested_cloned(node: &mut ExpressionNode, branches: &[Branch]) {
    node.set_squiggly(true);
    let all_negated = !branches.is_empty() && branches.iter().all(|b| b.negated);
    let children = node.children_mut();
    for branch in branches {
        for child in &branch.nodes {
            ExpressionNode::add_merged(children, child.clone());
        }
    }
    if all_negated {
        ExpressionNode::add_merged(children, ExpressionNode::any_deep());
    }
    let is_empty = children.is_empty();
    node.set_empty_nested(is_empty);
}

/// Follows dot-path sugar down to the deepest segment of a chain.
fn chain_leaf_mut(node: &mut ExpressionNode) -> &mut ExpressionNode {
    if !node.is_squiggly() && node.children().len() == 1 {
        chain_leaf_mut(&mut node.children_mut()[0])
    } else {
        node
    }
}

/// Applies a leading `-` to a branch. The negation lands on the chain leaf
/// (`-a.b.c` excludes `c` only) and every intermediate gains a deep include
/// so that siblings of the excluded path survive.
fn negate_chain(node: &mut ExpressionNode) {
    if !node.is_squiggly() && node.children().len() == 1 {
        ExpressionNode::add_merged(node.children_mut(), ExpressionNode::any_deep());
        negate_chain(&mut node.children_mut()[0]);
    } else {
        node.set_negated(true);
    }
}

// --- View expansion ---

/// Replaces registered view names with their field bundles. A node is only
/// eligible while still pristine: bare, non-negated, childless and without
/// functions. Anything else stays a field, including a view name that also
/// appeared as a field and was merged with it.
fn expand_views(
    node: &mut ExpressionNode,
    views: &dyn ViewSource,
    config: &EngineConfig,
    top_level: bool,
) {
    if top_level || config.filter_propagate_view_to_nested_filters {
        let children = node.children_mut();
        let taken: Vec<ExpressionNode> = children.drain(..).collect();
        for child in taken {
            let eligible = child.kind() == NameKind::Exact
                && !child.is_negated()
                && !child.is_squiggly()
                && child.children().is_empty()
                && child.key_functions().is_empty()
                && child.value_functions().is_empty();
            if eligible {
                if let Some(mut fields) = views.resolve(child.name()) {
                    if config.filter_implicitly_include_base_fields_in_view
                        && child.name() != BASE_VIEW
                    {
                        if let Some(base) = views.resolve(BASE_VIEW) {
                            fields.extend(base);
                        }
                    }
                    for field in fields {
                        ExpressionNode::add_merged(children, ExpressionNode::named(&field));
                    }
                    continue;
                }
            }
            ExpressionNode::add_merged(children, child);
        }
    }

    if config.filter_propagate_view_to_nested_filters {
        for child in node.children_mut() {
            expand_views(child, views, config, false);
        }
    }
}
