//! Defines the Abstract Syntax Tree (AST) for filter expressions.
//!
//! A parsed [`Filter`] is immutable and freely shareable across concurrent
//! walks; all mutation happens inside the parser before the tree is frozen.

use crate::error::SiftError;
use regex::Regex;
use serde_json::Value;
use std::fmt;

pub const ANY_DEEP: &str = "**";
pub const ANY_SHALLOW: &str = "*";

/// Name of the synthetic root expression that holds a statement's top-level
/// branches. It never participates in matching itself.
pub(crate) const ROOT_NAME: &str = "$";

/// How an expression name matches a path element, decided at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A literal field name, matched by string equality.
    Exact,
    /// `*`, matching any name at the current depth.
    AnyShallow,
    /// `**`, matching any name at any depth.
    AnyDeep,
    /// A name embedding `*` / `?` wildcards, compiled to a regex.
    Glob,
    /// A `~pattern~flags` or `/pattern/flags` literal.
    Regex,
}

/// A single function invocation written after `@` or `@@`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<FunctionArg>,
}

/// An argument to a [`FunctionCall`]. The engine evaluates shape only;
/// semantics belong to the function registry.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArg {
    /// A literal string, number, boolean or null.
    Literal(Value),
    /// A bare identifier, passed through by name.
    Ref(String),
    /// A nested call, invoked against the current threaded value.
    Call(FunctionCall),
}

/// One node of a filter expression: a name pattern, its nested projection,
/// and the functions to apply to a matched property.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    name: String,
    raw_name: String,
    kind: NameKind,
    negated: bool,
    squiggly: bool,
    empty_nested: bool,
    regex: Option<Regex>,
    children: Vec<ExpressionNode>,
    key_functions: Vec<FunctionCall>,
    value_functions: Vec<FunctionCall>,
}

impl PartialEq for ExpressionNode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.negated == other.negated
            && self.squiggly == other.squiggly
            && self.empty_nested == other.empty_nested
            && self.children == other.children
            && self.key_functions == other.key_functions
            && self.value_functions == other.value_functions
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-")?;
        }
        write!(f, "{}", self.name)
    }
}

impl ExpressionNode {
    /// Creates a leaf node, classifying the name into a [`NameKind`].
    /// Patterns are compiled later, in a single pass over the finished tree.
    pub(crate) fn named(name: &str) -> Self {
        let kind = match name {
            ANY_DEEP => NameKind::AnyDeep,
            ANY_SHALLOW => NameKind::AnyShallow,
            _ if name.contains(['*', '?']) => NameKind::Glob,
            _ => NameKind::Exact,
        };
        Self::with_kind(name.to_string(), kind)
    }

    /// Creates a regex-literal node. `name` is the pattern text with flags
    /// folded in as an inline `(?i)` group.
    pub(crate) fn regex_literal(pattern: String) -> Self {
        Self::with_kind(pattern, NameKind::Regex)
    }

    pub(crate) fn any_deep() -> Self {
        Self::named(ANY_DEEP)
    }

    pub(crate) fn root() -> Self {
        let mut node = Self::named(ROOT_NAME);
        node.squiggly = true;
        node
    }

    fn with_kind(name: String, kind: NameKind) -> Self {
        let raw_name = match kind {
            NameKind::Glob | NameKind::Regex => name.replace(['*', '?'], ""),
            _ => name.clone(),
        };
        Self {
            name,
            raw_name,
            kind,
            negated: false,
            squiggly: false,
            empty_nested: false,
            regex: None,
            children: Vec::new(),
            key_functions: Vec::new(),
            value_functions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name with wildcard characters stripped; used for specificity
    /// tie-breaks between patterns.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn kind(&self) -> NameKind {
        self.kind
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// A node is squiggly if it was written with an explicit nested block:
    /// in `id,foo{bar}` the `foo` node is squiggly, `id` and `bar` are not.
    pub fn is_squiggly(&self) -> bool {
        self.squiggly
    }

    /// True when the filter explicitly specified an empty block (`foo{}`),
    /// which prunes every child of the matched node.
    pub fn is_empty_nested(&self) -> bool {
        self.empty_nested
    }

    pub fn is_any_deep(&self) -> bool {
        self.kind == NameKind::AnyDeep
    }

    pub fn is_any_shallow(&self) -> bool {
        self.kind == NameKind::AnyShallow
    }

    pub fn children(&self) -> &[ExpressionNode] {
        &self.children
    }

    pub fn key_functions(&self) -> &[FunctionCall] {
        &self.key_functions
    }

    pub fn value_functions(&self) -> &[FunctionCall] {
        &self.value_functions
    }

    /// Scores this node against a path element name.
    ///
    /// Exact matches rank highest, then patterns by the length of their
    /// literal text, then `*`, then `**`. `None` means no match.
    pub fn match_name(&self, other: &str) -> Option<i64> {
        match self.kind {
            NameKind::Exact => (self.name == other).then_some(i64::MAX),
            NameKind::AnyShallow => Some(1),
            NameKind::AnyDeep => Some(0),
            NameKind::Glob | NameKind::Regex => {
                let regex = self.regex.as_ref()?;
                regex
                    .is_match(other)
                    .then_some(self.raw_name.len() as i64 + 2)
            }
        }
    }

    pub(crate) fn set_negated(&mut self, negated: bool) {
        self.negated = negated;
    }

    pub(crate) fn set_squiggly(&mut self, squiggly: bool) {
        self.squiggly = squiggly;
    }

    pub(crate) fn set_empty_nested(&mut self, empty_nested: bool) {
        self.empty_nested = empty_nested;
    }

    pub(crate) fn push_key_function(&mut self, call: FunctionCall) {
        self.key_functions.push(call);
    }

    pub(crate) fn push_value_function(&mut self, call: FunctionCall) {
        self.value_functions.push(call);
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.children
    }

    /// Adds `node` to `list`, merging it into an existing sibling with the
    /// same name and polarity. Merging keeps `assignee[firstName]` and
    /// `assignee[lastName]` from shadowing each other.
    pub(crate) fn add_merged(list: &mut Vec<ExpressionNode>, node: ExpressionNode) {
        if let Some(existing) = list
            .iter_mut()
            .find(|e| e.name == node.name && e.negated == node.negated)
        {
            existing.squiggly |= node.squiggly;
            existing.key_functions.extend(node.key_functions);
            existing.value_functions.extend(node.value_functions);
            for child in node.children {
                Self::add_merged(&mut existing.children, child);
            }
            existing.empty_nested =
                (existing.empty_nested || node.empty_nested) && existing.children.is_empty();
        } else {
            list.push(node);
        }
    }

    /// Compiles glob and regex names throughout the subtree. Called once by
    /// the parser after the tree shape is final.
    pub(crate) fn compile_patterns(&mut self, position: usize) -> Result<(), SiftError> {
        match self.kind {
            NameKind::Glob => {
                let mut pattern = String::with_capacity(self.name.len() + 8);
                pattern.push('^');
                for c in self.name.chars() {
                    match c {
                        '*' => pattern.push_str(".*"),
                        '?' => pattern.push('.'),
                        _ => pattern.push_str(&regex::escape(&c.to_string())),
                    }
                }
                pattern.push('$');
                self.regex = Some(Regex::new(&pattern).map_err(|e| {
                    SiftError::syntax(position, format!("invalid wildcard name: {e}"))
                })?);
            }
            NameKind::Regex => {
                let pattern = format!("^{}$", self.name);
                self.regex = Some(Regex::new(&pattern).map_err(|e| {
                    SiftError::syntax(position, format!("invalid regex literal: {e}"))
                })?);
            }
            _ => {}
        }
        for child in &mut self.children {
            child.compile_patterns(position)?;
        }
        Ok(())
    }
}

/// One top-level branch group of a filter. The root expression is synthetic;
/// its children are the comma-separated branches as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    root: ExpressionNode,
}

impl Statement {
    pub(crate) fn new(root: ExpressionNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }
}

/// A parsed filter: an ordered sequence of statements combined by set-union
/// over matched paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    statements: Vec<Statement>,
}

impl Filter {
    pub(crate) fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}
