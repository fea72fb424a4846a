//! Specificity-ranked matching of document paths against expression trees.

use crate::node::DocumentPath;
use crate::parser::ast::ExpressionNode;

/// Outcome of matching one document path against a statement root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpressionMatch<'a> {
    /// The node at this path is kept; the winning expression supplies the
    /// key/value functions to apply.
    Include(&'a ExpressionNode),
    /// A negated expression matched; the node is omitted.
    Exclude,
    /// Nothing can match at or below this path; the subtree is pruned
    /// without further descent.
    NeverMatch,
}

impl ExpressionMatch<'_> {
    pub fn is_include(&self) -> bool {
        matches!(self, ExpressionMatch::Include(_))
    }
}

/// Walks `root`'s children in lockstep with the path's property elements,
/// scoring candidates by specificity at each depth.
///
/// Array index elements never match by name and are skipped entirely. An
/// `**` winner stays live for every deeper element; a matched childless,
/// non-squiggly expression includes its whole subtree.
pub fn match_path<'a>(path: &DocumentPath, root: &'a ExpressionNode) -> ExpressionMatch<'a> {
    let names: Vec<&str> = path.property_names().collect();
    if names.is_empty() {
        // Only index elements so far; the node passes through.
        return ExpressionMatch::Include(root);
    }

    let mut candidates: &[ExpressionNode] = root.children();
    // An any-deep winner from a shallower level; applies to all descendants.
    let mut deep: Option<&'a ExpressionNode> = None;
    // A childless, non-squiggly match whose subtree is included wholesale.
    let mut leaf: Option<&'a ExpressionNode> = None;

    for (i, &name) in names.iter().enumerate() {
        let last = i + 1 == names.len();

        if candidates.is_empty() && deep.is_none() {
            return match leaf {
                Some(node) => ExpressionMatch::Include(node),
                None => ExpressionMatch::NeverMatch,
            };
        }

        // Seed the include slot with the inherited any-deep node so that
        // equally specific current-level candidates take precedence over it.
        let mut best_include: Option<(i64, &ExpressionNode)> =
            deep.and_then(|d| d.match_name(name).map(|score| (score, d)));
        let mut best_exclude: Option<(i64, &ExpressionNode)> = None;

        for child in candidates {
            if let Some(score) = child.match_name(name) {
                let slot = if child.is_negated() {
                    &mut best_exclude
                } else {
                    &mut best_include
                };
                // On equal specificity the later declaration wins.
                if slot.map_or(true, |(best, _)| score >= best) {
                    *slot = Some((score, child));
                }
            }
        }

        let winner = match (best_include, best_exclude) {
            (None, None) => {
                return match leaf {
                    Some(node) => ExpressionMatch::Include(node),
                    None => ExpressionMatch::NeverMatch,
                };
            }
            (include, Some((exclude_score, _)))
                if include.is_none_or(|(include_score, _)| exclude_score >= include_score) =>
            {
                // An exclusion at least as specific as any inclusion wins.
                // Mid-path this is unreachable in practice because the walker
                // prunes the excluded ancestor first.
                return if last {
                    ExpressionMatch::Exclude
                } else {
                    ExpressionMatch::NeverMatch
                };
            }
            (Some((_, node)), _) => node,
            (None, Some(_)) => unreachable!("guarded above"),
        };

        if last {
            return ExpressionMatch::Include(winner);
        }
        if winner.is_empty_nested() {
            // foo{} keeps foo itself but prunes everything below it.
            return ExpressionMatch::NeverMatch;
        }
        if winner.is_any_deep() {
            deep = Some(winner);
            candidates = &[];
            leaf = None;
        } else {
            candidates = winner.children();
            deep = None;
            leaf = (candidates.is_empty() && !winner.is_squiggly()).then_some(winner);
        }
    }

    ExpressionMatch::NeverMatch
}
