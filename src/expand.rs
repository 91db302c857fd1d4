/*
Copyright 2021 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

     https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Query expansion: rewrite a query with Optional/Loop operators into a
//! finite disjunction of operator-free element lists. An Optional
//! contributes its body and an empty path, a Loop the k-fold concatenations
//! of its body for every k in range, and compound children the Cartesian
//! product of their own expansions. Same-kind nesting (a Sequence expanded
//! into a Sequence, a Parallel into a Parallel) is inlined, and sequence
//! branches of parallel groups are wrapped with Start/End markers so they
//! stay anchored to their branch boundaries.

use crate::query::QueryOptions;
use crate::tree::Node;
use crate::QueryError;

#[derive(Clone, Copy, PartialEq)]
enum GroupKind {
    Sequence,
    Parallel,
}

/// Expand a canonical query (a Sequence root) into the disjunction of its
/// operator-free top-level element lists. Fails when the disjunction grows
/// past `options.expansion_limit`.
pub(crate) fn expand_query(
    query: &Node,
    options: &QueryOptions,
) -> Result<Vec<Vec<Node>>, QueryError> {
    let children = match query {
        Node::Sequence(children) => children,
        _ => unreachable!("queries are canonicalized to a sequence root"),
    };
    expand_elements(children, GroupKind::Sequence, options)
}

fn expand_elements(
    children: &[Node],
    kind: GroupKind,
    options: &QueryOptions,
) -> Result<Vec<Vec<Node>>, QueryError> {
    let mut paths: Vec<Vec<Node>> = vec![Vec::new()];
    for child in children {
        let alternatives = expand_alternatives(child, options)?;
        paths = merge(paths, &alternatives, kind, options)?;
    }
    Ok(paths)
}

// The alternatives one child contributes to its parent's paths. Each
// alternative is a list of sibling elements (empty for a skipped Optional);
// whether a compound element gets inlined is decided by the parent in
// `merge`.
fn expand_alternatives(node: &Node, options: &QueryOptions) -> Result<Vec<Vec<Node>>, QueryError> {
    match node {
        Node::Leaf(_)
        | Node::Wildcard
        | Node::Anything
        | Node::Choice(_)
        | Node::Fallthrough(_)
        | Node::Start
        | Node::End => Ok(vec![vec![node.clone()]]),
        Node::Optional(body) => {
            let mut alternatives = expand_alternatives(body, options)?;
            alternatives.push(Vec::new());
            Ok(alternatives)
        }
        Node::Loop { body, min, max } => {
            let eff_max = max.unwrap_or(options.loop_cap).min(options.loop_cap);
            let body_alternatives = expand_alternatives(body, options)?;

            let mut acc: Vec<Vec<Node>> = vec![Vec::new()];
            for _ in 0..*min {
                acc = concat(acc, &body_alternatives, options)?;
            }
            let mut out = acc.clone();
            for _ in *min..eff_max {
                acc = concat(acc, &body_alternatives, options)?;
                out.extend(acc.iter().cloned());
            }
            Ok(out)
        }
        Node::Sequence(children) => {
            let paths = expand_elements(children, GroupKind::Sequence, options)?;
            Ok(paths.into_iter().map(|p| vec![Node::Sequence(p)]).collect())
        }
        Node::Parallel(children) => {
            let anchored = anchor_sequence_branches(children);
            let paths = expand_elements(&anchored, GroupKind::Parallel, options)?;
            Ok(paths.into_iter().map(|p| vec![Node::Parallel(p)]).collect())
        }
    }
}

// Cartesian product of the paths built so far with one child's
// alternatives. Alternative elements of the parent's own kind are inlined.
fn merge(
    paths: Vec<Vec<Node>>,
    alternatives: &[Vec<Node>],
    kind: GroupKind,
    options: &QueryOptions,
) -> Result<Vec<Vec<Node>>, QueryError> {
    check_size(paths.len(), alternatives.len(), options)?;

    let mut out = Vec::with_capacity(paths.len() * alternatives.len());
    for path in &paths {
        for alternative in alternatives {
            let mut combined = path.clone();
            for element in alternative {
                match (element, kind) {
                    (Node::Sequence(inner), GroupKind::Sequence)
                    | (Node::Parallel(inner), GroupKind::Parallel) => {
                        combined.extend(inner.iter().cloned());
                    }
                    _ => combined.push(element.clone()),
                }
            }
            out.push(combined);
        }
    }
    Ok(out)
}

// Element-list concatenation for loop unrolling; no inlining happens here,
// the parent's `merge` decides that.
fn concat(
    paths: Vec<Vec<Node>>,
    alternatives: &[Vec<Node>],
    options: &QueryOptions,
) -> Result<Vec<Vec<Node>>, QueryError> {
    check_size(paths.len(), alternatives.len(), options)?;

    let mut out = Vec::with_capacity(paths.len() * alternatives.len());
    for path in &paths {
        for alternative in alternatives {
            let mut combined = path.clone();
            combined.extend(alternative.iter().cloned());
            out.push(combined);
        }
    }
    Ok(out)
}

fn check_size(paths: usize, alternatives: usize, options: &QueryOptions) -> Result<(), QueryError> {
    if paths.saturating_mul(alternatives.max(1)) > options.expansion_limit {
        return Err(QueryError {
            message: format!(
                "query expansion exceeds the limit of {} alternatives",
                options.expansion_limit
            ),
        });
    }
    Ok(())
}

// Wrap direct sequence branches with Start/End so that a sub-sequence
// inside a parallel stays anchored to its branch's boundaries.
fn anchor_sequence_branches(children: &[Node]) -> Vec<Node> {
    children
        .iter()
        .map(|child| match child {
            Node::Sequence(inner) => {
                let mut wrapped = Vec::with_capacity(inner.len() + 2);
                if !matches!(inner.first(), Some(Node::Start)) {
                    wrapped.push(Node::Start);
                }
                wrapped.extend(inner.iter().cloned());
                if !matches!(inner.last(), Some(Node::End)) {
                    wrapped.push(Node::End);
                }
                Node::Sequence(wrapped)
            }
            other => other.clone(),
        })
        .collect()
}
