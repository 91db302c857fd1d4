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

//! varql evaluates structural pattern queries against process variants.
//! A variant is a tree of sequence, parallel and leaf nodes describing one
//! observed process execution; a query adds pattern operators on top
//! (choice, wildcard, anything, optional, loop, fallthrough, start/end
//! anchors). `build_query` prepares a query for one of four interchangeable
//! engines and the resulting [`MatchableQuery`] answers a single boolean
//! per variant.

#[macro_use]
extern crate log;

mod dfs;
mod direct;
mod expand;
mod matcher;
mod solver;
mod vm;

pub mod query;
pub mod tree;

pub use crate::query::{Engine, MatchableQuery, QueryOptions};
pub use crate::tree::Node;

/// A query violated a structural invariant at construction time.
#[derive(Debug, Clone)]
pub struct QueryError {
    pub message: String,
}

/// Build a [`MatchableQuery`] for `root` with the default options.
pub fn build_query(root: &Node, engine: Engine) -> Result<MatchableQuery, QueryError> {
    build_query_with(root, engine, QueryOptions::default())
}

/// Build a [`MatchableQuery`] for `root` with explicit options.
///
/// The query is validated and then deep-copied into a canonical,
/// engine-private form; the caller's tree is never mutated. A non-sequence
/// root is wrapped into a one-element sequence.
pub fn build_query_with(
    root: &Node,
    engine: Engine,
    options: QueryOptions,
) -> Result<MatchableQuery, QueryError> {
    validate_query(root, options.loop_cap)?;
    let canonical = tree::canonicalize_root(root, options.loop_cap);
    MatchableQuery::build(canonical, engine, &options)
}

/// Validates the structural invariants of a user supplied query: choice and
/// fallthrough children must be leaves, loop bounds must be ordered and
/// satisfiable under the unroll ceiling, and start/end anchors may only sit
/// at the boundaries of the outer sequence or of a parallel branch.
fn validate_query(root: &Node, loop_cap: u32) -> Result<(), QueryError> {
    let top: &[Node] = match root {
        Node::Sequence(children) => children,
        other => std::slice::from_ref(other),
    };
    validate_sequence(top, loop_cap, true)
}

fn validate_sequence(children: &[Node], loop_cap: u32, anchors: bool) -> Result<(), QueryError> {
    for (i, child) in children.iter().enumerate() {
        match child {
            Node::Start => {
                if !(anchors && i == 0) {
                    return Err(QueryError {
                        message: "start anchor must be the first element of its sequence"
                            .to_string(),
                    });
                }
            }
            Node::End => {
                if !(anchors && i == children.len() - 1) {
                    return Err(QueryError {
                        message: "end anchor must be the last element of its sequence".to_string(),
                    });
                }
            }
            other => validate_node(other, loop_cap)?,
        }
    }
    Ok(())
}

fn validate_node(node: &Node, loop_cap: u32) -> Result<(), QueryError> {
    match node {
        Node::Leaf(_) | Node::Wildcard | Node::Anything => Ok(()),
        Node::Start | Node::End => Err(QueryError {
            message: "start/end anchors may only sit at a sequence boundary".to_string(),
        }),
        Node::Choice(children) => leaves_only(children, "choice"),
        Node::Fallthrough(children) => leaves_only(children, "fallthrough"),
        Node::Optional(body) => validate_node(body, loop_cap),
        Node::Loop { body, min, max } => {
            loop_bounds(*min, *max, loop_cap)?;
            validate_node(body, loop_cap)
        }
        Node::Parallel(children) => {
            for child in children {
                validate_branch(child, loop_cap)?;
            }
            Ok(())
        }
        Node::Sequence(children) => validate_sequence(children, loop_cap, false),
    }
}

// A parallel branch may be a sequence, possibly wrapped in Optional/Loop
// layers; its boundary anchors stay meaningful through the wrappers, which
// the solver unfolds onto its queue one layer at a time.
fn validate_branch(child: &Node, loop_cap: u32) -> Result<(), QueryError> {
    match child {
        Node::Sequence(branch) => validate_sequence(branch, loop_cap, true),
        Node::Optional(body) => validate_branch(body, loop_cap),
        Node::Loop { body, min, max } => {
            loop_bounds(*min, *max, loop_cap)?;
            validate_branch(body, loop_cap)
        }
        other => validate_node(other, loop_cap),
    }
}

fn loop_bounds(min: u32, max: Option<u32>, loop_cap: u32) -> Result<(), QueryError> {
    if let Some(max) = max {
        if max < min {
            return Err(QueryError {
                message: format!("loop bounds inverted: min {} > max {}", min, max),
            });
        }
    }
    if min > loop_cap {
        return Err(QueryError {
            message: format!(
                "loop minimum {} exceeds the unroll ceiling {}",
                min, loop_cap
            ),
        });
    }
    Ok(())
}

fn leaves_only(children: &[Node], kind: &str) -> Result<(), QueryError> {
    for child in children {
        if !matches!(child, Node::Leaf(_)) {
            return Err(QueryError {
                message: format!("{} children must be leaves, found {}", kind, child.kind()),
            });
        }
    }
    Ok(())
}
