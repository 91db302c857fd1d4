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

//! The direct backtracking engine: interprets pattern operators in place,
//! without materializing an expansion set. Optional and Loop unfold by
//! splicing their bodies into the element walk, Anything recurses onto
//! suffix matching, and parallel groups are collected as sub-problems that
//! are verified once the linear walk succeeds.
//!
//! The anchored entry point is also the sequence-branch matcher used by the
//! parallel solver.

use crate::matcher::node_match;
use crate::solver;
use crate::tree::{matches_empty, Node};

/// Match a query element list against a variant element list. Start/End
/// markers at the endpoints anchor the window; without them every start
/// offset is tried and a trailing remainder is permitted.
pub(crate) fn match_sequence(query: &[Node], variant: &[Node], cap: u32) -> bool {
    if query.is_empty() {
        return true;
    }

    let has_start = matches!(query.first(), Some(Node::Start));
    let has_end = matches!(query.last(), Some(Node::End));

    // Anchors need an element to anchor to.
    if variant.is_empty() && (has_start || has_end) {
        return false;
    }

    let content: Vec<&Node> = query[usize::from(has_start)..query.len() - usize::from(has_end)]
        .iter()
        .collect();

    // Bare anchors, or content that can match the empty word, match any
    // remaining variant.
    if content.iter().all(|element| matches_empty(element)) {
        return true;
    }
    if variant.is_empty() {
        return false;
    }

    if has_start {
        match_window(&content, variant, has_end, cap)
    } else {
        (0..variant.len()).any(|i| match_window(&content, &variant[i..], has_end, cap))
    }
}

/// Exact match: the query must consume `variant` from its first element to
/// its last. Anchor markers at the endpoints are redundant here and are
/// stripped. This is how sequence branches inside parallel groups are
/// matched.
pub(crate) fn match_anchored(query: &[Node], variant: &[Node], cap: u32) -> bool {
    let has_start = matches!(query.first(), Some(Node::Start));
    let has_end = matches!(query.last(), Some(Node::End));
    let content: Vec<&Node> = query[usize::from(has_start)..query.len() - usize::from(has_end)]
        .iter()
        .collect();

    if content.is_empty() {
        return variant.is_empty();
    }
    match_window(&content, variant, true, cap)
}

fn match_window(q: &[&Node], v: &[Node], consume_all: bool, cap: u32) -> bool {
    let mut subproblems = Vec::new();
    match_here(q, v, consume_all, cap, &mut subproblems)
}

/// Match `q` against `v` starting exactly at `v[0]`. Parallel pairs are
/// pushed onto `subproblems` and only solved at the success leaf; every
/// backtracking site truncates the list back to its own depth.
fn match_here<'a>(
    q: &[&'a Node],
    v: &'a [Node],
    consume_all: bool,
    cap: u32,
    subproblems: &mut Vec<(&'a Node, &'a Node)>,
) -> bool {
    let (first, rest) = match q.split_first() {
        None => {
            if consume_all && !v.is_empty() {
                return false;
            }
            return subproblems
                .iter()
                .all(|(sq, sv)| solver::match_parallel(sq.children(), sv.children(), cap));
        }
        Some((first, rest)) => (*first, rest),
    };

    match first {
        Node::Optional(body) => {
            let depth = subproblems.len();
            let mut taken = Vec::with_capacity(rest.len() + 2);
            splice_into(&mut taken, body);
            taken.extend_from_slice(rest);
            if match_here(&taken, v, consume_all, cap, subproblems) {
                return true;
            }
            subproblems.truncate(depth);
            match_here(rest, v, consume_all, cap, subproblems)
        }
        Node::Loop { body, min, max } => {
            let depth = subproblems.len();
            let eff_max = max.unwrap_or(cap).min(cap);
            for k in *min..=eff_max {
                if k as usize > v.len() && consumes_input(body) {
                    break;
                }
                let mut unrolled = Vec::with_capacity(rest.len() + k as usize);
                for _ in 0..k {
                    splice_into(&mut unrolled, body);
                }
                unrolled.extend_from_slice(rest);
                if match_here(&unrolled, v, consume_all, cap, subproblems) {
                    return true;
                }
                subproblems.truncate(depth);
            }
            false
        }
        Node::Anything => {
            let depth = subproblems.len();
            for take in 1..=v.len() {
                if match_here(rest, &v[take..], consume_all, cap, subproblems) {
                    return true;
                }
                subproblems.truncate(depth);
            }
            false
        }
        Node::Parallel(_) => match v.first() {
            Some(element @ Node::Parallel(_)) => {
                let depth = subproblems.len();
                subproblems.push((first, element));
                if match_here(rest, &v[1..], consume_all, cap, subproblems) {
                    true
                } else {
                    subproblems.truncate(depth);
                    false
                }
            }
            _ => false,
        },
        Node::Sequence(children) => match v.first() {
            Some(Node::Sequence(branch)) if match_anchored(children, branch, cap) => {
                match_here(rest, &v[1..], consume_all, cap, subproblems)
            }
            _ => false,
        },
        // Anchors inside the window never match; they are stripped at the
        // entry points and rejected elsewhere at construction.
        Node::Start | Node::End => false,
        _ => match v.first() {
            Some(element) if node_match(first, element) => {
                match_here(rest, &v[1..], consume_all, cap, subproblems)
            }
            _ => false,
        },
    }
}

// Optional and Loop bodies that are sequences unfold into their elements,
// mirroring the flattening the expansion engine performs.
fn splice_into<'a>(out: &mut Vec<&'a Node>, body: &'a Node) {
    match body {
        Node::Sequence(children) => out.extend(children.iter()),
        other => out.push(other),
    }
}

// True if one repetition of `body` always consumes at least one element,
// which bounds useful unroll counts by the remaining variant length.
fn consumes_input(body: &Node) -> bool {
    matches!(
        body,
        Node::Leaf(_)
            | Node::Wildcard
            | Node::Anything
            | Node::Choice(_)
            | Node::Fallthrough(_)
            | Node::Parallel(_)
    )
}
