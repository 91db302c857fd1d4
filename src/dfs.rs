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

//! The expansion engine: at construction the query is unfolded into a
//! disjunction of operator-free element lists (see `expand`), at match time
//! each list is run through a sliding-window depth-first search with
//! backtracking over the Anything consumption counts.

use crate::direct;
use crate::expand::expand_query;
use crate::matcher::node_match;
use crate::query::QueryOptions;
use crate::solver;
use crate::tree::Node;
use crate::QueryError;

#[derive(Debug)]
pub(crate) struct DfsEngine {
    expansions: Vec<Vec<Node>>,
    cap: u32,
}

impl DfsEngine {
    pub(crate) fn build(query: &Node, options: &QueryOptions) -> Result<DfsEngine, QueryError> {
        let expansions = expand_query(query, options)?;
        info!("expanded query into {} alternatives", expansions.len());
        Ok(DfsEngine {
            expansions,
            cap: options.loop_cap,
        })
    }

    pub(crate) fn matches(&self, variant: &[Node]) -> bool {
        self.expansions
            .iter()
            .any(|expansion| match_expanded(expansion, variant, self.cap))
    }
}

// One expanded (operator-free) query against the variant.
fn match_expanded(query: &[Node], variant: &[Node], cap: u32) -> bool {
    if query.is_empty() {
        return true;
    }
    if variant.is_empty() {
        return false;
    }

    let has_start = matches!(query.first(), Some(Node::Start));
    let has_end = matches!(query.last(), Some(Node::End));
    let content = &query[usize::from(has_start)..query.len() - usize::from(has_end)];

    if content.is_empty() {
        return true;
    }

    if has_start {
        dfs(content, variant, has_end, cap)
    } else {
        (0..variant.len()).any(|i| dfs(content, &variant[i..], has_end, cap))
    }
}

fn dfs(q: &[Node], v: &[Node], consume_all: bool, cap: u32) -> bool {
    let (first, rest) = match q.split_first() {
        None => return !consume_all || v.is_empty(),
        Some(split) => split,
    };

    match first {
        Node::Anything => (1..=v.len()).any(|take| dfs(rest, &v[take..], consume_all, cap)),
        Node::Parallel(branches) => match v.first() {
            Some(Node::Parallel(element)) if solver::match_parallel(branches, element, cap) => {
                dfs(rest, &v[1..], consume_all, cap)
            }
            _ => false,
        },
        Node::Sequence(children) => match v.first() {
            Some(Node::Sequence(element)) if direct::match_anchored(children, element, cap) => {
                dfs(rest, &v[1..], consume_all, cap)
            }
            _ => false,
        },
        _ => match v.first() {
            Some(element) if node_match(first, element) => dfs(rest, &v[1..], consume_all, cap),
            _ => false,
        },
    }
}
