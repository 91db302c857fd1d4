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

//! Behavior of the expansion engine, driven through the facade.

use varql::{build_query, build_query_with, Engine, Node, QueryOptions};

fn l(label: &str) -> Node {
    Node::leaf(label)
}

fn trace(labels: &[&str]) -> Node {
    Node::seq(labels.iter().map(|s| Node::leaf(*s)).collect())
}

fn dfs_matches(query: &Node, variant: &Node) -> bool {
    build_query(query, Engine::Dfs).unwrap().matches(variant)
}

#[test]
fn optional_forks_into_both_paths() {
    let q = Node::seq(vec![l("a"), Node::opt(l("b")), l("c")]);

    assert!(dfs_matches(&q, &trace(&["a", "c"])));
    assert!(dfs_matches(&q, &trace(&["a", "b", "c"])));
    assert!(!dfs_matches(&q, &trace(&["a", "b", "b", "c"])));
}

#[test]
fn loop_unrolls_each_count_in_range() {
    let q = Node::seq(vec![
        Node::start(),
        Node::repeat(l("b"), 2, Some(4)),
        Node::end(),
    ]);

    assert!(!dfs_matches(&q, &trace(&["b"])));
    assert!(dfs_matches(&q, &trace(&["b", "b"])));
    assert!(dfs_matches(&q, &trace(&["b", "b", "b"])));
    assert!(dfs_matches(&q, &trace(&["b", "b", "b", "b"])));
    assert!(!dfs_matches(&q, &trace(&["b", "b", "b", "b", "b"])));
}

#[test]
fn optional_sequence_bodies_unfold_flat() {
    let q = Node::seq(vec![
        Node::start(),
        l("a"),
        Node::opt(Node::seq(vec![l("b"), l("c")])),
        Node::end(),
    ]);

    // The unfolded body matches flat sibling elements, not a nested subtree.
    assert!(dfs_matches(&q, &trace(&["a", "b", "c"])));
    assert!(dfs_matches(&q, &trace(&["a"])));
    assert!(!dfs_matches(
        &q,
        &Node::seq(vec![l("a"), Node::seq(vec![l("b"), l("c")])])
    ));
}

#[test]
fn nested_sequences_are_inlined_before_matching() {
    let q = Node::seq(vec![l("a"), Node::seq(vec![l("b"), l("c")]), l("d")]);

    assert!(dfs_matches(&q, &trace(&["a", "b", "c", "d"])));
    assert!(!dfs_matches(
        &q,
        &Node::seq(vec![l("a"), Node::seq(vec![l("b"), l("c")]), l("d")])
    ));
}

#[test]
fn sequence_branches_stay_anchored_to_their_branch() {
    let q = Node::seq(vec![Node::par(vec![l("a"), Node::seq(vec![l("b"), l("c")])])]);

    let exact = Node::seq(vec![Node::par(vec![
        Node::seq(vec![l("b"), l("c")]),
        l("a"),
    ])]);
    assert!(dfs_matches(&q, &exact));

    // A branch with surrounding noise is not a match; the sub-sequence is
    // pinned to its branch's boundaries.
    let padded = Node::seq(vec![Node::par(vec![
        Node::seq(vec![l("x"), l("b"), l("c"), l("y")]),
        l("a"),
    ])]);
    assert!(!dfs_matches(&q, &padded));
}

#[test]
fn expansion_limit_is_enforced_at_construction() {
    let mut options = QueryOptions::default();
    options.expansion_limit = 4;
    let q = Node::seq(vec![
        Node::opt(l("a")),
        Node::opt(l("b")),
        Node::opt(l("c")),
    ]);

    assert!(build_query_with(&q, Engine::Dfs, options).is_err());
}
