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

//! Behavior of the bytecode engine in both execution modes, driven through
//! the facade.

use varql::{build_query, Engine, Node};

fn l(label: &str) -> Node {
    Node::leaf(label)
}

fn trace(labels: &[&str]) -> Node {
    Node::seq(labels.iter().map(|s| Node::leaf(*s)).collect())
}

/// Run the query on the eager and the lazy VM, assert they agree and return
/// the shared verdict.
fn vm_matches(query: &Node, variant: &Node) -> bool {
    let eager = build_query(query, Engine::Vm).unwrap().matches(variant);
    let lazy = build_query(query, Engine::VmLazy).unwrap().matches(variant);
    assert_eq!(
        eager, lazy,
        "eager and lazy VM disagree on {} vs {}",
        query, variant
    );
    eager
}

#[test]
fn optional_forks_around_its_body() {
    let q = Node::seq(vec![Node::opt(l("a")), l("b")]);

    assert!(vm_matches(&q, &trace(&["b"])));
    assert!(vm_matches(&q, &trace(&["a", "b"])));
    assert!(!vm_matches(&q, &trace(&["a", "a"])));
}

#[test]
fn anything_forks_per_consumed_element() {
    let q = Node::seq(vec![Node::any(), l("b")]);

    assert!(vm_matches(&q, &trace(&["x", "b"])));
    assert!(vm_matches(&q, &trace(&["x", "y", "z", "b"])));
    assert!(!vm_matches(&q, &trace(&["b"])));
}

#[test]
fn trailing_anything_accepts_after_one_read() {
    let q = Node::seq(vec![l("a"), Node::any()]);

    assert!(!vm_matches(&q, &trace(&["a"])));
    assert!(vm_matches(&q, &trace(&["a", "x"])));
    assert!(vm_matches(&q, &trace(&["a", "x", "y"])));
}

#[test]
fn anchored_trailing_anything_consumes_to_the_end() {
    let q = Node::seq(vec![l("a"), Node::any(), Node::end()]);

    assert!(!vm_matches(&q, &trace(&["a"])));
    assert!(vm_matches(&q, &trace(&["a", "x"])));
    // The anchored form must keep consuming past the first read.
    assert!(vm_matches(&q, &trace(&["a", "x", "y", "z"])));
}

#[test]
fn unbounded_loop_self_loops() {
    let q = Node::seq(vec![l("a"), Node::repeat(l("b"), 1, None), l("c")]);

    assert!(!vm_matches(&q, &trace(&["a", "c"])));
    assert!(vm_matches(&q, &trace(&["a", "b", "c"])));
    assert!(vm_matches(&q, &trace(&["a", "b", "b", "b", "b", "b", "c"])));
}

#[test]
fn bounded_loop_unrolls_up_to_its_maximum() {
    let q = Node::seq(vec![
        Node::start(),
        Node::repeat(l("a"), 1, Some(3)),
        Node::end(),
    ]);

    assert!(vm_matches(&q, &trace(&["a"])));
    assert!(vm_matches(&q, &trace(&["a", "a"])));
    assert!(vm_matches(&q, &trace(&["a", "a", "a"])));
    assert!(!vm_matches(&q, &trace(&["a", "a", "a", "a"])));
}

#[test]
fn lazy_mode_still_rejects_a_failing_parallel() {
    let q = Node::seq(vec![Node::par(vec![l("a"), l("b")]), l("x")]);
    let good = Node::seq(vec![Node::par(vec![l("b"), l("a")]), l("x")]);
    let bad = Node::seq(vec![Node::par(vec![l("a"), l("z")]), l("x")]);

    assert!(vm_matches(&q, &good));
    assert!(!vm_matches(&q, &bad));
}

#[test]
fn lazy_mode_checks_every_parallel_in_a_row() {
    let q = Node::seq(vec![
        Node::par(vec![l("a"), l("b")]),
        Node::par(vec![l("c"), l("d")]),
    ]);
    let good = Node::seq(vec![
        Node::par(vec![l("b"), l("a")]),
        Node::par(vec![l("d"), l("c")]),
    ]);
    // The first parallel fails; only the deferred check can catch it once a
    // second parallel overwrites the pending slot.
    let first_bad = Node::seq(vec![
        Node::par(vec![l("a"), l("z")]),
        Node::par(vec![l("d"), l("c")]),
    ]);
    let second_bad = Node::seq(vec![
        Node::par(vec![l("b"), l("a")]),
        Node::par(vec![l("c"), l("z")]),
    ]);

    assert!(vm_matches(&q, &good));
    assert!(!vm_matches(&q, &first_bad));
    assert!(!vm_matches(&q, &second_bad));
}

#[test]
fn anchors_gate_where_execution_may_start_and_accept() {
    let q = Node::seq(vec![Node::start(), l("a"), l("b"), Node::end()]);

    assert!(vm_matches(&q, &trace(&["a", "b"])));
    assert!(!vm_matches(&q, &trace(&["x", "a", "b"])));
    assert!(!vm_matches(&q, &trace(&["a", "b", "x"])));
}
