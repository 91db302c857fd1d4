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

use crate::tree::{multiset_eq, Node};

/// Compare a single query node against a single variant node, ignoring the
/// internal structure of compound groups that need their own recursive
/// treatment (sequence and parallel bodies are decided by the engines).
///
/// Total and side-effect free. For Sequence/Parallel this is a shallow
/// kind check only.
pub(crate) fn node_match(query: &Node, variant: &Node) -> bool {
    match (query, variant) {
        (Node::Leaf(q), Node::Leaf(v)) => q == v,
        (Node::Choice(options), Node::Leaf(v)) => options
            .iter()
            .any(|o| matches!(o, Node::Leaf(l) if l == v)),
        (Node::Wildcard, Node::Leaf(_)) => true,
        (_, Node::Leaf(_)) => false,
        (Node::Fallthrough(q), Node::Fallthrough(v)) => multiset_eq(q, v),
        (q, v) => q.same_kind(v),
    }
}
