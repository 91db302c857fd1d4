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

use std::collections::VecDeque;

use crate::direct;
use crate::matcher::node_match;
use crate::tree::Node;

/// Decide whether the children of a query parallel group can be injectively
/// assigned to the children of a variant parallel group.
///
/// Every query child must be matched to a distinct variant child and every
/// variant child must be either matched or absorbed by an Anything. With no
/// Anything present the assignment is bijective. Loop and Optional children
/// unfold dynamically into the work queue; Sequence children are matched
/// anchored (the sub-sequence must consume its variant branch exactly).
pub(crate) fn match_parallel(query: &[Node], variant: &[Node], cap: u32) -> bool {
    // Children that consume exactly one branch each.
    let required = query
        .iter()
        .filter(|c| {
            !matches!(
                c,
                Node::Anything | Node::Optional(_) | Node::Loop { .. } | Node::Parallel(_)
            )
        })
        .count();
    if variant.len() < required {
        return false;
    }

    let mut run = SolvingRun {
        queue: query.iter().collect(),
        assigned: vec![false; variant.len()],
        pending_any: 0,
        variant,
        cap,
    };
    run.match_next()
}

/// Backtracking state for one solver invocation: the queue of query children
/// still to place and the set of variant branches already taken.
struct SolvingRun<'a> {
    queue: VecDeque<&'a Node>,
    assigned: Vec<bool>,
    pending_any: usize,
    variant: &'a [Node],
    cap: u32,
}

impl<'a> SolvingRun<'a> {
    // Invariant: a `false` return leaves queue and assignment exactly as on
    // entry, so callers can backtrack by popping what they pushed.
    fn match_next(&mut self) -> bool {
        let element = match self.queue.pop_front() {
            None => {
                let unassigned = self.assigned.iter().filter(|a| !**a).count();
                return if self.pending_any == 0 {
                    unassigned == 0
                } else {
                    // Each pending Anything absorbs one or more leftovers.
                    unassigned >= self.pending_any
                };
            }
            Some(e) => e,
        };

        let matched = match element {
            Node::Loop { body, min, max } => self.match_loop(body, *min, *max),
            Node::Optional(body) => self.match_optional(body),
            Node::Leaf(_) | Node::Fallthrough(_) | Node::Wildcard | Node::Choice(_) => {
                self.match_single(element)
            }
            Node::Sequence(children) => self.match_sequence(children),
            // A parallel directly inside a parallel is the same group.
            Node::Parallel(children) => self.match_spliced(children),
            Node::Anything => {
                self.pending_any += 1;
                if self.match_next() {
                    return true;
                }
                self.pending_any -= 1;
                false
            }
            Node::Start | Node::End => false,
        };
        if matched {
            return true;
        }

        self.queue.push_front(element);
        false
    }

    // Leaf, Fallthrough, Wildcard and Choice take exactly one branch.
    fn match_single(&mut self, element: &'a Node) -> bool {
        for i in 0..self.variant.len() {
            if self.assigned[i] || !node_match(element, &self.variant[i]) {
                continue;
            }
            self.assigned[i] = true;
            if self.match_next() {
                return true;
            }
            self.assigned[i] = false;

            // A leaf only matches identical leaves and a fallthrough only
            // identical bags, so further candidates are the same assignment
            // class and cannot succeed either.
            if matches!(element, Node::Leaf(_) | Node::Fallthrough(_)) {
                break;
            }
        }
        false
    }

    fn match_sequence(&mut self, children: &'a [Node]) -> bool {
        for i in 0..self.variant.len() {
            if self.assigned[i] {
                continue;
            }
            let branch = match &self.variant[i] {
                Node::Sequence(branch) => branch,
                _ => continue,
            };
            if direct::match_anchored(children, branch, self.cap) {
                self.assigned[i] = true;
                if self.match_next() {
                    return true;
                }
                self.assigned[i] = false;
            }
        }
        false
    }

    fn match_spliced(&mut self, children: &'a [Node]) -> bool {
        for child in children.iter().rev() {
            self.queue.push_front(child);
        }
        if self.match_next() {
            return true;
        }
        for _ in 0..children.len() {
            self.queue.pop_front();
        }
        false
    }

    fn match_loop(&mut self, body: &'a Node, min: u32, max: Option<u32>) -> bool {
        for _ in 0..min {
            self.queue.push_front(body);
        }
        if self.match_next() {
            return true;
        }

        match max {
            Some(max) => {
                // Repetitions beyond the branch count cannot place anything.
                let extra = (max - min).min(self.variant.len() as u32 + 1);
                let mut pushed = 0;
                for _ in 0..extra {
                    self.queue.push_front(body);
                    pushed += 1;
                    if self.match_next() {
                        return true;
                    }
                }
                for _ in 0..pushed {
                    self.queue.pop_front();
                }
            }
            None => {
                let mut reps = 0;
                loop {
                    reps += 1;
                    self.queue.push_front(body);
                    if self.match_next() {
                        return true;
                    }
                    if self.queue.len() > self.variant.len() {
                        break;
                    }
                }
                for _ in 0..reps {
                    self.queue.pop_front();
                }
            }
        }

        for _ in 0..min {
            self.queue.pop_front();
        }
        false
    }

    fn match_optional(&mut self, body: &'a Node) -> bool {
        self.queue.push_front(body);
        if self.match_next() {
            return true;
        }
        self.queue.pop_front();
        self.match_next()
    }
}
