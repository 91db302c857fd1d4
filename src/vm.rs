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

//! The bytecode engine: a Thompson-style single-pass compiler from a query
//! to a linear instruction stream, executed by a dual-thread-list NFA
//! simulation. Leaves compile to label checks, Wildcard to a leaf read,
//! Anything to a greedy self-forking read, Optional and bounded Loops to
//! SPLIT-guarded copies of their body, unbounded Loops to a SPLIT/JUMP
//! self-loop, and Parallel groups to a single instruction that hands the
//! element to the parallel solver.
//!
//! In lazy mode a MATCH_PARALLEL does not run the solver immediately; the
//! (group, element) pair rides along with the thread and is checked at
//! ACCEPT, so threads that die for unrelated reasons never pay for an
//! expensive parallel match. At most one pair is retained per thread: a
//! later parallel first forces the pending check, then replaces it.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::matcher::node_match;
use crate::solver;
use crate::tree::{self, Node};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Inst {
    /// Consume one element; it must be a leaf with the referenced label.
    MatchLeaf(usize),
    /// Consume one element; `node_match` against the referenced node must
    /// hold (Choice, Fallthrough).
    MatchNode(usize),
    /// Consume one element; it must be a parallel group accepted by the
    /// solver for the referenced query group.
    MatchParallel(usize),
    /// Consume one element; it must be a leaf, any label.
    ReadLeaf,
    /// Consume one element of any kind.
    ReadAny,
    /// Relative jump.
    Jump(isize),
    /// Fork the thread at both relative offsets.
    Split(isize, isize),
    /// Accept, subject to the End-anchor condition.
    Accept,
}

#[derive(Debug)]
pub(crate) struct Vm {
    prog: Vec<Inst>,
    /// Operand table for MatchLeaf/MatchNode.
    nodes: Vec<Node>,
    /// Parallel query groups for MatchParallel.
    pars: Vec<Node>,
    has_start: bool,
    has_end: bool,
    lazy: bool,
    cap: u32,
}

/// Compile a canonical query (a Sequence root) for eager or lazy execution.
pub(crate) fn compile(query: &Node, lazy: bool, cap: u32) -> Vm {
    let children = match query {
        Node::Sequence(children) => children.as_slice(),
        _ => unreachable!("queries are canonicalized to a sequence root"),
    };

    let has_start = matches!(children.first(), Some(Node::Start));
    let has_end = matches!(children.last(), Some(Node::End));
    let content = &children[usize::from(has_start)..children.len() - usize::from(has_end)];

    let mut compiler = Compiler {
        nodes: Vec::new(),
        pars: Vec::new(),
    };

    let (prog, has_end) = if content.iter().all(|element| tree::matches_empty(element)) {
        // Bare anchors or fully skippable content accept everything; the
        // anchored form still needs one element to anchor to.
        if has_start || has_end {
            (vec![Inst::ReadAny, Inst::Accept], false)
        } else {
            (vec![Inst::Accept], false)
        }
    } else {
        let mut prog = compiler.compile_sequence(content, !has_end);
        prog.push(Inst::Accept);
        (prog, has_end)
    };

    Vm {
        prog,
        nodes: compiler.nodes,
        pars: compiler.pars,
        has_start,
        has_end,
        lazy,
        cap,
    }
}

struct Compiler {
    nodes: Vec<Node>,
    pars: Vec<Node>,
}

impl Compiler {
    fn compile_sequence(&mut self, children: &[Node], trailing_accept: bool) -> Vec<Inst> {
        let mut prog = Vec::new();
        for (i, element) in children.iter().enumerate() {
            if trailing_accept && i == children.len() - 1 && matches!(element, Node::Anything) {
                // A trailing unanchored Anything needs one read, not a fork
                // per consumed element.
                prog.push(Inst::ReadAny);
                prog.push(Inst::Accept);
                break;
            }
            prog.extend(self.compile_group(element));
        }
        prog
    }

    fn compile_group(&mut self, group: &Node) -> Vec<Inst> {
        match group {
            Node::Leaf(_) => {
                self.nodes.push(group.clone());
                vec![Inst::MatchLeaf(self.nodes.len() - 1)]
            }
            Node::Choice(_) | Node::Fallthrough(_) => {
                self.nodes.push(group.clone());
                vec![Inst::MatchNode(self.nodes.len() - 1)]
            }
            Node::Wildcard => vec![Inst::ReadLeaf],
            Node::Anything => vec![Inst::ReadAny, Inst::Split(-1, 1)],
            Node::Parallel(_) => {
                self.pars.push(group.clone());
                vec![Inst::MatchParallel(self.pars.len() - 1)]
            }
            Node::Sequence(children) => self.compile_sequence(children, false),
            Node::Optional(body) => {
                let body_prog = self.compile_group(body);
                let mut prog = vec![Inst::Split(1, body_prog.len() as isize + 1)];
                prog.extend(body_prog);
                prog
            }
            Node::Loop { body, min, max } => self.compile_loop(body, *min, *max),
            Node::Start | Node::End => unreachable!("anchors are consumed before compilation"),
        }
    }

    fn compile_loop(&mut self, body: &Node, min: u32, max: Option<u32>) -> Vec<Inst> {
        let body_prog = self.compile_group(body);
        let len = body_prog.len() as isize;

        let mut prog = Vec::new();
        for _ in 0..min {
            prog.extend(body_prog.iter().copied());
        }

        match max {
            None => {
                // Greedy self-loop.
                prog.push(Inst::Split(1, len + 2));
                prog.extend(body_prog.iter().copied());
                prog.push(Inst::Jump(-(len + 1)));
            }
            Some(max) => {
                // Unrolled optional copies; skipping one skips all the
                // remaining copies, so later copies are reachable only when
                // earlier ones were taken.
                let extra = max.saturating_sub(min) as isize;
                for i in 0..extra {
                    prog.push(Inst::Split(1, (extra - i) * (len + 1)));
                    prog.extend(body_prog.iter().copied());
                }
            }
        }
        prog
    }
}

impl Vm {
    pub(crate) fn run(&self, variant: &[Node]) -> bool {
        // Anchors need an element to anchor to.
        if variant.is_empty() && (self.has_start || self.has_end) {
            return false;
        }
        if self.lazy {
            return self.run_lazy(variant);
        }

        let prog = &self.prog;
        let mut visited = vec![usize::MAX; prog.len()];
        let mut clist: Vec<usize> = vec![0];
        let mut nlist: Vec<usize> = Vec::new();

        for idx in 0..=variant.len() {
            let element = variant.get(idx);

            let mut t = 0;
            while t < clist.len() {
                let mut pc = clist[t];
                t += 1;

                while pc < prog.len() {
                    // One thread per program point and input position.
                    if visited[pc] == idx {
                        break;
                    }
                    visited[pc] = idx;

                    match prog[pc] {
                        Inst::MatchLeaf(n) => {
                            if let (Some(Node::Leaf(label)), Node::Leaf(want)) =
                                (element, &self.nodes[n])
                            {
                                if label == want {
                                    nlist.push(pc + 1);
                                }
                            }
                            break;
                        }
                        Inst::MatchNode(n) => {
                            if let Some(element) = element {
                                if node_match(&self.nodes[n], element) {
                                    nlist.push(pc + 1);
                                }
                            }
                            break;
                        }
                        Inst::MatchParallel(n) => {
                            if let Some(Node::Parallel(branches)) = element {
                                if solver::match_parallel(
                                    self.pars[n].children(),
                                    branches,
                                    self.cap,
                                ) {
                                    nlist.push(pc + 1);
                                }
                            }
                            break;
                        }
                        Inst::ReadLeaf => {
                            if let Some(Node::Leaf(_)) = element {
                                nlist.push(pc + 1);
                            }
                            break;
                        }
                        Inst::ReadAny => {
                            if element.is_some() {
                                nlist.push(pc + 1);
                            }
                            break;
                        }
                        Inst::Jump(offset) => pc = jump(pc, offset),
                        Inst::Split(first, second) => {
                            clist.push(jump(pc, second));
                            pc = jump(pc, first);
                        }
                        Inst::Accept => {
                            if !self.has_end || element.is_none() {
                                return true;
                            }
                            break;
                        }
                    }
                }
            }

            if !self.has_start {
                // Unanchored prefix: every position is a potential start.
                nlist.push(0);
            } else if nlist.is_empty() {
                return false;
            }

            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
        }
        false
    }

    fn run_lazy<'v>(&self, variant: &'v [Node]) -> bool {
        type Thread<'v> = (usize, Option<(usize, &'v Node)>);

        let prog = &self.prog;
        let mut clist: Vec<Thread<'v>> = vec![(0, None)];
        let mut nlist: Vec<Thread<'v>> = Vec::new();

        for idx in 0..=variant.len() {
            let element = variant.get(idx);

            // Threads with different pending parallels are distinct, so the
            // dedup key includes the pending pair, encoded as integers.
            let mut visited: FxHashSet<(usize, usize, usize)> = FxHashSet::default();

            let mut t = 0;
            while t < clist.len() {
                let (mut pc, mut pending) = clist[t];
                t += 1;

                while pc < prog.len() {
                    let key = match pending {
                        Some((group, node)) => (pc, group + 1, node as *const Node as usize),
                        None => (pc, 0, 0),
                    };
                    if !visited.insert(key) {
                        break;
                    }

                    match prog[pc] {
                        Inst::MatchLeaf(n) => {
                            if let (Some(Node::Leaf(label)), Node::Leaf(want)) =
                                (element, &self.nodes[n])
                            {
                                if label == want {
                                    nlist.push((pc + 1, pending));
                                }
                            }
                            break;
                        }
                        Inst::MatchNode(n) => {
                            if let Some(element) = element {
                                if node_match(&self.nodes[n], element) {
                                    nlist.push((pc + 1, pending));
                                }
                            }
                            break;
                        }
                        Inst::MatchParallel(n) => {
                            if let Some(element @ Node::Parallel(_)) = element {
                                // Only one parallel is kept pending; a later
                                // one forces the earlier check.
                                if !self.check_pending(pending) {
                                    break;
                                }
                                pending = Some((n, element));
                                nlist.push((pc + 1, pending));
                            }
                            break;
                        }
                        Inst::ReadLeaf => {
                            if let Some(Node::Leaf(_)) = element {
                                nlist.push((pc + 1, pending));
                            }
                            break;
                        }
                        Inst::ReadAny => {
                            if element.is_some() {
                                nlist.push((pc + 1, pending));
                            }
                            break;
                        }
                        Inst::Jump(offset) => pc = jump(pc, offset),
                        Inst::Split(first, second) => {
                            clist.push((jump(pc, second), pending));
                            pc = jump(pc, first);
                        }
                        Inst::Accept => {
                            if self.has_end && element.is_some() {
                                break;
                            }
                            if !self.check_pending(pending) {
                                break;
                            }
                            return true;
                        }
                    }
                }
            }

            if !self.has_start {
                nlist.push((0, None));
            } else if nlist.is_empty() {
                return false;
            }

            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
        }
        false
    }

    fn check_pending(&self, pending: Option<(usize, &Node)>) -> bool {
        match pending {
            Some((group, element)) => solver::match_parallel(
                self.pars[group].children(),
                element.children(),
                self.cap,
            ),
            None => true,
        }
    }
}

fn jump(pc: usize, offset: isize) -> usize {
    (pc as isize + offset) as usize
}

/// Instruction listing with resolved jump targets, for `debug!` dumps.
impl fmt::Display for Vm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (pc, inst) in self.prog.iter().enumerate() {
            match inst {
                Inst::MatchLeaf(n) => writeln!(f, "{:3}: MATCH_LEAF {}", pc, self.nodes[*n])?,
                Inst::MatchNode(n) => writeln!(f, "{:3}: MATCH_NODE {}", pc, self.nodes[*n])?,
                Inst::MatchParallel(n) => {
                    writeln!(f, "{:3}: MATCH_PARALLEL {}", pc, self.pars[*n])?
                }
                Inst::ReadLeaf => writeln!(f, "{:3}: READ_LEAF", pc)?,
                Inst::ReadAny => writeln!(f, "{:3}: READ_ANY", pc)?,
                Inst::Jump(offset) => writeln!(f, "{:3}: JUMP {}", pc, jump(pc, *offset))?,
                Inst::Split(a, b) => {
                    writeln!(f, "{:3}: SPLIT {}, {}", pc, jump(pc, *a), jump(pc, *b))?
                }
                Inst::Accept => writeln!(f, "{:3}: ACCEPT", pc)?,
            }
        }
        Ok(())
    }
}
