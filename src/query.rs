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

use crate::dfs::DfsEngine;
use crate::tree::Node;
use crate::{direct, vm, QueryError};

/// The interchangeable matching engines. All four produce the same verdicts;
/// they differ in construction cost and match-time profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Expand the query into operator-free alternatives at construction,
    /// match with a sliding-window DFS.
    Dfs,
    /// Interpret operators in place; nothing is precomputed.
    Direct,
    /// Compile to bytecode, execute as a thread-list NFA simulation.
    Vm,
    /// The bytecode engine with parallel matches deferred until acceptance.
    VmLazy,
}

/// Facade construction parameters.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Effective ceiling for loop repetitions; finite loop maxima are
    /// silently capped here.
    pub loop_cap: u32,
    /// Upper bound on the number of alternatives the expansion engine may
    /// materialize before construction fails.
    pub expansion_limit: usize,
}

impl Default for QueryOptions {
    fn default() -> QueryOptions {
        QueryOptions {
            loop_cap: 200,
            expansion_limit: 50_000,
        }
    }
}

/// A query prepared for repeated matching. Construction precomputes
/// whatever the chosen engine needs (expansion set, bytecode, or nothing);
/// `matches` is then cheap, re-entrant and keeps no per-variant state.
#[derive(Debug)]
pub struct MatchableQuery {
    backend: Backend,
    cap: u32,
}

#[derive(Debug)]
enum Backend {
    Dfs(DfsEngine),
    Direct(Node),
    Vm(vm::Vm),
}

impl MatchableQuery {
    pub(crate) fn build(
        canonical: Node,
        engine: Engine,
        options: &QueryOptions,
    ) -> Result<MatchableQuery, QueryError> {
        debug!("canonical query: {}", canonical);

        let backend = match engine {
            Engine::Dfs => Backend::Dfs(DfsEngine::build(&canonical, options)?),
            Engine::Direct => Backend::Direct(canonical),
            Engine::Vm | Engine::VmLazy => {
                let compiled = vm::compile(&canonical, engine == Engine::VmLazy, options.loop_cap);
                debug!("compiled program:\n{}", compiled);
                Backend::Vm(compiled)
            }
        };

        Ok(MatchableQuery {
            backend,
            cap: options.loop_cap,
        })
    }

    /// Decide whether `variant` matches this query. Never fails: a variant
    /// with the wrong shape in the wrong place simply does not match.
    ///
    /// The variant is borrowed read-only for the duration of the call; a
    /// non-sequence root is treated as a one-element top level.
    pub fn matches(&self, variant: &Node) -> bool {
        let elements: &[Node] = match variant {
            Node::Sequence(children) => children,
            other => std::slice::from_ref(other),
        };

        match &self.backend {
            Backend::Dfs(engine) => engine.matches(elements),
            Backend::Direct(query) => direct::match_sequence(query.children(), elements, self.cap),
            Backend::Vm(vm) => vm.run(elements),
        }
    }
}
