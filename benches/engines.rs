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

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use varql::{build_query, Engine, Node};

fn l(label: &str) -> Node {
    Node::leaf(label)
}

// A query exercising every operator family.
fn query() -> Node {
    Node::seq(vec![
        l("open"),
        Node::any(),
        Node::choice(vec![l("review"), l("audit")]),
        Node::opt(l("escalate")),
        Node::repeat(l("retry"), 0, Some(3)),
        Node::par(vec![
            l("notify"),
            Node::seq(vec![l("pack"), l("ship")]),
        ]),
        Node::wild(),
        l("close"),
    ])
}

// A matching variant with enough noise to make the engines work.
fn variant() -> Node {
    let mut elements: Vec<Node> = Vec::new();
    for i in 0..10 {
        elements.push(l(&format!("noise{}", i)));
    }
    elements.push(l("open"));
    elements.push(l("triage"));
    elements.push(l("review"));
    elements.push(l("retry"));
    elements.push(l("retry"));
    elements.push(Node::par(vec![
        Node::seq(vec![l("pack"), l("ship")]),
        l("notify"),
    ]));
    elements.push(l("sign"));
    elements.push(l("close"));
    for i in 0..10 {
        elements.push(l(&format!("tail{}", i)));
    }
    Node::seq(elements)
}

fn bench(c: &mut Criterion) {
    let q = query();
    let v = variant();

    for (name, engine) in [
        ("dfs", Engine::Dfs),
        ("direct", Engine::Direct),
        ("vm", Engine::Vm),
        ("vm_lazy", Engine::VmLazy),
    ]
    .iter()
    {
        c.bench_function(&format!("build - {}", name), |b| {
            b.iter(|| build_query(&q, *engine).unwrap())
        });

        let built = build_query(&q, *engine).unwrap();
        c.bench_function(&format!("match - {}", name), |b| {
            b.iter(|| built.matches(&v))
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().significance_level(0.05).measurement_time(Duration::from_millis(20000)).sample_size(100);
    targets = bench
}
criterion_main!(benches);
