#![no_main]
use libfuzzer_sys::fuzz_target;

use varql::{build_query, Engine, Node};

const LABELS: [&str; 4] = ["a", "b", "c", "d"];

struct Bytes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Bytes<'a> {
    fn next(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte
    }
}

fn leaf(bytes: &mut Bytes) -> Node {
    Node::leaf(LABELS[(bytes.next() as usize) % LABELS.len()])
}

fn query_node(bytes: &mut Bytes, depth: u8) -> Node {
    if depth == 0 {
        return leaf(bytes);
    }
    match bytes.next() % 10 {
        0 => Node::wild(),
        1 => Node::any(),
        2 => Node::choice(vec![leaf(bytes), leaf(bytes)]),
        3 => Node::opt(query_node(bytes, depth - 1)),
        4 => {
            let min = (bytes.next() % 3) as u32;
            let max = min + (bytes.next() % 3) as u32;
            Node::repeat(query_node(bytes, depth - 1), min, Some(max))
        }
        5 => Node::seq(query_children(bytes, depth - 1)),
        6 => Node::par(query_children(bytes, depth - 1)),
        7 => Node::fall(vec![leaf(bytes), leaf(bytes)]),
        _ => leaf(bytes),
    }
}

fn query_children(bytes: &mut Bytes, depth: u8) -> Vec<Node> {
    let count = 1 + (bytes.next() % 3) as usize;
    (0..count).map(|_| query_node(bytes, depth)).collect()
}

fn variant_node(bytes: &mut Bytes, depth: u8) -> Node {
    if depth == 0 {
        return leaf(bytes);
    }
    match bytes.next() % 4 {
        0 => Node::seq(variant_children(bytes, depth - 1)),
        1 => Node::par(variant_children(bytes, depth - 1)),
        _ => leaf(bytes),
    }
}

fn variant_children(bytes: &mut Bytes, depth: u8) -> Vec<Node> {
    let count = 1 + (bytes.next() % 4) as usize;
    (0..count).map(|_| variant_node(bytes, depth)).collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let mut bytes = Bytes { data, pos: 0 };

    let anchors = bytes.next();
    let mut elements = query_children(&mut bytes, 2);
    if anchors & 1 != 0 {
        elements.insert(0, Node::start());
    }
    if anchors & 2 != 0 {
        elements.push(Node::end());
    }
    let query = Node::seq(elements);
    let variant = Node::seq(variant_children(&mut bytes, 2));

    let mut verdicts = Vec::new();
    for engine in [Engine::Dfs, Engine::Direct, Engine::Vm, Engine::VmLazy].iter() {
        match build_query(&query, *engine) {
            Ok(built) => verdicts.push(built.matches(&variant)),
            // Validation is engine-independent; the first rejection means
            // every engine rejects.
            Err(_) => return,
        }
    }

    assert!(
        verdicts.iter().all(|v| *v == verdicts[0]),
        "engines disagree on {} vs {}: {:?}",
        query,
        variant,
        verdicts
    );
});
