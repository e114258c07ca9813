//! Structural data comparer.
//!
//! Compares the stacks, graphs, graph traversals and code flows attached to
//! results. Each collection is compared as a multiset, so the order in which
//! a tool emits them does not matter.

use std::hash::Hash;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::extracted::{rewrite_location, ExtractedResult};
use crate::hashing::fx_hash;
use crate::sarif::{CodeFlow, Graph, GraphTraversal, Location, Node, Run, Stack};

bitflags! {
    /// The structural collections a comparer looks at.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StructuralKinds: u32 {
        const STACKS = 1;
        const GRAPHS = 1 << 1;
        const GRAPH_TRAVERSALS = 1 << 2;
        const CODE_FLOWS = 1 << 3;
    }
}

impl Default for StructuralKinds {
    fn default() -> Self {
        StructuralKinds::all()
    }
}

pub(super) fn applies_to(result: &ExtractedResult<'_>, kinds: StructuralKinds) -> bool {
    let r = result.result();
    (kinds.contains(StructuralKinds::STACKS) && non_empty(&r.stacks))
        || (kinds.contains(StructuralKinds::GRAPHS) && non_empty(&r.graphs))
        || (kinds.contains(StructuralKinds::GRAPH_TRAVERSALS) && non_empty(&r.graph_traversals))
        || (kinds.contains(StructuralKinds::CODE_FLOWS) && non_empty(&r.code_flows))
}

pub(super) fn hash(result: &ExtractedResult<'_>, kinds: StructuralKinds) -> i32 {
    let s = Structure::of(result, kinds);
    let mut hash: i32 = 17;
    if kinds.contains(StructuralKinds::STACKS) {
        hash = mix(hash, collection_hash(StructuralKinds::STACKS, &s.stacks));
    }
    if kinds.contains(StructuralKinds::GRAPHS) {
        hash = mix(hash, collection_hash(StructuralKinds::GRAPHS, &s.graphs));
    }
    if kinds.contains(StructuralKinds::GRAPH_TRAVERSALS) {
        hash = mix(
            hash,
            collection_hash(StructuralKinds::GRAPH_TRAVERSALS, &s.graph_traversals),
        );
    }
    if kinds.contains(StructuralKinds::CODE_FLOWS) {
        hash = mix(hash, collection_hash(StructuralKinds::CODE_FLOWS, &s.code_flows));
    }
    hash
}

pub(super) fn equal(
    a: &ExtractedResult<'_>,
    b: &ExtractedResult<'_>,
    kinds: StructuralKinds,
) -> bool {
    let (a, b) = (Structure::of(a, kinds), Structure::of(b, kinds));
    same_multiset(&a.stacks, &b.stacks)
        && same_multiset(&a.graphs, &b.graphs)
        && same_multiset(&a.graph_traversals, &b.graph_traversals)
        && same_multiset(&a.code_flows, &b.code_flows)
}

/// The enabled collections of a result, with every artifact reference
/// resolved against the result's run and stored as an inline URI.
///
/// Disabled collections are `None`. References that do not resolve are kept
/// as they are.
struct Structure {
    stacks: Option<Vec<Stack>>,
    graphs: Option<Vec<Graph>>,
    graph_traversals: Option<Vec<GraphTraversal>>,
    code_flows: Option<Vec<CodeFlow>>,
}

impl Structure {
    fn of(result: &ExtractedResult<'_>, kinds: StructuralKinds) -> Self {
        let r = result.result();
        let mut structure = Structure {
            stacks: select(kinds, StructuralKinds::STACKS, &r.stacks),
            graphs: select(kinds, StructuralKinds::GRAPHS, &r.graphs),
            graph_traversals: select(kinds, StructuralKinds::GRAPH_TRAVERSALS, &r.graph_traversals),
            code_flows: select(kinds, StructuralKinds::CODE_FLOWS, &r.code_flows),
        };

        let run = result.run();
        let frames = structure
            .stacks
            .iter_mut()
            .flatten()
            .flat_map(|stack| stack.frames.iter_mut())
            .filter_map(|frame| frame.location.as_mut());
        let steps = structure
            .code_flows
            .iter_mut()
            .flatten()
            .flat_map(|flow| flow.thread_flows.iter_mut())
            .flat_map(|thread| thread.locations.iter_mut())
            .filter_map(|step| step.location.as_mut());
        for location in frames.chain(steps) {
            inline_uri(location, run);
        }
        for node in structure
            .graphs
            .iter_mut()
            .flatten()
            .flat_map(|graph| graph.nodes.iter_mut())
        {
            inline_node_uris(node, run);
        }

        structure
    }
}

fn select<T: Clone>(
    kinds: StructuralKinds,
    kind: StructuralKinds,
    items: &Option<Vec<T>>,
) -> Option<Vec<T>> {
    if kinds.contains(kind) {
        items.clone()
    } else {
        None
    }
}

fn inline_uri(location: &mut Location, run: &Run) {
    rewrite_location(location, run, &|uri: &str| Some(uri.to_string()));
}

fn inline_node_uris(node: &mut Node, run: &Run) {
    if let Some(location) = node.location.as_mut() {
        inline_uri(location, run);
    }
    for child in &mut node.children {
        inline_node_uris(child, run);
    }
}

fn non_empty<T>(items: &Option<Vec<T>>) -> bool {
    items.as_ref().is_some_and(|items| !items.is_empty())
}

fn mix(hash: i32, part: i32) -> i32 {
    hash.wrapping_mul(31).wrapping_add(part)
}

/// Order-independent hash of an optional collection.
///
/// Element hashes are summed so permutations collide; the kind and the
/// length are folded in afterwards.
fn collection_hash<T: Hash>(kind: StructuralKinds, items: &Option<Vec<T>>) -> i32 {
    let Some(items) = items else {
        return kind.bits() as i32;
    };
    let sum = items
        .iter()
        .fold(0i32, |sum, item| sum.wrapping_add(fx_hash(item)));
    mix(mix(kind.bits() as i32, items.len() as i32), sum)
}

fn same_multiset<T: Eq + Hash>(a: &Option<Vec<T>>, b: &Option<Vec<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.len() == b.len() && counts(a) == counts(b),
        _ => false,
    }
}

fn counts<T: Eq + Hash>(items: &[T]) -> FxHashMap<&T, usize> {
    let mut counts = FxHashMap::default();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}
