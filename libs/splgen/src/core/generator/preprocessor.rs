// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Logical graph rewrites run before composite separation.

use crate::core::error::Result;
use crate::core::graph::{
    Graph, OperatorId, VirtualMarker, add_before, remove_operator, remove_operators, validate,
};

use super::autonomous_regions::preprocess_autonomous_regions;
use super::generate_phase::GeneratePhase;
use super::optimizer::optimize;
use super::pe_placement::{PePlacement, resolve_colocation_tags};
use super::threading_model::preprocess_threaded_ports;

/// Counts gathered while preprocessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    pub hash_adders_relocated: usize,
    pub markers_removed: usize,
    pub threaded_ports_dropped: usize,
    pub operators_optimized: usize,
}

/// Runs the fixed sequence of rewrites over one graph.
pub struct Preprocessor<'a> {
    graph: &'a mut Graph,
    placement: &'a mut PePlacement,
}

impl<'a> Preprocessor<'a> {
    pub fn new(graph: &'a mut Graph, placement: &'a mut PePlacement) -> Self {
        Self { graph, placement }
    }

    pub fn preprocess(self) -> Result<PreprocessStats> {
        let Self { graph, placement } = self;
        let mut stats = PreprocessStats::default();

        tracing::info!("[{}] Checking {} operators", GeneratePhase::Validate, graph.len());
        validate(graph)?;

        stats.hash_adders_relocated = relocate_hash_adders(graph)?;
        tracing::info!(
            "[{}] Relocated {} hash adders",
            GeneratePhase::RelocateHashAdders,
            stats.hash_adders_relocated
        );

        let isolates = placement.tag_isolation_regions(graph)?;
        tracing::info!(
            "[{}] {} isolate markers, {} regions",
            GeneratePhase::TagIsolation,
            isolates,
            placement.isolate_regions()
        );

        let low_latency = placement.tag_low_latency_regions(graph)?;
        tracing::info!(
            "[{}] {} low latency markers, {} regions",
            GeneratePhase::TagLowLatency,
            low_latency,
            placement.low_latency_regions()
        );

        stats.threaded_ports_dropped = preprocess_threaded_ports(graph)?;
        tracing::info!(
            "[{}] Dropped {} threaded ports",
            GeneratePhase::ThreadedPorts,
            stats.threaded_ports_dropped
        );

        let remaining = remove_remaining_markers(graph)?;
        tracing::info!(
            "[{}] Removed {} union/pending markers",
            GeneratePhase::RemoveMarkers,
            remaining
        );

        let autonomous = preprocess_autonomous_regions(graph)?;
        tracing::info!(
            "[{}] Removed {} autonomous markers",
            GeneratePhase::Autonomous,
            autonomous
        );

        let resolved = resolve_colocation_tags(graph);
        tracing::info!(
            "[{}] {} operators have a colocation key",
            GeneratePhase::ResolveColocation,
            resolved
        );

        stats.operators_optimized = optimize(graph);
        tracing::info!(
            "[{}] Optimized {} operators",
            GeneratePhase::Optimize,
            stats.operators_optimized
        );

        stats.markers_removed = isolates + low_latency + remaining + autonomous;
        Ok(stats)
    }
}

fn remove_remaining_markers(graph: &mut Graph) -> Result<usize> {
    let mut removed = 0;
    for marker in [VirtualMarker::Union, VirtualMarker::Pending] {
        let ops = graph.find_by_kind(marker);
        removed += ops.len();
        remove_operators(graph, &ops)?;
    }
    Ok(removed)
}

/// Move each hash adder that is the only child of an `$EndParallel$` in
/// front of that marker, so a parallel region can feed the next one
/// directly.
///
/// The end marker then carries the hash adder's schema. An `$EndParallel$`
/// with other children besides hash adders is left as is.
fn relocate_hash_adders(graph: &mut Graph) -> Result<usize> {
    let mut ends: Vec<OperatorId> = Vec::new();
    for (id, op) in graph.iter() {
        if !op.is_hash_adder() {
            continue;
        }
        let parents = graph.upstream(id);
        if let [parent] = parents.as_slice() {
            if graph[*parent].is_marker(VirtualMarker::EndParallel) && !ends.contains(parent) {
                ends.push(*parent);
            }
        }
    }

    let mut relocated = 0;
    for end in ends {
        let children = graph.downstream(end);
        let [hash_adder] = children.as_slice() else {
            tracing::warn!(
                "'{}' feeds {} operators, hash adders left in place",
                graph[end].name,
                children.len()
            );
            continue;
        };
        let hash_adder = *hash_adder;

        let Some(schema) = graph[hash_adder].outputs.first().map(|o| o.schema.clone()) else {
            tracing::warn!("Hash adder '{}' has no output port", graph[hash_adder].name);
            continue;
        };
        let name = graph[hash_adder].name.clone();
        let copy = graph[hash_adder].copy_with_name(&name);

        remove_operator(graph, hash_adder)?;
        let copy = graph.insert_operator_before(end, copy);
        add_before(graph, end, copy)?;

        let end_op = &mut graph[end];
        if let Some(input) = end_op.inputs.first_mut() {
            input.schema = schema.clone();
        }
        if let Some(output) = end_op.outputs.first_mut() {
            output.schema = schema;
        }
        tracing::debug!("Moved hash adder '{}' before '{}'", name, end_op.name);
        relocated += 1;
    }
    Ok(relocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::{graph_from_ops, op};

    #[test]
    fn test_hash_adder_moves_before_end_parallel() {
        let mut ha = op("ha", "com.ibm.streamsx.topology.functional.java::HashAdder", &["end"], &["par"]);
        ha.outputs[0].schema = "tuple<int32 a, int32 __spl_hash>".into();
        let mut graph = graph_from_ops(vec![
            op("src", "Src", &[], &["p1"]),
            op("p1", "$Parallel$", &["src"], &["map"]),
            op("map", "Map", &["p1"], &["end"]),
            op("end", "$EndParallel$", &["map"], &["ha"]),
            ha,
            op("par", "$Parallel$", &["ha"], &["snk"]),
            op("snk", "Snk", &["par"], &[]),
        ]);

        assert_eq!(relocate_hash_adders(&mut graph).unwrap(), 1);

        let map = graph.find_by_name("map").unwrap();
        let ha = graph.find_by_name("ha").unwrap();
        let end = graph.find_by_name("end").unwrap();
        let par = graph.find_by_name("par").unwrap();
        assert_eq!(graph.downstream(map), vec![ha]);
        assert_eq!(graph.downstream(ha), vec![end]);
        assert_eq!(graph.downstream(end), vec![par]);
        assert_eq!(graph[end].outputs[0].schema, "tuple<int32 a, int32 __spl_hash>");
        assert_eq!(graph[end].inputs[0].schema, "tuple<int32 a, int32 __spl_hash>");

        let names: Vec<_> = graph.iter().map(|(_, o)| o.name.as_str()).collect();
        assert_eq!(names, vec!["src", "p1", "map", "ha", "end", "par", "snk"]);
    }

    #[test]
    fn test_shared_end_parallel_left_alone() {
        let graph_ops = vec![
            op("map", "Map", &[], &["end"]),
            op("end", "$EndParallel$", &["map"], &["ha", "f"]),
            op("ha", "x::HashAdder", &["end"], &[]),
            op("f", "Filter", &["end"], &[]),
        ];
        let mut graph = graph_from_ops(graph_ops);
        assert_eq!(relocate_hash_adders(&mut graph).unwrap(), 0);
        let end = graph.find_by_name("end").unwrap();
        assert_eq!(graph.downstream(end).len(), 2);
    }

    #[test]
    fn test_full_preprocess_leaves_no_markers() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["u"]),
            op("b", "B", &[], &["u"]),
            op("u", "$Union$", &["a", "b"], &["iso"]),
            op("iso", "$Isolate$", &["u"], &["p"]),
            op("p", "$Pending$", &["iso"], &["c"]),
            op("c", "C", &["p"], &[]),
        ]);
        let mut placement = PePlacement::new();
        let stats = Preprocessor::new(&mut graph, &mut placement)
            .preprocess()
            .unwrap();

        assert_eq!(stats.markers_removed, 3);
        assert_eq!(graph.len(), 3);
        for (_, op) in graph.iter() {
            assert!(op.marker().is_none());
            assert!(op.placement().colocate_key.is_some());
        }
        let c = graph.find_by_name("c").unwrap();
        assert_eq!(graph[c].inputs[0].connections, vec!["a_OUT0", "b_OUT0"]);
    }
}
