// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::error::{Result, SplError};

use super::graph::Graph;
use super::marker::VirtualMarker;

/// Structural checks run before any rewrite.
///
/// Every `$EndParallel$` must have exactly one parent, and that parent must
/// feed nothing but the end marker.
pub fn validate(graph: &Graph) -> Result<()> {
    for end in graph.find_by_kind(VirtualMarker::EndParallel) {
        let parents = graph.upstream(end);
        if parents.len() != 1 {
            return Err(SplError::InvalidGraph(format!(
                "'{}': cannot union multiple streams before ending a parallel region",
                graph[end].name
            )));
        }
        if graph.downstream(parents[0]).len() != 1 {
            return Err(SplError::InvalidGraph(format!(
                "'{}': cannot fan out a stream before ending a parallel region",
                graph[parents[0]].name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::{chain_graph, graph_from_ops, op};

    #[test]
    fn test_plain_graph_is_valid() {
        assert!(validate(&chain_graph(&["a", "b", "c"])).is_ok());
    }

    #[test]
    fn test_end_parallel_with_single_parent() {
        let graph = graph_from_ops(vec![
            op("src", "Src", &[], &["par"]),
            op("par", "$Parallel$", &["src"], &["map"]),
            op("map", "Map", &["par"], &["end"]),
            op("end", "$EndParallel$", &["map"], &["snk"]),
            op("snk", "Snk", &["end"], &[]),
        ]);
        assert!(validate(&graph).is_ok());
    }

    #[test]
    fn test_union_before_end_rejected() {
        let graph = graph_from_ops(vec![
            op("a", "A", &[], &["end"]),
            op("b", "B", &[], &["end"]),
            op("end", "$EndParallel$", &["a", "b"], &[]),
        ]);
        let err = validate(&graph).unwrap_err();
        assert!(err.to_string().contains("cannot union multiple streams"));
    }

    #[test]
    fn test_fan_out_before_end_rejected() {
        let graph = graph_from_ops(vec![
            op("a", "A", &[], &["end", "other"]),
            op("end", "$EndParallel$", &["a"], &[]),
            op("other", "Other", &["a"], &[]),
        ]);
        let err = validate(&graph).unwrap_err();
        assert!(matches!(err, SplError::InvalidGraph(_)));
        assert!(err.to_string().contains("cannot fan out a stream"));
    }
}
