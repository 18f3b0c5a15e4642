// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Isolation and low latency region tagging.
//!
//! Every operator ends up with an isolate region id; operators between a
//! `$LowLatency$`/`$EndLowLatency$` pair also get a low latency region id.
//! The region ids become PE colocation keys.

use crate::core::error::{Result, SplError};
use crate::core::graph::{
    Graph, OperatorId, VirtualMarker, VisitController, remove_operators, visit_once,
};

pub const ISOLATE_REGION_PREFIX: &str = "__jaa_isolateId";
pub const LOW_LATENCY_REGION_PREFIX: &str = "LowLatencyRegion";

/// Region id counters. They keep counting across the runs of one session.
#[derive(Debug, Default)]
pub struct PePlacement {
    isolate_region_count: usize,
    low_latency_region_count: usize,
}

impl PePlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolate_regions(&self) -> usize {
        self.isolate_region_count
    }

    pub fn low_latency_regions(&self) -> usize {
        self.low_latency_region_count
    }

    fn new_isolate_region_id(&mut self) -> String {
        let id = format!("{}{}", ISOLATE_REGION_PREFIX, self.isolate_region_count);
        self.isolate_region_count += 1;
        id
    }

    fn new_low_latency_region_id(&mut self) -> String {
        let id = format!("{}{}", LOW_LATENCY_REGION_PREFIX, self.low_latency_region_count);
        self.low_latency_region_count += 1;
        id
    }

    /// Tag isolation regions, sweep untagged islands, then splice out the
    /// `$Isolate$` markers. Returns the number of markers removed.
    pub fn tag_isolation_regions(&mut self, graph: &mut Graph) -> Result<usize> {
        let isolates = graph.find_by_kind(VirtualMarker::Isolate);

        for &isolate in &isolates {
            check_valid_isolation(graph, isolate)?;
        }

        for &isolate in &isolates {
            let parents = graph.upstream(isolate);
            self.assign_isolate_region(graph, &parents)?;
            let children = graph.downstream(isolate);
            self.assign_isolate_region(graph, &children)?;
        }

        self.tag_island_regions(graph)?;
        remove_operators(graph, &isolates)?;
        Ok(isolates.len())
    }

    fn assign_isolate_region(&mut self, graph: &mut Graph, starts: &[OperatorId]) -> Result<()> {
        let region = self.new_isolate_region_id();
        tracing::debug!("Tagging isolate region {} from {} operators", region, starts.len());
        let controller = VisitController::bounded(&[VirtualMarker::Isolate]);
        visit_once(graph, &controller, starts, |g, id| {
            g[id].placement_mut().tag_isolate_region(&region);
            Ok(())
        })
    }

    /// Give every region not reached from an `$Isolate$` marker its own id,
    /// so all operators belong to exactly one isolate region.
    pub fn tag_island_regions(&mut self, graph: &mut Graph) -> Result<()> {
        for start in graph.find_starts() {
            if graph[start].placement().isolate_region().is_some() {
                continue;
            }
            self.assign_isolate_region(graph, &[start])?;
        }
        Ok(())
    }

    /// Tag operators between each `$LowLatency$` and its `$EndLowLatency$`,
    /// then splice out both marker kinds. Returns the number of markers
    /// removed.
    pub fn tag_low_latency_regions(&mut self, graph: &mut Graph) -> Result<usize> {
        let starts = graph.find_by_kind(VirtualMarker::LowLatency);
        let ends = graph.find_by_kind(VirtualMarker::EndLowLatency);

        let controller =
            VisitController::bounded(&[VirtualMarker::LowLatency, VirtualMarker::EndLowLatency]);
        for &start in &starts {
            let region = self.new_low_latency_region_id();
            let children = graph.downstream(start);
            tracing::debug!("Tagging low latency region {} from '{}'", region, graph[start].name);
            visit_once(graph, &controller, &children, |g, id| {
                g[id].placement_mut().tag_low_latency_region(&region);
                Ok(())
            })?;
        }

        let mut markers = ends;
        markers.extend(starts);
        remove_operators(graph, &markers)?;
        Ok(markers.len())
    }
}

fn check_valid_isolation(graph: &mut Graph, isolate: OperatorId) -> Result<()> {
    let children = graph.downstream(isolate);
    let parents = graph.upstream(isolate);

    if parents
        .iter()
        .any(|&p| graph[p].is_marker(VirtualMarker::Isolate))
    {
        return Err(SplError::InvalidGraph(
            "Cannot put \"isolate\" regions immediately adjacent to each other. E.g -- .isolate().isolate()"
                .to_string(),
        ));
    }

    let controller = VisitController::bounded(&[VirtualMarker::Isolate]);
    visit_once(graph, &controller, &parents, |_, id| {
        if children.contains(&id) {
            return Err(SplError::InvalidGraph(
                "Invalid isolation configuration. An isolated region is joined with a non-isolated region."
                    .to_string(),
            ));
        }
        Ok(())
    })
}

/// Record each operator's colocation key: explicit tag, else low latency
/// region, else isolate region. Returns how many operators got a key.
pub fn resolve_colocation_tags(graph: &mut Graph) -> usize {
    let mut resolved = 0;
    for id in graph.operator_ids() {
        let placement = graph[id].placement_mut();
        placement.colocate_key = placement.effective_colocation().map(str::to_string);
        if placement.colocate_key.is_some() {
            resolved += 1;
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::{chain_graph, graph_from_ops, op};

    fn region(graph: &Graph, name: &str) -> Option<String> {
        let id = graph.find_by_name(name).unwrap();
        graph[id].placement().isolate_region_id.clone()
    }

    #[test]
    fn test_isolate_splits_regions() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["iso"]),
            op("iso", "$Isolate$", &["a"], &["b"]),
            op("b", "B", &["iso"], &["c"]),
            op("c", "C", &["b"], &[]),
        ]);
        let mut placement = PePlacement::new();
        assert_eq!(placement.tag_isolation_regions(&mut graph).unwrap(), 1);

        assert!(graph.find_by_name("iso").is_none());
        assert_eq!(region(&graph, "a").as_deref(), Some("__jaa_isolateId0"));
        assert_eq!(region(&graph, "b").as_deref(), Some("__jaa_isolateId1"));
        assert_eq!(region(&graph, "c").as_deref(), Some("__jaa_isolateId1"));
    }

    #[test]
    fn test_rejoin_detected() {
        // a -> iso -> b -> c, and a -> c directly.
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["iso", "c"]),
            op("iso", "$Isolate$", &["a"], &["b"]),
            op("b", "B", &["iso"], &["c"]),
            op("c", "C", &["b", "a"], &[]),
        ]);
        let err = PePlacement::new()
            .tag_isolation_regions(&mut graph)
            .unwrap_err();
        assert!(matches!(err, SplError::InvalidGraph(_)));
        assert!(err.to_string().contains("joined with a non-isolated region"));
    }

    #[test]
    fn test_adjacent_isolates_rejected() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["i1"]),
            op("i1", "$Isolate$", &["a"], &["i2"]),
            op("i2", "$Isolate$", &["i1"], &["b"]),
            op("b", "B", &["i2"], &[]),
        ]);
        let err = PePlacement::new()
            .tag_isolation_regions(&mut graph)
            .unwrap_err();
        assert!(err.to_string().contains("immediately adjacent"));
    }

    #[test]
    fn test_island_sweep_covers_every_operator() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["b"]),
            op("b", "B", &["a"], &[]),
            op("x", "X", &[], &["y"]),
            op("y", "Y", &["x"], &[]),
        ]);
        PePlacement::new().tag_isolation_regions(&mut graph).unwrap();
        for (_, op) in graph.iter() {
            assert!(op.placement().isolate_region().is_some(), "{} untagged", op.name);
        }
        assert_ne!(region(&graph, "a"), region(&graph, "x"));
        assert_eq!(region(&graph, "a"), region(&graph, "b"));
    }

    #[test]
    fn test_tagging_twice_changes_nothing() {
        let mut graph = chain_graph(&["a", "b", "c"]);
        let mut placement = PePlacement::new();
        placement.tag_isolation_regions(&mut graph).unwrap();
        let before = graph.to_document();
        placement.tag_isolation_regions(&mut graph).unwrap();
        assert_eq!(graph.to_document(), before);
    }

    #[test]
    fn test_low_latency_region_bounded_by_markers() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["ll"]),
            op("ll", "$LowLatency$", &["a"], &["b"]),
            op("b", "B", &["ll"], &["c"]),
            op("c", "C", &["b"], &["end"]),
            op("end", "$EndLowLatency$", &["c"], &["d"]),
            op("d", "D", &["end"], &[]),
        ]);
        let mut placement = PePlacement::new();
        assert_eq!(placement.tag_low_latency_regions(&mut graph).unwrap(), 2);

        let ll = |name: &str| {
            let id = graph.find_by_name(name).unwrap();
            graph[id].placement().low_latency_region_id.clone()
        };
        assert_eq!(ll("a"), None);
        assert_eq!(ll("b").as_deref(), Some("LowLatencyRegion0"));
        assert_eq!(ll("c").as_deref(), Some("LowLatencyRegion0"));
        assert_eq!(ll("d"), None);
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_colocation_precedence() {
        let mut graph = chain_graph(&["a", "b", "c"]);
        let a = graph.find_by_name("a").unwrap();
        let b = graph.find_by_name("b").unwrap();
        graph[a].placement_mut().isolate_region_id = Some("__jaa_isolateId0".into());
        graph[a].placement_mut().colocation_tag = Some("explicit".into());
        graph[b].placement_mut().isolate_region_id = Some("__jaa_isolateId0".into());
        graph[b].placement_mut().low_latency_region_id = Some("LowLatencyRegion0".into());

        assert_eq!(resolve_colocation_tags(&mut graph), 2);
        assert_eq!(graph[a].placement().colocate_key.as_deref(), Some("explicit"));
        assert_eq!(graph[b].placement().colocate_key.as_deref(), Some("LowLatencyRegion0"));
    }
}
