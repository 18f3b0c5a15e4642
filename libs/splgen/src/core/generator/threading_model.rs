// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::error::Result;
use crate::core::graph::{Graph, QueueConfig, VisitController, visit_once};

use super::literals::spl_basename;

pub const DEFAULT_QUEUE_SIZE: u32 = 100;
pub const DEFAULT_CONGESTION_POLICY: &str = "Sys.Wait";
pub const QUEUE_SIZE_PARAM: &str = "queueSize";

/// Decide which threaded-port requests survive.
///
/// Only single-input operators are considered. The request is dropped when
/// the operator sits in a low latency region or its colocation key differs
/// from a parent's, since the PE boundary already decouples the threads.
/// Dropping a functional request also drops its `queueSize` parameter. A
/// surviving non-functional request becomes an SPL `threadedPort` queue.
///
/// Returns the number of requests dropped.
pub fn preprocess_threaded_ports(graph: &mut Graph) -> Result<usize> {
    let starts = graph.find_starts();
    let mut dropped = 0;

    visit_once(graph, &VisitController::bounded(&[]), &starts, |g, id| {
        let op = &g[id];
        if op.inputs.len() != 1 {
            return Ok(());
        }
        let Some(threaded) = op.inputs[0].queue.clone() else {
            return Ok(());
        };

        let in_low_latency = op.placement().low_latency_region().is_some();
        let colocation = op.placement().effective_colocation();
        let crosses_pe = g
            .upstream(id)
            .into_iter()
            .filter(|&p| g[p].marker().is_none())
            .any(|p| g[p].placement().effective_colocation() != colocation);
        // SPL names an input port by its alias, else by its stream.
        let port = op.inputs[0]
            .port_ref()
            .unwrap_or(op.inputs[0].name.as_str());
        let port = spl_basename(port);

        let op = &mut g[id];
        if in_low_latency || crosses_pe {
            tracing::debug!(
                "Dropping threaded port of '{}' (low latency: {}, crosses PE: {})",
                op.name,
                in_low_latency,
                crosses_pe
            );
            op.inputs[0].queue = None;
            if threaded.functional {
                op.parameters.remove(QUEUE_SIZE_PARAM);
            }
            dropped += 1;
        } else if !threaded.functional && op.config.queue.is_none() {
            op.config.queue = Some(QueueConfig {
                queue_size: DEFAULT_QUEUE_SIZE,
                input_port_name: port,
                congestion_policy: DEFAULT_CONGESTION_POLICY.to_string(),
            });
        }
        Ok(())
    })?;

    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::chain_graph;
    use crate::core::graph::{Parameter, ThreadedPort};

    fn with_queue(graph: &mut Graph, name: &str, functional: bool) {
        let id = graph.find_by_name(name).unwrap();
        graph[id].inputs[0].queue = Some(ThreadedPort { functional });
        if functional {
            graph[id]
                .parameters
                .insert(QUEUE_SIZE_PARAM, Parameter::literal(50));
        }
    }

    fn colocate(graph: &mut Graph, name: &str, key: &str) {
        let id = graph.find_by_name(name).unwrap();
        graph[id].placement_mut().isolate_region_id = Some(key.into());
    }

    #[test]
    fn test_same_pe_queue_becomes_config() {
        let mut graph = chain_graph(&["a", "b"]);
        colocate(&mut graph, "a", "r0");
        colocate(&mut graph, "b", "r0");
        with_queue(&mut graph, "b", false);

        assert_eq!(preprocess_threaded_ports(&mut graph).unwrap(), 0);
        let b = graph.find_by_name("b").unwrap();
        let queue = graph[b].config.queue.as_ref().unwrap();
        assert_eq!(queue.queue_size, 100);
        assert_eq!(queue.input_port_name, "a_OUT0");
        assert_eq!(queue.congestion_policy, "Sys.Wait");
    }

    #[test]
    fn test_queue_names_aliased_port() {
        let mut graph = chain_graph(&["a", "b"]);
        colocate(&mut graph, "a", "r0");
        colocate(&mut graph, "b", "r0");
        with_queue(&mut graph, "b", false);
        let b = graph.find_by_name("b").unwrap();
        graph[b].inputs[0].alias = Some("Readings".into());

        preprocess_threaded_ports(&mut graph).unwrap();
        let queue = graph[b].config.queue.as_ref().unwrap();
        assert_eq!(queue.input_port_name, "Readings");
    }

    #[test]
    fn test_crossing_pe_drops_queue() {
        let mut graph = chain_graph(&["a", "b"]);
        colocate(&mut graph, "a", "r0");
        colocate(&mut graph, "b", "r1");
        with_queue(&mut graph, "b", true);

        assert_eq!(preprocess_threaded_ports(&mut graph).unwrap(), 1);
        let b = graph.find_by_name("b").unwrap();
        assert!(graph[b].inputs[0].queue.is_none());
        assert!(!graph[b].parameters.contains(QUEUE_SIZE_PARAM));
        assert!(graph[b].config.queue.is_none());
    }

    #[test]
    fn test_low_latency_drops_queue() {
        let mut graph = chain_graph(&["a", "b"]);
        colocate(&mut graph, "a", "r0");
        colocate(&mut graph, "b", "r0");
        let b = graph.find_by_name("b").unwrap();
        graph[b].placement_mut().low_latency_region_id = Some("LowLatencyRegion0".into());
        graph[b].placement_mut().colocation_tag = Some("r0".into());
        with_queue(&mut graph, "b", false);

        assert_eq!(preprocess_threaded_ports(&mut graph).unwrap(), 1);
        assert!(graph[b].config.queue.is_none());
    }

    #[test]
    fn test_functional_queue_kept_as_parameter() {
        let mut graph = chain_graph(&["a", "b"]);
        colocate(&mut graph, "a", "r0");
        colocate(&mut graph, "b", "r0");
        with_queue(&mut graph, "b", true);

        assert_eq!(preprocess_threaded_ports(&mut graph).unwrap(), 0);
        let b = graph.find_by_name("b").unwrap();
        assert!(graph[b].parameters.contains(QUEUE_SIZE_PARAM));
        assert!(graph[b].config.queue.is_none());
    }
}
