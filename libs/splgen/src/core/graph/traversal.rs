// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Breadth-first region traversal bounded by virtual markers.

use std::collections::{HashSet, VecDeque};

use crate::core::error::Result;

use super::graph::{Graph, OperatorId};
use super::marker::VirtualMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upstream,
    Downstream,
    Both,
}

/// Direction and marker boundaries of a [`visit_once`] walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitController {
    pub direction: Direction,
    pub boundaries: Vec<VirtualMarker>,
}

impl VisitController {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            boundaries: Vec::new(),
        }
    }

    /// Walk both directions, relaying through `boundaries`.
    pub fn bounded(boundaries: &[VirtualMarker]) -> Self {
        Self {
            direction: Direction::Both,
            boundaries: boundaries.to_vec(),
        }
    }

    fn is_boundary(&self, graph: &Graph, id: OperatorId) -> bool {
        graph[id]
            .marker()
            .is_some_and(|m| self.boundaries.contains(&m))
    }
}

impl Default for VisitController {
    fn default() -> Self {
        Self::new(Direction::Downstream)
    }
}

/// Visit every operator reachable from `starts`, once each.
///
/// Boundary operators are never visited. When the walk reaches one it is
/// marked as seen and the walk continues from the boundary's *other side
/// of the same edge*: reaching a boundary upstream enqueues its children,
/// reaching one downstream enqueues its parents. A region is therefore
/// everything connected to the starts without passing through a boundary.
///
/// `visit` may edit operator annotations but must not change ports or
/// connections. Start operators are visited as given, even when they are
/// boundaries themselves.
pub fn visit_once<F>(
    graph: &mut Graph,
    controller: &VisitController,
    starts: &[OperatorId],
    mut visit: F,
) -> Result<()>
where
    F: FnMut(&mut Graph, OperatorId) -> Result<()>,
{
    let mut visited: HashSet<OperatorId> = HashSet::new();
    let mut unvisited: VecDeque<OperatorId> = starts.iter().copied().collect();

    while let Some(op) = unvisited.pop_front() {
        if !visited.insert(op) {
            continue;
        }
        visit(graph, op)?;
        unvisited.extend(unvisited_adjacent(graph, controller, &mut visited, op));
    }
    Ok(())
}

fn unvisited_adjacent(
    graph: &Graph,
    controller: &VisitController,
    visited: &mut HashSet<OperatorId>,
    op: OperatorId,
) -> Vec<OperatorId> {
    let mut next = Vec::new();

    if controller.direction != Direction::Downstream {
        let mut relayed = Vec::new();
        for parent in graph.upstream(op) {
            if visited.contains(&parent) {
                continue;
            }
            if controller.is_boundary(graph, parent) {
                visited.insert(parent);
                relayed.extend(graph.downstream(parent));
            } else {
                next.push(parent);
            }
        }
        next.extend(relayed.into_iter().filter(|id| !visited.contains(id)));
    }

    if controller.direction != Direction::Upstream {
        let mut relayed = Vec::new();
        for child in graph.downstream(op) {
            if visited.contains(&child) {
                continue;
            }
            if controller.is_boundary(graph, child) {
                visited.insert(child);
                relayed.extend(graph.upstream(child));
            } else {
                next.push(child);
            }
        }
        next.extend(relayed.into_iter().filter(|id| !visited.contains(id)));
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::{chain_graph, graph_from_ops, op};

    fn collect(graph: &mut Graph, controller: &VisitController, starts: &[OperatorId]) -> Vec<String> {
        let mut names = Vec::new();
        visit_once(graph, controller, starts, |g, id| {
            names.push(g[id].name.clone());
            Ok(())
        })
        .unwrap();
        names
    }

    #[test]
    fn test_visits_whole_chain_both_ways() {
        let mut graph = chain_graph(&["a", "b", "c"]);
        let b = graph.find_by_name("b").unwrap();
        let names = collect(&mut graph, &VisitController::bounded(&[]), &[b]);
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_direction_limits_walk() {
        let mut graph = chain_graph(&["a", "b", "c"]);
        let b = graph.find_by_name("b").unwrap();
        let down = collect(&mut graph, &VisitController::new(Direction::Downstream), &[b]);
        assert_eq!(down, vec!["b", "c"]);
        let up = collect(&mut graph, &VisitController::new(Direction::Upstream), &[b]);
        assert_eq!(up, vec!["b", "a"]);
    }

    #[test]
    fn test_boundary_relays_to_same_side() {
        // a -> $Isolate$ -> b ; walking downstream from a reaches the marker,
        // which relays back to its parents (a, already seen), so b is not visited.
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["iso"]),
            op("iso", "$Isolate$", &["a"], &["b"]),
            op("b", "B", &["iso"], &[]),
        ]);
        let a = graph.find_by_name("a").unwrap();
        let names = collect(&mut graph, &VisitController::bounded(&[VirtualMarker::Isolate]), &[a]);
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_boundary_relay_picks_up_sibling_parents() {
        // a and x both feed the marker; starting at a the relay reaches x.
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["iso"]),
            op("x", "X", &[], &["iso"]),
            op("iso", "$Isolate$", &["a", "x"], &["b"]),
            op("b", "B", &["iso"], &[]),
        ]);
        let a = graph.find_by_name("a").unwrap();
        let names = collect(&mut graph, &VisitController::bounded(&[VirtualMarker::Isolate]), &[a]);
        assert_eq!(names, vec!["a", "x"]);
    }

    #[test]
    fn test_diamond_visits_join_once() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &[], &["b", "c"]),
            op("b", "B", &["a"], &["d"]),
            op("c", "C", &["a"], &["d"]),
            op("d", "D", &["b", "c"], &[]),
        ]);
        let a = graph.find_by_name("a").unwrap();
        let names = collect(&mut graph, &VisitController::default(), &[a]);
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = graph_from_ops(vec![
            op("a", "A", &["b"], &["b"]),
            op("b", "B", &["a"], &["a"]),
        ]);
        let a = graph.find_by_name("a").unwrap();
        let names = collect(&mut graph, &VisitController::bounded(&[]), &[a]);
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_visitor_error_aborts() {
        let mut graph = chain_graph(&["a", "b"]);
        let a = graph.find_by_name("a").unwrap();
        let mut seen = 0;
        let result = visit_once(&mut graph, &VisitController::default(), &[a], |_, _| {
            seen += 1;
            Err(crate::core::error::SplError::InvalidGraph("stop".into()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }
}
