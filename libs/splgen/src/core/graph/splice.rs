// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Structural rewrites that keep both sides of every connection consistent.

use crate::core::error::{Result, SplError};

use super::graph::{Graph, OperatorId};

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|c| c == name) {
        list.push(name.to_string());
    }
}

/// Splice each operator out of the graph, wiring its parents straight to
/// its children.
///
/// Only the first output port of a spliced operator is rewired, so every
/// target must have at most one output port. All input ports are rewired.
pub fn remove_operators(graph: &mut Graph, ops: &[OperatorId]) -> Result<()> {
    for &id in ops {
        remove_operator(graph, id)?;
    }
    Ok(())
}

pub fn remove_operator(graph: &mut Graph, id: OperatorId) -> Result<()> {
    let op = graph
        .get(id)
        .ok_or_else(|| SplError::OperatorNotFound(id.to_string()))?;
    if op.outputs.len() > 1 {
        return Err(SplError::InvalidGraph(format!(
            "cannot splice out '{}': {} output ports, at most one is supported",
            op.name,
            op.outputs.len()
        )));
    }

    let out_name = op.outputs.first().map(|o| o.name.clone());
    let in_names: Vec<String> = op.inputs.iter().map(|i| i.name.clone()).collect();
    let parents = graph.upstream(id);
    let children = graph.downstream(id);

    tracing::debug!(
        "Splicing out '{}' ({} parents, {} children)",
        op.name,
        parents.len(),
        children.len()
    );

    // Drop the connection pointing at the spliced operator on each neighbour
    // port, remembering the port so it can be cross-wired below.
    let mut child_ports: Vec<(OperatorId, usize)> = Vec::new();
    let mut child_input_names: Vec<String> = Vec::new();
    if let Some(out_name) = &out_name {
        for &child in &children {
            for (port_idx, input) in graph[child].inputs.iter_mut().enumerate() {
                if let Some(pos) = input.connections.iter().position(|c| c == out_name) {
                    input.connections.remove(pos);
                    child_ports.push((child, port_idx));
                    child_input_names.push(input.name.clone());
                }
            }
        }
    }

    let mut parent_ports: Vec<(OperatorId, usize)> = Vec::new();
    let mut parent_output_names: Vec<String> = Vec::new();
    for &parent in &parents {
        for (port_idx, output) in graph[parent].outputs.iter_mut().enumerate() {
            if let Some(pos) = output.connections.iter().position(|c| in_names.contains(c)) {
                output.connections.remove(pos);
                parent_ports.push((parent, port_idx));
                parent_output_names.push(output.name.clone());
            }
        }
    }

    for &(child, port_idx) in &child_ports {
        let connections = &mut graph[child].inputs[port_idx].connections;
        for name in &parent_output_names {
            push_unique(connections, name);
        }
    }
    for &(parent, port_idx) in &parent_ports {
        let connections = &mut graph[parent].outputs[port_idx].connections;
        for name in &child_input_names {
            push_unique(connections, name);
        }
    }

    graph.detach(id);
    Ok(())
}

/// Insert `add` (already in the graph) between every parent of `op` and `op`.
pub fn add_before(graph: &mut Graph, op: OperatorId, add: OperatorId) -> Result<()> {
    for parent in graph.upstream(op) {
        add_between(graph, parent, op, add)?;
    }
    Ok(())
}

/// Route every stream from `parent` to `child` through `add`.
///
/// `add` uses its first input and first output port.
pub fn add_between(
    graph: &mut Graph,
    parent: OperatorId,
    child: OperatorId,
    add: OperatorId,
) -> Result<()> {
    let (add_in, add_out) = {
        let add_op = &graph[add];
        match (add_op.inputs.first(), add_op.outputs.first()) {
            (Some(i), Some(o)) => (i.name.clone(), o.name.clone()),
            _ => {
                return Err(SplError::InvalidGraph(format!(
                    "cannot insert '{}': needs an input and an output port",
                    add_op.name
                )));
            }
        }
    };

    let output_names: Vec<(usize, String)> = graph[parent]
        .outputs
        .iter()
        .enumerate()
        .map(|(i, o)| (i, o.name.clone()))
        .collect();
    let input_names: Vec<(usize, String)> = graph[child]
        .inputs
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.name.clone()))
        .collect();

    for (out_idx, out_name) in &output_names {
        for (in_idx, in_name) in &input_names {
            let linked = graph[parent].outputs[*out_idx].connections.contains(in_name)
                || graph[child].inputs[*in_idx].connections.contains(out_name);
            if !linked {
                continue;
            }

            for conn in graph[parent].outputs[*out_idx].connections.iter_mut() {
                if conn == in_name {
                    *conn = add_in.clone();
                }
            }
            for conn in graph[child].inputs[*in_idx].connections.iter_mut() {
                if conn == out_name {
                    *conn = add_out.clone();
                }
            }

            let add_op = &mut graph[add];
            push_unique(&mut add_op.inputs[0].connections, out_name);
            push_unique(&mut add_op.outputs[0].connections, in_name);
        }
    }

    graph.reindex();
    Ok(())
}
