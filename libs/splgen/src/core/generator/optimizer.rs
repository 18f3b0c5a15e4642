// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Parameter-only optimizations applied once the graph structure is final.

use serde_json::Value;

use crate::core::graph::{Graph, Parameter};

const PY_NAMESPACES: [&str; 2] = [
    "com.ibm.streamsx.topology.functional.python",
    "com.ibm.streamsx.topology.functional.python2",
];
const PY_FUNCTIONAL_OPS: [&str; 6] = ["Source", "Filter", "Map", "FlatMap", "ForEach", "Aggregate"];
/// Consumers that fully handle tuples passed by reference.
const BY_REFERENCE_CONSUMERS: [&str; 4] = ["Map", "ForEach", "FlatMap", "Aggregate"];

pub const PASS_BY_REF_SCHEMA: &str = "tuple<blob __spl_po>";
pub const OUTPUT_CONNECTIONS_PARAM: &str = "outputConnections";

fn split_kind(kind: &str) -> Option<(&str, &str)> {
    kind.rsplit_once("::")
}

pub fn is_python_functional(kind: &str) -> bool {
    split_kind(kind)
        .is_some_and(|(ns, op)| PY_NAMESPACES.contains(&ns) && PY_FUNCTIONAL_OPS.contains(&op))
}

fn accepts_by_reference(kind: &str) -> bool {
    is_python_functional(kind)
        && split_kind(kind).is_some_and(|(_, op)| BY_REFERENCE_CONSUMERS.contains(&op))
}

/// Run every optimization. Returns the number of operators changed.
pub fn optimize(graph: &mut Graph) -> usize {
    python_pass_by_reference(graph)
}

/// Let Python functional operators hand objects to each other without
/// pickling.
///
/// For each blob output port whose consumers all accept references, the
/// port's connection count is recorded in the `outputConnections`
/// parameter; other ports record `-1`. Ports without connections record `0`.
fn python_pass_by_reference(graph: &mut Graph) -> usize {
    let mut changed = 0;
    for id in graph.operator_ids() {
        let op = &graph[id];
        if !is_python_functional(&op.kind) || op.outputs.is_empty() {
            continue;
        }

        let consumers_ok = graph
            .downstream(id)
            .into_iter()
            .all(|c| accepts_by_reference(&graph[c].kind));

        let counts: Vec<i64> = op
            .outputs
            .iter()
            .map(|output| {
                if output.schema != PASS_BY_REF_SCHEMA {
                    -1
                } else if output.connections.is_empty() {
                    0
                } else if consumers_ok {
                    output.connections.len() as i64
                } else {
                    -1
                }
            })
            .collect();

        if counts.iter().all(|&c| c == -1) {
            continue;
        }

        let value = match counts.as_slice() {
            [single] => Value::from(*single),
            many => Value::from(many.to_vec()),
        };
        tracing::debug!("Pass by reference on '{}': {}", op.name, value);
        graph[id]
            .parameters
            .insert(OUTPUT_CONNECTIONS_PARAM, Parameter::Literal(value));
        changed += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::test_support::{graph_from_ops, op};
    use crate::core::graph::{Operator, OutputPort};
    use serde_json::json;

    const PY: &str = "com.ibm.streamsx.topology.functional.python";

    fn py_op(name: &str, kind: &str, ups: &[&str], downs: &[&str]) -> Operator {
        let mut o = op(name, &format!("{PY}::{kind}"), ups, downs);
        for output in &mut o.outputs {
            output.schema = PASS_BY_REF_SCHEMA.to_string();
        }
        o
    }

    fn output_connections(graph: &Graph, name: &str) -> Option<Parameter> {
        let id = graph.find_by_name(name).unwrap();
        graph[id].parameters.get(OUTPUT_CONNECTIONS_PARAM).cloned()
    }

    #[test]
    fn test_kind_matching() {
        assert!(is_python_functional(&format!("{PY}::Map")));
        assert!(is_python_functional(&format!("{PY}2::Source")));
        assert!(!is_python_functional(&format!("{PY}::HashAdder")));
        assert!(!is_python_functional("spl.relational::Filter"));
    }

    #[test]
    fn test_python_chain_counts_connections() {
        let mut graph = graph_from_ops(vec![
            py_op("src", "Source", &[], &["m1", "m2"]),
            py_op("m1", "Map", &["src"], &[]),
            py_op("m2", "ForEach", &["src"], &[]),
        ]);
        assert_eq!(optimize(&mut graph), 1);
        assert_eq!(output_connections(&graph, "src"), Some(Parameter::Literal(json!(2))));
    }

    #[test]
    fn test_non_python_consumer_blocks() {
        let mut graph = graph_from_ops(vec![
            py_op("src", "Source", &[], &["f"]),
            py_op("f", "Filter", &["src"], &["snk"]),
            op("snk", "spl.adapter::FileSink", &["f"], &[]),
        ]);
        // Filter is not a by-reference consumer, FileSink is not Python.
        assert_eq!(optimize(&mut graph), 0);
        assert!(output_connections(&graph, "src").is_none());
        assert!(output_connections(&graph, "f").is_none());
    }

    #[test]
    fn test_unconnected_port_records_zero() {
        let mut source = Operator::new("src", format!("{PY}::Source"));
        source.outputs.push(OutputPort::new("src_OUT0", PASS_BY_REF_SCHEMA));
        let mut graph = graph_from_ops(vec![source]);
        assert_eq!(optimize(&mut graph), 1);
        assert_eq!(output_connections(&graph, "src"), Some(Parameter::Literal(json!(0))));
    }
}
