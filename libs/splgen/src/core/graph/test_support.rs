// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Graph builders shared by unit tests.

use super::graph::{Graph, GraphDocument};
use super::operator::Operator;
use super::port::{InputPort, OutputPort};

pub(crate) const SCHEMA: &str = "tuple<int32 a>";

/// Operator with a single input `<name>_IN0` fed by each of `ups`, and a
/// single output `<name>_OUT0` feeding each of `downs`. Ports are only
/// created when the corresponding list is non-empty.
pub(crate) fn op(name: &str, kind: &str, ups: &[&str], downs: &[&str]) -> Operator {
    let mut operator = Operator::new(name, kind);
    if !ups.is_empty() {
        let mut input = InputPort::new(format!("{name}_IN0"), SCHEMA);
        input.connections = ups.iter().map(|u| format!("{u}_OUT0")).collect();
        operator.inputs.push(input);
    }
    if !downs.is_empty() {
        let mut output = OutputPort::new(format!("{name}_OUT0"), SCHEMA);
        output.connections = downs.iter().map(|d| format!("{d}_IN0")).collect();
        operator.outputs.push(output);
    }
    operator
}

pub(crate) fn graph_from_ops(operators: Vec<Operator>) -> Graph {
    Graph::from_document(GraphDocument {
        name: "App".into(),
        public: true,
        operators,
        ..Default::default()
    })
    .unwrap()
}

/// Linear pipeline `names[0] -> names[1] -> ...`, kinds upper-cased names.
pub(crate) fn chain_graph(names: &[&str]) -> Graph {
    let operators = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let ups: Vec<&str> = if i > 0 { vec![names[i - 1]] } else { vec![] };
            let downs: Vec<&str> = names.get(i + 1).into_iter().copied().collect();
            op(name, &name.to_uppercase(), &ups, &downs)
        })
        .collect();
    graph_from_ops(operators)
}
