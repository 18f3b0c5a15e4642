// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Index, IndexMut};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{Result, SplError};

use super::marker::VirtualMarker;
use super::operator::Operator;
use super::parameter::Parameters;
use super::window::TimeUnit;

/// Stable handle of an operator inside a [`Graph`].
///
/// Identity is the handle, never the operator's fields: two operators with
/// equal content are still distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(NodeIndex);

impl OperatorId {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0.index())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub period: i64,
    pub unit: TimeUnit,
}

/// Graph level build and runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// JVM arguments appended to every Java operator's `vmArg`.
    #[serde(rename = "topology.vmArgs", default, skip_serializing_if = "Vec::is_empty")]
    pub vm_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_public() -> bool {
    true
}

/// Serialized form of a topology graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub config: GraphConfig,
    #[serde(default)]
    pub operators: Vec<Operator>,
}

/// Which port lists of the two endpoints reference each other.
///
/// Connections are recorded on both sides of a stream; the two lists can
/// disagree while a rewrite is half done, so each direction is tracked
/// separately.
#[derive(Debug, Clone, Copy, Default)]
struct Adjacency {
    /// An output port of the source lists an input port of the target.
    forward: bool,
    /// An input port of the target lists an output port of the source.
    backward: bool,
}

/// Operator arena with an adjacency index derived from port connections.
///
/// Port `connections` are authoritative; the petgraph edges are an index
/// rebuilt by [`Graph::reindex`] after every structural mutation made through
/// `Graph` methods. Code editing ports through `IndexMut` must call
/// `reindex` before querying neighbours again.
#[derive(Debug, Clone)]
pub struct Graph {
    pub name: String,
    pub namespace: Option<String>,
    pub public: bool,
    pub parameters: Parameters,
    pub config: GraphConfig,
    graph: StableDiGraph<Operator, Adjacency>,
    order: Vec<NodeIndex>,
    position: HashMap<NodeIndex, usize>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            public: true,
            parameters: Parameters::new(),
            config: GraphConfig::default(),
            graph: StableDiGraph::default(),
            order: Vec::new(),
            position: HashMap::new(),
        }
    }

    pub fn from_document(doc: GraphDocument) -> Result<Self> {
        let mut seen = HashSet::new();
        for op in &doc.operators {
            if !seen.insert(op.name.as_str()) {
                return Err(SplError::InvalidGraph(format!(
                    "duplicate operator name '{}'",
                    op.name
                )));
            }
        }

        let mut graph = Graph::new(doc.name);
        graph.namespace = doc.namespace;
        graph.public = doc.public;
        graph.parameters = doc.parameters;
        graph.config = doc.config;
        for op in doc.operators {
            let idx = graph.graph.add_node(op);
            graph.order.push(idx);
        }
        graph.reindex();
        Ok(graph)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn from_json_value(json: Value) -> Result<Self> {
        Self::from_document(serde_json::from_value(json)?)
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            public: self.public,
            parameters: self.parameters.clone(),
            config: self.config.clone(),
            operators: self.order.iter().map(|&idx| self.graph[idx].clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: OperatorId) -> bool {
        self.graph.contains_node(id.0)
    }

    /// Operator handles in graph order.
    pub fn operator_ids(&self) -> Vec<OperatorId> {
        self.order.iter().map(|&idx| OperatorId(idx)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OperatorId, &Operator)> {
        self.order.iter().map(|&idx| (OperatorId(idx), &self.graph[idx]))
    }

    pub fn get(&self, id: OperatorId) -> Option<&Operator> {
        self.graph.node_weight(id.0)
    }

    pub fn get_mut(&mut self, id: OperatorId) -> Option<&mut Operator> {
        self.graph.node_weight_mut(id.0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<OperatorId> {
        self.iter().find(|(_, op)| op.name == name).map(|(id, _)| id)
    }

    /// All operators of the given marker kind, in graph order.
    pub fn find_by_kind(&self, marker: VirtualMarker) -> Vec<OperatorId> {
        self.iter()
            .filter(|(_, op)| op.is_marker(marker))
            .map(|(id, _)| id)
            .collect()
    }

    /// Source operators: no input ports and a name not starting with `$`.
    pub fn find_starts(&self) -> Vec<OperatorId> {
        self.iter()
            .filter(|(_, op)| op.inputs.is_empty() && !op.name.starts_with('$'))
            .map(|(id, _)| id)
            .collect()
    }

    /// Operators having an input port listed in any output connection of `id`.
    pub fn downstream(&self, id: OperatorId) -> Vec<OperatorId> {
        let mut ops: Vec<OperatorId> = self
            .graph
            .edges_directed(id.0, Direction::Outgoing)
            .filter(|e| e.weight().forward)
            .map(|e| OperatorId(e.target()))
            .collect();
        self.sort_by_position(&mut ops);
        ops
    }

    /// Operators having an output port listed in any input connection of `id`.
    pub fn upstream(&self, id: OperatorId) -> Vec<OperatorId> {
        let mut ops: Vec<OperatorId> = self
            .graph
            .edges_directed(id.0, Direction::Incoming)
            .filter(|e| e.weight().backward)
            .map(|e| OperatorId(e.source()))
            .collect();
        self.sort_by_position(&mut ops);
        ops
    }

    fn sort_by_position(&self, ops: &mut Vec<OperatorId>) {
        ops.sort_by_key(|id| self.position.get(&id.0).copied().unwrap_or(usize::MAX));
        ops.dedup();
    }

    /// Append an operator to the graph.
    pub fn add_operator(&mut self, op: Operator) -> OperatorId {
        let idx = self.graph.add_node(op);
        self.order.push(idx);
        self.reindex();
        OperatorId(idx)
    }

    /// Insert an operator immediately before `anchor` in graph order.
    pub fn insert_operator_before(&mut self, anchor: OperatorId, op: Operator) -> OperatorId {
        let idx = self.graph.add_node(op);
        let at = self
            .order
            .iter()
            .position(|&n| n == anchor.0)
            .unwrap_or(self.order.len());
        self.order.insert(at, idx);
        self.reindex();
        OperatorId(idx)
    }

    /// Drop an operator without touching its neighbours' connections.
    pub(crate) fn detach(&mut self, id: OperatorId) -> Option<Operator> {
        let op = self.graph.remove_node(id.0)?;
        self.order.retain(|&n| n != id.0);
        self.reindex();
        Some(op)
    }

    /// Rebuild the adjacency index from port connections.
    pub fn reindex(&mut self) {
        self.position = self
            .order
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (idx, pos))
            .collect();

        let mut input_owners: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
        let mut output_owners: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
        for &idx in &self.order {
            let op = &self.graph[idx];
            for input in &op.inputs {
                input_owners.entry(input.name.as_str()).or_default().push(idx);
            }
            for output in &op.outputs {
                output_owners.entry(output.name.as_str()).or_default().push(idx);
            }
        }

        let mut links: HashMap<(NodeIndex, NodeIndex), Adjacency> = HashMap::new();
        for &idx in &self.order {
            let op = &self.graph[idx];
            for conn in op.outputs.iter().flat_map(|o| &o.connections) {
                for &target in input_owners.get(conn.as_str()).into_iter().flatten() {
                    links.entry((idx, target)).or_default().forward = true;
                }
            }
            for conn in op.inputs.iter().flat_map(|i| &i.connections) {
                for &source in output_owners.get(conn.as_str()).into_iter().flatten() {
                    links.entry((source, idx)).or_default().backward = true;
                }
            }
        }

        self.graph.clear_edges();
        for ((source, target), adjacency) in links {
            self.graph.add_edge(source, target, adjacency);
        }
    }
}

impl Index<OperatorId> for Graph {
    type Output = Operator;

    fn index(&self, id: OperatorId) -> &Operator {
        &self.graph[id.0]
    }
}

impl IndexMut<OperatorId> for Graph {
    fn index_mut(&mut self, id: OperatorId) -> &mut Operator {
        &mut self.graph[id.0]
    }
}
