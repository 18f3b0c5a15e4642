// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::marker::VirtualMarker;
use super::parameter::Parameters;
use super::placement::Placement;
use super::port::{InputPort, OutputPort, Width};

pub const MODEL_FUNCTIONAL: &str = "functional";
pub const LANGUAGE_JAVA: &str = "java";

/// SPL `threadedPort` queue emitted in the operator config clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub queue_size: u32,
    pub input_port_name: String,
    pub congestion_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub name: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub buffer_time: f64,
    pub sample_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activate_option: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    #[serde(default, skip_serializing_if = "Placement::is_empty")]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_viewability: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub view_configs: Vec<ViewConfig>,
}

/// Consistent region membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistent {
    /// Periodic trigger in seconds; operator driven when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    pub drain_timeout: f64,
    pub reset_timeout: f64,
    pub max_consecutive_reset_attempts: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threading {
    pub model: String,
}

/// One node of the topology graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "sourcelocation", default, skip_serializing_if = "Vec::is_empty")]
    pub source_locations: Vec<Value>,
    /// Layout hints carried to the SPL compiler as a note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Map<String, Value>>,
    #[serde(default)]
    pub inputs: Vec<InputPort>,
    #[serde(default)]
    pub outputs: Vec<OutputPort>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
    #[serde(default)]
    pub config: OperatorConfig,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub parallel_operator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Width>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partitioned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_input_port_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitioned_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broadcast_ports: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub low_latency: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autonomous: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hash_adder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent: Option<Consistent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threading: Option<Threading>,
}

impl Operator {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, port: InputPort) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: OutputPort) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn marker(&self) -> Option<VirtualMarker> {
        VirtualMarker::from_kind(&self.kind)
    }

    pub fn is_marker(&self, marker: VirtualMarker) -> bool {
        self.kind == marker.kind()
    }

    pub fn is_hash_adder(&self) -> bool {
        self.hash_adder || self.kind.ends_with("::HashAdder")
    }

    pub fn is_functional(&self) -> bool {
        self.model.as_deref() == Some(MODEL_FUNCTIONAL)
    }

    pub fn is_java(&self) -> bool {
        self.language.as_deref() == Some(LANGUAGE_JAVA)
    }

    pub fn placement(&self) -> &Placement {
        &self.config.placement
    }

    pub fn placement_mut(&mut self) -> &mut Placement {
        &mut self.config.placement
    }

    /// Copy with a new name. Ports are renamed `<name>_IN<i>` /
    /// `<name>_OUT<i>` and lose their connections.
    pub fn copy_with_name(&self, name: &str) -> Operator {
        let mut copy = self.clone();
        copy.name = name.to_string();
        for (i, input) in copy.inputs.iter_mut().enumerate() {
            input.name = format!("{}_IN{}", name, input.index.unwrap_or(i));
            input.connections.clear();
        }
        for (i, output) in copy.outputs.iter_mut().enumerate() {
            output.name = format!("{}_OUT{}", name, output.index.unwrap_or(i));
            output.connections.clear();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_document() {
        let op: Operator = serde_json::from_value(json!({
            "name": "filter",
            "kind": "com.ibm.streamsx.topology.functional.java::Filter",
            "model": "functional",
            "language": "java",
            "sourcelocation": [{"file": "App.java", "line": 12}],
            "inputs": [{"name": "filter_IN0", "type": "tuple<blob __spl_po>", "connections": ["src_OUT0"]}],
            "outputs": [{"name": "filter_OUT0", "type": "tuple<blob __spl_po>", "connections": []}],
            "config": {"placement": {"explicitColocate": "together", "resourceTags": ["ingest"]}}
        }))
        .unwrap();

        assert!(op.is_functional());
        assert!(op.is_java());
        assert_eq!(op.marker(), None);
        assert_eq!(op.source_locations.len(), 1);
        assert_eq!(op.placement().colocation_tag.as_deref(), Some("together"));
        assert_eq!(op.placement().resource_tags, vec!["ingest"]);
    }

    #[test]
    fn test_marker_detection() {
        let op = Operator::new("$Isolate$_1", "$Isolate$");
        assert_eq!(op.marker(), Some(VirtualMarker::Isolate));
        assert!(op.is_marker(VirtualMarker::Isolate));
        assert!(!op.is_marker(VirtualMarker::Parallel));
    }

    #[test]
    fn test_hash_adder_detection() {
        assert!(Operator::new("h", "com.ibm.streamsx.topology.functional.java::HashAdder").is_hash_adder());
        let mut flagged = Operator::new("h", "x::Custom");
        assert!(!flagged.is_hash_adder());
        flagged.hash_adder = true;
        assert!(flagged.is_hash_adder());
    }

    #[test]
    fn test_copy_with_name_renames_ports() {
        let mut input = InputPort::new("ha_IN0", "tuple<int32 a>");
        input.connections.push("up_OUT0".into());
        let mut output = OutputPort::new("ha_OUT0", "tuple<int32 a, int32 __spl_hash>");
        output.connections.push("down_IN0".into());
        let op = Operator::new("ha", "x::HashAdder")
            .with_input(input)
            .with_output(output);

        let copy = op.copy_with_name("ha2");
        assert_eq!(copy.name, "ha2");
        assert_eq!(copy.inputs[0].name, "ha2_IN0");
        assert_eq!(copy.outputs[0].name, "ha2_OUT0");
        assert!(copy.inputs[0].connections.is_empty());
        assert!(copy.outputs[0].connections.is_empty());
        assert_eq!(copy.outputs[0].schema, op.outputs[0].schema);
    }
}
