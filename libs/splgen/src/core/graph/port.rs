// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

use super::parameter::{Parameter, Parameters};
use super::window::Window;

/// Threaded-port request on an input port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadedPort {
    /// Queue is realised through the functional operator's `queueSize`
    /// parameter rather than an SPL `threadedPort` config.
    #[serde(default)]
    pub functional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPort {
    pub name: String,
    #[serde(rename = "type", default)]
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<ThreadedPort>,
}

impl InputPort {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            ..Default::default()
        }
    }

    /// Name SPL code uses to refer to this port: the alias, else the first
    /// connected stream.
    pub fn port_ref(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .or_else(|| self.connections.first().map(String::as_str))
    }
}

/// Parallel width: a literal channel count or a submission parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Width {
    Fixed(u64),
    Parameter(Parameter),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputPort {
    pub name: String,
    #[serde(rename = "type", default)]
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(rename = "type.native", default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Width>,
    #[serde(default)]
    pub partitioned: bool,
    /// Partitioning attributes of a `$Parallel$` output. Empty means the
    /// hash attribute added upstream.
    #[serde(rename = "partitionedKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub partitioned_keys: Vec<String>,
    /// Region input streams sent to every channel.
    #[serde(rename = "broadcastPorts", default, skip_serializing_if = "Vec::is_empty")]
    pub broadcast_ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub assigns: Parameters,
}

impl OutputPort {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            ..Default::default()
        }
    }
}
