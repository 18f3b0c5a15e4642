// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! SPL text of a single operator invocation.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::core::error::{Result, SplError};
use crate::core::graph::{
    Consistent, GraphConfig, InputPort, Operator, Parameter, TimeUnit, ViewConfig, Width,
    Window, WindowPolicy, WindowType,
};

use super::composite::HASH_ATTRIBUTE;
use super::literals::{
    java_double, parameter_value, spl_basename, spl_compatible_name, string_literal,
    untyped_literal,
};
use super::submission_time_value::SubmissionTimeValues;

pub const HOST_POOL_PREFIX: &str = "__jaaHostPool";
pub const VM_ARG_PARAM: &str = "vmArg";
const CHANNEL_SUFFIX: &str = "+'$'+((rstring)getChannel())";

/// A host pool declared in the main composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPool {
    pub name: String,
    pub tags: BTreeSet<String>,
}

/// Host pools keyed by their tag set, numbered in first-use order.
#[derive(Debug, Clone, Default)]
pub struct HostPools {
    pools: Vec<HostPool>,
}

impl HostPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the pool for `tags`, creating it on first use.
    pub fn pool_for(&mut self, tags: BTreeSet<String>) -> &str {
        let index = match self.pools.iter().position(|p| p.tags == tags) {
            Some(index) => index,
            None => {
                let name = format!("{}{}", HOST_POOL_PREFIX, self.pools.len());
                tracing::debug!("New host pool {} for tags {:?}", name, tags);
                self.pools.push(HostPool { name, tags });
                self.pools.len() - 1
            }
        };
        &self.pools[index].name
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostPool> {
        self.pools.iter()
    }
}

/// Emits operator invocations for one generation run.
pub struct OperatorGenerator<'a> {
    config: &'a GraphConfig,
    stv: &'a SubmissionTimeValues,
    /// Colocation keys scoped to a single parallel channel.
    channel_scoped: &'a HashSet<String>,
    host_pools: &'a mut HostPools,
}

impl<'a> OperatorGenerator<'a> {
    pub fn new(
        config: &'a GraphConfig,
        stv: &'a SubmissionTimeValues,
        channel_scoped: &'a HashSet<String>,
        host_pools: &'a mut HostPools,
    ) -> Self {
        Self {
            config,
            stv,
            channel_scoped,
            host_pools,
        }
    }

    /// Full invocation block, annotations through the closing brace.
    pub fn generate(&mut self, op: &Operator) -> Result<String> {
        let mut code = String::new();
        note_annotations(op, &mut code)?;
        category_annotation(op, &mut code);
        parallel_annotation(op, &mut code)?;
        if op.low_latency {
            code.push_str("@threading(model=manual)\n");
        }
        view_annotations(op, &mut code);
        if let Some(consistent) = &op.consistent {
            consistent_annotation(consistent, &mut code);
        }
        if op.autonomous {
            code.push_str("@autonomous\n");
        }
        if let Some(threading) = &op.threading {
            code.push_str(&format!("@threading(model={})\n", threading.model));
        }

        output_clause(op, &mut code);
        operator_name_kind(op, &mut code);
        input_clause(op, &mut code);

        code.push_str("  {\n");
        window_clause(op, &mut code)?;
        self.param_clause(op, &mut code)?;
        output_assign_clause(op, &mut code)?;
        self.config_clause(op, &mut code);
        code.push_str("  }\n");
        Ok(code)
    }

    fn param_clause(&self, op: &Operator, code: &mut String) -> Result<()> {
        let mut vm_args: Option<Vec<Value>> = if op.is_java() && !self.config.vm_args.is_empty()
        {
            Some(self.vm_args())
        } else {
            None
        };
        let params_info = if op.is_functional() {
            self.stv.params_info()
        } else {
            None
        };

        if op.parameters.is_empty() && vm_args.is_none() && params_info.is_none() {
            return Ok(());
        }

        code.push_str("    param\n");
        for (name, param) in op.parameters.iter() {
            if name == VM_ARG_PARAM {
                if let Parameter::Literal(value) = param {
                    let mut merged = match value {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    };
                    if op.is_java() {
                        merged.extend(self.vm_args());
                    }
                    vm_args = Some(merged);
                    continue;
                }
            }
            code.push_str(&format!("      {}: {};\n", name, parameter_value(param)?));
        }
        if let Some(args) = vm_args {
            code.push_str(&format!(
                "      {}: {};\n",
                VM_ARG_PARAM,
                untyped_literal(&Value::Array(args))?
            ));
        }
        if let Some(info) = params_info {
            code.push_str(&format!("      submissionParamNames: {};\n", info.names));
            code.push_str(&format!("      submissionParamValues: {};\n", info.values));
        }
        Ok(())
    }

    fn vm_args(&self) -> Vec<Value> {
        self.config
            .vm_args
            .iter()
            .map(|a| Value::String(a.clone()))
            .collect()
    }

    fn config_clause(&mut self, op: &Operator, code: &mut String) {
        let mut config = String::new();
        if let Some(viewable) = op.config.stream_viewability {
            config.push_str(&format!("    streamViewability: {};\n", viewable));
        }
        if let Some(queue) = &op.config.queue {
            config.push_str(&format!(
                "    threadedPort: queue({}, {},{});\n",
                queue.input_port_name, queue.congestion_policy, queue.queue_size
            ));
        }

        let placement = op.placement();
        let mut directives = String::new();
        if let Some(key) = &placement.colocate_key {
            let scope = if self.channel_scoped.contains(key) {
                CHANNEL_SUFFIX
            } else {
                ""
            };
            directives.push_str(&format!(
                "      partitionColocation({}{})\n",
                string_literal(key),
                scope
            ));
        }
        let tags: BTreeSet<String> = placement
            .resource_tags
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();
        if !tags.is_empty() {
            if !directives.is_empty() {
                directives.push(',');
            }
            let pool = self.host_pools.pool_for(tags);
            directives.push_str(&format!("      host({})\n", pool));
        }
        if !directives.is_empty() {
            config.push_str("   placement: ");
            config.push_str(&directives);
            config.push_str("    ;\n");
        }

        if !config.is_empty() {
            code.push_str("  config\n");
            code.push_str(&config);
        }
    }
}

fn note_annotations(op: &Operator, code: &mut String) -> Result<()> {
    if let Some(layout) = &op.layout {
        code.push_str(&format!(
            "@spl_note(id=\"__spl_layout\", text={})\n",
            string_literal(&serde_json::to_string(&spl_layout(op, layout))?)
        ));
    }
    let locations = match op.source_locations.as_slice() {
        [] => None,
        [single] => Some(serde_json::to_string(single)?),
        many => Some(serde_json::to_string(many)?),
    };
    if let Some(text) = locations {
        code.push_str(&format!(
            "@spl_note(id=\"__spl_sourcelocation\", text={})\n",
            string_literal(&text)
        ));
    }
    for (i, output) in op.outputs.iter().enumerate() {
        let Some(native) = output.native_type.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        code.push_str(&format!(
            "@spl_note(id=\"__spl_nativeType_output_{}\", text={})\n",
            i,
            string_literal(native)
        ));
    }
    Ok(())
}

/// Layout with a `names` entry mapping each escaped SPL identifier the
/// operator introduces back to its original name.
fn spl_layout(op: &Operator, layout: &Map<String, Value>) -> Value {
    let mut layout = layout.clone();
    let mut map_name = |name: &str| {
        let id = spl_compatible_name(name);
        if id == name {
            return;
        }
        let entry = layout
            .entry("names")
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(names) = entry {
            let original = names
                .remove(name)
                .unwrap_or_else(|| Value::String(name.to_string()));
            names.insert(id, original);
        }
    };

    map_name(&op.name);
    for output in &op.outputs {
        map_name(&output.name);
    }
    for input in &op.inputs {
        if let Some(name) = input.port_ref() {
            map_name(name);
        }
    }
    Value::Object(layout)
}

fn category_annotation(op: &Operator, code: &mut String) {
    if let Some(category) = op.category.as_deref().filter(|c| !c.is_empty()) {
        code.push_str(&format!("@spl_category(name={})\n", string_literal(category)));
    }
}

fn parallel_annotation(op: &Operator, code: &mut String) -> Result<()> {
    if !op.parallel_operator {
        return Ok(());
    }
    let width = match &op.width {
        Some(Width::Fixed(n)) => n.to_string(),
        Some(Width::Parameter(param)) => parameter_value(param)?,
        None => {
            return Err(SplError::InvalidGraph(format!(
                "parallel operator '{}' has no width",
                op.name
            )));
        }
    };
    code.push_str(&format!("@parallel(width={}", width));
    if op.partitioned {
        let port = op.parallel_input_port_name.as_deref().ok_or_else(|| {
            SplError::InvalidGraph(format!(
                "partitioned parallel operator '{}' has no hashed input port",
                op.name
            ))
        })?;
        let attributes = if op.partitioned_keys.is_empty() {
            HASH_ATTRIBUTE.to_string()
        } else {
            op.partitioned_keys.join(", ")
        };
        code.push_str(&format!(
            ", partitionBy=[{{port={}, attributes=[{}]}}]",
            spl_basename(port),
            attributes
        ));
    }
    if !op.broadcast_ports.is_empty() {
        let ports: Vec<String> = op.broadcast_ports.iter().map(|p| spl_basename(p)).collect();
        code.push_str(&format!(", broadcast=[{}]", ports.join(", ")));
    }
    code.push_str(")\n");
    Ok(())
}

fn view_annotations(op: &Operator, code: &mut String) {
    for view in &op.config.view_configs {
        code.push_str(&view_annotation(view));
    }
}

fn view_annotation(view: &ViewConfig) -> String {
    let mut code = format!("@view(name = {}", string_literal(&view.name));
    if let Some(description) = &view.description {
        code.push_str(&format!(", description = {}", string_literal(description)));
    }
    code.push_str(&format!(
        ", port = {}, bufferTime = {}, sampleSize = {}",
        view.port,
        java_double(view.buffer_time),
        view.sample_size
    ));
    if let Some(activate) = &view.activate_option {
        code.push_str(&format!(", activateOption = {}", activate));
    }
    code.push_str(")\n");
    code
}

fn consistent_annotation(consistent: &Consistent, code: &mut String) {
    code.push_str("@consistent(");
    match consistent.period {
        Some(period) => code.push_str(&format!(
            "trigger=periodic,period={},",
            java_double(period)
        )),
        None => code.push_str("trigger=operatorDriven,"),
    }
    code.push_str(&format!(
        "drainTimeout={},resetTimeout={},maxConsecutiveResetAttempts={})\n",
        java_double(consistent.drain_timeout),
        java_double(consistent.reset_timeout),
        java_double(consistent.max_consecutive_reset_attempts)
    ));
}

/// `stream<T>` from a `tuple<T>` schema.
fn stream_type(schema: &str) -> String {
    let inner = schema
        .strip_prefix("tuple<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(schema);
    format!("stream<{}>", inner)
}

/// A single output named after its operator is written bare; anything else
/// uses the parenthesised list and an `as` alias.
fn uses_bare_output(op: &Operator) -> bool {
    matches!(op.outputs.as_slice(), [only] if only.name == op.name)
}

fn output_clause(op: &Operator, code: &mut String) {
    let bare = uses_bare_output(op);
    if !bare {
        code.push_str("  ( ");
    }
    let streams: Vec<String> = op
        .outputs
        .iter()
        .map(|o| format!("{} {}", stream_type(&o.schema), spl_basename(&o.name)))
        .collect();
    code.push_str(&streams.join("; "));
    if !bare {
        code.push_str(") ");
    }
}

fn operator_name_kind(op: &Operator, code: &mut String) {
    if !uses_bare_output(op) {
        code.push_str(&format!("as {}", spl_compatible_name(&op.name)));
    }
    code.push_str(&format!(" = {}", op.kind));
}

fn input_port(port: &InputPort) -> String {
    let streams: Vec<String> = port.connections.iter().map(|c| spl_basename(c)).collect();
    let mut text = streams.join(", ");
    if let Some(alias) = &port.alias {
        text.push_str(&format!(" as {}", spl_compatible_name(alias)));
    }
    text
}

fn input_clause(op: &Operator, code: &mut String) {
    let ports: Vec<String> = op.inputs.iter().map(input_port).collect();
    code.push_str(&format!("  ( {})\n", ports.join("; ")));
}

fn window_clause(op: &Operator, code: &mut String) -> Result<()> {
    let mut first = true;
    for port in &op.inputs {
        let Some(window) = &port.window else { continue };
        let kind = match window.window_type {
            WindowType::NotWindowed => continue,
            WindowType::Sliding => "sliding",
            WindowType::Tumbling => "tumbling",
        };
        if first {
            code.push_str("  window\n");
            first = false;
        }
        let port_ref = port.port_ref().unwrap_or(port.name.as_str());
        code.push_str(&format!(
            "    {}:{},{}",
            spl_basename(port_ref),
            kind,
            evict_policy(op, window)?
        ));
        if let Some(trigger) = trigger_policy(op, window)? {
            code.push_str(&format!(", {}", trigger));
        }
        if window.partitioned {
            code.push_str(", partitioned");
        }
        code.push_str(";\n");
    }
    Ok(())
}

fn evict_policy(op: &Operator, window: &Window) -> Result<String> {
    let policy = window.evict_policy.ok_or_else(|| {
        SplError::UnmappedType(format!("window on '{}' has no eviction policy", op.name))
    })?;
    match policy {
        WindowPolicy::Delta | WindowPolicy::None => Err(SplError::UnmappedType(format!(
            "window eviction policy {:?} on '{}'",
            policy, op.name
        ))),
        _ => policy_text(
            op,
            policy,
            window.evict_config.as_ref(),
            window.evict_time_unit,
        ),
    }
}

fn trigger_policy(op: &Operator, window: &Window) -> Result<Option<String>> {
    match window.trigger_policy {
        None | Some(WindowPolicy::None) => Ok(None),
        Some(WindowPolicy::Delta) => Err(SplError::UnmappedType(format!(
            "window trigger policy Delta on '{}'",
            op.name
        ))),
        Some(policy) => policy_text(
            op,
            policy,
            window.trigger_config.as_ref(),
            window.trigger_time_unit,
        )
        .map(Some),
    }
}

fn policy_text(
    op: &Operator,
    policy: WindowPolicy,
    config: Option<&Value>,
    unit: Option<TimeUnit>,
) -> Result<String> {
    let amount = || {
        config.and_then(Value::as_i64).ok_or_else(|| {
            SplError::UnmappedType(format!(
                "window {:?} policy on '{}' needs an integer size",
                policy, op.name
            ))
        })
    };
    match policy {
        WindowPolicy::Count => Ok(format!("count({})", amount()?)),
        WindowPolicy::Time => {
            let unit = unit.ok_or_else(|| {
                SplError::UnmappedType(format!(
                    "time window policy on '{}' has no time unit",
                    op.name
                ))
            })?;
            Ok(format!("time({})", java_double(unit.to_seconds(amount()?))))
        }
        WindowPolicy::Punctuation => Ok("punct()".to_string()),
        WindowPolicy::Delta | WindowPolicy::None => Err(SplError::UnmappedType(format!(
            "window policy {:?} on '{}'",
            policy, op.name
        ))),
    }
}

fn output_assign_clause(op: &Operator, code: &mut String) -> Result<()> {
    let mut assigns = String::new();
    for output in op.outputs.iter().filter(|o| !o.assigns.is_empty()) {
        let mut lines = Vec::with_capacity(output.assigns.len());
        for (attr, value) in output.assigns.iter() {
            lines.push(format!("  {}={}", attr, parameter_value(value)?));
        }
        assigns.push_str(&format!(
            "{}:\n{};\n",
            spl_basename(&output.name),
            lines.join(",\n")
        ));
    }
    if !assigns.is_empty() {
        code.push_str(" output\n");
        code.push_str(&assigns);
    }
    Ok(())
}

/// Checkpoint period literal in seconds.
pub fn checkpoint_period(period: i64, unit: TimeUnit) -> String {
    java_double(unit.to_millis(period) as f64 / 1000.0)
}
