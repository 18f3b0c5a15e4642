// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Graph to SPL source generation.

use std::collections::HashSet;

use crate::core::error::Result;
use crate::core::graph::{Graph, VirtualMarker};

use super::composite::{
    Composite, CompositeMember, channel_scoped_keys, separate_into_composites,
};
use super::generate_phase::GeneratePhase;
use super::generate_result::GenerateResult;
use super::literals::{spl_basename, spl_compatible_name, string_literal};
use super::operator_generator::{HostPools, OperatorGenerator, checkpoint_period};
use super::pe_placement::PePlacement;
use super::preprocessor::Preprocessor;
use super::submission_time_value::{SubmissionTimeValues, inner_def, main_def};

/// A generation session.
///
/// Region and parallel-composite counters live here and keep counting across
/// calls to [`SplGenerator::generate`], so ids are never reused within one
/// session. Use one session per thread.
#[derive(Debug, Default)]
pub struct SplGenerator {
    placement: PePlacement,
    parallel_composites: usize,
}

impl SplGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preprocess `graph` in place and render it as SPL.
    ///
    /// Any failure aborts the whole run; no partial source is returned.
    pub fn generate(&mut self, graph: &mut Graph) -> Result<GenerateResult> {
        let stv = SubmissionTimeValues::from_graph(graph)?;
        let stats = Preprocessor::new(graph, &mut self.placement).preprocess()?;

        let parallel_markers = graph.find_by_kind(VirtualMarker::Parallel).len()
            + graph.find_by_kind(VirtualMarker::EndParallel).len();
        let composites = separate_into_composites(graph, &stv, &mut self.parallel_composites)?;
        let channel_scoped = channel_scoped_keys(graph, &composites);
        tracing::info!(
            "[{}] {} composites, {} channel scoped colocation keys",
            GeneratePhase::SeparateComposites,
            composites.len(),
            channel_scoped.len()
        );

        let mut host_pools = HostPools::new();
        let mut spl = String::new();
        if let Some(namespace) = graph.namespace.as_deref().filter(|n| !n.is_empty()) {
            spl.push_str(&format!("namespace {};\n", namespace));
        }

        let mut operators_emitted = 0;
        for composite in &composites {
            let mut emitter = CompositeEmitter {
                graph,
                stv: &stv,
                channel_scoped: &channel_scoped,
                host_pools: &mut host_pools,
            };
            spl.push_str(&emitter.emit(composite)?);
            operators_emitted += composite.members.len();
        }

        let result = GenerateResult {
            spl,
            composites: composites.len(),
            operators_emitted,
            markers_removed: stats.markers_removed + parallel_markers,
            host_pools: host_pools.len(),
        };
        tracing::info!("[{}] {}", GeneratePhase::Emit, result);
        Ok(result)
    }
}

/// Generate SPL for `graph` with a fresh session.
pub fn generate_spl(graph: &mut Graph) -> Result<String> {
    Ok(SplGenerator::new().generate(graph)?.spl)
}

struct CompositeEmitter<'a> {
    graph: &'a Graph,
    stv: &'a SubmissionTimeValues,
    channel_scoped: &'a HashSet<String>,
    host_pools: &'a mut HostPools,
}

impl CompositeEmitter<'_> {
    fn emit(&mut self, composite: &Composite) -> Result<String> {
        let mut code = String::new();
        if composite.public {
            code.push_str("public ");
        }
        code.push_str(&format!("composite {}", spl_compatible_name(&composite.name)));
        if composite.is_parallel() {
            if let Some(input) = &composite.input_name {
                code.push_str(&format!("(input {}", spl_basename(input)));
                if let Some(output) = &composite.output_name {
                    code.push_str(&format!("; output {}", spl_basename(output)));
                }
                code.push(')');
            }
        }
        code.push_str("\n{\n");

        if !composite.parameters.is_empty() {
            code.push_str("param\n");
            for sp in &composite.parameters {
                let def = if composite.main {
                    main_def(sp)?
                } else {
                    inner_def(sp)?
                };
                code.push_str(&format!("  {};\n", def));
            }
        }

        code.push_str("graph\n");
        let mut operators = OperatorGenerator::new(
            &self.graph.config,
            self.stv,
            self.channel_scoped,
            self.host_pools,
        );
        for member in &composite.members {
            let op = match member {
                CompositeMember::Node(id) => &self.graph[*id],
                CompositeMember::Reference { op, .. } => op,
            };
            code.push_str(&operators.generate(op)?);
            code.push('\n');
        }

        if composite.main {
            self.main_config(&mut code);
        }
        code.push_str("}\n");
        Ok(code)
    }

    fn main_config(&self, code: &mut String) {
        let checkpoint = self.graph.config.checkpoint.as_ref();
        if self.host_pools.is_empty() && checkpoint.is_none() {
            return;
        }
        code.push_str("  config\n");
        if !self.host_pools.is_empty() {
            code.push_str("    hostPool:\n");
            let pools: Vec<String> = self
                .host_pools
                .iter()
                .map(|pool| {
                    let tags: Vec<String> = pool.tags.iter().map(|t| string_literal(t)).collect();
                    format!(
                        "    {}=createPool({{tags=[{}]}}, Sys.Shared)",
                        pool.name,
                        tags.join(",")
                    )
                })
                .collect();
            code.push_str(&pools.join(","));
            code.push_str(";\n");
        }
        if let Some(checkpoint) = checkpoint {
            code.push_str(&format!(
                "    checkpoint: periodic({});\n",
                checkpoint_period(checkpoint.period, checkpoint.unit)
            ));
        }
    }
}
