// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Splitting a preprocessed graph into the main composite and one
//! sub-composite per parallel region.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::error::{Result, SplError};
use crate::core::graph::{
    Graph, Operator, OperatorId, OutputPort, Parameter, SubmissionParameter, VirtualMarker,
    Width,
};

use super::submission_time_value::{SubmissionTimeValues, composite_param_name, reference};

pub const PARALLEL_COMPOSITE_PREFIX: &str = "__parallel_Composite_";
pub const PARALLEL_REFERENCE_PREFIX: &str = "paraComp_";
pub const PARALLEL_INPUT: &str = "parallelInput";
pub const PARALLEL_OUTPUT: &str = "parallelOutput";
pub const HASH_ATTRIBUTE: &str = "__spl_hash";

/// One operator invocation inside a composite.
#[derive(Debug, Clone)]
pub enum CompositeMember {
    /// Operator of the graph.
    Node(OperatorId),
    /// Invocation of the parallel composite at `composite` in the list
    /// returned by [`separate_into_composites`].
    Reference { op: Operator, composite: usize },
}

#[derive(Debug, Clone)]
pub struct Composite {
    pub name: String,
    pub public: bool,
    pub main: bool,
    /// Input stream name of a parallel composite.
    pub input_name: Option<String>,
    /// Output stream name of a parallel composite that rejoins the graph.
    pub output_name: Option<String>,
    pub members: Vec<CompositeMember>,
    /// Submission parameters declared by the composite.
    pub parameters: Vec<SubmissionParameter>,
}

impl Composite {
    fn main(graph: &Graph) -> Self {
        Self {
            name: graph.name.clone(),
            public: graph.public,
            main: true,
            input_name: None,
            output_name: None,
            members: Vec::new(),
            parameters: Vec::new(),
        }
    }

    fn parallel(index: usize) -> Self {
        Self {
            name: format!("{}{}", PARALLEL_COMPOSITE_PREFIX, index),
            public: false,
            main: false,
            input_name: None,
            output_name: None,
            members: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        !self.main
    }

    /// Graph operators placed directly in this composite.
    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.members.iter().filter_map(|m| match m {
            CompositeMember::Node(id) => Some(*id),
            CompositeMember::Reference { .. } => None,
        })
    }
}

/// Partition the graph into composites.
///
/// Inner composites precede the composites that invoke them, so the main
/// composite is always last. `parallel_count` numbers the parallel
/// composites and is shared across runs of one generator.
///
/// Stream names crossing a parallel boundary are rewritten in the graph:
/// inputs of a region's first operators read `parallelInput`, and the
/// output feeding `$EndParallel$` becomes `parallelOutput`.
pub fn separate_into_composites(
    graph: &mut Graph,
    stv: &SubmissionTimeValues,
    parallel_count: &mut usize,
) -> Result<Vec<Composite>> {
    let starts = graph.find_starts();
    let main = Composite::main(graph);
    let mut separator = Separator {
        graph,
        stv,
        parallel_count,
        composites: Vec::new(),
    };
    let (_, end) = separator.separate(starts, main)?;
    if let Some(end) = end {
        return Err(SplError::InvalidGraph(format!(
            "'{}' ends a parallel region that was never started",
            separator.graph[end].name
        )));
    }
    Ok(separator.composites)
}

struct Separator<'a> {
    graph: &'a mut Graph,
    stv: &'a SubmissionTimeValues,
    parallel_count: &'a mut usize,
    composites: Vec<Composite>,
}

impl Separator<'_> {
    /// Fill `comp` with everything reachable from `starts` up to the
    /// region's `$EndParallel$`, which is returned when found.
    fn separate(
        &mut self,
        starts: Vec<OperatorId>,
        mut comp: Composite,
    ) -> Result<(usize, Option<OperatorId>)> {
        let mut traversed: HashSet<OperatorId> = HashSet::new();
        let mut unvisited: VecDeque<OperatorId> = starts.into();
        let mut end = None;

        while let Some(op) = unvisited.pop_front() {
            if !traversed.insert(op) {
                continue;
            }
            match self.graph[op].marker() {
                Some(VirtualMarker::Parallel) => {
                    let member = self.parallel_region(op, &mut unvisited)?;
                    comp.members.push(member);
                }
                Some(VirtualMarker::EndParallel) => end = Some(op),
                _ => {
                    unvisited.extend(self.graph.downstream(op));
                    comp.members.push(CompositeMember::Node(op));
                }
            }
        }

        comp.parameters = self.composite_parameters(&comp);
        tracing::debug!(
            "Composite '{}': {} members, {} parameters",
            comp.name,
            comp.members.len(),
            comp.parameters.len()
        );
        self.composites.push(comp);
        Ok((self.composites.len() - 1, end))
    }

    fn parallel_region(
        &mut self,
        parallel: OperatorId,
        unvisited: &mut VecDeque<OperatorId>,
    ) -> Result<CompositeMember> {
        let index = *self.parallel_count;
        *self.parallel_count += 1;

        let marker = &self.graph[parallel];
        let output = marker.outputs.first().ok_or_else(|| {
            SplError::InvalidGraph(format!("'{}' has no output port", marker.name))
        })?;

        let mut invocation = Operator::new(
            format!("{}{}", PARALLEL_REFERENCE_PREFIX, index),
            format!("{}{}", PARALLEL_COMPOSITE_PREFIX, index),
        );
        invocation.inputs = marker.inputs.clone();
        invocation.parallel_operator = true;
        invocation.width = output.width.clone();
        invocation.broadcast_ports = output.broadcast_ports.clone();
        if output.partitioned {
            invocation.partitioned = true;
            invocation.partitioned_keys = output.partitioned_keys.clone();
            invocation.parallel_input_port_name = marker
                .inputs
                .iter()
                .rev()
                .find(|i| i.schema.contains(HASH_ATTRIBUTE))
                .map(|i| i.port_ref().unwrap_or(i.name.as_str()).to_string());
        }
        let region_input = output.name.clone();

        // Renamed before recursing so a nested region starting right here
        // copies the renamed stream. The adjacency index keeps the old names.
        let starts = self.graph.downstream(parallel);
        for &start in &starts {
            for input in self.graph[start].inputs.iter_mut() {
                for conn in input.connections.iter_mut() {
                    if *conn == region_input {
                        *conn = PARALLEL_INPUT.to_string();
                    }
                }
            }
        }

        let (sub, end) = self.separate(starts, Composite::parallel(index))?;
        self.composites[sub].input_name = Some(PARALLEL_INPUT.to_string());

        for sp in &self.composites[sub].parameters {
            invocation.parameters.insert(
                composite_param_name(&sp.name),
                Parameter::Expression(reference(&sp.name)),
            );
        }

        if let Some(end) = end {
            unvisited.extend(self.graph.downstream(end));
            invocation.outputs = self.graph[end].outputs.clone();
            self.composites[sub].output_name = Some(PARALLEL_OUTPUT.to_string());

            let end_input = self.graph[end].inputs.first().map(|i| i.name.clone());
            for parent in self.graph.upstream(end) {
                let parent_op = &mut self.graph[parent];
                if parent_op.is_hash_adder() {
                    if let (Some(schema), Some(out)) = (
                        parent_op.outputs.first().map(|o| o.schema.clone()),
                        invocation.outputs.first_mut(),
                    ) {
                        out.schema = schema;
                    }
                }
                let Some(end_input) = &end_input else { continue };
                rename_region_output(&mut parent_op.outputs, end_input);
            }
            // A nested region can end right here; its invocation holds a copy
            // of the inner end marker's outputs.
            if let Some(end_input) = &end_input {
                for member in self.composites[sub].members.iter_mut() {
                    if let CompositeMember::Reference { op, .. } = member {
                        rename_region_output(&mut op.outputs, end_input);
                    }
                }
            }
        }

        tracing::debug!(
            "Parallel region {} -> '{}'",
            index,
            self.composites[sub].name
        );
        Ok(CompositeMember::Reference {
            op: invocation,
            composite: sub,
        })
    }

    /// Submission parameters a composite must declare.
    ///
    /// The main composite declares all of them. An inner composite declares
    /// those its operators use, every one when it holds a functional
    /// operator, plus whatever its nested parallel composites need.
    fn composite_parameters(&self, comp: &Composite) -> Vec<SubmissionParameter> {
        if self.stv.is_empty() {
            return Vec::new();
        }
        if comp.main {
            return self.stv.all().to_vec();
        }

        let mut params: Vec<SubmissionParameter> = Vec::new();
        let mut add = |sp: &SubmissionParameter| {
            if !params.iter().any(|p| p.name == sp.name) {
                params.push(sp.clone());
            }
        };

        for member in &comp.members {
            let op = match member {
                CompositeMember::Node(id) => &self.graph[*id],
                CompositeMember::Reference { op, composite } => {
                    self.composites[*composite].parameters.iter().for_each(&mut add);
                    op
                }
            };
            if op.is_functional() {
                self.stv.all().iter().for_each(&mut add);
            }
            op.parameters
                .iter()
                .filter_map(|(_, p)| p.as_submission())
                .for_each(&mut add);
            op.outputs
                .iter()
                .flat_map(|o| o.assigns.iter())
                .filter_map(|(_, p)| p.as_submission())
                .for_each(&mut add);
            if let Some(Width::Parameter(Parameter::Submission(sp))) = &op.width {
                add(sp);
            }
        }
        params
    }
}

fn rename_region_output(outputs: &mut [OutputPort], end_input: &str) {
    for port in outputs.iter_mut() {
        if port.connections.iter().any(|c| c == end_input) {
            port.name = PARALLEL_OUTPUT.to_string();
        }
    }
}

#[derive(Debug, Default)]
struct ColocationUsage {
    main: bool,
    parallel: usize,
}

/// Colocation keys used inside exactly one parallel composite and nowhere
/// in the main composite. Such keys are scoped per parallel channel.
pub fn channel_scoped_keys(graph: &Graph, composites: &[Composite]) -> HashSet<String> {
    let mut usage: HashMap<&str, ColocationUsage> = HashMap::new();
    for comp in composites {
        let mut seen: HashSet<&str> = HashSet::new();
        for id in comp.operator_ids() {
            let Some(key) = graph[id].placement().colocate_key.as_deref() else {
                continue;
            };
            let entry = usage.entry(key).or_default();
            if comp.main {
                entry.main = true;
            } else if seen.insert(key) {
                entry.parallel += 1;
            }
        }
    }
    usage
        .into_iter()
        .filter(|(_, u)| !u.main && u.parallel < 2)
        .map(|(key, _)| key.to_string())
        .collect()
}
