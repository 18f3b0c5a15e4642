// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Graph preprocessing and SPL emission.
//!
//! A run goes through the phases of [`GeneratePhase`] in order: structural
//! validation and rewrites, placement tagging, composite separation, then
//! text emission.

mod autonomous_regions;
mod composite;
mod generate_phase;
mod generate_result;
pub mod literals;
mod operator_generator;
mod optimizer;
mod pe_placement;
mod preprocessor;
mod spl_generator;
pub mod submission_time_value;
mod threading_model;

pub use autonomous_regions::preprocess_autonomous_regions;
pub use composite::{
    Composite, CompositeMember, PARALLEL_COMPOSITE_PREFIX, PARALLEL_INPUT, PARALLEL_OUTPUT,
    channel_scoped_keys, separate_into_composites,
};
pub use generate_phase::GeneratePhase;
pub use generate_result::GenerateResult;
pub use operator_generator::{HostPool, HostPools, OperatorGenerator};
pub use optimizer::{OUTPUT_CONNECTIONS_PARAM, PASS_BY_REF_SCHEMA, is_python_functional, optimize};
pub use pe_placement::{
    ISOLATE_REGION_PREFIX, LOW_LATENCY_REGION_PREFIX, PePlacement, resolve_colocation_tags,
};
pub use preprocessor::{PreprocessStats, Preprocessor};
pub use spl_generator::{SplGenerator, generate_spl};
pub use submission_time_value::{ParamsInfo, SubmissionTimeValues};
pub use threading_model::{
    DEFAULT_CONGESTION_POLICY, DEFAULT_QUEUE_SIZE, QUEUE_SIZE_PARAM, preprocess_threaded_ports,
};
