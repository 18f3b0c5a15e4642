// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod error;
pub mod generator;
pub mod graph;
pub mod streams;

pub use error::{Result, SplError};
pub use generator::{GeneratePhase, GenerateResult, SplGenerator, generate_spl};
pub use graph::{Graph, GraphDocument, Operator, OperatorId, VirtualMarker};
pub use streams::{BuildStatus, BuildStatusSource, wait_for_build};
