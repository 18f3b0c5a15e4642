// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Topology graph preprocessing and SPL source generation.
//!
//! A graph document (JSON) is validated, rewritten by a fixed sequence of
//! preprocessing passes, split into composites and rendered as SPL:
//!
//! ```no_run
//! let json = std::fs::read_to_string("app.json")?;
//! let mut graph = splgen::Graph::from_json_str(&json)?;
//! let result = splgen::SplGenerator::new().generate(&mut graph)?;
//! std::fs::write("app.spl", &result.spl)?;
//! # Ok::<(), splgen::SplError>(())
//! ```

pub mod core;

pub use core::{
    BuildStatus, BuildStatusSource, GeneratePhase, GenerateResult, Graph, GraphDocument, Operator,
    OperatorId, Result, SplError, SplGenerator, VirtualMarker, generate_spl, wait_for_build,
};
