// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Topology graph model.
//!
//! Operators live in a petgraph arena addressed by [`OperatorId`]; port
//! `connections` remain the source of truth for edges.

#[allow(clippy::module_inception)]
mod graph;
mod marker;
mod operator;
mod parameter;
mod placement;
pub(crate) mod port;
mod splice;
#[cfg(test)]
pub(crate) mod test_support;
mod traversal;
mod validation;
mod window;

pub use graph::{Checkpoint, Graph, GraphConfig, GraphDocument, OperatorId};
pub use marker::VirtualMarker;
pub use operator::{
    Consistent, LANGUAGE_JAVA, MODEL_FUNCTIONAL, Operator, OperatorConfig, QueueConfig, Threading,
    ViewConfig,
};
pub use parameter::{
    MetaType, Parameter, Parameters, SubmissionParameter, TYPE_ATTRIBUTE, TYPE_ENUM,
    TYPE_SPL_EXPRESSION, TYPE_SPL_TYPE, TYPE_SPL_VALUE, TYPE_SUBMISSION_PARAMETER,
};
pub use placement::Placement;
pub use port::{InputPort, OutputPort, ThreadedPort, Width};
pub use splice::{add_before, add_between, remove_operator, remove_operators};
pub use traversal::{Direction, VisitController, visit_once};
pub use validation::validate;
pub use window::{TimeUnit, Window, WindowPolicy, WindowType};
