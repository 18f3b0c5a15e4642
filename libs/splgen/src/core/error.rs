// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplError {
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Unmapped type: {0}")]
    UnmappedType(String),

    #[error("Operator not found: {0}")]
    OperatorNotFound(String),

    #[error("Build did not finish: {0}")]
    BuildTimeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SplError>;
