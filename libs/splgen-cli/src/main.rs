// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! splgen CLI
//!
//! Reads a topology graph JSON file and writes the generated SPL source.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use splgen::{Graph, SplGenerator};

#[derive(Parser)]
#[command(name = "splgen")]
#[command(author, version, about = "Generate SPL source from a topology graph", long_about = None)]
struct Cli {
    /// Topology graph document (JSON)
    #[arg(value_name = "GRAPH_JSON")]
    input: PathBuf,

    /// SPL file to write
    #[arg(value_name = "SPL_FILE")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read graph {}", cli.input.display()))?;
    let mut graph = Graph::from_json_str(&json)
        .with_context(|| format!("Failed to parse graph {}", cli.input.display()))?;
    tracing::info!("Loaded graph '{}' with {} operators", graph.name, graph.len());

    let result = SplGenerator::new()
        .generate(&mut graph)
        .with_context(|| format!("Failed to generate SPL for '{}'", graph.name))?;

    fs::write(&cli.output, &result.spl)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    tracing::info!("Wrote {}: {}", cli.output.display(), result);
    Ok(())
}
