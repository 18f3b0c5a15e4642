// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::error::Result;
use crate::core::graph::{Graph, VirtualMarker, remove_operators};

/// Flag the operators fed by each `$Autonomous$` marker, then splice the
/// markers out. Returns the number of markers removed.
pub fn preprocess_autonomous_regions(graph: &mut Graph) -> Result<usize> {
    let markers = graph.find_by_kind(VirtualMarker::Autonomous);
    for &marker in &markers {
        for child in graph.downstream(marker) {
            let op = &mut graph[child];
            if !op.autonomous {
                tracing::debug!("Marking '{}' autonomous", op.name);
                op.autonomous = true;
            }
        }
    }
    remove_operators(graph, &markers)?;
    Ok(markers.len())
}
