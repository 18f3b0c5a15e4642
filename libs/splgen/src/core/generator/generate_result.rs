// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

/// Output of a successful generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateResult {
    /// Complete SPL source.
    pub spl: String,
    /// Composites emitted, main included.
    pub composites: usize,
    /// Operator invocations emitted across all composites.
    pub operators_emitted: usize,
    /// Virtual markers spliced out or folded into composites.
    pub markers_removed: usize,
    /// Host pools declared in the main composite.
    pub host_pools: usize,
}

impl GenerateResult {
    /// Number of parallel sub-composites.
    pub fn parallel_composites(&self) -> usize {
        self.composites.saturating_sub(1)
    }
}

impl fmt::Display for GenerateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GenerateResult {{ {} composites ({} parallel), {} operators, {} markers removed, {} host pools, {} bytes }}",
            self.composites,
            self.parallel_composites(),
            self.operators_emitted,
            self.markers_removed,
            self.host_pools,
            self.spl.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_summary() {
        let result = GenerateResult {
            spl: "composite A\n{\ngraph\n}\n".into(),
            composites: 2,
            operators_emitted: 5,
            markers_removed: 3,
            host_pools: 1,
        };
        assert_eq!(result.parallel_composites(), 1);
        let text = result.to_string();
        assert!(text.contains("2 composites (1 parallel)"));
        assert!(text.contains("5 operators"));
    }
}
