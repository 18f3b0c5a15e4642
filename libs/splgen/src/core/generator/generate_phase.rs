// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

/// Step of the SPL generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratePhase {
    /// Phase 1: Structural checks.
    Validate,
    /// Phase 2: Move hash adders in front of their `$EndParallel$`.
    RelocateHashAdders,
    /// Phase 3: Isolation regions.
    TagIsolation,
    /// Phase 4: Low latency regions.
    TagLowLatency,
    /// Phase 5: Threaded port elision.
    ThreadedPorts,
    /// Phase 6: Splice out `$Union$` and `$Pending$`.
    RemoveMarkers,
    /// Phase 7: Autonomous regions.
    Autonomous,
    /// Phase 8: Pick each operator's colocation key.
    ResolveColocation,
    /// Phase 9: Parameter-only optimizations.
    Optimize,
    /// Phase 10: Split into main and parallel composites.
    SeparateComposites,
    /// Phase 11: Emit SPL text.
    Emit,
}

impl GeneratePhase {
    /// All phases in execution order.
    pub const ALL: [GeneratePhase; 11] = [
        GeneratePhase::Validate,
        GeneratePhase::RelocateHashAdders,
        GeneratePhase::TagIsolation,
        GeneratePhase::TagLowLatency,
        GeneratePhase::ThreadedPorts,
        GeneratePhase::RemoveMarkers,
        GeneratePhase::Autonomous,
        GeneratePhase::ResolveColocation,
        GeneratePhase::Optimize,
        GeneratePhase::SeparateComposites,
        GeneratePhase::Emit,
    ];

    pub fn next(self) -> Option<Self> {
        let pos = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(pos + 1).copied()
    }

    /// Phase number (1-11).
    pub fn number(self) -> u8 {
        match self {
            Self::Validate => 1,
            Self::RelocateHashAdders => 2,
            Self::TagIsolation => 3,
            Self::TagLowLatency => 4,
            Self::ThreadedPorts => 5,
            Self::RemoveMarkers => 6,
            Self::Autonomous => 7,
            Self::ResolveColocation => 8,
            Self::Optimize => 9,
            Self::SeparateComposites => 10,
            Self::Emit => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Validate => "VALIDATE",
            Self::RelocateHashAdders => "RELOCATE_HASH_ADDERS",
            Self::TagIsolation => "TAG_ISOLATION",
            Self::TagLowLatency => "TAG_LOW_LATENCY",
            Self::ThreadedPorts => "THREADED_PORTS",
            Self::RemoveMarkers => "REMOVE_MARKERS",
            Self::Autonomous => "AUTONOMOUS",
            Self::ResolveColocation => "RESOLVE_COLOCATION",
            Self::Optimize => "OPTIMIZE",
            Self::SeparateComposites => "SEPARATE_COMPOSITES",
            Self::Emit => "EMIT",
        }
    }

    /// Whether the phase belongs to graph preprocessing.
    pub fn is_preprocessing(self) -> bool {
        self.number() <= Self::Optimize.number()
    }
}

impl fmt::Display for GeneratePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.number(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering() {
        assert_eq!(GeneratePhase::Validate.next(), Some(GeneratePhase::RelocateHashAdders));
        assert_eq!(GeneratePhase::Optimize.next(), Some(GeneratePhase::SeparateComposites));
        assert_eq!(GeneratePhase::Emit.next(), None);
    }

    #[test]
    fn test_phase_numbers_follow_order() {
        for (i, phase) in GeneratePhase::ALL.iter().enumerate() {
            assert_eq!(phase.number() as usize, i + 1);
        }
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(GeneratePhase::Validate.to_string(), "Phase 1: VALIDATE");
        assert_eq!(GeneratePhase::Emit.to_string(), "Phase 11: EMIT");
        assert!(GeneratePhase::Optimize.is_preprocessing());
        assert!(!GeneratePhase::SeparateComposites.is_preprocessing());
    }
}
