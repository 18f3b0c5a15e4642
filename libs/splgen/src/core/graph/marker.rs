// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

/// Virtual operator kinds inserted by the topology builder.
///
/// Markers never reach the generated SPL: they are consumed by the
/// preprocessing passes (region tagging, splicing) or turned into composite
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualMarker {
    Isolate,
    Parallel,
    EndParallel,
    Union,
    Pending,
    LowLatency,
    EndLowLatency,
    Autonomous,
}

impl VirtualMarker {
    pub const ALL: [VirtualMarker; 8] = [
        VirtualMarker::Isolate,
        VirtualMarker::Parallel,
        VirtualMarker::EndParallel,
        VirtualMarker::Union,
        VirtualMarker::Pending,
        VirtualMarker::LowLatency,
        VirtualMarker::EndLowLatency,
        VirtualMarker::Autonomous,
    ];

    /// Operator kind string carried in the graph document.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Isolate => "$Isolate$",
            Self::Parallel => "$Parallel$",
            Self::EndParallel => "$EndParallel$",
            Self::Union => "$Union$",
            Self::Pending => "$Pending$",
            Self::LowLatency => "$LowLatency$",
            Self::EndLowLatency => "$EndLowLatency$",
            Self::Autonomous => "$Autonomous$",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.kind() == kind)
    }
}

impl fmt::Display for VirtualMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup_is_exhaustive() {
        for marker in VirtualMarker::ALL {
            assert_eq!(VirtualMarker::from_kind(marker.kind()), Some(marker));
        }
    }

    #[test]
    fn test_regular_kinds_are_not_markers() {
        assert_eq!(VirtualMarker::from_kind("spl.relational::Filter"), None);
        assert_eq!(VirtualMarker::from_kind("$Isolate"), None);
        assert_eq!(VirtualMarker::from_kind(""), None);
    }
}
