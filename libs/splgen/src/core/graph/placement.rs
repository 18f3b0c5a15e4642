// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

/// PE placement hints of one operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(
        rename = "isolateRegion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub isolate_region_id: Option<String>,

    #[serde(
        rename = "lowLatencyRegion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub low_latency_region_id: Option<String>,

    /// User supplied colocation tag.
    #[serde(
        rename = "explicitColocate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub colocation_tag: Option<String>,

    /// Colocation key chosen by the preprocessor, see [`Placement::effective_colocation`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colocate_key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_tags: Vec<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Placement {
    pub fn isolate_region(&self) -> Option<&str> {
        non_empty(&self.isolate_region_id)
    }

    pub fn low_latency_region(&self) -> Option<&str> {
        non_empty(&self.low_latency_region_id)
    }

    /// Tag isolate region, first tag wins. Returns whether the tag was applied.
    pub fn tag_isolate_region(&mut self, id: &str) -> bool {
        if self.isolate_region().is_some() {
            return false;
        }
        self.isolate_region_id = Some(id.to_string());
        true
    }

    /// Tag low latency region, first tag wins. Returns whether the tag was applied.
    pub fn tag_low_latency_region(&mut self, id: &str) -> bool {
        if self.low_latency_region().is_some() {
            return false;
        }
        self.low_latency_region_id = Some(id.to_string());
        true
    }

    /// Colocation key: explicit tag, else low latency region, else isolate region.
    pub fn effective_colocation(&self) -> Option<&str> {
        non_empty(&self.colocation_tag)
            .or_else(|| self.low_latency_region())
            .or_else(|| self.isolate_region())
    }

    pub fn is_empty(&self) -> bool {
        *self == Placement::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_wins() {
        let mut p = Placement::default();
        assert!(p.tag_isolate_region("__jaa_isolateId0"));
        assert!(!p.tag_isolate_region("__jaa_isolateId1"));
        assert_eq!(p.isolate_region(), Some("__jaa_isolateId0"));
    }

    #[test]
    fn test_empty_tag_counts_as_unset() {
        let mut p = Placement {
            isolate_region_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(p.isolate_region(), None);
        assert!(p.tag_isolate_region("a"));
    }

    #[test]
    fn test_colocation_precedence() {
        let mut p = Placement::default();
        assert_eq!(p.effective_colocation(), None);
        p.tag_isolate_region("iso");
        assert_eq!(p.effective_colocation(), Some("iso"));
        p.tag_low_latency_region("LowLatencyRegion0");
        assert_eq!(p.effective_colocation(), Some("LowLatencyRegion0"));
        p.colocation_tag = Some("user".into());
        assert_eq!(p.effective_colocation(), Some("user"));
    }
}
