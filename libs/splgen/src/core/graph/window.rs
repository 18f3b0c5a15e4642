// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowType {
    Sliding,
    Tumbling,
    NotWindowed,
}

/// Eviction or trigger policy of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowPolicy {
    Count,
    Time,
    Delta,
    Punctuation,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Convert `amount` of this unit to (fractional) seconds.
    ///
    /// Whole-second units convert with integer arithmetic first, sub-second
    /// units divide in floating point.
    pub fn to_seconds(self, amount: i64) -> f64 {
        match self {
            Self::Days => amount.saturating_mul(86_400) as f64,
            Self::Hours => amount.saturating_mul(3_600) as f64,
            Self::Minutes => amount.saturating_mul(60) as f64,
            Self::Seconds => amount as f64,
            Self::Milliseconds => amount as f64 / 1_000.0,
            Self::Microseconds => amount as f64 / 1_000_000.0,
            Self::Nanoseconds => amount as f64 / 1_000_000_000.0,
        }
    }

    /// Convert `amount` of this unit to whole milliseconds (truncating).
    pub fn to_millis(self, amount: i64) -> i64 {
        match self {
            Self::Days => amount.saturating_mul(86_400_000),
            Self::Hours => amount.saturating_mul(3_600_000),
            Self::Minutes => amount.saturating_mul(60_000),
            Self::Seconds => amount.saturating_mul(1_000),
            Self::Milliseconds => amount,
            Self::Microseconds => amount / 1_000,
            Self::Nanoseconds => amount / 1_000_000,
        }
    }
}

/// Window attached to an input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    #[serde(rename = "type")]
    pub window_type: WindowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evict_policy: Option<WindowPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evict_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evict_time_unit: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_policy: Option<WindowPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_time_unit: Option<TimeUnit>,
    #[serde(default)]
    pub partitioned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_unit_seconds() {
        assert_eq!(TimeUnit::Days.to_seconds(2), 172_800.0);
        assert_eq!(TimeUnit::Minutes.to_seconds(3), 180.0);
        assert_eq!(TimeUnit::Milliseconds.to_seconds(1500), 1.5);
        assert_eq!(TimeUnit::Microseconds.to_seconds(250), 0.00025);
        assert_eq!(TimeUnit::Nanoseconds.to_seconds(1_000_000_000), 1.0);
    }

    #[test]
    fn test_time_unit_millis() {
        assert_eq!(TimeUnit::Seconds.to_millis(5), 5_000);
        assert_eq!(TimeUnit::Microseconds.to_millis(1_999), 1);
    }

    #[test]
    fn test_window_document() {
        let w: Window = serde_json::from_value(json!({
            "type": "SLIDING",
            "evictPolicy": "TIME",
            "evictConfig": 10,
            "evictTimeUnit": "SECONDS",
            "triggerPolicy": "COUNT",
            "triggerConfig": 1
        }))
        .unwrap();
        assert_eq!(w.window_type, WindowType::Sliding);
        assert_eq!(w.evict_policy, Some(WindowPolicy::Time));
        assert_eq!(w.evict_time_unit, Some(TimeUnit::Seconds));
        assert_eq!(w.trigger_policy, Some(WindowPolicy::Count));
        assert!(!w.partitioned);
    }

    #[test]
    fn test_unknown_window_type_rejected() {
        let err = serde_json::from_value::<Window>(json!({"type": "HOPPING"}));
        assert!(err.is_err());
    }
}
