// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SplError};

/// State of a remote application build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    Waiting,
    NotBuilt,
    Building,
    Built,
    Failed,
    Timeout,
    Canceled,
    Canceling,
    Unknown,
}

impl BuildStatus {
    pub const ALL: [BuildStatus; 9] = [
        BuildStatus::Waiting,
        BuildStatus::NotBuilt,
        BuildStatus::Building,
        BuildStatus::Built,
        BuildStatus::Failed,
        BuildStatus::Timeout,
        BuildStatus::Canceled,
        BuildStatus::Canceling,
        BuildStatus::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::NotBuilt => "notBuilt",
            Self::Building => "building",
            Self::Built => "built",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Canceled => "canceled",
            Self::Canceling => "canceling",
            Self::Unknown => "unknown",
        }
    }

    /// No further transitions are expected. Only `waiting`, `notBuilt` and
    /// `building` can still end up `built`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting | Self::NotBuilt | Self::Building)
    }

    pub fn is_success(self) -> bool {
        self == Self::Built
    }
}

impl FromStr for BuildStatus {
    type Err = SplError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| SplError::UnmappedType(format!("build status '{}'", s)))
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can report the status of a submitted build.
pub trait BuildStatusSource {
    fn build_status(&mut self, build_id: &str) -> Result<BuildStatus>;
}

impl<F> BuildStatusSource for F
where
    F: FnMut(&str) -> Result<BuildStatus>,
{
    fn build_status(&mut self, build_id: &str) -> Result<BuildStatus> {
        self(build_id)
    }
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    /// Give up once this much time has passed without a terminal status.
    pub timeout: Duration,
}

impl PollOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }
}

/// Result of waiting on a build.
#[derive(Debug, Clone)]
pub struct BuildWait {
    /// Terminal status reached.
    pub status: BuildStatus,
    pub polls: usize,
    pub elapsed: Duration,
    /// Time observed in each non-terminal state.
    pub time_in_state: HashMap<BuildStatus, Duration>,
}

/// Poll `source` until the build reaches a terminal status.
///
/// Fails with [`SplError::BuildTimeout`] once `options.timeout` has passed.
/// A terminal status other than `built` is returned, not treated as an
/// error.
pub fn wait_for_build<S: BuildStatusSource + ?Sized>(
    source: &mut S,
    build_id: &str,
    options: PollOptions,
) -> Result<BuildWait> {
    let start = Instant::now();
    let mut last_check = start;
    let mut time_in_state: HashMap<BuildStatus, Duration> = HashMap::new();
    let mut polls = 0;

    loop {
        let status = source.build_status(build_id)?;
        polls += 1;
        let now = Instant::now();

        if status.is_terminal() {
            if status.is_success() {
                tracing::info!("Build {} finished after {} polls", build_id, polls);
            } else {
                tracing::warn!("Build {} ended with status {}", build_id, status);
            }
            return Ok(BuildWait {
                status,
                polls,
                elapsed: now - start,
                time_in_state,
            });
        }

        *time_in_state.entry(status).or_default() += now - last_check;
        last_check = now;

        if now - start >= options.timeout {
            return Err(SplError::BuildTimeout(format!(
                "build {} still {} after {:?}",
                build_id, status, options.timeout
            )));
        }
        tracing::debug!("Build {} is {}, polling again", build_id, status);
        thread::sleep(options.interval);
    }
}
