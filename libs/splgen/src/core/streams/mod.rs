// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Surface shared with the streaming service client: remote build status and
//! polling.

mod build_status;

pub use build_status::{
    BuildStatus, BuildStatusSource, BuildWait, DEFAULT_POLL_INTERVAL, PollOptions, wait_for_build,
};
