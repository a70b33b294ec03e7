// SCB MCP - Statistics Sweden Model Context Protocol bridge
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-window call governor for the upstream quota.
//!
//! The statistics API allows a fixed number of calls per time window and
//! answers 429 beyond it. Every outbound call is admitted here first so the
//! quota is never knowingly exceeded.

use crate::error::{ScbError, ScbResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Calls per window used until the upstream configuration is known.
pub const DEFAULT_MAX_CALLS: u32 = 30;

/// Window length in seconds used until the upstream configuration is known.
pub const DEFAULT_WINDOW_SECS: u64 = 10;

/// Mutable window state.
///
/// Invariant: `request_count <= max_calls_per_window`, except right after a
/// [`RateGovernor::reconfigure`] that lowered the maximum.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    window_start: Instant,
    request_count: u32,
    max_calls_per_window: u32,
    window: Duration,
}

impl RateLimitState {
    /// Fresh state whose window starts now.
    pub fn new(max_calls_per_window: u32, window_secs: u64) -> Self {
        Self::starting_at(max_calls_per_window, window_secs, Instant::now())
    }

    /// Fresh state whose window starts at `start`. Zero limits are raised
    /// to one.
    pub fn starting_at(max_calls_per_window: u32, window_secs: u64, start: Instant) -> Self {
        Self {
            window_start: start,
            request_count: 0,
            max_calls_per_window: max_calls_per_window.max(1),
            window: Duration::from_secs(window_secs.max(1)),
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_start) >= self.window {
            self.window_start = now;
            self.request_count = 0;
        }
    }

    fn reset_in_seconds(&self, now: Instant) -> u64 {
        let left = self
            .window
            .saturating_sub(now.saturating_duration_since(self.window_start));
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    fn remaining(&self) -> u32 {
        self.max_calls_per_window.saturating_sub(self.request_count)
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS, DEFAULT_WINDOW_SECS)
    }
}

/// Result of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub allowed: bool,
    /// Calls left in the current window after this one.
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

/// Read-only usage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub request_count: u32,
    pub max_calls_per_window: u32,
    pub remaining: u32,
    pub window_duration_seconds: u64,
    pub reset_in_seconds: u64,
}

/// Shared fixed-window governor.
///
/// The check-and-increment happens under one lock, so concurrent callers
/// can never be admitted past the maximum.
///
/// # Examples
///
/// ```
/// use scb_core::rate::{RateGovernor, RateLimitState};
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let governor = RateGovernor::new(RateLimitState::starting_at(2, 10, start));
///
/// assert!(governor.admit_at(start).allowed);
/// assert!(governor.admit_at(start).allowed);
/// assert!(!governor.admit_at(start).allowed);
///
/// // A new window starts once the old one has elapsed.
/// let later = start + Duration::from_secs(10);
/// assert_eq!(governor.admit_at(later).remaining, 1);
/// ```
#[derive(Debug, Default)]
pub struct RateGovernor {
    state: Mutex<RateLimitState>,
}

impl RateGovernor {
    pub fn new(state: RateLimitState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Governor with the fallback quota of 30 calls per 10 seconds.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Count one call against the quota if there is room.
    pub fn admit(&self) -> Admission {
        self.admit_at(Instant::now())
    }

    /// [`RateGovernor::admit`] with an explicit clock reading.
    pub fn admit_at(&self, now: Instant) -> Admission {
        let mut state = self.state.lock();
        state.roll(now);

        if state.request_count < state.max_calls_per_window {
            state.request_count += 1;
            Admission {
                allowed: true,
                remaining: state.remaining(),
                reset_in_seconds: state.reset_in_seconds(now),
            }
        } else {
            let reset_in_seconds = state.reset_in_seconds(now);
            warn!(
                "Rate limit reached: {} calls in {}s window, resets in {}s",
                state.request_count,
                state.window.as_secs(),
                reset_in_seconds
            );
            Admission {
                allowed: false,
                remaining: 0,
                reset_in_seconds,
            }
        }
    }

    /// Admit a call or fail with `RateLimitExceeded`.
    pub fn try_admit(&self) -> ScbResult<Admission> {
        let admission = self.admit();
        if admission.allowed {
            Ok(admission)
        } else {
            Err(ScbError::RateLimitExceeded {
                message: format!(
                    "Call quota for the statistics API is used up; try again in {} seconds",
                    admission.reset_in_seconds
                ),
                reset_in_seconds: admission.reset_in_seconds,
                upstream: None,
            })
        }
    }

    /// Current usage. Applies window expiry but counts nothing.
    pub fn snapshot(&self) -> UsageSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> UsageSnapshot {
        let mut state = self.state.lock();
        state.roll(now);
        UsageSnapshot {
            request_count: state.request_count,
            max_calls_per_window: state.max_calls_per_window,
            remaining: state.remaining(),
            window_duration_seconds: state.window.as_secs(),
            reset_in_seconds: state.reset_in_seconds(now),
        }
    }

    /// Apply a new quota. The current count and window start are kept.
    pub fn reconfigure(&self, max_calls_per_window: u32, window_secs: u64) {
        let mut state = self.state.lock();
        state.max_calls_per_window = max_calls_per_window.max(1);
        state.window = Duration::from_secs(window_secs.max(1));
        debug!(
            "Rate governor set to {} calls per {}s",
            state.max_calls_per_window,
            state.window.as_secs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_admits_up_to_max_then_denies() {
        let start = Instant::now();
        let governor = RateGovernor::new(RateLimitState::starting_at(3, 10, start));

        let remaining: Vec<u32> = (0..3).map(|_| governor.admit_at(start).remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let denied = governor.admit_at(start + Duration::from_secs(4));
        assert!(!denied.allowed);
        assert_eq!(denied.reset_in_seconds, 6);
    }

    #[test]
    fn test_window_reset() {
        let start = Instant::now();
        let governor = RateGovernor::new(RateLimitState::starting_at(2, 10, start));
        governor.admit_at(start);
        governor.admit_at(start);
        assert!(!governor.admit_at(start + Duration::from_millis(9_999)).allowed);

        let after = governor.admit_at(start + Duration::from_secs(10));
        assert!(after.allowed);
        assert_eq!(after.remaining, 1);
        assert_eq!(after.reset_in_seconds, 10);
    }

    #[test]
    fn test_reset_rounds_up() {
        let start = Instant::now();
        let governor = RateGovernor::new(RateLimitState::starting_at(1, 10, start));
        let admission = governor.admit_at(start + Duration::from_millis(500));
        assert_eq!(admission.reset_in_seconds, 10);
    }

    #[test]
    fn test_snapshot_does_not_count() {
        let start = Instant::now();
        let governor = RateGovernor::new(RateLimitState::starting_at(5, 10, start));
        governor.admit_at(start);

        let snap = governor.snapshot_at(start);
        assert_eq!(snap.request_count, 1);
        assert_eq!(snap.remaining, 4);
        assert_eq!(governor.snapshot_at(start).request_count, 1);

        let expired = governor.snapshot_at(start + Duration::from_secs(11));
        assert_eq!(expired.request_count, 0);
    }

    #[test]
    fn test_reconfigure_keeps_count() {
        let start = Instant::now();
        let governor = RateGovernor::new(RateLimitState::starting_at(5, 10, start));
        governor.admit_at(start);
        governor.admit_at(start);
        governor.reconfigure(2, 60);

        assert!(!governor.admit_at(start).allowed);
        let snap = governor.snapshot_at(start + Duration::from_secs(30));
        assert_eq!(snap.window_duration_seconds, 60);
        assert_eq!(snap.request_count, 2);
    }

    #[test]
    fn test_zero_limits_are_clamped() {
        let governor = RateGovernor::new(RateLimitState::new(0, 0));
        let snap = governor.snapshot();
        assert_eq!(snap.max_calls_per_window, 1);
        assert_eq!(snap.window_duration_seconds, 1);
    }

    #[test]
    fn test_try_admit_error() {
        let governor = RateGovernor::new(RateLimitState::new(1, 60));
        assert!(governor.try_admit().is_ok());
        let err = governor.try_admit().unwrap_err();
        match err {
            ScbError::RateLimitExceeded {
                reset_in_seconds,
                upstream,
                ..
            } => {
                assert!(reset_in_seconds > 0 && reset_in_seconds <= 60);
                assert!(upstream.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_admissions_never_exceed_max() {
        let governor = Arc::new(RateGovernor::new(RateLimitState::new(50, 3600)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&governor);
                thread::spawn(move || (0..20).filter(|_| g.admit().allowed).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
