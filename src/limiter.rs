// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tiered fixed-window rate limiter gating submission ingestion.
//!
//! Every user/tier pair is checked against two windows at once:
//! 1. Per-minute window (60 s)
//! 2. Per-hour window (3600 s)
//!
//! Both counters count attempts, admitted or not, so a client probing at
//! the threshold keeps consuming its own budget.

use crate::config::{RateLimitConfig, TierLimits};
use crate::store::{KeyValueStore, StoreError};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const MINUTE_WINDOW: Duration = Duration::from_secs(60);
const HOUR_WINDOW: Duration = Duration::from_secs(3600);

/// Service tier controlling admission thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Standard,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized tier name. Callers reject this at the boundary; the
/// limiter itself never falls back to a default tier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown tier: {0:?}")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests across both windows (whichever is tighter)
        remaining: u32,
        /// Time until the minute window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the minute window resets; the minute window is the
        /// binding constraint for client backoff
        retry_after: Duration,
    },
}

/// Dual-window, per-tier admission control.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn KeyValueStore>,
}

impl RateLimiter {
    /// Create a new rate limiter over the given store.
    pub fn new(config: RateLimitConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self { config, store }
    }

    fn limits_for(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Free => self.config.free,
            Tier::Standard => self.config.standard,
            Tier::Premium => self.config.premium,
        }
    }

    /// Count one attempt against both windows and decide admission.
    ///
    /// Store failure propagates; it is an infrastructure fault, not a
    /// limit decision.
    pub async fn check_and_increment(
        &self,
        user_id: &str,
        tier: Tier,
    ) -> Result<RateLimitResult, StoreError> {
        let limits = self.limits_for(tier);

        let minute_key = counter_key(user_id, tier, "minute");
        let hour_key = counter_key(user_id, tier, "hour");

        // Attempts are counted before the verdict, Limited or not.
        let minute = self.store.incr_with_expiry(&minute_key, MINUTE_WINDOW).await?;
        let hour = self.store.incr_with_expiry(&hour_key, HOUR_WINDOW).await?;

        if minute.count > u64::from(limits.per_minute) || hour.count > u64::from(limits.per_hour) {
            debug!(
                user_id,
                tier = %tier,
                minute_count = minute.count,
                hour_count = hour.count,
                retry_after = ?minute.ttl,
                "Rate limit exceeded"
            );
            return Ok(RateLimitResult::Limited {
                retry_after: minute.ttl,
            });
        }

        let minute_remaining = u64::from(limits.per_minute) - minute.count;
        let hour_remaining = u64::from(limits.per_hour) - hour.count;
        let remaining = minute_remaining.min(hour_remaining) as u32;

        debug!(user_id, tier = %tier, remaining, "Request allowed");
        Ok(RateLimitResult::Allowed {
            remaining,
            reset_in: minute.ttl,
        })
    }
}

fn counter_key(user_id: &str, tier: Tier, window: &str) -> String {
    format!("rate_limit:{user_id}:{}:{window}", tier.as_str())
}
