// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the mention analytics service.
//!
//! Tier thresholds default to the product admission policy:
//! free 10/min 100/hr, standard 50/min 500/hr, premium 200/min 2000/hr.

use serde::{Deserialize, Serialize};

/// Configuration for the mention analytics service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Admission thresholds for one tier: a dual fixed window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierLimits {
    /// Maximum attempts per 60-second window
    pub per_minute: u32,
    /// Maximum attempts per 3600-second window
    pub per_hour: u32,
}

/// Per-tier rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Free tier thresholds (default: 10/min, 100/hr)
    #[serde(default = "default_free_limits")]
    pub free: TierLimits,

    /// Standard tier thresholds (default: 50/min, 500/hr)
    #[serde(default = "default_standard_limits")]
    pub standard: TierLimits,

    /// Premium tier thresholds (default: 200/min, 2000/hr)
    #[serde(default = "default_premium_limits")]
    pub premium: TierLimits,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_free_limits() -> TierLimits {
    TierLimits {
        per_minute: 10,
        per_hour: 100,
    }
}

fn default_standard_limits() -> TierLimits {
    TierLimits {
        per_minute: 50,
        per_hour: 500,
    }
}

fn default_premium_limits() -> TierLimits {
    TierLimits {
        per_minute: 200,
        per_hour: 2000,
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            free: default_free_limits(),
            standard: default_standard_limits(),
            premium: default_premium_limits(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}
