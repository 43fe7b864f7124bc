// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the ingestion and query paths.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Service metrics, registered on a private registry.
pub struct Metrics {
    registry: Registry,
    /// Submissions admitted past rate limiting
    pub submissions_admitted: IntCounter,
    /// Submissions rejected by the rate limiter
    pub submissions_limited: IntCounter,
    /// Dashboard queries answered
    pub dashboard_queries: IntCounter,
    /// Worker completions applied
    pub completions_applied: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions_admitted = IntCounter::new(
            "mention_submissions_admitted_total",
            "Submissions admitted past rate limiting",
        )?;
        let submissions_limited = IntCounter::new(
            "mention_submissions_limited_total",
            "Submissions rejected by the rate limiter",
        )?;
        let dashboard_queries = IntCounter::new(
            "mention_dashboard_queries_total",
            "Dashboard queries answered",
        )?;
        let completions_applied = IntCounter::new(
            "mention_completions_applied_total",
            "Analysis worker completions applied",
        )?;

        registry.register(Box::new(submissions_admitted.clone()))?;
        registry.register(Box::new(submissions_limited.clone()))?;
        registry.register(Box::new(dashboard_queries.clone()))?;
        registry.register(Box::new(completions_applied.clone()))?;

        Ok(Self {
            registry,
            submissions_admitted,
            submissions_limited,
            dashboard_queries,
            completions_applied,
        })
    }

    /// Text exposition of all registered metrics.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_appear_in_exposition() {
        let metrics = Metrics::new().unwrap();
        metrics.submissions_admitted.inc();
        metrics.submissions_limited.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("mention_submissions_admitted_total 1"));
        assert!(text.contains("mention_submissions_limited_total 1"));
        assert!(text.contains("mention_dashboard_queries_total 0"));
    }
}
