// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Windowed aggregation over a user's submissions.
//!
//! One linear scan of the user's time range answers all three dashboard
//! figures: mention count, hashtag ranking, and mean sentiment. Missing
//! records are skipped, not errors; an in-flight ingestion is a transient
//! artifact rather than corruption. There is no per-platform secondary
//! index, so the scan cost is the range size regardless of filter
//! selectivity.

use crate::store::StoreError;
use crate::submissions::{SubmissionError, SubmissionStore};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Dashboard query parameters, validated at the boundary.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub user_id: String,
    /// Retain only submissions from this platform
    pub platform: Option<String>,
    /// Epoch seconds; 0 when absent
    pub start_ts: Option<i64>,
    /// Epoch seconds; now when absent
    pub end_ts: Option<i64>,
}

/// Aggregated dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub mentions_count: u64,
    /// Distinct tags, descending frequency, first-seen order on ties
    pub top_hashtags: Vec<String>,
    /// Mean sentiment of retained records; 0.0 when none
    pub sentiment_score: f64,
}

/// Aggregation failure.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-only analytics over the submission store.
#[derive(Clone)]
pub struct DashboardAggregator {
    submissions: SubmissionStore,
}

impl DashboardAggregator {
    pub fn new(submissions: SubmissionStore) -> Self {
        Self { submissions }
    }

    /// Answer a dashboard query.
    ///
    /// The range is validated before the store is touched; an invalid
    /// range yields no partial result. The scan tolerates racing appends
    /// and completions: it may count a pending placeholder, which is the
    /// accepted eventual-consistency tradeoff.
    pub async fn query(&self, query: &DashboardQuery) -> Result<DashboardReport, AggregateError> {
        let start_ts = query.start_ts.unwrap_or(0);
        let end_ts = query.end_ts.unwrap_or_else(|| chrono::Utc::now().timestamp());
        if start_ts > end_ts {
            return Err(AggregateError::InvalidRange {
                start: start_ts,
                end: end_ts,
            });
        }

        let ids = self
            .submissions
            .range_by_user(&query.user_id, start_ts, end_ts)
            .await?;
        let scanned = ids.len();

        let mut mentions_count = 0u64;
        let mut sentiment_total = 0.0f64;
        // Frequency per tag in first-seen order; positions index `counts`.
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, u64)> = Vec::new();

        for id in ids {
            let submission = match self.submissions.get(id).await {
                Ok(Some(submission)) => submission,
                Ok(None) => {
                    debug!(submission_id = %id, "Skipping missing record");
                    continue;
                }
                Err(SubmissionError::Corrupt { id, source }) => {
                    warn!(submission_id = %id, error = %source, "Skipping undecodable record");
                    continue;
                }
                Err(SubmissionError::Store(e)) => return Err(e.into()),
                Err(SubmissionError::NotFound(_)) => continue,
            };

            if let Some(platform) = &query.platform {
                if submission.platform != *platform {
                    continue;
                }
            }

            mentions_count += 1;
            sentiment_total += submission.sentiment_score;

            for tag in &submission.hashtags {
                if tag.is_empty() {
                    continue;
                }
                match positions.get(tag) {
                    Some(&at) => counts[at].1 += 1,
                    None => {
                        positions.insert(tag.clone(), counts.len());
                        counts.push((tag.clone(), 1));
                    }
                }
            }
        }

        // Stable sort: equal frequencies keep first-seen order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let top_hashtags = counts.into_iter().map(|(tag, _)| tag).collect();

        let sentiment_score = if mentions_count > 0 {
            sentiment_total / mentions_count as f64
        } else {
            0.0
        };

        debug!(
            user_id = %query.user_id,
            scanned,
            retained = mentions_count,
            "Dashboard query answered"
        );
        Ok(DashboardReport {
            mentions_count,
            top_hashtags,
            sentiment_score,
        })
    }
}
