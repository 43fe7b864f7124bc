// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission records and the per-user time-ordered index.
//!
//! A submission is written at ingestion time, possibly as a placeholder,
//! and later completed in place by the content analysis worker. The index
//! entry is written once at ingestion and never moved. Records are never
//! deleted here; retention is an external concern.

use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle state of a submission record.
///
/// `Pending` means the analysis-derived fields are placeholders. The only
/// transitions are Pending→Complete and the idempotent Complete→Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Pending,
    Complete,
}

/// A stored mention submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: String,
    /// Source platform tag, set at ingestion and never overwritten
    pub platform: String,
    /// Raw content; may be absent until analysis completes
    pub content: Option<String>,
    /// Extracted hashtags, empty until analyzed
    pub hashtags: Vec<String>,
    /// Polarity in [-1.0, 1.0]; 0.0 until analyzed
    pub sentiment_score: f64,
    /// Epoch seconds; also the index score
    pub created_at: i64,
    pub state: SubmissionState,
}

/// Ingestion-time fields for a new submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub platform: String,
    pub content: Option<String>,
    pub created_at: i64,
    /// Present when the gateway received a pre-analyzed submission
    pub hashtags: Option<Vec<String>>,
    pub sentiment_score: Option<f64>,
}

/// Analysis output applied by the content analysis worker.
#[derive(Debug, Clone)]
pub struct CompletionFields {
    pub hashtags: Vec<String>,
    pub sentiment_score: f64,
    pub content: Option<String>,
}

/// Submission store failure.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submission not found: {0}")]
    NotFound(Uuid),

    #[error("corrupt record for submission {id}: {source}")]
    Corrupt {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable submission records plus the per-user ordered index.
#[derive(Clone)]
pub struct SubmissionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SubmissionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Append a submission for `user_id` under a fresh id.
    ///
    /// The record is written before its index entry, so a range scan never
    /// yields an id whose record is missing for longer than the gap
    /// between the two writes; `get` during that gap still sees the
    /// placeholder once the record write lands.
    pub async fn append(
        &self,
        user_id: &str,
        new: NewSubmission,
    ) -> Result<Submission, SubmissionError> {
        let id = Uuid::new_v4();
        let state = if new.hashtags.is_some() || new.sentiment_score.is_some() {
            SubmissionState::Complete
        } else {
            SubmissionState::Pending
        };
        let submission = Submission {
            id,
            user_id: user_id.to_string(),
            platform: new.platform,
            content: new.content,
            hashtags: new.hashtags.unwrap_or_default(),
            sentiment_score: new.sentiment_score.unwrap_or(0.0),
            created_at: new.created_at,
            state,
        };

        self.put(&submission).await?;
        self.store
            .index_insert(&index_key(user_id), submission.created_at, &id.to_string())
            .await?;

        debug!(
            submission_id = %id,
            user_id,
            platform = %submission.platform,
            state = ?submission.state,
            "Submission appended"
        );
        Ok(submission)
    }

    /// Fetch a submission by id. Placeholder records are returned as-is.
    pub async fn get(&self, id: Uuid) -> Result<Option<Submission>, SubmissionError> {
        let bytes = match self.store.get(&record_key(id)).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let submission =
            serde_json::from_slice(&bytes).map_err(|source| SubmissionError::Corrupt { id, source })?;
        Ok(Some(submission))
    }

    /// Ids of `user_id`'s submissions with `start_ts <= created_at <=
    /// end_ts`, ascending by timestamp, insertion order within ties.
    pub async fn range_by_user(
        &self,
        user_id: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let members = self
            .store
            .index_range(&index_key(user_id), start_ts, end_ts)
            .await?;
        Ok(members
            .iter()
            .filter_map(|member| Uuid::parse_str(member).ok())
            .collect())
    }

    /// Apply analysis output to a submission.
    ///
    /// Overwrites only the analysis-derived fields; platform and
    /// created_at are untouched. Safe to apply repeatedly: re-applying the
    /// same payload is a no-op, and a different payload (reprocessing)
    /// simply overwrites the previous analysis.
    pub async fn complete(
        &self,
        id: Uuid,
        fields: CompletionFields,
    ) -> Result<Submission, SubmissionError> {
        let mut submission = self.get(id).await?.ok_or(SubmissionError::NotFound(id))?;

        submission.hashtags = fields.hashtags;
        submission.sentiment_score = fields.sentiment_score;
        submission.content = fields.content;
        submission.state = SubmissionState::Complete;

        self.put(&submission).await?;
        debug!(submission_id = %id, "Submission completed");
        Ok(submission)
    }

    async fn put(&self, submission: &Submission) -> Result<(), SubmissionError> {
        let bytes = serde_json::to_vec(submission).map_err(|source| SubmissionError::Corrupt {
            id: submission.id,
            source,
        })?;
        self.store.set(&record_key(submission.id), bytes).await?;
        Ok(())
    }
}

fn record_key(id: Uuid) -> String {
    format!("submission:{id}")
}

fn index_key(user_id: &str) -> String {
    format!("user:{user_id}:submissions")
}
