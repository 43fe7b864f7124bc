// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the mention analytics service.
//!
//! The gateway-facing surface: submission ingestion (rate limited),
//! dashboard queries, and the internal completion endpoint the content
//! analysis worker calls. All request validation happens here, before any
//! shared state is touched.

use crate::aggregator::{DashboardAggregator, DashboardQuery, DashboardReport};
use crate::config::Config;
use crate::error::ApiError;
use crate::limiter::{RateLimitResult, RateLimiter, Tier};
use crate::metrics::Metrics;
use crate::submissions::{CompletionFields, NewSubmission, SubmissionState, SubmissionStore};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub submissions: SubmissionStore,
    pub aggregator: DashboardAggregator,
    pub metrics: Metrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Submission ingestion request body. User identity and tier travel in
/// the `X-User-ID` / `X-User-Tier` headers.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// RFC 3339; defaults to now
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Present only for pre-analyzed submissions
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

/// Submission ingestion response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub submission_id: Uuid,
}

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    /// RFC 3339; defaults to the epoch
    #[serde(default)]
    pub start_time: Option<String>,
    /// RFC 3339; defaults to now
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Analysis worker completion request.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub submission_id: Uuid,
    pub hashtags: Vec<String>,
    pub sentiment_score: f64,
    #[serde(default)]
    pub content: Option<String>,
}

/// Analysis worker completion response.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub submission_id: Uuid,
    pub state: SubmissionState,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mention-analytics",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ingest a mention submission, subject to tiered rate limiting.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let user_id = required_header(&headers, "x-user-id", "X-User-ID")?;
    let tier_raw = required_header(&headers, "x-user-tier", "X-User-Tier")?;
    // Unknown tiers are rejected here; the limiter never sees them and
    // never falls back to free-tier thresholds.
    let tier: Tier = tier_raw
        .parse()
        .map_err(|e: crate::limiter::UnknownTier| {
            warn!(user_id = %user_id, tier = %tier_raw, "Rejecting unknown tier");
            ApiError::Validation(e.to_string())
        })?;

    let platform = match req.platform.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return Err(ApiError::Validation("missing platform field".to_string())),
    };
    if let Some(score) = req.sentiment_score {
        validate_sentiment(score)?;
    }
    let created_at = match req.timestamp.as_deref() {
        Some(raw) => parse_rfc3339(raw)?,
        None => chrono::Utc::now().timestamp(),
    };

    match state.limiter.check_and_increment(&user_id, tier).await? {
        RateLimitResult::Limited { retry_after } => {
            state.metrics.submissions_limited.inc();
            info!(
                user_id = %user_id,
                tier = %tier,
                retry_after_secs = retry_after.as_secs(),
                "Submission rate limited"
            );
            Err(ApiError::RateLimited { retry_after })
        }
        RateLimitResult::Allowed { remaining, .. } => {
            let submission = state
                .submissions
                .append(
                    &user_id,
                    NewSubmission {
                        platform,
                        content: req.content,
                        created_at,
                        hashtags: req.hashtags,
                        sentiment_score: req.sentiment_score,
                    },
                )
                .await?;
            state.metrics.submissions_admitted.inc();
            debug!(
                user_id = %user_id,
                submission_id = %submission.id,
                remaining,
                "Submission accepted"
            );
            Ok(Json(SubmitResponse {
                status: "Data received successfully",
                submission_id: submission.id,
            }))
        }
    }
}

/// Answer a windowed dashboard query for one user.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardReport>, ApiError> {
    let user_id = match params.user_id.as_deref().map(str::trim) {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => {
            return Err(ApiError::Validation(
                "missing user_id query parameter".to_string(),
            ))
        }
    };
    let start_ts = params.start_time.as_deref().map(parse_rfc3339).transpose()?;
    let end_ts = params.end_time.as_deref().map(parse_rfc3339).transpose()?;

    let report = state
        .aggregator
        .query(&DashboardQuery {
            user_id,
            platform: params.platform,
            start_ts,
            end_ts,
        })
        .await?;
    state.metrics.dashboard_queries.inc();
    Ok(Json(report))
}

/// Apply analysis output from the content worker. Idempotent.
pub async fn complete_submission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, ApiError> {
    validate_sentiment(req.sentiment_score)?;

    let submission = state
        .submissions
        .complete(
            req.submission_id,
            CompletionFields {
                hashtags: req.hashtags,
                sentiment_score: req.sentiment_score,
                content: req.content,
            },
        )
        .await?;
    state.metrics.completions_applied.inc();
    Ok(Json(CompleteResponse {
        submission_id: submission.id,
        state: submission.state,
    }))
}

/// Prometheus text exposition.
pub async fn metrics_text(State(state): State<Arc<AppState>>) -> Response {
    if !state.config.metrics.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn required_header(headers: &HeaderMap, name: &str, display: &str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation(format!("missing {display} header")))
}

fn validate_sentiment(score: f64) -> Result<(), ApiError> {
    if (-1.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "sentiment_score {score} outside [-1.0, 1.0]"
        )))
    }
}

fn parse_rfc3339(raw: &str) -> Result<i64, ApiError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .map_err(|_| {
            ApiError::Validation(format!(
                "invalid time {raw:?}: expected RFC 3339, e.g. 2026-01-02T03:04:05Z"
            ))
        })
}
