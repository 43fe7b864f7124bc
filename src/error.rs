// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for the HTTP surface.
//!
//! `RateLimited` is an expected outcome carrying backoff guidance, not an
//! exceptional failure. Infrastructure faults surface as 503 and are
//! never swallowed. No variant triggers an automatic retry; retry policy
//! belongs to the caller.

use crate::aggregator::AggregateError;
use crate::store::StoreError;
use crate::submissions::SubmissionError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// API-level error, mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any shared state was touched
    #[error("{0}")]
    Validation(String),

    /// Admission denied; retry after the indicated delay
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("{0}")]
    NotFound(String),

    /// Store unreachable or record undecodable; fatal to this call
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Infrastructure(err.to_string())
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::NotFound(id) => Self::NotFound(format!("submission not found: {id}")),
            SubmissionError::Corrupt { .. } => Self::Infrastructure(err.to_string()),
            SubmissionError::Store(e) => e.into(),
        }
    }
}

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::InvalidRange { .. } => Self::Validation(err.to_string()),
            AggregateError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message,
                    code: "VALIDATION_FAILED",
                    retry_after_secs: None,
                }),
            )
                .into_response(),
            Self::RateLimited { retry_after } => {
                // Clamp sub-second remainders up so clients never see 0.
                let retry_secs = retry_after.as_secs().max(1);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_secs.to_string())],
                    Json(ErrorResponse {
                        error: "Rate limit exceeded. Please try again later.".to_string(),
                        code: "RATE_LIMITED",
                        retry_after_secs: Some(retry_secs),
                    }),
                )
                    .into_response()
            }
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: message,
                    code: "NOT_FOUND",
                    retry_after_secs: None,
                }),
            )
                .into_response(),
            Self::Infrastructure(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: message,
                    code: "STORE_UNAVAILABLE",
                    retry_after_secs: None,
                }),
            )
                .into_response(),
        }
    }
}
