// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mention Analytics
//!
//! This crate accepts mention submissions (social-media content
//! references) behind tiered, per-user admission control and answers
//! windowed analytics queries over a user's accumulated submissions:
//!
//! - Dual fixed-window rate limiting (per-minute and per-hour, per tier)
//! - Submission records with a per-user time-ordered index
//! - Dashboard aggregation: mention count, hashtag ranking, mean sentiment
//! - A completion interface for the asynchronous content analysis worker
//!
//! Shared state lives behind the [`store::KeyValueStore`] capability, so
//! the in-memory store can stand in for the real backend in tests.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod store;
pub mod submissions;

pub use aggregator::{DashboardAggregator, DashboardQuery, DashboardReport};
pub use config::Config;
pub use error::ApiError;
pub use limiter::{RateLimitResult, RateLimiter, Tier};
pub use store::{KeyValueStore, MemoryStore};
pub use submissions::{Submission, SubmissionState, SubmissionStore};
