// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the mention analytics core.

use std::sync::Arc;
use std::time::Duration;

use mention_analytics::{
    config::RateLimitConfig,
    submissions::{CompletionFields, NewSubmission},
    DashboardAggregator, DashboardQuery, MemoryStore, RateLimitResult, RateLimiter,
    SubmissionState, SubmissionStore, Tier,
};

struct Harness {
    limiter: RateLimiter,
    submissions: SubmissionStore,
    aggregator: DashboardAggregator,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::new(RateLimitConfig::default(), store.clone());
    let submissions = SubmissionStore::new(store);
    let aggregator = DashboardAggregator::new(submissions.clone());
    Harness {
        limiter,
        submissions,
        aggregator,
    }
}

fn mention(platform: &str, created_at: i64, hashtags: &[&str], sentiment: f64) -> NewSubmission {
    NewSubmission {
        platform: platform.to_string(),
        content: None,
        created_at,
        hashtags: Some(hashtags.iter().map(|t| t.to_string()).collect()),
        sentiment_score: Some(sentiment),
    }
}

fn all_time(user_id: &str) -> DashboardQuery {
    DashboardQuery {
        user_id: user_id.to_string(),
        platform: None,
        start_ts: Some(0),
        end_ts: Some(i64::MAX),
    }
}

#[tokio::test]
async fn test_free_tier_allows_ten_then_limits() {
    let h = harness();

    // Default free tier: 10 per minute. All ten go through.
    for i in 0..10 {
        let result = h.limiter.check_and_increment("u1", Tier::Free).await.unwrap();
        assert!(
            matches!(result, RateLimitResult::Allowed { .. }),
            "submission {} should be allowed",
            i + 1
        );
    }

    // The 11th is limited with backoff bounded by the minute window.
    match h.limiter.check_and_increment("u1", Tier::Free).await.unwrap() {
        RateLimitResult::Limited { retry_after } => {
            assert!(retry_after > Duration::ZERO);
            assert!(retry_after <= Duration::from_secs(60));
        }
        RateLimitResult::Allowed { .. } => panic!("11th submission should be limited"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_window_recovers_after_ttl() {
    let h = harness();

    for _ in 0..10 {
        h.limiter.check_and_increment("u1", Tier::Free).await.unwrap();
    }
    assert!(matches!(
        h.limiter.check_and_increment("u1", Tier::Free).await.unwrap(),
        RateLimitResult::Limited { .. }
    ));

    tokio::time::advance(Duration::from_secs(61)).await;

    assert!(matches!(
        h.limiter.check_and_increment("u1", Tier::Free).await.unwrap(),
        RateLimitResult::Allowed { .. }
    ));
}

#[tokio::test]
async fn test_ingest_then_query_full_flow() {
    let h = harness();

    for (ts, tags, score) in [(100, ["a", "b"], 0.2), (200, ["a", "b"], -0.4)] {
        match h.limiter.check_and_increment("u1", Tier::Standard).await.unwrap() {
            RateLimitResult::Allowed { .. } => {
                h.submissions
                    .append("u1", mention("mastodon", ts, &tags, score))
                    .await
                    .unwrap();
            }
            RateLimitResult::Limited { .. } => panic!("should not be limited"),
        }
    }

    let report = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert_eq!(report.mentions_count, 2);
    assert_eq!(report.top_hashtags, vec!["a", "b"]);
    assert!((report.sentiment_score - (-0.1)).abs() < 1e-9);
}

#[tokio::test]
async fn test_hashtag_ranking_with_distinct_counts() {
    let h = harness();

    // a appears twice, b three times.
    h.submissions
        .append("u1", mention("x", 1, &["a", "b"], 0.0))
        .await
        .unwrap();
    h.submissions
        .append("u1", mention("x", 2, &["a", "b"], 0.0))
        .await
        .unwrap();
    h.submissions
        .append("u1", mention("x", 3, &["b"], 0.0))
        .await
        .unwrap();

    let report = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert_eq!(report.top_hashtags, vec!["b", "a"]);
}

#[tokio::test]
async fn test_mean_sentiment_across_records() {
    let h = harness();

    for (ts, score) in [(1, 0.2), (2, -0.4), (3, 0.6)] {
        h.submissions
            .append("u1", mention("x", ts, &[], score))
            .await
            .unwrap();
    }

    let report = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert!((report.sentiment_score - 0.4 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_inverted_range_is_rejected() {
    let h = harness();
    h.submissions
        .append("u1", mention("x", 75, &["a"], 0.5))
        .await
        .unwrap();

    let result = h
        .aggregator
        .query(&DashboardQuery {
            user_id: "u1".to_string(),
            platform: None,
            start_ts: Some(100),
            end_ts: Some(50),
        })
        .await;
    assert!(result.is_err(), "inverted range must not return a partial result");
}

#[tokio::test]
async fn test_user_with_no_submissions() {
    let h = harness();

    let report = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert_eq!(report.mentions_count, 0);
    assert!(report.top_hashtags.is_empty());
    assert_eq!(report.sentiment_score, 0.0);
}

#[tokio::test]
async fn test_append_get_preserves_unanalyzed_fields() {
    let h = harness();

    let appended = h
        .submissions
        .append(
            "u1",
            NewSubmission {
                platform: "bluesky".to_string(),
                content: Some("big news #launch".to_string()),
                created_at: 1234,
                hashtags: None,
                sentiment_score: None,
            },
        )
        .await
        .unwrap();

    let fetched = h.submissions.get(appended.id).await.unwrap().unwrap();
    assert_eq!(fetched.platform, "bluesky");
    assert_eq!(fetched.content.as_deref(), Some("big news #launch"));
    assert_eq!(fetched.created_at, 1234);
    assert_eq!(fetched.state, SubmissionState::Pending);
}

#[tokio::test]
async fn test_worker_completion_visible_to_dashboard() {
    let h = harness();

    let appended = h
        .submissions
        .append(
            "u1",
            NewSubmission {
                platform: "x".to_string(),
                content: Some("loving this #rust #tokio".to_string()),
                created_at: 10,
                hashtags: None,
                sentiment_score: None,
            },
        )
        .await
        .unwrap();

    // Placeholder is counted with defaults until the worker lands.
    let before = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert_eq!(before.mentions_count, 1);
    assert!(before.top_hashtags.is_empty());

    let fields = CompletionFields {
        hashtags: vec!["rust".to_string(), "tokio".to_string()],
        sentiment_score: 0.9,
        content: Some("loving this #rust #tokio".to_string()),
    };
    h.submissions.complete(appended.id, fields.clone()).await.unwrap();
    // Re-applying the same completion is a no-op.
    let again = h.submissions.complete(appended.id, fields).await.unwrap();
    assert_eq!(again.state, SubmissionState::Complete);

    let after = h.aggregator.query(&all_time("u1")).await.unwrap();
    assert_eq!(after.mentions_count, 1);
    assert_eq!(after.top_hashtags, vec!["rust", "tokio"]);
    assert!((after.sentiment_score - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_repeated_query_is_stable() {
    let h = harness();

    h.submissions
        .append("u1", mention("x", 1, &["tie1", "tie2"], 0.1))
        .await
        .unwrap();
    h.submissions
        .append("u1", mention("x", 2, &["tie2", "tie1"], 0.3))
        .await
        .unwrap();

    let first = h.aggregator.query(&all_time("u1")).await.unwrap();
    for _ in 0..5 {
        let next = h.aggregator.query(&all_time("u1")).await.unwrap();
        assert_eq!(next, first);
    }
    // Tied frequencies stay in first-seen scan order.
    assert_eq!(first.top_hashtags, vec!["tie1", "tie2"]);
}

#[tokio::test]
async fn test_concurrent_ingestion_no_lost_counts() {
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::new(RateLimitConfig::default(), store.clone());
    let submissions = SubmissionStore::new(store);

    let mut handles = Vec::new();
    for i in 0..30 {
        let limiter = limiter.clone();
        let submissions = submissions.clone();
        handles.push(tokio::spawn(async move {
            match limiter.check_and_increment("u1", Tier::Premium).await.unwrap() {
                RateLimitResult::Allowed { .. } => {
                    submissions
                        .append("u1", mention("x", 500, &["burst"], 0.0))
                        .await
                        .unwrap();
                    true
                }
                RateLimitResult::Limited { .. } => {
                    panic!("premium tier should admit submission {i}")
                }
            }
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let ids = submissions.range_by_user("u1", 500, 500).await.unwrap();
    assert_eq!(ids.len(), 30);
}
