// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mention Analytics Service
//!
//! Ingests mention submissions behind tiered rate limiting and serves
//! windowed dashboard analytics.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `FREE_RATE_PER_MINUTE` / `FREE_RATE_PER_HOUR`: Free tier thresholds
//!   (default: 10 / 100)
//! - `STANDARD_RATE_PER_MINUTE` / `STANDARD_RATE_PER_HOUR`: Standard tier
//!   thresholds (default: 50 / 500)
//! - `PREMIUM_RATE_PER_MINUTE` / `PREMIUM_RATE_PER_HOUR`: Premium tier
//!   thresholds (default: 200 / 2000)

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mention_analytics::{
    config::{Config, RateLimitConfig, TierLimits},
    handlers::{complete_submission, dashboard, health, metrics_text, submit, AppState},
    metrics::Metrics,
    DashboardAggregator, MemoryStore, RateLimiter, SubmissionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        free_per_minute = config.rate_limit.free.per_minute,
        standard_per_minute = config.rate_limit.standard.per_minute,
        premium_per_minute = config.rate_limit.premium.per_minute,
        "Starting mention analytics service"
    );

    // Create application state
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::new(config.rate_limit.clone(), store.clone());
    let submissions = SubmissionStore::new(store);
    let aggregator = DashboardAggregator::new(submissions.clone());
    let metrics = Metrics::new()?;

    let metrics_path = config.metrics.path.clone();
    let state = Arc::new(AppState {
        limiter,
        submissions,
        aggregator,
        metrics,
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/v1/analytics/submit", post(submit))
        .route("/api/v1/analytics/dashboard", get(dashboard))
        .route("/internal/complete", post(complete_submission))
        .route(&metrics_path, get(metrics_text))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        rate_limit: RateLimitConfig {
            free: TierLimits {
                per_minute: env_u32("FREE_RATE_PER_MINUTE", 10),
                per_hour: env_u32("FREE_RATE_PER_HOUR", 100),
            },
            standard: TierLimits {
                per_minute: env_u32("STANDARD_RATE_PER_MINUTE", 50),
                per_hour: env_u32("STANDARD_RATE_PER_HOUR", 500),
            },
            premium: TierLimits {
                per_minute: env_u32("PREMIUM_RATE_PER_MINUTE", 200),
                per_hour: env_u32("PREMIUM_RATE_PER_HOUR", 2000),
            },
        },
        ..Default::default()
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
