// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Key/value store capability used as the shared state substrate.
//!
//! The rate limiter and the submission store depend on this seam rather
//! than on a concrete client, so an in-memory store can stand in for the
//! real backend in tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Store-level failure. Fatal to the current call; never retried here.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Post-increment view of a rate window counter.
#[derive(Debug, Clone, Copy)]
pub struct WindowCounter {
    /// Count after this increment
    pub count: u64,
    /// Remaining time until the window resets
    pub ttl: Duration,
}

/// Shared-state operations the core depends on.
///
/// `incr_with_expiry` is the only synchronization primitive: the increment
/// and the 0→1 expiry arming happen as one indivisible operation. Splitting
/// them into separate calls reopens the race where two concurrent first
/// requests both observe count == 1 and re-arm the window.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically increment `key`, arming its expiry to `window` iff this
    /// increment took the count from 0 to 1. Returns the post-increment
    /// count and the remaining TTL.
    async fn incr_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<WindowCounter, StoreError>;

    /// Fetch the value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` at `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Insert `member` into the ordered index at `index` with the given
    /// score. Members sharing a score keep insertion order.
    async fn index_insert(&self, index: &str, score: i64, member: &str) -> Result<(), StoreError>;

    /// Members of the ordered index with `min <= score <= max`, ascending
    /// by score, insertion order within equal scores.
    async fn index_range(&self, index: &str, min: i64, max: i64)
        -> Result<Vec<String>, StoreError>;
}

#[derive(Debug)]
struct CounterSlot {
    count: u64,
    expires_at: Instant,
}

/// In-memory [`KeyValueStore`].
///
/// Counters expire lazily: an expired slot behaves exactly as an absent
/// one on the next increment, which is the natural-expiry reset the
/// limiter relies on. Uses `tokio::time::Instant` so tests can drive
/// expiry with a paused clock.
#[derive(Default)]
pub struct MemoryStore {
    counters: RwLock<HashMap<String, CounterSlot>>,
    values: RwLock<HashMap<String, Vec<u8>>>,
    indexes: RwLock<HashMap<String, BTreeMap<i64, Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn incr_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<WindowCounter, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Instant::now();

        let slot = counters
            .entry(key.to_string())
            .and_modify(|slot| {
                if slot.expires_at <= now {
                    // Natural expiry: this increment starts a fresh window.
                    slot.count = 1;
                    slot.expires_at = now + window;
                } else {
                    slot.count += 1;
                }
            })
            .or_insert_with(|| CounterSlot {
                count: 1,
                expires_at: now + window,
            });

        Ok(WindowCounter {
            count: slot.count,
            ttl: slot.expires_at.duration_since(now),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn index_insert(&self, index: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let mut indexes = self.indexes.write().await;
        indexes
            .entry(index.to_string())
            .or_default()
            .entry(score)
            .or_default()
            .push(member.to_string());
        Ok(())
    }

    async fn index_range(
        &self,
        index: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<String>, StoreError> {
        if min > max {
            return Ok(Vec::new());
        }
        let indexes = self.indexes.read().await;
        let members = indexes
            .get(index)
            .map(|by_score| {
                by_score
                    .range(min..=max)
                    .flat_map(|(_, members)| members.iter().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(members)
    }
}
