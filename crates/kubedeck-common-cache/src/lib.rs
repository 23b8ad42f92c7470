// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Short-TTL in-memory cache used to memoize expensive cluster calls.
//!
//! Entries expire lazily: a read that finds a stale entry removes it and
//! reports a miss. There is no background sweep and nothing is persisted.
//!
//! The cache is an explicitly constructed value. The server owns one instance
//! for its whole lifetime and hands it to request handlers through state.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default time-to-live for entries stored without an explicit TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
	value: V,
	stored_at: Instant,
	ttl: Duration,
}

impl<V> CacheEntry<V> {
	fn is_fresh(&self, now: Instant) -> bool {
		now.saturating_duration_since(self.stored_at) <= self.ttl
	}
}

/// Key/value store with per-entry expiry.
///
/// `get_or_fetch` does not deduplicate concurrent misses for the same key:
/// two callers racing on a cold key will both run their producer.
#[derive(Debug)]
pub struct TtlCache<V> {
	entries: Mutex<HashMap<String, CacheEntry<V>>>,
	default_ttl: Duration,
}

impl<V: Clone> Default for TtlCache<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V: Clone> TtlCache<V> {
	/// Creates an empty cache using [`DEFAULT_TTL`].
	pub fn new() -> Self {
		Self::with_default_ttl(DEFAULT_TTL)
	}

	/// Creates an empty cache with a custom default TTL.
	pub fn with_default_ttl(default_ttl: Duration) -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			default_ttl,
		}
	}

	pub fn default_ttl(&self) -> Duration {
		self.default_ttl
	}

	/// Stores `value` under `key`, resetting its expiry clock.
	pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
		let entry = CacheEntry {
			value,
			stored_at: Instant::now(),
			ttl: ttl.unwrap_or(self.default_ttl),
		};
		self.entries.lock().await.insert(key.into(), entry);
	}

	/// Returns the value for `key` if it is still fresh.
	pub async fn get(&self, key: &str) -> Option<V> {
		let mut entries = self.entries.lock().await;
		let now = Instant::now();

		match entries.get(key) {
			Some(entry) if entry.is_fresh(now) => Some(entry.value.clone()),
			Some(_) => {
				entries.remove(key);
				debug!(key, "cache entry expired");
				None
			}
			None => None,
		}
	}

	/// Returns true if `key` holds a fresh value. Stale entries are purged.
	pub async fn has(&self, key: &str) -> bool {
		let mut entries = self.entries.lock().await;
		let now = Instant::now();

		match entries.get(key) {
			Some(entry) if entry.is_fresh(now) => true,
			Some(_) => {
				entries.remove(key);
				false
			}
			None => false,
		}
	}

	pub async fn delete(&self, key: &str) {
		self.entries.lock().await.remove(key);
	}

	pub async fn clear(&self) {
		self.entries.lock().await.clear();
	}

	/// Number of stored entries, including stale ones not yet read.
	pub async fn len(&self) -> usize {
		self.entries.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.lock().await.is_empty()
	}

	/// Returns the cached value for `key`, or runs `producer` and caches its
	/// result.
	///
	/// A failed producer is propagated unchanged and nothing is cached. The
	/// lock is released while the producer runs.
	pub async fn get_or_fetch<F, Fut, E>(
		&self,
		key: &str,
		producer: F,
		ttl: Option<Duration>,
	) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
		E: std::fmt::Display,
	{
		if let Some(value) = self.get(key).await {
			debug!(key, "cache hit");
			return Ok(value);
		}

		match producer().await {
			Ok(value) => {
				self.set(key, value.clone(), ttl).await;
				Ok(value)
			}
			Err(e) => {
				warn!(key, error = %e, "cache producer failed");
				Err(e)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	#[tokio::test(start_paused = true)]
	async fn test_get_within_ttl() {
		let cache = TtlCache::new();
		cache.set("pods:default", 7u32, None).await;

		tokio::time::advance(Duration::from_secs(10)).await;
		assert_eq!(cache.get("pods:default").await, Some(7));
	}

	#[tokio::test(start_paused = true)]
	async fn test_miss_strictly_after_ttl() {
		let cache = TtlCache::new();
		cache
			.set("nodes", "n1".to_string(), Some(Duration::from_millis(500)))
			.await;

		tokio::time::advance(Duration::from_millis(500)).await;
		assert_eq!(cache.get("nodes").await, Some("n1".to_string()));

		tokio::time::advance(Duration::from_millis(1)).await;
		assert_eq!(cache.get("nodes").await, None);
	}

	#[tokio::test(start_paused = true)]
	async fn test_expired_entry_is_purged_on_read() {
		let cache = TtlCache::with_default_ttl(Duration::from_secs(1));
		cache.set("a", 1, None).await;
		cache.set("b", 2, Some(Duration::from_secs(60))).await;

		tokio::time::advance(Duration::from_secs(2)).await;
		assert_eq!(cache.len().await, 2);

		assert!(!cache.has("a").await);
		assert_eq!(cache.len().await, 1);
		assert!(cache.has("b").await);
	}

	#[tokio::test(start_paused = true)]
	async fn test_set_overwrites_and_resets_clock() {
		let cache = TtlCache::with_default_ttl(Duration::from_secs(5));
		cache.set("k", 1, None).await;

		tokio::time::advance(Duration::from_secs(4)).await;
		cache.set("k", 2, None).await;

		tokio::time::advance(Duration::from_secs(4)).await;
		assert_eq!(cache.get("k").await, Some(2));
	}

	#[tokio::test]
	async fn test_delete_and_clear() {
		let cache = TtlCache::new();
		cache.set("a", 1, None).await;
		cache.set("b", 2, None).await;

		cache.delete("a").await;
		cache.delete("missing").await;
		assert_eq!(cache.get("a").await, None);
		assert_eq!(cache.get("b").await, Some(2));

		cache.clear().await;
		assert!(cache.is_empty().await);
	}

	#[tokio::test]
	async fn test_get_or_fetch_hit_skips_producer() {
		let cache = TtlCache::new();
		let calls = AtomicUsize::new(0);

		for _ in 0..3 {
			let value: Result<u32, String> = cache
				.get_or_fetch(
					"deployments:web",
					|| async {
						calls.fetch_add(1, Ordering::SeqCst);
						Ok(42)
					},
					None,
				)
				.await;
			assert_eq!(value, Ok(42));
		}

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_get_or_fetch_refetches_after_expiry() {
		let cache = TtlCache::new();
		let calls = AtomicUsize::new(0);
		let fetch = || async {
			Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst))
		};

		let first = cache
			.get_or_fetch("k", fetch, Some(Duration::from_secs(1)))
			.await;
		tokio::time::advance(Duration::from_secs(2)).await;
		let second = cache
			.get_or_fetch("k", fetch, Some(Duration::from_secs(1)))
			.await;

		assert_eq!(first, Ok(0));
		assert_eq!(second, Ok(1));
	}

	#[tokio::test]
	async fn test_failing_producer_is_not_cached() {
		let cache: TtlCache<u32> = TtlCache::new();
		let calls = AtomicUsize::new(0);

		for _ in 0..2 {
			let result = cache
				.get_or_fetch(
					"secrets",
					|| async {
						calls.fetch_add(1, Ordering::SeqCst);
						Err::<u32, _>("cluster unreachable".to_string())
					},
					None,
				)
				.await;
			assert_eq!(result, Err("cluster unreachable".to_string()));
		}

		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(!cache.has("secrets").await);
		assert!(cache.is_empty().await);
	}

	/// No stampede protection: concurrent misses on one key both run the
	/// producer.
	#[tokio::test(start_paused = true)]
	async fn test_concurrent_misses_invoke_producer_twice() {
		let cache = Arc::new(TtlCache::new());
		let calls = Arc::new(AtomicUsize::new(0));

		let fetch = |calls: Arc<AtomicUsize>| {
			move || async move {
				tokio::time::sleep(Duration::from_millis(10)).await;
				Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst))
			}
		};

		let (a, b) = tokio::join!(
			cache.get_or_fetch("cold", fetch(calls.clone()), None),
			cache.get_or_fetch("cold", fetch(calls.clone()), None),
		);

		assert!(a.is_ok());
		assert!(b.is_ok());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(cache.has("cold").await);
	}
}
