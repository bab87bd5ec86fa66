//! Memoizing lookup wrapper.
//!
//! # Role
//!
//! [`CachingLookup`] wraps any [`Lookup`] and memoizes `resolve`, `fallback` and `all`
//! per lookup key. Dispatch keys repeat heavily in practice, so after warm-up most
//! calls never touch the permutation walk.
//!
//! # Invariants
//!
//! - "Not found" is a cached outcome; a miss is computed once, like a hit.
//!   - Enforced in: [`CachingLookup::resolve`] (values are `Option<H>`).
//!   - Tested by: `cache::tests::test_not_found_is_cached`.
//! - Each key is computed at most once per cache lifetime, even under contention.
//!   - Enforced in: `store::MethodCache::get_or_compute` (per-key once-cells).
//!   - Tested by: `cache::tests::test_concurrent_misses_compute_once`.
//! - The cache is never invalidated by the wrapped lookup. Mutating the registry
//!   behind a live cache leaves stale answers until [`CachingLookup::clear`] or a
//!   fresh wrapper.

mod config;
mod store;

use std::sync::Arc;

pub use config::{CacheConfig, CacheStrategy};
pub use store::MethodStats;
use store::MethodCache;

use crate::lookup::{Lookup, Matches};
use crate::predicate::PredicateKey;


/// Counters for all three cached methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub resolve: MethodStats,
	pub fallback: MethodStats,
	pub all: MethodStats,
}

/// A [`Lookup`] that memoizes another.
pub struct CachingLookup<L: Lookup> {
	inner: L,
	config: CacheConfig,
	resolve: MethodCache<Option<L::Handler>>,
	fallback: MethodCache<Option<L::Handler>>,
	all: MethodCache<Arc<[L::Handler]>>,
}

impl<L: Lookup> CachingLookup<L> {
	pub fn new(inner: L, config: CacheConfig) -> Self {
		Self {
			resolve: MethodCache::new(config.resolve),
			fallback: MethodCache::new(config.fallback),
			all: MethodCache::new(config.all),
			inner,
			config,
		}
	}

	/// Returns the wrapped lookup.
	pub fn inner(&self) -> &L {
		&self.inner
	}

	pub fn config(&self) -> &CacheConfig {
		&self.config
	}

	/// Drops every cached entry. Counters are kept.
	pub fn clear(&self) {
		self.resolve.clear();
		self.fallback.clear();
		self.all.clear();
		tracing::debug!("lookup cache cleared");
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			resolve: self.resolve.stats(),
			fallback: self.fallback.stats(),
			all: self.all.stats(),
		}
	}

	/// Every match for `key` as a shared slice, computed once.
	pub fn all_shared(&self, key: &[PredicateKey]) -> Arc<[L::Handler]> {
		self.all
			.get_or_compute(key, || self.inner.all(key).collect())
	}
}

impl<L: Lookup> Lookup for CachingLookup<L> {
	type Handler = L::Handler;

	fn resolve(&self, key: &[PredicateKey]) -> Option<L::Handler> {
		self.resolve.get_or_compute(key, || self.inner.resolve(key))
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<L::Handler> {
		self.fallback.get_or_compute(key, || self.inner.fallback(key))
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, L::Handler> {
		let matches = self.all_shared(key);
		Box::new((0..matches.len()).map(move |i| matches[i].clone()))
	}
}

impl<L: Lookup + std::fmt::Debug> std::fmt::Debug for CachingLookup<L> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CachingLookup")
			.field("inner", &self.inner)
			.field("config", &self.config)
			.field("stats", &self.stats())
			.finish()
	}
}

/// Wraps `lookup` in a [`CachingLookup`].
///
/// `config` accepts a full [`CacheConfig`], a single [`CacheStrategy`], or an
/// `Option<usize>` capacity where `None` means unbounded.
pub fn wrap_cached<L: Lookup>(lookup: L, config: impl Into<CacheConfig>) -> CachingLookup<L> {
	CachingLookup::new(lookup, config.into())
}
