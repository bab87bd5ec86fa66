use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::CacheStrategy;
use crate::predicate::PredicateKey;

type Cell<V> = Arc<OnceLock<V>>;
type Key = Box<[PredicateKey]>;

enum Store<V> {
	Unbounded(RwLock<FxHashMap<Key, Cell<V>>>),
	Lru(Mutex<LruCache<Key, Cell<V>>>),
	Disabled,
}

/// Hit and miss counters of one cached method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodStats {
	pub hits: u64,
	pub misses: u64,
	pub entries: usize,
}

/// Cache of one lookup method.
///
/// Each key maps to a once-cell. The map lock is held only to find or insert the
/// cell; the computation runs under the cell, so concurrent callers for the same key
/// wait for a single computation and callers for other keys are not blocked.
pub(super) struct MethodCache<V> {
	store: Store<V>,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl<V: Clone> MethodCache<V> {
	pub(super) fn new(strategy: CacheStrategy) -> Self {
		let store = match strategy {
			CacheStrategy::Unbounded => Store::Unbounded(RwLock::new(FxHashMap::default())),
			CacheStrategy::Lru { capacity } => match NonZeroUsize::new(capacity) {
				Some(capacity) => Store::Lru(Mutex::new(LruCache::new(capacity))),
				None => {
					tracing::debug!("lru capacity 0 disables the cache");
					Store::Disabled
				}
			},
			CacheStrategy::Disabled => Store::Disabled,
		};
		Self {
			store,
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	pub(super) fn get_or_compute(&self, key: &[PredicateKey], compute: impl FnOnce() -> V) -> V {
		let Some(cell) = self.cell(key) else {
			self.misses.fetch_add(1, Ordering::Relaxed);
			return compute();
		};

		let mut computed = false;
		let value = cell
			.get_or_init(|| {
				computed = true;
				compute()
			})
			.clone();
		let counter = if computed { &self.misses } else { &self.hits };
		counter.fetch_add(1, Ordering::Relaxed);
		value
	}

	fn cell(&self, key: &[PredicateKey]) -> Option<Cell<V>> {
		match &self.store {
			Store::Unbounded(map) => {
				if let Some(cell) = map.read().get(key) {
					return Some(Arc::clone(cell));
				}
				let mut map = map.write();
				let cell = map.entry(Key::from(key)).or_default();
				Some(Arc::clone(cell))
			}
			Store::Lru(lru) => {
				let mut lru = lru.lock();
				if let Some(cell) = lru.get(key) {
					return Some(Arc::clone(cell));
				}
				let cell = Cell::default();
				lru.put(Key::from(key), Arc::clone(&cell));
				Some(cell)
			}
			Store::Disabled => None,
		}
	}

	pub(super) fn clear(&self) {
		match &self.store {
			Store::Unbounded(map) => map.write().clear(),
			Store::Lru(lru) => lru.lock().clear(),
			Store::Disabled => {}
		}
	}

	pub(super) fn len(&self) -> usize {
		match &self.store {
			Store::Unbounded(map) => map.read().len(),
			Store::Lru(lru) => lru.lock().len(),
			Store::Disabled => 0,
		}
	}

	pub(super) fn stats(&self) -> MethodStats {
		MethodStats {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			entries: self.len(),
		}
	}
}
