//! The read-only lookup protocol shared by registries, caches and compositions.

use std::sync::Arc;

use crate::predicate::PredicateKey;
use crate::registry::PredicateRegistry;

/// Lazily produced matches, most specific first.
pub type Matches<'a, H> = Box<dyn Iterator<Item = H> + 'a>;

/// Read-only view over a multi-predicate registry.
///
/// Every layer in this crate implements it: [`PredicateRegistry`] itself,
/// [`crate::CachingLookup`], [`crate::ListLookup`] and [`crate::ChainLookup`], so
/// layers can be stacked freely.
pub trait Lookup: Send + Sync {
	type Handler: Clone + Send + Sync + 'static;

	/// Handler for the most specific registered generalization of `key`.
	fn resolve(&self, key: &[PredicateKey]) -> Option<Self::Handler>;

	/// Per-dimension fallback for `key`, if any dimension has no registrations for
	/// its value.
	fn fallback(&self, key: &[PredicateKey]) -> Option<Self::Handler>;

	/// Every matching handler, most specific first, without repeats.
	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, Self::Handler>;
}

/// Type-erased shared lookup.
pub type DynLookup<H> = Arc<dyn Lookup<Handler = H>>;

impl<L: Lookup + ?Sized> Lookup for Arc<L> {
	type Handler = L::Handler;

	fn resolve(&self, key: &[PredicateKey]) -> Option<Self::Handler> {
		(**self).resolve(key)
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<Self::Handler> {
		(**self).fallback(key)
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, Self::Handler> {
		(**self).all(key)
	}
}

impl<H: Clone + Send + Sync + 'static> Lookup for PredicateRegistry<H> {
	type Handler = H;

	fn resolve(&self, key: &[PredicateKey]) -> Option<H> {
		PredicateRegistry::resolve(self, key).cloned()
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<H> {
		PredicateRegistry::fallback(self, key).cloned()
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, H> {
		Box::new(PredicateRegistry::all(self, key).cloned())
	}
}
