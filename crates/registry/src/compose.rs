//! Layered lookups.
//!
//! A composition asks its layers in order. `resolve` and `fallback` stop at the first
//! layer that answers; `all` concatenates every layer's matches, earlier layers first.

use crate::lookup::{DynLookup, Lookup, Matches};
use crate::predicate::PredicateKey;


/// Ordered list of type-erased lookups.
pub struct ListLookup<H> {
	layers: Vec<DynLookup<H>>,
}

impl<H: Clone + Send + Sync + 'static> ListLookup<H> {
	pub fn new(layers: impl IntoIterator<Item = DynLookup<H>>) -> Self {
		Self {
			layers: layers.into_iter().collect(),
		}
	}

	/// Appends a layer with the lowest priority.
	pub fn push(&mut self, layer: DynLookup<H>) {
		self.layers.push(layer);
	}

	pub fn layers(&self) -> &[DynLookup<H>] {
		&self.layers
	}

	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}
}

impl<H: Clone + Send + Sync + 'static> Lookup for ListLookup<H> {
	type Handler = H;

	fn resolve(&self, key: &[PredicateKey]) -> Option<H> {
		self.layers.iter().find_map(|layer| layer.resolve(key))
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<H> {
		self.layers.iter().find_map(|layer| layer.fallback(key))
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, H> {
		Box::new(self.layers.iter().flat_map(move |layer| layer.all(key)))
	}
}

impl<H> std::fmt::Debug for ListLookup<H> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListLookup")
			.field("layers", &self.layers.len())
			.finish()
	}
}

/// Two lookups, `first` taking priority over `next`.
#[derive(Debug, Clone)]
pub struct ChainLookup<A, B> {
	first: A,
	next: B,
}

impl<A, B> ChainLookup<A, B> {
	pub fn new(first: A, next: B) -> Self {
		Self { first, next }
	}

	pub fn first(&self) -> &A {
		&self.first
	}

	pub fn next(&self) -> &B {
		&self.next
	}
}

impl<A, B> Lookup for ChainLookup<A, B>
where
	A: Lookup,
	B: Lookup<Handler = A::Handler>,
{
	type Handler = A::Handler;

	fn resolve(&self, key: &[PredicateKey]) -> Option<A::Handler> {
		self.first.resolve(key).or_else(|| self.next.resolve(key))
	}

	fn fallback(&self, key: &[PredicateKey]) -> Option<A::Handler> {
		self.first.fallback(key).or_else(|| self.next.fallback(key))
	}

	fn all<'a>(&'a self, key: &'a [PredicateKey]) -> Matches<'a, A::Handler> {
		Box::new(self.first.all(key).chain(self.next.all(key)))
	}
}

/// Composes `lookups` in priority order.
pub fn compose_list<H: Clone + Send + Sync + 'static>(
	lookups: impl IntoIterator<Item = DynLookup<H>>,
) -> ListLookup<H> {
	ListLookup::new(lookups)
}

/// Composes two lookups, `first` taking priority.
pub fn compose_chain<A, B>(first: A, next: B) -> ChainLookup<A, B>
where
	A: Lookup,
	B: Lookup<Handler = A::Handler>,
{
	ChainLookup::new(first, next)
}
