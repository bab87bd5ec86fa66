//! Multi-predicate registry.
//!
//! # Role
//!
//! [`PredicateRegistry`] composes one [`PredicateIndex`] per declared dimension into a
//! registry keyed by tuples of [`PredicateKey`]s. It answers four questions about a
//! lookup key:
//!
//! | Operation | Answer |
//! |-----------|--------|
//! | [`get`](PredicateRegistry::get) | handler registered for exactly this tuple |
//! | [`resolve`](PredicateRegistry::resolve) | most specific registered generalization |
//! | [`fallback`](PredicateRegistry::fallback) | per-dimension "no match" value |
//! | [`all`](PredicateRegistry::all) | every matching handler, most specific first |
//!
//! # Precedence Contract
//!
//! Candidate tuples are visited as the Cartesian product of each dimension's
//! permutations with the rightmost dimension advancing fastest. Earlier-declared
//! predicates therefore dominate: a tuple more specific in dimension 0 always wins over
//! one that is less specific in dimension 0, regardless of later dimensions.
//!
//! # Invariants
//!
//! - At most one handler per exact key tuple.
//!   - Enforced in: [`PredicateRegistry::register`] (stale ids are removed from every
//!     dimension index before the replacement is indexed).
//!   - Tested by: `registry::tests::test_replacement_leaves_no_stale_ids`.
//!   - Failure symptom: `all` yields a replaced handler, or exact lookups see two ids.
//! - `all` never yields the same handler twice.
//!   - Enforced in: [`AllMatches`].
//!
//! # Concurrency
//!
//! Registration takes `&mut self`; lookups take `&self` and never lock. Share a
//! finished registry behind an `Arc`, or publish successive versions through
//! [`crate::Published`].

mod permutations;

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use permutations::{Axis, KeyBuf, KeyPermutations};

use crate::error::RegistryError;
use crate::index::{HandlerId, HandlerSet, PredicateIndex};
use crate::predicate::{Predicate, PredicateKey, display_key};

#[cfg(test)]
mod tests;

/// What to do when an exact key tuple is registered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Last write wins; the previous handler is removed from every index.
	#[default]
	Replace,
	/// Keep the existing handler and fail with [`RegistryError::DuplicateRegistration`].
	Reject,
}

/// Registry keyed by tuples of predicate values.
#[derive(Clone)]
pub struct PredicateRegistry<H> {
	predicates: Arc<[Predicate<H>]>,
	indexes: Vec<PredicateIndex>,
	values: FxHashMap<HandlerId, H>,
	by_key: FxHashMap<Box<[PredicateKey]>, HandlerId>,
	next_id: u32,
	policy: DuplicatePolicy,
}

impl<H> PredicateRegistry<H> {
	/// Creates a registry over `predicates`, in dispatch priority order.
	///
	/// Name-based operations address the first predicate with a given name; use
	/// [`Self::try_new`] to reject duplicate names up front.
	pub fn new(predicates: impl IntoIterator<Item = Predicate<H>>) -> Self {
		let predicates: Arc<[Predicate<H>]> = predicates.into_iter().collect();
		let indexes = predicates.iter().map(Predicate::create_index).collect();
		Self {
			predicates,
			indexes,
			values: FxHashMap::default(),
			by_key: FxHashMap::default(),
			next_id: 0,
			policy: DuplicatePolicy::default(),
		}
	}

	/// Like [`Self::new`], failing if two predicates share a name.
	pub fn try_new(
		predicates: impl IntoIterator<Item = Predicate<H>>,
	) -> Result<Self, RegistryError> {
		let registry = Self::new(predicates);
		for (i, predicate) in registry.predicates.iter().enumerate() {
			if registry.predicates[..i]
				.iter()
				.any(|p| p.name() == predicate.name())
			{
				return Err(RegistryError::DuplicatePredicate {
					name: predicate.name().to_string(),
				});
			}
		}
		Ok(registry)
	}

	/// Sets the duplicate registration policy.
	pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}

	/// Number of dimensions.
	pub fn arity(&self) -> usize {
		self.predicates.len()
	}

	pub fn predicates(&self) -> &[Predicate<H>] {
		&self.predicates
	}

	/// Number of live registrations.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Drops every registration, keeping predicates and policy.
	pub fn clear(&mut self) {
		self.indexes = self.predicates.iter().map(Predicate::create_index).collect();
		self.values.clear();
		self.by_key.clear();
	}

	/// Registers `value` for the exact key tuple `key`.
	///
	/// With [`DuplicatePolicy::Replace`], registering an existing tuple again replaces
	/// the previous value cleanly.
	pub fn register(
		&mut self,
		key: impl IntoIterator<Item = PredicateKey>,
		value: H,
	) -> Result<HandlerId, RegistryError> {
		let key: Box<[PredicateKey]> = key.into_iter().collect();
		if key.len() != self.arity() {
			return Err(RegistryError::ArityMismatch {
				expected: self.arity(),
				got: key.len(),
			});
		}

		let id = HandlerId::from_u32(self.next_id);
		let next_id = self
			.next_id
			.checked_add(1)
			.ok_or(RegistryError::IdsExhausted)?;

		if let Some(&stale) = self.by_key.get(&key) {
			match self.policy {
				DuplicatePolicy::Reject => {
					tracing::warn!(key = %display_key(&key), "rejected duplicate registration");
					return Err(RegistryError::DuplicateRegistration {
						key: display_key(&key),
					});
				}
				DuplicatePolicy::Replace => {
					for (index, k) in self.indexes.iter_mut().zip(key.iter()) {
						index.remove(k, stale);
					}
					self.values.remove(&stale);
					tracing::debug!(
						key = %display_key(&key),
						stale = stale.as_u32(),
						"replacing registration"
					);
				}
			}
		}

		self.next_id = next_id;
		for (index, k) in self.indexes.iter_mut().zip(key.iter()) {
			index.add(k.clone(), id);
		}
		self.values.insert(id, value);
		self.by_key.insert(key, id);
		Ok(id)
	}

	/// Builds a key tuple from `(predicate name, value)` pairs.
	///
	/// Predicates not named take their default value (`ANY` unless configured).
	pub fn key_by_name<'n>(
		&self,
		pairs: impl IntoIterator<Item = (&'n str, PredicateKey)>,
	) -> Result<Box<[PredicateKey]>, RegistryError> {
		let mut key: Box<[PredicateKey]> = self
			.predicates
			.iter()
			.map(|p| p.default_key().clone())
			.collect();
		for (name, value) in pairs {
			let slot = self
				.predicates
				.iter()
				.position(|p| p.name() == name)
				.ok_or_else(|| RegistryError::UnknownPredicate {
					name: name.to_string(),
				})?;
			key[slot] = value;
		}
		Ok(key)
	}

	/// Registers `value` under a key built by [`Self::key_by_name`].
	pub fn register_by_name<'n>(
		&mut self,
		pairs: impl IntoIterator<Item = (&'n str, PredicateKey)>,
		value: H,
	) -> Result<HandlerId, RegistryError> {
		let key = self.key_by_name(pairs)?;
		self.register(key.into_vec(), value)
	}

	/// Returns the handler registered for exactly `key`, without widening.
	pub fn get(&self, key: &[PredicateKey]) -> Option<&H> {
		self.exact_id(key).and_then(|id| self.values.get(&id))
	}

	/// Returns the handler for the most specific registered generalization of `key`.
	pub fn resolve(&self, key: &[PredicateKey]) -> Option<&H> {
		self.search(key)
			.find_map(|candidate| self.exact_id(&candidate))
			.and_then(|id| self.values.get(&id))
	}

	/// Returns the fallback of the first dimension whose exact value has no
	/// registrations.
	///
	/// Returns `None` when every dimension's value is registered somewhere, even if
	/// the combination as a whole never matched; callers then use their own default.
	pub fn fallback(&self, key: &[PredicateKey]) -> Option<&H> {
		if key.len() != self.arity() {
			return None;
		}
		for ((predicate, index), value) in self.predicates.iter().zip(&self.indexes).zip(key) {
			if index.get(value).is_none() {
				tracing::trace!(
					predicate = predicate.name(),
					value = %value,
					"dimension has no registrations for value"
				);
				return predicate.fallback();
			}
		}
		None
	}

	/// Lazily yields every matching handler, most specific first, without repeats.
	pub fn all(&self, key: &[PredicateKey]) -> AllMatches<'_, H> {
		AllMatches {
			registry: self,
			permutations: self.search(key),
			seen: FxHashSet::default(),
		}
	}

	/// Returns the full candidate walk for `key`, unfiltered.
	pub fn permutations(&self, key: &[PredicateKey]) -> KeyPermutations {
		if key.len() != self.arity() {
			return KeyPermutations::exhausted();
		}
		KeyPermutations::new(self.axes(key))
	}

	fn axes(&self, key: &[PredicateKey]) -> SmallVec<[Axis; 4]> {
		self.indexes
			.iter()
			.zip(key)
			.map(|(index, value)| index.permutations(value).collect())
			.collect()
	}

	/// Candidate walk for lookups, empty when no combination can possibly match.
	fn search(&self, key: &[PredicateKey]) -> KeyPermutations {
		if key.len() != self.arity() {
			tracing::debug!(
				expected = self.arity(),
				got = key.len(),
				"lookup key arity mismatch"
			);
			return KeyPermutations::exhausted();
		}
		let axes = self.axes(key);
		if !self.has_candidates(&axes) {
			return KeyPermutations::exhausted();
		}
		KeyPermutations::new(axes)
	}

	/// True if some registration matches every dimension's permutations at once.
	///
	/// Probes the ids of the dimension with the fewest candidates against the other
	/// dimensions; nothing is allocated.
	fn has_candidates(&self, axes: &[Axis]) -> bool {
		let mut narrowest: Option<(usize, usize)> = None;
		for (dim, (index, axis)) in self.indexes.iter().zip(axes).enumerate() {
			let count: usize = axis
				.iter()
				.filter_map(|value| index.get(value))
				.map(HandlerSet::len)
				.sum();
			if count == 0 {
				return false;
			}
			if narrowest.is_none_or(|(_, fewest)| count < fewest) {
				narrowest = Some((dim, count));
			}
		}
		let Some((dim, _)) = narrowest else {
			return true;
		};

		let matches_dimension = |other: usize, id: &HandlerId| {
			axes[other]
				.iter()
				.any(|value| self.indexes[other].get(value).is_some_and(|ids| ids.contains(id)))
		};
		axes[dim]
			.iter()
			.filter_map(|value| self.indexes[dim].get(value))
			.flatten()
			.any(|id| {
				(0..axes.len())
					.filter(|&other| other != dim)
					.all(|other| matches_dimension(other, id))
			})
	}

	/// Intersects the exact per-dimension sets, smallest first.
	fn exact_id(&self, key: &[PredicateKey]) -> Option<HandlerId> {
		if key.len() != self.arity() {
			return None;
		}
		if self.indexes.is_empty() {
			return self.by_key.get(key).copied();
		}
		let mut sets: SmallVec<[&HandlerSet; 4]> = SmallVec::with_capacity(key.len());
		for (index, value) in self.indexes.iter().zip(key) {
			sets.push(index.get(value)?);
		}
		sets.sort_unstable_by_key(|set| set.len());
		let (smallest, rest) = sets.split_first()?;
		smallest
			.iter()
			.copied()
			.find(|id| rest.iter().all(|set| set.contains(id)))
	}
}

impl<H> fmt::Debug for PredicateRegistry<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PredicateRegistry")
			.field("predicates", &self.predicates)
			.field("len", &self.values.len())
			.field("policy", &self.policy)
			.finish()
	}
}

/// Lazy iterator returned by [`PredicateRegistry::all`].
pub struct AllMatches<'a, H> {
	registry: &'a PredicateRegistry<H>,
	permutations: KeyPermutations,
	seen: FxHashSet<HandlerId>,
}

impl<'a, H> Iterator for AllMatches<'a, H> {
	type Item = &'a H;

	fn next(&mut self) -> Option<&'a H> {
		for candidate in self.permutations.by_ref() {
			let Some(id) = self.registry.exact_id(&candidate) else {
				continue;
			};
			if self.seen.insert(id) {
				return self.registry.values.get(&id);
			}
		}
		None
	}
}
