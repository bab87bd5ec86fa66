//! Single-dimension predicate indexes.
//!
//! # Role
//!
//! Each dimension of a registry keeps one index mapping a [`PredicateKey`] to the set
//! of handler ids registered with that exact value. The index kind decides how a
//! lookup value widens: [`KeyIndex`] tries the value then `ANY`, [`HierarchyIndex`]
//! walks the full ancestor chain then `ANY`.
//!
//! # Invariants
//!
//! - Permutations are ordered most specific first and end with `ANY` exactly once.
//!   - Enforced in: [`Permutations`].
//!   - Tested by: `index::tests::test_hierarchy_permutations_follow_lineage`.
//! - Empty sets are never stored, so a present entry always has candidates.
//!   - Enforced in: `Entries::remove`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ancestry::AncestorKey;
use crate::predicate::PredicateKey;


/// Dense identifier of one registration inside a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

impl HandlerId {
	pub(crate) const fn from_u32(raw: u32) -> Self {
		Self(raw)
	}

	pub fn as_u32(self) -> u32 {
		self.0
	}
}

pub type HandlerSet = FxHashSet<HandlerId>;

#[derive(Clone, Debug, Default)]
struct Entries {
	map: FxHashMap<PredicateKey, HandlerSet>,
}

impl Entries {
	fn add(&mut self, key: PredicateKey, id: HandlerId) {
		self.map.entry(key).or_default().insert(id);
	}

	fn remove(&mut self, key: &PredicateKey, id: HandlerId) -> bool {
		let Some(set) = self.map.get_mut(key) else {
			return false;
		};
		let removed = set.remove(&id);
		if set.is_empty() {
			self.map.remove(key);
		}
		removed
	}

	fn get(&self, key: &PredicateKey) -> Option<&HandlerSet> {
		self.map.get(key)
	}
}

/// Exact-match index.
#[derive(Clone, Debug, Default)]
pub struct KeyIndex {
	entries: Entries,
}

impl KeyIndex {
	pub fn add(&mut self, key: PredicateKey, id: HandlerId) {
		self.entries.add(key, id);
	}

	pub fn remove(&mut self, key: &PredicateKey, id: HandlerId) -> bool {
		self.entries.remove(key, id)
	}

	pub fn get(&self, key: &PredicateKey) -> Option<&HandlerSet> {
		self.entries.get(key)
	}

	/// Yields `key`, then `ANY`.
	pub fn permutations<'a>(&self, key: &'a PredicateKey) -> Permutations<'a> {
		Permutations::exact(key)
	}

	pub fn len(&self) -> usize {
		self.entries.map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.map.is_empty()
	}
}

/// Ancestor-match index.
#[derive(Clone, Debug, Default)]
pub struct HierarchyIndex {
	entries: Entries,
}

impl HierarchyIndex {
	pub fn add(&mut self, key: PredicateKey, id: HandlerId) {
		self.entries.add(key, id);
	}

	pub fn remove(&mut self, key: &PredicateKey, id: HandlerId) -> bool {
		self.entries.remove(key, id)
	}

	pub fn get(&self, key: &PredicateKey) -> Option<&HandlerSet> {
		self.entries.get(key)
	}

	/// Yields `key` and its ancestors most specific first, then `ANY`.
	///
	/// Values that are not ancestor keys have no lineage and behave as in
	/// [`KeyIndex::permutations`].
	pub fn permutations<'a>(&self, key: &'a PredicateKey) -> Permutations<'a> {
		match key {
			PredicateKey::Ancestor(k) => Permutations::lineage(key, k),
			_ => Permutations::exact(key),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.map.is_empty()
	}
}

/// Index of one dimension.
#[derive(Clone, Debug)]
pub enum PredicateIndex {
	Key(KeyIndex),
	Hierarchy(HierarchyIndex),
}

impl PredicateIndex {
	pub fn add(&mut self, key: PredicateKey, id: HandlerId) {
		match self {
			Self::Key(i) => i.add(key, id),
			Self::Hierarchy(i) => i.add(key, id),
		}
	}

	pub fn remove(&mut self, key: &PredicateKey, id: HandlerId) -> bool {
		match self {
			Self::Key(i) => i.remove(key, id),
			Self::Hierarchy(i) => i.remove(key, id),
		}
	}

	/// Handler ids registered with exactly `key`, if any.
	pub fn get(&self, key: &PredicateKey) -> Option<&HandlerSet> {
		match self {
			Self::Key(i) => i.get(key),
			Self::Hierarchy(i) => i.get(key),
		}
	}

	pub fn permutations<'a>(&self, key: &'a PredicateKey) -> Permutations<'a> {
		match self {
			Self::Key(i) => i.permutations(key),
			Self::Hierarchy(i) => i.permutations(key),
		}
	}
}

/// Lazy most-specific-first widening of one lookup value.
#[derive(Clone, Debug)]
pub struct Permutations<'a> {
	head: Option<&'a PredicateKey>,
	lineage: std::slice::Iter<'a, AncestorKey>,
	any: bool,
}

impl<'a> Permutations<'a> {
	fn exact(key: &'a PredicateKey) -> Self {
		let empty: &'a [AncestorKey] = &[];
		Self {
			head: Some(key),
			lineage: empty.iter(),
			any: !key.is_any(),
		}
	}

	fn lineage(key: &'a PredicateKey, ancestor: &'a AncestorKey) -> Self {
		Self {
			head: Some(key),
			lineage: ancestor.lineage().iter(),
			any: true,
		}
	}
}

impl Iterator for Permutations<'_> {
	type Item = PredicateKey;

	fn next(&mut self) -> Option<PredicateKey> {
		if let Some(head) = self.head.take() {
			return Some(head.clone());
		}
		if let Some(ancestor) = self.lineage.next() {
			return Some(PredicateKey::Ancestor(ancestor.clone()));
		}
		if self.any {
			self.any = false;
			return Some(PredicateKey::Any);
		}
		None
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let n = usize::from(self.head.is_some()) + self.lineage.len() + usize::from(self.any);
		(n, Some(n))
	}
}

impl ExactSizeIterator for Permutations<'_> {}
