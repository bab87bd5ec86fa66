//! Ancestor-aware identities.
//!
//! # Role
//!
//! An [`AncestorKey`] is an identity paired with the linearized sequence of its
//! generalizations. Every hierarchy-matching index walks that sequence to find the
//! closest registered ancestor, so the linearization is computed exactly once, when
//! the key is declared, and never changes afterwards.
//!
//! # Mental Model
//!
//! - A [`Hierarchy`] is an arena owning the keys of one declared DAG, addressable by
//!   name and by dense slot.
//! - [`TypeHierarchy`] is the same arena keyed by [`std::any::TypeId`], for dispatch on
//!   the runtime type of a value.
//! - Keys are cheap handles; cloning one bumps a reference count.
//!
//! # Invariants
//!
//! - `ancestors(k)` starts with `k` and contains no duplicates.
//!   - Enforced in: `linearize::c3_merge`.
//!   - Tested by: `ancestry::tests::prop_ancestor_monotonicity`.
//! - For every parent `p` of `k`, `ancestors(p)` is a subsequence of `ancestors(k)`.
//!   - Enforced in: `linearize::c3_merge` (parent linearizations are merge inputs).
//!   - Failure symptom: a subclass resolves to a handler registered for a more general
//!     ancestor while a more specific one exists.
//! - Declaration fails instead of guessing when parents disagree on order.
//!   - Enforced in: [`AncestorKey::new`].
//!   - Tested by: `ancestry::tests::test_inconsistent_order_is_rejected`.

mod linearize;
mod types;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

pub use types::TypeHierarchy;

use crate::error::AncestorConflictError;

#[cfg(test)]
mod tests;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`AncestorKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
	fn next() -> Self {
		Self(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns the raw identifier.
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

struct Node {
	id: KeyId,
	name: Arc<str>,
	parents: Box<[AncestorKey]>,
	/// Linearization without the key itself, most specific first.
	lineage: Box<[AncestorKey]>,
}

/// An identity with a fixed, linearized ancestor chain.
///
/// Equality and hashing use the [`KeyId`] only, so two keys declared with the same
/// name are still distinct identities.
#[derive(Clone)]
pub struct AncestorKey(Arc<Node>);

impl AncestorKey {
	/// Declares a key with no parents.
	pub fn root(name: impl Into<Arc<str>>) -> Self {
		Self(Arc::new(Node {
			id: KeyId::next(),
			name: name.into(),
			parents: Box::default(),
			lineage: Box::default(),
		}))
	}

	/// Declares a key derived from `parents`, earlier parents taking priority.
	///
	/// Fails with [`AncestorConflictError`] when the parents' own ancestor orders cannot
	/// be merged into a single consistent order.
	pub fn new(
		name: impl Into<Arc<str>>,
		parents: &[AncestorKey],
	) -> Result<Self, AncestorConflictError> {
		let name = name.into();
		for (i, parent) in parents.iter().enumerate() {
			if parents[..i].contains(parent) {
				return Err(AncestorConflictError::DuplicateParent {
					key: name.to_string(),
					parent: parent.name().to_string(),
				});
			}
		}

		let lineage = linearize::c3_merge(parents).map_err(|remaining| {
			AncestorConflictError::Inconsistent {
				key: name.to_string(),
				remaining,
			}
		})?;

		Ok(Self(Arc::new(Node {
			id: KeyId::next(),
			name,
			parents: parents.into(),
			lineage: lineage.into_boxed_slice(),
		})))
	}

	/// Returns the identity of this key.
	#[inline]
	pub fn id(&self) -> KeyId {
		self.0.id
	}

	/// Returns the declared name.
	#[inline]
	pub fn name(&self) -> &str {
		&self.0.name
	}

	/// Returns the directly declared parents, in declaration order.
	#[inline]
	pub fn parents(&self) -> &[AncestorKey] {
		&self.0.parents
	}

	/// Returns the ancestors excluding this key, most specific first.
	#[inline]
	pub fn lineage(&self) -> &[AncestorKey] {
		&self.0.lineage
	}

	/// Returns this key followed by its linearized ancestors.
	pub fn ancestors(&self) -> impl Iterator<Item = &AncestorKey> + '_ {
		std::iter::once(self).chain(self.0.lineage.iter())
	}

	/// Number of entries yielded by [`Self::ancestors`].
	pub fn depth(&self) -> usize {
		self.0.lineage.len() + 1
	}

	/// Returns true if `other` is this key or one of its ancestors.
	pub fn is_a(&self, other: &AncestorKey) -> bool {
		self == other || self.0.lineage.contains(other)
	}
}

impl PartialEq for AncestorKey {
	fn eq(&self, other: &Self) -> bool {
		self.0.id == other.0.id
	}
}

impl Eq for AncestorKey {}

impl Hash for AncestorKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.id.hash(state);
	}
}

impl fmt::Debug for AncestorKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("AncestorKey").field(&self.name()).finish()
	}
}

impl fmt::Display for AncestorKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Arena of keys belonging to one declared hierarchy.
///
/// Keys are stored in declaration order and can be addressed by name or by slot.
/// Parents must be declared before their children, which also rules out cycles.
#[derive(Default)]
pub struct Hierarchy {
	keys: Vec<AncestorKey>,
	by_name: FxHashMap<Arc<str>, usize>,
}

impl Hierarchy {
	/// Creates an empty hierarchy.
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares `name` with parents given by name.
	pub fn declare(
		&mut self,
		name: impl Into<Arc<str>>,
		parents: &[&str],
	) -> Result<AncestorKey, AncestorConflictError> {
		let name = name.into();
		if self.by_name.contains_key(&name) {
			return Err(AncestorConflictError::AlreadyDeclared {
				key: name.to_string(),
			});
		}

		let parents = parents
			.iter()
			.map(|p| {
				self.get(p)
					.cloned()
					.ok_or_else(|| AncestorConflictError::UnknownParent {
						key: name.to_string(),
						parent: (*p).to_string(),
					})
			})
			.collect::<Result<Vec<_>, _>>()?;

		let key = AncestorKey::new(name.clone(), &parents)?;
		tracing::trace!(key = %name, depth = key.depth(), "declared ancestor key");
		self.by_name.insert(name, self.keys.len());
		self.keys.push(key.clone());
		Ok(key)
	}

	/// Looks up a key by name.
	pub fn get(&self, name: &str) -> Option<&AncestorKey> {
		self.by_name.get(name).map(|&slot| &self.keys[slot])
	}

	/// Looks up a key by declaration slot.
	pub fn slot(&self, slot: usize) -> Option<&AncestorKey> {
		self.keys.get(slot)
	}

	/// Iterates keys in declaration order.
	pub fn iter(&self) -> impl Iterator<Item = &AncestorKey> + '_ {
		self.keys.iter()
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}

impl fmt::Debug for Hierarchy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.keys.iter()).finish()
	}
}
