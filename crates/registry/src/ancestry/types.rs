use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use super::AncestorKey;
use crate::error::AncestorConflictError;

/// Hierarchy of Rust types, keyed by [`TypeId`].
///
/// Rust has no inheritance to reflect on, so each type declares its parents
/// explicitly, usually once at startup.
#[derive(Debug, Default)]
pub struct TypeHierarchy {
	keys: FxHashMap<TypeId, AncestorKey>,
}

impl TypeHierarchy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares `T` with the given parent keys.
	pub fn declare<T: Any>(
		&mut self,
		parents: &[AncestorKey],
	) -> Result<AncestorKey, AncestorConflictError> {
		let type_id = TypeId::of::<T>();
		let name = std::any::type_name::<T>();
		if self.keys.contains_key(&type_id) {
			return Err(AncestorConflictError::AlreadyDeclared {
				key: name.to_string(),
			});
		}

		let key = AncestorKey::new(name, parents)?;
		self.keys.insert(type_id, key.clone());
		Ok(key)
	}

	/// Declares `T` as a subtype of the already declared `P`.
	pub fn declare_sub<T: Any, P: Any>(&mut self) -> Result<AncestorKey, AncestorConflictError> {
		let parent = self
			.key_of::<P>()
			.cloned()
			.ok_or_else(|| AncestorConflictError::UnknownParent {
				key: std::any::type_name::<T>().to_string(),
				parent: std::any::type_name::<P>().to_string(),
			})?;
		self.declare::<T>(&[parent])
	}

	/// Returns the key declared for `T`.
	pub fn key_of<T: Any>(&self) -> Option<&AncestorKey> {
		self.keys.get(&TypeId::of::<T>())
	}

	/// Returns the key declared for a raw [`TypeId`].
	pub fn key_for(&self, type_id: TypeId) -> Option<&AncestorKey> {
		self.keys.get(&type_id)
	}

	/// Returns the key for the concrete type behind `value`.
	pub fn key_of_val(&self, value: &dyn Any) -> Option<&AncestorKey> {
		self.key_for(value.type_id())
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}
