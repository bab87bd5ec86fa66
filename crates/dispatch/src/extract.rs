//! Statically declared predicate extraction.
//!
//! Each dimension of a dispatch site pairs a [`polydispatch_registry::Predicate`] with
//! an [`Extractor`] that reads one value out of a [`CallRecord`]. Extraction never
//! inspects anything but the record, which keeps it deterministic and safe to cache.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use polydispatch_registry::{PredicateKey, TypeHierarchy};

use crate::call::{Arg, CallRecord};
use crate::error::ExtractError;


/// Custom extraction function.
pub type ExtractFn = dyn Fn(&CallRecord) -> Result<PredicateKey, ExtractError> + Send + Sync;

/// How one predicate value is read from a call.
#[derive(Clone)]
pub enum Extractor {
	/// The literal value of a named argument.
	Key { arg: Arc<str> },
	/// The declared type of a named instance argument.
	Instance {
		arg: Arc<str>,
		types: Arc<TypeHierarchy>,
	},
	/// A named type argument, looked up in the type hierarchy.
	Class {
		arg: Arc<str>,
		types: Arc<TypeHierarchy>,
	},
	/// Arbitrary derivation from the whole call.
	With(Arc<ExtractFn>),
}

impl Extractor {
	pub fn key(arg: impl Into<Arc<str>>) -> Self {
		Self::Key { arg: arg.into() }
	}

	pub fn instance(arg: impl Into<Arc<str>>, types: Arc<TypeHierarchy>) -> Self {
		Self::Instance {
			arg: arg.into(),
			types,
		}
	}

	pub fn class(arg: impl Into<Arc<str>>, types: Arc<TypeHierarchy>) -> Self {
		Self::Class {
			arg: arg.into(),
			types,
		}
	}

	pub fn with(
		f: impl Fn(&CallRecord) -> Result<PredicateKey, ExtractError> + Send + Sync + 'static,
	) -> Self {
		Self::With(Arc::new(f))
	}

	pub fn extract(&self, call: &CallRecord) -> Result<PredicateKey, ExtractError> {
		match self {
			Self::Key { arg } => match required(call, arg)? {
				Arg::Literal(value) => Ok(PredicateKey::Literal(value.clone())),
				other => Err(wrong_shape(arg, "literal", other)),
			},
			Self::Instance { arg, types } => match required(call, arg)? {
				Arg::Instance(value) => {
					let value: &dyn Any = &**value;
					types
						.key_of_val(value)
						.map(|key| PredicateKey::Ancestor(key.clone()))
						.ok_or_else(|| undeclared(arg))
				}
				other => Err(wrong_shape(arg, "instance", other)),
			},
			Self::Class { arg, types } => match required(call, arg)? {
				Arg::Type(type_id) => types
					.key_for(*type_id)
					.map(|key| PredicateKey::Ancestor(key.clone()))
					.ok_or_else(|| undeclared(arg)),
				other => Err(wrong_shape(arg, "type", other)),
			},
			Self::With(f) => f(call),
		}
	}
}

fn required<'c>(call: &'c CallRecord, arg: &str) -> Result<&'c Arg, ExtractError> {
	call.get(arg).ok_or_else(|| ExtractError::MissingArgument {
		arg: arg.to_string(),
	})
}

fn wrong_shape(arg: &str, expected: &'static str, found: &Arg) -> ExtractError {
	ExtractError::WrongShape {
		arg: arg.to_string(),
		expected,
		found: found.shape(),
	}
}

fn undeclared(arg: &str) -> ExtractError {
	ExtractError::UndeclaredType {
		arg: arg.to_string(),
	}
}

impl fmt::Debug for Extractor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Key { arg } => f.debug_struct("Key").field("arg", arg).finish(),
			Self::Instance { arg, .. } => f.debug_struct("Instance").field("arg", arg).finish(),
			Self::Class { arg, .. } => f.debug_struct("Class").field("arg", arg).finish(),
			Self::With(_) => f.write_str("With(..)"),
		}
	}
}
