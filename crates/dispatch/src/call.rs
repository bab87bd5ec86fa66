//! Call records: the named arguments a dispatch site extracts predicate values from.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use polydispatch_registry::Literal;
use rustc_hash::FxHashMap;

/// One named argument.
#[derive(Clone)]
pub enum Arg {
	/// A plain value, matched by equality.
	Literal(Literal),
	/// A value matched by its runtime type.
	Instance(Arc<dyn Any + Send + Sync>),
	/// A type itself, matched against its declared ancestors.
	Type(TypeId),
}

impl Arg {
	pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
		Arg::Instance(Arc::new(value))
	}

	pub fn class<T: Any>() -> Self {
		Arg::Type(TypeId::of::<T>())
	}

	/// Short shape name used in error messages.
	pub fn shape(&self) -> &'static str {
		match self {
			Arg::Literal(_) => "literal",
			Arg::Instance(_) => "instance",
			Arg::Type(_) => "type",
		}
	}
}

impl fmt::Debug for Arg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Arg::Literal(l) => f.debug_tuple("Literal").field(l).finish(),
			Arg::Instance(_) => f.write_str("Instance(..)"),
			Arg::Type(id) => f.debug_tuple("Type").field(id).finish(),
		}
	}
}

impl From<Literal> for Arg {
	fn from(value: Literal) -> Self {
		Arg::Literal(value)
	}
}

macro_rules! literal_arg {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Arg {
				fn from(value: $ty) -> Self {
					Arg::Literal(Literal::from(value))
				}
			}
		)*
	};
}

literal_arg!((), bool, i64, i32, char, &str, String, Arc<str>);

/// Immutable mapping from argument name to [`Arg`].
///
/// Extraction is a pure function of the record, so identical records always produce
/// identical lookup keys.
#[derive(Clone, Default)]
pub struct CallRecord {
	args: FxHashMap<Arc<str>, Arg>,
}

impl CallRecord {
	pub fn builder() -> CallBuilder {
		CallBuilder::default()
	}

	pub fn get(&self, name: &str) -> Option<&Arg> {
		self.args.get(name)
	}

	pub fn literal(&self, name: &str) -> Option<&Literal> {
		match self.args.get(name)? {
			Arg::Literal(l) => Some(l),
			_ => None,
		}
	}

	/// Borrows an instance argument as `T`.
	pub fn downcast<T: Any>(&self, name: &str) -> Option<&T> {
		match self.args.get(name)? {
			Arg::Instance(value) => value.downcast_ref::<T>(),
			_ => None,
		}
	}

	pub fn len(&self) -> usize {
		self.args.len()
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}
}

impl fmt::Debug for CallRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<&Arc<str>> = self.args.keys().collect();
		names.sort();
		let mut map = f.debug_map();
		for name in names {
			map.entry(name, &self.args[name]);
		}
		map.finish()
	}
}

/// Builder for [`CallRecord`]. Later arguments replace earlier ones of the same name.
#[derive(Default)]
pub struct CallBuilder {
	args: FxHashMap<Arc<str>, Arg>,
}

impl CallBuilder {
	pub fn arg(mut self, name: impl Into<Arc<str>>, value: impl Into<Arg>) -> Self {
		self.args.insert(name.into(), value.into());
		self
	}

	pub fn instance<T: Any + Send + Sync>(self, name: impl Into<Arc<str>>, value: T) -> Self {
		self.arg(name, Arg::instance(value))
	}

	pub fn class<T: Any>(self, name: impl Into<Arc<str>>) -> Self {
		self.arg(name, Arg::class::<T>())
	}

	pub fn build(self) -> CallRecord {
		CallRecord { args: self.args }
	}
}
