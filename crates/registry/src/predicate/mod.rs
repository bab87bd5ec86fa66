//! Predicate dimensions and the values registered along them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ancestry::AncestorKey;
use crate::index::{HierarchyIndex, KeyIndex, PredicateIndex};


/// Immutable value of an exact-match dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
	Unit,
	Bool(bool),
	Int(i64),
	Char(char),
	Str(Arc<str>),
}

impl Literal {
	/// Returns the string value if this is a `Str` variant.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Literal::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the integer value if this is an `Int` variant.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Literal::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the boolean value if this is a `Bool` variant.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Literal::Bool(v) => Some(*v),
			_ => None,
		}
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Literal::Unit => f.write_str("()"),
			Literal::Bool(v) => write!(f, "{v}"),
			Literal::Int(v) => write!(f, "{v}"),
			Literal::Char(v) => write!(f, "{v:?}"),
			Literal::Str(v) => write!(f, "{v:?}"),
		}
	}
}

impl From<()> for Literal {
	fn from(_: ()) -> Self {
		Literal::Unit
	}
}

impl From<bool> for Literal {
	fn from(v: bool) -> Self {
		Literal::Bool(v)
	}
}

impl From<i64> for Literal {
	fn from(v: i64) -> Self {
		Literal::Int(v)
	}
}

impl From<i32> for Literal {
	fn from(v: i32) -> Self {
		Literal::Int(v.into())
	}
}

impl From<char> for Literal {
	fn from(v: char) -> Self {
		Literal::Char(v)
	}
}

impl From<&str> for Literal {
	fn from(v: &str) -> Self {
		Literal::Str(v.into())
	}
}

impl From<String> for Literal {
	fn from(v: String) -> Self {
		Literal::Str(v.into())
	}
}

impl From<Arc<str>> for Literal {
	fn from(v: Arc<str>) -> Self {
		Literal::Str(v)
	}
}

/// One dimension value of a registration or lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PredicateKey {
	/// Dimension unconstrained; the least specific value of every dimension.
	Any,
	Literal(Literal),
	Ancestor(AncestorKey),
}

/// Wildcard sentinel.
pub const ANY: PredicateKey = PredicateKey::Any;

impl PredicateKey {
	pub fn is_any(&self) -> bool {
		matches!(self, PredicateKey::Any)
	}

	pub fn as_literal(&self) -> Option<&Literal> {
		match self {
			PredicateKey::Literal(l) => Some(l),
			_ => None,
		}
	}

	pub fn as_ancestor(&self) -> Option<&AncestorKey> {
		match self {
			PredicateKey::Ancestor(k) => Some(k),
			_ => None,
		}
	}
}

impl fmt::Display for PredicateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PredicateKey::Any => f.write_str("*"),
			PredicateKey::Literal(l) => l.fmt(f),
			PredicateKey::Ancestor(k) => k.fmt(f),
		}
	}
}

impl From<Literal> for PredicateKey {
	fn from(v: Literal) -> Self {
		PredicateKey::Literal(v)
	}
}

impl From<AncestorKey> for PredicateKey {
	fn from(v: AncestorKey) -> Self {
		PredicateKey::Ancestor(v)
	}
}

impl From<&AncestorKey> for PredicateKey {
	fn from(v: &AncestorKey) -> Self {
		PredicateKey::Ancestor(v.clone())
	}
}

macro_rules! literal_into_key {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for PredicateKey {
				fn from(v: $ty) -> Self {
					PredicateKey::Literal(Literal::from(v))
				}
			}
		)*
	};
}

literal_into_key!(bool, i64, i32, char, &str, String, Arc<str>);

/// Builds a key tuple from heterogeneous values.
///
/// ```ignore
/// let key = key![elephant, "juvenile", ANY];
/// ```
#[macro_export]
macro_rules! key {
	($($value:expr),* $(,)?) => {
		[$($crate::PredicateKey::from($value)),*]
	};
}

/// Formats a key tuple as `(a, b, c)`.
pub fn display_key(key: &[PredicateKey]) -> String {
	let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
	format!("({})", parts.join(", "))
}

/// How a dimension matches values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
	/// Exact equality; permutations are the value then `ANY`.
	Key,
	/// Ancestor containment; permutations walk the ancestor chain then `ANY`.
	Hierarchy,
}

/// A declared dispatch dimension.
#[derive(Clone)]
pub struct Predicate<H> {
	name: Arc<str>,
	kind: PredicateKind,
	fallback: Option<H>,
	default: PredicateKey,
}

impl<H> Predicate<H> {
	/// Declares an exact-match dimension.
	pub fn key(name: impl Into<Arc<str>>) -> Self {
		Self::new(name, PredicateKind::Key)
	}

	/// Declares an ancestor-match dimension.
	pub fn hierarchy(name: impl Into<Arc<str>>) -> Self {
		Self::new(name, PredicateKind::Hierarchy)
	}

	pub fn new(name: impl Into<Arc<str>>, kind: PredicateKind) -> Self {
		Self {
			name: name.into(),
			kind,
			fallback: None,
			default: PredicateKey::Any,
		}
	}

	/// Value returned by `fallback` when this is the first dimension without
	/// registrations for the looked-up value.
	pub fn with_fallback(mut self, fallback: H) -> Self {
		self.fallback = Some(fallback);
		self
	}

	/// Value used when a name-based registration omits this dimension.
	pub fn with_default(mut self, default: impl Into<PredicateKey>) -> Self {
		self.default = default.into();
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> PredicateKind {
		self.kind
	}

	pub fn fallback(&self) -> Option<&H> {
		self.fallback.as_ref()
	}

	pub fn default_key(&self) -> &PredicateKey {
		&self.default
	}

	/// Creates an empty index matching this dimension's kind.
	pub fn create_index(&self) -> PredicateIndex {
		match self.kind {
			PredicateKind::Key => PredicateIndex::Key(KeyIndex::default()),
			PredicateKind::Hierarchy => PredicateIndex::Hierarchy(HierarchyIndex::default()),
		}
	}
}

impl<H> fmt::Debug for Predicate<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Predicate")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("has_fallback", &self.fallback.is_some())
			.field("default", &self.default)
			.finish()
	}
}
