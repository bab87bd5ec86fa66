use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retention strategy of one cached method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CacheStrategy {
	/// Keep every computed result until cleared.
	#[default]
	Unbounded,
	/// Keep the `capacity` most recently used results. A zero capacity disables
	/// caching.
	Lru { capacity: usize },
	/// Compute on every call.
	Disabled,
}

/// Per-method cache strategies of a [`crate::CachingLookup`].
///
/// ```toml
/// [resolve]
/// strategy = "lru"
/// capacity = 1024
///
/// [all]
/// strategy = "disabled"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
	pub resolve: CacheStrategy,
	pub fallback: CacheStrategy,
	pub all: CacheStrategy,
}

impl CacheConfig {
	/// Same strategy for every method.
	pub const fn uniform(strategy: CacheStrategy) -> Self {
		Self {
			resolve: strategy,
			fallback: strategy,
			all: strategy,
		}
	}

	pub const fn unbounded() -> Self {
		Self::uniform(CacheStrategy::Unbounded)
	}

	/// Bounded LRU with `capacity` entries per method.
	pub const fn lru(capacity: usize) -> Self {
		Self::uniform(CacheStrategy::Lru { capacity })
	}

	pub const fn disabled() -> Self {
		Self::uniform(CacheStrategy::Disabled)
	}

	/// Parses a TOML document; omitted methods are unbounded.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}
}

impl From<CacheStrategy> for CacheConfig {
	fn from(strategy: CacheStrategy) -> Self {
		Self::uniform(strategy)
	}
}

/// `Some(n)` bounds every method to `n` entries, `None` leaves them unbounded.
impl From<Option<usize>> for CacheConfig {
	fn from(capacity: Option<usize>) -> Self {
		match capacity {
			Some(capacity) => Self::lru(capacity),
			None => Self::unbounded(),
		}
	}
}
