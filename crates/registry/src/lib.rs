//! Predicate-indexed handler registries.
//!
//! A registry maps tuples of predicate values to handlers and answers "which handler
//! best matches this tuple". Each dimension is either an exact-match key or an
//! ancestor-aware hierarchy; resolution walks every dimension from most to least
//! specific and returns the first registered combination.
//!
//! # Modules
//!
//! - [`ancestry`] - Ancestor keys, C3 linearization and type hierarchies
//! - [`predicate`] - Dimension declarations and key values
//! - [`index`] - Per-dimension indexes and permutation order
//! - [`registry`] - The multi-predicate registry
//! - [`cache`] - Memoizing lookup wrapper and its configuration
//! - [`compose`] - Layered lookups
//! - [`published`] - Lock-free snapshot publication
//!
//! # Example
//!
//! ```
//! use polydispatch_registry::{ANY, Hierarchy, Predicate, PredicateRegistry, key};
//!
//! let mut animals = Hierarchy::new();
//! let animal = animals.declare("Animal", &[]).unwrap();
//! let elephant = animals.declare("Elephant", &["Animal"]).unwrap();
//!
//! let mut registry = PredicateRegistry::new([
//! 	Predicate::hierarchy("type"),
//! 	Predicate::key("age"),
//! ]);
//! registry.register(key![&animal, ANY], "generic").unwrap();
//! registry.register(key![&elephant, "juvenile"], "calf").unwrap();
//!
//! assert_eq!(registry.resolve(&key![&elephant, "juvenile"]), Some(&"calf"));
//! assert_eq!(registry.resolve(&key![&elephant, "adult"]), Some(&"generic"));
//! ```

pub mod ancestry;
pub mod cache;
pub mod compose;
mod error;
pub mod index;
pub mod lookup;
pub mod predicate;
pub mod published;
pub mod registry;

pub use ancestry::{AncestorKey, Hierarchy, KeyId, TypeHierarchy};
pub use cache::{CacheConfig, CacheStats, CacheStrategy, CachingLookup, MethodStats, wrap_cached};
pub use compose::{ChainLookup, ListLookup, compose_chain, compose_list};
pub use error::{AncestorConflictError, ConfigError, RegistryError};
pub use index::HandlerId;
pub use lookup::{DynLookup, Lookup, Matches};
pub use predicate::{ANY, Literal, Predicate, PredicateKey, PredicateKind, display_key};
pub use published::Published;
pub use registry::{AllMatches, DuplicatePolicy, KeyPermutations, PredicateRegistry};
