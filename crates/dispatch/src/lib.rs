//! Multiple dispatch over predicate registries.
//!
//! A [`Dispatch`] site declares its dimensions up front, each with an [`Extractor`]
//! that reads a value out of a [`CallRecord`]. Handlers are registered per tuple of
//! dimension values and the most specific match wins.
//!
//! ```
//! use std::sync::Arc;
//!
//! use polydispatch::{CallRecord, Dispatch, PredicateKey, TypeHierarchy, handler};
//!
//! struct Animal;
//! struct Elephant;
//!
//! let mut types = TypeHierarchy::new();
//! let animal = types.declare::<Animal>(&[]).unwrap();
//! let elephant = types.declare_sub::<Elephant, Animal>().unwrap();
//! let types = Arc::new(types);
//!
//! let describe = Dispatch::<String>::builder("describe")
//! 	.match_instance("subject", &types)
//! 	.match_key("age")
//! 	.default_impl(|_| "something".to_string())
//! 	.build()
//! 	.unwrap();
//!
//! describe
//! 	.register(
//! 		[("subject", PredicateKey::from(animal))],
//! 		handler(|_| "an animal".to_string()),
//! 	)
//! 	.unwrap();
//! describe
//! 	.register(
//! 		[
//! 			("subject", PredicateKey::from(elephant)),
//! 			("age", PredicateKey::from("juvenile")),
//! 		],
//! 		handler(|_| "a calf".to_string()),
//! 	)
//! 	.unwrap();
//!
//! let calf = CallRecord::builder()
//! 	.instance("subject", Elephant)
//! 	.arg("age", "juvenile")
//! 	.build();
//! assert_eq!(describe.call(&calf).unwrap(), "a calf");
//!
//! let adult = CallRecord::builder()
//! 	.instance("subject", Elephant)
//! 	.arg("age", "adult")
//! 	.build();
//! assert_eq!(describe.call(&adult).unwrap(), "an animal");
//! ```

mod call;
mod dispatch;
mod error;
mod extract;
mod scope;

pub use call::{Arg, CallBuilder, CallRecord};
pub use dispatch::{
	Dispatch, DispatchBuilder, Handler, LookupEntry, SiteLookup, SiteRegistry, handler,
};
pub use error::{DispatchError, ExtractError};
pub use extract::{ExtractFn, Extractor};
pub use polydispatch_registry::{
	self as registry, ANY, AncestorKey, CacheConfig, CacheStrategy, DuplicatePolicy, HandlerId,
	Hierarchy, Literal, Lookup, Predicate, PredicateKey, PredicateKind, TypeHierarchy, key,
};
pub use scope::{LookupScope, ScopeGuard};

// Only the bench and integration tests use these.
#[cfg(test)]
use {criterion as _, tracing_subscriber as _};
