//! Dispatch sites.
//!
//! # Role
//!
//! A [`Dispatch`] binds a predicate registry of handlers to calls. A call is turned into
//! a lookup key by the site's extractors, then resolved in order:
//!
//! 1. the most specific registered handler,
//! 2. the fallback of the first dimension with no registrations for its value,
//! 3. the site's default implementation,
//! 4. [`DispatchError::NoHandlerFound`].
//!
//! # Mental Model
//!
//! The site publishes one snapshot holding both the registry and the cache built over
//! it. Registration clones the registry, registers into the copy and publishes it
//! together with a fresh, empty cache, so a cache never answers for a registry it was
//! not built over. Calls in flight keep using the snapshot they loaded.
//!
//! Each publication copies the whole registry. Setup code registering many handlers
//! goes through [`Dispatch::register_many`] or [`Dispatch::update`], which copy and
//! publish once per batch.
//!
//! # Invariants
//!
//! - Cache and registry are swapped together.
//!   - Enforced in: `Dispatch::update`.
//!   - Tested by: `dispatch::tests::test_registration_discards_cache`.
//! - Extraction failures are reported, never treated as "no handler".
//!   - Tested by: `dispatch::tests::test_extraction_errors_propagate`.

use std::fmt;
use std::sync::Arc;

use polydispatch_registry::{
	CacheConfig, CachingLookup, DuplicatePolicy, HandlerId, Lookup, Predicate, PredicateKey,
	PredicateKind, PredicateRegistry, Published, RegistryError, TypeHierarchy, display_key,
};

use crate::call::CallRecord;
use crate::error::{DispatchError, ExtractError};
use crate::extract::Extractor;
use crate::scope::LookupScope;


/// A registered implementation.
pub type Handler<R> = Arc<dyn Fn(&CallRecord) -> R + Send + Sync>;

/// Registry of one dispatch site.
pub type SiteRegistry<R> = PredicateRegistry<Handler<R>>;

/// Cached lookup published by a dispatch site.
pub type SiteLookup<R> = CachingLookup<Arc<SiteRegistry<R>>>;

/// Wraps a closure as a [`Handler`].
pub fn handler<R, F>(f: F) -> Handler<R>
where
	F: Fn(&CallRecord) -> R + Send + Sync + 'static,
{
	Arc::new(f)
}

struct SiteState<R: 'static> {
	registry: Arc<SiteRegistry<R>>,
	lookup: Arc<SiteLookup<R>>,
}

impl<R: 'static> SiteState<R> {
	fn new(registry: SiteRegistry<R>, cache: &CacheConfig) -> Self {
		let registry = Arc::new(registry);
		let lookup = Arc::new(CachingLookup::new(Arc::clone(&registry), cache.clone()));
		Self { registry, lookup }
	}
}

impl<R: 'static> Clone for SiteState<R> {
	fn clone(&self) -> Self {
		Self {
			registry: Arc::clone(&self.registry),
			lookup: Arc::clone(&self.lookup),
		}
	}
}

/// Builder for [`Dispatch`].
pub struct DispatchBuilder<R: 'static> {
	name: Arc<str>,
	predicates: Vec<Predicate<Handler<R>>>,
	extractors: Vec<Extractor>,
	default: Option<Handler<R>>,
	cache: CacheConfig,
	policy: DuplicatePolicy,
}

impl<R: 'static> DispatchBuilder<R> {
	fn new(name: Arc<str>) -> Self {
		Self {
			name,
			predicates: Vec::new(),
			extractors: Vec::new(),
			default: None,
			cache: CacheConfig::default(),
			policy: DuplicatePolicy::default(),
		}
	}

	/// Adds a dimension. Dimensions added earlier dominate ties.
	pub fn predicate(mut self, predicate: Predicate<Handler<R>>, extractor: Extractor) -> Self {
		self.predicates.push(predicate);
		self.extractors.push(extractor);
		self
	}

	/// Exact match on the literal argument of the same name.
	pub fn match_key(self, name: impl Into<Arc<str>>) -> Self {
		let name = name.into();
		self.predicate(Predicate::key(Arc::clone(&name)), Extractor::key(name))
	}

	/// Ancestor match on the runtime type of the instance argument of the same name.
	pub fn match_instance(self, name: impl Into<Arc<str>>, types: &Arc<TypeHierarchy>) -> Self {
		let name = name.into();
		self.predicate(
			Predicate::hierarchy(Arc::clone(&name)),
			Extractor::instance(name, Arc::clone(types)),
		)
	}

	/// Ancestor match on the type argument of the same name.
	pub fn match_class(self, name: impl Into<Arc<str>>, types: &Arc<TypeHierarchy>) -> Self {
		let name = name.into();
		self.predicate(
			Predicate::hierarchy(Arc::clone(&name)),
			Extractor::class(name, Arc::clone(types)),
		)
	}

	/// Dimension whose value is computed from the whole call.
	pub fn match_with(
		self,
		name: impl Into<Arc<str>>,
		kind: PredicateKind,
		f: impl Fn(&CallRecord) -> Result<PredicateKey, ExtractError> + Send + Sync + 'static,
	) -> Self {
		self.predicate(Predicate::new(name, kind), Extractor::with(f))
	}

	/// Implementation used when no handler or fallback matches.
	pub fn default_impl(mut self, f: impl Fn(&CallRecord) -> R + Send + Sync + 'static) -> Self {
		self.default = Some(handler(f));
		self
	}

	pub fn cache(mut self, config: impl Into<CacheConfig>) -> Self {
		self.cache = config.into();
		self
	}

	pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Fails if two dimensions share a name.
	pub fn build(self) -> Result<Dispatch<R>, RegistryError> {
		let registry = PredicateRegistry::try_new(self.predicates)?.with_policy(self.policy);
		tracing::debug!(
			dispatch = %self.name,
			arity = registry.arity(),
			"built dispatch site"
		);
		Ok(Dispatch {
			state: Published::new(SiteState::new(registry, &self.cache)),
			name: self.name,
			extractors: self.extractors.into(),
			default: self.default,
			cache: self.cache,
		})
	}
}

/// A multiple-dispatch site.
pub struct Dispatch<R: 'static> {
	name: Arc<str>,
	extractors: Box<[Extractor]>,
	default: Option<Handler<R>>,
	cache: CacheConfig,
	state: Published<SiteState<R>>,
}

impl<R: 'static> Dispatch<R> {
	pub fn builder(name: impl Into<Arc<str>>) -> DispatchBuilder<R> {
		DispatchBuilder::new(name.into())
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Current registry snapshot.
	pub fn registry(&self) -> Arc<SiteRegistry<R>> {
		Arc::clone(&self.state.load().registry)
	}

	/// Current cached lookup. Replaced on every registration.
	pub fn lookup(&self) -> Arc<SiteLookup<R>> {
		Arc::clone(&self.state.load().lookup)
	}

	/// Extracts the lookup key of `call`.
	pub fn key(&self, call: &CallRecord) -> Result<Box<[PredicateKey]>, ExtractError> {
		self.extractors.iter().map(|e| e.extract(call)).collect()
	}

	/// Registers `handler` under predicate values given by name; omitted predicates
	/// take their default.
	pub fn register<'n>(
		&self,
		pairs: impl IntoIterator<Item = (&'n str, PredicateKey)>,
		handler: Handler<R>,
	) -> Result<HandlerId, RegistryError> {
		let key = self.state.load().registry.key_by_name(pairs)?;
		self.register_key(key.into_vec(), handler)
	}

	/// Registers `handler` under an explicit key tuple.
	pub fn register_key(
		&self,
		key: impl IntoIterator<Item = PredicateKey>,
		handler: Handler<R>,
	) -> Result<HandlerId, RegistryError> {
		let key: Vec<PredicateKey> = key.into_iter().collect();
		let id = self.update(|registry| registry.register(key.iter().cloned(), Arc::clone(&handler)))?;
		tracing::debug!(
			dispatch = %self.name,
			key = %display_key(&key),
			id = id.as_u32(),
			"registered handler"
		);
		Ok(id)
	}

	/// Registers every `(key, handler)` pair in one publication.
	///
	/// Either all pairs are registered or, on the first error, none are.
	pub fn register_many<K>(
		&self,
		entries: impl IntoIterator<Item = (K, Handler<R>)>,
	) -> Result<Vec<HandlerId>, RegistryError>
	where
		K: IntoIterator<Item = PredicateKey>,
	{
		let entries: Vec<(Box<[PredicateKey]>, Handler<R>)> = entries
			.into_iter()
			.map(|(key, handler)| (key.into_iter().collect(), handler))
			.collect();
		let ids = self.update(|registry| {
			entries
				.iter()
				.map(|(key, handler)| registry.register(key.iter().cloned(), Arc::clone(handler)))
				.collect::<Result<Vec<_>, _>>()
		})?;
		tracing::debug!(dispatch = %self.name, count = ids.len(), "registered handlers");
		Ok(ids)
	}

	/// Drops every registration.
	pub fn clean(&self) {
		self.state.update(|state| {
			let mut registry = SiteRegistry::clone(&state.registry);
			registry.clear();
			*state = SiteState::new(registry, &self.cache);
		});
		tracing::debug!(dispatch = %self.name, "cleared registrations");
	}

	/// Applies `f` to a copy of the registry and publishes the result with a fresh
	/// cache. Nothing is published if `f` fails. `f` may run again if another
	/// registration lands concurrently.
	pub fn update<T>(
		&self,
		mut f: impl FnMut(&mut SiteRegistry<R>) -> Result<T, RegistryError>,
	) -> Result<T, RegistryError> {
		self.state.try_update(|state| {
			let mut registry = SiteRegistry::clone(&state.registry);
			let out = f(&mut registry)?;
			*state = SiteState::new(registry, &self.cache);
			Ok(out)
		})
	}

	/// Dispatches `call` through the site's own lookup.
	pub fn call(&self, call: &CallRecord) -> Result<R, DispatchError> {
		let lookup = self.lookup();
		self.call_in(&*lookup, call)
	}

	/// Dispatches `call` through an explicit lookup.
	pub fn call_in<L>(&self, lookup: &L, call: &CallRecord) -> Result<R, DispatchError>
	where
		L: Lookup<Handler = Handler<R>> + ?Sized,
	{
		let key = self.key(call)?;
		match self.select(lookup, &key) {
			Some(handler) => Ok(handler(call)),
			None => Err(DispatchError::NoHandlerFound {
				dispatch: self.name.to_string(),
				key: display_key(&key),
			}),
		}
	}

	/// Dispatches `call` through the current lookup of `scope`.
	pub fn call_scoped(
		&self,
		scope: &LookupScope<Handler<R>>,
		call: &CallRecord,
	) -> Result<R, DispatchError> {
		let lookup = scope.current();
		self.call_in(&*lookup, call)
	}

	/// Like [`Self::call`], returning `default` instead of
	/// [`DispatchError::NoHandlerFound`]. The caller's value takes precedence over the
	/// site's default implementation.
	pub fn call_or(&self, call: &CallRecord, default: R) -> Result<R, DispatchError> {
		let key = self.key(call)?;
		let lookup = self.lookup();
		let found = lookup.resolve(&key).or_else(|| lookup.fallback(&key));
		Ok(match found {
			Some(handler) => handler(call),
			None => default,
		})
	}

	fn select<L>(&self, lookup: &L, key: &[PredicateKey]) -> Option<Handler<R>>
	where
		L: Lookup<Handler = Handler<R>> + ?Sized,
	{
		if let Some(handler) = lookup.resolve(key) {
			return Some(handler);
		}
		if let Some(handler) = lookup.fallback(key) {
			tracing::trace!(dispatch = %self.name, key = %display_key(key), "using predicate fallback");
			return Some(handler);
		}
		if self.default.is_some() {
			tracing::trace!(dispatch = %self.name, key = %display_key(key), "using default implementation");
		}
		self.default.clone()
	}

	/// The registered handler `call` resolves to, without fallbacks.
	pub fn component(&self, call: &CallRecord) -> Result<Option<Handler<R>>, DispatchError> {
		let key = self.key(call)?;
		Ok(self.lookup().resolve(&key))
	}

	/// The predicate fallback for `call`, if any dimension has no registrations for
	/// its value.
	pub fn fallback(&self, call: &CallRecord) -> Result<Option<Handler<R>>, DispatchError> {
		let key = self.key(call)?;
		Ok(self.lookup().fallback(&key))
	}

	/// Every handler matching `call`, most specific first.
	pub fn all(&self, call: &CallRecord) -> Result<Vec<Handler<R>>, DispatchError> {
		let key = self.key(call)?;
		Ok(self.lookup().all_shared(&key).to_vec())
	}

	/// Resolution view of the key extracted from `call`.
	pub fn by_args(&self, call: &CallRecord) -> Result<LookupEntry<R>, DispatchError> {
		let key = self.key(call)?;
		Ok(self.entry(key))
	}

	/// Resolution view of a key given by predicate name.
	pub fn by_predicates<'n>(
		&self,
		pairs: impl IntoIterator<Item = (&'n str, PredicateKey)>,
	) -> Result<LookupEntry<R>, DispatchError> {
		let key = self.state.load().registry.key_by_name(pairs)?;
		Ok(self.entry(key))
	}

	fn entry(&self, key: Box<[PredicateKey]>) -> LookupEntry<R> {
		LookupEntry {
			key,
			lookup: self.lookup(),
		}
	}
}

impl<R: 'static> fmt::Debug for Dispatch<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.load();
		f.debug_struct("Dispatch")
			.field("name", &self.name)
			.field("extractors", &self.extractors)
			.field("registrations", &state.registry.len())
			.field("has_default", &self.default.is_some())
			.finish()
	}
}

/// Resolution of one key against the snapshot current when it was created.
pub struct LookupEntry<R: 'static> {
	key: Box<[PredicateKey]>,
	lookup: Arc<SiteLookup<R>>,
}

impl<R: 'static> LookupEntry<R> {
	pub fn key(&self) -> &[PredicateKey] {
		&self.key
	}

	pub fn component(&self) -> Option<Handler<R>> {
		self.lookup.resolve(&self.key)
	}

	pub fn fallback(&self) -> Option<Handler<R>> {
		self.lookup.fallback(&self.key)
	}

	/// Every matching handler, most specific first.
	pub fn matches(&self) -> Vec<Handler<R>> {
		self.lookup.all_shared(&self.key).to_vec()
	}

	/// True if a registered handler matches, fallbacks aside.
	pub fn is_found(&self) -> bool {
		self.component().is_some()
	}
}

impl<R: 'static> fmt::Debug for LookupEntry<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LookupEntry")
			.field("key", &display_key(&self.key))
			.finish()
	}
}
