//! Explicit lookup context.
//!
//! A [`LookupScope`] supplies the lookup a call site uses when none is passed
//! explicitly. It starts from a base lookup; [`LookupScope::push`] layers an override
//! on top of whatever is current and returns a guard that restores the previous state
//! when dropped. Scopes are ordinary values passed by reference, so their extent is
//! whatever the owner decides.

use std::sync::Arc;

use parking_lot::Mutex;
use polydispatch_registry::{ChainLookup, DynLookup};

#[cfg(test)]
mod tests;

/// Stack of lookup overrides over a base lookup.
pub struct LookupScope<H> {
	base: DynLookup<H>,
	stack: Mutex<Vec<DynLookup<H>>>,
}

impl<H: Clone + Send + Sync + 'static> LookupScope<H> {
	pub fn new(base: DynLookup<H>) -> Self {
		Self {
			base,
			stack: Mutex::new(Vec::new()),
		}
	}

	pub fn base(&self) -> &DynLookup<H> {
		&self.base
	}

	/// The innermost lookup: the latest override composed over everything below it.
	pub fn current(&self) -> DynLookup<H> {
		self.stack
			.lock()
			.last()
			.cloned()
			.unwrap_or_else(|| Arc::clone(&self.base))
	}

	/// Puts `layer` in front of the current lookup until the guard is dropped.
	#[must_use = "the override is removed when the guard is dropped"]
	pub fn push(&self, layer: DynLookup<H>) -> ScopeGuard<'_, H> {
		let mut stack = self.stack.lock();
		let depth = stack.len();
		let below = stack.last().cloned().unwrap_or_else(|| Arc::clone(&self.base));
		stack.push(Arc::new(ChainLookup::new(layer, below)));
		tracing::trace!(depth = depth + 1, "pushed lookup scope");
		ScopeGuard { scope: self, depth }
	}

	/// Number of active overrides.
	pub fn depth(&self) -> usize {
		self.stack.lock().len()
	}

	/// Drops every override, returning to the base lookup.
	pub fn reset(&self) {
		self.stack.lock().clear();
	}
}

/// Restores a [`LookupScope`] to its depth before the matching `push`.
pub struct ScopeGuard<'s, H> {
	scope: &'s LookupScope<H>,
	depth: usize,
}

impl<H> Drop for ScopeGuard<'_, H> {
	fn drop(&mut self) {
		self.scope.stack.lock().truncate(self.depth);
	}
}
