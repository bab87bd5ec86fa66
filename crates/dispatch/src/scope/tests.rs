use std::sync::Arc;

use polydispatch_registry::{DynLookup, Lookup, Predicate, PredicateRegistry, key};

use super::*;

fn layer(entries: &[(&str, u32)]) -> DynLookup<u32> {
	let mut registry = PredicateRegistry::new([Predicate::key("name")]);
	for (name, value) in entries {
		registry.register(key![*name], *value).expect("register");
	}
	Arc::new(registry)
}

fn resolve(scope: &LookupScope<u32>, name: &str) -> Option<u32> {
	scope.current().resolve(&key![name])
}

#[test]
fn test_current_defaults_to_base() {
	let scope = LookupScope::new(layer(&[("a", 1)]));
	assert_eq!(scope.depth(), 0);
	assert_eq!(resolve(&scope, "a"), Some(1));
	assert!(Arc::ptr_eq(&scope.current(), scope.base()));
}

/// Overrides shadow lower layers and disappear with their guard.
#[test]
fn test_push_and_drop() {
	let scope = LookupScope::new(layer(&[("a", 1), ("b", 2)]));
	{
		let _outer = scope.push(layer(&[("a", 10)]));
		assert_eq!(resolve(&scope, "a"), Some(10));
		assert_eq!(resolve(&scope, "b"), Some(2));
		{
			let _inner = scope.push(layer(&[("b", 20), ("c", 30)]));
			assert_eq!(scope.depth(), 2);
			assert_eq!(resolve(&scope, "a"), Some(10));
			assert_eq!(resolve(&scope, "b"), Some(20));
			assert_eq!(resolve(&scope, "c"), Some(30));
		}
		assert_eq!(scope.depth(), 1);
		assert_eq!(resolve(&scope, "c"), None);
	}
	assert_eq!(scope.depth(), 0);
	assert_eq!(resolve(&scope, "a"), Some(1));
}

/// Dropping an outer guard first also removes everything pushed after it.
#[test]
fn test_out_of_order_drop_truncates() {
	let scope = LookupScope::new(layer(&[("a", 1)]));
	let outer = scope.push(layer(&[("a", 2)]));
	let inner = scope.push(layer(&[("a", 3)]));
	drop(outer);
	assert_eq!(scope.depth(), 0);
	assert_eq!(resolve(&scope, "a"), Some(1));
	drop(inner);
	assert_eq!(scope.depth(), 0);
}

#[test]
fn test_reset() {
	let scope = LookupScope::new(layer(&[("a", 1)]));
	let guard = scope.push(layer(&[("a", 2)]));
	scope.reset();
	assert_eq!(resolve(&scope, "a"), Some(1));
	drop(guard);
	assert_eq!(scope.depth(), 0);
}

/// A lookup taken from the scope stays valid after its guard is gone.
#[test]
fn test_current_outlives_guard() {
	let scope = LookupScope::new(layer(&[]));
	let captured = {
		let _guard = scope.push(layer(&[("a", 5)]));
		scope.current()
	};
	assert_eq!(captured.resolve(&key!["a"]), Some(5));
	assert_eq!(resolve(&scope, "a"), None);
}
