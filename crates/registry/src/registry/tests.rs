use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::ancestry::Hierarchy;
use crate::predicate::ANY;
use crate::key;

struct Zoo {
	animals: Hierarchy,
	registry: PredicateRegistry<&'static str>,
}

fn zoo() -> Zoo {
	let mut animals = Hierarchy::new();
	animals.declare("Animal", &[]).expect("declare Animal");
	animals.declare("Elephant", &["Animal"]).expect("declare Elephant");
	animals.declare("Giraffe", &["Animal"]).expect("declare Giraffe");
	animals.declare("Okapi", &["Giraffe"]).expect("declare Okapi");
	animals.declare("Rock", &[]).expect("declare Rock");

	let mut registry = PredicateRegistry::new([
		Predicate::hierarchy("type"),
		Predicate::key("age"),
	]);
	let animal = animals.get("Animal").expect("Animal").clone();
	let elephant = animals.get("Elephant").expect("Elephant").clone();
	registry.register(key![&animal, ANY], "generic").expect("register");
	registry.register(key![&elephant, ANY], "big").expect("register");
	registry
		.register(key![&elephant, "juvenile"], "calf")
		.expect("register");
	Zoo { animals, registry }
}

impl Zoo {
	fn key(&self, animal: &str, age: &str) -> [PredicateKey; 2] {
		key![self.animals.get(animal).expect("declared animal"), age]
	}
}

/// Resolution picks the most specific registered generalization, walking the type
/// ancestry before widening the literal dimension.
#[rstest]
#[case("Elephant", "juvenile", Some("calf"))]
#[case("Elephant", "adult", Some("big"))]
#[case("Giraffe", "adult", Some("generic"))]
#[case("Okapi", "juvenile", Some("generic"))]
#[case("Rock", "adult", None)]
fn test_resolve_closest_match(
	#[case] animal: &str,
	#[case] age: &str,
	#[case] expected: Option<&'static str>,
) {
	let zoo = zoo();
	assert_eq!(zoo.registry.resolve(&zoo.key(animal, age)).copied(), expected);
}

/// `get` never widens: only the exact registered tuple matches.
#[test]
fn test_get_is_exact() {
	let zoo = zoo();
	assert_eq!(zoo.registry.get(&zoo.key("Elephant", "juvenile")), Some(&"calf"));
	assert_eq!(zoo.registry.get(&zoo.key("Elephant", "adult")), None);

	let elephant = zoo.animals.get("Elephant").expect("Elephant");
	assert_eq!(zoo.registry.get(&key![elephant, ANY]), Some(&"big"));
}

/// `all` yields every match most specific first.
#[test]
fn test_all_most_specific_first() {
	let zoo = zoo();
	let found: Vec<_> = zoo
		.registry
		.all(&zoo.key("Elephant", "juvenile"))
		.copied()
		.collect();
	assert_eq!(found, vec!["calf", "big", "generic"]);

	let none: Vec<_> = zoo.registry.all(&zoo.key("Rock", "adult")).collect();
	assert!(none.is_empty());
}

/// A dominating earlier dimension wins ties: `(Elephant, ANY)` beats
/// `(Animal, "juvenile")` because dimension 0 is more specific.
#[test]
fn test_earlier_dimension_dominates() {
	let mut zoo = zoo();
	let animal = zoo.animals.get("Animal").expect("Animal").clone();
	zoo.registry
		.register(key![&animal, "juvenile"], "young animal")
		.expect("register");

	assert_eq!(
		zoo.registry.resolve(&zoo.key("Elephant", "juvenile")),
		Some(&"calf")
	);
	assert_eq!(
		zoo.registry.resolve(&zoo.key("Elephant", "adult")),
		Some(&"big")
	);
	assert_eq!(
		zoo.registry.resolve(&zoo.key("Giraffe", "juvenile")),
		Some(&"young animal")
	);
}

/// The candidate walk advances the rightmost dimension fastest and ends with `ANY`
/// in every dimension.
#[test]
fn test_permutation_order() {
	let mut animals = Hierarchy::new();
	animals.declare("Base", &[]).expect("declare");
	let sub = animals.declare("Sub", &["Base"]).expect("declare");
	let base = animals.get("Base").expect("Base").clone();

	let registry: PredicateRegistry<()> = PredicateRegistry::new([
		Predicate::hierarchy("class"),
		Predicate::key("name"),
	]);

	let walk: Vec<Vec<String>> = registry
		.permutations(&key![&sub, "x"])
		.map(|combo| combo.iter().map(ToString::to_string).collect())
		.collect();
	let expected: Vec<Vec<String>> = [
		[sub.name(), "\"x\""],
		[sub.name(), "*"],
		[base.name(), "\"x\""],
		[base.name(), "*"],
		["*", "\"x\""],
		["*", "*"],
	]
	.iter()
	.map(|row| row.iter().map(ToString::to_string).collect())
	.collect();
	assert_eq!(walk, expected);
}

/// Registering the identical tuple twice replaces the value and leaves exactly one
/// live id behind in every dimension index.
#[test]
fn test_replacement_leaves_no_stale_ids() {
	let mut zoo = zoo();
	let elephant = zoo.animals.get("Elephant").expect("Elephant").clone();
	let before = zoo.registry.len();

	let first = zoo
		.registry
		.register(key![&elephant, "juvenile"], "calf v2")
		.expect("replace");
	let second = zoo
		.registry
		.register(key![&elephant, "juvenile"], "calf v3")
		.expect("replace");

	assert_ne!(first, second);
	assert_eq!(zoo.registry.len(), before);
	assert_eq!(
		zoo.registry.resolve(&zoo.key("Elephant", "juvenile")),
		Some(&"calf v3")
	);

	let found: Vec<_> = zoo
		.registry
		.all(&zoo.key("Elephant", "juvenile"))
		.copied()
		.collect();
	assert_eq!(found, vec!["calf v3", "big", "generic"]);

	for (index, value) in zoo.registry.indexes.iter().zip(&key![&elephant, "juvenile"]) {
		let ids = index.get(value).expect("value indexed");
		assert!(ids.contains(&second));
		assert!(!ids.contains(&first));
	}
}

/// With `Reject`, the second registration fails and the first value stays.
#[test]
fn test_reject_policy() {
	let mut registry =
		PredicateRegistry::new([Predicate::key("name")]).with_policy(DuplicatePolicy::Reject);
	registry.register(key!["a"], 1).expect("first");

	let err = registry.register(key!["a"], 2).expect_err("duplicate");
	assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
	assert_eq!(registry.get(&key!["a"]), Some(&1));
}

#[test]
fn test_arity_mismatch() {
	let mut registry = PredicateRegistry::new([Predicate::key("a"), Predicate::key("b")]);
	let err = registry.register(key!["x"], ()).expect_err("short key");
	assert_eq!(err, RegistryError::ArityMismatch { expected: 2, got: 1 });

	registry.register(key!["x", "y"], ()).expect("register");
	assert_eq!(registry.resolve(&key!["x"]), None);
	assert_eq!(registry.fallback(&key!["x"]), None);
	assert_eq!(registry.all(&key!["x", "y", "z"]).count(), 0);
}

/// Fallback returns the value of the first dimension whose exact value has no
/// registrations, scanning left to right.
#[test]
fn test_fallback_first_unregistered_dimension() {
	let mut registry = PredicateRegistry::new([
		Predicate::key("method").with_fallback("method not allowed"),
		Predicate::key("path").with_fallback("not found"),
	]);
	registry.register(key!["GET", "/"], "index").expect("register");
	registry.register(key!["POST", "/form"], "submit").expect("register");

	assert_eq!(registry.fallback(&key!["PUT", "/"]), Some(&"method not allowed"));
	assert_eq!(registry.fallback(&key!["GET", "/missing"]), Some(&"not found"));
	assert_eq!(registry.fallback(&key!["PUT", "/missing"]), Some(&"method not allowed"));

	// Both values are registered somewhere, so there is no dimension to blame.
	assert_eq!(registry.resolve(&key!["GET", "/form"]), None);
	assert_eq!(registry.fallback(&key!["GET", "/form"]), None);
}

/// A dimension without a configured fallback yields none even when it is the first
/// unregistered one.
#[test]
fn test_fallback_absent() {
	let mut registry = PredicateRegistry::new([
		Predicate::key("a"),
		Predicate::key("b").with_fallback("b"),
	]);
	registry.register(key!["x", "y"], "xy").expect("register");
	assert_eq!(registry.fallback(&key!["nope", "nope"]), None);
	assert_eq!(registry.fallback(&key!["x", "nope"]), Some(&"b"));
}

/// Name-based registration fills omitted dimensions with their defaults.
#[test]
fn test_register_by_name() {
	let mut registry = PredicateRegistry::new([
		Predicate::key("verb"),
		Predicate::key("format").with_default("json"),
		Predicate::key("version"),
	]);
	registry
		.register_by_name([("verb", PredicateKey::from("get"))], "get json")
		.expect("register");

	let key = registry
		.key_by_name([("verb", PredicateKey::from("get"))])
		.expect("key");
	assert_eq!(&*key, &key!["get", "json", ANY]);
	assert_eq!(registry.get(&key), Some(&"get json"));
	assert_eq!(registry.resolve(&key!["get", "json", 2_i64]), Some(&"get json"));
	assert_eq!(registry.resolve(&key!["get", "xml", 2_i64]), None);

	let err = registry
		.register_by_name([("colour", PredicateKey::from("red"))], "nope")
		.expect_err("unknown predicate");
	assert_eq!(
		err,
		RegistryError::UnknownPredicate {
			name: "colour".into()
		}
	);
}

#[test]
fn test_try_new_rejects_duplicate_names() {
	let err = PredicateRegistry::<()>::try_new([Predicate::key("a"), Predicate::key("a")])
		.expect_err("duplicate name");
	assert_eq!(err, RegistryError::DuplicatePredicate { name: "a".into() });
}

/// A registry without dimensions holds at most one value, keyed by the empty tuple.
#[test]
fn test_zero_dimensions() {
	let mut registry = PredicateRegistry::new(std::iter::empty::<Predicate<&str>>());
	assert_eq!(registry.resolve(&[]), None);

	registry.register(Vec::new(), "only").expect("register");
	registry.register(Vec::new(), "replaced").expect("register");
	assert_eq!(registry.len(), 1);
	assert_eq!(registry.get(&[]), Some(&"replaced"));
	assert_eq!(registry.resolve(&[]), Some(&"replaced"));
	assert_eq!(registry.all(&[]).copied().collect::<Vec<_>>(), vec!["replaced"]);
	assert_eq!(registry.fallback(&[]), None);
}

/// Lookup values that are already `ANY` do not revisit the wildcard.
#[test]
fn test_all_with_wildcard_lookup() {
	let mut registry = PredicateRegistry::new([Predicate::key("a"), Predicate::key("b")]);
	registry.register(key!["x", "y"], "xy").expect("register");
	registry.register(key![ANY, "y"], "any-y").expect("register");
	registry.register(key![ANY, ANY], "fallthrough").expect("register");

	let found: Vec<_> = registry.all(&key!["x", "y"]).copied().collect();
	assert_eq!(found, vec!["xy", "any-y", "fallthrough"]);

	let found: Vec<_> = registry.all(&key![ANY, "y"]).copied().collect();
	assert_eq!(found, vec!["any-y", "fallthrough"]);
	assert_eq!(registry.permutations(&key![ANY, "y"]).count(), 2);
}

/// Multiple inheritance resolves along the linearized order: the first declared
/// parent wins over the second.
#[test]
fn test_diamond_resolution() {
	let mut kinds = Hierarchy::new();
	kinds.declare("Object", &[]).expect("declare");
	kinds.declare("Reader", &["Object"]).expect("declare");
	kinds.declare("Writer", &["Object"]).expect("declare");
	let stream = kinds.declare("Stream", &["Reader", "Writer"]).expect("declare");

	let mut registry = PredicateRegistry::new([Predicate::hierarchy("kind")]);
	for name in ["Writer", "Reader", "Object"] {
		let k = kinds.get(name).expect("declared").clone();
		registry.register(key![k], name).expect("register");
	}

	assert_eq!(registry.resolve(&key![&stream]), Some(&"Reader"));
	let order: Vec<_> = registry.all(&key![&stream]).copied().collect();
	assert_eq!(order, vec!["Reader", "Writer", "Object"]);
}

#[test]
fn test_clear_keeps_predicates() {
	let mut zoo = zoo();
	zoo.registry.clear();
	assert!(zoo.registry.is_empty());
	assert_eq!(zoo.registry.arity(), 2);
	assert_eq!(zoo.registry.resolve(&zoo.key("Elephant", "adult")), None);
}

/// Every dimension has candidates, but no single registration covers all of them.
#[rstest]
#[case(key!["GET", "/", "v2"], None)]
#[case(key!["GET", "/", "v1"], Some("index v1"))]
#[case(key!["POST", "/form", "v2"], Some("submit v2"))]
#[case(key!["POST", "/", "v1"], Some("any post"))]
fn test_resolve_across_disjoint_dimensions(
	#[case] key: [PredicateKey; 3],
	#[case] expected: Option<&'static str>,
) {
	let mut registry = PredicateRegistry::new([
		Predicate::key("method"),
		Predicate::key("path"),
		Predicate::key("version"),
	]);
	registry.register(key!["GET", "/", "v1"], "index v1").expect("register");
	registry.register(key!["POST", "/form", "v2"], "submit v2").expect("register");
	registry.register(key!["POST", ANY, "v1"], "any post").expect("register");
	for n in 0..32_i64 {
		registry.register(key!["PUT", n, "v2"], "noise").expect("register");
	}

	assert_eq!(registry.resolve(&key).copied(), expected);
	assert_eq!(registry.all(&key).next().copied(), expected);
}

/// Running out of ids fails the registration and leaves the registry untouched.
#[test]
fn test_ids_exhausted() {
	let mut registry = PredicateRegistry::new([Predicate::key("name")]);
	registry.next_id = u32::MAX - 1;

	let last = registry.register(key!["a"], 1).expect("last id");
	assert_eq!(last.as_u32(), u32::MAX - 1);

	assert_eq!(registry.register(key!["b"], 2), Err(RegistryError::IdsExhausted));
	assert_eq!(registry.register(key!["a"], 3), Err(RegistryError::IdsExhausted));
	assert_eq!(registry.len(), 1);
	assert_eq!(registry.get(&key!["a"]), Some(&1));
	assert_eq!(registry.resolve(&key!["b"]), None);
}
