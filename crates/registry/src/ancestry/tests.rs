use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::Index;

use super::*;

fn names<'a>(keys: impl IntoIterator<Item = &'a AncestorKey>) -> Vec<&'a str> {
	keys.into_iter().map(AncestorKey::name).collect()
}

fn is_subsequence(needle: &[&AncestorKey], haystack: &[&AncestorKey]) -> bool {
	let mut rest = haystack.iter();
	needle.iter().all(|n| rest.any(|h| h == n))
}

/// A root key's ancestors are just itself.
#[test]
fn test_root_key() {
	let root = AncestorKey::root("Object");
	assert_eq!(names(root.ancestors()), vec!["Object"]);
	assert!(root.lineage().is_empty());
	assert_eq!(root.depth(), 1);
}

/// Single inheritance chains walk straight up.
#[test]
fn test_single_chain() {
	let mut h = Hierarchy::new();
	h.declare("Animal", &[]).expect("declare");
	h.declare("Mammal", &["Animal"]).expect("declare");
	let elephant = h.declare("Elephant", &["Mammal"]).expect("declare");

	assert_eq!(names(elephant.ancestors()), vec!["Elephant", "Mammal", "Animal"]);
	assert!(elephant.is_a(h.get("Animal").expect("Animal")));
	assert!(!h.get("Animal").expect("Animal").is_a(&elephant));
}

/// The classic diamond: shared ancestors come after every path that reaches them.
#[test]
fn test_diamond_linearization() {
	let mut h = Hierarchy::new();
	h.declare("O", &[]).expect("declare");
	h.declare("A", &["O"]).expect("declare");
	h.declare("B", &["O"]).expect("declare");
	h.declare("C", &["O"]).expect("declare");
	h.declare("D", &["O"]).expect("declare");
	h.declare("E", &["O"]).expect("declare");
	h.declare("K1", &["A", "B", "C"]).expect("declare");
	h.declare("K2", &["D", "B", "E"]).expect("declare");
	h.declare("K3", &["D", "A"]).expect("declare");
	let z = h.declare("Z", &["K1", "K2", "K3"]).expect("declare");

	assert_eq!(
		names(z.ancestors()),
		vec!["Z", "K1", "K2", "K3", "D", "A", "B", "C", "E", "O"]
	);
}

/// Parents that disagree on the order of shared ancestors are rejected.
#[test]
fn test_inconsistent_order_is_rejected() {
	let mut h = Hierarchy::new();
	h.declare("A", &[]).expect("declare");
	h.declare("B", &[]).expect("declare");
	h.declare("X", &["A", "B"]).expect("declare");
	h.declare("Y", &["B", "A"]).expect("declare");

	let err = h.declare("Z", &["X", "Y"]).expect_err("inconsistent");
	assert!(matches!(err, AncestorConflictError::Inconsistent { ref key, .. } if key == "Z"));
	assert!(h.get("Z").is_none());
}

#[test]
fn test_declare_errors() {
	let mut h = Hierarchy::new();
	h.declare("A", &[]).expect("declare");

	assert_eq!(
		h.declare("A", &[]).expect_err("twice"),
		AncestorConflictError::AlreadyDeclared { key: "A".into() }
	);
	assert_eq!(
		h.declare("B", &["Missing"]).expect_err("unknown parent"),
		AncestorConflictError::UnknownParent {
			key: "B".into(),
			parent: "Missing".into()
		}
	);
	assert_eq!(
		h.declare("C", &["A", "A"]).expect_err("duplicate parent"),
		AncestorConflictError::DuplicateParent {
			key: "C".into(),
			parent: "A".into()
		}
	);
	assert_eq!(h.len(), 1);
}

/// Identity is per declaration, not per name.
#[test]
fn test_identity_is_not_name() {
	let a = AncestorKey::root("Same");
	let b = AncestorKey::root("Same");
	assert_ne!(a, b);
	assert_eq!(a, a.clone());
	assert_ne!(a.id(), b.id());
}

#[test]
fn test_hierarchy_lookup() {
	let mut h = Hierarchy::new();
	let a = h.declare("A", &[]).expect("declare");
	let b = h.declare("B", &["A"]).expect("declare");

	assert_eq!(h.slot(0), Some(&a));
	assert_eq!(h.slot(1), Some(&b));
	assert_eq!(h.get("B"), Some(&b));
	assert_eq!(names(h.iter()), vec!["A", "B"]);
	assert_eq!(b.parents(), std::slice::from_ref(&a));
}

struct Shape;
struct Circle;
struct Unit;

#[test]
fn test_type_hierarchy() {
	let mut types = TypeHierarchy::new();
	types.declare::<Shape>(&[]).expect("declare");
	let circle = types.declare_sub::<Circle, Shape>().expect("declare");

	assert_eq!(types.key_of::<Circle>(), Some(&circle));
	assert!(circle.is_a(types.key_of::<Shape>().expect("Shape")));

	let value: Box<dyn std::any::Any> = Box::new(Circle);
	assert_eq!(types.key_of_val(value.as_ref()), Some(&circle));

	assert!(types.key_of::<Unit>().is_none());
	assert!(matches!(
		types.declare_sub::<Unit, u8>(),
		Err(AncestorConflictError::UnknownParent { .. })
	));
	assert!(matches!(
		types.declare::<Circle>(&[]),
		Err(AncestorConflictError::AlreadyDeclared { .. })
	));
}

proptest! {
	/// Every successfully declared key lists itself first, has no repeated ancestors,
	/// and preserves each parent's ancestor order.
	#[test]
	fn prop_ancestor_monotonicity(
		shape in prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..16)
	) {
		let mut declared: Vec<AncestorKey> = Vec::new();
		for (i, picks) in shape.iter().enumerate() {
			let mut parents: Vec<AncestorKey> = Vec::new();
			if i > 0 {
				for pick in picks {
					let parent = &declared[pick.index(i)];
					if !parents.contains(parent) {
						parents.push(parent.clone());
					}
				}
			}
			let key = AncestorKey::new(format!("k{i}"), &parents)
				.unwrap_or_else(|_| AncestorKey::root(format!("k{i}")));
			declared.push(key);
		}

		for key in &declared {
			let chain: Vec<&AncestorKey> = key.ancestors().collect();
			prop_assert_eq!(chain[0], key);
			for (i, k) in chain.iter().enumerate() {
				prop_assert!(!chain[i + 1..].contains(k), "{} repeats in {:?}", k, chain);
			}
			for parent in key.parents() {
				let parent_chain: Vec<&AncestorKey> = parent.ancestors().collect();
				prop_assert!(is_subsequence(&parent_chain, &chain));
			}
			let parent_positions: Vec<usize> = key
				.parents()
				.iter()
				.map(|p| chain.iter().position(|k| *k == p).unwrap_or(usize::MAX))
				.collect();
			prop_assert!(parent_positions.windows(2).all(|w| w[0] < w[1]));
		}
	}
}
