/// Failure to build an ancestor chain.
///
/// Raised at setup time only; a key that was constructed successfully never fails
/// later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AncestorConflictError {
	/// Parents disagree on the relative order of shared ancestors.
	#[error("cannot linearize ancestors of {key:?}: no consistent order for {remaining:?}")]
	Inconsistent { key: String, remaining: Vec<String> },
	/// The same parent was listed twice.
	#[error("{key:?} lists parent {parent:?} more than once")]
	DuplicateParent { key: String, parent: String },
	/// A parent name was not declared in the hierarchy.
	#[error("{key:?} names undeclared parent {parent:?}")]
	UnknownParent { key: String, parent: String },
	/// The name or type was declared before.
	#[error("{key:?} is already declared")]
	AlreadyDeclared { key: String },
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// The key tuple length differs from the number of predicates.
	#[error("key has {got} values but the registry has {expected} predicates")]
	ArityMismatch { expected: usize, got: usize },
	/// The exact key is already registered and the policy rejects replacement.
	#[error("duplicate registration for key {key}")]
	DuplicateRegistration { key: String },
	/// A name-based key referenced a predicate the registry does not have.
	#[error("unknown predicate {name:?}")]
	UnknownPredicate { name: String },
	/// Two predicates share a name.
	#[error("predicate {name:?} is declared more than once")]
	DuplicatePredicate { name: String },
	/// Every handler id has been handed out.
	#[error("registry has run out of handler ids")]
	IdsExhausted,
}

/// Cache configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid cache config: {0}")]
	Toml(#[from] toml::de::Error),
}
