use polydispatch_registry::RegistryError;

/// Failure to derive a predicate value from a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
	#[error("missing argument {arg:?}")]
	MissingArgument { arg: String },
	#[error("argument {arg:?} is a {found}, expected a {expected}")]
	WrongShape {
		arg: String,
		expected: &'static str,
		found: &'static str,
	},
	/// The runtime type of the argument was never declared in the type hierarchy.
	#[error("argument {arg:?} has an undeclared type")]
	UndeclaredType { arg: String },
	#[error("{message}")]
	Custom { message: String },
}

impl ExtractError {
	pub fn custom(message: impl Into<String>) -> Self {
		Self::Custom {
			message: message.into(),
		}
	}
}

/// Dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
	/// Neither a handler, a fallback nor a default exists for the call.
	#[error("no handler found for {dispatch} with key {key}")]
	NoHandlerFound { dispatch: String, key: String },
	#[error(transparent)]
	Extract(#[from] ExtractError),
	#[error(transparent)]
	Registry(#[from] RegistryError),
}
