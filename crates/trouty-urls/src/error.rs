//! Error types for route argument coding and navigation.

use thiserror::Error;

use crate::field::Source;

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Error type for router operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RouterError {
	/// A path parameter had no value while building a path.
	#[error("missing path parameter '{param}' for pattern '{pattern}'")]
	MissingPathParam {
		/// Pattern being built.
		pattern: String,
		/// Placeholder name without a value.
		param: String,
	},

	/// A raw field value could not be converted to its kind.
	#[error("malformed {origin} field '{field}': {reason}")]
	MalformedField {
		/// Field name.
		field: String,
		/// Where the raw value was read from.
		origin: Source,
		/// Parser message.
		reason: String,
	},

	/// A field's validation rejected an absent value.
	#[error("missing required field '{field}'")]
	MissingRequiredField {
		/// Field name.
		field: String,
	},

	/// More than one field of a route reads the hash fragment.
	#[error("route '{path}' declares more than one hash field: {}", .fields.join(", "))]
	AmbiguousHashField {
		/// Path pattern of the offending route.
		path: String,
		/// Every hash-sourced field name, in declaration order.
		fields: Vec<String>,
	},

	/// The store was accessed before one was provided.
	#[error("navigation store used before it was ready")]
	StoreUsedBeforeReady,

	/// A path pattern could not be compiled.
	#[error("invalid route pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// Pattern string.
		pattern: String,
		/// Why it was rejected.
		reason: String,
	},

	/// Two routes were registered under the same name.
	#[error("route '{0}' is registered more than once")]
	DuplicateRoute(String),

	/// No route is registered under this name.
	#[error("unknown route: {0}")]
	UnknownRoute(String),

	/// The route has no field with this name.
	#[error("route '{route}' has no field '{field}'")]
	UnknownField {
		/// Route name.
		route: String,
		/// Field name.
		field: String,
	},

	/// A whole-route update was not an object.
	#[error("invalid update payload: {0}")]
	InvalidPayload(String),

	/// The history collaborator refused a navigation.
	#[error("navigation failed: {0}")]
	NavigationFailed(String),
}

/// Outcome of a failed field validation.
///
/// Validators do not know the field they are attached to; the codec lifts
/// these into [`RouterError`] with the field name and source filled in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
	/// The field is required and no value was present.
	#[error("value is required")]
	Missing,
	/// The value was present but rejected.
	#[error("{0}")]
	Invalid(String),
}

impl FieldError {
	pub(crate) fn into_router_error(self, field: &str, origin: Source) -> RouterError {
		match self {
			Self::Missing => RouterError::MissingRequiredField {
				field: field.to_string(),
			},
			Self::Invalid(reason) => RouterError::MalformedField {
				field: field.to_string(),
				origin,
				reason,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_missing_path_param_display() {
		let err = RouterError::MissingPathParam {
			pattern: "/foo/:id".to_string(),
			param: "id".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"missing path parameter 'id' for pattern '/foo/:id'"
		);
	}

	#[rstest]
	fn test_ambiguous_hash_display_lists_fields() {
		let err = RouterError::AmbiguousHashField {
			path: "/foo".to_string(),
			fields: vec!["a".to_string(), "b".to_string()],
		};
		assert!(err.to_string().contains("a, b"));
	}

	#[rstest]
	#[case(FieldError::Missing, "missing required field 'x'")]
	#[case(FieldError::Invalid("nope".to_string()), "malformed query field 'x': nope")]
	fn test_field_error_lifting(#[case] err: FieldError, #[case] expected: &str) {
		assert_eq!(
			err.into_router_error("x", Source::Query).to_string(),
			expected
		);
	}
}
