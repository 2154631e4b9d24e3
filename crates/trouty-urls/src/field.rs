//! Per-argument field descriptors.
//!
//! A [`FieldDescriptor`] says where an argument lives in a location
//! ([`Source`]), how its raw text converts to a value ([`Kind`]) and what an
//! absent value means ([`Validation`]). Descriptors are built with the
//! [`Param`], [`Query`], [`Hash`] and [`State`] constructors:
//!
//! ```
//! use trouty_urls::field::{Hash, Param, Query};
//!
//! let id = Param::string();
//! let search = Query::string().fallback("");
//! let selection = Hash::json().optional();
//! # let _ = (id, search, selection);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{FieldError, RouterError, RouterResult};

/// Where a field's raw value is read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
	/// A `:name` path segment.
	Param,
	/// A query string key.
	Query,
	/// The hash fragment. At most one per route.
	Hash,
	/// History state, stored unconverted.
	State,
}

impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Param => "param",
			Self::Query => "query",
			Self::Hash => "hash",
			Self::State => "state",
		};
		f.write_str(name)
	}
}

/// How raw text converts to and from a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
	/// Text as-is.
	String,
	/// Decimal number, integer when exact.
	Number,
	/// Presence flag: absent or empty is `false`, anything else `true`.
	Boolean,
	/// JSON text, percent-coded when it lives in the hash.
	Json,
	/// No conversion at all.
	Transparent,
}

/// Custom validation function.
pub type ValidateFn = Arc<dyn Fn(Option<Value>) -> Result<Value, FieldError> + Send + Sync>;

/// What a field does with its converted value, including when it is absent.
///
/// Validation always runs, even when the location carries no value for the
/// field. A `null` result means the field is absent.
#[derive(Clone)]
pub enum Validation {
	/// Absent values are rejected with [`FieldError::Missing`].
	Required,
	/// Absent values stay absent.
	Optional,
	/// Absent values are replaced. Present values are kept, even `0`, `""`
	/// and `false`.
	Fallback(Value),
	/// Caller-supplied validation.
	Custom(ValidateFn),
}

impl Validation {
	/// Runs the validation over a converted value.
	pub fn apply(&self, value: Option<Value>) -> Result<Value, FieldError> {
		let present = value.filter(|v| !v.is_null());
		match self {
			Self::Required => present.ok_or(FieldError::Missing),
			Self::Optional => Ok(present.unwrap_or(Value::Null)),
			Self::Fallback(fallback) => Ok(present.unwrap_or_else(|| fallback.clone())),
			Self::Custom(validate) => validate(present),
		}
	}
}

impl fmt::Debug for Validation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Required => f.write_str("Required"),
			Self::Optional => f.write_str("Optional"),
			Self::Fallback(value) => f.debug_tuple("Fallback").field(value).finish(),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

/// A raw field value as found in a location.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
	/// Text from a path segment, query string or hash fragment.
	Text(String),
	/// A structured value from history state.
	Structured(Value),
}

/// Immutable description of one route argument.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
	source: Source,
	kind: Kind,
	validation: Validation,
}

impl FieldDescriptor {
	/// Creates a required field.
	pub fn new(source: Source, kind: Kind) -> Self {
		Self {
			source,
			kind,
			validation: Validation::Required,
		}
	}

	/// Makes the field required (the default).
	pub fn required(mut self) -> Self {
		self.validation = Validation::Required;
		self
	}

	/// Lets the field be absent.
	pub fn optional(mut self) -> Self {
		self.validation = Validation::Optional;
		self
	}

	/// Uses `value` whenever the field is absent.
	pub fn fallback(mut self, value: impl Into<Value>) -> Self {
		self.validation = Validation::Fallback(value.into());
		self
	}

	/// Replaces validation with a custom function.
	pub fn validate<F>(mut self, validate: F) -> Self
	where
		F: Fn(Option<Value>) -> Result<Value, FieldError> + Send + Sync + 'static,
	{
		self.validation = Validation::Custom(Arc::new(validate));
		self
	}

	/// Returns the source.
	pub fn source(&self) -> Source {
		self.source
	}

	/// Returns the kind.
	pub fn kind(&self) -> Kind {
		self.kind
	}

	/// Returns the validation.
	pub fn validation(&self) -> &Validation {
		&self.validation
	}

	/// Decodes a raw value, then validates it.
	///
	/// # Errors
	///
	/// [`RouterError::MalformedField`] when the raw text does not convert,
	/// or whatever the validation rejects.
	pub fn decode(&self, name: &str, raw: Option<RawValue>) -> RouterResult<Value> {
		let converted = match raw {
			Some(RawValue::Structured(value)) => Some(value),
			Some(RawValue::Text(text)) => self.convert(&text).map_err(|reason| {
				RouterError::MalformedField {
					field: name.to_string(),
					origin: self.source,
					reason,
				}
			})?,
			None if self.kind == Kind::Boolean && self.source != Source::State => {
				Some(Value::Bool(false))
			}
			None => None,
		};

		self.validation
			.apply(converted)
			.map_err(|e| e.into_router_error(name, self.source))
	}

	/// Validates an already converted value, the way encoding sees it.
	///
	/// `null` counts as absent. An absent text flag is `false`, as when
	/// decoding.
	///
	/// # Errors
	///
	/// Whatever the validation rejects, lifted as in [`FieldDescriptor::decode`].
	pub fn validate_value(&self, name: &str, value: Option<&Value>) -> RouterResult<Value> {
		let present = match value.filter(|v| !v.is_null()) {
			Some(value) => Some(value.clone()),
			None if self.kind == Kind::Boolean && self.source != Source::State => {
				Some(Value::Bool(false))
			}
			None => None,
		};

		self.validation
			.apply(present)
			.map_err(|e| e.into_router_error(name, self.source))
	}

	fn convert(&self, text: &str) -> Result<Option<Value>, String> {
		match self.kind {
			Kind::String | Kind::Transparent => Ok(Some(Value::String(text.to_string()))),
			Kind::Boolean => Ok(Some(Value::Bool(!text.is_empty()))),
			Kind::Number if text.trim().is_empty() => Ok(None),
			Kind::Number => parse_number(text.trim()).map(Some),
			Kind::Json if text.is_empty() => Ok(None),
			Kind::Json => {
				let decoded = if self.source == Source::Hash {
					urlencoding::decode(text)
						.map_err(|e| e.to_string())?
						.into_owned()
				} else {
					text.to_string()
				};
				serde_json::from_str(&decoded)
					.map(Some)
					.map_err(|e| e.to_string())
			}
		}
	}

	/// Encodes a value for its source. `None` means the field is omitted.
	pub fn encode(&self, value: &Value) -> Option<RawValue> {
		if value.is_null() {
			return None;
		}
		if self.source == Source::State {
			return Some(RawValue::Structured(value.clone()));
		}

		let text = match (self.kind, value) {
			(Kind::Number, Value::Number(n)) => n.to_string(),
			(Kind::Boolean, Value::Bool(false)) => return None,
			(Kind::Json, _) => {
				let json = value.to_string();
				if self.source == Source::Hash {
					urlencoding::encode(&json).into_owned()
				} else {
					json
				}
			}
			(_, other) => plain_text(other),
		};
		Some(RawValue::Text(text))
	}
}

fn parse_number(text: &str) -> Result<Value, String> {
	if let Ok(int) = text.parse::<i64>() {
		return Ok(Value::from(int));
	}
	if let Ok(uint) = text.parse::<u64>() {
		return Ok(Value::from(uint));
	}
	text.parse::<f64>()
		.ok()
		.and_then(Number::from_f64)
		.map(Value::Number)
		.ok_or_else(|| format!("'{}' is not a finite number", text))
}

fn plain_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

// Generates the `<Source>::<kind>()` constructors.
macro_rules! field_constructors {
	($($(#[$meta:meta])* $ty:ident => $source:expr),* $(,)?) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Copy)]
			pub struct $ty;

			impl $ty {
				/// A text field.
				pub fn string() -> FieldDescriptor {
					FieldDescriptor::new($source, Kind::String)
				}

				/// A numeric field.
				pub fn number() -> FieldDescriptor {
					FieldDescriptor::new($source, Kind::Number)
				}

				/// A presence flag.
				pub fn boolean() -> FieldDescriptor {
					FieldDescriptor::new($source, Kind::Boolean)
				}

				/// A JSON field.
				pub fn json() -> FieldDescriptor {
					FieldDescriptor::new($source, Kind::Json)
				}

				/// A field passed through without conversion.
				pub fn transparent() -> FieldDescriptor {
					FieldDescriptor::new($source, Kind::Transparent)
				}
			}
		)*
	};
}

field_constructors! {
	/// Fields read from `:name` path segments.
	Param => Source::Param,
	/// Fields read from the query string.
	Query => Source::Query,
	/// The field read from the hash fragment.
	Hash => Source::Hash,
	/// Fields read from history state.
	State => Source::State,
}
