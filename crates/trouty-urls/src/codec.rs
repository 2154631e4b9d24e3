//! Route descriptors and the codec between locations and argument objects.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{RouterError, RouterResult};
use crate::field::{FieldDescriptor, RawValue, Source};
use crate::location::Location;
use crate::pattern::{PathParams, PathPattern};

/// Decoded arguments of one route, keyed by field name.
pub type Args = Map<String, Value>;

/// Static configuration of one route: a path pattern and its fields.
///
/// This is plain configuration; it is checked when compiled into a
/// [`RouteCodec`].
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
	path: String,
	fields: Vec<(String, FieldDescriptor)>,
}

impl RouteDescriptor {
	/// Creates a route without fields.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			fields: Vec::new(),
		}
	}

	/// Adds a field. Re-declaring a name replaces the earlier descriptor in place.
	pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
		let name = name.into();
		match self.fields.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = descriptor,
			None => self.fields.push((name, descriptor)),
		}
		self
	}

	/// Returns the path pattern string.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns the fields in declaration order.
	pub fn fields(&self) -> &[(String, FieldDescriptor)] {
		&self.fields
	}
}

/// A compiled route: matches, decodes and encodes locations.
#[derive(Debug, Clone)]
pub struct RouteCodec {
	pattern: PathPattern,
	fields: Vec<(String, FieldDescriptor)>,
}

impl RouteCodec {
	/// Compiles a descriptor with case-insensitive path matching.
	pub fn new(descriptor: RouteDescriptor) -> RouterResult<Self> {
		Self::with_case_sensitivity(descriptor, false)
	}

	/// Compiles a descriptor.
	///
	/// # Errors
	///
	/// - [`RouterError::InvalidPattern`] for a malformed path or a param
	///   field whose name is not a placeholder of the path.
	/// - [`RouterError::AmbiguousHashField`] when more than one field reads
	///   the hash fragment.
	pub fn with_case_sensitivity(
		descriptor: RouteDescriptor,
		case_sensitive: bool,
	) -> RouterResult<Self> {
		let RouteDescriptor { path, fields } = descriptor;
		let pattern = PathPattern::with_case_sensitivity(&path, case_sensitive)?;

		let hash_fields: Vec<String> = fields
			.iter()
			.filter(|(_, field)| field.source() == Source::Hash)
			.map(|(name, _)| name.clone())
			.collect();
		if hash_fields.len() > 1 {
			return Err(RouterError::AmbiguousHashField {
				path,
				fields: hash_fields,
			});
		}

		if let Some((name, _)) = fields
			.iter()
			.find(|(name, field)| field.source() == Source::Param && !pattern.has_param(name))
		{
			return Err(RouterError::InvalidPattern {
				reason: format!("param field '{}' has no ':{}' placeholder", name, name),
				pattern: path,
			});
		}

		Ok(Self { pattern, fields })
	}

	/// Returns the compiled path pattern.
	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	/// Returns the fields in declaration order.
	pub fn fields(&self) -> &[(String, FieldDescriptor)] {
		&self.fields
	}

	/// Looks up a field by name.
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, field)| field)
	}

	/// Matches a pathname, returning the captured path parameters.
	pub fn match_path(&self, pathname: &str) -> Option<PathParams> {
		self.pattern.matches(pathname)
	}

	/// Decodes every field of a location into an argument object.
	///
	/// Any field error aborts the whole decode.
	pub fn decode_location(&self, location: &Location, params: &PathParams) -> RouterResult<Args> {
		let mut query: Option<Vec<(String, String)>> = None;
		let mut args = Args::new();

		for (name, field) in &self.fields {
			let raw = match field.source() {
				Source::Param => params.get(name).cloned().map(RawValue::Text),
				Source::Query => {
					if query.is_none() {
						query = Some(parse_query(location.query()).map_err(|reason| {
							RouterError::MalformedField {
								field: name.clone(),
								origin: Source::Query,
								reason,
							}
						})?);
					}
					query
						.iter()
						.flatten()
						.find(|(key, _)| key == name)
						.map(|(_, value)| RawValue::Text(value.clone()))
				}
				Source::Hash => {
					let fragment = location.fragment();
					(!fragment.is_empty()).then(|| RawValue::Text(fragment.to_string()))
				}
				Source::State => location.state.get(name).cloned().map(RawValue::Structured),
			};

			let value = field.decode(name, raw)?;
			if !value.is_null() {
				args.insert(name.clone(), value);
			}
		}

		Ok(args)
	}

	/// Matches and decodes a location in one step.
	///
	/// Returns `None` when the path does not match.
	pub fn match_location(&self, location: &Location) -> Option<RouterResult<Args>> {
		self.match_path(&location.pathname)
			.map(|params| self.decode_location(location, &params))
	}

	/// Runs every field's validation over an argument object.
	///
	/// The result holds exactly what decoding the encoded location yields:
	/// fallbacks filled in, absent fields left out, undeclared keys dropped.
	///
	/// # Errors
	///
	/// - [`RouterError::MissingPathParam`] when a required param field is absent.
	/// - [`RouterError::MissingRequiredField`] for any other absent required field.
	/// - Whatever a custom validation rejects.
	pub fn validate_args(&self, args: &Args) -> RouterResult<Args> {
		let mut validated = Args::new();
		for (name, field) in &self.fields {
			let value = field
				.validate_value(name, args.get(name))
				.map_err(|error| match error {
					RouterError::MissingRequiredField { .. } if field.source() == Source::Param => {
						RouterError::MissingPathParam {
							pattern: self.pattern.pattern().to_string(),
							param: name.clone(),
						}
					}
					other => other,
				})?;
			if !value.is_null() {
				validated.insert(name.clone(), value);
			}
		}
		Ok(validated)
	}

	/// Validates an argument object, then encodes it into an href and a
	/// location.
	///
	/// Absent (`null`) values are omitted: no query key, no hash, no state
	/// entry. The result depends only on `args`.
	///
	/// # Errors
	///
	/// See [`RouteCodec::validate_args`].
	pub fn encode_location(&self, args: &Args) -> RouterResult<(String, Location)> {
		let args = self.validate_args(args)?;
		let mut params: PathParams = HashMap::new();
		let mut query: Vec<(&str, String)> = Vec::new();
		let mut hash = String::new();
		let mut state = Map::new();

		for (name, field) in &self.fields {
			let value = args.get(name).unwrap_or(&Value::Null);
			match (field.source(), field.encode(value)) {
				(_, None) => {}
				(_, Some(RawValue::Structured(value))) => {
					state.insert(name.clone(), value);
				}
				(Source::Param, Some(RawValue::Text(text))) => {
					params.insert(name.clone(), text);
				}
				(Source::Query, Some(RawValue::Text(text))) => query.push((name.as_str(), text)),
				(Source::Hash, Some(RawValue::Text(text))) => hash = text,
				(Source::State, Some(RawValue::Text(text))) => {
					state.insert(name.clone(), Value::String(text));
				}
			}
		}

		let search = serde_urlencoded::to_string(&query)
			.map_err(|e| RouterError::InvalidPayload(e.to_string()))?;
		// The fragment may itself start with '#'
		let hash = if hash.is_empty() {
			hash
		} else {
			format!("#{}", hash)
		};
		let location = Location::new(self.pattern.build(&params)?)
			.with_search(&search)
			.with_hash(&hash)
			.with_state(state);

		Ok((location.href(), location))
	}
}

fn parse_query(query: &str) -> Result<Vec<(String, String)>, String> {
	serde_urlencoded::from_str(query).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::field::{Hash, Param, Query, State};
	use rstest::rstest;
	use serde_json::json;

	fn args(value: Value) -> Args {
		match value {
			Value::Object(map) => map,
			_ => panic!("expected an object"),
		}
	}

	fn search_route(path: &str) -> RouteCodec {
		RouteCodec::new(
			RouteDescriptor::new(path)
				.field("id", Param::string())
				.field("search", Query::string().fallback("")),
		)
		.unwrap()
	}

	#[rstest]
	fn test_decode_param_and_query() {
		let codec = search_route("/foo/:id");
		let location = Location::parse("/foo/123?search=baz");

		let decoded = codec.match_location(&location).unwrap().unwrap();

		assert_eq!(decoded, args(json!({"id": "123", "search": "baz"})));
	}

	#[rstest]
	fn test_decode_applies_fallback() {
		let codec = search_route("/foo/:id");
		let decoded = codec
			.match_location(&Location::parse("/foo/1"))
			.unwrap()
			.unwrap();
		assert_eq!(decoded, args(json!({"id": "1", "search": ""})));
	}

	#[rstest]
	fn test_encode_param_and_query() {
		let codec = search_route("/bar/:id");

		let (href, location) = codec
			.encode_location(&args(json!({"id": "456", "search": "purple"})))
			.unwrap();

		assert_eq!(href, "/bar/456?search=purple");
		assert_eq!(location.pathname, "/bar/456");
		assert_eq!(location.search, "?search=purple");
		assert_eq!(location.hash, "");
	}

	#[rstest]
	fn test_query_keys_follow_declaration_order() {
		let codec = RouteCodec::new(
			RouteDescriptor::new("/queryString")
				.field("a", Query::string())
				.field("b", Query::number())
				.field("c", Query::json()),
		)
		.unwrap();

		let (href, _) = codec
			.encode_location(&args(json!({"c": ["zzz"], "b": 5, "a": "bar"})))
			.unwrap();

		assert_eq!(href, "/queryString?a=bar&b=5&c=%5B%22zzz%22%5D");
	}

	#[rstest]
	fn test_decode_query_kinds() {
		let codec = RouteCodec::new(
			RouteDescriptor::new("/queryString")
				.field("a", Query::string())
				.field("b", Query::number())
				.field("c", Query::json()),
		)
		.unwrap();

		let decoded = codec
			.match_location(&Location::parse("/queryString?a=foo&b=2&c=%5B%22foo%22%5D"))
			.unwrap()
			.unwrap();

		assert_eq!(decoded, args(json!({"a": "foo", "b": 2, "c": ["foo"]})));
	}

	#[rstest]
	fn test_hash_json_round_trip() {
		let codec =
			RouteCodec::new(RouteDescriptor::new("/hashJson").field("a", Hash::json())).unwrap();

		let decoded = codec
			.match_location(&Location::parse("/hashJson#%5B%22foo%22%5D"))
			.unwrap()
			.unwrap();
		let (href, location) = codec.encode_location(&args(json!({"a": ["bar"]}))).unwrap();

		assert_eq!(decoded, args(json!({"a": ["foo"]})));
		assert_eq!(location.hash, "#%5B%22bar%22%5D");
		assert_eq!(href, "/hashJson#%5B%22bar%22%5D");
	}

	#[rstest]
	fn test_state_fields() {
		let codec = RouteCodec::new(
			RouteDescriptor::new("/s")
				.field("s", State::transparent().optional())
				.field("t", State::transparent().optional()),
		)
		.unwrap();

		let (_, location) = codec
			.encode_location(&args(json!({"s": {"x": 1}})))
			.unwrap();

		assert_eq!(Value::Object(location.state.clone()), json!({"s": {"x": 1}}));
		assert!(!location.state.contains_key("t"));

		let decoded = codec.match_location(&location).unwrap().unwrap();
		assert_eq!(decoded, args(json!({"s": {"x": 1}})));
	}

	#[rstest]
	fn test_two_hash_fields_rejected() {
		let result = RouteCodec::new(
			RouteDescriptor::new("/h")
				.field("a", Hash::string())
				.field("b", Hash::json()),
		);

		assert_eq!(
			result.unwrap_err(),
			RouterError::AmbiguousHashField {
				path: "/h".to_string(),
				fields: vec!["a".to_string(), "b".to_string()],
			}
		);
	}

	#[rstest]
	fn test_param_field_without_placeholder_rejected() {
		let result = RouteCodec::new(RouteDescriptor::new("/foo").field("id", Param::string()));
		assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_encode_missing_param() {
		let codec = search_route("/bar/:id");
		let result = codec.encode_location(&args(json!({"search": "x"})));
		assert!(matches!(
			result,
			Err(RouterError::MissingPathParam { ref param, .. }) if param == "id"
		));
	}

	#[rstest]
	fn test_encode_validates_fields() {
		let codec = RouteCodec::new(
			RouteDescriptor::new("/foo/:id")
				.field("id", Param::string())
				.field("search", Query::string().fallback(""))
				.field("page", Query::number()),
		)
		.unwrap();

		let (href, _) = codec
			.encode_location(&args(json!({"id": "1", "page": 2, "search": null})))
			.unwrap();
		let missing = codec.encode_location(&args(json!({"id": "1"})));

		assert_eq!(href, "/foo/1?search=&page=2");
		assert_eq!(
			missing,
			Err(RouterError::MissingRequiredField {
				field: "page".to_string()
			})
		);
	}

	#[rstest]
	fn test_validate_args_matches_decode() {
		let codec = search_route("/foo/:id");
		let raw = args(json!({"id": "1", "search": null, "undeclared": 5}));

		let validated = codec.validate_args(&raw).unwrap();
		let (_, location) = codec.encode_location(&raw).unwrap();

		assert_eq!(validated, args(json!({"id": "1", "search": ""})));
		assert_eq!(codec.match_location(&location).unwrap().unwrap(), validated);
	}

	#[rstest]
	#[case("#top")]
	#[case("##")]
	#[case("plain")]
	fn test_hash_string_keeps_leading_hash(#[case] text: &str) {
		let codec =
			RouteCodec::new(RouteDescriptor::new("/h").field("h", Hash::string())).unwrap();
		let value = args(json!({ "h": text }));

		let (href, _) = codec.encode_location(&value).unwrap();
		let decoded = codec.match_location(&Location::parse(&href)).unwrap().unwrap();

		assert_eq!(href, format!("/h#{}", text));
		assert_eq!(decoded, value);
	}

	#[rstest]
	fn test_decode_error_aborts_whole_decode() {
		let codec = RouteCodec::new(
			RouteDescriptor::new("/n")
				.field("ok", Query::string().optional())
				.field("n", Query::number()),
		)
		.unwrap();

		let result = codec
			.match_location(&Location::parse("/n?ok=1&n=abc"))
			.unwrap();

		assert!(matches!(result, Err(RouterError::MalformedField { ref field, .. }) if field == "n"));
	}

	#[rstest]
	fn test_no_match_is_none() {
		let codec = search_route("/foo/:id");
		assert!(codec.match_location(&Location::parse("/bar/1")).is_none());
	}

	#[rstest]
	fn test_redeclared_field_replaces_in_place() {
		let descriptor = RouteDescriptor::new("/r")
			.field("a", Query::string())
			.field("b", Query::string())
			.field("a", Query::number());

		let names: Vec<&str> = descriptor.fields().iter().map(|(n, _)| n.as_str()).collect();
		assert_eq!(names, ["a", "b"]);
	}
}
