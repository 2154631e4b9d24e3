//! Path pattern matching for route arguments.
//!
//! Patterns are made of literal segments and `:name` placeholders, one
//! placeholder per segment:
//! - `/users` - Exact match
//! - `/users/:id` - Single path parameter
//! - `/users/:user_id/posts/:post_id` - Multiple parameters
//!
//! Matching is exact: extra trailing segments never match, a single trailing
//! slash is ignored. Literal segments compare case-insensitively unless the
//! pattern was compiled as case sensitive. Captured values keep their case.

use std::collections::HashMap;

use crate::error::{RouterError, RouterResult};

/// Parameters captured from a path, keyed by placeholder name.
pub type PathParams = HashMap<String, String>;

/// Maximum allowed length for a pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
}

/// A compiled path pattern, usable for both matching and building.
#[derive(Debug, Clone)]
pub struct PathPattern {
	/// The original pattern string.
	pattern: String,
	/// Compiled regex pattern.
	regex: regex::Regex,
	/// Parsed segments, in order.
	segments: Vec<Segment>,
	/// Parameter names in order.
	param_names: Vec<String>,
	/// Whether the pattern was written with a trailing slash.
	trailing_slash: bool,
}

impl PathPattern {
	/// Compiles a case-insensitive pattern.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidPattern`] if the pattern is too long, has
	/// too many segments, has an empty or duplicated placeholder name, or puts a
	/// placeholder inside a literal segment.
	pub fn new(pattern: &str) -> RouterResult<Self> {
		Self::with_case_sensitivity(pattern, false)
	}

	/// Compiles a pattern, choosing how literal segments are compared.
	pub fn with_case_sensitivity(pattern: &str, case_sensitive: bool) -> RouterResult<Self> {
		let invalid = |reason: String| RouterError::InvalidPattern {
			pattern: pattern.to_string(),
			reason,
		};

		// Reject patterns exceeding the maximum length to prevent ReDoS
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(invalid(format!(
				"length {} exceeds maximum allowed length of {} bytes",
				pattern.len(),
				MAX_PATTERN_LENGTH
			)));
		}

		let segment_count = pattern.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(invalid(format!(
				"{} path segments exceed maximum of {}",
				segment_count, MAX_PATH_SEGMENTS
			)));
		}

		let segments = Self::parse_segments(pattern).map_err(invalid)?;
		let param_names: Vec<String> = segments
			.iter()
			.filter_map(|segment| match segment {
				Segment::Param(name) => Some(name.clone()),
				Segment::Literal(_) => None,
			})
			.collect();

		let regex = regex::RegexBuilder::new(&Self::compile_regex(&segments))
			.case_insensitive(!case_sensitive)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| invalid(format!("failed to compile pattern regex: {}", e)))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			segments,
			param_names,
			trailing_slash: pattern.len() > 1 && pattern.ends_with('/'),
		})
	}

	fn parse_segments(pattern: &str) -> Result<Vec<Segment>, String> {
		let mut segments = Vec::new();
		let mut seen: Vec<&str> = Vec::new();

		for raw in pattern.split('/').filter(|s| !s.is_empty()) {
			if let Some(name) = raw.strip_prefix(':') {
				if name.is_empty() {
					return Err("placeholder without a name".to_string());
				}
				if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
					return Err(format!("invalid placeholder name ':{}'", name));
				}
				if seen.contains(&name) {
					return Err(format!("placeholder ':{}' appears more than once", name));
				}
				seen.push(name);
				segments.push(Segment::Param(name.to_string()));
			} else if raw.contains(':') {
				return Err(format!(
					"placeholder must span a whole segment, found '{}'",
					raw
				));
			} else {
				segments.push(Segment::Literal(raw.to_string()));
			}
		}

		Ok(segments)
	}

	fn compile_regex(segments: &[Segment]) -> String {
		let mut regex_str = String::from("^");
		for segment in segments {
			regex_str.push('/');
			match segment {
				Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
				// Normal: match anything except slashes
				Segment::Param(_) => regex_str.push_str("([^/]+)"),
			}
		}
		regex_str.push_str("/?$");
		regex_str
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns whether the pattern declares a placeholder with this name.
	pub fn has_param(&self, name: &str) -> bool {
		self.param_names.iter().any(|p| p == name)
	}

	/// Attempts to match a path against this pattern.
	///
	/// Captured values are percent-decoded; a value that does not decode to
	/// UTF-8 is returned as written.
	pub fn matches(&self, path: &str) -> Option<PathParams> {
		let caps = self.regex.captures(path)?;
		let params = self
			.param_names
			.iter()
			.enumerate()
			.filter_map(|(index, name)| {
				caps.get(index + 1).map(|m| {
					let raw = m.as_str();
					let value = urlencoding::decode(raw)
						.map(|v| v.into_owned())
						.unwrap_or_else(|_| raw.to_string());
					(name.clone(), value)
				})
			})
			.collect();
		Some(params)
	}

	/// Checks if this pattern would match the given path.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Builds a concrete path, percent-encoding every parameter value.
	///
	/// # Errors
	///
	/// Returns [`RouterError::MissingPathParam`] for the first placeholder
	/// without a value.
	pub fn build(&self, params: &PathParams) -> RouterResult<String> {
		let mut path = String::new();
		for segment in &self.segments {
			path.push('/');
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Param(name) => {
					let value = params.get(name).ok_or_else(|| RouterError::MissingPathParam {
						pattern: self.pattern.clone(),
						param: name.clone(),
					})?;
					path.push_str(&urlencoding::encode(value));
				}
			}
		}

		if path.is_empty() || self.trailing_slash {
			path.push('/');
		}
		Ok(path)
	}

	/// Returns whether this is an exact match pattern (no parameters).
	pub fn is_exact(&self) -> bool {
		self.param_names.is_empty()
	}
}

impl PartialEq for PathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for PathPattern {}

impl std::fmt::Display for PathPattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn params(pairs: &[(&str, &str)]) -> PathParams {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_exact_pattern() {
		let pattern = PathPattern::new("/users").unwrap();
		assert!(pattern.is_exact());
		assert!(pattern.is_match("/users"));
		assert!(pattern.is_match("/users/"));
		assert!(!pattern.is_match("/users/123"));
		assert!(!pattern.is_match("/users//"));
	}

	#[rstest]
	fn test_no_match_returns_none() {
		let pattern = PathPattern::new("/foo").unwrap();
		assert_eq!(pattern.matches("/bar"), None);
	}

	#[rstest]
	fn test_plain_match_returns_empty_params() {
		let pattern = PathPattern::new("/foo").unwrap();
		assert_eq!(pattern.matches("/foo"), Some(PathParams::new()));
	}

	#[rstest]
	fn test_single_param() {
		let pattern = PathPattern::new("/foo/:id").unwrap();
		assert!(!pattern.is_exact());
		assert_eq!(pattern.matches("/foo/bar"), Some(params(&[("id", "bar")])));
		assert!(!pattern.is_match("/foo"));
		assert!(!pattern.is_match("/foo/bar/baz"));
	}

	#[rstest]
	fn test_multiple_params() {
		let pattern = PathPattern::new("/params/:a/:b").unwrap();
		assert_eq!(
			pattern.matches("/params/foo/bar"),
			Some(params(&[("a", "foo"), ("b", "bar")]))
		);
		assert_eq!(pattern.param_names(), &["a", "b"]);
	}

	#[rstest]
	fn test_literals_are_case_insensitive_captures_keep_case() {
		let pattern = PathPattern::new("/Foo/:id").unwrap();
		assert_eq!(pattern.matches("/fOO/AbC"), Some(params(&[("id", "AbC")])));
	}

	#[rstest]
	fn test_case_sensitive_pattern() {
		let pattern = PathPattern::with_case_sensitivity("/Foo", true).unwrap();
		assert!(pattern.is_match("/Foo"));
		assert!(!pattern.is_match("/foo"));
	}

	#[rstest]
	fn test_captured_values_are_percent_decoded() {
		let pattern = PathPattern::new("/items/:id").unwrap();
		assert_eq!(pattern.matches("/items/a%20b"), Some(params(&[("id", "a b")])));
		// Invalid UTF-8 stays as written
		assert_eq!(pattern.matches("/items/%FF"), Some(params(&[("id", "%FF")])));
	}

	#[rstest]
	fn test_special_chars_escaped() {
		let pattern = PathPattern::new("/api/v1.0").unwrap();
		assert!(pattern.is_match("/api/v1.0"));
		assert!(!pattern.is_match("/api/v1X0"));
	}

	#[rstest]
	fn test_root_pattern() {
		let pattern = PathPattern::new("/").unwrap();
		assert!(pattern.is_match("/"));
		assert!(!pattern.is_match("/foo"));
		assert_eq!(pattern.build(&PathParams::new()).unwrap(), "/");
	}

	#[rstest]
	fn test_build_simple() {
		let pattern = PathPattern::new("/bar/:id").unwrap();
		assert_eq!(pattern.build(&params(&[("id", "456")])).unwrap(), "/bar/456");
	}

	#[rstest]
	fn test_build_keeps_trailing_slash() {
		let pattern = PathPattern::new("/users/:id/").unwrap();
		assert_eq!(pattern.build(&params(&[("id", "42")])).unwrap(), "/users/42/");
	}

	#[rstest]
	fn test_build_encodes_values() {
		let pattern = PathPattern::new("/items/:id").unwrap();
		assert_eq!(
			pattern.build(&params(&[("id", "a b/c")])).unwrap(),
			"/items/a%20b%2Fc"
		);
	}

	#[rstest]
	fn test_build_missing_param() {
		let pattern = PathPattern::new("/users/:id").unwrap();
		let err = pattern.build(&PathParams::new()).unwrap_err();
		assert_eq!(
			err,
			RouterError::MissingPathParam {
				pattern: "/users/:id".to_string(),
				param: "id".to_string(),
			}
		);
	}

	#[rstest]
	#[case("/foo/:")]
	#[case("/foo/:id/:id")]
	#[case("/foo-:id")]
	#[case("/foo/:bad-name")]
	fn test_malformed_patterns_rejected(#[case] raw: &str) {
		let result = PathPattern::new(raw);
		assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_pattern_rejects_excessive_length() {
		// Arrange: a pattern exceeding 1024 bytes
		let long_pattern = "/".to_string() + &"a".repeat(1025);

		// Act
		let result = PathPattern::new(&long_pattern);

		// Assert
		assert!(
			result
				.unwrap_err()
				.to_string()
				.contains("exceeds maximum allowed length")
		);
	}

	#[rstest]
	fn test_pattern_rejects_excessive_segments() {
		// Arrange: a pattern with more than 32 segments
		let segments: Vec<&str> = (0..35).map(|_| "seg").collect();
		let pattern = format!("/{}/", segments.join("/"));

		// Act
		let result = PathPattern::new(&pattern);

		// Assert
		assert!(result.unwrap_err().to_string().contains("exceed maximum"));
	}

	#[rstest]
	fn test_pattern_display_and_equality() {
		let p1 = PathPattern::new("/users/:id").unwrap();
		let p2 = PathPattern::new("/users/:id").unwrap();
		let p3 = PathPattern::new("/users/:user_id").unwrap();

		assert_eq!(format!("{}", p1), "/users/:id");
		assert_eq!(p1, p2);
		assert_ne!(p1, p3);
	}
}
