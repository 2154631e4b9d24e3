//! The structured "where we are" record exchanged with a history.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A location: path, query string, hash fragment and history state.
///
/// `search` keeps its leading `?` and `hash` its leading `#` when non-empty,
/// the same shape a browser `Location` exposes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
	/// Path component, always starting with `/`.
	pub pathname: String,
	/// Query string including the leading `?`, or empty.
	pub search: String,
	/// Hash fragment including the leading `#`, or empty.
	pub hash: String,
	/// Structured history state.
	#[serde(default)]
	pub state: Map<String, Value>,
}

impl Location {
	/// Creates a location with only a path.
	pub fn new(pathname: impl Into<String>) -> Self {
		Self {
			pathname: pathname.into(),
			..Self::default()
		}
	}

	/// Sets the query string. A missing `?` is added.
	pub fn with_search(mut self, search: &str) -> Self {
		self.search = prefixed('?', search);
		self
	}

	/// Sets the hash fragment. A missing `#` is added.
	pub fn with_hash(mut self, hash: &str) -> Self {
		self.hash = prefixed('#', hash);
		self
	}

	/// Sets the history state.
	pub fn with_state(mut self, state: Map<String, Value>) -> Self {
		self.state = state;
		self
	}

	/// Parses an href of the form `pathname?search#hash`.
	///
	/// The state of a parsed location is empty.
	pub fn parse(href: &str) -> Self {
		let (rest, hash) = match href.find('#') {
			Some(index) => href.split_at(index),
			None => (href, ""),
		};
		let (pathname, search) = match rest.find('?') {
			Some(index) => rest.split_at(index),
			None => (rest, ""),
		};
		let pathname = if pathname.is_empty() { "/" } else { pathname };

		Self::new(pathname).with_search(search).with_hash(hash)
	}

	/// Returns the canonical `pathname?search#hash` string.
	pub fn href(&self) -> String {
		let mut href = self.pathname.clone();
		href.push_str(&prefixed('?', &self.search));
		href.push_str(&prefixed('#', &self.hash));
		href
	}

	/// Query string without the leading `?`.
	pub fn query(&self) -> &str {
		self.search.strip_prefix('?').unwrap_or(&self.search)
	}

	/// Hash fragment without the leading `#`.
	pub fn fragment(&self) -> &str {
		self.hash.strip_prefix('#').unwrap_or(&self.hash)
	}

	/// Two locations lead to the same place when their hrefs and states match.
	pub fn same_destination(&self, other: &Location) -> bool {
		self.href() == other.href() && self.state == other.state
	}
}

fn prefixed(prefix: char, value: &str) -> String {
	let bare = value.strip_prefix(prefix).unwrap_or(value);
	if bare.is_empty() {
		String::new()
	} else {
		format!("{}{}", prefix, bare)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("/foo/123?search=baz#top", "/foo/123", "?search=baz", "#top")]
	#[case("/foo", "/foo", "", "")]
	#[case("/foo#a?b", "/foo", "", "#a?b")]
	#[case("?x=1", "/", "?x=1", "")]
	#[case("/foo?#", "/foo", "", "")]
	fn test_parse(
		#[case] href: &str,
		#[case] pathname: &str,
		#[case] search: &str,
		#[case] hash: &str,
	) {
		let location = Location::parse(href);
		assert_eq!(location.pathname, pathname);
		assert_eq!(location.search, search);
		assert_eq!(location.hash, hash);
	}

	#[rstest]
	fn test_href_adds_missing_prefixes() {
		let location = Location {
			pathname: "/a".to_string(),
			search: "x=1".to_string(),
			hash: "h".to_string(),
			state: Map::new(),
		};
		assert_eq!(location.href(), "/a?x=1#h");
		assert_eq!(location.query(), "x=1");
		assert_eq!(location.fragment(), "h");
	}

	#[rstest]
	fn test_same_destination_compares_state() {
		let a = Location::parse("/a?x=1");
		let mut state = Map::new();
		state.insert("k".to_string(), json!(1));
		let b = Location::parse("/a?x=1").with_state(state);

		assert!(a.same_destination(&Location::parse("/a?x=1")));
		assert!(!a.same_destination(&b));
	}
}
