//! Store settings.

use serde::Deserialize;

/// Default cap on operations queued while the store is dispatching.
pub const DEFAULT_MAX_QUEUED_OPERATIONS: usize = 64;

/// Tunables for a [`NavigationStore`](crate::NavigationStore).
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```
/// use trouty_pages::StoreSettings;
///
/// let settings = StoreSettings::from_toml_str("case_sensitive = true")?;
/// assert!(settings.case_sensitive);
/// assert_eq!(settings.max_queued_operations, 64);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
	/// Compare literal path segments case-sensitively.
	pub case_sensitive: bool,
	/// Maximum number of transitions and location changes queued by
	/// subscribers that one dispatch runs. Anything beyond is dropped and
	/// reported as a navigation failure.
	pub max_queued_operations: usize,
}

impl Default for StoreSettings {
	fn default() -> Self {
		Self {
			case_sensitive: false,
			max_queued_operations: DEFAULT_MAX_QUEUED_OPERATIONS,
		}
	}
}

impl StoreSettings {
	/// Parses settings from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(source)
	}

	/// Sets case-sensitive path matching.
	pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
		self.case_sensitive = case_sensitive;
		self
	}

	/// Sets the queue cap.
	pub fn with_max_queued_operations(mut self, max: usize) -> Self {
		self.max_queued_operations = max;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let settings = StoreSettings::default();
		assert!(!settings.case_sensitive);
		assert_eq!(settings.max_queued_operations, DEFAULT_MAX_QUEUED_OPERATIONS);
	}

	#[rstest]
	fn test_empty_toml_uses_defaults() {
		assert_eq!(
			StoreSettings::from_toml_str("").unwrap(),
			StoreSettings::default()
		);
	}

	#[rstest]
	fn test_toml_overrides() {
		let settings = StoreSettings::from_toml_str(
			"case_sensitive = true\nmax_queued_operations = 8\n",
		)
		.unwrap();
		assert_eq!(
			settings,
			StoreSettings::default()
				.with_case_sensitive(true)
				.with_max_queued_operations(8)
		);
	}

	#[rstest]
	fn test_toml_rejects_wrong_types() {
		assert!(StoreSettings::from_toml_str("case_sensitive = \"yes\"").is_err());
	}
}
