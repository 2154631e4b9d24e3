//! Links: an href plus the click handling of an anchor.

use std::fmt;

use trouty_urls::{Args, RouterResult};

use crate::store::NavigationStore;

/// Mouse button of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
	/// Left button.
	#[default]
	Primary,
	/// Middle button.
	Auxiliary,
	/// Right button.
	Secondary,
	/// Any other button, by DOM index.
	Other(u16),
}

impl MouseButton {
	/// Converts a DOM `MouseEvent.button` index.
	pub fn from_index(index: u16) -> Self {
		match index {
			0 => Self::Primary,
			1 => Self::Auxiliary,
			2 => Self::Secondary,
			other => Self::Other(other),
		}
	}
}

/// The parts of a click the link cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
	/// Button that was pressed.
	pub button: MouseButton,
	/// Meta (command) key held.
	pub meta_key: bool,
	/// Alt key held.
	pub alt_key: bool,
	/// Control key held.
	pub ctrl_key: bool,
	/// Shift key held.
	pub shift_key: bool,
	/// `target` attribute of the anchor, if any.
	pub target: Option<String>,
	default_prevented: bool,
}

impl ClickEvent {
	/// An unmodified primary-button click.
	pub fn primary() -> Self {
		Self::default()
	}

	/// Sets the button.
	pub fn with_button(mut self, button: MouseButton) -> Self {
		self.button = button;
		self
	}

	/// Sets the anchor target.
	pub fn with_target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	/// Whether any modifier key is held.
	pub fn is_modified(&self) -> bool {
		self.meta_key || self.alt_key || self.ctrl_key || self.shift_key
	}

	/// Stops the default navigation.
	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
	}

	/// Whether default navigation was stopped.
	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented
	}

	fn opens_in_place(&self) -> bool {
		self.target.as_deref().is_none_or(|t| t.is_empty() || t == "_self")
	}
}

/// An href to a route state, with the click handler of an anchor.
///
/// The href is computed when the link is created. Clicking merges the
/// link's partial arguments into the route state as it is at click time.
#[derive(Clone)]
pub struct Link {
	store: NavigationStore,
	route: String,
	partial: Args,
	href: String,
}

impl Link {
	pub(crate) fn new(store: NavigationStore, route: &str, partial: Args, href: String) -> Self {
		Self {
			store,
			route: route.to_string(),
			partial,
			href,
		}
	}

	/// Target href.
	pub fn href(&self) -> &str {
		&self.href
	}

	/// Route the link leads to.
	pub fn route(&self) -> &str {
		&self.route
	}

	/// Arguments the link merges in.
	pub fn partial(&self) -> &Args {
		&self.partial
	}

	/// Handles a click on the anchor.
	///
	/// Only unmodified primary-button clicks opening in the same browsing
	/// context are handled: the event's default is prevented and the store
	/// pushes the new state. A push to the current location becomes a replace.
	/// Returns whether the click was handled.
	pub fn on_click(&self, event: &mut ClickEvent) -> RouterResult<bool> {
		if event.is_default_prevented()
			|| event.button != MouseButton::Primary
			|| event.is_modified()
			|| !event.opens_in_place()
		{
			return Ok(false);
		}

		event.prevent_default();
		self.store.push(&self.route, self.partial.clone())?;
		Ok(true)
	}
}

impl fmt::Debug for Link {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Link")
			.field("route", &self.route)
			.field("href", &self.href)
			.finish()
	}
}
