//! Per-route and per-argument accessors.
//!
//! [`RouteControls`] reads and updates one route as a whole. Its
//! [`RouteControls::args`] builds one [`ArgControls`] per declared field, in
//! declaration order.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trouty_urls::{Args, RouterError, RouterResult};

use crate::history::NavigationType;
use crate::link::Link;
use crate::store::NavigationStore;
use crate::subscription::{Subscription, WILDCARD};

/// Accessors for one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteControls<'a> {
	store: &'a NavigationStore,
	route: &'a str,
}

impl<'a> RouteControls<'a> {
	pub(crate) fn new(store: &'a NavigationStore, route: &'a str) -> Self {
		Self { store, route }
	}

	/// Route name.
	pub fn name(&self) -> &'a str {
		self.route
	}

	/// Whether this route is active.
	pub fn is_active(&self) -> bool {
		self.store.is_active(self.route)
	}

	/// Current arguments.
	pub fn value(&self) -> Args {
		self.store.args(self.route).unwrap_or_default()
	}

	/// Current arguments deserialized into `T`.
	pub fn value_as<T: DeserializeOwned>(&self) -> RouterResult<T> {
		serde_json::from_value(Value::Object(self.value()))
			.map_err(|e| RouterError::InvalidPayload(e.to_string()))
	}

	/// Pushes a partial update.
	pub fn push(&self, partial: Args) -> RouterResult<String> {
		self.store.transition(self.route, partial, NavigationType::Push)
	}

	/// Replaces with a partial update.
	pub fn replace(&self, partial: Args) -> RouterResult<String> {
		self.store.transition(self.route, partial, NavigationType::Replace)
	}

	/// Pushes a serializable update. It must serialize to an object.
	pub fn push_typed<T: Serialize>(&self, update: &T) -> RouterResult<String> {
		let value =
			serde_json::to_value(update).map_err(|e| RouterError::InvalidPayload(e.to_string()))?;
		let partial = self.store.transition_payload(value, None)?;
		self.push(partial)
	}

	/// Link to the state after a partial update.
	pub fn link(&self, partial: Args) -> RouterResult<Link> {
		self.store.to_href(self.route, partial)
	}

	/// Subscribes to whole-route changes.
	pub fn subscribe<F>(&self, callback: F) -> RouterResult<Subscription>
	where
		F: Fn(&Value) + 'static,
	{
		self.store.subscribe(self.route, WILDCARD, callback)
	}

	/// Accessors for one declared field.
	pub fn arg(&self, field: &str) -> RouterResult<ArgControls<'a>> {
		let codec = self.store.codec(self.route)?;
		codec
			.fields()
			.iter()
			.find(|(name, _)| name == field)
			.map(|(name, _)| ArgControls {
				store: self.store,
				route: self.route,
				field: name,
			})
			.ok_or_else(|| RouterError::UnknownField {
				route: self.route.to_string(),
				field: field.to_string(),
			})
	}

	/// Accessors for every declared field.
	pub fn args(&self) -> Vec<ArgControls<'a>> {
		let Ok(codec) = self.store.codec(self.route) else {
			return Vec::new();
		};
		codec
			.fields()
			.iter()
			.map(|(name, _)| ArgControls {
				store: self.store,
				route: self.route,
				field: name,
			})
			.collect()
	}
}

/// Accessors for one argument of one route.
#[derive(Debug, Clone, Copy)]
pub struct ArgControls<'a> {
	store: &'a NavigationStore,
	route: &'a str,
	field: &'a str,
}

impl<'a> ArgControls<'a> {
	/// Field name.
	pub fn name(&self) -> &'a str {
		self.field
	}

	/// Route name.
	pub fn route(&self) -> &'a str {
		self.route
	}

	/// Current value, `null` when absent.
	pub fn value(&self) -> Value {
		self.store
			.get_value(self.route, self.field)
			.unwrap_or(Value::Null)
	}

	/// Current value deserialized into `T`.
	pub fn value_as<T: DeserializeOwned>(&self) -> RouterResult<T> {
		serde_json::from_value(self.value()).map_err(|e| RouterError::InvalidPayload(e.to_string()))
	}

	/// Pushes a new value. `null` removes it.
	pub fn push(&self, value: Value) -> RouterResult<String> {
		self.store.push(self.route, self.payload(value)?)
	}

	/// Replaces with a new value.
	pub fn replace(&self, value: Value) -> RouterResult<String> {
		self.store.replace(self.route, self.payload(value)?)
	}

	/// Link to the state with this value.
	pub fn link(&self, value: Value) -> RouterResult<Link> {
		self.store.to_href(self.route, self.payload(value)?)
	}

	/// Subscribes to changes of this field.
	pub fn subscribe<F>(&self, callback: F) -> RouterResult<Subscription>
	where
		F: Fn(&Value) + 'static,
	{
		self.store.subscribe(self.route, self.field, callback)
	}

	fn payload(&self, value: Value) -> RouterResult<Args> {
		self.store.transition_payload(value, Some(self.field))
	}
}
