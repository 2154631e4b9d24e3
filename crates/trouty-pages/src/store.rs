//! The navigation store.
//!
//! This module provides [`NavigationStore`], which tracks the active route,
//! keeps the last decoded arguments of every route and notifies subscribers
//! when they change.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace, warn};
use trouty_urls::{Args, Location, PathParams, RouteCodec, RouteDescriptor, RouterError, RouterResult};

use crate::controls::RouteControls;
use crate::history::{History, HistoryListener, NavigationType};
use crate::link::Link;
use crate::settings::StoreSettings;
use crate::subscription::{self, SubscriberFn, SubscriberRegistry, Subscription, WILDCARD};

/// Callback receiving decode and navigation failures the store does not
/// return to a caller. The first argument is the route name, or `*` when
/// no single route is concerned.
pub type ErrorReporter = Rc<dyn Fn(&str, &RouterError)>;

/// Static route table, in declaration order.
///
/// Declaration order decides which route wins when several patterns match
/// the same location.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
	routes: Vec<(String, RouteDescriptor)>,
}

impl RouterConfig {
	/// Creates an empty route table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a named route.
	pub fn route(mut self, name: impl Into<String>, descriptor: RouteDescriptor) -> Self {
		self.routes.push((name.into(), descriptor));
		self
	}

	/// Returns the declared routes.
	pub fn routes(&self) -> &[(String, RouteDescriptor)] {
		&self.routes
	}

	/// Returns the number of declared routes.
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	/// Returns `true` when no route is declared.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}
}

/// Builds a [`NavigationStore`].
pub struct StoreBuilder {
	config: RouterConfig,
	history: Rc<dyn History>,
	settings: StoreSettings,
	reporter: Option<ErrorReporter>,
}

impl StoreBuilder {
	/// Replaces the settings.
	pub fn settings(mut self, settings: StoreSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Installs an error reporter. Reported errors are logged either way.
	pub fn on_error<F>(mut self, reporter: F) -> Self
	where
		F: Fn(&str, &RouterError) + 'static,
	{
		self.reporter = Some(Rc::new(reporter));
		self
	}

	/// Compiles the route table, scans the current location and starts
	/// listening to the history.
	///
	/// # Errors
	///
	/// Configuration errors: [`RouterError::DuplicateRoute`],
	/// [`RouterError::InvalidPattern`] and [`RouterError::AmbiguousHashField`].
	pub fn build(self) -> RouterResult<NavigationStore> {
		let Self {
			config,
			history,
			settings,
			reporter,
		} = self;

		let mut routes = Vec::with_capacity(config.routes.len());
		let mut index = HashMap::with_capacity(config.routes.len());
		for (name, descriptor) in config.routes {
			if name == WILDCARD {
				return Err(RouterError::InvalidPattern {
					pattern: descriptor.path().to_string(),
					reason: format!("route name '{}' is reserved", WILDCARD),
				});
			}
			if descriptor.fields().iter().any(|(field, _)| field == WILDCARD) {
				return Err(RouterError::InvalidPattern {
					pattern: descriptor.path().to_string(),
					reason: format!("field name '{}' is reserved", WILDCARD),
				});
			}
			if index.contains_key(&name) {
				return Err(RouterError::DuplicateRoute(name));
			}
			let codec = RouteCodec::with_case_sensitivity(descriptor, settings.case_sensitive)?;
			index.insert(name.clone(), routes.len());
			routes.push(CompiledRoute { name, codec });
		}

		let inner = Rc::new(StoreInner {
			routes,
			index,
			history: Rc::clone(&history),
			settings,
			reporter,
			state: RefCell::new(StoreState::default()),
			subscribers: Rc::new(RefCell::new(SubscriberRegistry::default())),
			queue: RefCell::new(VecDeque::new()),
			busy: Cell::new(false),
			writing: Cell::new(false),
			listener: RefCell::new(None),
		});

		inner.initial_scan(&history.current_location());

		let weak: Weak<StoreInner> = Rc::downgrade(&inner);
		let listener = history.listen(Rc::new(move |location: &Location| {
			if let Some(inner) = weak.upgrade() {
				inner.location_changed(location);
			}
		}));
		*inner.listener.borrow_mut() = Some(listener);

		debug!(
			routes = inner.routes.len(),
			active = ?inner.state.borrow().active,
			"navigation store ready"
		);

		Ok(NavigationStore { inner })
	}
}

impl fmt::Debug for StoreBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreBuilder")
			.field("routes", &self.config.len())
			.field("settings", &self.settings)
			.field("has_reporter", &self.reporter.is_some())
			.finish()
	}
}

/// Tracks the active route and the arguments of every route.
///
/// The store is single-threaded. Cloning it is cheap and every clone shares
/// the same state. A transition or location change requested while the
/// store is notifying subscribers is queued and runs once the current one
/// has finished, in request order.
///
/// The history listener is released when the last clone is dropped.
#[derive(Clone)]
pub struct NavigationStore {
	inner: Rc<StoreInner>,
}

impl fmt::Debug for NavigationStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("NavigationStore")
			.field("routes", &self.route_names())
			.field("active", &state.active)
			.field("subscribers", &self.inner.subscribers.borrow().len())
			.finish()
	}
}

impl NavigationStore {
	/// Returns a builder over a route table and a history.
	pub fn builder(config: RouterConfig, history: Rc<dyn History>) -> StoreBuilder {
		StoreBuilder {
			config,
			history,
			settings: StoreSettings::default(),
			reporter: None,
		}
	}

	/// Builds a store with default settings.
	pub fn new(config: RouterConfig, history: Rc<dyn History>) -> RouterResult<Self> {
		Self::builder(config, history).build()
	}

	/// Returns the settings the store was built with.
	pub fn settings(&self) -> &StoreSettings {
		&self.inner.settings
	}

	/// Returns the route names in declaration order.
	pub fn route_names(&self) -> Vec<String> {
		self.inner.routes.iter().map(|r| r.name.clone()).collect()
	}

	/// Checks if a route name exists.
	pub fn has_route(&self, name: &str) -> bool {
		self.inner.index.contains_key(name)
	}

	/// Returns the compiled codec of a route.
	pub fn codec(&self, route: &str) -> RouterResult<&RouteCodec> {
		self.inner.route(route).map(|r| &r.codec)
	}

	/// Returns accessors for one route.
	pub fn route(&self, route: &str) -> RouterResult<RouteControls<'_>> {
		let compiled = self.inner.route(route)?;
		Ok(RouteControls::new(self, &compiled.name))
	}

	/// Returns the first route whose pattern matches the location, with the
	/// captured path parameters. Arguments are not decoded.
	pub fn match_location(&self, location: &Location) -> Option<(String, PathParams)> {
		self.inner.routes.iter().find_map(|route| {
			route
				.codec
				.match_path(&location.pathname)
				.map(|params| (route.name.clone(), params))
		})
	}

	/// Returns the active route name.
	pub fn active_route(&self) -> Option<String> {
		self.inner.state.borrow().active.clone()
	}

	/// Checks whether `route` is the active route.
	pub fn is_active(&self, route: &str) -> bool {
		self.inner.state.borrow().active.as_deref() == Some(route)
	}

	/// Returns the stored arguments of a route.
	pub fn args(&self, route: &str) -> RouterResult<Args> {
		self.inner.route(route)?;
		Ok(self.inner.current_args(route))
	}

	/// Reads a stored value.
	///
	/// - `(route, "*")`: the whole argument object
	/// - `(route, field)`: one field, `null` when absent
	/// - `("*", "*")`: the active route name, `null` when none
	pub fn get_value(&self, route: &str, field: &str) -> RouterResult<Value> {
		if route == WILDCARD && field == WILDCARD {
			return Ok(self.active_route().map(Value::String).unwrap_or(Value::Null));
		}

		let compiled = self.inner.route(route)?;
		if field == WILDCARD {
			return Ok(Value::Object(self.inner.current_args(route)));
		}
		if compiled.codec.field(field).is_none() {
			return Err(RouterError::UnknownField {
				route: route.to_string(),
				field: field.to_string(),
			});
		}

		let state = self.inner.state.borrow();
		Ok(state
			.args
			.get(route)
			.and_then(|args| args.get(field))
			.cloned()
			.unwrap_or(Value::Null))
	}

	/// Registers a callback for `(route, field)`.
	///
	/// `field` may be `"*"` for the whole route. The callback receives the
	/// new field value, or the whole argument object.
	pub fn subscribe<F>(&self, route: &str, field: &str, callback: F) -> RouterResult<Subscription>
	where
		F: Fn(&Value) + 'static,
	{
		if route == WILDCARD && field == WILDCARD {
			return Ok(self.subscribe_active_route(callback));
		}

		let compiled = self.inner.route(route)?;
		if field != WILDCARD && compiled.codec.field(field).is_none() {
			return Err(RouterError::UnknownField {
				route: route.to_string(),
				field: field.to_string(),
			});
		}

		Ok(self.inner.subscribe(route, field, Rc::new(callback)))
	}

	/// Registers a callback for active route changes. It receives the new
	/// route name, or `null` when no route matches.
	pub fn subscribe_active_route<F>(&self, callback: F) -> Subscription
	where
		F: Fn(&Value) + 'static,
	{
		self.inner.subscribe(WILDCARD, WILDCARD, Rc::new(callback))
	}

	/// Turns an update into a partial argument object.
	///
	/// With a field name the update becomes `{field: update}`. Without one it
	/// must already be an object.
	pub fn transition_payload(&self, update: Value, field: Option<&str>) -> RouterResult<Args> {
		match (field, update) {
			(Some(field), update) => {
				let mut partial = Args::new();
				partial.insert(field.to_string(), update);
				Ok(partial)
			}
			(None, Value::Object(partial)) => Ok(partial),
			(None, other) => Err(RouterError::InvalidPayload(format!(
				"expected an object of route arguments, got {}",
				other
			))),
		}
	}

	/// Returns the href a transition with `partial` would navigate to,
	/// without changing anything.
	pub fn href(&self, route: &str, partial: &Args) -> RouterResult<String> {
		self.inner.preview(route, partial).map(|(href, _)| href)
	}

	/// Returns a link to the would-be next state of a route.
	///
	/// Fails like [`NavigationStore::transition`] does, without navigating.
	pub fn to_href(&self, route: &str, partial: Args) -> RouterResult<Link> {
		let href = self.href(route, &partial)?;
		Ok(Link::new(self.clone(), route, partial, href))
	}

	/// Merges `partial` into the arguments of `route`, notifies subscribers and
	/// writes the new location to the history.
	///
	/// A `null` value in `partial` removes that argument, or resets it to its
	/// fallback. The stored arguments are the validated ones, so they always
	/// equal what the written location decodes to. A push to the location the
	/// history is already at is written as a replace.
	///
	/// Subscribers are notified before the history is written. If the history
	/// then rejects the location, the store re-reads the history's current
	/// location, publishing the changes back, and the error is returned.
	///
	/// Returns the href of the new location. When called from a subscriber,
	/// the transition is queued and the href reflects the state at the time
	/// of the call.
	///
	/// # Errors
	///
	/// - [`RouterError::UnknownField`] when `partial` has a key the route does
	///   not declare.
	/// - [`RouterError::MissingPathParam`] when the merged arguments lack a
	///   path parameter.
	/// - [`RouterError::MissingRequiredField`] when they lack another required
	///   field.
	///
	/// In all of these cases the store is left unchanged.
	pub fn transition(
		&self,
		route: &str,
		partial: Args,
		method: NavigationType,
	) -> RouterResult<String> {
		let (href, _) = self.inner.preview(route, &partial)?;
		self.inner.submit(Operation::Transition {
			route: route.to_string(),
			partial,
			method,
		})?;
		Ok(href)
	}

	/// Transitions with [`NavigationType::Push`].
	pub fn push(&self, route: &str, partial: Args) -> RouterResult<String> {
		self.transition(route, partial, NavigationType::Push)
	}

	/// Transitions with [`NavigationType::Replace`].
	pub fn replace(&self, route: &str, partial: Args) -> RouterResult<String> {
		self.transition(route, partial, NavigationType::Replace)
	}

	/// Re-matches routes against a location that changed outside the store.
	///
	/// Normally called by the history listener. Decode failures are reported
	/// and the failing route is skipped. Nothing is written to the history.
	pub fn on_external_location_change(&self, location: &Location) {
		self.inner.location_changed(location);
	}
}

struct CompiledRoute {
	name: String,
	codec: RouteCodec,
}

#[derive(Default)]
struct StoreState {
	active: Option<String>,
	args: HashMap<String, Args>,
}

enum Operation {
	Transition {
		route: String,
		partial: Args,
		method: NavigationType,
	},
	External(Location),
}

impl Operation {
	fn label(&self) -> &str {
		match self {
			Self::Transition { route, .. } => route,
			Self::External(_) => WILDCARD,
		}
	}
}

struct StoreInner {
	routes: Vec<CompiledRoute>,
	index: HashMap<String, usize>,
	history: Rc<dyn History>,
	settings: StoreSettings,
	reporter: Option<ErrorReporter>,
	state: RefCell<StoreState>,
	subscribers: Rc<RefCell<SubscriberRegistry>>,
	queue: RefCell<VecDeque<Operation>>,
	busy: Cell<bool>,
	// Set while the store itself writes to the history
	writing: Cell<bool>,
	// Released with the store
	listener: RefCell<Option<HistoryListener>>,
}

/// Raises a flag for the guard's lifetime.
struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
	fn enter(flag: &'a Cell<bool>) -> Self {
		flag.set(true);
		Self(flag)
	}
}

impl Drop for FlagGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl StoreInner {
	fn route(&self, name: &str) -> RouterResult<&CompiledRoute> {
		self.index
			.get(name)
			.map(|&i| &self.routes[i])
			.ok_or_else(|| RouterError::UnknownRoute(name.to_string()))
	}

	fn current_args(&self, route: &str) -> Args {
		self.state
			.borrow()
			.args
			.get(route)
			.cloned()
			.unwrap_or_default()
	}

	fn subscribe(&self, route: &str, field: &str, callback: SubscriberFn) -> Subscription {
		Subscription::new(&self.subscribers, route, field, callback)
	}

	fn publish(&self, route: &str, field: &str, value: &Value) {
		subscription::publish(&self.subscribers, route, field, value);
	}

	fn report(&self, route: &str, error: &RouterError) {
		warn!(route, error = %error, "navigation error");
		if let Some(reporter) = &self.reporter {
			reporter(route, error);
		}
	}

	/// Merges and encodes without touching any state.
	fn preview(&self, route: &str, partial: &Args) -> RouterResult<(String, Location)> {
		let compiled = self.route(route)?;
		check_declared(compiled, partial)?;
		let next = merge(&self.current_args(route), partial);
		compiled.codec.encode_location(&next)
	}

	/// Finds the first route that matches and decodes, reporting routes that
	/// match but fail to decode.
	fn resolve(&self, location: &Location) -> Option<(String, Args)> {
		for route in &self.routes {
			match route.codec.match_location(location) {
				None => continue,
				Some(Ok(args)) => return Some((route.name.clone(), args)),
				Some(Err(error)) => self.report(&route.name, &error),
			}
		}
		None
	}

	fn initial_scan(&self, location: &Location) {
		let resolved = self.resolve(location);
		let mut state = self.state.borrow_mut();
		for route in &self.routes {
			state.args.insert(route.name.clone(), Args::new());
		}
		if let Some((name, args)) = resolved {
			state.args.insert(name.clone(), args);
			state.active = Some(name);
		}
	}

	fn location_changed(&self, location: &Location) {
		if self.writing.get() {
			// State already holds what was just written
			trace!(href = %location.href(), "ignoring own history write");
			return;
		}
		// Overflow is already reported by submit
		let _ = self.submit(Operation::External(location.clone()));
	}

	/// Runs an operation now, or queues it while another one is in flight.
	///
	/// Queued operations are drained before returning. Their failures are
	/// reported instead of returned.
	fn submit(&self, operation: Operation) -> RouterResult<()> {
		if self.busy.get() {
			let mut queue = self.queue.borrow_mut();
			if queue.len() >= self.settings.max_queued_operations {
				drop(queue);
				let error = self.overflow_error();
				self.report(operation.label(), &error);
				return Err(error);
			}
			debug!(target_route = operation.label(), queued = queue.len() + 1, "operation queued");
			queue.push_back(operation);
			return Ok(());
		}

		let _guard = FlagGuard::enter(&self.busy);
		let result = self.apply(operation);

		let mut drained = 0;
		loop {
			let next = self.queue.borrow_mut().pop_front();
			let Some(operation) = next else {
				break;
			};
			if drained >= self.settings.max_queued_operations {
				let dropped = self.queue.borrow_mut().drain(..).count() + 1;
				let error = self.overflow_error();
				warn!(dropped, "dropping queued navigation operations");
				self.report(operation.label(), &error);
				break;
			}
			drained += 1;
			let label = operation.label().to_string();
			if let Err(error) = self.apply(operation) {
				self.report(&label, &error);
			}
		}

		result
	}

	fn overflow_error(&self) -> RouterError {
		RouterError::NavigationFailed(format!(
			"more than {} navigation operations queued",
			self.settings.max_queued_operations
		))
	}

	fn apply(&self, operation: Operation) -> RouterResult<()> {
		match operation {
			Operation::Transition {
				route,
				partial,
				method,
			} => self.apply_transition(&route, &partial, method),
			Operation::External(location) => {
				self.apply_external(&location);
				Ok(())
			}
		}
	}

	fn apply_transition(&self, route: &str, partial: &Args, method: NavigationType) -> RouterResult<()> {
		let compiled = self.route(route)?;
		check_declared(compiled, partial)?;
		let current = self.current_args(route);
		// Validate and encode first so a rejected update leaves the store untouched
		let next = compiled.codec.validate_args(&merge(&current, partial))?;
		let (href, location) = compiled.codec.encode_location(&next)?;

		let changed: Vec<(&String, Value)> = partial
			.keys()
			.map(|key| (key, next.get(key).cloned().unwrap_or(Value::Null)))
			.filter(|(key, value)| current.get(*key).unwrap_or(&Value::Null) != value)
			.collect();

		let route_changed = {
			let mut state = self.state.borrow_mut();
			let route_changed = state.active.as_deref() != Some(route);
			state.active = Some(route.to_string());
			state.args.insert(route.to_string(), next.clone());
			route_changed
		};

		debug!(route, href = %href, ?method, route_changed, changed = changed.len(), "transition");

		if route_changed {
			self.publish(WILDCARD, WILDCARD, &Value::String(route.to_string()));
		}
		for (key, value) in &changed {
			self.publish(route, key, value);
		}
		self.publish(route, WILDCARD, &Value::Object(next.clone()));

		let method = match method {
			NavigationType::Push if location.same_destination(&self.history.current_location()) => {
				debug!(route, href = %href, "same destination, replacing instead of pushing");
				NavigationType::Replace
			}
			method => method,
		};
		let written = {
			let _writing = FlagGuard::enter(&self.writing);
			match method {
				NavigationType::Push => self.history.push(location),
				NavigationType::Replace => self.history.replace(location),
			}
		};

		if let Err(error) = &written {
			// Subscribers already saw the new state; walk them back to where
			// the history actually is
			warn!(route, href = %href, error = %error, "history rejected the transition");
			self.apply_external(&self.history.current_location());
			if self.state.borrow().active.as_deref() != Some(route) {
				self.restore_args(route, current);
			}
		}
		written
	}

	/// Puts back the arguments of an inactive route, publishing what changed.
	fn restore_args(&self, route: &str, args: Args) {
		let previous = self
			.state
			.borrow_mut()
			.args
			.insert(route.to_string(), args.clone())
			.unwrap_or_default();
		if previous == args {
			return;
		}
		for (key, value) in &changed_keys(&previous, &args) {
			self.publish(route, key, value);
		}
		self.publish(route, WILDCARD, &Value::Object(args));
	}

	fn apply_external(&self, location: &Location) {
		let resolved = self.resolve(location);

		let Some((name, args)) = resolved else {
			let was_active = self.state.borrow_mut().active.take();
			if let Some(previous) = was_active {
				debug!(previous = %previous, pathname = %location.pathname, "no route matches");
				self.publish(WILDCARD, WILDCARD, &Value::Null);
			}
			return;
		};

		let (route_changed, previous) = {
			let mut state = self.state.borrow_mut();
			let route_changed = state.active.as_deref() != Some(name.as_str());
			let previous = state.args.insert(name.clone(), args.clone()).unwrap_or_default();
			state.active = Some(name.clone());
			(route_changed, previous)
		};

		if !route_changed && previous == args {
			return;
		}

		let changed = changed_keys(&previous, &args);

		debug!(route = %name, pathname = %location.pathname, route_changed, changed = changed.len(), "location changed");

		if route_changed {
			self.publish(WILDCARD, WILDCARD, &Value::String(name.clone()));
		}
		for (key, value) in &changed {
			self.publish(&name, key, value);
		}
		self.publish(&name, WILDCARD, &Value::Object(args.clone()));
	}
}

/// Keys whose value differs between two argument objects, with `null` for
/// removed keys.
fn changed_keys(previous: &Args, next: &Args) -> Vec<(String, Value)> {
	let mut changed: Vec<(String, Value)> = next
		.iter()
		.filter(|(key, value)| previous.get(*key) != Some(*value))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();
	changed.extend(
		previous
			.keys()
			.filter(|key| !next.contains_key(*key))
			.map(|key| (key.clone(), Value::Null)),
	);
	changed
}

fn check_declared(compiled: &CompiledRoute, partial: &Args) -> RouterResult<()> {
	match partial.keys().find(|key| compiled.codec.field(key).is_none()) {
		Some(key) => Err(RouterError::UnknownField {
			route: compiled.name.clone(),
			field: key.clone(),
		}),
		None => Ok(()),
	}
}

/// Shallow merge. `null` values remove the key.
fn merge(current: &Args, partial: &Args) -> Args {
	let mut next = current.clone();
	for (key, value) in partial {
		if value.is_null() {
			next.remove(key);
		} else {
			next.insert(key.clone(), value.clone());
		}
	}
	next
}
