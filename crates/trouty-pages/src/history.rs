//! The history collaborator contract and an in-memory implementation.
//!
//! The store never talks to a browser directly. It asks a [`History`] for
//! the current location, hands it new locations with `push`/`replace`, and
//! listens for locations changed elsewhere (back/forward buttons, other code).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use trouty_urls::{Location, RouterError, RouterResult};

/// How a transition writes its location to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationType {
	/// Add a new history entry.
	Push,
	/// Overwrite the current history entry.
	Replace,
}

/// The last change a [`MemoryHistory`] went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
	/// An entry was added.
	Push,
	/// The current entry was overwritten.
	Replace,
	/// The index moved (initial state, back, forward, go).
	Pop,
}

/// Callback invoked with every new location.
pub type LocationCallback = Rc<dyn Fn(&Location)>;

/// What the navigation store needs from a history.
pub trait History {
	/// Returns the current location.
	fn current_location(&self) -> Location;

	/// Adds a history entry.
	fn push(&self, location: Location) -> RouterResult<()>;

	/// Overwrites the current history entry.
	fn replace(&self, location: Location) -> RouterResult<()>;

	/// Registers a callback for location changes.
	///
	/// The callback stays registered until the returned listener is
	/// cancelled or dropped.
	fn listen(&self, callback: LocationCallback) -> HistoryListener;
}

/// Registration handle returned by [`History::listen`].
///
/// Dropping the handle removes the callback.
pub struct HistoryListener {
	cancel: Option<Box<dyn FnOnce()>>,
}

impl HistoryListener {
	/// Creates a handle that runs `cancel` once when cancelled or dropped.
	pub fn new(cancel: impl FnOnce() + 'static) -> Self {
		Self {
			cancel: Some(Box::new(cancel)),
		}
	}

	/// A handle with nothing to release, for histories that never change on
	/// their own.
	pub fn detached() -> Self {
		Self { cancel: None }
	}

	/// Removes the callback now.
	pub fn cancel(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl Drop for HistoryListener {
	fn drop(&mut self) {
		self.release();
	}
}

impl fmt::Debug for HistoryListener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HistoryListener")
			.field("active", &self.cancel.is_some())
			.finish()
	}
}

type ListenerList = RefCell<Vec<(u64, LocationCallback)>>;

/// An in-memory history stack.
///
/// Useful for tests and for hosts without a browser. Every change,
/// including `push` and `replace`, is reported to listeners.
pub struct MemoryHistory {
	entries: RefCell<Vec<Location>>,
	index: Cell<usize>,
	action: Cell<HistoryAction>,
	listeners: Rc<ListenerList>,
	next_listener: Cell<u64>,
}

impl MemoryHistory {
	/// Creates a history with a single entry parsed from `href`.
	pub fn new(href: &str) -> Self {
		Self::with_location(Location::parse(href))
	}

	/// Creates a history with a single entry.
	pub fn with_location(location: Location) -> Self {
		Self {
			entries: RefCell::new(vec![location]),
			index: Cell::new(0),
			action: Cell::new(HistoryAction::Pop),
			listeners: Rc::new(RefCell::new(Vec::new())),
			next_listener: Cell::new(0),
		}
	}

	/// Returns a copy of every entry.
	pub fn entries(&self) -> Vec<Location> {
		self.entries.borrow().clone()
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Always false: a memory history has at least one entry.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// Returns the index of the current entry.
	pub fn index(&self) -> usize {
		self.index.get()
	}

	/// Returns the last change.
	pub fn action(&self) -> HistoryAction {
		self.action.get()
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Moves `delta` entries, clamped to the stack. Returns whether the
	/// index changed.
	pub fn go(&self, delta: isize) -> bool {
		let last = self.len() - 1;
		let current = self.index.get();
		let target = current.saturating_add_signed(delta).min(last);
		if target == current {
			return false;
		}

		self.index.set(target);
		self.action.set(HistoryAction::Pop);
		self.notify();
		true
	}

	/// Moves one entry back.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Moves one entry forward.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	fn notify(&self) {
		let location = self.current_location();
		// Snapshot so listeners may register or cancel while being notified
		let listeners: Vec<LocationCallback> = self
			.listeners
			.borrow()
			.iter()
			.map(|(_, callback)| Rc::clone(callback))
			.collect();
		for callback in listeners {
			callback(&location);
		}
	}
}

impl fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryHistory")
			.field("entries", &self.entries.borrow().len())
			.field("index", &self.index.get())
			.field("action", &self.action.get())
			.finish()
	}
}

impl History for MemoryHistory {
	fn current_location(&self) -> Location {
		self.entries.borrow()[self.index.get()].clone()
	}

	fn push(&self, location: Location) -> RouterResult<()> {
		if !location.pathname.starts_with('/') {
			return Err(RouterError::NavigationFailed(format!(
				"pathname '{}' is not absolute",
				location.pathname
			)));
		}
		{
			let mut entries = self.entries.borrow_mut();
			let next = self.index.get() + 1;
			entries.truncate(next);
			entries.push(location);
			self.index.set(next);
		}
		self.action.set(HistoryAction::Push);
		self.notify();
		Ok(())
	}

	fn replace(&self, location: Location) -> RouterResult<()> {
		if !location.pathname.starts_with('/') {
			return Err(RouterError::NavigationFailed(format!(
				"pathname '{}' is not absolute",
				location.pathname
			)));
		}
		self.entries.borrow_mut()[self.index.get()] = location;
		self.action.set(HistoryAction::Replace);
		self.notify();
		Ok(())
	}

	fn listen(&self, callback: LocationCallback) -> HistoryListener {
		let id = self.next_listener.get();
		self.next_listener.set(id + 1);
		self.listeners.borrow_mut().push((id, callback));

		let listeners: Weak<ListenerList> = Rc::downgrade(&self.listeners);
		HistoryListener::new(move || {
			if let Some(listeners) = listeners.upgrade() {
				listeners.borrow_mut().retain(|(other, _)| *other != id);
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn recorder() -> (Rc<RefCell<Vec<String>>>, LocationCallback) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		let callback: LocationCallback =
			Rc::new(move |location: &Location| sink.borrow_mut().push(location.href()));
		(seen, callback)
	}

	#[rstest]
	fn test_initial_location() {
		let history = MemoryHistory::new("/foo/1?x=2#h");
		assert_eq!(history.current_location().href(), "/foo/1?x=2#h");
		assert_eq!(history.len(), 1);
		assert_eq!(history.action(), HistoryAction::Pop);
	}

	#[rstest]
	fn test_push_truncates_forward_entries() {
		let history = MemoryHistory::new("/a");
		history.push(Location::parse("/b")).unwrap();
		history.push(Location::parse("/c")).unwrap();
		assert!(history.back());
		assert!(history.back());

		history.push(Location::parse("/d")).unwrap();

		let hrefs: Vec<String> = history.entries().iter().map(Location::href).collect();
		assert_eq!(hrefs, ["/a", "/d"]);
		assert_eq!(history.index(), 1);
		assert_eq!(history.action(), HistoryAction::Push);
	}

	#[rstest]
	fn test_replace_overwrites_current_entry() {
		let history = MemoryHistory::new("/a");
		history.replace(Location::parse("/b")).unwrap();
		assert_eq!(history.len(), 1);
		assert_eq!(history.current_location().href(), "/b");
		assert_eq!(history.action(), HistoryAction::Replace);
	}

	#[rstest]
	fn test_go_is_clamped() {
		let history = MemoryHistory::new("/a");
		history.push(Location::parse("/b")).unwrap();

		assert!(!history.forward());
		assert!(history.go(-5));
		assert_eq!(history.index(), 0);
		assert!(!history.back());
	}

	#[rstest]
	fn test_listeners_see_every_change() {
		let history = MemoryHistory::new("/a");
		let (seen, callback) = recorder();
		let _listener = history.listen(callback);

		history.push(Location::parse("/b")).unwrap();
		history.replace(Location::parse("/c")).unwrap();
		history.back();

		assert_eq!(*seen.borrow(), ["/b", "/c", "/a"]);
	}

	#[rstest]
	fn test_dropping_listener_unsubscribes() {
		let history = MemoryHistory::new("/a");
		let (seen, callback) = recorder();
		let listener = history.listen(callback);
		assert_eq!(history.listener_count(), 1);

		drop(listener);
		history.push(Location::parse("/b")).unwrap();

		assert_eq!(history.listener_count(), 0);
		assert!(seen.borrow().is_empty());
	}

	#[rstest]
	fn test_relative_pathname_rejected() {
		let history = MemoryHistory::new("/a");
		let result = history.push(Location::new("relative"));
		assert!(matches!(result, Err(RouterError::NavigationFailed(_))));
		assert_eq!(history.len(), 1);
	}
}
