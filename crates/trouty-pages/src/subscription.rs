//! Subscriber buckets keyed by `(route, field)`.
//!
//! The field key [`WILDCARD`] means "the whole route", and the pair
//! `(WILDCARD, WILDCARD)` carries active-route changes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

/// Key segment meaning "every field" (or "every route").
pub const WILDCARD: &str = "*";

/// Callback invoked with the published value.
pub type SubscriberFn = Rc<dyn Fn(&Value)>;

type BucketKey = (String, String);

/// Insertion-ordered subscriber lists.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
	next_id: u64,
	buckets: HashMap<BucketKey, Vec<(u64, SubscriberFn)>>,
}

impl SubscriberRegistry {
	pub(crate) fn insert(&mut self, route: &str, field: &str, callback: SubscriberFn) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		self.buckets
			.entry((route.to_string(), field.to_string()))
			.or_default()
			.push((id, callback));
		id
	}

	pub(crate) fn remove(&mut self, key: &BucketKey, id: u64) -> bool {
		let Some(bucket) = self.buckets.get_mut(key) else {
			return false;
		};
		let before = bucket.len();
		bucket.retain(|(other, _)| *other != id);
		let removed = bucket.len() != before;
		if bucket.is_empty() {
			self.buckets.remove(key);
		}
		removed
	}

	fn contains(&self, key: &BucketKey, id: u64) -> bool {
		self.buckets
			.get(key)
			.is_some_and(|bucket| bucket.iter().any(|(other, _)| *other == id))
	}

	fn snapshot(&self, key: &BucketKey) -> Vec<(u64, SubscriberFn)> {
		self.buckets
			.get(key)
			.map(|bucket| bucket.iter().map(|(id, cb)| (*id, Rc::clone(cb))).collect())
			.unwrap_or_default()
	}

	pub(crate) fn len(&self) -> usize {
		self.buckets.values().map(Vec::len).sum()
	}
}

/// Calls every subscriber of `(route, field)` with `value`.
///
/// The bucket is snapshotted first, so subscribers may subscribe or
/// unsubscribe while being called. A subscriber removed before its turn is
/// skipped. Returns the number of callbacks invoked.
pub(crate) fn publish(
	registry: &RefCell<SubscriberRegistry>,
	route: &str,
	field: &str,
	value: &Value,
) -> usize {
	let key = (route.to_string(), field.to_string());
	let snapshot = registry.borrow().snapshot(&key);
	let mut called = 0;
	for (id, callback) in snapshot {
		if !registry.borrow().contains(&key, id) {
			continue;
		}
		callback(value);
		called += 1;
	}
	tracing::trace!(route, field, subscribers = called, "published");
	called
}

/// Handle to a registered subscriber.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
/// Calling it more than once, or after the store is gone, is a no-op.
pub struct Subscription {
	registry: Weak<RefCell<SubscriberRegistry>>,
	key: BucketKey,
	id: u64,
	active: Cell<bool>,
}

impl Subscription {
	pub(crate) fn new(
		registry: &Rc<RefCell<SubscriberRegistry>>,
		route: &str,
		field: &str,
		callback: SubscriberFn,
	) -> Self {
		let id = registry.borrow_mut().insert(route, field, callback);
		Self {
			registry: Rc::downgrade(registry),
			key: (route.to_string(), field.to_string()),
			id,
			active: Cell::new(true),
		}
	}

	/// The route key this subscription listens on.
	pub fn route(&self) -> &str {
		&self.key.0
	}

	/// The field key this subscription listens on.
	pub fn field(&self) -> &str {
		&self.key.1
	}

	/// Whether the callback is still registered.
	pub fn is_active(&self) -> bool {
		self.active.get() && self.registry.strong_count() > 0
	}

	/// Removes the callback. Returns whether this call removed it.
	pub fn unsubscribe(&self) -> bool {
		if !self.active.replace(false) {
			return false;
		}
		match self.registry.upgrade() {
			Some(registry) => registry.borrow_mut().remove(&self.key, self.id),
			None => false,
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("route", &self.key.0)
			.field("field", &self.key.1)
			.field("active", &self.is_active())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn registry() -> Rc<RefCell<SubscriberRegistry>> {
		Rc::new(RefCell::new(SubscriberRegistry::default()))
	}

	fn counter() -> (Rc<Cell<usize>>, SubscriberFn) {
		let count = Rc::new(Cell::new(0));
		let sink = Rc::clone(&count);
		(count, Rc::new(move |_: &Value| sink.set(sink.get() + 1)))
	}

	#[rstest]
	fn test_publish_reaches_only_matching_bucket() {
		let registry = registry();
		let (route_count, route_cb) = counter();
		let (field_count, field_cb) = counter();
		let _a = Subscription::new(&registry, "foo", WILDCARD, route_cb);
		let _b = Subscription::new(&registry, "foo", "id", field_cb);

		let called = publish(&registry, "foo", WILDCARD, &json!({}));

		assert_eq!(called, 1);
		assert_eq!(route_count.get(), 1);
		assert_eq!(field_count.get(), 0);
	}

	#[rstest]
	fn test_publish_in_insertion_order() {
		let registry = registry();
		let order = Rc::new(RefCell::new(Vec::new()));
		let subs: Vec<Subscription> = (0..3)
			.map(|n| {
				let order = Rc::clone(&order);
				Subscription::new(
					&registry,
					"r",
					"f",
					Rc::new(move |_: &Value| order.borrow_mut().push(n)),
				)
			})
			.collect();

		publish(&registry, "r", "f", &Value::Null);

		assert_eq!(*order.borrow(), [0, 1, 2]);
		assert_eq!(subs.len(), 3);
	}

	#[rstest]
	fn test_unsubscribe_is_idempotent() {
		let registry = registry();
		let (count, cb) = counter();
		let sub = Subscription::new(&registry, "r", "f", cb);

		assert!(sub.unsubscribe());
		assert!(!sub.unsubscribe());
		assert!(!sub.is_active());

		publish(&registry, "r", "f", &Value::Null);
		assert_eq!(count.get(), 0);
		assert_eq!(registry.borrow().len(), 0);
	}

	#[rstest]
	fn test_subscriber_removed_mid_publish_is_skipped() {
		let registry = registry();
		let (count, cb) = counter();
		let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

		let slot = Rc::clone(&victim);
		let _killer = Subscription::new(
			&registry,
			"r",
			"f",
			Rc::new(move |_: &Value| {
				if let Some(sub) = slot.borrow().as_ref() {
					sub.unsubscribe();
				}
			}),
		);
		*victim.borrow_mut() = Some(Subscription::new(&registry, "r", "f", cb));

		let called = publish(&registry, "r", "f", &Value::Null);

		assert_eq!(called, 1);
		assert_eq!(count.get(), 0);
	}

	#[rstest]
	fn test_unsubscribe_after_registry_dropped() {
		let registry = registry();
		let (_, cb) = counter();
		let sub = Subscription::new(&registry, "r", "f", cb);
		drop(registry);

		assert!(!sub.is_active());
		assert!(!sub.unsubscribe());
	}
}
