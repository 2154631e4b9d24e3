//! A slot that hands the navigation store to UI code.
//!
//! The UI layer creates a [`RouterContext`] up front, provides the store once
//! it is built and reads it wherever routes are rendered:
//!
//! ```
//! use std::rc::Rc;
//! use trouty_pages::{MemoryHistory, NavigationStore, RouterConfig, RouterContext};
//! use trouty_pages::context::{provide_router, use_router};
//! use trouty_urls::RouteDescriptor;
//!
//! let ctx = RouterContext::new();
//! assert!(use_router(&ctx).is_err());
//!
//! let config = RouterConfig::new().route("home", RouteDescriptor::new("/"));
//! let store = NavigationStore::new(config, Rc::new(MemoryHistory::new("/")))?;
//! provide_router(&ctx, store);
//!
//! assert_eq!(use_router(&ctx)?.active_route().as_deref(), Some("home"));
//! # Ok::<(), trouty_urls::RouterError>(())
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use trouty_urls::{RouterError, RouterResult};

use crate::store::NavigationStore;

/// Shared, initially empty holder of a [`NavigationStore`].
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct RouterContext {
	slot: Rc<RefCell<Option<NavigationStore>>>,
}

impl RouterContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether a store has been provided.
	pub fn is_ready(&self) -> bool {
		self.slot.borrow().is_some()
	}
}

/// Provides a store, replacing any earlier one.
pub fn provide_router(ctx: &RouterContext, store: NavigationStore) {
	*ctx.slot.borrow_mut() = Some(store);
}

/// Reads the provided store.
///
/// # Errors
///
/// [`RouterError::StoreUsedBeforeReady`] when nothing was provided yet.
pub fn use_router(ctx: &RouterContext) -> RouterResult<NavigationStore> {
	ctx.slot
		.borrow()
		.clone()
		.ok_or(RouterError::StoreUsedBeforeReady)
}

/// Removes the provided store. Returns it when there was one.
pub fn take_router(ctx: &RouterContext) -> Option<NavigationStore> {
	ctx.slot.borrow_mut().take()
}
