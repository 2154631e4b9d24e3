//! # Trouty
//!
//! Typed route arguments and a reactive navigation store.
//!
//! A route declares where each of its arguments lives in a location: a path
//! segment, a query string key, the hash fragment or the history state.
//! Trouty decodes locations into argument objects, encodes argument objects
//! back into locations, and keeps a store of the current arguments of every
//! route that UI code can read, subscribe to and update.
//!
//! ## Feature Flags
//!
//! - `pages` (default) - Navigation store, history, links and accessors
//!
//! The route codec ([`urls`]) is always available.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "pages")]
//! # {
//! use std::rc::Rc;
//! use trouty::prelude::*;
//!
//! let store = NavigationStore::new(
//!     RouterConfig::new().route(
//!         "foo",
//!         RouteDescriptor::new("/foo/:id")
//!             .field("id", Param::string())
//!             .field("search", Query::string().fallback("")),
//!     ),
//!     Rc::new(MemoryHistory::new("/foo/123?search=baz")),
//! )?;
//!
//! assert_eq!(store.get_value("foo", "search")?, "baz");
//! # }
//! # Ok::<(), trouty::urls::RouterError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "pages")]
#[cfg_attr(docsrs, doc(cfg(feature = "pages")))]
pub mod pages;
pub mod urls;

pub use trouty_urls::{
	Args, FieldDescriptor, Location, PathParams, PathPattern, RouteCodec, RouteDescriptor,
	RouterError, RouterResult, Source,
};

#[cfg(feature = "pages")]
pub use trouty_pages::{
	History, MemoryHistory, NavigationStore, NavigationType, RouterConfig, RouterContext,
	StoreSettings, Subscription,
};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```rust
/// use trouty::prelude::*;
/// ```
pub mod prelude {
	pub use crate::urls::{
		Args, FieldDescriptor, Hash, Location, Param, Query, RouteCodec, RouteDescriptor,
		RouterError, RouterResult, Source, State, Validation,
	};

	#[cfg(feature = "pages")]
	pub use crate::pages::{
		ArgControls, ClickEvent, History, Link, MemoryHistory, NavigationStore, NavigationType,
		RouteControls, RouterConfig, RouterContext, StoreSettings, Subscription, provide_router,
		use_router,
	};
}
