//! Reactive navigation state for Trouty.
//!
//! A [`NavigationStore`] owns a history handle and a table of routes built
//! with [`trouty_urls`]. It keeps the decoded arguments of every route, tracks
//! which route is active and notifies subscribers per route or per argument.
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use serde_json::{Value, json};
//! use trouty_pages::{MemoryHistory, NavigationStore, RouterConfig};
//! use trouty_urls::{Param, Query, RouteDescriptor};
//!
//! let history = Rc::new(MemoryHistory::new("/foo/123?search=baz"));
//! let store = NavigationStore::new(
//!     RouterConfig::new().route(
//!         "foo",
//!         RouteDescriptor::new("/foo/:id")
//!             .field("id", Param::string())
//!             .field("search", Query::string().fallback("")),
//!     ),
//!     history.clone(),
//! )?;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _sub = store.subscribe("foo", "search", move |v: &Value| sink.borrow_mut().push(v.clone()))?;
//!
//! let search = store.route("foo")?.arg("search")?;
//! assert_eq!(search.push(json!("purple"))?, "/foo/123?search=purple");
//! assert_eq!(*seen.borrow(), [json!("purple")]);
//! # Ok::<(), trouty_urls::RouterError>(())
//! ```
//!
//! ## Modules
//!
//! - [`store`]: the store, its configuration and builder
//! - [`history`]: the history contract and [`MemoryHistory`]
//! - [`subscription`]: subscription handles
//! - [`controls`]: per-route and per-argument accessors
//! - [`link`]: hrefs with anchor click handling
//! - [`context`]: a provide/use slot for the store
//! - [`settings`]: store tunables, loadable from TOML

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod controls;
pub mod history;
pub mod link;
pub mod settings;
pub mod store;
pub mod subscription;

pub use context::{RouterContext, provide_router, use_router};
pub use controls::{ArgControls, RouteControls};
pub use history::{History, HistoryAction, HistoryListener, LocationCallback, MemoryHistory, NavigationType};
pub use link::{ClickEvent, Link, MouseButton};
pub use settings::StoreSettings;
pub use store::{ErrorReporter, NavigationStore, RouterConfig, StoreBuilder};
pub use subscription::{Subscription, WILDCARD};
