//! Reactive navigation store
//!
//! This module provides access to trouty-pages: the store that tracks the
//! active route and its arguments, the history contract it drives, and the
//! accessors UI code builds on.
//!
//! ## Architecture
//!
//! - **Store**: per-route argument state, active route, subscriptions
//! - **History**: `push`/`replace`/`listen` contract, in-memory implementation
//! - **Accessors**: route and argument controls, links with click handling
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use trouty::pages::{ClickEvent, MemoryHistory, NavigationStore, RouterConfig};
//! use trouty::urls::{Param, RouteDescriptor};
//!
//! let history = Rc::new(MemoryHistory::new("/"));
//! let store = NavigationStore::new(
//!     RouterConfig::new()
//!         .route("home", RouteDescriptor::new("/"))
//!         .route("user", RouteDescriptor::new("/users/:id").field("id", Param::number())),
//!     history.clone(),
//! )?;
//!
//! let link = store.route("user")?.arg("id")?.link(serde_json::json!(7))?;
//! assert_eq!(link.href(), "/users/7");
//!
//! let mut click = ClickEvent::primary();
//! assert!(link.on_click(&mut click)?);
//! assert!(click.is_default_prevented());
//! assert_eq!(store.active_route().as_deref(), Some("user"));
//! # Ok::<(), trouty::urls::RouterError>(())
//! ```

// Re-export all trouty-pages functionality
pub use trouty_pages::*;
