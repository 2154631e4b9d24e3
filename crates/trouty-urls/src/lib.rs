//! Typed route arguments for Trouty.
//!
//! This crate turns locations into argument objects and back. A route is a
//! path pattern plus a set of fields, each living in one of four places of a
//! location:
//!
//! - [`Source::Param`]: a `:name` path segment
//! - [`Source::Query`]: a query string key
//! - [`Source::Hash`]: the hash fragment (at most one field per route)
//! - [`Source::State`]: history state, never string-serialized
//!
//! ## Example
//!
//! ```
//! use trouty_urls::{Location, Param, Query, RouteCodec, RouteDescriptor};
//!
//! let codec = RouteCodec::new(
//!     RouteDescriptor::new("/foo/:id")
//!         .field("id", Param::string())
//!         .field("search", Query::string().fallback("")),
//! )?;
//!
//! let args = codec
//!     .match_location(&Location::parse("/foo/123?search=baz"))
//!     .expect("path matches")?;
//! assert_eq!(args["id"], "123");
//!
//! let (href, _location) = codec.encode_location(&args)?;
//! assert_eq!(href, "/foo/123?search=baz");
//! # Ok::<(), trouty_urls::RouterError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod error;
pub mod field;
pub mod location;
pub mod pattern;

pub use codec::{Args, RouteCodec, RouteDescriptor};
pub use error::{FieldError, RouterError, RouterResult};
pub use field::{
	FieldDescriptor, Hash, Kind, Param, Query, RawValue, Source, State, ValidateFn, Validation,
};
pub use location::Location;
pub use pattern::{PathParams, PathPattern};
