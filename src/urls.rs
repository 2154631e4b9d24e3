//! Path patterns and typed route arguments.
//!
//! # Examples
//!
//! ```rust
//! use trouty::urls::{Hash, Location, RouteCodec, RouteDescriptor};
//!
//! let codec = RouteCodec::new(RouteDescriptor::new("/hashJson").field("a", Hash::json()))?;
//! let args = codec
//!     .match_location(&Location::parse("/hashJson#%5B%22foo%22%5D"))
//!     .expect("path matches")?;
//! assert_eq!(args["a"], serde_json::json!(["foo"]));
//! # Ok::<(), trouty::urls::RouterError>(())
//! ```

pub use trouty_urls::*;
