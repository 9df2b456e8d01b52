//! Multi-destination routing: per-level files, single-file mode, and
//! tag-driven sub-directory redirection.

mod route;
#[allow(clippy::module_inception)]
mod router;

pub use route::{Route, RouteKey};
pub use router::Router;
