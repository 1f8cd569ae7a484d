//! URL routing for trellis.
//!
//! This crate owns everything between a route definition and a matched
//! route: the template compiler, the [`Route`](routers::Route) entity, the
//! [`Router`](routers::Router) table with its group scopes and match cache,
//! URL generation and the persisted route cache.
//!
//! ## Example
//!
//! ```
//! use trellis_urls::routers::Router;
//! use hyper::Method;
//!
//! let mut router = Router::new();
//! router
//! 	.get("/users/{id}", "UserController@show")
//! 	.unwrap()
//! 	.where_number("id")
//! 	.unwrap()
//! 	.name("users.show")
//! 	.unwrap();
//!
//! let matched = router.resolve(&Method::GET, "/users/42", None, "http").unwrap();
//! assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));
//! assert_eq!(router.url("users.show", &[("id", "7")]).unwrap(), "/users/7");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod routers;

// Re-export commonly used types from routers
pub mod prelude {
	pub use crate::routers::{
		Action, ActionSet, Arguments, Controller, ControllerRegistry, GroupAttributes,
		HandlerRef, HandlerReturn, ParamDescriptor, ResourceOptions, Route, RouteId, RouteMatch,
		Router,
	};
}
