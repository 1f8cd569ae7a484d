//! # Trellis
//!
//! Routing and request dispatch for Rust HTTP services.
//!
//! Trellis compiles route templates into matchers, keeps an ordered route
//! table with groups, named routes and a memoized lookup cache, and runs
//! matched requests through middleware and dependency-resolving handlers.
//!
//! ## Feature Flags
//!
//! - `dispatch` (default) - The dispatch pipeline: method override, middleware,
//!   argument resolution and response normalization
//!
//! [`RoutingSettings`] is always available; the route table reads its match
//! cache and resource defaults from it.
//!
//! ## Quick Example
//!
//! ```rust
//! use trellis::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let mut router = Router::new();
//! router
//!     .group(GroupAttributes::new().prefix("/api").name("api."), |r| {
//!         r.get(
//!             "/users/{id}",
//!             HandlerRef::closure(vec![ParamDescriptor::int("id")], |args| async move {
//!                 Ok(serde_json::json!({ "id": args.int("id") }))
//!             }),
//!         )?
//!         .name("users.show")?
//!         .where_number("id")?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     router.url("api.users.show", &[("id", "5")]).unwrap(),
//!     "/api/users/5"
//! );
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//! let request = Request::builder().uri("/api/users/5").build().unwrap();
//! let response = dispatcher.dispatch(request).await.unwrap();
//! assert_eq!(response.body_text(), r#"{"id":5}"#);
//! # });
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use trellis_conf as conf;
pub use trellis_di as di;
pub use trellis_exception as exception;
pub use trellis_http as http;
pub use trellis_urls as urls;

#[cfg(feature = "dispatch")]
#[cfg_attr(docsrs, doc(cfg(feature = "dispatch")))]
pub use trellis_dispatch as dispatch;

pub use trellis_di::{Container, InputValidator, ModelBinder, ServiceContainer, TypeKey};
pub use trellis_exception::{Error, Result};
pub use trellis_http::{Handler, Middleware, MiddlewareChain, Request, Response, UploadedFile};
pub use trellis_urls::routers::{
	Action, ActionSet, Arguments, Controller, ControllerRegistry, GroupAttributes, HandlerRef,
	HandlerReturn, ParamDescriptor, ResourceOptions, Route, RouteId, RouteMatch, Router,
};

pub use trellis_conf::RoutingSettings;

#[cfg(feature = "dispatch")]
pub use trellis_dispatch::{
	ArgumentResolver, CancellationToken, DispatchContext, Dispatcher, MethodOverride,
	normalize_response,
};

/// Re-exports for `use trellis::prelude::*`
pub mod prelude {
	pub use crate::{
		Action, ActionSet, Arguments, Controller, ControllerRegistry, Error, GroupAttributes,
		Handler, HandlerRef, HandlerReturn, Middleware, ParamDescriptor, Request, Response,
		Result, Route, Router, RoutingSettings, ServiceContainer,
	};

	#[cfg(feature = "dispatch")]
	pub use crate::{DispatchContext, Dispatcher};

	// External
	pub use async_trait::async_trait;
	pub use hyper::{Method, StatusCode};
}
