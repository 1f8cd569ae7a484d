//! # Trellis Dispatch
//!
//! The request dispatch pipeline on top of the trellis route table.
//!
//! ## Overview
//!
//! For every request the dispatcher:
//! - resolves the effective method, honouring `POST` method overrides
//! - matches the request against the [`Router`](trellis_urls::routers::Router)
//! - binds route parameters and records a [`DispatchContext`]
//! - runs global middleware, then the route's middleware
//! - resolves the handler's declared arguments
//! - normalizes the handler's return value into a response
//!
//! ## Architecture
//!
//! ```text
//! Request → MethodOverride → Router::resolve → DispatchContext
//!              ↓
//!     MiddlewareChain (global, route) → decorators → RouteEndpoint
//!                                                      ↓
//!                              ArgumentResolver → action → normalize_response
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hyper::{Method, StatusCode};
//! use trellis_dispatch::Dispatcher;
//! use trellis_http::Request;
//! use trellis_urls::routers::{HandlerRef, ParamDescriptor, Router};
//!
//! # tokio_test::block_on(async {
//! let mut router = Router::new();
//! router
//!     .delete(
//!         "/posts/{id}",
//!         HandlerRef::closure(vec![ParamDescriptor::int("id")], |args| async move {
//!             Ok(serde_json::json!({ "deleted": args.int("id") }))
//!         }),
//!     )
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//!
//! // An HTML form cannot send DELETE, so it posts `_method=DELETE`
//! let request = Request::builder()
//!     .method(Method::POST)
//!     .uri("/posts/9")
//!     .form(&[("_method", "DELETE")])
//!     .build()
//!     .unwrap();
//!
//! let response = dispatcher.dispatch(request).await.unwrap();
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(response.body_text(), r#"{"deleted":9}"#);
//! # });
//! ```

pub mod coerce;
mod context;
mod dispatcher;
mod endpoint;
mod method_override;
mod normalize;
mod resolver;

pub use context::DispatchContext;
pub use dispatcher::Dispatcher;
pub use method_override::{MethodOverride, OVERRIDABLE_METHODS, OverrideSource};
pub use normalize::normalize_response;
pub use resolver::ArgumentResolver;

pub use tokio_util::sync::CancellationToken;
