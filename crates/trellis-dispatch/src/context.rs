//! Per-dispatch context
//!
//! The dispatcher stores a [`DispatchContext`] in the request extensions once
//! a route has been matched. Middleware and handlers read the current route
//! from there instead of from shared state.

use hyper::Method;
use std::collections::HashMap;
use std::sync::Arc;
use trellis_http::Request;
use trellis_urls::routers::{Route, RouteId, RouteMatch, Router};

/// The matched route and bound parameters of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchContext {
	router: Arc<Router>,
	route_id: RouteId,
	params: HashMap<String, String>,
	method: Method,
	effective_method: Method,
	from_cache: bool,
}

impl DispatchContext {
	pub(crate) fn new(
		router: Arc<Router>,
		matched: RouteMatch,
		method: Method,
		effective_method: Method,
	) -> Self {
		Self {
			router,
			route_id: matched.route_id,
			params: matched.params,
			method,
			effective_method,
			from_cache: matched.from_cache,
		}
	}

	/// The context of the dispatch `request` belongs to
	///
	/// # Examples
	///
	/// ```
	/// use trellis_dispatch::DispatchContext;
	/// use trellis_http::Request;
	///
	/// let request = Request::builder().uri("/").build().unwrap();
	/// assert!(DispatchContext::current(&request).is_none());
	/// ```
	pub fn current(request: &Request) -> Option<DispatchContext> {
		request.extensions.get::<DispatchContext>()
	}

	pub fn router(&self) -> &Arc<Router> {
		&self.router
	}

	pub fn route_id(&self) -> RouteId {
		self.route_id
	}

	pub fn route(&self) -> Option<&Route> {
		self.router.route(self.route_id)
	}

	pub fn route_name(&self) -> Option<&str> {
		self.route().and_then(Route::name)
	}

	pub fn params(&self) -> &HashMap<String, String> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Method the client sent
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Method after override resolution
	pub fn effective_method(&self) -> &Method {
		&self.effective_method
	}

	pub fn is_overridden(&self) -> bool {
		self.method != self.effective_method
	}

	/// Whether the route came from the match cache
	pub fn from_cache(&self) -> bool {
		self.from_cache
	}

	/// Whether the request is dispatched to the fallback route
	pub fn is_fallback(&self) -> bool {
		self.router.fallback_id() == Some(self.route_id)
	}
}
