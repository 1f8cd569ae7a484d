//! The dispatch pipeline
//!
//! ```text
//! Request → method override → route match → parameter binding
//!         → global middleware → route middleware → decorators
//!         → argument resolution → handler → response normalization
//! ```

use crate::context::DispatchContext;
use crate::endpoint::RouteEndpoint;
use crate::method_override::MethodOverride;
use crate::resolver::ArgumentResolver;
use async_trait::async_trait;
use hyper::Method;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use trellis_conf::RoutingSettings;
use trellis_di::{Container, ServiceContainer};
use trellis_exception::{Error, Result};
use trellis_http::{Handler, Middleware, MiddlewareChain, Request, Response};
use trellis_urls::routers::{Route, RouteId, RouteMatch, Router};

/// Dispatches requests against a route table.
///
/// The router is shared read-only; only its match cache changes while
/// requests are dispatched.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_dispatch::Dispatcher;
/// use trellis_http::Request;
/// use trellis_urls::routers::{HandlerRef, ParamDescriptor, Router};
///
/// # tokio_test::block_on(async {
/// let mut router = Router::new();
/// router
///     .get(
///         "/hello/{name}",
///         HandlerRef::closure(vec![ParamDescriptor::string("name")], |args| async move {
///             Ok(format!("Hello, {}!", args.str("name").unwrap_or_default()))
///         }),
///     )
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(Arc::new(router));
/// let request = Request::builder().uri("/hello/ada").build().unwrap();
/// let response = dispatcher.dispatch(request).await.unwrap();
/// assert_eq!(response.body_text(), "Hello, ada!");
/// # });
/// ```
pub struct Dispatcher {
	router: Arc<Router>,
	resolver: ArgumentResolver,
	middleware: Vec<Arc<dyn Middleware>>,
	method_override: MethodOverride,
}

impl Dispatcher {
	/// Dispatcher with an empty container and default settings
	pub fn new(router: Arc<Router>) -> Self {
		Self::with_settings(router, &RoutingSettings::default())
	}

	pub fn with_settings(router: Arc<Router>, settings: &RoutingSettings) -> Self {
		Self {
			router,
			resolver: ArgumentResolver::new(Arc::new(ServiceContainer::new())),
			middleware: Vec::new(),
			method_override: MethodOverride::from_settings(settings),
		}
	}

	/// Use `container` for class arguments and controller targets
	pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
		self.resolver = ArgumentResolver::new(container);
		self
	}

	/// Add global middleware, which runs before any route middleware
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middleware.push(middleware);
		self
	}

	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middleware.push(middleware);
	}

	pub fn with_method_override(mut self, method_override: MethodOverride) -> Self {
		self.method_override = method_override;
		self
	}

	pub fn router(&self) -> &Arc<Router> {
		&self.router
	}

	pub fn container(&self) -> &Arc<dyn Container> {
		self.resolver.container()
	}

	/// Resolve the effective method and match the request to a route.
	///
	/// # Errors
	///
	/// [`Error::NotFound`] or [`Error::MethodNotAllowed`] when no route
	/// accepts the request.
	pub fn resolve(&self, request: &Request) -> Result<(Method, RouteMatch)> {
		let method = self.method_override.effective_method(request);
		let host = request.host();
		let matched = self
			.router
			.resolve(&method, request.path(), host.as_deref(), request.scheme())?;
		Ok((method, matched))
	}

	/// Dispatch a request and return the handler's normalized response.
	///
	/// Match failures are returned as errors for the transport to turn into
	/// 404 and 405 responses; see [`Error::allowed_methods`].
	pub async fn dispatch(&self, request: Request) -> Result<Response> {
		let span = tracing::debug_span!(
			"dispatch",
			method = %request.method,
			path = %request.path()
		);
		self.dispatch_inner(request).instrument(span).await
	}

	/// Dispatch with a cancellation token.
	///
	/// The token is placed in the request extensions for handlers and
	/// middleware to observe. A token cancelled before dispatch starts
	/// yields [`Error::Cancelled`].
	pub async fn dispatch_with_cancellation(
		&self,
		request: Request,
		token: CancellationToken,
	) -> Result<Response> {
		if token.is_cancelled() {
			tracing::debug!(path = %request.path(), "dispatch cancelled before start");
			return Err(Error::Cancelled);
		}
		request.extensions.insert(token);
		self.dispatch(request).await
	}

	async fn dispatch_inner(&self, mut request: Request) -> Result<Response> {
		let (effective, matched) = self.resolve(&request)?;
		let route_id = matched.route_id;
		let route = self
			.router
			.route(route_id)
			.ok_or_else(|| Error::Internal(format!("route {} is not registered", route_id)))?;

		tracing::debug!(
			route = %route_id,
			name = route.name().unwrap_or_default(),
			effective_method = %effective,
			from_cache = matched.from_cache,
			"dispatching to route"
		);

		request.path_params = matched.params.clone();
		let original = std::mem::replace(&mut request.method, effective.clone());
		request.extensions.insert(DispatchContext::new(
			self.router.clone(),
			matched,
			original,
			effective.clone(),
		));

		let handler = self.pipeline(route, route_id)?;
		let mut response = handler.handle(request).await?;
		if effective == Method::HEAD {
			response.body.clear();
		}
		Ok(response)
	}

	/// Global middleware, then route middleware, around the decorated endpoint
	fn pipeline(&self, route: &Route, route_id: RouteId) -> Result<Arc<dyn Handler>> {
		let endpoint: Arc<dyn Handler> = Arc::new(RouteEndpoint::new(
			self.router.clone(),
			route_id,
			self.resolver.clone(),
		));
		let handler = route
			.decorators()
			.iter()
			.fold(endpoint, |inner, decorate| decorate(inner));

		let route_middleware = self.router.resolve_middleware(route.middleware())?;
		if self.middleware.is_empty() && route_middleware.is_empty() {
			return Ok(handler);
		}

		let mut chain = MiddlewareChain::new(handler);
		chain.extend(self.middleware.iter().cloned());
		chain.extend(route_middleware);
		Ok(Arc::new(chain))
	}
}

/// Serves requests directly, answering errors with their client responses
#[async_trait]
impl Handler for Dispatcher {
	async fn handle(&self, request: Request) -> Result<Response> {
		match self.dispatch(request).await {
			Ok(response) => Ok(response),
			Err(err) if err.is_match_failure() => Ok(Response::from(err)),
			Err(err) => {
				tracing::error!(error = %err, status = err.status_code(), "dispatch failed");
				Ok(Response::from(err))
			}
		}
	}
}
