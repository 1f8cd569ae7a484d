//! Middleware and handler traits for HTTP request processing.
//!
//! ## Middleware
//!
//! Middleware wraps handlers to add cross-cutting concerns. It may call `next`
//! to continue, or return its own response to short-circuit:
//!
//! ```rust
//! use trellis_http::{Handler, Middleware, Request, Response};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct RequireToken;
//!
//! #[async_trait]
//! impl Middleware for RequireToken {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> trellis_exception::Result<Response> {
//!         if request.header_str("x-token").is_none() {
//!             return Ok(Response::new(hyper::StatusCode::UNAUTHORIZED));
//!         }
//!         next.handle(request).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use trellis_exception::Result;

use crate::{Request, Response};

/// Handler trait for processing requests.
///
/// Handlers receive a request and produce a response or an error.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` where T: Handler.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware trait for request/response processing.
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Processes a request through this middleware.
	///
	/// # Arguments
	///
	/// * `request` - The incoming HTTP request
	/// * `next` - The next handler in the chain to call
	///
	/// # Errors
	///
	/// Returns an error if the middleware or next handler fails.
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Determines whether this middleware should be executed for the given request.
	///
	/// Skipped middleware is left out of the composed chain entirely.
	/// By default, returns `true`.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// Middleware chain - composes multiple middleware into a single handler.
///
/// Middleware runs in the order it was added: the first added is the
/// outermost layer and sees the request first.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	/// Creates a new middleware chain with the given handler.
	///
	/// # Examples
	///
	/// ```rust
	/// use trellis_http::{MiddlewareChain, Handler, Request, Response};
	/// use std::sync::Arc;
	///
	/// struct MyHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for MyHandler {
	///     async fn handle(&self, _request: Request) -> trellis_exception::Result<Response> {
	///         Ok(Response::ok())
	///     }
	/// }
	///
	/// let chain = MiddlewareChain::new(Arc::new(MyHandler));
	/// assert!(chain.is_empty());
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	/// Adds a middleware to the chain using builder pattern.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Adds a middleware to the chain.
	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}

	/// Adds several middleware, preserving their order.
	pub fn extend<I>(&mut self, middlewares: I)
	where
		I: IntoIterator<Item = Arc<dyn Middleware>>,
	{
		self.middlewares.extend(middlewares);
	}

	pub fn len(&self) -> usize {
		self.middlewares.len()
	}

	pub fn is_empty(&self) -> bool {
		self.middlewares.is_empty()
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		if self.middlewares.is_empty() {
			return self.handler.handle(request).await;
		}

		// Build the onion from the inside out so the first middleware added
		// ends up outermost.
		let mut current_handler = self.handler.clone();

		let active_middlewares: Vec<_> = self
			.middlewares
			.iter()
			.rev()
			.filter(|mw| mw.should_continue(&request))
			.collect();

		for middleware in active_middlewares {
			current_handler = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current_handler,
			});
		}

		current_handler.handle(request).await
	}
}

/// One middleware layer bound to the rest of the chain.
struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::{Method, StatusCode};
	use rstest::rstest;
	use std::sync::Mutex;

	struct MockHandler {
		response_body: String,
	}

	#[async_trait]
	impl Handler for MockHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body(self.response_body.clone()))
		}
	}

	struct MockMiddleware {
		prefix: String,
	}

	#[async_trait]
	impl Middleware for MockMiddleware {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let response = next.handle(request).await?;
			let new_body = format!("{}{}", self.prefix, response.body_text());
			Ok(Response::ok().with_body(new_body))
		}
	}

	struct RecordingMiddleware {
		label: &'static str,
		log: Arc<Mutex<Vec<&'static str>>>,
	}

	#[async_trait]
	impl Middleware for RecordingMiddleware {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			self.log.lock().unwrap().push(self.label);
			next.handle(request).await
		}
	}

	struct ShortCircuit;

	#[async_trait]
	impl Middleware for ShortCircuit {
		async fn process(&self, _request: Request, _next: Arc<dyn Handler>) -> Result<Response> {
			Ok(Response::new(StatusCode::FORBIDDEN))
		}
	}

	struct OnlyForPost;

	#[async_trait]
	impl Middleware for OnlyForPost {
		async fn process(&self, _request: Request, _next: Arc<dyn Handler>) -> Result<Response> {
			Ok(Response::new(StatusCode::IM_A_TEAPOT))
		}

		fn should_continue(&self, request: &Request) -> bool {
			request.method == Method::POST
		}
	}

	fn create_test_request() -> Request {
		Request::builder().method(Method::GET).uri("/").build().unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_chain_empty() {
		let handler = Arc::new(MockHandler {
			response_body: "Test".to_string(),
		});
		let chain = MiddlewareChain::new(handler);

		let response = chain.handle(create_test_request()).await.unwrap();

		assert_eq!(response.body_text(), "Test");
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_chain_multiple() {
		let handler = Arc::new(MockHandler {
			response_body: "Data".to_string(),
		});
		let chain = MiddlewareChain::new(handler)
			.with_middleware(Arc::new(MockMiddleware {
				prefix: "M1:".to_string(),
			}))
			.with_middleware(Arc::new(MockMiddleware {
				prefix: "M2:".to_string(),
			}));

		let response = chain.handle(create_test_request()).await.unwrap();

		// M1 is outermost, so it wraps M2's output
		assert_eq!(response.body_text(), "M1:M2:Data");
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_runs_in_insertion_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let mut chain = MiddlewareChain::new(Arc::new(MockHandler {
			response_body: String::new(),
		}));
		chain.extend([
			Arc::new(RecordingMiddleware {
				label: "global",
				log: log.clone(),
			}) as Arc<dyn Middleware>,
			Arc::new(RecordingMiddleware {
				label: "route",
				log: log.clone(),
			}),
		]);

		chain.handle(create_test_request()).await.unwrap();

		assert_eq!(*log.lock().unwrap(), vec!["global", "route"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_short_circuit_skips_handler() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = MiddlewareChain::new(Arc::new(MockHandler {
			response_body: "unreachable".to_string(),
		}))
		.with_middleware(Arc::new(ShortCircuit))
		.with_middleware(Arc::new(RecordingMiddleware {
			label: "inner",
			log: log.clone(),
		}));

		let response = chain.handle(create_test_request()).await.unwrap();

		assert_eq!(response.status, StatusCode::FORBIDDEN);
		assert!(log.lock().unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_should_continue_skips_middleware() {
		let chain = MiddlewareChain::new(Arc::new(MockHandler {
			response_body: "passed".to_string(),
		}))
		.with_middleware(Arc::new(OnlyForPost));

		let response = chain.handle(create_test_request()).await.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body_text(), "passed");
	}
}
