//! The innermost handler of a dispatch: runs the matched route's action.

use crate::normalize::normalize_response;
use crate::resolver::ArgumentResolver;
use async_trait::async_trait;
use hyper::StatusCode;
use std::sync::Arc;
use trellis_di::Container;
use trellis_exception::{Error, Result};
use trellis_http::{Handler, Request, Response};
use trellis_urls::routers::{Action, Controller, HandlerRef, RouteId, Router, as_controller};

/// Method name reported when an invokable controller has no invoke action
const INVOKE_METHOD: &str = "__invoke";

/// Calls the handler of one route with resolved arguments
pub(crate) struct RouteEndpoint {
	router: Arc<Router>,
	route_id: RouteId,
	resolver: ArgumentResolver,
}

impl RouteEndpoint {
	pub(crate) fn new(router: Arc<Router>, route_id: RouteId, resolver: ArgumentResolver) -> Self {
		Self {
			router,
			route_id,
			resolver,
		}
	}

	fn controller(&self, target: &str) -> Result<Arc<dyn Controller>> {
		self.resolver
			.container()
			.resolve_named(target)
			.as_ref()
			.and_then(as_controller)
			.ok_or_else(|| Error::MissingTarget(target.to_string()))
	}

	fn action(&self, handler: &HandlerRef) -> Result<Action> {
		match handler {
			HandlerRef::Closure(action) => Ok(action.clone()),
			HandlerRef::Action { target, method } => {
				self.controller(target)?
					.action(method)
					.ok_or_else(|| Error::MissingTargetMethod {
						target: target.clone(),
						method: method.clone(),
					})
			}
			HandlerRef::Invokable { target } => {
				self.controller(target)?
					.invoke()
					.ok_or_else(|| Error::MissingTargetMethod {
						target: target.clone(),
						method: INVOKE_METHOD.to_string(),
					})
			}
			HandlerRef::Redirect { to, .. } => Err(Error::Internal(format!(
				"redirect to '{}' has no action",
				to
			))),
		}
	}
}

#[async_trait]
impl Handler for RouteEndpoint {
	async fn handle(&self, request: Request) -> Result<Response> {
		let route = self
			.router
			.route(self.route_id)
			.ok_or_else(|| Error::Internal(format!("route {} is not registered", self.route_id)))?;

		let action = match route.handler() {
			HandlerRef::Redirect { to, status } => {
				let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::FOUND);
				return Ok(Response::redirect(to, status));
			}
			handler => self.action(handler)?,
		};

		let arguments = self
			.resolver
			.resolve(action.params(), &request, Some(route))
			.await?;
		tracing::trace!(
			route = %self.route_id,
			handler = %route.handler(),
			arguments = arguments.len(),
			"invoking handler"
		);
		let returned = action.call(arguments).await?;
		normalize_response(returned)
	}
}
