//! HTTP method override
//!
//! HTML forms can only send `GET` and `POST`. A `POST` request may ask to be
//! treated as `PUT`, `PATCH` or `DELETE` through a body field, a query
//! field or a header, checked in that order.

use hyper::Method;
use trellis_conf::RoutingSettings;
use trellis_http::Request;

/// Methods a `POST` request may be overridden to
pub static OVERRIDABLE_METHODS: [Method; 3] = [Method::PUT, Method::PATCH, Method::DELETE];

/// Where the override signal was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSource {
	Body,
	Query,
	Header,
}

/// Resolves the effective method of a request.
///
/// # Examples
///
/// ```
/// use trellis_dispatch::MethodOverride;
/// use trellis_http::Request;
/// use hyper::Method;
///
/// let resolver = MethodOverride::default();
/// let request = Request::builder()
///     .method(Method::POST)
///     .uri("/posts/1")
///     .form(&[("_method", "DELETE")])
///     .build()
///     .unwrap();
///
/// assert_eq!(resolver.effective_method(&request), Method::DELETE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodOverride {
	enabled: bool,
	field: String,
	header: String,
}

impl Default for MethodOverride {
	fn default() -> Self {
		Self::from_settings(&RoutingSettings::default())
	}
}

impl MethodOverride {
	pub fn from_settings(settings: &RoutingSettings) -> Self {
		Self {
			enabled: settings.method_override_enabled,
			field: settings.method_override_field.clone(),
			header: settings.method_override_header.clone(),
		}
	}

	/// A resolver that always returns the request method
	pub fn disabled() -> Self {
		Self {
			enabled: false,
			..Self::default()
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// The first override signal present on the request, with its source.
	///
	/// Only the first signal present counts: a body field with an
	/// unsupported value is not followed by a look at the query or header.
	pub fn signal(&self, request: &Request) -> Option<(OverrideSource, String)> {
		if let Some(value) = request.body_param_str(&self.field) {
			return Some((OverrideSource::Body, value));
		}
		if let Some(value) = request.query_param(&self.field) {
			return Some((OverrideSource::Query, value.to_string()));
		}
		request
			.header_str(&self.header)
			.map(|value| (OverrideSource::Header, value.to_string()))
	}

	/// Method used for matching and dispatch
	pub fn effective_method(&self, request: &Request) -> Method {
		if !self.enabled || request.method != Method::POST {
			return request.method.clone();
		}

		let Some((source, value)) = self.signal(request) else {
			return Method::POST;
		};
		let requested = value.trim().to_ascii_uppercase();
		match OVERRIDABLE_METHODS
			.iter()
			.find(|method| method.as_str() == requested)
		{
			Some(method) => {
				tracing::debug!(source = ?source, method = %method, "method override applied");
				method.clone()
			}
			None => {
				tracing::debug!(source = ?source, value = %value, "ignored method override");
				Method::POST
			}
		}
	}
}
