use bytes::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	/// Create a Response with HTTP 204 No Content status
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::no_content();
	/// assert_eq!(response.status, StatusCode::NO_CONTENT);
	/// ```
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a 405 response advertising the allowed methods in `Allow`
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::method_not_allowed(&["GET".to_string(), "HEAD".to_string()]);
	/// assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	/// assert_eq!(response.headers.get("allow").unwrap(), "GET, HEAD");
	/// ```
	pub fn method_not_allowed(allowed: &[String]) -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header("allow", &allowed.join(", "))
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a redirect with an arbitrary 3xx status
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::redirect("/new", StatusCode::SEE_OTHER);
	/// assert_eq!(response.status, StatusCode::SEE_OTHER);
	/// assert_eq!(response.headers.get("location").unwrap(), "/new");
	/// ```
	pub fn redirect(location: impl AsRef<str>, status: StatusCode) -> Self {
		Self::new(status).with_location(location.as_ref())
	}

	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use bytes::Bytes;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body, Bytes::from("Hello, World!"));
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response; invalid names or values are ignored
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			header::HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(header::LOCATION, value);
		}
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"success": true})).unwrap();
	/// assert_eq!(response.headers.get("content-type").unwrap(), "application/json");
	/// assert_eq!(response.body_text(), r#"{"success":true}"#);
	/// ```
	pub fn with_json<T: Serialize + ?Sized>(mut self, data: &T) -> crate::Result<Self> {
		let json = serde_json::to_vec(data)?;
		self.body = Bytes::from(json);
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// Set an HTML body with a UTF-8 content type
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	///
	/// let response = Response::ok().with_html("<h1>Hi</h1>");
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap(),
	///     "text/html; charset=utf-8"
	/// );
	/// ```
	pub fn with_html(mut self, html: impl Into<String>) -> Self {
		self.body = Bytes::from(html.into());
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		self
	}

	/// Body decoded as UTF-8 (lossy)
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

impl From<crate::Error> for Response {
	/// Client-facing response for an error; diagnostics stay out of the body.
	fn from(error: crate::Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let body = serde_json::json!({
			"error": error.public_message(),
		});

		let response = Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error());
		match error.allowed_methods() {
			Some(allowed) => response.with_header("allow", &allowed.join(", ")),
			None => response,
		}
	}
}
