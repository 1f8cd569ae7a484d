mod methods;
mod params;

use crate::{Extensions, UploadedFile};
use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use serde_json::Value;
use std::collections::HashMap;
use trellis_exception::{Error, Result};

/// HTTP Request representation
///
/// Cloning a request is cheap (body is reference counted) and clones share
/// their [`Extensions`].
#[derive(Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Parameters captured from the matched route (filled in by the dispatcher)
	pub path_params: HashMap<String, String>,
	/// Decoded query string parameters
	pub query_params: HashMap<String, String>,
	/// Fields parsed from a form-urlencoded or JSON object body
	pub body_params: HashMap<String, Value>,
	/// Free-form request attributes set by the transport or middleware
	pub attributes: HashMap<String, Value>,
	/// Uploaded files keyed by form field name
	pub files: HashMap<String, UploadedFile>,
	pub extensions: Extensions,
	is_secure: bool,
}

impl Request {
	/// Create a new request builder
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/users?page=2")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.method, Method::POST);
	/// assert_eq!(request.path(), "/users");
	/// assert_eq!(request.query_params.get("page"), Some(&"2".to_string()));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}
}

/// Builder for [`Request`]
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	attributes: HashMap<String, Value>,
	files: HashMap<String, UploadedFile>,
	secure: bool,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			attributes: HashMap::new(),
			files: HashMap::new(),
			secure: false,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Add a single header; invalid names or values are ignored
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a urlencoded form body and matching content type
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/posts/1")
	///     .form(&[("_method", "DELETE")])
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.body_param_str("_method").as_deref(), Some("DELETE"));
	/// ```
	pub fn form<T: serde::Serialize + ?Sized>(mut self, fields: &T) -> Self {
		if let Ok(encoded) = serde_urlencoded::to_string(fields) {
			self.body = Bytes::from(encoded);
			self = self.header("content-type", "application/x-www-form-urlencoded");
		}
		self
	}

	/// Set a JSON body and matching content type
	pub fn json<T: serde::Serialize + ?Sized>(mut self, data: &T) -> Self {
		if let Ok(encoded) = serde_json::to_vec(data) {
			self.body = Bytes::from(encoded);
			self = self.header("content-type", "application/json");
		}
		self
	}

	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	pub fn file(mut self, file: UploadedFile) -> Self {
		self.files.insert(file.field_name.clone(), file);
		self
	}

	/// Mark the connection as TLS-terminated
	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	/// Build the request, parsing the query string and body fields
	///
	/// # Errors
	///
	/// Returns an error if the URI cannot be parsed.
	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.parse()
			.map_err(|e| Error::Internal(format!("Invalid request URI '{}': {}", self.uri, e)))?;
		let query_params = Request::parse_query_params(&uri);
		let body_params = Request::parse_body_params(&self.headers, &self.body);

		Ok(Request {
			method: self.method,
			uri,
			version: self.version,
			headers: self.headers,
			body: self.body,
			path_params: HashMap::new(),
			query_params,
			body_params,
			attributes: self.attributes,
			files: self.files,
			extensions: Extensions::new(),
			is_secure: self.secure,
		})
	}
}
