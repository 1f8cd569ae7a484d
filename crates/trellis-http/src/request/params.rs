use super::Request;
use bytes::Bytes;
use hyper::{HeaderMap, Uri};
use serde_json::Value;
use std::collections::HashMap;

impl Request {
	/// Parse and decode query parameters from URI
	///
	/// Repeated keys keep the last value.
	pub(super) fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				serde_urlencoded::from_str::<Vec<(String, String)>>(q)
					.unwrap_or_default()
					.into_iter()
					.collect()
			})
			.unwrap_or_default()
	}

	/// Parse body fields for form-urlencoded and JSON object bodies
	///
	/// Any other content type (or a malformed body) yields no fields.
	pub(super) fn parse_body_params(headers: &HeaderMap, body: &Bytes) -> HashMap<String, Value> {
		if body.is_empty() {
			return HashMap::new();
		}
		let content_type = headers
			.get(hyper::header::CONTENT_TYPE)
			.and_then(|h| h.to_str().ok())
			.map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
			.unwrap_or_default();

		match content_type.as_str() {
			"application/x-www-form-urlencoded" => {
				serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
					.unwrap_or_default()
					.into_iter()
					.map(|(k, v)| (k, Value::String(v)))
					.collect()
			}
			ct if ct == "application/json" || ct.ends_with("+json") => {
				match serde_json::from_slice::<Value>(body) {
					Ok(Value::Object(map)) => map.into_iter().collect(),
					_ => HashMap::new(),
				}
			}
			_ => HashMap::new(),
		}
	}

	/// Get the request path
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	///
	/// let request = Request::builder().uri("/api/users").build().unwrap();
	/// assert_eq!(request.path(), "/api/users");
	/// ```
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Set a path parameter (used by the dispatcher after a route matches)
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	///
	/// let mut request = Request::builder().uri("/users/123").build().unwrap();
	/// request.set_path_param("id", "123");
	/// assert_eq!(request.path_params.get("id"), Some(&"123".to_string()));
	/// ```
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query_params.get(name).map(String::as_str)
	}

	/// Body field rendered as a string, if present and scalar
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	/// use serde_json::json;
	///
	/// let request = Request::builder()
	///     .uri("/")
	///     .json(&json!({"count": 3, "tags": ["a"]}))
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.body_param_str("count").as_deref(), Some("3"));
	/// assert_eq!(request.body_param_str("tags"), None);
	/// ```
	pub fn body_param_str(&self, name: &str) -> Option<String> {
		match self.body_params.get(name)? {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			Value::Bool(b) => Some(b.to_string()),
			_ => None,
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&Value> {
		self.attributes.get(name)
	}

	pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.attributes.insert(name.into(), value.into());
	}

	pub fn header_str(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|h| h.to_str().ok())
	}
}
