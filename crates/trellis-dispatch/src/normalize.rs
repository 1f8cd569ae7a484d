//! Turning handler return values into responses

use serde_json::{Value, json};
use trellis_exception::{Error, Result};
use trellis_http::Response;
use trellis_urls::routers::HandlerReturn;

/// Convert what a handler returned into a response.
///
/// | returned            | response                         |
/// |---------------------|----------------------------------|
/// | response            | unchanged                        |
/// | string              | HTML body                        |
/// | object or list      | JSON body                        |
/// | `null`              | empty `204 No Content`           |
/// | boolean             | JSON `{"success": bool}`         |
/// | number              | HTML body of the number's text   |
/// | displayable value   | HTML body of its string form     |
///
/// # Errors
///
/// [`Error::InvalidHandlerReturn`] for a value with no response form.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use serde_json::json;
/// use trellis_dispatch::normalize_response;
/// use trellis_urls::routers::HandlerReturn;
///
/// let response = normalize_response(HandlerReturn::from(json!({"id": 1}))).unwrap();
/// assert_eq!(response.body_text(), r#"{"id":1}"#);
///
/// let response = normalize_response(HandlerReturn::from(())).unwrap();
/// assert_eq!(response.status, StatusCode::NO_CONTENT);
///
/// assert!(normalize_response(HandlerReturn::Opaque("Socket")).is_err());
/// ```
pub fn normalize_response(returned: HandlerReturn) -> Result<Response> {
	match returned {
		HandlerReturn::Response(response) => Ok(response),
		HandlerReturn::Value(value) => from_value(value),
		HandlerReturn::Display(text) => Ok(Response::ok().with_html(text)),
		HandlerReturn::Opaque(type_name) => Err(Error::InvalidHandlerReturn(type_name.to_string())),
	}
}

fn from_value(value: Value) -> Result<Response> {
	match value {
		Value::Null => Ok(Response::no_content()),
		Value::String(text) => Ok(Response::ok().with_html(text)),
		Value::Number(number) => Ok(Response::ok().with_html(number.to_string())),
		Value::Bool(success) => Response::ok().with_json(&json!({ "success": success })),
		structure @ (Value::Array(_) | Value::Object(_)) => Response::ok().with_json(&structure),
	}
}
