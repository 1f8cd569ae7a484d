//! # Trellis Exception
//!
//! The error taxonomy shared by every routing and dispatch crate.
//!
//! Errors fall into four classes:
//!
//! - **Configuration**: raised immediately at registration time (invalid method,
//!   invalid scheme, duplicate route name, bad pattern). Never deferred to request time.
//! - **Match failure**: [`Error::NotFound`] and [`Error::MethodNotAllowed`]. These are
//!   expected dispatch outcomes that the transport translates into 404/405 responses.
//! - **Resolution failure**: a handler argument, target or model could not be resolved.
//!   The request is aborted with a server-error-class outcome.
//! - **Handler contract violation**: a handler returned something that cannot become a
//!   response, or an inline handler was passed to cache serialization.
//!
//! ## Example
//!
//! ```
//! use trellis_exception::Error;
//!
//! let err = Error::MethodNotAllowed {
//!     allowed: vec!["GET".to_string(), "HEAD".to_string()],
//! };
//! assert_eq!(err.status_code(), 405);
//! assert!(err.is_match_failure());
//! ```

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while registering routes or dispatching a request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
	// Configuration errors
	#[error("Invalid HTTP method: {0}")]
	InvalidMethod(String),

	#[error("Invalid scheme '{0}': expected 'http' or 'https'")]
	InvalidScheme(String),

	#[error("Route name '{0}' is already registered")]
	DuplicateRouteName(String),

	#[error("Invalid route pattern '{template}': {reason}")]
	InvalidPattern { template: String, reason: String },

	#[error("Unknown router macro: {0}")]
	UnknownMacro(String),

	#[error("No route named '{0}'")]
	UnknownRouteName(String),

	#[error("Missing parameter '{parameter}' for route '{route}'")]
	MissingUrlParameter { route: String, parameter: String },

	#[error("Unknown middleware alias: {0}")]
	UnknownMiddleware(String),

	#[error("Settings error: {0}")]
	Settings(String),

	// Match failures
	#[error("No route found for {method} {path}")]
	NotFound { method: String, path: String },

	#[error("Method not allowed; allowed methods: {}", allowed.join(", "))]
	MethodNotAllowed { allowed: Vec<String> },

	// Resolution failures
	#[error(
		"Unable to resolve parameter '{name}' at position {position} (available sources: {})",
		available_sources.join(", ")
	)]
	UnresolvableParameter {
		name: String,
		position: usize,
		available_sources: Vec<String>,
	},

	#[error("Handler target '{0}' is not registered")]
	MissingTarget(String),

	#[error("Handler target '{target}' has no method '{method}'")]
	MissingTargetMethod { target: String, method: String },

	#[error("No {model} found where {key} = '{value}'")]
	ModelNotFound {
		model: String,
		key: String,
		value: String,
	},

	#[error("Validation failed: {}", .0.join("; "))]
	Validation(Vec<String>),

	// Handler contract violations
	#[error("Handler returned a value of type '{0}' that cannot be converted into a response")]
	InvalidHandlerReturn(String),

	#[error("Route '{0}' uses an inline handler and cannot be cached")]
	UncacheableHandler(String),

	// Infrastructure
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Dispatch cancelled")]
	Cancelled,

	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

impl Error {
	/// HTTP status code the transport should use for this error.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_exception::Error;
	///
	/// let err = Error::NotFound { method: "GET".into(), path: "/missing".into() };
	/// assert_eq!(err.status_code(), 404);
	///
	/// let err = Error::MissingTarget("UserController".into());
	/// assert_eq!(err.status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::NotFound { .. } | Error::ModelNotFound { .. } => 404,
			Error::MethodNotAllowed { .. } => 405,
			Error::Validation(_) => 422,
			Error::Cancelled => 499,
			_ => 500,
		}
	}

	/// Whether this error was raised while defining routes.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			Error::InvalidMethod(_)
				| Error::InvalidScheme(_)
				| Error::DuplicateRouteName(_)
				| Error::InvalidPattern { .. }
				| Error::UnknownMacro(_)
				| Error::UnknownRouteName(_)
				| Error::MissingUrlParameter { .. }
				| Error::UnknownMiddleware(_)
				| Error::Settings(_)
		)
	}

	/// Whether this error is an expected "no route" outcome rather than a fault.
	pub fn is_match_failure(&self) -> bool {
		matches!(self, Error::NotFound { .. } | Error::MethodNotAllowed { .. })
	}

	/// Whether this error aborted handler argument or target resolution.
	pub fn is_resolution_failure(&self) -> bool {
		matches!(
			self,
			Error::UnresolvableParameter { .. }
				| Error::MissingTarget(_)
				| Error::MissingTargetMethod { .. }
				| Error::ModelNotFound { .. }
				| Error::Validation(_)
		)
	}

	/// Methods to advertise in an `Allow` header, if any.
	pub fn allowed_methods(&self) -> Option<&[String]> {
		match self {
			Error::MethodNotAllowed { allowed } => Some(allowed),
			_ => None,
		}
	}

	/// Message that is safe to send to an untrusted client.
	///
	/// Resolution diagnostics (parameter names, positions, sources, target types)
	/// stay in logs; clients only see the status class.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_exception::Error;
	///
	/// let err = Error::UnresolvableParameter {
	///     name: "db".into(),
	///     position: 0,
	///     available_sources: vec!["route".into()],
	/// };
	/// assert_eq!(err.public_message(), "Internal Server Error");
	/// ```
	pub fn public_message(&self) -> String {
		match self {
			Error::NotFound { .. } | Error::ModelNotFound { .. } => "Not Found".to_string(),
			Error::MethodNotAllowed { .. } => "Method Not Allowed".to_string(),
			Error::Validation(messages) => messages.join("; "),
			Error::Cancelled => "Client Closed Request".to_string(),
			_ => "Internal Server Error".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::InvalidMethod("FETCH".into()), true, false, false)]
	#[case(Error::DuplicateRouteName("home".into()), true, false, false)]
	#[case(Error::NotFound { method: "GET".into(), path: "/".into() }, false, true, false)]
	#[case(Error::MethodNotAllowed { allowed: vec![] }, false, true, false)]
	#[case(Error::MissingTarget("X".into()), false, false, true)]
	#[case(Error::InvalidHandlerReturn("tuple".into()), false, false, false)]
	fn test_error_classes(
		#[case] err: Error,
		#[case] configuration: bool,
		#[case] match_failure: bool,
		#[case] resolution: bool,
	) {
		assert_eq!(err.is_configuration(), configuration);
		assert_eq!(err.is_match_failure(), match_failure);
		assert_eq!(err.is_resolution_failure(), resolution);
	}

	#[test]
	fn test_unresolvable_parameter_display_carries_context() {
		let err = Error::UnresolvableParameter {
			name: "user_id".into(),
			position: 2,
			available_sources: vec!["route".into(), "query".into()],
		};
		let message = err.to_string();
		assert!(message.contains("user_id"));
		assert!(message.contains("position 2"));
		assert!(message.contains("route, query"));
		assert!(!err.public_message().contains("user_id"));
	}

	#[test]
	fn test_method_not_allowed_exposes_allowed_methods() {
		let err = Error::MethodNotAllowed {
			allowed: vec!["GET".into(), "POST".into()],
		};
		assert_eq!(err.allowed_methods(), Some(&["GET".to_string(), "POST".to_string()][..]));
		assert_eq!(err.to_string(), "Method not allowed; allowed methods: GET, POST");
	}
}
