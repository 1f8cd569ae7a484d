use super::Request;

impl Request {
	/// Returns true if the request was made over HTTPS
	///
	/// An absolute request URI with an explicit scheme wins over the
	/// transport's `secure` flag.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	///
	/// let request = Request::builder().uri("/").secure(true).build().unwrap();
	/// assert!(request.is_secure());
	///
	/// let request = Request::builder().uri("https://example.com/").build().unwrap();
	/// assert!(request.is_secure());
	/// ```
	pub fn is_secure(&self) -> bool {
		match self.uri.scheme_str() {
			Some(scheme) => scheme.eq_ignore_ascii_case("https"),
			None => self.is_secure,
		}
	}

	/// Returns the scheme of the request (http or https)
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	///
	/// let request = Request::builder().uri("/").secure(true).build().unwrap();
	/// assert_eq!(request.scheme(), "https");
	///
	/// let request = Request::builder().uri("/").build().unwrap();
	/// assert_eq!(request.scheme(), "http");
	/// ```
	pub fn scheme(&self) -> &str {
		if self.is_secure() { "https" } else { "http" }
	}

	/// Get the host without port, from the `Host` header or the URI authority
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/")
	///     .header("host", "acme.example.com:8080")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.host().as_deref(), Some("acme.example.com"));
	///
	/// let request = Request::builder().uri("/").build().unwrap();
	/// assert_eq!(request.host(), None);
	/// ```
	pub fn host(&self) -> Option<String> {
		let raw = self
			.headers
			.get(hyper::header::HOST)
			.and_then(|h| h.to_str().ok())
			.map(str::to_string)
			.or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))?;
		Some(strip_port(&raw).to_ascii_lowercase())
	}

	/// Build an absolute URI for the request
	pub fn build_absolute_uri(&self, path: Option<&str>) -> String {
		let host = self.host().unwrap_or_else(|| "localhost".to_string());
		let path = path.unwrap_or_else(|| self.path());
		format!("{}://{}{}", self.scheme(), host, path)
	}
}

fn strip_port(authority: &str) -> &str {
	// Bracketed IPv6 literal
	if let Some(rest) = authority.strip_prefix('[') {
		return rest.split(']').next().unwrap_or(rest);
	}
	authority.split(':').next().unwrap_or(authority)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("example.com", "example.com")]
	#[case("example.com:443", "example.com")]
	#[case("[::1]:8080", "::1")]
	fn test_strip_port(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(strip_port(input), expected);
	}

	#[rstest]
	fn test_host_falls_back_to_authority() {
		let request = Request::builder()
			.uri("http://API.Example.com:9000/v1")
			.build()
			.unwrap();
		assert_eq!(request.host().as_deref(), Some("api.example.com"));
		assert_eq!(request.scheme(), "http");
	}

	#[rstest]
	fn test_build_absolute_uri() {
		let request = Request::builder()
			.uri("/users")
			.header("host", "example.com")
			.secure(true)
			.build()
			.unwrap();
		assert_eq!(request.build_absolute_uri(None), "https://example.com/users");
		assert_eq!(request.build_absolute_uri(Some("/x")), "https://example.com/x");
	}
}
