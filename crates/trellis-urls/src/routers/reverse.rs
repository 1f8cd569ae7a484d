//! Reverse routing: named route to URL

use super::router::Router;
use trellis_exception::{Error, Result};

impl Router {
	/// Generate the path of a named route.
	///
	/// Parameters the template does not use become a sorted query string.
	///
	/// # Errors
	///
	/// - [`Error::UnknownRouteName`] if no route has `name`
	/// - [`Error::MissingUrlParameter`] if a required parameter is missing, or
	///   an optional one is skipped while a later one is supplied
	/// - [`Error::InvalidPattern`] if a value violates its constraint
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::Router;
	///
	/// let mut router = Router::new();
	/// router
	///     .get("/users/{id}/posts/{slug?}", "PostController@show")
	///     .unwrap()
	///     .name("posts.show")
	///     .unwrap();
	///
	/// assert_eq!(
	///     router.url("posts.show", &[("id", "7"), ("slug", "intro")]).unwrap(),
	///     "/users/7/posts/intro"
	/// );
	/// assert_eq!(router.url("posts.show", &[("id", "7")]).unwrap(), "/users/7/posts");
	/// assert!(router.url("posts.show", &[]).is_err());
	/// assert!(router.url("missing", &[]).is_err());
	/// ```
	pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
		let route = self
			.route_by_name(name)
			.ok_or_else(|| Error::UnknownRouteName(name.to_string()))?;
		route.generate_path(params)
	}

	/// Generate an absolute URL for a named route on `base` (scheme and authority)
	pub fn absolute_url(&self, base: &str, name: &str, params: &[(&str, &str)]) -> Result<String> {
		let path = self.url(name, params)?;
		Ok(format!("{}{}", base.trim_end_matches('/'), path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::Method;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	#[case("/users/{id}", &[("id", "42")], "/users/42")]
	#[case("/files/{name}", &[("name", "a b/c")], "/files/a%20b%2Fc")]
	#[case("/search", &[("q", "rust lang"), ("page", "2")], "/search?page=2&q=rust+lang")]
	#[case("/{lang?}", &[], "/")]
	fn test_generated_urls(
		#[case] template: &str,
		#[case] params: &[(&str, &str)],
		#[case] expected: &str,
	) {
		let mut router = Router::new();
		router.get(template, "Controller").unwrap().name("target").unwrap();
		assert_eq!(router.url("target", params).unwrap(), expected);
	}

	#[rstest]
	#[case("/users/{id}", &[("id", "42")])]
	#[case("/files/{name}", &[("name", "a b%c")])]
	#[case("/posts/{year}/{slug?}", &[("year", "2024"), ("slug", "hello-world")])]
	#[case("/posts/{year}/{slug?}", &[("year", "2024")])]
	#[case("/archive/{year?}/{month?}", &[("year", "2024"), ("month", "05")])]
	#[case("/archive/{year?}/{month?}", &[("year", "2024")])]
	fn test_generated_path_matches_back(#[case] template: &str, #[case] params: &[(&str, &str)]) {
		let mut router = Router::new();
		router.get(template, "Controller").unwrap().name("target").unwrap();

		let url = router.url("target", params).unwrap();
		let matched = router.resolve(&Method::GET, &url, None, "http").unwrap();

		let expected: HashMap<String, String> = params
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		assert_eq!(matched.params, expected);
	}

	#[rstest]
	fn test_later_optional_without_earlier_one() {
		let mut router = Router::new();
		router
			.get("/archive/{year?}/{month?}", "ArchiveController")
			.unwrap()
			.name("archive")
			.unwrap();

		assert!(matches!(
			router.url("archive", &[("month", "05")]),
			Err(Error::MissingUrlParameter { parameter, .. }) if parameter == "year"
		));
	}

	#[rstest]
	fn test_unknown_route_name() {
		let router = Router::new();
		assert!(matches!(
			router.url("nope", &[]),
			Err(Error::UnknownRouteName(name)) if name == "nope"
		));
	}

	#[rstest]
	fn test_absolute_url() {
		let mut router = Router::new();
		router.get("/login", "Auth").unwrap().name("login").unwrap();
		assert_eq!(
			router.absolute_url("https://example.com/", "login", &[]).unwrap(),
			"https://example.com/login"
		);
	}
}
