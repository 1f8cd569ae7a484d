// Pattern matching through the route table

use hyper::Method;
use std::collections::HashMap;
use trellis_exception::Error;
use trellis_urls::routers::{GroupAttributes, Router};

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect()
}

// Test: constrained parameter accepts digits only
#[test]
fn test_numeric_constraint() {
	let mut router = Router::new();
	router
		.get("/users/{id}", "UserController@show")
		.unwrap()
		.where_("id", "[0-9]+")
		.unwrap();

	let matched = router.resolve(&Method::GET, "/users/42", None, "http").unwrap();
	assert_eq!(matched.params, params(&[("id", "42")]));

	let missed = router.resolve(&Method::GET, "/users/abc", None, "http");
	assert!(matches!(missed, Err(Error::NotFound { .. })));
}

// Test: trailing optional parameter with and without a value
#[test]
fn test_optional_trailing_parameter() {
	let mut router = Router::new();
	router.get("/posts/{slug?}", "PostController@show").unwrap();

	let bare = router.resolve(&Method::GET, "/posts", None, "http").unwrap();
	assert!(bare.params.is_empty());

	let full = router
		.resolve(&Method::GET, "/posts/hello-world", None, "http")
		.unwrap();
	assert_eq!(full.params, params(&[("slug", "hello-world")]));
}

// Test: extracted parameters are the captures plus defaults of missing optionals
#[test]
fn test_extracted_parameters_include_defaults() {
	let mut router = Router::new();
	router
		.get("/archive/{year}/{month?}", "ArchiveController")
		.unwrap()
		.defaults("month", "01");

	let matched = router
		.resolve(&Method::GET, "/archive/2024", None, "http")
		.unwrap();
	assert_eq!(matched.params, params(&[("year", "2024"), ("month", "01")]));
}

// Test: tenant subdomain routing
#[test]
fn test_domain_parameters() {
	let mut router = Router::new();
	router
		.group(GroupAttributes::new().domain("{tenant}.example.com"), |r| {
			r.get("/dashboard", "DashboardController")?;
			Ok(())
		})
		.unwrap();

	let matched = router
		.resolve(&Method::GET, "/dashboard", Some("acme.example.com"), "http")
		.unwrap();
	assert_eq!(matched.params, params(&[("tenant", "acme")]));

	let missed = router.resolve(&Method::GET, "/dashboard", Some("example.com"), "http");
	assert!(matches!(missed, Err(Error::NotFound { .. })));
}

// Test: trailing slashes are normalized away on lookup
#[test]
fn test_trailing_slash_normalization() {
	let mut router = Router::new();
	router.get("/about/", "PageController@about").unwrap();

	assert!(router.resolve(&Method::GET, "/about", None, "http").is_ok());
	assert!(router.resolve(&Method::GET, "about/", None, "http").is_ok());
}

// Test: paths are case sensitive
#[test]
fn test_case_sensitive_paths() {
	let mut router = Router::new();
	router.get("/About", "PageController@about").unwrap();
	assert!(router.resolve(&Method::GET, "/about", None, "http").is_err());
}

// Test: library patterns referenced explicitly
#[test]
fn test_named_library_patterns() {
	let mut router = Router::new();
	router
		.get("/orders/{order}", "OrderController@show")
		.unwrap()
		.where_uuid("order")
		.unwrap();
	router
		.get("/tags/{tag}", "TagController@show")
		.unwrap()
		.where_slug("tag")
		.unwrap();

	assert!(
		router
			.resolve(
				&Method::GET,
				"/orders/0b7f3c7e-4a65-4b3d-9b1e-2f6f1c0e9a11",
				None,
				"http"
			)
			.is_ok()
	);
	assert!(router.resolve(&Method::GET, "/orders/42", None, "http").is_err());
	assert!(router.resolve(&Method::GET, "/tags/rust-lang", None, "http").is_ok());
	assert!(router.resolve(&Method::GET, "/tags/Rust_Lang", None, "http").is_err());
}

// Test: unknown named patterns fail at registration
#[test]
fn test_unknown_library_pattern_fails_fast() {
	let mut router = Router::new();
	let result = router
		.get("/x/{code}", "Controller")
		.unwrap()
		.where_("code", "@postcode")
		.map(|_| ());
	assert!(matches!(result, Err(Error::InvalidPattern { .. })));
}
