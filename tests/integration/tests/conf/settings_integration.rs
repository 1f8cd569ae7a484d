//! Settings Integration Tests
//!
//! Tests that settings loaded from a file shape the router and dispatcher:
//! - Method override can be switched off or moved to another field
//! - The match cache honours its enabled flag and capacity
//! - Resource routes use the configured identifier parameter

use hyper::{Method, StatusCode};
use rstest::*;
use std::sync::Arc;
use trellis::prelude::*;
use trellis_conf::RoutingSettings;
use trellis_integration_tests::{blog_container, blog_router, form_request, request};

fn settings_from(contents: &str) -> RoutingSettings {
	let dir = tempfile::tempdir().expect("Failed to create temp dir");
	let path = dir.path().join("routing.toml");
	std::fs::write(&path, contents).expect("Failed to write settings");
	let settings = RoutingSettings::from_file(&path).expect("Failed to load settings");
	settings.validate().expect("Invalid settings");
	settings
}

fn dispatcher(settings: &RoutingSettings) -> Dispatcher {
	let router = blog_router(settings).expect("Failed to build blog routes");
	Dispatcher::with_settings(Arc::new(router), settings).with_container(blog_container())
}

#[rstest]
#[tokio::test]
async fn test_disabled_override_keeps_post() {
	let settings = settings_from("method_override_enabled = false\n");
	let dispatcher = dispatcher(&settings);

	let response = dispatcher
		.handle(form_request(
			Method::POST,
			"/posts/1",
			&[("_method", "DELETE")],
		))
		.await
		.unwrap();

	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[tokio::test]
async fn test_custom_override_field() {
	let settings = settings_from("method_override_field = \"_verb\"\n");
	let dispatcher = dispatcher(&settings);

	let response = dispatcher
		.handle(form_request(Method::POST, "/posts/1", &[("_verb", "DELETE")]))
		.await
		.unwrap();
	assert_eq!(response.status, StatusCode::OK);

	let response = dispatcher
		.handle(form_request(
			Method::POST,
			"/posts/1",
			&[("_method", "DELETE")],
		))
		.await
		.unwrap();
	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[case("match_cache_enabled = false\n", 0)]
#[case("match_cache_capacity = 2\n", 2)]
#[case("", 3)]
#[tokio::test]
async fn test_match_cache_settings(#[case] contents: &str, #[case] expected: usize) {
	let settings = settings_from(contents);
	let dispatcher = dispatcher(&settings);

	for uri in ["/", "/posts", "/posts/1"] {
		let response = dispatcher.handle(request(Method::GET, uri)).await.unwrap();
		assert_eq!(response.status, StatusCode::OK);
	}

	assert_eq!(dispatcher.router().cache_len(), expected);
}

#[rstest]
fn test_default_resource_parameter() {
	let settings = settings_from("default_resource_parameter = \"key\"\n");
	let mut router = Router::with_settings(&settings);
	router
		.resource("tags", "TagController", Default::default())
		.unwrap();

	assert_eq!(router.url("tags.show", &[("key", "rust")]).unwrap(), "/tags/rust");
}
