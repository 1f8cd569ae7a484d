//! Resource Routes + Dispatch Integration Tests
//!
//! Tests a resource route set served through the dispatcher:
//! - CRUD actions reached through their conventional method and path
//! - HTML form method override onto PUT, PATCH and DELETE
//! - Route model binding by primary key and by a custom key
//! - Client responses for unknown paths, methods and models
//! - URL generation for named resource routes

use hyper::{Method, StatusCode};
use rstest::*;
use serde_json::json;
use std::sync::Arc;
use trellis::prelude::*;
use trellis_conf::RoutingSettings;
use trellis_integration_tests::{blog_container, blog_router, form_request, json_body, request};

#[fixture]
fn dispatcher() -> Dispatcher {
	let router = blog_router(&RoutingSettings::default()).expect("Failed to build blog routes");
	Dispatcher::new(Arc::new(router)).with_container(blog_container())
}

#[rstest]
#[tokio::test]
async fn test_index_and_show(dispatcher: Dispatcher) {
	let response = dispatcher.handle(request(Method::GET, "/posts")).await.unwrap();
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(json_body(&response).as_array().unwrap().len(), 2);

	let response = dispatcher.handle(request(Method::GET, "/posts/2")).await.unwrap();
	assert_eq!(
		json_body(&response),
		json!({"id": 2, "slug": "second-post", "title": "Second post"})
	);
}

#[rstest]
#[tokio::test]
async fn test_create_form_is_not_shadowed_by_show(dispatcher: Dispatcher) {
	let response = dispatcher
		.handle(request(Method::GET, "/posts/create"))
		.await
		.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.body_text().starts_with("<form"));
}

#[rstest]
#[tokio::test]
async fn test_store_returns_handler_response(dispatcher: Dispatcher) {
	let response = dispatcher
		.handle(form_request(Method::POST, "/posts", &[("title", "Third")]))
		.await
		.unwrap();

	assert_eq!(response.status, StatusCode::CREATED);
	assert_eq!(json_body(&response), json!({"id": 3, "title": "Third"}));
}

#[rstest]
#[case("PUT")]
#[case("patch")]
#[tokio::test]
async fn test_form_override_reaches_update(dispatcher: Dispatcher, #[case] verb: &str) {
	let response = dispatcher
		.handle(form_request(
			Method::POST,
			"/posts/1",
			&[("_method", verb), ("title", "Renamed")],
		))
		.await
		.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		json_body(&response),
		json!({"id": 1, "title": "Renamed", "method": verb.to_uppercase()})
	);
}

#[rstest]
#[tokio::test]
async fn test_override_header_reaches_destroy(dispatcher: Dispatcher) {
	let request = Request::builder()
		.method(Method::POST)
		.uri("/api/posts/1")
		.header("X-HTTP-Method-Override", "DELETE")
		.build()
		.unwrap();

	let response = dispatcher.handle(request).await.unwrap();

	assert_eq!(json_body(&response), json!({"success": true}));
}

#[rstest]
#[tokio::test]
async fn test_binding_by_slug(dispatcher: Dispatcher) {
	let response = dispatcher
		.handle(request(Method::GET, "/api/by-slug/hello-world"))
		.await
		.unwrap();

	assert_eq!(json_body(&response)["id"], json!(1));
}

#[rstest]
#[case(Method::GET, "/posts/99", StatusCode::NOT_FOUND)]
#[case(Method::GET, "/api/by-slug/missing", StatusCode::NOT_FOUND)]
#[case(Method::GET, "/comments", StatusCode::NOT_FOUND)]
#[case(Method::DELETE, "/posts", StatusCode::METHOD_NOT_ALLOWED)]
#[tokio::test]
async fn test_client_errors(
	dispatcher: Dispatcher,
	#[case] method: Method,
	#[case] uri: &str,
	#[case] expected: StatusCode,
) {
	let response = dispatcher.handle(request(method, uri)).await.unwrap();

	assert_eq!(response.status, expected);
	assert!(json_body(&response)["error"].is_string());
}

#[rstest]
#[tokio::test]
async fn test_method_not_allowed_lists_allowed_methods(dispatcher: Dispatcher) {
	let response = dispatcher
		.handle(request(Method::DELETE, "/posts"))
		.await
		.unwrap();

	assert_eq!(response.headers.get("allow").unwrap(), "GET, HEAD, POST");
}

#[rstest]
#[tokio::test]
async fn test_api_resource_leaves_out_form_routes(dispatcher: Dispatcher) {
	let response = dispatcher
		.handle(request(Method::GET, "/api/posts/1/edit"))
		.await
		.unwrap();
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	// `create` falls through to `show`, which finds no such post
	let response = dispatcher
		.handle(request(Method::GET, "/api/posts/create"))
		.await
		.unwrap();
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
fn test_named_resource_urls() {
	let router = blog_router(&RoutingSettings::default()).unwrap();

	assert_eq!(router.url("home", &[]).unwrap(), "/");
	assert_eq!(
		router.url("posts.edit", &[("post", "4")]).unwrap(),
		"/posts/4/edit"
	);
	assert_eq!(
		router.url("api.posts.show", &[("post", "4")]).unwrap(),
		"/api/posts/4"
	);
	assert_eq!(
		router
			.absolute_url("https://blog.example.com/", "api.posts.slug", &[("post", "intro")])
			.unwrap(),
		"https://blog.example.com/api/by-slug/intro"
	);
	assert!(router.url("api.posts.edit", &[("post", "4")]).is_err());
}
