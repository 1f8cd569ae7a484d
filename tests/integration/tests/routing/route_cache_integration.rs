//! Route Cache Integration Tests
//!
//! Tests serving requests from a route table that was saved to disk and
//! loaded back:
//! - The loaded table describes the same routes as the live one
//! - Requests dispatch identically against both tables
//! - Inline closures keep a table from being cached

use hyper::{Method, StatusCode};
use rstest::*;
use std::sync::Arc;
use tempfile::TempDir;
use trellis::prelude::*;
use trellis_conf::RoutingSettings;
use trellis_exception::Error;
use trellis_integration_tests::{blog_container, blog_router, form_request, json_body, request};

#[fixture]
fn cache_dir() -> TempDir {
	tempfile::tempdir().expect("Failed to create temp dir")
}

fn cached_router(dir: &TempDir) -> Router {
	let path = dir.path().join("routes.json");
	blog_router(&RoutingSettings::default())
		.unwrap()
		.save_cache(&path)
		.expect("Failed to save route cache");

	let mut router = Router::new();
	router.load_cache(&path).expect("Failed to load route cache");
	router
}

#[rstest]
fn test_loaded_table_matches_live_table(cache_dir: TempDir) {
	let live = blog_router(&RoutingSettings::default()).unwrap();
	let loaded = cached_router(&cache_dir);

	assert_eq!(loaded.routes().len(), 16);
	assert_eq!(loaded.describe(), live.describe());
}

#[rstest]
#[tokio::test]
async fn test_dispatch_from_loaded_table(cache_dir: TempDir) {
	let dispatcher =
		Dispatcher::new(Arc::new(cached_router(&cache_dir))).with_container(blog_container());

	let response = dispatcher
		.handle(request(Method::GET, "/api/by-slug/second-post"))
		.await
		.unwrap();
	assert_eq!(json_body(&response)["id"], 2);

	let response = dispatcher
		.handle(form_request(
			Method::POST,
			"/posts/2",
			&[("_method", "DELETE")],
		))
		.await
		.unwrap();
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.body_text(), r#"{"success":true}"#);
}

#[rstest]
fn test_inline_handler_is_not_cacheable(cache_dir: TempDir) {
	let mut router = blog_router(&RoutingSettings::default()).unwrap();
	router
		.get("/health", HandlerRef::closure(vec![], |_| async { Ok("ok") }))
		.unwrap();

	let err = router
		.save_cache(cache_dir.path().join("routes.json"))
		.unwrap_err();

	assert!(matches!(err, Error::UncacheableHandler(route) if route == "GET /health"));
	assert!(!cache_dir.path().join("routes.json").exists());
}
