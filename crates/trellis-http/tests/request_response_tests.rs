//! Request parsing and response construction as seen by handlers

use async_trait::async_trait;
use hyper::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use trellis_exception::{Error, Result};
use trellis_http::{Handler, Middleware, MiddlewareChain, Request, Response, UploadedFile};

#[rstest]
fn test_request_sources_are_kept_apart() {
	let request = Request::builder()
		.method(Method::POST)
		.uri("/orders?page=2&sort=desc")
		.json(&json!({"sku": "A-1", "quantity": 3, "gift": false}))
		.attribute("tenant", "acme")
		.file(UploadedFile::new("invoice", "invoice.pdf", &b"%PDF"[..]))
		.build()
		.unwrap();

	assert_eq!(request.query_param("page"), Some("2"));
	assert_eq!(request.body_param_str("quantity").as_deref(), Some("3"));
	assert_eq!(request.body_param_str("gift").as_deref(), Some("false"));
	assert_eq!(request.attribute("tenant"), Some(&json!("acme")));
	assert_eq!(request.files["invoice"].extension(), Some("pdf"));
	assert!(request.path_params.is_empty());
}

#[rstest]
#[case("text/plain", "a=1")]
#[case("application/json", "[1, 2]")]
#[case("application/json", "{broken")]
fn test_unparsed_bodies_yield_no_fields(#[case] content_type: &str, #[case] body: &str) {
	let request = Request::builder()
		.method(Method::POST)
		.uri("/")
		.header("content-type", content_type)
		.body(body.to_string())
		.build()
		.unwrap();

	assert!(request.body_params.is_empty());
}

#[rstest]
#[case(false, "http")]
#[case(true, "https")]
fn test_scheme_follows_transport(#[case] secure: bool, #[case] expected: &str) {
	let request = Request::builder()
		.uri("/")
		.header("host", "Shop.Example.com:8443")
		.secure(secure)
		.build()
		.unwrap();

	assert_eq!(request.scheme(), expected);
	assert_eq!(request.host().as_deref(), Some("shop.example.com"));
}

#[rstest]
fn test_error_response_hides_diagnostics() {
	let response = Response::from(Error::UnresolvableParameter {
		name: "secret_key".to_string(),
		position: 0,
		available_sources: vec!["query".to_string()],
	});

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(!response.body_text().contains("secret_key"));
}

struct Tag(&'static str);

#[async_trait]
impl Middleware for Tag {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let response = next.handle(request).await?;
		let body = format!("{}({})", self.0, response.body_text());
		Ok(response.with_body(body))
	}
}

struct Hello;

#[async_trait]
impl Handler for Hello {
	async fn handle(&self, _request: Request) -> Result<Response> {
		Ok(Response::ok().with_body("hello"))
	}
}

#[tokio::test]
async fn test_first_middleware_added_is_outermost() {
	let chain = MiddlewareChain::new(Arc::new(Hello))
		.with_middleware(Arc::new(Tag("outer")))
		.with_middleware(Arc::new(Tag("inner")));

	let request = Request::builder().uri("/").build().unwrap();
	let response = chain.handle(request).await.unwrap();

	assert_eq!(response.body_text(), "outer(inner(hello))");
}
