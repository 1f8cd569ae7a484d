//! Integration test utilities for Trellis
//!
//! A small blog application shared by the integration tests: an in-memory
//! post store, a resource controller over it and the route table that
//! exposes it.

use async_trait::async_trait;
use hyper::Method;
use serde_json::json;
use std::sync::Arc;
use trellis_conf::RoutingSettings;
use trellis_di::{ModelBinder, Service, ServiceContainer};
use trellis_exception::Result;
use trellis_http::{Request, Response};
use trellis_urls::routers::{
	Action, ActionSet, ControllerRegistry, GroupAttributes, ParamDescriptor, ResourceOptions,
	Router,
};

/// A stored blog post
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
	pub id: i64,
	pub slug: String,
	pub title: String,
}

impl Post {
	fn to_json(&self) -> serde_json::Value {
		json!({ "id": self.id, "slug": self.slug, "title": self.title })
	}
}

/// Fixed set of posts used by every test
pub fn seed_posts() -> Vec<Post> {
	vec![
		Post {
			id: 1,
			slug: "hello-world".to_string(),
			title: "Hello, world".to_string(),
		},
		Post {
			id: 2,
			slug: "second-post".to_string(),
			title: "Second post".to_string(),
		},
	]
}

/// Looks posts up by `id` or `slug`
pub struct PostStore {
	posts: Vec<Post>,
}

impl PostStore {
	pub fn new(posts: Vec<Post>) -> Self {
		Self { posts }
	}
}

#[async_trait]
impl ModelBinder for PostStore {
	fn model_name(&self) -> &str {
		"Post"
	}

	async fn find(&self, key: &str, value: &str) -> Result<Option<Service>> {
		let found = self.posts.iter().find(|post| match key {
			"id" => post.id.to_string() == value,
			"slug" => post.slug == value,
			_ => false,
		});
		Ok(found.map(|post| Arc::new(post.clone()) as Service))
	}
}

fn post_param() -> ParamDescriptor {
	ParamDescriptor::class::<Post>("post")
}

/// Resource controller for posts
pub fn post_controller() -> ActionSet {
	ActionSet::new()
		.with_action(
			"index",
			Action::new(vec![], |_| async {
				let posts: Vec<_> = seed_posts().iter().map(Post::to_json).collect();
				Ok(serde_json::Value::Array(posts))
			}),
		)
		.with_action(
			"create",
			Action::new(vec![], |_| async { Ok("<form method=\"post\"></form>") }),
		)
		.with_action(
			"store",
			Action::new(vec![ParamDescriptor::string("title")], |args| async move {
				let title = args.str("title").unwrap_or_default().to_string();
				Response::created().with_json(&json!({ "id": 3, "title": title }))
			}),
		)
		.with_action(
			"show",
			Action::new(vec![post_param()], |args| async move {
				let post = args.service::<Post>("post").unwrap();
				Ok(post.to_json())
			}),
		)
		.with_action(
			"edit",
			Action::new(vec![post_param()], |args| async move {
				let post = args.service::<Post>("post").unwrap();
				Ok(format!("<h1>Editing {}</h1>", post.title))
			}),
		)
		.with_action(
			"update",
			Action::new(
				vec![
					ParamDescriptor::request("request"),
					post_param(),
					ParamDescriptor::string("title"),
				],
				|args| async move {
					let method = args.request().map(|r| r.method.to_string());
					let post = args.service::<Post>("post").unwrap();
					Ok(json!({
						"id": post.id,
						"title": args.str("title"),
						"method": method,
					}))
				},
			),
		)
		.with_action(
			"destroy",
			Action::new(vec![post_param()], |_| async { Ok(true) }),
		)
}

/// Container with the post binder and controller registered
pub fn blog_container() -> Arc<ServiceContainer> {
	let container = ServiceContainer::new();
	container.bind_model::<Post>(PostStore::new(seed_posts()));
	container.register_controller("PostController", post_controller());
	Arc::new(container)
}

/// Register the blog routes on `router`
pub fn register_blog_routes(router: &mut Router) -> Result<()> {
	router.get("/", ("PostController", "index"))?.name("home")?;
	router.resource("posts", "PostController", ResourceOptions::new().parameter("post"))?;
	router.group(
		GroupAttributes::new().prefix("/api").name("api."),
		|r| {
			r.api_resource(
				"posts",
				"PostController",
				ResourceOptions::new().parameter("post"),
			)?;
			r.get("/by-slug/{post:slug}", "PostController@show")?
				.name("posts.slug")?;
			Ok(())
		},
	)
}

/// The blog route table built with `settings`
pub fn blog_router(settings: &RoutingSettings) -> Result<Router> {
	let mut router = Router::with_settings(settings);
	register_blog_routes(&mut router)?;
	Ok(router)
}

pub fn request(method: Method, uri: &str) -> Request {
	Request::builder()
		.method(method)
		.uri(uri)
		.build()
		.expect("Failed to build request")
}

pub fn form_request(method: Method, uri: &str, fields: &[(&str, &str)]) -> Request {
	Request::builder()
		.method(method)
		.uri(uri)
		.form(fields)
		.build()
		.expect("Failed to build request")
}

/// Parse a JSON response body
pub fn json_body(response: &Response) -> serde_json::Value {
	serde_json::from_slice(&response.body).expect("Response body is not JSON")
}
