//! Resource route sets
//!
//! A resource expands one base path and controller into the conventional
//! CRUD routes:
//!
//! | action  | method     | path                   |
//! |---------|------------|------------------------|
//! | index   | GET        | `/photos`              |
//! | create  | GET        | `/photos/create`       |
//! | store   | POST       | `/photos`              |
//! | show    | GET        | `/photos/{id}`         |
//! | edit    | GET        | `/photos/{id}/edit`    |
//! | update  | PUT, PATCH | `/photos/{id}`         |
//! | destroy | DELETE     | `/photos/{id}`         |

use super::handler::HandlerRef;
use super::router::{RouteId, Router};
use hyper::Method;
use trellis_exception::Result;

/// Actions of a full resource, in registration order
pub const RESOURCE_ACTIONS: [&str; 7] = [
	"index", "create", "store", "show", "edit", "update", "destroy",
];

/// Actions that render HTML forms and are left out of API resources
const FORM_ACTIONS: [&str; 2] = ["create", "edit"];

/// Options for [`Router::resource`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
	/// Identifier parameter name, defaults to the router's configured name
	pub parameter: Option<String>,
	pub only: Vec<String>,
	pub except: Vec<String>,
	/// Route name prefix, defaults to the resource name with `/` as `.`
	pub name_prefix: Option<String>,
}

impl ResourceOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
		self.parameter = Some(parameter.into());
		self
	}

	pub fn only(mut self, actions: &[&str]) -> Self {
		self.only = actions.iter().map(|a| a.to_string()).collect();
		self
	}

	pub fn except(mut self, actions: &[&str]) -> Self {
		self.except = actions.iter().map(|a| a.to_string()).collect();
		self
	}

	pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.name_prefix = Some(prefix.into());
		self
	}

	fn includes(&self, action: &str) -> bool {
		(self.only.is_empty() || self.only.iter().any(|a| a == action))
			&& !self.except.iter().any(|a| a == action)
	}
}

impl Router {
	/// Register the full resource route set.
	///
	/// Returns the registered route ids in registration order.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::{ResourceOptions, Router};
	///
	/// let mut router = Router::new();
	/// router.resource("photos", "PhotoController", ResourceOptions::new()).unwrap();
	///
	/// assert_eq!(router.routes().len(), 8);
	/// assert_eq!(router.url("photos.edit", &[("id", "3")]).unwrap(), "/photos/3/edit");
	/// ```
	pub fn resource(
		&mut self,
		name: &str,
		controller: &str,
		options: ResourceOptions,
	) -> Result<Vec<RouteId>> {
		self.register_resource(name, controller, options, false)
	}

	/// Register a resource without the `create` and `edit` form routes
	pub fn api_resource(
		&mut self,
		name: &str,
		controller: &str,
		options: ResourceOptions,
	) -> Result<Vec<RouteId>> {
		self.register_resource(name, controller, options, true)
	}

	fn register_resource(
		&mut self,
		name: &str,
		controller: &str,
		options: ResourceOptions,
		api: bool,
	) -> Result<Vec<RouteId>> {
		let base = format!("/{}", name.trim_matches('/'));
		let parameter = options
			.parameter
			.clone()
			.unwrap_or_else(|| self.default_resource_parameter().to_string());
		let member = format!("{}/{{{}}}", base, parameter);
		let name_prefix = options
			.name_prefix
			.clone()
			.unwrap_or_else(|| name.trim_matches('/').replace('/', "."));

		let mut ids = Vec::new();
		for action in RESOURCE_ACTIONS {
			if !options.includes(action) || (api && FORM_ACTIONS.contains(&action)) {
				continue;
			}
			let handler = HandlerRef::Action {
				target: controller.to_string(),
				method: action.to_string(),
			};
			let (method, path) = match action {
				"index" => (Method::GET, base.clone()),
				"create" => (Method::GET, format!("{}/create", base)),
				"store" => (Method::POST, base.clone()),
				"show" => (Method::GET, member.clone()),
				"edit" => (Method::GET, format!("{}/edit", member)),
				"update" => (Method::PUT, member.clone()),
				_ => (Method::DELETE, member.clone()),
			};

			let id = self.add_route(method, &path, handler.clone())?;
			self.name_route(id, &format!("{}.{}", name_prefix, action))?;
			ids.push(id);

			if action == "update" {
				ids.push(self.add_route(Method::PATCH, &path, handler)?);
			}
		}

		tracing::debug!(resource = %name, routes = ids.len(), "registered resource routes");
		Ok(ids)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn summary(router: &Router) -> Vec<(String, String, Option<String>)> {
		router
			.describe()
			.into_iter()
			.map(|row| (row.method, row.path, row.name))
			.collect()
	}

	#[rstest]
	fn test_full_resource_layout() {
		let mut router = Router::new();
		router
			.resource("photos", "PhotoController", ResourceOptions::new())
			.unwrap();

		let rows = summary(&router);
		let expected = [
			("GET", "/photos", Some("photos.index")),
			("GET", "/photos/create", Some("photos.create")),
			("POST", "/photos", Some("photos.store")),
			("GET", "/photos/{id}", Some("photos.show")),
			("GET", "/photos/{id}/edit", Some("photos.edit")),
			("PUT", "/photos/{id}", Some("photos.update")),
			("PATCH", "/photos/{id}", None),
			("DELETE", "/photos/{id}", Some("photos.destroy")),
		];
		assert_eq!(rows.len(), expected.len());
		for (row, (method, path, name)) in rows.iter().zip(expected) {
			assert_eq!(row.0, method);
			assert_eq!(row.1, path);
			assert_eq!(row.2.as_deref(), name);
		}
		assert_eq!(
			router.describe()[5].handler,
			"PhotoController@update"
		);
	}

	#[rstest]
	fn test_api_resource_skips_form_routes() {
		let mut router = Router::new();
		let ids = router
			.api_resource("photos", "PhotoController", ResourceOptions::new())
			.unwrap();
		assert_eq!(ids.len(), 6);
		assert!(!router.has_route("photos.create"));
		assert!(!router.has_route("photos.edit"));
	}

	#[rstest]
	#[case(ResourceOptions::new().only(&["index", "show"]), 2)]
	#[case(ResourceOptions::new().except(&["destroy", "update"]), 5)]
	fn test_only_and_except(#[case] options: ResourceOptions, #[case] count: usize) {
		let mut router = Router::new();
		let ids = router.resource("photos", "PhotoController", options).unwrap();
		assert_eq!(ids.len(), count);
	}

	#[rstest]
	fn test_custom_parameter_and_names() {
		let mut router = Router::new();
		router
			.resource(
				"admin/users",
				"UserController",
				ResourceOptions::new().parameter("user").only(&["show"]),
			)
			.unwrap();

		let route = router.route_by_name("admin.users.show").unwrap();
		assert_eq!(route.path(), "/admin/users/{user}");
	}
}
