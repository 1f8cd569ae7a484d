//! Route group scopes
//!
//! Attributes given to [`Router::group`](super::Router::group) accumulate
//! over nested groups: prefix, middleware, constraints and the name prefix
//! are appended to the enclosing group's values, while namespace and domain
//! replace them.

use super::route::join_paths;
use std::collections::BTreeMap;

/// Values accepted wherever a list of middleware aliases is expected
pub trait IntoMiddlewareNames {
	fn into_middleware_names(self) -> Vec<String>;
}

impl IntoMiddlewareNames for &str {
	fn into_middleware_names(self) -> Vec<String> {
		vec![self.to_string()]
	}
}

impl IntoMiddlewareNames for String {
	fn into_middleware_names(self) -> Vec<String> {
		vec![self]
	}
}

impl IntoMiddlewareNames for &[&str] {
	fn into_middleware_names(self) -> Vec<String> {
		self.iter().map(|s| s.to_string()).collect()
	}
}

impl<const N: usize> IntoMiddlewareNames for [&str; N] {
	fn into_middleware_names(self) -> Vec<String> {
		self.iter().map(|s| s.to_string()).collect()
	}
}

impl IntoMiddlewareNames for Vec<&str> {
	fn into_middleware_names(self) -> Vec<String> {
		self.into_iter().map(str::to_string).collect()
	}
}

impl IntoMiddlewareNames for Vec<String> {
	fn into_middleware_names(self) -> Vec<String> {
		self
	}
}

/// Attributes applied to every route registered inside a group.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::GroupAttributes;
///
/// let attributes = GroupAttributes::new()
///     .prefix("/admin")
///     .middleware(["auth", "admin"])
///     .namespace("Admin")
///     .name("admin.");
/// assert_eq!(attributes.middleware, vec!["auth", "admin"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupAttributes {
	pub prefix: Option<String>,
	pub middleware: Vec<String>,
	pub namespace: Option<String>,
	pub domain: Option<String>,
	pub wheres: BTreeMap<String, String>,
	/// Prefix for route names given inside the group
	pub name: Option<String>,
}

impl GroupAttributes {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn middleware(mut self, names: impl IntoMiddlewareNames) -> Self {
		self.middleware.extend(names.into_middleware_names());
		self
	}

	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());
		self
	}

	pub fn where_(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
		self.wheres.insert(key.into(), pattern.into());
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}
}

/// Accumulated state of the group stack at one depth
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GroupFrame {
	pub(crate) prefix: String,
	pub(crate) middleware: Vec<String>,
	pub(crate) namespace: Option<String>,
	pub(crate) domain: Option<String>,
	pub(crate) wheres: BTreeMap<String, String>,
	pub(crate) name_prefix: String,
}

impl GroupFrame {
	/// The frame for a group entered inside `self`
	pub(crate) fn nest(&self, attributes: GroupAttributes) -> GroupFrame {
		let prefix = match &attributes.prefix {
			Some(prefix) => join_paths(&self.prefix, prefix),
			None => self.prefix.clone(),
		};

		let mut middleware = self.middleware.clone();
		middleware.extend(attributes.middleware);

		let mut wheres = self.wheres.clone();
		wheres.extend(attributes.wheres);

		GroupFrame {
			prefix,
			middleware,
			namespace: attributes.namespace.or_else(|| self.namespace.clone()),
			domain: attributes.domain.or_else(|| self.domain.clone()),
			wheres,
			name_prefix: format!(
				"{}{}",
				self.name_prefix,
				attributes.name.unwrap_or_default()
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nested_frames_append_and_replace() {
		let outer = GroupFrame::default().nest(
			GroupAttributes::new()
				.prefix("api")
				.middleware("throttle")
				.namespace("Api")
				.domain("api.example.com")
				.where_("id", "[0-9]+")
				.name("api."),
		);
		let inner = outer.nest(
			GroupAttributes::new()
				.prefix("/v1/")
				.middleware(["auth"])
				.namespace("Api::V1")
				.where_("slug", "@slug")
				.name("v1."),
		);

		assert_eq!(inner.prefix, "/api/v1");
		assert_eq!(inner.middleware, vec!["throttle", "auth"]);
		assert_eq!(inner.namespace.as_deref(), Some("Api::V1"));
		assert_eq!(inner.domain.as_deref(), Some("api.example.com"));
		assert_eq!(inner.wheres.len(), 2);
		assert_eq!(inner.name_prefix, "api.v1.");
	}

	#[test]
	fn test_empty_attributes_inherit_everything() {
		let outer = GroupFrame::default().nest(GroupAttributes::new().prefix("/admin"));
		assert_eq!(outer.nest(GroupAttributes::new()), outer);
	}
}
