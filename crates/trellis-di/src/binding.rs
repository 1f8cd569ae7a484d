//! Container categories with dedicated resolution rules

use crate::Service;
use async_trait::async_trait;
use trellis_exception::Result;
use trellis_http::Request;

/// Looks up a persisted record by a route parameter value.
///
/// The dispatcher calls [`ModelBinder::find`] with either the binder's
/// [`primary_key`](ModelBinder::primary_key) or the alternate key declared in
/// the route template (`{post:slug}`), and turns `Ok(None)` into a
/// not-found error.
///
/// # Examples
///
/// ```
/// use trellis_di::{ModelBinder, Service};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Post {
///     id: u64,
///     slug: String,
/// }
///
/// struct Posts(Vec<Arc<Post>>);
///
/// #[async_trait]
/// impl ModelBinder for Posts {
///     fn model_name(&self) -> &str {
///         "Post"
///     }
///
///     async fn find(&self, key: &str, value: &str) -> trellis_exception::Result<Option<Service>> {
///         Ok(self
///             .0
///             .iter()
///             .find(|p| match key {
///                 "slug" => p.slug == value,
///                 _ => p.id.to_string() == value,
///             })
///             .map(|p| p.clone() as Service))
///     }
/// }
/// ```
#[async_trait]
pub trait ModelBinder: Send + Sync {
	/// Name used in not-found diagnostics
	fn model_name(&self) -> &str;

	/// Column used when the route does not declare an alternate key
	fn primary_key(&self) -> &str {
		"id"
	}

	/// Find the record whose `key` equals `value`
	///
	/// # Errors
	///
	/// Storage failures propagate unchanged; a missing record is `Ok(None)`.
	async fn find(&self, key: &str, value: &str) -> Result<Option<Service>>;
}

/// Builds a validated input object from the request.
///
/// Rejection carries human readable messages, surfaced to the client as a
/// validation failure.
#[async_trait]
pub trait InputValidator: Send + Sync {
	async fn validate(&self, request: &Request) -> std::result::Result<Service, Vec<String>>;
}
