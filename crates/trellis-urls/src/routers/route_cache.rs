//! Persisted route cache
//!
//! The route table can be written to a JSON file and rebuilt from it. The
//! file holds data only, so routes with inline handlers or handler
//! decorators cannot be cached. Middleware aliases and macros are code and
//! must be registered again after loading.

use super::handler::{HandlerDescriptor, HandlerRef};
use super::route::Route;
use super::router::{RouteHandle, RouteId, Router, parse_method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use trellis_conf::RoutingSettings;
use trellis_exception::{Error, Result};

/// Format version written to and expected from cache files
pub const ROUTE_CACHE_VERSION: u32 = 1;

/// One route as stored in the cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRoute {
	pub method: String,
	pub path: String,
	pub handler: HandlerDescriptor,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub middleware: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub wheres: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub defaults: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scheme: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub meta: BTreeMap<String, Value>,
}

impl CachedRoute {
	fn from_route(route: &Route) -> Result<Self> {
		let handler = route.descriptor_if_cacheable().ok_or_else(|| {
			Error::UncacheableHandler(format!("{} {}", route.method(), route.path()))
		})?;
		Ok(Self {
			method: route.method().to_string(),
			path: route.path().to_string(),
			handler,
			middleware: route.middleware().to_vec(),
			name: route.name().map(str::to_string),
			wheres: route.wheres().clone(),
			defaults: route.defaults().clone(),
			domain: route.domain().map(str::to_string),
			scheme: route.scheme().map(str::to_string),
			meta: route.metadata().clone(),
		})
	}
}

/// Contents of a cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCacheFile {
	pub version: u32,
	pub routes: Vec<CachedRoute>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fallback: Option<CachedRoute>,
}

impl Route {
	fn descriptor_if_cacheable(&self) -> Option<HandlerDescriptor> {
		if self.is_cacheable() {
			self.handler().descriptor()
		} else {
			None
		}
	}
}

impl Router {
	/// Snapshot every route in registration order.
	///
	/// # Errors
	///
	/// [`Error::UncacheableHandler`] naming the first route that has an
	/// inline handler or decorators.
	pub fn to_cache(&self) -> Result<RouteCacheFile> {
		let fallback = self.fallback_id();
		let mut routes = Vec::new();
		for (index, route) in self.routes().iter().enumerate() {
			if Some(RouteId::new(index)) != fallback {
				routes.push(CachedRoute::from_route(route)?);
			}
		}
		let fallback = fallback
			.and_then(|id| self.route(id))
			.map(CachedRoute::from_route)
			.transpose()?;

		Ok(RouteCacheFile {
			version: ROUTE_CACHE_VERSION,
			routes,
			fallback,
		})
	}

	/// Write the route cache as JSON to `path`
	pub fn save_cache(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let cache = self.to_cache()?;
		let contents = serde_json::to_vec_pretty(&cache)?;
		std::fs::write(path, contents)?;
		tracing::info!(
			path = %path.display(),
			routes = cache.routes.len(),
			"wrote route cache"
		);
		Ok(())
	}

	/// Register every route of a cache snapshot.
	///
	/// Routes go through the same registration path as live definitions.
	/// They are registered outside any group scope; their paths, handler
	/// targets and names are stored fully qualified.
	pub fn extend_from_cache(&mut self, cache: RouteCacheFile) -> Result<()> {
		if cache.version != ROUTE_CACHE_VERSION {
			return Err(Error::Serialization(format!(
				"unsupported route cache version {} (expected {})",
				cache.version, ROUTE_CACHE_VERSION
			)));
		}

		for cached in cache.routes {
			let handler = HandlerRef::from(cached.handler.clone());
			let handle = self.add(&cached.method, &cached.path, handler)?;
			apply_cached(handle, cached)?;
		}
		if let Some(cached) = cache.fallback {
			let method = parse_method(&cached.method)?;
			let handler = HandlerRef::from(cached.handler.clone());
			let route = Route::new(method, &cached.path, handler)?;
			let id = self.install_fallback(route);
			apply_cached(RouteHandle::new(self, id), cached)?;
		}
		Ok(())
	}

	/// Build a router from a snapshot with default [`RoutingSettings`]
	pub fn from_cache(cache: RouteCacheFile) -> Result<Router> {
		Self::from_cache_with_settings(cache, &RoutingSettings::default())
	}

	/// Build a router from a snapshot, configuring its match cache and
	/// resource parameter from `settings`
	pub fn from_cache_with_settings(
		cache: RouteCacheFile,
		settings: &RoutingSettings,
	) -> Result<Router> {
		let mut router = Router::with_settings(settings);
		router.extend_from_cache(cache)?;
		Ok(router)
	}

	/// Read a cache file written by [`Router::save_cache`] into this router
	pub fn load_cache(&mut self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let contents = std::fs::read(path)?;
		let cache: RouteCacheFile = serde_json::from_slice(&contents)?;
		let count = cache.routes.len();
		self.extend_from_cache(cache)?;
		tracing::info!(path = %path.display(), routes = count, "loaded route cache");
		Ok(())
	}
}

fn apply_cached(handle: RouteHandle<'_>, cached: CachedRoute) -> Result<()> {
	let mut handle = handle.where_all(cached.wheres)?.middleware(cached.middleware);
	for (key, value) in &cached.defaults {
		handle = handle.defaults(key, value);
	}
	if let Some(domain) = &cached.domain {
		handle = handle.domain(domain)?;
	}
	if let Some(scheme) = &cached.scheme {
		handle = handle.scheme(scheme)?;
	}
	for (key, value) in cached.meta {
		handle = handle.meta(&key, value);
	}
	if let Some(name) = &cached.name {
		handle.name(name)?;
	}
	Ok(())
}
